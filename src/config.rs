use crate::peak_detection::PeakDetectionParams;
use crate::window_evaluation::EvaluationSettings;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text, // human readable table (default)
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!("Invalid report format: {}. Use text or json", s)),
        }
    }
}

/// Score initial contact detections against annotated gait events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// CSV file of one micro-walking bout, or a directory of them
    #[arg(help = "CSV file of one micro-walking bout, or a directory of them")]
    pub input_path: PathBuf,

    /// Samples per window
    #[arg(long, default_value = "200")]
    pub window_length: usize,

    /// Largest distance (in samples) between a predicted and an annotated event for a match
    #[arg(long, default_value = "20")]
    pub match_threshold: usize,

    /// Minimum probability for a sample to count as a candidate event
    #[arg(long, default_value = "0.05")]
    pub min_height: f32,

    /// Minimum prominence of a probability peak
    #[arg(long, default_value = "0.04")]
    pub min_prominence: f32,

    /// Minimum distance between two probability peaks, in samples
    #[arg(long, default_value = "40")]
    pub min_distance: f32,

    /// Label value that marks an initial contact
    #[arg(long, default_value = "1.0")]
    pub event_marker: f32,

    /// Sampling frequency in Hz, used to report timing errors in milliseconds
    #[arg(long, default_value = "100.0", env = "GAIT_SAMPLE_RATE")]
    pub sample_rate: f32,

    /// Report format (text or json)
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}

impl Args {
    pub fn evaluation_settings(&self) -> EvaluationSettings {
        EvaluationSettings {
            peaks: PeakDetectionParams {
                min_height: self.min_height,
                min_prominence: self.min_prominence,
                min_distance: self.min_distance,
            },
            match_threshold: self.match_threshold,
            event_marker: self.event_marker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_library_settings() {
        let args = Args::parse_from(["gait-event-eval", "bouts/"]);
        assert_eq!(args.evaluation_settings(), EvaluationSettings::default());
        assert_eq!(args.window_length, 200);
        assert_eq!(args.format, ReportFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "gait-event-eval",
            "bout.csv",
            "--match-threshold",
            "10",
            "--min-distance",
            "25",
            "--format",
            "json",
        ]);
        let settings = args.evaluation_settings();
        assert_eq!(settings.match_threshold, 10);
        assert_eq!(settings.peaks.min_distance, 25.0);
        assert_eq!(args.format, ReportFormat::Json);
    }

    #[test]
    fn test_unknown_format() {
        assert!("csv".parse::<ReportFormat>().is_err());
    }
}
