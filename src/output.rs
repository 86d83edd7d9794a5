use crate::window_evaluation::BoutEvaluation;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

/// Mean and spread of the timing error of matched events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingStats {
    pub count: usize,
    pub mean_samples: f32,
    pub std_samples: f32,
    pub mean_ms: f32,
    pub std_ms: f32,
}

impl TimingStats {
    /// Population statistics over `differences` (in samples). `None` when
    /// nothing was matched.
    pub fn from_differences(differences: &[i64], sample_rate: f32) -> Option<Self> {
        if differences.is_empty() {
            return None;
        }
        let n = differences.len() as f32;
        let mean = differences.iter().map(|&d| d as f32).sum::<f32>() / n;
        let variance = differences
            .iter()
            .map(|&d| {
                let diff = d as f32 - mean;
                diff * diff
            })
            .sum::<f32>()
            / n;
        let std_dev = variance.sqrt();
        let to_ms = 1000.0 / sample_rate;

        Some(Self {
            count: differences.len(),
            mean_samples: mean,
            std_samples: std_dev,
            mean_ms: mean * to_ms,
            std_ms: std_dev * to_ms,
        })
    }
}

fn percentage(count: usize, total: usize) -> Option<f32> {
    (total > 0).then(|| count as f32 * 100.0 / total as f32)
}

#[derive(Debug, Clone, Serialize)]
pub struct BoutSummary {
    pub name: String,
    pub ground_truth_events: usize,
    pub missed: usize,
    pub extra: usize,
    /// Relative to the number of ground-truth events
    pub missed_percent: Option<f32>,
    pub extra_percent: Option<f32>,
    pub timing: Option<TimingStats>,
}

impl BoutSummary {
    pub fn new(name: impl Into<String>, bout: &BoutEvaluation, sample_rate: f32) -> Self {
        Self {
            name: name.into(),
            ground_truth_events: bout.total_ground_truth,
            missed: bout.total_missed,
            extra: bout.total_extra,
            missed_percent: percentage(bout.total_missed, bout.total_ground_truth),
            extra_percent: percentage(bout.total_extra, bout.total_ground_truth),
            timing: TimingStats::from_differences(&bout.timing_differences, sample_rate),
        }
    }
}

/// All bouts of one trial, plus totals pooled over them.
#[derive(Debug, Clone, Serialize)]
pub struct TrialSummary {
    pub bouts: Vec<BoutSummary>,
    pub total: BoutSummary,
}

impl TrialSummary {
    pub fn from_bouts<'a, I>(bouts: I, sample_rate: f32) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a BoutEvaluation)>,
    {
        let mut pooled = BoutEvaluation::default();
        let mut summaries = Vec::new();

        for (name, bout) in bouts {
            summaries.push(BoutSummary::new(name, bout, sample_rate));
            pooled.total_ground_truth += bout.total_ground_truth;
            pooled.total_missed += bout.total_missed;
            pooled.total_extra += bout.total_extra;
            pooled
                .timing_differences
                .extend_from_slice(&bout.timing_differences);
        }

        Self {
            bouts: summaries,
            total: BoutSummary::new("total", &pooled, sample_rate),
        }
    }
}

fn format_percent(value: Option<f32>) -> String {
    value
        .map(|v| format!("{:.1}%", v))
        .unwrap_or_else(|| "n/a".to_string())
}

fn print_summary_line(summary: &BoutSummary) {
    let timing = summary
        .timing
        .map(|t| {
            format!(
                "{:+.2} ± {:.2} samples ({:+.1} ± {:.1} ms)",
                t.mean_samples, t.std_samples, t.mean_ms, t.std_ms
            )
        })
        .unwrap_or_else(|| "no matched events".to_string());

    println!(
        "{:<24} events: {:>4}  missed: {:>3} ({:>6})  extra: {:>3} ({:>6})  timing: {}",
        summary.name,
        summary.ground_truth_events,
        summary.missed,
        format_percent(summary.missed_percent),
        summary.extra,
        format_percent(summary.extra_percent),
        timing
    );
}

pub fn print_report(summary: &TrialSummary) {
    println!("\nInitial contact detection:");
    println!("--------------------------");
    for bout in &summary.bouts {
        print_summary_line(bout);
    }
    if summary.bouts.len() > 1 {
        println!();
        print_summary_line(&summary.total);
    }
}

pub fn write_json<W: Write>(writer: W, summary: &TrialSummary) -> Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}
