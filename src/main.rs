use anyhow::Context;
use clap::Parser;
use gait_event_eval::config::{Args, ReportFormat};
use gait_event_eval::data_loading::{discover_bout_files, load_bout_windows};
use gait_event_eval::output::{print_report, write_json, TrialSummary};
use gait_event_eval::{BoutEvaluation, WindowEvaluator};
use log::{info, warn};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    let settings = args.evaluation_settings();
    let evaluator = WindowEvaluator::new(settings);

    let files = discover_bout_files(&args.input_path)?;
    if files.is_empty() {
        anyhow::bail!("No bout files found in {}", args.input_path.display());
    }

    let mut results: Vec<(String, BoutEvaluation)> = Vec::new();
    for path in &files {
        let bout = load_bout_windows(path, args.window_length)?;
        if bout.windows.is_empty() {
            warn!("Skipping empty bout: {}", path.display());
            continue;
        }

        let evaluation = evaluator
            .evaluate(&bout.curves())
            .with_context(|| format!("Failed to evaluate {}", path.display()))?;
        info!(
            "{}: {} windows, {} events, {} missed, {} extra",
            bout.name,
            bout.windows.len(),
            evaluation.total_ground_truth,
            evaluation.total_missed,
            evaluation.total_extra
        );
        results.push((bout.name, evaluation));
    }

    let summary = TrialSummary::from_bouts(
        results.iter().map(|(name, eval)| (name.as_str(), eval)),
        args.sample_rate,
    );

    match args.format {
        ReportFormat::Text => print_report(&summary),
        ReportFormat::Json => {
            write_json(std::io::stdout().lock(), &summary)?;
            println!();
        }
    }

    Ok(())
}
