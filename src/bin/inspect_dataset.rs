use anyhow::Result;
use gait_event_eval::data_loading::load_annotated_examples;
use gait_event_eval::dataset::{build_dataset, WindowShape};
use ndarray::Axis;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        println!("Usage: {} <annotated_examples.csv>", args[0]);
        std::process::exit(1);
    }

    let shape = WindowShape::default();
    let rows = load_annotated_examples(Path::new(&args[1]), shape)?;
    let (x, y) = build_dataset(rows.view(), shape)?;

    println!("\nPredictors: {:?}", x.dim());
    println!("Targets:    {:?}", y.dim());

    println!("\nAnnotated initial contacts per window:");
    for (i, labels) in y.axis_iter(Axis(0)).enumerate() {
        let events: Vec<usize> = labels
            .column(0)
            .iter()
            .enumerate()
            .filter(|(_, &v)| v == 1.0)
            .map(|(t, _)| t)
            .collect();
        println!("  window {:>3}: {:?}", i, events);
    }

    Ok(())
}
