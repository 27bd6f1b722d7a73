//! The `info` subcommand: summarize a loaded collection.

use std::path::PathBuf;

use anyhow::{Context, Result};

use evset::column::Column;
use evset::loader::load_collection;
use evset::resample::DEFAULT_SAMPLING_RATE;

pub fn run(files: Vec<PathBuf>, durations: Vec<f64>) -> Result<()> {
    let inputs = super::event_files(files, &durations)?;
    let collection = load_collection(&inputs, DEFAULT_SAMPLING_RATE)
        .context("Failed to load event files")?;

    println!("Runs: {}", collection.runs().len());
    for run in collection.runs() {
        println!("  [{}] {:.1} s", run.id, run.duration);
    }
    if let Some(index) = collection.dense_index() {
        println!(
            "Dense grid: {} samples at {} Hz",
            index.len(),
            index.rate()
        );
    }

    let mut names: Vec<&str> = collection.names().collect();
    names.sort_unstable();
    println!("Columns: {}", names.len());
    for name in names {
        match &collection[name] {
            Column::Sparse(col) => {
                let max_onset = col
                    .max_onset()
                    .map_or_else(|| "-".to_string(), |o| format!("{o:.1}"));
                println!(
                    "  {name}: sparse, {} events, max onset {max_onset} s",
                    col.len()
                );
            }
            Column::Dense(col) => {
                println!("  {name}: dense, {} samples", col.len());
            }
        }
    }
    Ok(())
}
