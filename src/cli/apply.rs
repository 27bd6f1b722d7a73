//! The `apply` subcommand: load runs, apply a transform document, write the
//! derived columns as TSV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use evset::collection::EventCollection;
use evset::column::Column;
use evset::loader::load_collection;
use evset::resample::DEFAULT_SAMPLING_RATE;

use super::config::Config;

#[allow(clippy::too_many_arguments)]
pub fn run(
    files: Vec<PathBuf>,
    spec: Option<PathBuf>,
    out: PathBuf,
    durations: Vec<f64>,
    rate: Option<f64>,
    force_dense: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let config = match config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    };
    // CLI flags win over the config file, the config file over defaults.
    let rate = rate
        .or(config.apply.sampling_rate)
        .unwrap_or(DEFAULT_SAMPLING_RATE);
    let force_dense = force_dense || config.apply.force_dense.unwrap_or(false);

    let inputs = super::event_files(files, &durations)?;
    let mut collection =
        load_collection(&inputs, rate).context("Failed to load event files")?;
    info!(
        "loaded {} columns across {} runs at {} Hz",
        collection.len(),
        collection.runs().len(),
        rate
    );

    if let Some(spec) = &spec {
        collection
            .apply_from_json(spec)
            .with_context(|| format!("Failed to apply transforms from {}", spec.display()))?;
    }

    if force_dense {
        collection
            .resample(rate, true)
            .context("Failed to densify collection")?;
    }

    write_columns(&collection, &out)?;
    println!(
        "Wrote {} columns to {}",
        collection.len(),
        out.display()
    );
    Ok(())
}

fn write_columns(collection: &EventCollection, out: &Path) -> Result<()> {
    std::fs::create_dir_all(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let mut names: Vec<&str> = collection.names().collect();
    names.sort_unstable();

    for name in names {
        let path = out.join(format!("{}.tsv", sanitize(name)));
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;

        match &collection[name] {
            Column::Sparse(col) => {
                writer.write_record(["onset", "duration", "value"])?;
                for i in 0..col.len() {
                    writer.write_record([
                        col.onsets[i].to_string(),
                        col.durations[i].to_string(),
                        col.values[i].to_string(),
                    ])?;
                }
            }
            Column::Dense(col) => {
                writer.write_record(["value"])?;
                for v in &col.values {
                    writer.write_record([v.to_string()])?;
                }
            }
        }
        writer.flush()?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

/// Split outputs carry `/` in their names; keep one file per column.
fn sanitize(name: &str) -> String {
    name.replace(['/', '\\'], "_").replace(' ', "_")
}
