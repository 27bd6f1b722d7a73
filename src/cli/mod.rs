use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod apply;
mod config;
mod info;

/// evset - Event Series Transformation Tool
#[derive(Parser)]
#[command(name = "evset")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a JSON transform document to one or more events.tsv files
    Apply {
        /// Input events.tsv files, one per run, in run order
        #[arg(value_name = "EVENTS", required = true)]
        files: Vec<PathBuf>,

        /// JSON transform document (ordered list of operators)
        #[arg(short, long, value_name = "SPEC")]
        spec: Option<PathBuf>,

        /// Output directory for derived column TSVs
        #[arg(short, long, value_name = "DIR", default_value = "derived")]
        out: PathBuf,

        /// Run duration in seconds, repeated per file (inferred when omitted)
        #[arg(short, long, value_name = "SECS")]
        duration: Vec<f64>,

        /// Shared dense sampling rate in Hz
        #[arg(short, long)]
        rate: Option<f64>,

        /// Convert every column to dense before writing
        #[arg(long)]
        force_dense: bool,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Summarize the columns of one or more events.tsv files
    Info {
        /// Input events.tsv files, one per run, in run order
        #[arg(value_name = "EVENTS", required = true)]
        files: Vec<PathBuf>,

        /// Run duration in seconds, repeated per file (inferred when omitted)
        #[arg(short, long, value_name = "SECS")]
        duration: Vec<f64>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Apply {
            files,
            spec,
            out,
            duration,
            rate,
            force_dense,
            config,
        } => apply::run(files, spec, out, duration, rate, force_dense, config),
        Commands::Info { files, duration } => info::run(files, duration),
    }
}

/// Pair input paths with per-run durations (all inferred when none given).
pub(crate) fn event_files(
    files: Vec<PathBuf>,
    durations: &[f64],
) -> Result<Vec<evset::loader::EventFile>> {
    if !durations.is_empty() && durations.len() != files.len() {
        anyhow::bail!(
            "{} durations given for {} files; pass --duration once per file or not at all",
            durations.len(),
            files.len()
        );
    }
    Ok(files
        .into_iter()
        .enumerate()
        .map(|(i, path)| match durations.get(i) {
            Some(&secs) => evset::loader::EventFile::new(path, secs),
            None => evset::loader::EventFile::inferred(path),
        })
        .collect())
}
