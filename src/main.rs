//! # evset CLI
//!
//! A command-line tool for applying declarative transform pipelines to
//! BIDS-style event files.
//!
//! ## Usage
//!
//! ```bash
//! # Apply a transform document to three runs and write derived columns
//! evset apply run1_events.tsv run2_events.tsv run3_events.tsv \
//!     --spec transforms.json --out derived/
//!
//! # Summarize the loaded collection
//! evset info run1_events.tsv
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    cli::init_logging(args.verbosity());
    cli::dispatch(args)
}
