//! # Event File Ingestion
//!
//! Reads BIDS-style `events.tsv` files (tab-separated, one row per event)
//! into an [`EventCollection`] of sparse columns. The `onset` and `duration`
//! columns are required; every other numeric column becomes one sparse
//! column, with each row tagged by an `event_file_id` entity naming its run.
//!
//! Dataset-directory discovery is out of scope; callers pass an explicit
//! ordered list of files with run durations (or let the duration be inferred
//! from the last event). Malformed numeric cells and `n/a` become NaN and
//! propagate through downstream computation rather than being rejected.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::collection::{EventCollection, RunInfo, EVENT_FILE_ID};
use crate::column::{Column, SparseColumn};
use crate::resample::ResampleError;

/// Errors raised while reading event files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TSV parsing error
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is missing from an event file.
    #[error("{path}: missing required column '{column}'")]
    MissingColumn {
        /// The offending file.
        path: PathBuf,
        /// The required column name.
        column: &'static str,
    },

    /// Building the collection's dense index failed.
    #[error(transparent)]
    Resample(#[from] ResampleError),
}

/// One run's event file and its duration in seconds. With no duration the
/// run is assumed to end at the ceiling of its last event's offset.
#[derive(Debug, Clone)]
pub struct EventFile {
    /// Path to the events.tsv file.
    pub path: PathBuf,
    /// Run duration in seconds, or `None` to infer from the events.
    pub duration: Option<f64>,
}

impl EventFile {
    /// Reference a file with a known run duration.
    pub fn new(path: impl Into<PathBuf>, duration: f64) -> Self {
        Self {
            path: path.into(),
            duration: Some(duration),
        }
    }

    /// Reference a file whose run duration should be inferred.
    pub fn inferred(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            duration: None,
        }
    }
}

struct Accumulator {
    onsets: Vec<f64>,
    durations: Vec<f64>,
    values: Vec<f64>,
    labels: Vec<String>,
    any_finite: bool,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            onsets: Vec::new(),
            durations: Vec::new(),
            values: Vec::new(),
            labels: Vec::new(),
            any_finite: false,
        }
    }
}

fn parse_cell(cell: &str) -> f64 {
    let trimmed = cell.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("n/a") {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

/// Load an ordered list of per-run event files into a collection at the
/// given sampling rate.
///
/// Run `i` gets the `event_file_id` label `i.to_string()`. Columns that
/// never parse to a finite number anywhere (e.g. free-text `trial_type`
/// labels) are skipped with a warning.
pub fn load_collection(files: &[EventFile], rate: f64) -> Result<EventCollection, LoadError> {
    let mut runs = Vec::with_capacity(files.len());
    let mut accumulators: BTreeMap<String, Accumulator> = BTreeMap::new();

    for (run_idx, file) in files.iter().enumerate() {
        let label = run_idx.to_string();
        let rows = read_rows(&file.path)?;
        debug!(
            "{}: {} events, {} amplitude columns",
            file.path.display(),
            rows.onsets.len(),
            rows.amplitudes.len()
        );

        let duration = file.duration.unwrap_or_else(|| {
            rows.onsets
                .iter()
                .zip(&rows.durations)
                .map(|(o, d)| o + d)
                .filter(|t| t.is_finite())
                .fold(0.0_f64, f64::max)
                .ceil()
        });
        runs.push(RunInfo::new(label.clone(), duration));

        for (name, values) in rows.amplitudes {
            let acc = accumulators.entry(name).or_insert_with(Accumulator::new);
            acc.any_finite |= values.iter().any(|v| v.is_finite());
            acc.onsets.extend_from_slice(&rows.onsets);
            acc.durations.extend_from_slice(&rows.durations);
            acc.labels
                .extend(std::iter::repeat(label.clone()).take(values.len()));
            acc.values.extend(values);
        }
    }

    let mut collection = EventCollection::new(runs, rate)?;
    for (name, acc) in accumulators {
        if !acc.any_finite {
            warn!("skipping column '{name}': no numeric values in any file");
            continue;
        }
        let column = SparseColumn::new(name, acc.onsets, acc.durations, acc.values)
            .with_entity(EVENT_FILE_ID, acc.labels);
        collection.insert(Column::Sparse(column));
    }
    Ok(collection)
}

struct FileRows {
    onsets: Vec<f64>,
    durations: Vec<f64>,
    amplitudes: Vec<(String, Vec<f64>)>,
}

fn read_rows(path: &Path) -> Result<FileRows, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let position = |wanted: &'static str| -> Result<usize, LoadError> {
        headers
            .iter()
            .position(|h| h == wanted)
            .ok_or(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: wanted,
            })
    };
    let onset_idx = position("onset")?;
    let duration_idx = position("duration")?;

    let amplitude_headers: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != onset_idx && *i != duration_idx)
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut rows = FileRows {
        onsets: Vec::new(),
        durations: Vec::new(),
        amplitudes: amplitude_headers
            .iter()
            .map(|(_, h)| (h.clone(), Vec::new()))
            .collect(),
    };

    for record in reader.records() {
        let record = record?;
        rows.onsets
            .push(record.get(onset_idx).map_or(f64::NAN, parse_cell));
        rows.durations
            .push(record.get(duration_idx).map_or(f64::NAN, parse_cell));
        for (slot, (idx, _)) in rows.amplitudes.iter_mut().zip(&amplitude_headers) {
            slot.1.push(record.get(*idx).map_or(f64::NAN, parse_cell));
        }
    }

    Ok(rows)
}
