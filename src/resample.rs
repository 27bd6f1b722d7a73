//! # Dense Index and Rate Conversion
//!
//! The [`DenseIndex`] is the collection-wide table behind every dense column:
//! it maps each sample to its run segment (and through it to a within-run
//! time and an `event_file_id` label). It is owned exclusively by the
//! [`EventCollection`](crate::collection::EventCollection) and rebuilt
//! atomically when the collection resamples; dense columns never carry their
//! own copy.
//!
//! Conversion is deliberately narrow: sparse events are stepped onto the grid
//! ([`to_dense`]), and existing dense vectors are re-aligned to a new grid
//! ([`regrid`]). This is fixed-rate up/down conversion of step/impulse event
//! series, not general signal processing.

use log::debug;

use crate::collection::{RunInfo, EVENT_FILE_ID};
use crate::column::{DenseColumn, SparseColumn};

/// Default shared sampling rate in Hz.
pub const DEFAULT_SAMPLING_RATE: f64 = 10.0;

/// Errors raised by index construction and rate conversion.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    /// Sampling rates must be positive and finite.
    #[error("invalid sampling rate: {0} (must be positive and finite)")]
    InvalidRate(f64),

    /// A sparse row's run label has no segment in the dense index.
    #[error("no run segment for event_file_id '{0}'")]
    MissingRun(String),

    /// A dense operation was requested before any dense index existed.
    #[error("collection has no dense index (no runs defined)")]
    MissingIndex,
}

/// One run's slice of the shared sample grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Run label, matched against the `event_file_id` entity.
    pub id: String,
    /// First sample of this run in the concatenated grid.
    pub offset: usize,
    /// Number of samples in this run.
    pub len: usize,
}

/// The collection-wide table mapping each dense sample to its run and time.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseIndex {
    rate: f64,
    segments: Vec<Segment>,
}

impl DenseIndex {
    /// Build an index from ordered run metadata at the given rate.
    ///
    /// Each run contributes `round(duration * rate)` samples, concatenated in
    /// run order.
    pub fn build(runs: &[RunInfo], rate: f64) -> Result<Self, ResampleError> {
        validate_rate(rate)?;
        let mut segments = Vec::with_capacity(runs.len());
        let mut offset = 0;
        for run in runs {
            let len = samples_for(run.duration, rate);
            segments.push(Segment {
                id: run.id.clone(),
                offset,
                len,
            });
            offset += len;
        }
        Ok(Self { rate, segments })
    }

    /// Rebuild this index at a new rate, preserving run boundaries.
    ///
    /// Run durations are recovered from the current segmentation, so repeated
    /// rebuilds at the same rate are exact no-ops.
    pub fn with_rate(&self, rate: f64) -> Result<Self, ResampleError> {
        validate_rate(rate)?;
        let mut segments = Vec::with_capacity(self.segments.len());
        let mut offset = 0;
        for seg in &self.segments {
            let duration = seg.len as f64 / self.rate;
            let len = samples_for(duration, rate);
            segments.push(Segment {
                id: seg.id.clone(),
                offset,
                len,
            });
            offset += len;
        }
        Ok(Self { rate, segments })
    }

    /// The sampling rate in Hz.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Total number of samples across all runs.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    /// Whether the index covers no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The run segments in grid order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Find the segment for a run label.
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// One run label per sample, in grid order.
    pub fn labels(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len());
        for seg in &self.segments {
            out.extend(std::iter::repeat(seg.id.clone()).take(seg.len));
        }
        out
    }

    /// One within-run time (seconds) per sample, in grid order.
    pub fn times(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.len());
        for seg in &self.segments {
            out.extend((0..seg.len).map(|i| i as f64 / self.rate));
        }
        out
    }
}

fn validate_rate(rate: f64) -> Result<(), ResampleError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ResampleError::InvalidRate(rate));
    }
    Ok(())
}

fn samples_for(duration: f64, rate: f64) -> usize {
    let n = (duration * rate).round();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Convert a sparse column to dense on the given index.
///
/// Each event's amplitude is stepped across the samples covering
/// `[onset, onset + duration)` inside the event's own run segment; samples
/// outside any event stay `0.0`. Events are matched to segments through the
/// column's `event_file_id` entity; a single-segment index accepts columns
/// without that entity (everything belongs to the one run). Rows with a
/// non-finite onset or duration have no grid position and are skipped.
pub fn to_dense(col: &SparseColumn, index: &DenseIndex) -> Result<DenseColumn, ResampleError> {
    let mut values = vec![0.0; index.len()];
    let labels = col.entity(EVENT_FILE_ID);

    for row in 0..col.len() {
        let onset = col.onsets[row];
        let duration = col.durations[row];
        if !onset.is_finite() || !duration.is_finite() {
            debug!(
                "column '{}': skipping row {} with non-finite onset/duration",
                col.name, row
            );
            continue;
        }

        let seg = match labels {
            Some(labels) => index
                .segment(&labels[row])
                .ok_or_else(|| ResampleError::MissingRun(labels[row].clone()))?,
            None if index.segments.len() == 1 => &index.segments[0],
            None => return Err(ResampleError::MissingRun(EVENT_FILE_ID.to_string())),
        };

        let start = ((onset * index.rate).round().max(0.0) as usize).min(seg.len);
        let end = (((onset + duration) * index.rate).round().max(0.0) as usize)
            .min(seg.len)
            .max(start);
        for v in &mut values[seg.offset + start..seg.offset + end] {
            *v = col.values[row];
        }
    }

    Ok(DenseColumn::new(col.name.clone(), values))
}

/// Re-align a dense vector to a grid of exactly `new_len` samples.
///
/// Each output sample is the mean of the input bucket `[j*n/m, (j+1)*n/m)`
/// (at least one sample wide), so upsampling replicates samples across the
/// rate ratio and downsampling pools them. The output length is `new_len`
/// exactly for any ratio, integer or not; regridding to the current length is
/// the identity.
pub fn regrid(values: &[f64], new_len: usize) -> Vec<f64> {
    let old_len = values.len();
    if old_len == 0 {
        return vec![0.0; new_len];
    }
    if new_len == old_len {
        return values.to_vec();
    }

    let mut out = Vec::with_capacity(new_len);
    for j in 0..new_len {
        let start = j * old_len / new_len;
        let end = ((j + 1) * old_len / new_len).max(start + 1).min(old_len);
        let bucket = &values[start..end];
        out.push(bucket.iter().sum::<f64>() / bucket.len() as f64);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::RunInfo;

    fn two_runs() -> Vec<RunInfo> {
        vec![RunInfo::new("0", 10.0), RunInfo::new("1", 8.0)]
    }

    #[test]
    fn test_build_segment_layout() {
        let index = DenseIndex::build(&two_runs(), 10.0).expect("index");
        assert_eq!(index.len(), 180);
        assert_eq!(index.segments()[0].offset, 0);
        assert_eq!(index.segments()[1].offset, 100);
        assert_eq!(index.segments()[1].len, 80);
        assert_eq!(index.labels().len(), 180);
        assert_eq!(index.times()[100], 0.0);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                DenseIndex::build(&two_runs(), rate),
                Err(ResampleError::InvalidRate(_))
            ));
        }
    }

    #[test]
    fn test_with_rate_is_idempotent() {
        let index = DenseIndex::build(&two_runs(), 10.0).expect("index");
        let same = index.with_rate(10.0).expect("rebuild");
        assert_eq!(index, same);

        let up = index.with_rate(50.0).expect("upsample");
        assert_eq!(up.len(), index.len() * 5);
    }

    #[test]
    fn test_to_dense_steps_amplitude() {
        let index = DenseIndex::build(&two_runs(), 10.0).expect("index");
        let col = SparseColumn::new("a", vec![1.0, 2.0], vec![0.5, 1.0], vec![3.0, 7.0])
            .with_entity(EVENT_FILE_ID, vec!["0".into(), "1".into()]);

        let dense = to_dense(&col, &index).expect("dense");
        assert_eq!(dense.len(), 180);
        // Run 0: [1.0, 1.5) at 10 Hz -> samples 10..15.
        assert_eq!(dense.values[10], 3.0);
        assert_eq!(dense.values[14], 3.0);
        assert_eq!(dense.values[15], 0.0);
        // Run 1: [2.0, 3.0) lands at offset 100.
        assert_eq!(dense.values[120], 7.0);
        assert_eq!(dense.values[129], 7.0);
        assert_eq!(dense.values[130], 0.0);
    }

    #[test]
    fn test_to_dense_clamps_to_run_end() {
        let index = DenseIndex::build(&[RunInfo::new("0", 5.0)], 10.0).expect("index");
        let col = SparseColumn::new("a", vec![4.5], vec![3.0], vec![1.0])
            .with_entity(EVENT_FILE_ID, vec!["0".into()]);
        let dense = to_dense(&col, &index).expect("dense");
        assert_eq!(dense.len(), 50);
        assert_eq!(dense.values[45], 1.0);
        assert_eq!(dense.values[49], 1.0);
    }

    #[test]
    fn test_to_dense_single_segment_fallback() {
        let index = DenseIndex::build(&[RunInfo::new("0", 5.0)], 10.0).expect("index");
        let col = SparseColumn::new("a", vec![1.0], vec![1.0], vec![2.0]);
        let dense = to_dense(&col, &index).expect("dense");
        assert_eq!(dense.values[10], 2.0);
    }

    #[test]
    fn test_to_dense_unknown_run_fails() {
        let index = DenseIndex::build(&[RunInfo::new("0", 5.0)], 10.0).expect("index");
        let col = SparseColumn::new("a", vec![1.0], vec![1.0], vec![2.0])
            .with_entity(EVENT_FILE_ID, vec!["7".into()]);
        assert!(matches!(
            to_dense(&col, &index),
            Err(ResampleError::MissingRun(run)) if run == "7"
        ));
    }

    #[test]
    fn test_to_dense_skips_nan_rows() {
        let index = DenseIndex::build(&[RunInfo::new("0", 5.0)], 10.0).expect("index");
        let col = SparseColumn::new("a", vec![f64::NAN, 1.0], vec![1.0, 1.0], vec![9.0, 2.0])
            .with_entity(EVENT_FILE_ID, vec!["0".into(), "0".into()]);
        let dense = to_dense(&col, &index).expect("dense");
        assert_eq!(dense.values.iter().filter(|&&v| v == 9.0).count(), 0);
        assert_eq!(dense.values[10], 2.0);
    }

    #[test]
    fn test_regrid_identity_and_lengths() {
        let v = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(regrid(&v, 4), v);
        assert_eq!(regrid(&v, 8), vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
        assert_eq!(regrid(&v, 2), vec![1.5, 3.5]);
        // Non-integer ratios still land exactly on the requested length.
        assert_eq!(regrid(&v, 7).len(), 7);
        assert_eq!(regrid(&v, 3).len(), 3);
        assert_eq!(regrid(&[], 5), vec![0.0; 5]);
    }
}
