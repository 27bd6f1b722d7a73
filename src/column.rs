//! # Column Representations
//!
//! Event data lives in one of two shapes:
//!
//! - [`SparseColumn`]: an event list, one `(onset, duration, amplitude)`
//!   triple per discrete event, plus per-event entity labels (run identifiers
//!   and similar grouping keys).
//! - [`DenseColumn`]: a fixed-rate time series, one amplitude per sample of
//!   the collection's shared [dense index](crate::resample::DenseIndex).
//!
//! [`Column`] is the closed sum of the two. Transform operators are explicit
//! about which variant they accept and convert through the resampler when a
//! caller asks for dense semantics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The three per-event vectors of a sparse column.
///
/// Used by the `assign` transform to name which vector is read from the
/// source and which is overwritten on the target. The serialized form accepts
/// `"value"` as an alias for `"amplitude"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAttr {
    /// Event start time in seconds.
    Onset,
    /// Event duration in seconds.
    Duration,
    /// Event amplitude.
    #[serde(alias = "value")]
    Amplitude,
}

impl std::fmt::Display for EventAttr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventAttr::Onset => write!(f, "onset"),
            EventAttr::Duration => write!(f, "duration"),
            EventAttr::Amplitude => write!(f, "amplitude"),
        }
    }
}

/// Event-list representation: parallel onset/duration/amplitude vectors.
///
/// Invariant: `onsets`, `durations`, `values`, and every entity vector share
/// one length. Onsets are seconds relative to the start of the event's own
/// run and are not necessarily sorted after group-wise operations that
/// concatenate rows.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseColumn {
    /// Column name, unique within a collection.
    pub name: String,
    /// Event start times in seconds, one per event.
    pub onsets: Vec<f64>,
    /// Event durations in seconds, parallel to `onsets`.
    pub durations: Vec<f64>,
    /// Event amplitudes, parallel to `onsets`.
    pub values: Vec<f64>,
    /// Grouping-key name (e.g. `event_file_id`) to one label per event row.
    pub entities: BTreeMap<String, Vec<String>>,
}

impl SparseColumn {
    /// Create a sparse column from parallel event vectors.
    pub fn new(
        name: impl Into<String>,
        onsets: Vec<f64>,
        durations: Vec<f64>,
        values: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            onsets,
            durations,
            values,
            entities: BTreeMap::new(),
        }
    }

    /// Attach one entity label per event row under the given grouping key.
    pub fn with_entity(mut self, key: impl Into<String>, labels: Vec<String>) -> Self {
        self.entities.insert(key.into(), labels);
        self
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.onsets.len()
    }

    /// Whether the column has no events.
    pub fn is_empty(&self) -> bool {
        self.onsets.is_empty()
    }

    /// Per-row labels for the given grouping key, if present.
    pub fn entity(&self, key: &str) -> Option<&[String]> {
        self.entities.get(key).map(Vec::as_slice)
    }

    /// Largest onset, ignoring NaN rows. `None` for an empty column.
    pub fn max_onset(&self) -> Option<f64> {
        self.onsets
            .iter()
            .copied()
            .filter(|o| o.is_finite())
            .fold(None, |acc, o| Some(acc.map_or(o, |m: f64| m.max(o))))
    }

    /// Check the parallel-length invariant.
    pub fn validate(&self) -> Result<(), String> {
        let n = self.onsets.len();
        if self.durations.len() != n || self.values.len() != n {
            return Err(format!(
                "column '{}': onsets/durations/values lengths differ ({}/{}/{})",
                self.name,
                n,
                self.durations.len(),
                self.values.len()
            ));
        }
        for (key, labels) in &self.entities {
            if labels.len() != n {
                return Err(format!(
                    "column '{}': entity '{}' has {} labels for {} events",
                    self.name,
                    key,
                    labels.len(),
                    n
                ));
            }
        }
        Ok(())
    }

    /// Read the named per-event vector.
    pub fn attr(&self, attr: EventAttr) -> &[f64] {
        match attr {
            EventAttr::Onset => &self.onsets,
            EventAttr::Duration => &self.durations,
            EventAttr::Amplitude => &self.values,
        }
    }

    /// Overwrite the named per-event vector.
    ///
    /// The replacement must match the column's event count; callers enforce
    /// this before mutating.
    pub fn set_attr(&mut self, attr: EventAttr, data: Vec<f64>) {
        match attr {
            EventAttr::Onset => self.onsets = data,
            EventAttr::Duration => self.durations = data,
            EventAttr::Amplitude => self.values = data,
        }
    }

    /// Copy of this column keeping only the given row indices, in order.
    pub fn filter_rows(&self, keep: &[usize], name: impl Into<String>) -> SparseColumn {
        let pick = |v: &[f64]| keep.iter().map(|&i| v[i]).collect::<Vec<_>>();
        let entities = self
            .entities
            .iter()
            .map(|(k, labels)| {
                (
                    k.clone(),
                    keep.iter().map(|&i| labels[i].clone()).collect::<Vec<_>>(),
                )
            })
            .collect();
        SparseColumn {
            name: name.into(),
            onsets: pick(&self.onsets),
            durations: pick(&self.durations),
            values: pick(&self.values),
            entities,
        }
    }
}

/// Fixed-rate time-series representation.
///
/// Holds only the amplitudes; the per-sample time and group label live in the
/// collection-owned [`DenseIndex`](crate::resample::DenseIndex), which every
/// dense column of a collection shares.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseColumn {
    /// Column name, unique within a collection.
    pub name: String,
    /// One amplitude per sample of the shared dense index.
    pub values: Vec<f64>,
}

impl DenseColumn {
    /// Create a dense column from a sample vector.
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the column has no samples.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A column in either representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Event-list representation.
    Sparse(SparseColumn),
    /// Fixed-rate time-series representation.
    Dense(DenseColumn),
}

impl Column {
    /// The column's name.
    pub fn name(&self) -> &str {
        match self {
            Column::Sparse(c) => &c.name,
            Column::Dense(c) => &c.name,
        }
    }

    /// Rename in place.
    pub fn set_name(&mut self, name: impl Into<String>) {
        match self {
            Column::Sparse(c) => c.name = name.into(),
            Column::Dense(c) => c.name = name.into(),
        }
    }

    /// Row count (events for sparse, samples for dense).
    pub fn len(&self) -> usize {
        match self {
            Column::Sparse(c) => c.len(),
            Column::Dense(c) => c.len(),
        }
    }

    /// Whether the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The amplitude vector, independent of representation.
    pub fn values(&self) -> &[f64] {
        match self {
            Column::Sparse(c) => &c.values,
            Column::Dense(c) => &c.values,
        }
    }

    /// Mutable access to the amplitude vector.
    pub fn values_mut(&mut self) -> &mut Vec<f64> {
        match self {
            Column::Sparse(c) => &mut c.values,
            Column::Dense(c) => &mut c.values,
        }
    }

    /// Clone under a new name.
    pub fn clone_as(&self, name: impl Into<String>) -> Column {
        let mut copy = self.clone();
        copy.set_name(name);
        copy
    }

    /// The sparse variant, if this is one.
    pub fn as_sparse(&self) -> Option<&SparseColumn> {
        match self {
            Column::Sparse(c) => Some(c),
            Column::Dense(_) => None,
        }
    }

    /// The dense variant, if this is one.
    pub fn as_dense(&self) -> Option<&DenseColumn> {
        match self {
            Column::Dense(c) => Some(c),
            Column::Sparse(_) => None,
        }
    }

    /// Whether this column is dense.
    pub fn is_dense(&self) -> bool {
        matches!(self, Column::Dense(_))
    }
}

impl From<SparseColumn> for Column {
    fn from(c: SparseColumn) -> Self {
        Column::Sparse(c)
    }
}

impl From<DenseColumn> for Column {
    fn from(c: DenseColumn) -> Self {
        Column::Dense(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SparseColumn {
        SparseColumn::new(
            "RT",
            vec![0.0, 4.0, 8.0],
            vec![2.0, 2.0, 2.0],
            vec![1.0, 2.0, 3.0],
        )
        .with_entity(
            "event_file_id",
            vec!["0".into(), "0".into(), "1".into()],
        )
    }

    #[test]
    fn test_validate_parallel_lengths() {
        let col = sample();
        assert!(col.validate().is_ok());

        let mut bad = sample();
        bad.durations.pop();
        assert!(bad.validate().is_err());

        let mut bad = sample();
        bad.entities.insert("run".into(), vec!["a".into()]);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_max_onset_skips_nan() {
        let mut col = sample();
        col.onsets[1] = f64::NAN;
        assert_eq!(col.max_onset(), Some(8.0));

        let empty = SparseColumn::new("x", vec![], vec![], vec![]);
        assert_eq!(empty.max_onset(), None);
    }

    #[test]
    fn test_filter_rows_keeps_entities_aligned() {
        let col = sample();
        let out = col.filter_rows(&[0, 2], "RT/sub");
        assert_eq!(out.onsets, vec![0.0, 8.0]);
        assert_eq!(out.values, vec![1.0, 3.0]);
        assert_eq!(
            out.entity("event_file_id"),
            Some(&["0".to_string(), "1".to_string()][..])
        );
        assert!(out.validate().is_ok());
    }

    #[test]
    fn test_attr_roundtrip() {
        let mut col = sample();
        assert_eq!(col.attr(EventAttr::Amplitude), &[1.0, 2.0, 3.0]);
        col.set_attr(EventAttr::Onset, vec![1.0, 2.0, 3.0]);
        assert_eq!(col.onsets, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_event_attr_serde_alias() {
        let attr: EventAttr = serde_json::from_str("\"value\"").expect("alias");
        assert_eq!(attr, EventAttr::Amplitude);
        let attr: EventAttr = serde_json::from_str("\"onset\"").expect("onset");
        assert_eq!(attr, EventAttr::Onset);
    }

    #[test]
    fn test_clone_as() {
        let col = Column::Sparse(sample());
        let copy = col.clone_as("RT_2");
        assert_eq!(copy.name(), "RT_2");
        assert_eq!(copy.values(), col.values());
    }
}
