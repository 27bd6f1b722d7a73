//! # Event Collections
//!
//! An [`EventCollection`] owns the name-to-column map for one experiment's
//! worth of per-run event data, the shared [`DenseIndex`] every dense column
//! is aligned to, and the operator dispatch. Collections are mutated in place
//! by [`apply`](EventCollection::apply), [`resample`](EventCollection::resample),
//! and [`insert`](EventCollection::insert); a failing operator commits
//! nothing, so the collection is always safe to retry with corrected
//! arguments.
//!
//! The collection is single-threaded by design: every operation runs to
//! completion on in-memory buffers, and callers sharing one across threads
//! must serialize access themselves.

use std::collections::HashMap;
use std::path::Path;

use log::info;

use crate::column::{Column, DenseColumn};
use crate::resample::{self, DenseIndex, ResampleError, DEFAULT_SAMPLING_RATE};
use crate::transform::{self, Transform, TransformError};

/// The grouping key that scopes statistics to one run: every loader-built
/// sparse row and every dense-index sample carries a label under this name.
pub const EVENT_FILE_ID: &str = "event_file_id";

/// Metadata for one run: its `event_file_id` label and its length in
/// seconds. Supplied by the loader, consumed by dense-index construction.
#[derive(Debug, Clone, PartialEq)]
pub struct RunInfo {
    /// Run label, matched against the `event_file_id` entity.
    pub id: String,
    /// Run duration in seconds.
    pub duration: f64,
}

impl RunInfo {
    /// Create run metadata.
    pub fn new(id: impl Into<String>, duration: f64) -> Self {
        Self {
            id: id.into(),
            duration,
        }
    }
}

/// A mutable store of named columns sharing one dense sample grid.
#[derive(Debug)]
pub struct EventCollection {
    columns: HashMap<String, Column>,
    runs: Vec<RunInfo>,
    sampling_rate: f64,
    dense_index: Option<DenseIndex>,
}

impl Default for EventCollection {
    fn default() -> Self {
        Self {
            columns: HashMap::new(),
            runs: Vec::new(),
            sampling_rate: DEFAULT_SAMPLING_RATE,
            dense_index: None,
        }
    }
}

impl EventCollection {
    /// Create a collection over the given runs, building the shared dense
    /// index at `rate` immediately.
    pub fn new(runs: Vec<RunInfo>, rate: f64) -> Result<Self, ResampleError> {
        let dense_index = if runs.is_empty() {
            DenseIndex::build(&[], rate)?; // validates the rate
            None
        } else {
            Some(DenseIndex::build(&runs, rate)?)
        };
        Ok(Self {
            columns: HashMap::new(),
            runs,
            sampling_rate: rate,
            dense_index,
        })
    }

    /// The current shared sampling rate in Hz.
    pub fn sampling_rate(&self) -> f64 {
        self.sampling_rate
    }

    /// The ordered run metadata.
    pub fn runs(&self) -> &[RunInfo] {
        &self.runs
    }

    /// The shared dense index, if one has been built.
    pub fn dense_index(&self) -> Option<&DenseIndex> {
        self.dense_index.as_ref()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the collection holds no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Whether a column of this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Read a column by name.
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Mutable access to a column by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.get_mut(name)
    }

    /// The full name-to-column map.
    pub fn columns(&self) -> &HashMap<String, Column> {
        &self.columns
    }

    /// Column names in arbitrary order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Read a column, raising [`TransformError::MissingColumn`] when absent.
    pub fn require(&self, name: &str) -> Result<&Column, TransformError> {
        self.columns
            .get(name)
            .ok_or_else(|| TransformError::MissingColumn(name.to_string()))
    }

    /// Insert a column, replacing any existing column of the same name.
    ///
    /// Inserting a dense column into a collection without a dense index
    /// derives one on the spot: a single run spanning the column at the
    /// current sampling rate, so later dense operations stay aligned.
    pub fn insert(&mut self, column: Column) {
        if column.is_dense() && self.dense_index.is_none() {
            let duration = column.len() as f64 / self.sampling_rate;
            let run = RunInfo::new("0", duration);
            // The rate was validated when it was set; a rebuild from one
            // synthetic run cannot fail.
            if let Ok(index) = DenseIndex::build(&[run.clone()], self.sampling_rate) {
                self.runs = vec![run];
                self.dense_index = Some(index);
            }
        }
        self.columns.insert(column.name().to_string(), column);
    }

    /// Remove a column by name, returning it if present.
    pub fn remove(&mut self, name: &str) -> Option<Column> {
        self.columns.remove(name)
    }

    /// Convert a column to dense on the shared index (dense columns pass
    /// through unchanged).
    pub fn to_dense_column(&self, column: &Column) -> Result<DenseColumn, TransformError> {
        match column {
            Column::Dense(c) => Ok(c.clone()),
            Column::Sparse(c) => {
                let index = self.dense_index.as_ref().ok_or(ResampleError::MissingIndex)?;
                Ok(resample::to_dense(c, index)?)
            }
        }
    }

    /// One run label per dense sample, from the shared index.
    pub fn dense_labels(&self) -> Result<Vec<String>, TransformError> {
        let index = self.dense_index.as_ref().ok_or(ResampleError::MissingIndex)?;
        Ok(index.labels())
    }

    /// Per-row grouping labels for a column: the `event_file_id` entity for
    /// sparse columns (one group when absent), the dense index for dense
    /// columns.
    pub fn group_labels(&self, column: &Column) -> Result<Vec<String>, TransformError> {
        match column {
            Column::Sparse(c) => Ok(match c.entity(EVENT_FILE_ID) {
                Some(labels) => labels.to_vec(),
                None => vec![String::new(); c.len()],
            }),
            Column::Dense(c) => {
                let labels = self.dense_labels()?;
                if labels.len() != c.len() {
                    return Err(TransformError::ShapeMismatch(format!(
                        "dense column '{}' has {} samples but the index has {}",
                        c.name,
                        c.len(),
                        labels.len()
                    )));
                }
                Ok(labels)
            }
        }
    }

    /// Apply one transform. All outputs are computed before anything is
    /// written, so on error the collection is unchanged.
    pub fn apply(&mut self, transform: &Transform) -> Result<(), TransformError> {
        let patch = transform::execute(self, transform)?;
        for name in &patch.remove {
            self.columns.remove(name);
        }
        for column in patch.insert {
            self.insert(column);
        }
        info!("applied transform '{}'", transform.name());
        Ok(())
    }

    /// Apply an operator by runtime name with JSON-encoded arguments.
    pub fn apply_by_name(
        &mut self,
        name: &str,
        args: serde_json::Value,
    ) -> Result<(), TransformError> {
        let transform = Transform::from_name_args(name, args)?;
        self.apply(&transform)
    }

    /// Apply an ordered sequence of transforms, stopping at the first
    /// failure. Each step is individually atomic; earlier steps stay
    /// applied.
    pub fn apply_spec(&mut self, spec: &[Transform]) -> Result<(), TransformError> {
        for transform in spec {
            self.apply(transform)?;
        }
        Ok(())
    }

    /// Read an ordered pipeline document from disk and apply it.
    pub fn apply_from_json(&mut self, path: impl AsRef<Path>) -> Result<(), TransformError> {
        let spec = transform::read_spec(path)?;
        info!("applying {} transforms from document", spec.len());
        self.apply_spec(&spec)
    }

    /// Rebuild the shared dense index at `rate` and re-align every dense
    /// column to the new grid. With `force_dense`, sparse columns are also
    /// converted. All new values are computed before any column is
    /// replaced.
    pub fn resample(&mut self, rate: f64, force_dense: bool) -> Result<(), ResampleError> {
        let new_index = match &self.dense_index {
            Some(index) => index.with_rate(rate)?,
            None if !self.runs.is_empty() => DenseIndex::build(&self.runs, rate)?,
            None => {
                DenseIndex::build(&[], rate)?; // validates the rate
                self.sampling_rate = rate;
                return Ok(());
            }
        };

        let new_len = new_index.len();
        let mut staged: Vec<Column> = Vec::new();
        for column in self.columns.values() {
            match column {
                Column::Dense(c) => {
                    let values = resample::regrid(&c.values, new_len);
                    staged.push(Column::Dense(DenseColumn::new(c.name.clone(), values)));
                }
                Column::Sparse(c) if force_dense => {
                    staged.push(Column::Dense(resample::to_dense(c, &new_index)?));
                }
                Column::Sparse(_) => {}
            }
        }

        info!(
            "resampled collection from {} Hz to {} Hz ({} samples)",
            self.sampling_rate, rate, new_len
        );
        self.dense_index = Some(new_index);
        self.sampling_rate = rate;
        for column in staged {
            self.columns.insert(column.name().to_string(), column);
        }
        Ok(())
    }
}

impl std::ops::Index<&str> for EventCollection {
    type Output = Column;

    /// Read a column by name; panics when absent (use
    /// [`get`](EventCollection::get) for fallible access).
    fn index(&self, name: &str) -> &Column {
        match self.columns.get(name) {
            Some(column) => column,
            None => panic!("no column named '{name}' in collection"),
        }
    }
}
