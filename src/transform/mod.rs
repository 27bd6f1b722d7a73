//! # Transform Operators
//!
//! The operator set is a closed, strongly-typed enum: one [`Transform`]
//! variant per operation, each carrying its own argument struct. Dispatch is
//! a pattern match, and the serde representation (a `"name"` tag plus the
//! flattened arguments) doubles as the grammar of the JSON pipeline document,
//! so programmatic, name-based, and file-based invocation all share one
//! definition.
//!
//! Operators are pure with respect to the collection: each one reads columns,
//! computes every output, and only then does the collection commit the
//! results. A failing operator leaves the collection exactly as it was.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::column::{Column, EventAttr};
use crate::resample::ResampleError;

mod ops;

pub(crate) use ops::execute;

/// Errors raised by transform operators and their dispatch.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// An operator referenced a column the collection does not hold.
    #[error("column not found: '{0}'")]
    MissingColumn(String),

    /// Columns of incompatible length, representation, or event alignment.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An unknown operator name was passed to name-based dispatch.
    #[error("unknown transformation: '{0}'")]
    InvalidOperator(String),

    /// Arguments that are structurally valid but semantically unusable.
    #[error("invalid arguments for '{op}': {message}")]
    InvalidArguments {
        /// Operator name.
        op: &'static str,
        /// What was wrong.
        message: String,
    },

    /// Index construction or rate conversion failed.
    #[error(transparent)]
    Resample(#[from] ResampleError),

    /// Reading a pipeline document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a pipeline document or operator arguments failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Arguments for [`Transform::Rename`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameArgs {
    /// Column to relabel.
    pub source: String,
    /// New name; replaces any existing column of that name.
    pub output: String,
}

/// Arguments for [`Transform::Sum`] and [`Transform::Product`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineArgs {
    /// Two or more input columns sharing representation and alignment.
    pub cols: Vec<String>,
    /// Name of the combined output column.
    pub output: String,
    /// Convert all inputs to dense before combining.
    #[serde(default)]
    pub dense: bool,
}

/// Arguments for [`Transform::Scale`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleArgs {
    /// Columns to z-standardize, each independently per run.
    pub cols: Vec<String>,
    /// Output names, parallel to `cols`; empty standardizes in place.
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Arguments for [`Transform::Orthogonalize`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrthogonalizeArgs {
    /// Columns to residualize against `other`, in place.
    pub cols: Vec<String>,
    /// The regressor column.
    pub other: String,
    /// Convert both operands to dense first, so the pointwise regression
    /// runs on the shared sample grid and grouping follows the dense index.
    #[serde(default)]
    pub dense: bool,
}

fn default_true() -> bool {
    true
}

/// Arguments for [`Transform::Threshold`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdArgs {
    /// Column to rewrite in place.
    pub col: String,
    /// The cut point.
    #[serde(default)]
    pub threshold: f64,
    /// Collapse surviving values to `1.0` instead of keeping them.
    #[serde(default)]
    pub binarize: bool,
    /// Compare raw values directionally; `false` compares magnitudes
    /// (`|value|` against `|threshold|`, a two-sided band).
    #[serde(default = "default_true")]
    pub signed: bool,
    /// Keep values at or above the cut; `false` keeps at or below.
    #[serde(default = "default_true")]
    pub above: bool,
}

/// Arguments for [`Transform::Split`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitArgs {
    /// Columns to partition.
    pub cols: Vec<String>,
    /// Grouping columns; each output is one distinct value combination.
    pub by: Vec<String>,
}

fn default_amplitude() -> EventAttr {
    EventAttr::Amplitude
}

fn default_onset() -> EventAttr {
    EventAttr::Onset
}

/// Arguments for [`Transform::Assign`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignArgs {
    /// Column providing the replacement vector.
    pub source: String,
    /// Column providing the remaining structure.
    pub target: String,
    /// Which of the source's per-event vectors to read.
    #[serde(default = "default_amplitude")]
    pub input_attr: EventAttr,
    /// Which of the target's per-event vectors to overwrite.
    #[serde(default = "default_onset")]
    pub target_attr: EventAttr,
    /// Name of the assembled output column.
    pub output: String,
}

/// One transformation step.
///
/// Serializes with a `"name"` tag, so a pipeline document is an ordered JSON
/// array of these:
///
/// ```json
/// [{ "name": "scale", "cols": ["RT"], "outputs": ["RT_Z"] }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "lowercase")]
pub enum Transform {
    /// Relabel a column, dropping the old name.
    Rename(RenameArgs),
    /// Pointwise sum of two or more aligned columns.
    Sum(CombineArgs),
    /// Pointwise product of two or more aligned columns.
    Product(CombineArgs),
    /// Per-run z-standardization.
    Scale(ScaleArgs),
    /// Per-run OLS residualization against another column.
    Orthogonalize(OrthogonalizeArgs),
    /// Threshold or binarize a column's values in place.
    Threshold(ThresholdArgs),
    /// Partition columns by the values of grouping columns.
    Split(SplitArgs),
    /// Rebuild a sparse column by attribute substitution.
    Assign(AssignArgs),
}

/// Operator names accepted by [`Transform::from_name_args`], in
/// documentation order.
pub const OPERATOR_NAMES: [&str; 8] = [
    "rename",
    "sum",
    "product",
    "scale",
    "orthogonalize",
    "threshold",
    "split",
    "assign",
];

impl Transform {
    /// The operator's serialized name.
    pub fn name(&self) -> &'static str {
        match self {
            Transform::Rename(_) => "rename",
            Transform::Sum(_) => "sum",
            Transform::Product(_) => "product",
            Transform::Scale(_) => "scale",
            Transform::Orthogonalize(_) => "orthogonalize",
            Transform::Threshold(_) => "threshold",
            Transform::Split(_) => "split",
            Transform::Assign(_) => "assign",
        }
    }

    /// Build a transform from a runtime operator name and a JSON argument
    /// object.
    ///
    /// Unknown names are [`TransformError::InvalidOperator`]; malformed
    /// arguments for a known operator surface as a JSON error.
    pub fn from_name_args(
        name: &str,
        args: serde_json::Value,
    ) -> Result<Transform, TransformError> {
        let op = OPERATOR_NAMES
            .iter()
            .copied()
            .find(|n| *n == name)
            .ok_or_else(|| TransformError::InvalidOperator(name.to_string()))?;
        let mut object = match args {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(TransformError::InvalidArguments {
                    op,
                    message: format!("expected a JSON object of arguments, got {other}"),
                })
            }
        };
        object.insert("name".to_string(), serde_json::Value::String(op.to_string()));
        Ok(serde_json::from_value(serde_json::Value::Object(object))?)
    }
}

/// Read an ordered pipeline document (a JSON array of transforms) from disk.
pub fn read_spec(path: impl AsRef<Path>) -> Result<Vec<Transform>, TransformError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// The staged result of one operator: columns to insert (replacing any of
/// the same name) and names to remove. Commitment is the collection's job,
/// which is what makes each `apply` call atomic.
pub(crate) struct Patch {
    pub insert: Vec<Column>,
    pub remove: Vec<String>,
}

impl Patch {
    pub(crate) fn insert_only(insert: Vec<Column>) -> Self {
        Self {
            insert,
            remove: Vec::new(),
        }
    }
}
