//! # evset - Event Series Collections for Task-Based Neuroimaging
//!
//! `evset` manages time-stamped experimental event data (stimulus onsets,
//! response times, parametric covariates) recorded per run in a neuroimaging
//! experiment, and applies a declarative sequence of transformations to derive
//! new event series for downstream modeling.
//!
//! ## Key Features
//!
//! - **Dual Representation**: Every column is either *sparse* (one
//!   onset/duration/amplitude triple per event) or *dense* (one amplitude per
//!   sample at a shared fixed rate), with explicit conversion between the two.
//!
//! - **Run-Safe Statistics**: Scaling and orthogonalization are computed
//!   independently per run (`event_file_id` group), so normalization never
//!   mixes observations across acquisition boundaries.
//!
//! - **Declarative Pipelines**: Transformations are a closed, strongly-typed
//!   operator set ([`transform::Transform`]) that serializes to an ordered
//!   JSON document, so a whole pipeline can live next to the data it derives.
//!
//! - **Exact Resampling**: Rate changes preserve total column length exactly
//!   for any positive rate ratio, integer or not.
//!
//! ## Quick Start
//!
//! ```rust
//! use evset::collection::{EventCollection, RunInfo};
//! use evset::column::{Column, SparseColumn};
//! use evset::transform::{RenameArgs, Transform};
//!
//! // One 60-second run sampled at 10 Hz.
//! let runs = vec![RunInfo::new("0", 60.0)];
//! let mut collection = EventCollection::new(runs, 10.0)?;
//!
//! let rt = SparseColumn::new("RT", vec![2.0, 10.0], vec![1.5, 1.5], vec![0.8, 1.1])
//!     .with_entity("event_file_id", vec!["0".into(), "0".into()]);
//! collection.insert(Column::Sparse(rt));
//!
//! collection.apply(&Transform::Rename(RenameArgs {
//!     source: "RT".into(),
//!     output: "reaction_time".into(),
//! }))?;
//!
//! assert!(collection.contains("reaction_time"));
//! assert!(!collection.contains("RT"));
//! # Ok::<(), evset::transform::TransformError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`column`]: sparse and dense column representations
//! - [`resample`]: the shared dense index and sparse/dense rate conversion
//! - [`transform`]: the operator set and its JSON dispatch
//! - [`collection`]: the column store, operator application, resampling
//! - [`stats`]: grouped statistics used by the scaling operators
//! - [`loader`]: BIDS-style `events.tsv` ingestion
//!
//! ## Transform Documents
//!
//! A pipeline is an ordered JSON array; each element names an operator and its
//! arguments:
//!
//! ```json
//! [
//!   { "name": "scale", "cols": ["RT"], "outputs": ["RT_Z"] },
//!   { "name": "orthogonalize", "cols": ["gain"], "other": "RT_Z" },
//!   { "name": "threshold", "col": "gain", "threshold": 0.2, "binarize": true }
//! ]
//! ```

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod collection;
pub mod column;
pub mod loader;
pub mod resample;
pub mod stats;
pub mod transform;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::collection::{EventCollection, RunInfo, EVENT_FILE_ID};
    pub use crate::column::{Column, DenseColumn, EventAttr, SparseColumn};
    pub use crate::loader::{load_collection, EventFile, LoadError};
    pub use crate::resample::{DenseIndex, ResampleError, DEFAULT_SAMPLING_RATE};
    pub use crate::transform::{Transform, TransformError};
}
