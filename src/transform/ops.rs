//! Operator implementations.
//!
//! Every function here reads from the collection and returns a [`Patch`];
//! nothing mutates the collection directly. `EventCollection::apply` commits
//! the patch only after the whole computation succeeds.

use log::debug;

use crate::collection::{EventCollection, EVENT_FILE_ID};
use crate::column::{Column, DenseColumn, SparseColumn};
use crate::stats;
use crate::transform::{
    AssignArgs, CombineArgs, OrthogonalizeArgs, Patch, RenameArgs, ScaleArgs, SplitArgs,
    ThresholdArgs, Transform, TransformError,
};

/// Dispatch one transform against the collection, producing its patch.
pub(crate) fn execute(
    coll: &EventCollection,
    transform: &Transform,
) -> Result<Patch, TransformError> {
    debug!("executing transform '{}'", transform.name());
    match transform {
        Transform::Rename(args) => rename(coll, args),
        Transform::Sum(args) => combine(coll, args, false),
        Transform::Product(args) => combine(coll, args, true),
        Transform::Scale(args) => scale(coll, args),
        Transform::Orthogonalize(args) => orthogonalize(coll, args),
        Transform::Threshold(args) => threshold(coll, args),
        Transform::Split(args) => split(coll, args),
        Transform::Assign(args) => assign(coll, args),
    }
}

fn rename(coll: &EventCollection, args: &RenameArgs) -> Result<Patch, TransformError> {
    let source = coll.require(&args.source)?;
    let copy = source.clone_as(&args.output);
    let remove = if args.source == args.output {
        Vec::new()
    } else {
        vec![args.source.clone()]
    };
    Ok(Patch {
        insert: vec![copy],
        remove,
    })
}

fn combine(
    coll: &EventCollection,
    args: &CombineArgs,
    product: bool,
) -> Result<Patch, TransformError> {
    let op = if product { "product" } else { "sum" };
    if args.cols.len() < 2 {
        return Err(TransformError::InvalidArguments {
            op,
            message: format!("need at least 2 columns, got {}", args.cols.len()),
        });
    }
    let inputs: Vec<&Column> = args
        .cols
        .iter()
        .map(|name| coll.require(name))
        .collect::<Result<_, _>>()?;

    if args.dense {
        let first = coll.to_dense_column(inputs[0])?;
        let mut values = first.values;
        for col in &inputs[1..] {
            let dense = coll.to_dense_column(col)?;
            fold(&mut values, &dense.values, product);
        }
        return Ok(Patch::insert_only(vec![Column::Dense(DenseColumn::new(
            args.output.clone(),
            values,
        ))]));
    }

    // Without forced densification all inputs must already be aligned.
    for col in &inputs[1..] {
        if col.is_dense() != inputs[0].is_dense() {
            return Err(TransformError::ShapeMismatch(format!(
                "{op}: '{}' and '{}' mix sparse and dense; pass dense=true to align them",
                inputs[0].name(),
                col.name()
            )));
        }
        if col.len() != inputs[0].len() {
            return Err(TransformError::ShapeMismatch(format!(
                "{op}: '{}' has {} rows but '{}' has {}",
                inputs[0].name(),
                inputs[0].len(),
                col.name(),
                col.len()
            )));
        }
        if let (Some(a), Some(b)) = (inputs[0].as_sparse(), col.as_sparse()) {
            if a.onsets != b.onsets || a.durations != b.durations {
                return Err(TransformError::ShapeMismatch(format!(
                    "{op}: sparse columns '{}' and '{}' have different event timing; \
                     pass dense=true to align them",
                    a.name, b.name
                )));
            }
        }
    }

    let mut values = inputs[0].values().to_vec();
    for col in &inputs[1..] {
        fold(&mut values, col.values(), product);
    }
    // Output inherits onsets, durations, and entities from the first input.
    let mut output = inputs[0].clone_as(&args.output);
    *output.values_mut() = values;
    Ok(Patch::insert_only(vec![output]))
}

fn fold(acc: &mut [f64], values: &[f64], product: bool) {
    for (a, v) in acc.iter_mut().zip(values) {
        if product {
            *a *= v;
        } else {
            *a += v;
        }
    }
}

fn scale(coll: &EventCollection, args: &ScaleArgs) -> Result<Patch, TransformError> {
    if !args.outputs.is_empty() && args.outputs.len() != args.cols.len() {
        return Err(TransformError::InvalidArguments {
            op: "scale",
            message: format!(
                "{} output names for {} columns",
                args.outputs.len(),
                args.cols.len()
            ),
        });
    }
    let mut insert = Vec::with_capacity(args.cols.len());
    for (i, name) in args.cols.iter().enumerate() {
        let col = coll.require(name)?;
        let labels = coll.group_labels(col)?;
        let z = stats::zscore_by_group(col.values(), &labels);
        let output = args.outputs.get(i).unwrap_or(name);
        let mut out = col.clone_as(output);
        *out.values_mut() = z;
        insert.push(out);
    }
    Ok(Patch::insert_only(insert))
}

fn orthogonalize(
    coll: &EventCollection,
    args: &OrthogonalizeArgs,
) -> Result<Patch, TransformError> {
    let other = coll.require(&args.other)?;
    let mut insert = Vec::with_capacity(args.cols.len());
    for name in &args.cols {
        let col = coll.require(name)?;
        if args.dense {
            // Regress on the shared sample grid; group boundaries come from
            // the dense index, not the sparse event rows.
            let y = coll.to_dense_column(col)?;
            let x = coll.to_dense_column(other)?;
            let labels = coll.dense_labels()?;
            let resid = stats::residualize_by_group(&y.values, &x.values, &labels);
            insert.push(Column::Dense(DenseColumn::new(name.clone(), resid)));
            continue;
        }
        if col.is_dense() != other.is_dense() {
            return Err(TransformError::ShapeMismatch(format!(
                "orthogonalize: '{}' and '{}' mix sparse and dense; pass dense=true",
                name,
                other.name()
            )));
        }
        if col.len() != other.len() {
            return Err(TransformError::ShapeMismatch(format!(
                "orthogonalize: '{}' has {} rows but '{}' has {}",
                name,
                col.len(),
                other.name(),
                other.len()
            )));
        }
        let labels = coll.group_labels(col)?;
        let resid = stats::residualize_by_group(col.values(), other.values(), &labels);
        let mut out = col.clone_as(name);
        *out.values_mut() = resid;
        insert.push(out);
    }
    Ok(Patch::insert_only(insert))
}

fn threshold(coll: &EventCollection, args: &ThresholdArgs) -> Result<Patch, TransformError> {
    let mut out = coll.require(&args.col)?.clone();
    let cut = if args.signed {
        args.threshold
    } else {
        args.threshold.abs()
    };
    for v in out.values_mut() {
        let probe = if args.signed { *v } else { v.abs() };
        let keep = if args.above { probe >= cut } else { probe <= cut };
        *v = match (keep, args.binarize) {
            (false, _) => 0.0,
            (true, true) => 1.0,
            (true, false) => *v,
        };
    }
    Ok(Patch::insert_only(vec![out]))
}

fn split(coll: &EventCollection, args: &SplitArgs) -> Result<Patch, TransformError> {
    if args.by.is_empty() {
        return Err(TransformError::InvalidArguments {
            op: "split",
            message: "need at least one grouping column".to_string(),
        });
    }
    let mut insert = Vec::new();
    for name in &args.cols {
        match coll.require(name)? {
            Column::Sparse(col) => split_sparse(coll, col, &args.by, &mut insert)?,
            Column::Dense(col) => split_dense(coll, col, &args.by, &mut insert)?,
        }
    }
    Ok(Patch::insert_only(insert))
}

/// Row-filter a sparse column into disjoint shorter columns, one per
/// distinct combination of the grouping values.
fn split_sparse(
    coll: &EventCollection,
    col: &SparseColumn,
    by: &[String],
    insert: &mut Vec<Column>,
) -> Result<(), TransformError> {
    let mut keys = vec![String::new(); col.len()];
    for (k, by_name) in by.iter().enumerate() {
        let values = per_event_values(coll, col, by_name)?;
        for (row, key) in keys.iter_mut().enumerate() {
            if k > 0 {
                key.push('_');
            }
            key.push_str(&group_label(values[row]));
        }
    }
    for (key, rows) in stats::group_indices(&keys) {
        let output = format!("{}/{}", col.name, key);
        insert.push(Column::Sparse(col.filter_rows(&rows, output)));
    }
    Ok(())
}

/// Mask a dense column into same-length columns, one per distinct
/// combination of the grouping values; non-matching samples are zeroed,
/// never removed.
fn split_dense(
    coll: &EventCollection,
    col: &DenseColumn,
    by: &[String],
    insert: &mut Vec<Column>,
) -> Result<(), TransformError> {
    let mut keys = vec![String::new(); col.len()];
    for (k, by_name) in by.iter().enumerate() {
        let dense = coll.to_dense_column(coll.require(by_name)?)?;
        if dense.len() != col.len() {
            return Err(TransformError::ShapeMismatch(format!(
                "split: grouping column '{}' has {} samples but '{}' has {}",
                by_name,
                dense.len(),
                col.name,
                col.len()
            )));
        }
        for (sample, key) in keys.iter_mut().enumerate() {
            if k > 0 {
                key.push('_');
            }
            key.push_str(&group_label(dense.values[sample]));
        }
    }
    for (key, samples) in stats::group_indices(&keys) {
        let mut values = vec![0.0; col.len()];
        for &i in &samples {
            values[i] = col.values[i];
        }
        let output = format!("{}/{}", col.name, key);
        insert.push(Column::Dense(DenseColumn::new(output, values)));
    }
    Ok(())
}

/// Resolve a grouping column to one value per event of `col`.
///
/// A sparse grouping column must match the event count; a dense one is read
/// at each event's onset sample.
fn per_event_values(
    coll: &EventCollection,
    col: &SparseColumn,
    by_name: &str,
) -> Result<Vec<f64>, TransformError> {
    match coll.require(by_name)? {
        Column::Sparse(by) => {
            if by.len() != col.len() {
                return Err(TransformError::ShapeMismatch(format!(
                    "split: grouping column '{}' has {} events but '{}' has {}",
                    by_name,
                    by.len(),
                    col.name,
                    col.len()
                )));
            }
            Ok(by.values.clone())
        }
        Column::Dense(by) => {
            let index = coll.dense_index().ok_or(crate::resample::ResampleError::MissingIndex)?;
            if by.len() != index.len() {
                return Err(TransformError::ShapeMismatch(format!(
                    "split: dense grouping column '{}' is misaligned with the dense index",
                    by_name
                )));
            }
            let labels = col.entity(EVENT_FILE_ID);
            let mut out = Vec::with_capacity(col.len());
            for row in 0..col.len() {
                let seg = match labels {
                    Some(labels) => index.segment(&labels[row]).ok_or_else(|| {
                        crate::resample::ResampleError::MissingRun(labels[row].clone())
                    })?,
                    None if index.segments().len() == 1 => &index.segments()[0],
                    None => {
                        return Err(crate::resample::ResampleError::MissingRun(
                            EVENT_FILE_ID.to_string(),
                        )
                        .into())
                    }
                };
                let onset = col.onsets[row];
                if seg.len == 0 || !onset.is_finite() {
                    out.push(f64::NAN);
                    continue;
                }
                let sample = ((onset * index.rate()).round().max(0.0) as usize).min(seg.len - 1);
                out.push(by.values[seg.offset + sample]);
            }
            Ok(out)
        }
    }
}

/// Human-readable label for a grouping value: integral values drop the
/// fractional part, so a `respcat` of `-1.0` splits to `col/-1`.
fn group_label(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn assign(coll: &EventCollection, args: &AssignArgs) -> Result<Patch, TransformError> {
    let source = coll
        .require(&args.source)?
        .as_sparse()
        .ok_or_else(|| {
            TransformError::ShapeMismatch(format!(
                "assign: source '{}' must be sparse",
                args.source
            ))
        })?;
    let target = coll
        .require(&args.target)?
        .as_sparse()
        .ok_or_else(|| {
            TransformError::ShapeMismatch(format!(
                "assign: target '{}' must be sparse",
                args.target
            ))
        })?;
    if source.len() != target.len() {
        return Err(TransformError::ShapeMismatch(format!(
            "assign: '{}' has {} events but '{}' has {}",
            args.source,
            source.len(),
            args.target,
            target.len()
        )));
    }
    let mut out = target.clone();
    out.name = args.output.clone();
    out.set_attr(args.target_attr, source.attr(args.input_attr).to_vec());
    Ok(Patch::insert_only(vec![Column::Sparse(out)]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_label_formatting() {
        assert_eq!(group_label(-1.0), "-1");
        assert_eq!(group_label(0.0), "0");
        assert_eq!(group_label(-0.0), "0");
        assert_eq!(group_label(13.0), "13");
        assert_eq!(group_label(0.5), "0.5");
        assert_eq!(group_label(f64::NAN), "NaN");
    }
}
