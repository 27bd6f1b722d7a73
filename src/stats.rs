//! Grouped statistics for run-safe column transforms.
//!
//! Everything here operates strictly within group-label boundaries, so a
//! statistic computed for one run never sees another run's observations.
//! NaN inputs are not rejected; they propagate through means and residuals,
//! matching the library's permissive numeric philosophy.

/// Row indices per distinct label, in first-appearance order.
pub fn group_indices(labels: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut order: Vec<(String, Vec<usize>)> = Vec::new();
    for (i, label) in labels.iter().enumerate() {
        match order.iter_mut().find(|(l, _)| l == label) {
            Some((_, rows)) => rows.push(i),
            None => order.push((label.clone(), vec![i])),
        }
    }
    order
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (n - 1 denominator). NaN for fewer than two
/// observations.
fn sample_std(data: &[f64], mean: f64) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    let ss = data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    (ss / (data.len() - 1) as f64).sqrt()
}

/// Z-standardize values independently per group.
///
/// For each group, `(x - group_mean) / group_std` with the sample standard
/// deviation. A zero-variance group divides zero by zero and yields NaN
/// rather than silently producing zeros.
pub fn zscore_by_group(values: &[f64], labels: &[String]) -> Vec<f64> {
    debug_assert_eq!(values.len(), labels.len());
    let mut out = vec![0.0; values.len()];
    for (_, rows) in group_indices(labels) {
        let group: Vec<f64> = rows.iter().map(|&i| values[i]).collect();
        let m = mean(&group);
        let s = sample_std(&group, m);
        for &i in &rows {
            out[i] = (values[i] - m) / s;
        }
    }
    out
}

/// Replace `y` with per-group residuals of an OLS fit of `y` on `x`.
///
/// The fit includes an intercept, so within each group the residuals have
/// zero mean and zero correlation with `x`. A group where `x` has no
/// variance falls back to demeaning `y`.
pub fn residualize_by_group(y: &[f64], x: &[f64], labels: &[String]) -> Vec<f64> {
    debug_assert_eq!(y.len(), x.len());
    debug_assert_eq!(y.len(), labels.len());
    let mut out = vec![0.0; y.len()];
    for (_, rows) in group_indices(labels) {
        let gx: Vec<f64> = rows.iter().map(|&i| x[i]).collect();
        let gy: Vec<f64> = rows.iter().map(|&i| y[i]).collect();
        let mx = mean(&gx);
        let my = mean(&gy);
        let sxx: f64 = gx.iter().map(|v| (v - mx) * (v - mx)).sum();
        let sxy: f64 = gx
            .iter()
            .zip(&gy)
            .map(|(xv, yv)| (xv - mx) * (yv - my))
            .sum();
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        for &i in &rows {
            out[i] = (y[i] - my) - slope * (x[i] - mx);
        }
    }
    out
}

/// Pearson correlation coefficient. NaN when either side has no variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    let mx = mean(x);
    let my = mean(y);
    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (xv, yv) in x.iter().zip(y) {
        sxx += (xv - mx) * (xv - mx);
        syy += (yv - my) * (yv - my);
        sxy += (xv - mx) * (yv - my);
    }
    sxy / (sxx * syy).sqrt()
}
