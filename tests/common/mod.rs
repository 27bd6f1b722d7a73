//! Shared synthetic fixture for the integration tests.
//!
//! Models a 48-run experiment (47 runs of 477 s plus one of 509 s) at the
//! default 10 Hz grid, which densifies to exactly 229280 samples. Every run
//! carries 120 events at onsets 0, 4, ..., 476 with correlated `RT` and
//! `parametric gain` columns, cyclic categorical `respcat`/`loss` columns,
//! and an independent `gain` column.

use evset::collection::{EventCollection, RunInfo, EVENT_FILE_ID};
use evset::column::{Column, SparseColumn};

pub const N_RUNS: usize = 48;
pub const EVENTS_PER_RUN: usize = 120;
pub const DENSE_LEN: usize = 229_280;
pub const MAX_ONSET: f64 = 476.0;

/// Small deterministic generator so fixtures are reproducible without a
/// rand dependency.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Lcg(seed)
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as f64 / (1u64 << 31) as f64
    }
}

pub fn fixture_collection() -> EventCollection {
    let mut runs = Vec::with_capacity(N_RUNS);
    for i in 0..N_RUNS - 1 {
        runs.push(RunInfo::new(i.to_string(), 477.0));
    }
    runs.push(RunInfo::new((N_RUNS - 1).to_string(), 509.0));

    let mut rng = Lcg::new(20_240_517);
    let n = N_RUNS * EVENTS_PER_RUN;
    let mut onsets = Vec::with_capacity(n);
    let mut durations = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut rt = Vec::with_capacity(n);
    let mut gain = Vec::with_capacity(n);
    let mut parametric_gain = Vec::with_capacity(n);
    let mut respcat = Vec::with_capacity(n);
    let mut loss = Vec::with_capacity(n);

    for run in 0..N_RUNS {
        for event in 0..EVENTS_PER_RUN {
            onsets.push(event as f64 * 4.0);
            durations.push(3.0);
            labels.push(run.to_string());

            let rt_value = 0.3 + rng.next_f64();
            rt.push(rt_value);
            gain.push(rng.next_f64() * 20.0);
            // Correlated with RT by construction, plus noise.
            parametric_gain.push(0.8 * rt_value + 0.3 * rng.next_f64());
            respcat.push([-1.0, 0.0, 1.0][event % 3]);
            loss.push([6.0, 13.0][event % 2]);
        }
    }

    let mut collection =
        EventCollection::new(runs, 10.0).expect("fixture collection");
    let columns = [
        ("RT", rt),
        ("gain", gain),
        ("parametric gain", parametric_gain),
        ("respcat", respcat),
        ("loss", loss),
    ];
    for (name, values) in columns {
        let col = SparseColumn::new(name, onsets.clone(), durations.clone(), values)
            .with_entity(EVENT_FILE_ID, labels.clone());
        collection.insert(Column::Sparse(col));
    }
    collection
}

/// Straightforward per-group z-scores, written independently of the library
/// implementation so the tests do not assume what they verify.
pub fn naive_zscore(values: &[f64], labels: &[String]) -> Vec<f64> {
    let mut out = vec![0.0; values.len()];
    let mut seen: Vec<&String> = Vec::new();
    for label in labels {
        if !seen.contains(&label) {
            seen.push(label);
        }
    }
    for label in seen {
        let rows: Vec<usize> = (0..values.len()).filter(|&i| &labels[i] == label).collect();
        let mean = rows.iter().map(|&i| values[i]).sum::<f64>() / rows.len() as f64;
        let var = rows
            .iter()
            .map(|&i| (values[i] - mean) * (values[i] - mean))
            .sum::<f64>()
            / (rows.len() - 1) as f64;
        let std = var.sqrt();
        for &i in &rows {
            out[i] = (values[i] - mean) / std;
        }
    }
    out
}

/// Pearson correlation, independent of the library implementation.
pub fn naive_pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;
    let sxy: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let sxx: f64 = x.iter().map(|a| (a - mx) * (a - mx)).sum();
    let syy: f64 = y.iter().map(|b| (b - my) * (b - my)).sum();
    sxy / (sxx * syy).sqrt()
}
