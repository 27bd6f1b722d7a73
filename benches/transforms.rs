//! Benchmarks for the core transform operators over a realistic multi-run
//! collection.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use evset::collection::{EventCollection, RunInfo, EVENT_FILE_ID};
use evset::column::{Column, SparseColumn};
use evset::transform::{OrthogonalizeArgs, ScaleArgs, Transform};

const N_RUNS: usize = 8;
const EVENTS_PER_RUN: usize = 120;

fn fixture() -> EventCollection {
    let runs: Vec<RunInfo> = (0..N_RUNS)
        .map(|i| RunInfo::new(i.to_string(), 480.0))
        .collect();
    let mut collection = EventCollection::new(runs, 10.0).expect("collection");

    let mut state = 0x2545F4914F6CDD1Du64;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        (state >> 33) as f64 / (1u64 << 31) as f64
    };

    let n = N_RUNS * EVENTS_PER_RUN;
    let mut onsets = Vec::with_capacity(n);
    let mut durations = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut rt = Vec::with_capacity(n);
    let mut gain = Vec::with_capacity(n);
    for run in 0..N_RUNS {
        for event in 0..EVENTS_PER_RUN {
            onsets.push(event as f64 * 4.0);
            durations.push(3.0);
            labels.push(run.to_string());
            let r = next();
            rt.push(0.3 + r);
            gain.push(0.8 * r + next());
        }
    }
    for (name, values) in [("RT", rt), ("gain", gain)] {
        let col = SparseColumn::new(name, onsets.clone(), durations.clone(), values)
            .with_entity(EVENT_FILE_ID, labels.clone());
        collection.insert(Column::Sparse(col));
    }
    collection
}

fn bench_to_dense(c: &mut Criterion) {
    let coll = fixture();
    c.bench_function("to_dense_8x480s", |b| {
        b.iter(|| {
            let dense = coll.to_dense_column(&coll["RT"]).expect("dense");
            black_box(dense.len())
        })
    });
}

fn bench_scale(c: &mut Criterion) {
    c.bench_function("scale_per_run", |b| {
        b.iter_with_setup(fixture, |mut coll| {
            coll.apply(&Transform::Scale(ScaleArgs {
                cols: vec!["RT".into()],
                outputs: vec!["RT_Z".into()],
            }))
            .expect("scale");
            black_box(coll.len())
        })
    });
}

fn bench_orthogonalize_dense(c: &mut Criterion) {
    c.bench_function("orthogonalize_dense", |b| {
        b.iter_with_setup(fixture, |mut coll| {
            coll.apply(&Transform::Orthogonalize(OrthogonalizeArgs {
                cols: vec!["gain".into()],
                other: "RT".into(),
                dense: true,
            }))
            .expect("orthogonalize");
            black_box(coll.len())
        })
    });
}

fn bench_resample(c: &mut Criterion) {
    c.bench_function("resample_10hz_to_50hz_force_dense", |b| {
        b.iter_with_setup(fixture, |mut coll| {
            coll.resample(50.0, true).expect("resample");
            black_box(coll.dense_index().map(|i| i.len()))
        })
    });
}

criterion_group!(
    benches,
    bench_to_dense,
    bench_scale,
    bench_orthogonalize_dense,
    bench_resample
);
criterion_main!(benches);
