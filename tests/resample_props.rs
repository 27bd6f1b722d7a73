//! Property tests for the resampling layer: exact length preservation and
//! idempotence, for arbitrary rates and run layouts.

use proptest::prelude::*;

use evset::collection::RunInfo;
use evset::resample::{regrid, DenseIndex};

proptest! {
    #[test]
    fn prop_regrid_length_is_exact(
        values in prop::collection::vec(-1e6..1e6f64, 0..256),
        new_len in 0usize..512,
    ) {
        prop_assert_eq!(regrid(&values, new_len).len(), new_len);
    }

    #[test]
    fn prop_regrid_to_same_length_is_identity(
        values in prop::collection::vec(-1e6..1e6f64, 1..256),
    ) {
        let n = values.len();
        prop_assert_eq!(regrid(&values, n), values);
    }

    #[test]
    fn prop_regrid_integer_upsample_replicates(
        values in prop::collection::vec(-1e6..1e6f64, 1..64),
        factor in 1usize..6,
    ) {
        let up = regrid(&values, values.len() * factor);
        for (j, v) in up.iter().enumerate() {
            prop_assert_eq!(*v, values[j / factor]);
        }
    }

    #[test]
    fn prop_regrid_preserves_constant_series(
        level in -1e3..1e3f64,
        old_len in 1usize..128,
        new_len in 1usize..128,
    ) {
        let out = regrid(&vec![level; old_len], new_len);
        for v in out {
            prop_assert!((v - level).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_index_rebuild_at_same_rate_is_noop(
        durations in prop::collection::vec(0.5..200.0f64, 1..12),
        rate in 0.5..100.0f64,
    ) {
        let runs: Vec<RunInfo> = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| RunInfo::new(i.to_string(), d))
            .collect();
        let index = DenseIndex::build(&runs, rate).expect("index");
        let rebuilt = index.with_rate(rate).expect("rebuild");
        prop_assert_eq!(index, rebuilt);
    }

    #[test]
    fn prop_index_length_is_sum_of_segments(
        durations in prop::collection::vec(0.5..200.0f64, 1..12),
        rate in 0.5..100.0f64,
    ) {
        let runs: Vec<RunInfo> = durations
            .iter()
            .enumerate()
            .map(|(i, &d)| RunInfo::new(i.to_string(), d))
            .collect();
        let index = DenseIndex::build(&runs, rate).expect("index");
        let total: usize = index.segments().iter().map(|s| s.len).sum();
        prop_assert_eq!(index.len(), total);
        prop_assert_eq!(index.labels().len(), total);
        prop_assert_eq!(index.times().len(), total);
    }
}
