//! Tests for threshold search

use super::entropy::kl_divergence;
use super::*;
use crate::quant::fake_quantize::{FloatFormat, NumBits};
use crate::quant::histogram::Histogram;
use crate::CalibError;
use approx::assert_abs_diff_eq;
use proptest::prelude::*;

fn integer_edges(num_bins: usize) -> Vec<f32> {
    (0..=num_bins).map(|k| k as f32).collect()
}

fn example_histogram() -> Histogram {
    let mut hist = Histogram::uniform(3.0, 4).unwrap();
    hist.accumulate(&[1.0, 0.5, 2.0, 2.0, 3.0]);
    hist
}

fn dense_histogram() -> Histogram {
    let values: Vec<f32> = (0..5000).map(|k| k as f32 * 0.001).collect();
    let mut hist = Histogram::uniform(10.0, 256).unwrap();
    hist.accumulate(&values);
    hist
}

// ========================================================================
// PROPERTY TESTS
// ========================================================================

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(100))]

    /// Larger percentile never yields a smaller threshold
    #[test]
    fn prop_percentile_monotonic(
        counts in prop::collection::vec(0u64..50, 2..64),
        p1 in 0.0f64..100.0,
        p2 in 0.0f64..100.0,
    ) {
        let edges = integer_edges(counts.len());
        let hist = Histogram::from_parts(edges, counts).unwrap();
        let (lo, hi) = if p1 <= p2 { (p1, p2) } else { (p2, p1) };

        let t_lo = compute_amax_percentile(Some(&hist), lo).unwrap().unwrap();
        let t_hi = compute_amax_percentile(Some(&hist), hi).unwrap().unwrap();
        prop_assert!(t_lo <= t_hi, "p={} -> {}, p={} -> {}", lo, t_lo, hi, t_hi);
    }

    /// Entropy threshold is always a bin edge at or past start_bin
    #[test]
    fn prop_entropy_returns_candidate_edge(
        counts in prop::collection::vec(1u64..100, 8..40),
        start_bin in 1usize..8,
        stride in 1usize..4,
    ) {
        let edges = integer_edges(counts.len());
        let hist = Histogram::from_parts(edges.clone(), counts).unwrap();
        let params = SearchParams { stride, start_bin };

        let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(4), false, &params)
            .unwrap()
            .unwrap();
        prop_assert!(edges.contains(&amax));
        prop_assert!(amax >= edges[start_bin]);
    }
}

// ========================================================================
// ENTROPY
// ========================================================================

#[test]
fn test_entropy_tie_break_selects_largest_cut() {
    // Cuts 4..=8 reproduce the histogram exactly (zero divergence)
    let hist = Histogram::from_parts(integer_edges(8), vec![5, 5, 3, 2, 0, 0, 0, 0]).unwrap();
    let params = SearchParams { stride: 1, start_bin: 2 };

    let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(amax, Some(8.0));

    let strided = SearchParams { stride: 2, start_bin: 2 };
    let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &strided).unwrap();
    assert_eq!(amax, Some(8.0));
}

#[test]
fn test_entropy_does_not_mutate_histogram() {
    let hist = Histogram::from_parts(integer_edges(8), vec![100, 5, 3, 2, 1, 1, 1, 1]).unwrap();
    let params = SearchParams { stride: 1, start_bin: 1 };

    compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(hist.counts()[0], 100);
}

#[test]
fn test_entropy_absent_histogram() {
    let amax = compute_amax_entropy(None, NumBits::Integer(8), false, &SearchParams::default());
    assert_eq!(amax.unwrap(), None);
}

#[test]
fn test_entropy_rejects_float_format() {
    let hist = dense_histogram();
    let err = compute_amax_entropy(
        Some(&hist),
        NumBits::Float(FloatFormat::E4M3),
        false,
        &SearchParams::default(),
    )
    .unwrap_err();
    assert!(matches!(err, CalibError::UnsupportedMethod { .. }));
}

#[test]
fn test_entropy_no_candidates() {
    let hist = example_histogram();
    let err = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &SearchParams::default())
        .unwrap_err();
    assert_eq!(err, CalibError::NoCandidates { start_bin: 128, len: 4 });
}

#[test]
fn test_entropy_default_params_on_dense_histogram() {
    let hist = dense_histogram();
    let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &SearchParams::default())
        .unwrap()
        .unwrap();
    assert!(amax >= hist.edges()[128]);
    assert!(amax <= hist.upper());
}

#[test]
fn test_kl_divergence() {
    assert_abs_diff_eq!(kl_divergence(&[1.0, 2.0], &[2.0, 4.0]), 0.0);
    assert!(kl_divergence(&[1.0, 1.0], &[1.0, 0.0]).is_infinite());
    assert!(kl_divergence(&[0.0, 0.0], &[1.0, 0.0]).is_nan());

    // p = [1/3, 2/3], q = [1/2, 1/2]
    let expected = (1.0 / 3.0) * (2.0f64 / 3.0).ln() + (2.0 / 3.0) * (4.0f64 / 3.0).ln();
    assert_abs_diff_eq!(kl_divergence(&[5.0, 10.0], &[5.0, 5.0]), expected, epsilon = 1e-12);
}

#[test]
fn test_entropy_skips_undefined_divergence() {
    // Cuts 1..=4 see only empty bins, so their divergence is undefined
    let hist = Histogram::from_parts(integer_edges(6), vec![0, 0, 0, 0, 5, 5]).unwrap();
    let params = SearchParams { stride: 1, start_bin: 1 };
    let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(amax, Some(6.0));

    // Every candidate undefined: fall back to the last one
    let hist = Histogram::from_parts(integer_edges(6), vec![0, 0, 0, 0, 0, 7]).unwrap();
    let params = SearchParams { stride: 4, start_bin: 1 };
    let amax = compute_amax_entropy(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(amax, Some(5.0));
}

// ========================================================================
// MSE
// ========================================================================

#[test]
fn test_mse_tie_break_selects_first_cut() {
    // No mass: every candidate scores 0
    let hist = Histogram::from_parts(integer_edges(8), vec![0; 8]).unwrap();
    let params = SearchParams { stride: 1, start_bin: 2 };

    let amax = compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(amax, Some(2.5));

    let strided = SearchParams { stride: 3, start_bin: 1 };
    let amax = compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &strided).unwrap();
    assert_eq!(amax, Some(1.5));
}

#[test]
fn test_mse_finds_data_range() {
    let hist = dense_histogram();
    let params = SearchParams { stride: 1, start_bin: 0 };

    let amax = compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &params).unwrap().unwrap();
    assert!((4.0..=5.5).contains(&amax), "amax {amax} outside data range");
}

#[test]
fn test_mse_is_deterministic() {
    let hist = dense_histogram();
    let params = SearchParams { stride: 3, start_bin: 16 };

    let first = compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    let second = compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &params).unwrap();
    assert_eq!(first.map(f32::to_bits), second.map(f32::to_bits));
}

#[test]
fn test_mse_returns_bin_center() {
    let hist = dense_histogram();
    let params = SearchParams { stride: 1, start_bin: 0 };
    let centers = hist.centers();

    let amax = compute_amax_mse(Some(&hist), NumBits::Float(FloatFormat::E4M3), false, &params)
        .unwrap()
        .unwrap();
    assert!(centers.contains(&amax));
}

#[test]
fn test_mse_absent_and_invalid() {
    assert_eq!(
        compute_amax_mse(None, NumBits::Integer(8), false, &SearchParams::default()).unwrap(),
        None
    );

    let hist = dense_histogram();
    let zero_stride = SearchParams { stride: 0, start_bin: 0 };
    assert_eq!(
        compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &zero_stride).unwrap_err(),
        CalibError::InvalidStride
    );

    let past_end = SearchParams { stride: 1, start_bin: 256 };
    assert!(matches!(
        compute_amax_mse(Some(&hist), NumBits::Integer(8), false, &past_end),
        Err(CalibError::NoCandidates { .. })
    ));
}

// ========================================================================
// PERCENTILE
// ========================================================================

#[test]
fn test_percentile_example() {
    let hist = example_histogram();
    // cdf = [0.2, 0.4, 0.8, 1.0]
    assert_eq!(compute_amax_percentile(Some(&hist), 50.0).unwrap(), Some(1.5));
    assert_eq!(compute_amax_percentile(Some(&hist), 90.0).unwrap(), Some(2.25));
}

#[test]
fn test_percentile_boundaries() {
    let hist = Histogram::from_parts(integer_edges(6), vec![2, 3, 0, 5, 0, 0]).unwrap();

    // Last non-empty bin is 3
    assert_eq!(compute_amax_percentile(Some(&hist), 100.0).unwrap(), Some(3.0));
    assert_eq!(compute_amax_percentile(Some(&hist), 0.0).unwrap(), Some(0.0));
}

#[test]
fn test_percentile_compares_at_double_precision() {
    // cdf[0] = 0.99989999 sits between 99.99 as f32 (0.99989998) and as f64
    let hist = Histogram::from_parts(integer_edges(2), vec![99_989_999, 10_001]).unwrap();
    assert_eq!(compute_amax_percentile(Some(&hist), 99.99).unwrap(), Some(1.0));
    assert_eq!(compute_amax_percentile(Some(&hist), 99.989).unwrap(), Some(0.0));
}

#[test]
fn test_percentile_validation() {
    let hist = example_histogram();
    for p in [-0.1, 100.01, f64::NAN] {
        assert!(matches!(
            compute_amax_percentile(Some(&hist), p),
            Err(CalibError::InvalidPercentile(_))
        ));
        // Validated even without a histogram
        assert!(compute_amax_percentile(None, p).is_err());
    }
    assert_eq!(compute_amax_percentile(None, 99.0).unwrap(), None);
}

// ========================================================================
// DISPATCH & TYPES
// ========================================================================

#[test]
fn test_search_dispatch() {
    let hist = dense_histogram();
    let params = SearchParams { stride: 4, start_bin: 128 };
    let bits = NumBits::Integer(8);

    assert_eq!(
        search(Some(&hist), bits, false, &SearchMethod::Entropy, &params).unwrap(),
        compute_amax_entropy(Some(&hist), bits, false, &params).unwrap()
    );
    assert_eq!(
        search(Some(&hist), bits, false, &SearchMethod::Mse, &params).unwrap(),
        compute_amax_mse(Some(&hist), bits, false, &params).unwrap()
    );
    assert_eq!(
        search(Some(&hist), bits, false, &SearchMethod::Percentile(99.0), &params).unwrap(),
        compute_amax_percentile(Some(&hist), 99.0).unwrap()
    );
}

#[test]
fn test_search_method_from_str() {
    assert_eq!("entropy".parse::<SearchMethod>().unwrap(), SearchMethod::Entropy);
    assert_eq!("mse".parse::<SearchMethod>().unwrap(), SearchMethod::Mse);
    assert_eq!(
        "percentile".parse::<SearchMethod>().unwrap(),
        SearchMethod::Percentile(DEFAULT_PERCENTILE)
    );
    assert_eq!(
        "max".parse::<SearchMethod>().unwrap_err(),
        CalibError::UnknownMethod("max".into())
    );
}

#[test]
fn test_search_types_serde() {
    let params: SearchParams = serde_json::from_str("{}").unwrap();
    assert_eq!(params, SearchParams::default());

    let params: SearchParams = serde_json::from_str(r#"{"stride": 2}"#).unwrap();
    assert_eq!(params, SearchParams { stride: 2, start_bin: 128 });

    let method: SearchMethod = serde_json::from_str(r#""entropy""#).unwrap();
    assert_eq!(method, SearchMethod::Entropy);
    let method: SearchMethod = serde_json::from_str(r#"{"percentile": 99.9}"#).unwrap();
    assert_eq!(method, SearchMethod::Percentile(99.9));
}
