//! Adaptive LPC, estimator and stereo correlation tests

use libalac_audio::lossless::*;
use libalac_audio::RiceParams;
use proptest::prelude::*;

fn sine(len: usize, amplitude: f64, step: f64) -> Vec<i32> {
    (0..len)
        .map(|i| ((i as f64 * step).sin() * amplitude) as i32)
        .collect()
}

// ============================================================================
// Prediction / Reconstruction
// ============================================================================

#[test]
fn test_residual_reconstruct_roundtrip() {
    let samples = sine(2000, 20000.0, 0.05);
    let coefficients = [1200, -400, 150, -30];

    let residuals = calculate_residuals(&samples, &coefficients, 9);
    let mut decoder_coefficients = coefficients;
    let rebuilt = reconstruct_samples(&residuals, &mut decoder_coefficients, 9, 17);
    assert_eq!(rebuilt, samples);
}

#[test]
fn test_adaptation_is_deterministic() {
    // both sides end up with the same coefficients after a block
    let samples = sine(512, 3000.0, 0.2);
    let start = [512, 0, 0, 0, 0, 0, 0, 0];

    let residuals = calculate_residuals(&samples, &start, 9);
    let mut first = start;
    reconstruct_samples(&residuals, &mut first, 9, 17);
    let mut second = start;
    reconstruct_samples(&residuals, &mut second, 9, 17);

    assert_eq!(first, second);
    assert_ne!(first, start, "coefficients should have adapted");
}

#[test]
fn test_order_zero_is_first_difference() {
    let samples = [5, 9, 4, 4, -10];
    let residuals = calculate_residuals(&samples, &[], 9);
    assert_eq!(residuals, vec![5, 4, -5, 0, -14]);

    let mut none: [i32; 0] = [];
    assert_eq!(reconstruct_samples(&residuals, &mut none, 9, 16), samples);
}

#[test]
fn test_block_shorter_than_order() {
    let samples = [100, -100, 50];
    let residuals = calculate_residuals(&samples, &[10; 8], 9);
    assert_eq!(residuals, vec![100, -200, 150]);
}

#[test]
fn test_residuals_saturate_instead_of_wrapping() {
    let samples = [i32::MAX, i32::MIN];
    let residuals = calculate_residuals(&samples, &[0], 9);
    assert_eq!(residuals[1], i32::MIN);
}

#[test]
fn test_decoder_wraps_to_sample_size() {
    // 32767 + 1 wraps in a 16-bit channel
    let mut none: [i32; 0] = [];
    let samples = reconstruct_samples(&[32767, 1], &mut none, 9, 16);
    assert_eq!(samples, vec![32767, -32768]);
}

// ============================================================================
// Coefficient Estimation
// ============================================================================

#[test]
fn test_silent_block_uses_zero_order4() {
    let mut estimator = CoefficientEstimator::new(RiceParams::new(10, 40, 14));
    let estimate = estimator.estimate(&[0; 4096], 16).unwrap();
    assert_eq!(estimate.coefficients, vec![0, 0, 0, 0]);
    assert_eq!(estimate.residuals.bits_written(), 26);
}

#[test]
fn test_estimate_picks_supported_order() {
    let mut estimator = CoefficientEstimator::new(RiceParams::new(10, 40, 14));
    let samples = sine(4096, 8000.0, 0.03);
    let estimate = estimator.estimate(&samples, 16).unwrap();
    assert!(estimate.order() == 4 || estimate.order() == 8);

    // a smooth sine codes well below raw size
    assert!(estimate.residuals.bits_written() < 4096 * 16 / 2);
}

#[test]
fn test_estimate_overflow_is_none() {
    let mut estimator = CoefficientEstimator::new(RiceParams::new(10, 40, 14));
    let samples: Vec<i32> = (0..64)
        .map(|i| if i % 2 == 0 { 32767 } else { -32768 })
        .collect();
    assert!(estimator.estimate(&samples, 16).is_none());
}

#[test]
fn test_estimator_handles_changing_lengths() {
    let mut estimator = CoefficientEstimator::new(RiceParams::new(10, 40, 14));
    for len in [4096, 100, 4096, 512] {
        let samples = sine(len, 1000.0, 0.1);
        assert!(estimator.estimate(&samples, 16).is_some());
    }
}

#[test]
fn test_autocorrelation_peak_at_lag_zero() {
    let signal: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.1).sin()).collect();
    let ac = autocorrelate(&signal, 8);
    assert_eq!(ac.len(), 9);
    for lag in 1..=8 {
        assert!(ac[0] >= ac[lag].abs());
    }
}

#[test]
fn test_lp_rows_grow_by_order() {
    let signal: Vec<f64> = (0..1000).map(|i| (i as f64 * 0.1).sin()).collect();
    let lp = compute_lp_coefficients(&autocorrelate(&signal, 8), 8);
    assert_eq!(lp.len(), 8);
    for (i, row) in lp.iter().enumerate() {
        assert_eq!(row.len(), i + 1);
    }
    // a pure sine is close to a two-tap resonator
    assert!(lp[1][0] > 1.5);
}

// ============================================================================
// Stereo Correlation
// ============================================================================

#[test]
fn test_zero_leftweight_is_passthrough() {
    let left = vec![1, 2, 3];
    let right = vec![-1, -2, -3];
    let (c0, c1) = correlate(&left, &right, 2, 0);
    assert_eq!((c0.clone(), c1.clone()), (left.clone(), right.clone()));
    assert_eq!(decorrelate(&c0, &c1, 2, 0), (left, right));
}

#[test]
fn test_oversized_shift_from_bitstream() {
    let (left, right) = decorrelate(&[10], &[4], 200, 1);
    assert_eq!((left, right), (vec![14], vec![10]));
}

proptest! {
    #[test]
    fn prop_decorrelate_inverts_correlate(
        pairs in prop::collection::vec(
            (-(1i32 << 23)..(1i32 << 23), -(1i32 << 23)..(1i32 << 23)),
            1..200,
        ),
        leftweight in 0u32..=4,
    ) {
        let (left, right): (Vec<i32>, Vec<i32>) = pairs.into_iter().unzip();
        let (c0, c1) = correlate(&left, &right, 2, leftweight);
        prop_assert_eq!(decorrelate(&c0, &c1, 2, leftweight), (left, right));
    }

    #[test]
    fn prop_lpc_roundtrip(
        samples in prop::collection::vec(-32768i32..32768, 1..300),
        order in prop_oneof![Just(4usize), Just(8usize)],
    ) {
        let coefficients: Vec<i32> = (0..order as i32).map(|j| 300 - j * 70).collect();
        let residuals = calculate_residuals(&samples, &coefficients, 9);
        let mut decoder_coefficients = coefficients.clone();
        let rebuilt = reconstruct_samples(&residuals, &mut decoder_coefficients, 9, 17);
        prop_assert_eq!(rebuilt, samples);
    }
}
