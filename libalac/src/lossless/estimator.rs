//! Predictor coefficient estimation (encoder only)
//!
//! Tukey window → autocorrelation → Levinson-Durbin → quantization, then both
//! an order-4 and an order-8 predictor are trial coded and the cheaper one kept.

use crate::core::bitstream::BitWriter;
use crate::core::rice::{encode_residuals, RiceParams};
use crate::core::types::{TrialEncode, MAX_LPC_ORDER, ORDER8_BIT_PENALTY, QLP_SHIFT};

use super::lpc::calculate_residuals;

/// taper fraction of the analysis window
pub const TUKEY_ALPHA: f64 = 0.5;

/// signed 16-bit coefficient range
const QLP_MAX: i64 = (1 << 15) - 1;
const QLP_MIN: i64 = -(1 << 15);

/// Tukey window of `length` points
pub fn tukey_window(alpha: f64, length: usize) -> Vec<f64> {
    let taper = (alpha / 2.0 * length as f64 - 1.0).max(0.0) as usize;
    if taper == 0 {
        return vec![1.0; length];
    }

    (0..length)
        .map(|i| {
            if i <= taper {
                (1.0 - (std::f64::consts::PI * i as f64 / taper as f64).cos()) / 2.0
            } else if i + taper + 1 >= length {
                let from_end = (length - i - 1) as f64;
                (1.0 - (std::f64::consts::PI * from_end / taper as f64).cos()) / 2.0
            } else {
                1.0
            }
        })
        .collect()
}

pub fn window_signal(samples: &[i32], window: &[f64]) -> Vec<f64> {
    samples
        .iter()
        .zip(window)
        .map(|(&s, &w)| s as f64 * w)
        .collect()
}

/// Autocorrelation for lags `0..=max_lag`
pub fn autocorrelate(signal: &[f64], max_lag: usize) -> Vec<f64> {
    (0..=max_lag)
        .map(|lag| {
            signal
                .iter()
                .zip(signal.iter().skip(lag))
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Levinson-Durbin recursion
///
/// Row `i` of the result holds the `i + 1` coefficients of the order `i + 1`
/// predictor. `autocorrelation[0]` must be non-zero.
pub fn compute_lp_coefficients(autocorrelation: &[f64], max_order: usize) -> Vec<Vec<f64>> {
    let mut lp_coeff: Vec<Vec<f64>> = Vec::with_capacity(max_order);
    if max_order == 0 {
        return lp_coeff;
    }

    let k = autocorrelation[1] / autocorrelation[0];
    lp_coeff.push(vec![k]);
    let mut error = autocorrelation[0] * (1.0 - k * k);

    for i in 1..max_order {
        let previous = &lp_coeff[i - 1];
        let sum: f64 = (0..i)
            .map(|j| previous[j] * autocorrelation[i - j])
            .sum();
        let k = (autocorrelation[i + 1] - sum) / error;

        let mut row: Vec<f64> = (0..i).map(|j| previous[j] - k * previous[i - j - 1]).collect();
        row.push(k);
        lp_coeff.push(row);

        error *= 1.0 - k * k;
    }

    lp_coeff
}

/// Quantize one order's coefficients to 16 bits at `QLP_SHIFT`, carrying the
/// rounding error into the next coefficient
pub fn quantize_coefficients(lp_coefficients: &[f64]) -> Vec<i32> {
    let scale = (1i64 << QLP_SHIFT) as f64;
    let mut error = 0.0f64;

    lp_coefficients
        .iter()
        .map(|&coeff| {
            let sum = error + coeff * scale;
            let quantized = if sum.is_finite() {
                (sum.round() as i64).clamp(QLP_MIN, QLP_MAX)
            } else {
                0
            };
            error = sum - quantized as f64;
            quantized as i32
        })
        .collect()
}

/// The predictor chosen for one subframe and its coded residuals
#[derive(Debug, Clone)]
pub struct Estimate {
    pub coefficients: Vec<i32>,
    pub residuals: BitWriter,
}

impl Estimate {
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }
}

/// Scratch state for estimating coefficients, reused block to block
#[derive(Debug)]
pub struct CoefficientEstimator {
    rice: RiceParams,
    window: Vec<f64>,
}

impl CoefficientEstimator {
    pub fn new(rice: RiceParams) -> Self {
        CoefficientEstimator {
            rice,
            window: Vec::new(),
        }
    }

    /// window for blocks of `length` samples, rebuilt only when the length changes
    fn window(&mut self, length: usize) -> &[f64] {
        if self.window.len() != length {
            self.window = tukey_window(TUKEY_ALPHA, length);
        }
        &self.window
    }

    /// Pick coefficients for `samples` and rice code their residuals
    ///
    /// `None` means a residual overflowed `sample_size` bits and the frame has to
    /// go out uncompressed.
    pub fn estimate(&mut self, samples: &[i32], sample_size: u32) -> Option<Estimate> {
        let windowed = window_signal(samples, self.window(samples.len()));
        let autocorrelation = autocorrelate(&windowed, MAX_LPC_ORDER);

        if autocorrelation[0] == 0.0 {
            // silent block
            return self.trial(samples, vec![0; 4], sample_size).map(|(e, _)| e);
        }

        let lp_coeff = compute_lp_coefficients(&autocorrelation, MAX_LPC_ORDER);
        let coefficients4 = quantize_coefficients(&lp_coeff[3]);
        let coefficients8 = quantize_coefficients(&lp_coeff[7]);

        let (order4, bits4) = self.trial(samples, coefficients4, sample_size)?;
        let (order8, bits8) = self.trial(samples, coefficients8, sample_size)?;

        if bits4 < bits8 + ORDER8_BIT_PENALTY {
            Some(order4)
        } else {
            Some(order8)
        }
    }

    fn trial(
        &self,
        samples: &[i32],
        coefficients: Vec<i32>,
        sample_size: u32,
    ) -> Option<(Estimate, u64)> {
        let residuals = calculate_residuals(samples, &coefficients, QLP_SHIFT);
        let mut bits = BitWriter::new();
        match encode_residuals(&mut bits, &self.rice, sample_size, &residuals) {
            TrialEncode::Committed(written) => Some((
                Estimate {
                    coefficients,
                    residuals: bits,
                },
                written,
            )),
            TrialEncode::Overflow => None,
        }
    }
}
