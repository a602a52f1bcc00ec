//! Self-adapting integer LPC
//!
//! Prediction works on differences against a base sample (the one just outside
//! the coefficient window). After every sample the coefficients are nudged by a
//! sign-gradient step driven by the residual, on both the encode and decode
//! side, so the two must replay exactly the same arithmetic.

/// Rounding constant for a right shift of `shift` bits
#[inline]
fn rounding(shift: u32) -> i64 {
    (1i64 << shift) >> 1
}

/// Wrap a value into a signed `bits`-wide integer
#[inline]
pub fn sign_extend(value: i64, bits: u32) -> i32 {
    let unused = 64 - bits;
    ((value << unused) >> unused) as i32
}

/// Predicted sample (minus the base) for the sample after `window`
///
/// `window` holds the `order + 1` previous samples, oldest first; its first
/// element is the base.
#[inline]
fn predict(coefficients: &[i32], window: &[i32], shift: u32) -> i64 {
    let order = coefficients.len();
    let base = window[0] as i64;
    let mut sum = 0i64;
    for (j, &coeff) in coefficients.iter().enumerate() {
        sum += coeff as i64 * (window[order - j] as i64 - base);
    }
    (sum + rounding(shift)) >> shift
}

/// Sign-gradient coefficient update after one sample
///
/// Walks the window from the oldest sample, moving the matching coefficient one
/// step against the residual's sign and taking that step's share out of a
/// working copy of the residual, until the residual changes sign.
pub fn adapt_coefficients(coefficients: &mut [i32], window: &[i32], residual: i32, shift: u32) {
    let order = coefficients.len();
    let base = window[0] as i64;
    let mut error = residual as i64;

    if error > 0 {
        for j in 0..order {
            let diff = base - window[j + 1] as i64;
            let sign = diff.signum();
            coefficients[order - j - 1] -= sign as i32;
            error -= ((diff * sign) >> shift) * (j as i64 + 1);
            if error <= 0 {
                break;
            }
        }
    } else if error < 0 {
        for j in 0..order {
            let diff = base - window[j + 1] as i64;
            let sign = diff.signum();
            coefficients[order - j - 1] += sign as i32;
            error -= ((diff * -sign) >> shift) * (j as i64 + 1);
            if error >= 0 {
                break;
            }
        }
    }
}

#[inline]
fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// Residuals of `samples` under adapting `coefficients`
///
/// The first sample is copied verbatim and the next `order` are first
/// differences. Residuals are not wrapped to the sample size; one that doesn't
/// fit shows up as an overflow when the block is rice coded.
pub fn calculate_residuals(samples: &[i32], coefficients: &[i32], shift: u32) -> Vec<i32> {
    let order = coefficients.len();
    let mut coefficients = coefficients.to_vec();
    let mut residuals = Vec::with_capacity(samples.len());

    if samples.is_empty() {
        return residuals;
    }

    residuals.push(samples[0]);

    let warmup_end = (order + 1).min(samples.len());
    for i in 1..warmup_end {
        residuals.push(saturate(samples[i] as i64 - samples[i - 1] as i64));
    }

    for i in warmup_end..samples.len() {
        let window = &samples[i - order - 1..i];
        let predicted = predict(&coefficients, window, shift);
        let residual = saturate(samples[i] as i64 - window[0] as i64 - predicted);
        residuals.push(residual);
        adapt_coefficients(&mut coefficients, window, residual, shift);
    }

    residuals
}

/// Rebuild samples from residuals, adapting `coefficients` in place
///
/// Every output sample is wrapped to `sample_size` bits.
pub fn reconstruct_samples(
    residuals: &[i32],
    coefficients: &mut [i32],
    shift: u32,
    sample_size: u32,
) -> Vec<i32> {
    let order = coefficients.len();
    let mut samples = Vec::with_capacity(residuals.len());

    if residuals.is_empty() {
        return samples;
    }

    samples.push(sign_extend(residuals[0] as i64, sample_size));

    let warmup_end = (order + 1).min(residuals.len());
    for i in 1..warmup_end {
        let sample = residuals[i] as i64 + samples[i - 1] as i64;
        samples.push(sign_extend(sample, sample_size));
    }

    for i in warmup_end..residuals.len() {
        let residual = residuals[i];
        let window = &samples[i - order - 1..i];
        let predicted = predict(coefficients, window, shift);
        let sample = sign_extend(predicted + residual as i64 + window[0] as i64, sample_size);
        adapt_coefficients(coefficients, window, residual, shift);
        samples.push(sample);
    }

    samples
}
