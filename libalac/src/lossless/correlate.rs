//! Weighted stereo correlation
//!
//! `corr0 = right + ((left - right) * w >> shift)`, `corr1 = left - right`.
//! A leftweight of 0 leaves both channels untouched.

/// Correlate a left/right pair, returning `(corr0, corr1)`
pub fn correlate(left: &[i32], right: &[i32], shift: u32, leftweight: u32) -> (Vec<i32>, Vec<i32>) {
    if leftweight == 0 {
        return (left.to_vec(), right.to_vec());
    }

    left.iter()
        .zip(right)
        .map(|(&l, &r)| {
            let difference = l as i64 - r as i64;
            let weighted = (difference * leftweight as i64) >> shift;
            ((r as i64 + weighted) as i32, difference as i32)
        })
        .unzip()
}

/// Exact inverse of `correlate`, returning `(left, right)`
///
/// `shift` comes straight from the bitstream, so anything past 63 acts as 63.
pub fn decorrelate(
    corr0: &[i32],
    corr1: &[i32],
    shift: u32,
    leftweight: u32,
) -> (Vec<i32>, Vec<i32>) {
    if leftweight == 0 {
        return (corr0.to_vec(), corr1.to_vec());
    }

    corr0
        .iter()
        .zip(corr1)
        .map(|(&c0, &c1)| {
            let weighted = (c1 as i64 * leftweight as i64) >> shift.min(63);
            let right = c0 as i64 - weighted;
            ((c1 as i64 + right) as i32, right as i32)
        })
        .unzip()
}
