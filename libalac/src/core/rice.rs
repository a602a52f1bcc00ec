// Adaptive Rice coding for residual blocks
//
// The Rice parameter isn't transmitted. Both sides derive it from a running
// "history" value that is updated after every residual, so the encoder and
// decoder have to step the history in exactly the same way.

use super::bitstream::{BitReader, BitWriter};
use super::error::AlacResult;
use super::types::{StreamParams, TrialEncode};

/// unsigned values above this saturate the history
const HISTORY_SATURATION: u32 = 0xFFFF;

/// history below this signals that a run of zeros may follow
const ZERO_RUN_THRESHOLD: u32 = 128;

/// longest zero run one code can carry
const MAX_ZERO_RUN: u32 = 0xFFFF;

/// prefix length that escapes to a raw value
const ESCAPE_PREFIX: u32 = 9;

/// Parameters that drive the history adaptation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiceParams {
    pub initial_history: u32,
    pub history_multiplier: u32,
    pub maximum_k: u32,
}

impl RiceParams {
    pub fn new(initial_history: u32, history_multiplier: u32, maximum_k: u32) -> Self {
        RiceParams {
            initial_history,
            history_multiplier,
            maximum_k,
        }
    }

    /// parameters with the multiplier scaled by a subframe's rice modifier
    pub fn with_modifier(mut self, rice_modifier: u32) -> Self {
        self.history_multiplier = (rice_modifier * self.history_multiplier) >> 2;
        self
    }
}

impl From<&StreamParams> for RiceParams {
    fn from(params: &StreamParams) -> Self {
        RiceParams::new(
            params.initial_history,
            params.history_multiplier,
            params.maximum_k,
        )
    }
}

/// Running history value for one residual block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct History {
    value: u32,
    multiplier: u32,
}

impl History {
    pub fn new(initial: u32, multiplier: u32) -> Self {
        History {
            value: initial,
            multiplier,
        }
    }

    pub fn from_params(params: &RiceParams) -> Self {
        History::new(params.initial_history, params.history_multiplier)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Rice parameter for the next residual
    pub fn rice_k(&self, maximum_k: u32) -> u32 {
        (bit_length((self.value >> 9) + 3) - 1).min(maximum_k)
    }

    /// Rice parameter for a zero-run length
    pub fn zero_run_k(&self, maximum_k: u32) -> u32 {
        (8 + ((self.value + 16) >> 6))
            .saturating_sub(bit_length(self.value))
            .min(maximum_k)
    }

    /// Step the history with the zig-zagged residual just coded
    pub fn update(&mut self, unsigned: u32) {
        if unsigned > HISTORY_SATURATION {
            self.value = HISTORY_SATURATION;
        } else {
            let value = self.value as u64;
            let multiplier = self.multiplier as u64;
            let next = value - ((value * multiplier) >> 9) + unsigned as u64 * multiplier;
            self.value = next as u32;
        }
    }

    pub fn wants_zero_run(&self) -> bool {
        self.value < ZERO_RUN_THRESHOLD
    }

    /// Back to zero after a zero run
    pub fn clear(&mut self) {
        self.value = 0;
    }
}

/// number of significant bits, 0 for 0
#[inline]
fn bit_length(value: u32) -> u32 {
    32 - value.leading_zeros()
}

/// Zigzag a signed residual: 0 → 0, -1 → 1, 1 → 2, -2 → 3, ...
#[inline]
pub fn to_unsigned(residual: i32) -> u64 {
    let residual = residual as i64;
    if residual >= 0 {
        (residual << 1) as u64
    } else {
        ((-residual << 1) - 1) as u64
    }
}

/// Inverse of `to_unsigned`
#[inline]
pub fn to_signed(unsigned: u32) -> i32 {
    ((unsigned >> 1) as i32) ^ -((unsigned & 1) as i32)
}

/// Write one unsigned value with parameter `k`, escaping to `sample_size` raw bits
pub fn write_residual(bits: &mut BitWriter, value: u32, k: u32, sample_size: u32) {
    let k = k.max(1);
    let modulus = (1u32 << k) - 1;
    let msb = value / modulus;
    let lsb = value % modulus;

    if msb > ESCAPE_PREFIX - 1 {
        bits.write_bits(0x1FF, ESCAPE_PREFIX);
        bits.write_bits(value, sample_size);
    } else {
        bits.write_unary(0, msb);
        if k > 1 {
            if lsb > 0 {
                bits.write_bits(lsb + 1, k);
            } else {
                bits.write_bits(0, k - 1);
            }
        }
    }
}

/// Read one unsigned value written by `write_residual`
pub fn read_residual(bits: &mut BitReader, k: u32, sample_size: u32) -> AlacResult<u32> {
    let msb = bits.read_unary_ones_capped(ESCAPE_PREFIX)?;

    if msb == ESCAPE_PREFIX {
        return bits.read(sample_size);
    }

    let k = k.max(1);
    if k == 1 {
        return Ok(msb);
    }

    let modulus = (1u32 << k) - 1;
    let lsb = bits.read(k - 1)?;
    if lsb == 0 {
        Ok(msb * modulus)
    } else {
        let lsb = (lsb << 1) | bits.read_bit()?;
        Ok(msb * modulus + lsb - 1)
    }
}

/// Encode a block of residuals
///
/// Returns `TrialEncode::Overflow` as soon as a residual doesn't fit in
/// `sample_size` bits; whatever was written to `bits` by then is garbage and the
/// caller is expected to discard it.
pub fn encode_residuals(
    bits: &mut BitWriter,
    params: &RiceParams,
    sample_size: u32,
    residuals: &[i32],
) -> TrialEncode {
    let mut history = History::from_params(params);
    encode_residuals_with_history(bits, &mut history, params.maximum_k, sample_size, residuals)
}

/// `encode_residuals` stepping a caller-owned history, left at its final value
pub fn encode_residuals_with_history(
    bits: &mut BitWriter,
    history: &mut History,
    maximum_k: u32,
    sample_size: u32,
    residuals: &[i32],
) -> TrialEncode {
    let start = bits.bits_written();
    let max_unsigned = 1u64 << sample_size;
    let mut sign_modifier = 0;
    let mut i = 0;

    while i < residuals.len() {
        let unsigned = to_unsigned(residuals[i]);
        if unsigned >= max_unsigned {
            return TrialEncode::Overflow;
        }
        let unsigned = unsigned as u32;

        let k = history.rice_k(maximum_k);
        write_residual(bits, unsigned - sign_modifier, k, sample_size);
        sign_modifier = 0;

        history.update(unsigned);
        i += 1;

        if unsigned <= HISTORY_SATURATION && history.wants_zero_run() && i < residuals.len() {
            let k = history.zero_run_k(maximum_k);
            let mut zeros = 0;
            while i < residuals.len() && residuals[i] == 0 && zeros < MAX_ZERO_RUN {
                zeros += 1;
                i += 1;
            }
            write_residual(bits, zeros, k, 16);
            if zeros < MAX_ZERO_RUN {
                sign_modifier = 1;
            }
            history.clear();
        }
    }

    TrialEncode::Committed(bits.bits_written() - start)
}

/// Decode `count` residuals
pub fn decode_residuals(
    bits: &mut BitReader,
    params: &RiceParams,
    sample_size: u32,
    count: usize,
) -> AlacResult<Vec<i32>> {
    let mut history = History::from_params(params);
    decode_residuals_with_history(bits, &mut history, params.maximum_k, sample_size, count)
}

/// `decode_residuals` stepping a caller-owned history
pub fn decode_residuals_with_history(
    bits: &mut BitReader,
    history: &mut History,
    maximum_k: u32,
    sample_size: u32,
    count: usize,
) -> AlacResult<Vec<i32>> {
    // count comes from the bitstream
    let mut residuals = Vec::with_capacity(count.min(bits.bits_remaining() as usize));
    let mut sign_modifier = 0;

    while residuals.len() < count {
        let k = history.rice_k(maximum_k);
        let unsigned = read_residual(bits, k, sample_size)?.wrapping_add(sign_modifier);
        sign_modifier = 0;

        residuals.push(to_signed(unsigned));
        history.update(unsigned);

        if unsigned <= HISTORY_SATURATION && history.wants_zero_run() && residuals.len() < count {
            let k = history.zero_run_k(maximum_k);
            let zeros = read_residual(bits, k, 16)?;
            let run = (zeros as usize).min(count - residuals.len());
            residuals.resize(residuals.len() + run, 0);
            if zeros < MAX_ZERO_RUN {
                sign_modifier = 1;
            }
            history.clear();
        }
    }

    Ok(residuals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_k_from_history() {
        let params = RiceParams::new(10, 40, 14);
        let history = History::from_params(&params);
        // (10 >> 9) + 3 = 3 -> bit length 2
        assert_eq!(history.rice_k(14), 1);
        assert_eq!(History::new(0xFFFF, 40).rice_k(14), 7);
        assert_eq!(History::new(0xFFFF, 40).rice_k(4), 4);
    }

    #[test]
    fn test_zero_run_k() {
        assert_eq!(History::new(0, 40).zero_run_k(14), 8);
        assert_eq!(History::new(1, 40).zero_run_k(14), 7);
        assert_eq!(History::new(127, 40).zero_run_k(14), 3);
    }

    #[test]
    fn test_history_saturates() {
        let mut history = History::new(10, 40);
        history.update(0x10000);
        assert_eq!(history.value(), 0xFFFF);
    }

    #[test]
    fn test_sign_modifier_after_zero_run() {
        // one sample, a short run of zeros, then a value that gets the -1 bias
        let residuals = vec![1, 0, 0, 0, -3, 5];
        let params = RiceParams::new(0, 40, 14);
        let mut bits = BitWriter::new();
        assert!(!encode_residuals(&mut bits, &params, 16, &residuals).is_overflow());
        let bytes = bits.into_bytes();
        let mut reader = BitReader::new(&bytes);
        let decoded = decode_residuals(&mut reader, &params, 16, residuals.len()).unwrap();
        assert_eq!(decoded, residuals);
    }
}
