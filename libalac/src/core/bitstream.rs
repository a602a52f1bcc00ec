// Big-endian bit I/O shared by the encoder and decoder

use super::error::{AlacError, AlacResult};

/// Bit-level writer
///
/// Also serves as the trial recorder: the encoder writes candidate frames into
/// scratch writers, compares `bits_written`, and copies only the winner into the
/// real output with `append`.
#[derive(Debug, Clone)]
pub struct BitWriter {
    bytes: Vec<u8>,
    current_byte: u8,
    bit_pos: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        BitWriter {
            bytes: Vec::new(),
            current_byte: 0,
            bit_pos: 0,
        }
    }

    pub fn with_capacity(bytes: usize) -> Self {
        BitWriter {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_pos: 0,
        }
    }

    pub fn write_bit(&mut self, bit: u32) {
        if bit != 0 {
            self.current_byte |= 1 << (7 - self.bit_pos);
        }

        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_pos = 0;
        }
    }

    /// Write the low `num_bits` bits of `value`, most significant first
    pub fn write_bits(&mut self, value: u32, num_bits: u32) {
        debug_assert!(num_bits <= 32);

        // fast path for whole bytes on a byte boundary
        if self.bit_pos == 0 && num_bits % 8 == 0 {
            for i in (0..num_bits / 8).rev() {
                self.bytes.push((value >> (i * 8)) as u8);
            }
            return;
        }

        for i in (0..num_bits).rev() {
            self.write_bit((value >> i) & 1);
        }
    }

    /// Write a two's complement value truncated to `num_bits`
    pub fn write_signed(&mut self, value: i32, num_bits: u32) {
        self.write_bits(value as u32, num_bits);
    }

    /// Write `count` copies of the inverse of `stop_bit`, then `stop_bit`
    pub fn write_unary(&mut self, stop_bit: u32, count: u32) {
        let continue_bit = if stop_bit == 0 { 1 } else { 0 };
        for _ in 0..count {
            self.write_bit(continue_bit);
        }
        self.write_bit(stop_bit);
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        if self.bit_pos == 0 {
            self.bytes.extend_from_slice(data);
        } else {
            for &b in data {
                self.write_bits(b as u32, 8);
            }
        }
    }

    /// Pad with zero bits up to the next byte boundary
    pub fn byte_align(&mut self) {
        if self.bit_pos > 0 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_pos = 0;
        }
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    pub fn bits_written(&self) -> u64 {
        self.bytes.len() as u64 * 8 + self.bit_pos as u64
    }

    pub fn byte_count(&self) -> usize {
        self.bytes.len() + if self.bit_pos > 0 { 1 } else { 0 }
    }

    /// Discard everything written so far, keeping the allocation
    pub fn reset(&mut self) {
        self.bytes.clear();
        self.current_byte = 0;
        self.bit_pos = 0;
    }

    /// Copy every bit recorded in `other` onto the end of this writer
    pub fn append(&mut self, other: &BitWriter) {
        self.write_bytes(&other.bytes);
        if other.bit_pos > 0 {
            let tail = (other.current_byte >> (8 - other.bit_pos)) as u32;
            self.write_bits(tail, other.bit_pos as u32);
        }
    }

    /// Copy every bit recorded in this writer onto the end of `dest`
    pub fn copy_to(&self, dest: &mut BitWriter) {
        dest.append(self);
    }

    /// Byte offset of the next whole byte; used as a mark for later patching
    pub fn byte_position(&self) -> usize {
        self.bytes.len()
    }

    /// Overwrite four already-written bytes at `pos` with a big-endian value
    pub fn patch_u32(&mut self, pos: usize, value: u32) -> AlacResult<()> {
        let end = pos
            .checked_add(4)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| {
                AlacError::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "patch position outside written data",
                ))
            })?;
        self.bytes[pos..end].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        self.byte_align();
        self.bytes
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit-level reader
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        BitReader {
            bytes,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    pub fn read_bit(&mut self) -> AlacResult<u32> {
        let byte = *self.bytes.get(self.byte_pos).ok_or(AlacError::UnexpectedEof)?;
        let bit = (byte >> (7 - self.bit_pos)) & 1;

        self.bit_pos += 1;
        if self.bit_pos == 8 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }

        Ok(bit as u32)
    }

    /// Read an unsigned value of up to 32 bits
    pub fn read(&mut self, num_bits: u32) -> AlacResult<u32> {
        debug_assert!(num_bits <= 32);
        if (num_bits as u64) > self.bits_remaining() {
            return Err(AlacError::UnexpectedEof);
        }

        let mut value = 0u32;
        for _ in 0..num_bits {
            value = (value << 1) | self.read_bit()?;
        }
        Ok(value)
    }

    /// Read a two's complement value of up to 32 bits
    pub fn read_signed(&mut self, num_bits: u32) -> AlacResult<i32> {
        if num_bits == 0 {
            return Ok(0);
        }
        let raw = self.read(num_bits)?;
        let unused = 32 - num_bits;
        Ok(((raw << unused) as i32) >> unused)
    }

    pub fn skip(&mut self, num_bits: u32) -> AlacResult<()> {
        if (num_bits as u64) > self.bits_remaining() {
            return Err(AlacError::UnexpectedEof);
        }
        let pos = self.bit_position() + num_bits as u64;
        self.seek(pos);
        Ok(())
    }

    /// Count leading 1 bits up to `max`, consuming the terminating 0 if one is seen first
    ///
    /// This is the MSB table for rice codes: a return of `max` means the
    /// escape prefix was read and no terminator follows.
    pub fn read_unary_ones_capped(&mut self, max: u32) -> AlacResult<u32> {
        let mut count = 0;
        while count < max {
            if self.read_bit()? == 0 {
                return Ok(count);
            }
            count += 1;
        }
        Ok(count)
    }

    pub fn read_bytes(&mut self, count: usize) -> AlacResult<Vec<u8>> {
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.read(8)? as u8);
        }
        Ok(out)
    }

    /// Skip to the next byte boundary
    pub fn byte_align(&mut self) {
        if self.bit_pos != 0 {
            self.bit_pos = 0;
            self.byte_pos += 1;
        }
    }

    pub fn bit_position(&self) -> u64 {
        self.byte_pos as u64 * 8 + self.bit_pos as u64
    }

    /// Move to an absolute bit offset previously taken from `bit_position`
    pub fn seek(&mut self, bit_position: u64) {
        self.byte_pos = (bit_position / 8) as usize;
        self.bit_pos = (bit_position % 8) as u8;
    }

    pub fn bits_remaining(&self) -> u64 {
        (self.bytes.len() as u64 * 8).saturating_sub(self.bit_position())
    }

    pub fn is_exhausted(&self) -> bool {
        self.byte_pos >= self.bytes.len()
    }
}
