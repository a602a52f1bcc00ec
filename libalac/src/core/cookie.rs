//! ALAC magic cookie (ALACSpecificConfig)
//!
//! 24 big-endian bytes carried by the container's `alac` sample description.
//! It holds everything the decoder needs before the first frameset.

use serde::{Deserialize, Serialize};

use super::bitstream::{BitReader, BitWriter};
use super::error::{AlacError, AlacResult};
use super::types::StreamParams;

/// size of the bare config record
pub const COOKIE_SIZE: usize = 24;

/// size of the config wrapped in its `alac` full-box header
pub const COOKIE_ATOM_SIZE: usize = 12 + COOKIE_SIZE;

/// value written to the unused max-run field
const DEFAULT_MAX_RUN: u16 = 255;

/// Decoded ALACSpecificConfig
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicCookie {
    pub frame_length: u32,
    pub compatible_version: u8,
    pub bit_depth: u8,
    /// history multiplier ("pb")
    pub history_multiplier: u8,
    /// initial history ("mb")
    pub initial_history: u8,
    /// maximum rice parameter ("kb")
    pub maximum_k: u8,
    pub channels: u8,
    pub max_run: u16,
    pub max_frame_bytes: u32,
    pub avg_bit_rate: u32,
    pub sample_rate: u32,
}

impl MagicCookie {
    /// cookie describing `params`; frame byte stats are filled in after encoding
    pub fn from_params(params: &StreamParams) -> Self {
        MagicCookie {
            frame_length: params.block_size,
            compatible_version: 0,
            bit_depth: params.bits_per_sample as u8,
            history_multiplier: params.history_multiplier as u8,
            initial_history: params.initial_history as u8,
            maximum_k: params.maximum_k as u8,
            channels: params.channels as u8,
            max_run: DEFAULT_MAX_RUN,
            max_frame_bytes: 0,
            avg_bit_rate: 0,
            sample_rate: params.sample_rate,
        }
    }

    pub fn with_frame_stats(mut self, max_frame_bytes: u32, avg_bit_rate: u32) -> Self {
        self.max_frame_bytes = max_frame_bytes;
        self.avg_bit_rate = avg_bit_rate;
        self
    }

    /// stream parameters this cookie configures, validated
    pub fn to_params(&self) -> AlacResult<StreamParams> {
        let params = StreamParams {
            block_size: self.frame_length,
            bits_per_sample: self.bit_depth as u32,
            channels: self.channels as u32,
            sample_rate: self.sample_rate,
            initial_history: self.initial_history as u32,
            history_multiplier: self.history_multiplier as u32,
            maximum_k: self.maximum_k as u32,
        };
        params.validate()?;
        Ok(params)
    }

    /// Parse a cookie, with or without its 12-byte `alac` atom header
    pub fn parse(data: &[u8]) -> AlacResult<Self> {
        let body = match data.len() {
            COOKIE_SIZE => data,
            n if n >= COOKIE_ATOM_SIZE && &data[4..8] == b"alac" => {
                &data[12..COOKIE_ATOM_SIZE]
            }
            n => {
                return Err(AlacError::InvalidParameters(format!(
                    "magic cookie must be {} bytes, got {}",
                    COOKIE_SIZE, n
                )))
            }
        };

        let mut bits = BitReader::new(body);
        Ok(MagicCookie {
            frame_length: bits.read(32)?,
            compatible_version: bits.read(8)? as u8,
            bit_depth: bits.read(8)? as u8,
            history_multiplier: bits.read(8)? as u8,
            initial_history: bits.read(8)? as u8,
            maximum_k: bits.read(8)? as u8,
            channels: bits.read(8)? as u8,
            max_run: bits.read(16)? as u16,
            max_frame_bytes: bits.read(32)?,
            avg_bit_rate: bits.read(32)?,
            sample_rate: bits.read(32)?,
        })
    }

    /// the bare 24-byte record
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bits = BitWriter::with_capacity(COOKIE_SIZE);
        self.write_body(&mut bits);
        bits.into_bytes()
    }

    /// the record wrapped as a full `alac` atom
    pub fn to_atom_bytes(&self) -> Vec<u8> {
        let mut bits = BitWriter::with_capacity(COOKIE_ATOM_SIZE);
        bits.write_bits(COOKIE_ATOM_SIZE as u32, 32);
        bits.write_bytes(b"alac");
        bits.write_bits(0, 32); // version + flags
        self.write_body(&mut bits);
        bits.into_bytes()
    }

    fn write_body(&self, bits: &mut BitWriter) {
        bits.write_bits(self.frame_length, 32);
        bits.write_bits(self.compatible_version as u32, 8);
        bits.write_bits(self.bit_depth as u32, 8);
        bits.write_bits(self.history_multiplier as u32, 8);
        bits.write_bits(self.initial_history as u32, 8);
        bits.write_bits(self.maximum_k as u32, 8);
        bits.write_bits(self.channels as u32, 8);
        bits.write_bits(self.max_run as u32, 16);
        bits.write_bits(self.max_frame_bytes, 32);
        bits.write_bits(self.avg_bit_rate, 32);
        bits.write_bits(self.sample_rate, 32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cookie_layout() {
        let bytes = MagicCookie::from_params(&StreamParams::default()).to_bytes();
        assert_eq!(bytes.len(), COOKIE_SIZE);
        assert_eq!(&bytes[0..4], &4096u32.to_be_bytes());
        // bit depth, pb, mb, kb, channels
        assert_eq!(&bytes[5..10], &[16, 40, 10, 14, 2]);
        assert_eq!(&bytes[20..24], &44100u32.to_be_bytes());
    }

    #[test]
    fn test_atom_form_parses() {
        let params = StreamParams::new(1, 24, 48000).with_block_size(1024);
        let atom = MagicCookie::from_params(&params).to_atom_bytes();
        assert_eq!(atom.len(), COOKIE_ATOM_SIZE);
        let cookie = MagicCookie::parse(&atom).unwrap();
        assert_eq!(cookie.to_params().unwrap(), params);
    }

    #[test]
    fn test_short_cookie_rejected() {
        assert!(MagicCookie::parse(&[0u8; 10]).is_err());
    }
}
