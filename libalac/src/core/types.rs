//! common types for the alac codec

use serde::{Deserialize, Serialize};

use super::error::{AlacError, AlacResult};

// constants

/// largest order that fits the 5-bit coefficient count field
pub const MAX_COEFFICIENTS: usize = 31;

/// highest order the encoder estimates
pub const MAX_LPC_ORDER: usize = 8;

/// fixed quantization shift of encoder coefficients
pub const QLP_SHIFT: u32 = 9;

/// fixed interlacing shift used by the encoder
pub const INTERLACING_SHIFT: u32 = 2;

/// rice modifier the encoder writes; decodes to the plain history multiplier
pub const RICE_MODIFIER: u32 = 4;

/// frames shorter than this are always written uncompressed
pub const MIN_COMPRESSED_BLOCK: usize = 10;

/// 3-bit channel field value that ends a frameset
pub const FRAMESET_TERMINATOR: u32 = 0b111;

/// order 8 must beat order 4 by at least this many bits to be chosen
pub const ORDER8_BIT_PENALTY: u64 = 64;

// stream parameters

/// Immutable per-session parameters, supplied by the container layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamParams {
    /// PCM frames per full block
    pub block_size: u32,
    /// 16 or 24
    pub bits_per_sample: u32,
    pub channels: u32,
    pub sample_rate: u32,
    pub initial_history: u32,
    pub history_multiplier: u32,
    pub maximum_k: u32,
}

impl Default for StreamParams {
    fn default() -> Self {
        StreamParams {
            block_size: 4096,
            bits_per_sample: 16,
            channels: 2,
            sample_rate: 44100,
            initial_history: 10,
            history_multiplier: 40,
            maximum_k: 14,
        }
    }
}

impl StreamParams {
    pub fn new(channels: u32, bits_per_sample: u32, sample_rate: u32) -> Self {
        StreamParams {
            channels,
            bits_per_sample,
            sample_rate,
            ..Default::default()
        }
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn with_history(mut self, initial_history: u32, history_multiplier: u32) -> Self {
        self.initial_history = initial_history;
        self.history_multiplier = history_multiplier;
        self
    }

    pub fn with_maximum_k(mut self, maximum_k: u32) -> Self {
        self.maximum_k = maximum_k;
        self
    }

    /// reject parameters the bitstream can't carry
    pub fn validate(&self) -> AlacResult<()> {
        if self.bits_per_sample != 16 && self.bits_per_sample != 24 {
            return Err(AlacError::InvalidParameters(format!(
                "bits per sample must be 16 or 24, got {}",
                self.bits_per_sample
            )));
        }
        if self.channels == 0 {
            return Err(AlacError::InvalidParameters(
                "channel count must be at least 1".to_string(),
            ));
        }
        if self.block_size == 0 {
            return Err(AlacError::InvalidParameters(
                "block size must be at least 1".to_string(),
            ));
        }
        if !(1..=24).contains(&self.maximum_k) {
            return Err(AlacError::InvalidParameters(format!(
                "maximum K must be within 1..=24, got {}",
                self.maximum_k
            )));
        }
        if self.history_multiplier > 255 || self.initial_history > 255 {
            return Err(AlacError::InvalidParameters(
                "history parameters must fit in 8 bits".to_string(),
            ));
        }
        Ok(())
    }

    /// number of whole bytes split off each sample before prediction
    pub fn uncompressed_lsbs(&self) -> u32 {
        self.bits_per_sample.saturating_sub(16) / 8
    }

    /// bits per residual for a frame of `frame_channels` channels
    pub fn sample_size(&self, uncompressed_lsbs: u32, frame_channels: u32) -> u32 {
        self.bits_per_sample - uncompressed_lsbs * 8 + (frame_channels - 1)
    }
}

// frame structures

/// Header shared by compressed and uncompressed frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// 1 or 2
    pub channels: u32,
    /// true when the frame carries an explicit sample count
    pub has_sample_count: bool,
    /// whole bytes of raw LSBs per sample (0 for 16-bit)
    pub uncompressed_lsbs: u32,
    /// the "not compressed" flag
    pub uncompressed: bool,
    /// samples per channel actually present
    pub block_size: u32,
}

/// Per-channel predictor header in a compressed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubframeHeader {
    pub prediction_type: u32,
    pub shift_needed: u32,
    pub rice_modifier: u32,
    pub coefficients: Vec<i32>,
}

impl SubframeHeader {
    /// header the encoder writes for a set of quantized coefficients
    pub fn for_coefficients(coefficients: &[i32]) -> Self {
        SubframeHeader {
            prediction_type: 0,
            shift_needed: QLP_SHIFT,
            rice_modifier: RICE_MODIFIER,
            coefficients: coefficients.to_vec(),
        }
    }

    pub fn order(&self) -> usize {
        self.coefficients.len()
    }
}

/// Size of one encoded frameset, as recorded for the container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub byte_size: u32,
    pub pcm_frames: u32,
}

/// Outcome of a trial encode that may hit residual overflow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialEncode {
    /// residuals fit; this many bits were recorded
    Committed(u64),
    /// some residual didn't fit in the sample size
    Overflow,
}

impl TrialEncode {
    pub fn is_overflow(self) -> bool {
        self == TrialEncode::Overflow
    }
}

// channel layout

/// Frames that make up a frameset for `channels` input channels
///
/// Each group lists input channel indices in bitstream order; groups are mono
/// or stereo pairs. Past eight channels every channel gets its own mono frame.
pub fn channel_groups(channels: usize) -> Vec<Vec<usize>> {
    match channels {
        0 => vec![],
        1 => vec![vec![0]],
        2 => vec![vec![0, 1]],
        3 => vec![vec![2], vec![0, 1]],
        4 => vec![vec![2], vec![0, 1], vec![3]],
        5 => vec![vec![2], vec![0, 1], vec![3, 4]],
        6 => vec![vec![2], vec![0, 1], vec![4, 5], vec![3]],
        7 => vec![vec![2], vec![0, 1], vec![4, 5], vec![6], vec![3]],
        8 => vec![vec![2], vec![6, 7], vec![0, 1], vec![4, 5], vec![3]],
        n => (0..n).map(|c| vec![c]).collect(),
    }
}
