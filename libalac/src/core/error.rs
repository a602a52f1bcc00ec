//! error types for the alac codec

use thiserror::Error;

/// everything that can go wrong while encoding or decoding
#[derive(Debug, Error)]
pub enum AlacError {
    /// a frame declared a channel count other than 1 or 2
    #[error("frame channel count not 1 or 2 (got {0})")]
    InvalidFrameChannelCount(u32),

    /// the frames of one frameset add up to more channels than the stream has
    #[error("frameset channels too large")]
    ExcessiveFrameChannelCount,

    /// a later frame in a frameset has a different block size than the first
    #[error("all frames not the same block size")]
    FrameBlockSizeMismatch,

    /// a frame declared more samples than the configured maximum block size
    #[error("frame block size greater than maximum block size")]
    InvalidBlockSize,

    /// a frameset ended before covering every channel of the stream
    #[error("frameset covers {found} of {expected} channels")]
    IncompleteFrameset { found: u32, expected: u32 },

    /// a frame split off more LSB bytes than its samples have
    #[error("invalid uncompressed LSB count {0}")]
    InvalidUncompressedLsbs(u32),

    /// a subframe used a prediction type other than 0
    #[error("invalid prediction type {0}")]
    InvalidPredictionType(u32),

    /// ran out of input bits in the middle of a read
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// underlying reader/writer failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// stream parameters rejected before a session starts
    #[error("invalid stream parameters: {0}")]
    InvalidParameters(String),

    /// atom layout around the payload is unusable
    #[error("invalid container: {0}")]
    InvalidContainer(String),

    /// feature that has no implementation yet
    #[error("not yet implemented: {0}")]
    NotImplemented(&'static str),
}

impl AlacError {
    /// true for malformed-bitstream errors that are fatal to the current decode
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            AlacError::InvalidFrameChannelCount(_)
                | AlacError::ExcessiveFrameChannelCount
                | AlacError::FrameBlockSizeMismatch
                | AlacError::InvalidBlockSize
                | AlacError::InvalidPredictionType(_)
                | AlacError::IncompleteFrameset { .. }
                | AlacError::InvalidUncompressedLsbs(_)
        )
    }

    /// true for faults raised by the byte source rather than the bitstream contents
    pub fn is_io(&self) -> bool {
        matches!(self, AlacError::UnexpectedEof | AlacError::Io(_))
    }
}

/// result type for alac stuff
pub type AlacResult<T> = Result<T, AlacError>;
