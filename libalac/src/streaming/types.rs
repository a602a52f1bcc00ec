//! Streaming types and enums

use serde::Serialize;

use crate::core::StreamParams;

/// Streaming decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for the `alac` atom and the `mdat` header
    WaitingForHeader,
    /// Ready to decode framesets
    Ready,
    /// End of the `mdat` payload reached
    Finished,
    /// Error state
    Error,
}

/// Audio information for streaming
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StreamingAudioInfo {
    pub params: StreamParams,
    /// pcm frames decoded so far
    pub decoded_pcm_frames: u64,
}

impl StreamingAudioInfo {
    /// seconds decoded so far
    pub fn decoded_secs(&self) -> f64 {
        self.decoded_pcm_frames as f64 / self.params.sample_rate.max(1) as f64
    }
}
