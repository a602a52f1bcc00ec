//! realac - ALAC converter library
//!
//! Converts anything symphonia can read into an ALAC stream (an `alac` cookie
//! atom followed by an `mdat` atom) and back out to integer PCM WAV.

pub mod audio;

use anyhow::{anyhow, bail, Context, Result};
use libalac_audio::{decode_file_bytes, encode_file_bytes, file_info, Reader, StreamParams};

pub use audio::PcmAudio;

/// Information about an ALAC stream
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlacInfo {
    pub version: String,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    pub block_size: u32,
    pub initial_history: u32,
    pub history_multiplier: u32,
    pub maximum_k: u32,
    pub total_pcm_frames: u64,
    pub duration_secs: f64,
    pub framesets: usize,
    pub max_frame_bytes: u32,
    pub avg_bit_rate: u32,
    pub file_size: usize,
    pub compression_ratio: f64,
}

/// Get information about an ALAC stream
pub fn get_alac_info(data: &[u8]) -> Result<AlacInfo> {
    let summary = file_info(data).map_err(|e| anyhow!("Failed to read ALAC stream: {}", e))?;
    // the cookie carries the coder settings the summary leaves out
    let file = Reader::new()
        .read(data)
        .map_err(|e| anyhow!("Failed to read ALAC stream: {}", e))?;

    Ok(AlacInfo {
        version: summary.version(),
        sample_rate: summary.sample_rate,
        channels: summary.channels,
        bits_per_sample: summary.bits_per_sample,
        block_size: summary.block_size,
        initial_history: file.params.initial_history,
        history_multiplier: file.params.history_multiplier,
        maximum_k: file.params.maximum_k,
        total_pcm_frames: summary.total_pcm_frames,
        duration_secs: summary.duration_secs,
        framesets: summary.framesets,
        max_frame_bytes: summary.max_frame_bytes,
        avg_bit_rate: file.cookie.avg_bit_rate,
        file_size: summary.file_size,
        compression_ratio: summary.compression_ratio,
    })
}

/// Decode the whole stream and report whether it is intact
pub fn validate_alac(data: &[u8]) -> bool {
    match decode_file_bytes(data) {
        Ok(_) => true,
        Err(e) => {
            tracing::debug!("validation failed: {}", e);
            false
        }
    }
}

/// Encoder settings for converting audio to ALAC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Output bit depth (16 or 24); `None` follows the source
    pub bits: Option<u32>,
    pub block_size: u32,
    pub initial_history: u32,
    pub history_multiplier: u32,
    pub maximum_k: u32,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        let params = StreamParams::default();
        Self {
            bits: None,
            block_size: params.block_size,
            initial_history: params.initial_history,
            history_multiplier: params.history_multiplier,
            maximum_k: params.maximum_k,
        }
    }
}

impl EncodeOptions {
    pub fn with_bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    pub fn with_block_size(mut self, block_size: u32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Stream parameters for audio of the given shape
    pub fn stream_params(
        &self,
        channels: u32,
        bits_per_sample: u32,
        sample_rate: u32,
    ) -> StreamParams {
        StreamParams::new(channels, bits_per_sample, sample_rate)
            .with_block_size(self.block_size)
            .with_history(self.initial_history, self.history_multiplier)
            .with_maximum_k(self.maximum_k)
    }
}

/// Encode decoded PCM to an ALAC stream
pub fn encode_samples(audio: &PcmAudio, options: &EncodeOptions) -> Result<Vec<u8>> {
    let bits = options.bits.unwrap_or(audio.bits_per_sample);
    if bits != audio.bits_per_sample {
        bail!(
            "Samples are {}-bit but {}-bit output was requested",
            audio.bits_per_sample,
            bits
        );
    }

    let params = options.stream_params(audio.channels, bits, audio.sample_rate);
    encode_file_bytes(&audio.samples, params).context("Failed to encode ALAC stream")
}

/// Convert an audio file's bytes (wav, flac, mp3, ...) to an ALAC stream
pub fn encode_file(audio_bytes: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    let audio = audio::read_audio_from_bytes(audio_bytes, options.bits)?;
    encode_samples(&audio, options)
}

/// Decode an ALAC stream to PCM
pub fn decode_file(alac_bytes: &[u8]) -> Result<PcmAudio> {
    let file = Reader::new()
        .read(alac_bytes)
        .map_err(|e| anyhow!("Invalid ALAC stream: {}", e))?;
    let samples = decode_file_bytes(alac_bytes).context("Failed to decode ALAC stream")?;

    Ok(PcmAudio {
        samples,
        sample_rate: file.params.sample_rate,
        channels: file.params.channels,
        bits_per_sample: file.params.bits_per_sample,
        source_format: Some("ALAC".to_string()),
    })
}

/// Decode an ALAC stream to WAV bytes
pub fn decode_to_wav(alac_bytes: &[u8]) -> Result<Vec<u8>> {
    let audio = decode_file(alac_bytes)?;
    audio::write_wav_to_bytes(&audio)
}
