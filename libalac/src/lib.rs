#![allow(clippy::needless_range_loop)]

use wasm_bindgen::prelude::*;

pub mod core;
pub mod lossless;
pub mod streaming;

mod reader;
mod writer;

pub use crate::core::{
    deinterleave, interleave, rice, AlacError, AlacResult, BitReader, BitWriter, FrameHeader,
    FrameSize, MagicCookie, PcmSink, PcmSource, RiceParams, SliceSource, StreamParams,
    SubframeHeader,
};
pub use lossless::{lpc, Decoder, EncodedStream, Encoder, EncoderOptions};
pub use reader::{AlacFile, Reader};
pub use streaming::{
    DecoderState, EncodedFrame, StreamingAudioInfo, StreamingDecoder, StreamingEncoder,
};
pub use writer::Writer;

// audio info for the info() function

/// info about an alac file
#[wasm_bindgen]
#[derive(Debug, Clone)]
pub struct AudioInfo {
    /// cookie compatible version, always "0"
    #[wasm_bindgen(skip)]
    pub version: String,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u32,
    /// 16 or 24
    pub bits_per_sample: u32,
    /// PCM frames per full frameset
    pub block_size: u32,
    /// Total pcm frames from the size tables
    pub total_pcm_frames: u64,
    /// Duration in seconds
    pub duration_secs: f64,
    /// File size in bytes
    pub file_size: usize,
    /// Compression ratio (original / compressed)
    pub compression_ratio: f64,
    /// Number of framesets in the `mdat` payload
    pub framesets: usize,
    /// Largest frameset in bytes, as recorded in the cookie
    pub max_frame_bytes: u32,
}

#[wasm_bindgen]
impl AudioInfo {
    #[wasm_bindgen(getter)]
    pub fn version(&self) -> String {
        self.version.clone()
    }
}

// result helpers

/// turn an error into js
fn to_js_err(e: AlacError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

// native api

/// Encode interleaved integer samples into a complete file
///
/// Uses the default block size and rice parameters from `params`.
pub fn encode_file_bytes(samples: &[i32], params: StreamParams) -> AlacResult<Vec<u8>> {
    encode_file_bytes_with(samples, params, EncoderOptions::default())
}

/// Same as [`encode_file_bytes`] with explicit encoder options
pub fn encode_file_bytes_with(
    samples: &[i32],
    params: StreamParams,
    options: EncoderOptions,
) -> AlacResult<Vec<u8>> {
    let encoder = Encoder::new(params)?.with_options(options);
    let mut source = SliceSource::new(samples, params.channels);
    let stream = encoder.encode(&mut source)?;
    Writer::new().write(&MagicCookie::from_params(&params), &stream)
}

/// Decode a complete file back to interleaved samples
pub fn decode_file_bytes(data: &[u8]) -> AlacResult<Vec<i32>> {
    let file = Reader::new().read(data)?;
    let decoder = Decoder::new(file.params)?;
    decoder.decode_payload(file.payload)
}

// api functions

/// encode samples to alac
///
/// # Arguments
/// * `samples` - Interleaved integer samples, sign-extended to i32
/// * `sample_rate` - Sample rate in Hz (e.g., 44100)
/// * `channels` - Number of channels
/// * `bits_per_sample` - 16 or 24
///
/// # Returns
/// alac file as byte array
///
/// # Note
/// For custom block sizes or rice parameters, use the `Encoder` directly.
#[wasm_bindgen]
pub fn encode(
    samples: &[i32],
    sample_rate: u32,
    channels: u32,
    bits_per_sample: u32,
) -> Result<Vec<u8>, JsValue> {
    let params = StreamParams::new(channels, bits_per_sample, sample_rate);
    encode_file_bytes(samples, params).map_err(to_js_err)
}

/// decode an alac file
///
/// # Arguments
/// * `data` - alac file bytes
///
/// # Returns
/// Interleaved integer samples
#[wasm_bindgen]
pub fn decode(data: &[u8]) -> Result<Vec<i32>, JsValue> {
    decode_file_bytes(data).map_err(to_js_err)
}

/// Validate an alac file
///
/// # Arguments
/// * `data` - alac file bytes
///
/// # Returns
/// true if the container parses and every frameset decodes
#[wasm_bindgen]
pub fn validate(data: &[u8]) -> Result<bool, JsValue> {
    match decode_file_bytes(data) {
        Ok(_) => Ok(true),
        Err(e) => {
            tracing::debug!(error = %e, "Validation failed");
            Ok(false)
        }
    }
}

/// Get information about an alac file
///
/// # Arguments
/// * `data` - alac file bytes
///
/// # Returns
/// AudioInfo struct with file details
#[wasm_bindgen]
pub fn info(data: &[u8]) -> Result<AudioInfo, JsValue> {
    file_info(data).map_err(to_js_err)
}

/// native version of [`info`]
pub fn file_info(data: &[u8]) -> AlacResult<AudioInfo> {
    let file = Reader::new().read(data)?;
    let params = file.params;

    let total_pcm_frames = file.total_pcm_frames().unwrap_or(0);
    let duration_secs = total_pcm_frames as f64 / params.sample_rate.max(1) as f64;
    let original_size = total_pcm_frames as f64
        * params.channels as f64
        * (params.bits_per_sample as f64 / 8.0);
    let compression_ratio = if !data.is_empty() {
        original_size / data.len() as f64
    } else {
        0.0
    };

    Ok(AudioInfo {
        version: file.cookie.compatible_version.to_string(),
        sample_rate: params.sample_rate,
        channels: params.channels,
        bits_per_sample: params.bits_per_sample,
        block_size: params.block_size,
        total_pcm_frames,
        duration_secs,
        file_size: data.len(),
        compression_ratio,
        framesets: file.frame_sizes.len(),
        max_frame_bytes: file.cookie.max_frame_bytes,
    })
}

/// get lib version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// streaming decoder wasm api

#[wasm_bindgen]
pub struct WasmStreamingDecoder {
    inner: StreamingDecoder,
}

#[wasm_bindgen]
impl WasmStreamingDecoder {
    /// new streaming decoder
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: StreamingDecoder::new(),
        }
    }

    /// feed data to the decoder, call as bytes come in from network
    #[wasm_bindgen]
    pub fn feed(&mut self, data: &[u8]) -> Result<bool, JsValue> {
        self.inner.feed(data).map_err(to_js_err)
    }

    /// Check if the decoder is ready to produce audio
    #[wasm_bindgen]
    pub fn is_ready(&self) -> bool {
        self.inner.state() == DecoderState::Ready
    }

    /// stream done?
    #[wasm_bindgen]
    pub fn is_finished(&self) -> bool {
        self.inner.state() == DecoderState::Finished
    }

    /// Check if there was an error
    #[wasm_bindgen]
    pub fn has_error(&self) -> bool {
        self.inner.state() == DecoderState::Error
    }

    /// Get the current state as a string
    #[wasm_bindgen]
    pub fn state(&self) -> String {
        match self.inner.state() {
            DecoderState::WaitingForHeader => "waiting_for_header".into(),
            DecoderState::Ready => "ready".into(),
            DecoderState::Finished => "finished".into(),
            DecoderState::Error => "error".into(),
        }
    }

    /// Get stream parameters and progress
    ///
    /// Returns null until the `alac` atom has been parsed.
    #[wasm_bindgen]
    pub fn get_info(&self) -> Result<JsValue, JsValue> {
        match self.inner.info() {
            Some(info) => serde_wasm_bindgen::to_value(&info)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    /// decode all currently available samples
    #[wasm_bindgen]
    pub fn decode_available(&mut self) -> Result<Vec<i32>, JsValue> {
        self.inner.decode_available().map_err(to_js_err)
    }

    /// Decode the next available frameset
    ///
    /// Returns interleaved samples for one frameset, or an empty array if
    /// none is fully buffered yet.
    #[wasm_bindgen]
    pub fn next_frame(&mut self) -> Result<Vec<i32>, JsValue> {
        match self.inner.next_frame() {
            Ok(Some(samples)) => Ok(samples),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(to_js_err(e)),
        }
    }

    /// Reset the decoder to initial state
    #[wasm_bindgen]
    pub fn reset(&mut self) {
        self.inner.reset();
    }

    /// bytes currently buffered
    #[wasm_bindgen]
    pub fn buffered_bytes(&self) -> usize {
        self.inner.buffered_bytes()
    }
}

impl Default for WasmStreamingDecoder {
    fn default() -> Self {
        Self::new()
    }
}
