use std::collections::VecDeque;

use crate::core::{AlacResult, FrameSize, MagicCookie, StreamParams};
use crate::lossless::{EncodedStream, Encoder, EncoderOptions, MDAT_HEADER_SIZE};
use crate::Writer;

pub struct StreamingEncoder {
    params: StreamParams,
    encoder: Encoder,
    sample_buffer: Vec<i32>,
    pending_frames: VecDeque<EncodedFrame>,
    total_pcm_frames: u64,
    frame_index: u32,
}

/// One encoded frameset ready for transmission
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Frameset index
    pub index: u32,
    /// Timestamp in milliseconds
    pub timestamp_ms: u32,
    /// Encoded frameset bytes
    pub data: Vec<u8>,
    /// PCM frames in this frameset
    pub pcm_frames: u32,
}

impl StreamingEncoder {
    /// Create a new streaming encoder
    pub fn new(params: StreamParams) -> AlacResult<Self> {
        let block_samples = params.block_size as usize * params.channels as usize;
        Ok(Self {
            encoder: Encoder::new(params)?,
            params,
            sample_buffer: Vec::with_capacity(block_samples * 2),
            pending_frames: VecDeque::new(),
            total_pcm_frames: 0,
            frame_index: 0,
        })
    }

    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.encoder = self.encoder.with_options(options);
        self
    }

    /// Get number of buffered pcm frames not yet encoded
    pub fn pending_samples(&self) -> usize {
        self.sample_buffer.len() / self.params.channels as usize
    }

    /// Get number of encoded framesets ready
    pub fn pending_frames(&self) -> usize {
        self.pending_frames.len()
    }

    /// Push samples to the encoder
    ///
    /// Samples are interleaved if multi-channel; every full block is encoded
    /// straight away.
    pub fn push_samples(&mut self, samples: &[i32]) -> AlacResult<()> {
        self.sample_buffer.extend_from_slice(samples);

        let block_samples = self.params.block_size as usize * self.params.channels as usize;
        while self.sample_buffer.len() >= block_samples {
            let block: Vec<i32> = self.sample_buffer.drain(..block_samples).collect();
            let frame = self.encode_block(&block)?;
            self.pending_frames.push_back(frame);
        }

        Ok(())
    }

    /// Get next encoded frameset if available
    pub fn next_frame(&mut self) -> Option<EncodedFrame> {
        self.pending_frames.pop_front()
    }

    /// Flush remaining samples as a short final frameset
    ///
    /// A trailing partial pcm frame (fewer samples than channels) is dropped.
    pub fn flush(&mut self) -> AlacResult<Option<EncodedFrame>> {
        let channels = self.params.channels as usize;
        let whole = self.sample_buffer.len() / channels * channels;
        self.sample_buffer.truncate(whole);

        if self.sample_buffer.is_empty() {
            return Ok(None);
        }

        let block = std::mem::take(&mut self.sample_buffer);
        self.encode_block(&block).map(Some)
    }

    /// Build a complete file from the framesets not yet taken
    pub fn finalize(&mut self) -> AlacResult<Vec<u8>> {
        if let Some(frame) = self.flush()? {
            self.pending_frames.push_back(frame);
        }

        let payload_size: usize = self.pending_frames.iter().map(|f| f.data.len()).sum();
        let mut mdat = Vec::with_capacity(MDAT_HEADER_SIZE + payload_size);
        mdat.extend_from_slice(&((MDAT_HEADER_SIZE + payload_size) as u32).to_be_bytes());
        mdat.extend_from_slice(b"mdat");

        let mut frame_sizes = Vec::with_capacity(self.pending_frames.len());
        let mut total_pcm_frames = 0u64;
        for frame in self.pending_frames.drain(..) {
            mdat.extend_from_slice(&frame.data);
            frame_sizes.push(FrameSize {
                byte_size: frame.data.len() as u32,
                pcm_frames: frame.pcm_frames,
            });
            total_pcm_frames += frame.pcm_frames as u64;
        }

        let stream = EncodedStream {
            mdat,
            frame_sizes,
            total_pcm_frames,
        };
        Writer::new().write(&MagicCookie::from_params(&self.params), &stream)
    }

    fn encode_block(&mut self, block: &[i32]) -> AlacResult<EncodedFrame> {
        let pcm_frames = block.len() / self.params.channels as usize;
        let timestamp_ms =
            (self.total_pcm_frames * 1000 / self.params.sample_rate.max(1) as u64) as u32;

        let data = self.encoder.encode_block(block)?;
        let frame = EncodedFrame {
            index: self.frame_index,
            timestamp_ms,
            data,
            pcm_frames: pcm_frames as u32,
        };

        self.total_pcm_frames += pcm_frames as u64;
        self.frame_index += 1;
        Ok(frame)
    }
}
