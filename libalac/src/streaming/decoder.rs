use crate::core::{AlacError, AlacResult, BitReader, MagicCookie, StreamParams};
use crate::lossless::Decoder;

use super::types::{DecoderState, StreamingAudioInfo};

/// atom size + name
const ATOM_HEADER_SIZE: usize = 8;

pub struct StreamingDecoder {
    /// incoming data buffer
    buffer: Vec<u8>,
    /// current state
    state: DecoderState,
    /// set once the stream parameters are known
    decoder: Option<Decoder>,
    /// `mdat` bytes still to come; None for a bare frameset stream
    payload_remaining: Option<usize>,
    decoded_pcm_frames: u64,
}

impl StreamingDecoder {
    /// new streaming decoder for a file as written by `Writer`
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(64 * 1024),
            state: DecoderState::WaitingForHeader,
            decoder: None,
            payload_remaining: None,
            decoded_pcm_frames: 0,
        }
    }

    /// decoder for bare framesets with parameters known up front
    pub fn with_params(params: StreamParams) -> AlacResult<Self> {
        let mut decoder = Self::new();
        decoder.decoder = Some(Decoder::new(params)?);
        decoder.state = DecoderState::Ready;
        Ok(decoder)
    }

    /// current state
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// audio info if we have the parameters
    pub fn info(&self) -> Option<StreamingAudioInfo> {
        self.decoder.as_ref().map(|d| StreamingAudioInfo {
            params: *d.params(),
            decoded_pcm_frames: self.decoded_pcm_frames,
        })
    }

    /// feed more data, returns true if framesets may be ready
    pub fn feed(&mut self, data: &[u8]) -> AlacResult<bool> {
        if self.state == DecoderState::Error || self.state == DecoderState::Finished {
            return Ok(false);
        }

        self.buffer.extend_from_slice(data);
        if self.state == DecoderState::WaitingForHeader {
            if let Err(err) = self.try_parse_header() {
                self.state = DecoderState::Error;
                return Err(err);
            }
        }
        Ok(self.state == DecoderState::Ready && !self.buffer.is_empty())
    }

    /// decode the next frameset, or None if it isn't fully buffered yet
    pub fn next_frame(&mut self) -> AlacResult<Option<Vec<i32>>> {
        if self.state != DecoderState::Ready {
            return Ok(None);
        }
        let Some(decoder) = self.decoder.as_ref() else {
            return Ok(None);
        };

        if self.payload_remaining == Some(0) {
            self.state = DecoderState::Finished;
            return Ok(None);
        }
        if self.buffer.is_empty() {
            return Ok(None);
        }

        let available = match self.payload_remaining {
            Some(remaining) => remaining.min(self.buffer.len()),
            None => self.buffer.len(),
        };
        let complete = self.payload_remaining.is_some_and(|r| r <= self.buffer.len());

        let mut bits = BitReader::new(&self.buffer[..available]);
        match decoder.decode_frameset(&mut bits) {
            Ok(samples) => {
                let consumed = (bits.bit_position() / 8) as usize;
                self.buffer.drain(..consumed);
                if let Some(remaining) = self.payload_remaining.as_mut() {
                    *remaining -= consumed;
                }
                let channels = decoder.params().channels as usize;
                self.decoded_pcm_frames += (samples.len() / channels) as u64;
                Ok(Some(samples))
            }
            // frameset not all here yet
            Err(AlacError::UnexpectedEof) if !complete => Ok(None),
            Err(err) => {
                self.state = DecoderState::Error;
                Err(err)
            }
        }
    }

    /// decode everything we have
    pub fn decode_available(&mut self) -> AlacResult<Vec<i32>> {
        let mut samples = Vec::new();
        while let Some(frameset) = self.next_frame()? {
            samples.extend_from_slice(&frameset);
        }
        Ok(samples)
    }

    /// reset for reuse
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// bytes buffered
    pub fn buffered_bytes(&self) -> usize {
        self.buffer.len()
    }

    /// Consume whole atoms until the `mdat` header
    fn try_parse_header(&mut self) -> AlacResult<()> {
        while self.buffer.len() >= ATOM_HEADER_SIZE {
            let size = u32::from_be_bytes([
                self.buffer[0],
                self.buffer[1],
                self.buffer[2],
                self.buffer[3],
            ]) as usize;
            if size < ATOM_HEADER_SIZE {
                return Err(AlacError::InvalidContainer(format!(
                    "atom size {} too small",
                    size
                )));
            }

            if &self.buffer[4..8] == b"mdat" {
                let Some(decoder) = self.decoder.as_ref() else {
                    return Err(AlacError::InvalidContainer(
                        "mdat atom before alac atom".to_string(),
                    ));
                };
                tracing::debug!(
                    params = ?decoder.params(),
                    payload = size - ATOM_HEADER_SIZE,
                    "Stream header parsed"
                );
                self.buffer.drain(..ATOM_HEADER_SIZE);
                self.payload_remaining = Some(size - ATOM_HEADER_SIZE);
                self.state = DecoderState::Ready;
                return Ok(());
            }

            if self.buffer.len() < size {
                return Ok(());
            }
            if &self.buffer[4..8] == b"alac" {
                let params = MagicCookie::parse(&self.buffer[..size])?.to_params()?;
                self.decoder = Some(Decoder::new(params)?);
            }
            self.buffer.drain(..size);
        }
        Ok(())
    }
}

impl Default for StreamingDecoder {
    fn default() -> Self {
        Self::new()
    }
}
