use serde::{Deserialize, Serialize};

use crate::core::{
    channel_groups, deinterleave, AlacError, AlacResult, BitWriter, FrameSize, PcmSource,
    RiceParams, StreamParams, SubframeHeader, FRAMESET_TERMINATOR, INTERLACING_SHIFT,
    MIN_COMPRESSED_BLOCK,
};

use super::correlate::correlate;
use super::estimator::{CoefficientEstimator, Estimate};

/// Largest stereo leftweight the frame format allows
pub const MAX_LEFTWEIGHT: u32 = 4;

/// Tunables that don't change the bitstream format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    pub minimum_leftweight: u32,
    pub maximum_leftweight: u32,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            minimum_leftweight: 0,
            maximum_leftweight: 4,
        }
    }
}

impl EncoderOptions {
    /// leftweights tried for stereo frames, inclusive, clamped to 0..=4
    pub fn with_leftweights(mut self, minimum: u32, maximum: u32) -> Self {
        let maximum = maximum.min(MAX_LEFTWEIGHT);
        self.minimum_leftweight = minimum.min(maximum);
        self.maximum_leftweight = maximum;
        self
    }

    pub fn validate(&self) -> AlacResult<()> {
        if self.maximum_leftweight > MAX_LEFTWEIGHT {
            return Err(AlacError::InvalidParameters(format!(
                "leftweight {} exceeds {}",
                self.maximum_leftweight, MAX_LEFTWEIGHT
            )));
        }
        if self.minimum_leftweight > self.maximum_leftweight {
            return Err(AlacError::InvalidParameters(format!(
                "leftweight range {}..={} is empty",
                self.minimum_leftweight, self.maximum_leftweight
            )));
        }
        Ok(())
    }
}

/// Result of encoding a whole stream
#[derive(Debug, Clone)]
pub struct EncodedStream {
    /// complete `mdat` atom: 32-bit size, "mdat", then the framesets
    pub mdat: Vec<u8>,
    /// one record per frameset, in stream order
    pub frame_sizes: Vec<FrameSize>,
    pub total_pcm_frames: u64,
}

impl EncodedStream {
    /// the framesets without the atom header
    pub fn payload(&self) -> &[u8] {
        &self.mdat[MDAT_HEADER_SIZE..]
    }

    /// largest single frameset in bytes
    pub fn max_frame_bytes(&self) -> u32 {
        self.frame_sizes
            .iter()
            .map(|f| f.byte_size)
            .max()
            .unwrap_or(0)
    }
}

/// size field + atom name
pub const MDAT_HEADER_SIZE: usize = 8;

/// Encoder session
///
/// Owns the scratch recorders used for trial encodes, so one instance handles
/// one stream at a time.
pub struct Encoder {
    params: StreamParams,
    options: EncoderOptions,
    estimator: CoefficientEstimator,
    trial_frame: BitWriter,
    best_frame: BitWriter,
    frame_sizes: Vec<FrameSize>,
}

impl Encoder {
    pub fn new(params: StreamParams) -> AlacResult<Self> {
        params.validate()?;
        Ok(Encoder {
            params,
            options: EncoderOptions::default(),
            estimator: CoefficientEstimator::new(RiceParams::from(&params)),
            trial_frame: BitWriter::new(),
            best_frame: BitWriter::new(),
            frame_sizes: Vec::new(),
        })
    }

    pub fn with_options(mut self, options: EncoderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// frameset sizes recorded so far
    pub fn frame_sizes(&self) -> &[FrameSize] {
        &self.frame_sizes
    }

    /// Encode everything `source` yields into an `mdat` atom
    pub fn encode<S: PcmSource>(mut self, source: &mut S) -> AlacResult<EncodedStream> {
        if source.channels() != self.params.channels {
            return Err(AlacError::InvalidParameters(format!(
                "source has {} channels, stream expects {}",
                source.channels(),
                self.params.channels
            )));
        }

        let mut out = BitWriter::new();
        let size_pos = out.byte_position();
        out.write_bits(0, 32); // patched below
        out.write_bytes(b"mdat");

        let block_size = self.params.block_size as usize;
        let mut block = Vec::with_capacity(block_size * self.params.channels as usize);
        let mut total_pcm_frames = 0u64;

        loop {
            block.clear();
            let frames = source.read(block_size, &mut block)?;
            if frames == 0 {
                break;
            }
            let frameset = self.encode_block(&block)?;
            out.write_bytes(&frameset);
            total_pcm_frames += frames as u64;
        }

        let total_size = u32::try_from(out.byte_count()).map_err(|_| {
            AlacError::InvalidContainer("mdat payload exceeds 4 GiB".to_string())
        })?;
        out.patch_u32(size_pos, total_size)?;

        tracing::debug!(
            framesets = self.frame_sizes.len(),
            total_pcm_frames,
            total_size,
            "Encoded stream"
        );

        Ok(EncodedStream {
            mdat: out.into_bytes(),
            frame_sizes: self.frame_sizes,
            total_pcm_frames,
        })
    }

    /// Encode one block of interleaved samples as a frameset
    ///
    /// The block may be shorter than the configured block size (the end of a
    /// stream) but not longer.
    pub fn encode_block(&mut self, samples: &[i32]) -> AlacResult<Vec<u8>> {
        self.options.validate()?;
        let channels = self.params.channels as usize;
        if samples.is_empty() || samples.len() % channels != 0 {
            return Err(AlacError::InvalidParameters(format!(
                "block of {} samples doesn't divide into {} channels",
                samples.len(),
                channels
            )));
        }
        let pcm_frames = samples.len() / channels;
        if pcm_frames > self.params.block_size as usize {
            return Err(AlacError::InvalidBlockSize);
        }

        let channel_data = deinterleave(samples, channels);
        let mut bits = BitWriter::with_capacity(samples.len() * 2);
        self.write_frameset(&mut bits, &channel_data);
        let frameset = bits.into_bytes();

        tracing::debug!(
            channels,
            pcm_frames,
            bytes = frameset.len(),
            "Encoded frameset"
        );

        self.frame_sizes.push(FrameSize {
            byte_size: frameset.len() as u32,
            pcm_frames: pcm_frames as u32,
        });
        Ok(frameset)
    }

    /// Write every channel of one block as frames, then the terminator
    pub fn write_frameset(&mut self, bits: &mut BitWriter, channels: &[Vec<i32>]) {
        for group in channel_groups(channels.len()) {
            let frame: Vec<&[i32]> = group.iter().map(|&c| channels[c].as_slice()).collect();
            self.write_frame(bits, &frame);
        }

        bits.write_bits(FRAMESET_TERMINATOR, 3);
        bits.byte_align();
    }

    /// One mono or stereo frame, compressed when possible
    fn write_frame(&mut self, bits: &mut BitWriter, channels: &[&[i32]]) {
        bits.write_bits(channels.len() as u32 - 1, 3);

        let block_len = channels[0].len();
        if block_len < MIN_COMPRESSED_BLOCK {
            tracing::trace!(block_len, "Short frame written uncompressed");
            self.write_uncompressed_frame(bits, channels);
            return;
        }

        if self.write_compressed_frame(channels) {
            self.best_frame.copy_to(bits);
        } else {
            tracing::trace!(block_len, "Residual overflow, frame written uncompressed");
            self.write_uncompressed_frame(bits, channels);
        }
    }

    fn write_frame_header(
        &self,
        bits: &mut BitWriter,
        block_len: usize,
        lsbs: u32,
        uncompressed: bool,
    ) {
        let has_sample_count = block_len != self.params.block_size as usize;

        bits.write_bits(0, 16); // unused
        bits.write_bit(has_sample_count as u32);
        bits.write_bits(lsbs, 2);
        bits.write_bit(uncompressed as u32);
        if has_sample_count {
            bits.write_bits(block_len as u32, 32);
        }
    }

    /// Raw samples at full width, interleaved within the frame
    pub fn write_uncompressed_frame(&self, bits: &mut BitWriter, channels: &[&[i32]]) {
        let block_len = channels[0].len();
        self.write_frame_header(bits, block_len, 0, true);

        for i in 0..block_len {
            for channel in channels {
                bits.write_signed(channel[i], self.params.bits_per_sample);
            }
        }
    }

    /// Trial-encode a compressed frame into `best_frame`
    ///
    /// Stereo frames try every configured leftweight and keep the cheapest.
    /// Returns false if any trial overflowed; `best_frame` is then garbage.
    fn write_compressed_frame(&mut self, channels: &[&[i32]]) -> bool {
        let lsbs = self.params.uncompressed_lsbs();
        let (msbs, lsb_values) = split_lsbs(channels, lsbs * 8);
        let msbs: Vec<&[i32]> = msbs.iter().map(Vec::as_slice).collect();

        self.best_frame.reset();

        if msbs.len() == 1 {
            let mut frame = std::mem::take(&mut self.best_frame);
            let ok = self.write_frame_body(&mut frame, &msbs, lsbs, &lsb_values, 0, 0);
            self.best_frame = frame;
            return ok;
        }

        let mut best_bits = u64::MAX;
        let mut best_leftweight = 0;
        for leftweight in self.options.minimum_leftweight..=self.options.maximum_leftweight {
            let mut trial = std::mem::take(&mut self.trial_frame);
            trial.reset();
            let ok = self.write_frame_body(
                &mut trial,
                &msbs,
                lsbs,
                &lsb_values,
                INTERLACING_SHIFT,
                leftweight,
            );
            if !ok {
                self.trial_frame = trial;
                return false;
            }
            if trial.bits_written() < best_bits {
                best_bits = trial.bits_written();
                best_leftweight = leftweight;
                std::mem::swap(&mut self.best_frame, &mut trial);
            }
            self.trial_frame = trial;
        }

        tracing::trace!(leftweight = best_leftweight, bits = best_bits, "Chose interlacing");
        best_bits != u64::MAX
    }

    #[allow(clippy::too_many_arguments)]
    fn write_frame_body(
        &mut self,
        bits: &mut BitWriter,
        channels: &[&[i32]],
        lsbs: u32,
        lsb_values: &[u32],
        shift: u32,
        leftweight: u32,
    ) -> bool {
        let block_len = channels[0].len();
        let sample_size = self.params.sample_size(lsbs, channels.len() as u32);

        self.write_frame_header(bits, block_len, lsbs, false);
        bits.write_bits(shift, 8);
        bits.write_bits(leftweight, 8);

        let estimates = if channels.len() == 2 {
            let (corr0, corr1) = correlate(channels[0], channels[1], shift, leftweight);
            self.estimate_all(&[corr0.as_slice(), corr1.as_slice()], sample_size)
        } else {
            self.estimate_all(channels, sample_size)
        };
        let Some(estimates) = estimates else {
            return false;
        };

        for estimate in &estimates {
            tracing::trace!(order = estimate.order(), "Chose predictor order");
            write_subframe_header(bits, &SubframeHeader::for_coefficients(&estimate.coefficients));
        }

        if lsbs > 0 {
            for &lsb in lsb_values {
                bits.write_bits(lsb, lsbs * 8);
            }
        }

        for estimate in &estimates {
            bits.append(&estimate.residuals);
        }
        true
    }

    fn estimate_all(&mut self, channels: &[&[i32]], sample_size: u32) -> Option<Vec<Estimate>> {
        channels
            .iter()
            .map(|channel| self.estimator.estimate(channel, sample_size))
            .collect()
    }
}

fn write_subframe_header(bits: &mut BitWriter, header: &SubframeHeader) {
    bits.write_bits(header.prediction_type, 4);
    bits.write_bits(header.shift_needed, 4);
    bits.write_bits(header.rice_modifier, 3);
    bits.write_bits(header.order() as u32, 5);
    for &coeff in &header.coefficients {
        bits.write_signed(coeff, 16);
    }
}

/// Split off the low `lsb_bits` of every sample
///
/// Returns the per-channel high parts and the low parts interleaved per sample
/// then per channel, the order they're written in.
pub fn split_lsbs(channels: &[&[i32]], lsb_bits: u32) -> (Vec<Vec<i32>>, Vec<u32>) {
    if lsb_bits == 0 {
        return (channels.iter().map(|c| c.to_vec()).collect(), Vec::new());
    }

    let mask = (1i32 << lsb_bits) - 1;
    let block_len = channels[0].len();
    let mut msbs: Vec<Vec<i32>> = channels.iter().map(|_| Vec::with_capacity(block_len)).collect();
    let mut lsbs = Vec::with_capacity(block_len * channels.len());

    for i in 0..block_len {
        for (c, channel) in channels.iter().enumerate() {
            lsbs.push((channel[i] & mask) as u32);
            msbs[c].push(channel[i] >> lsb_bits);
        }
    }

    (msbs, lsbs)
}
