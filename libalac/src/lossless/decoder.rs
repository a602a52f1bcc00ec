use crate::core::rice::decode_residuals;
use crate::core::{
    channel_groups, interleave, AlacError, AlacResult, BitReader, FrameHeader, PcmSink,
    RiceParams, StreamParams, SubframeHeader, FRAMESET_TERMINATOR,
};

use super::correlate::decorrelate;
use super::lpc::reconstruct_samples;

/// Decoder session
///
/// Stateless between framesets apart from the stream parameters; each call
/// to `decode_frameset` builds its output locally and only hands it back if
/// the whole frameset parsed.
pub struct Decoder {
    params: StreamParams,
    rice: RiceParams,
}

impl Decoder {
    pub fn new(params: StreamParams) -> AlacResult<Self> {
        params.validate()?;
        Ok(Decoder {
            rice: RiceParams::from(&params),
            params,
        })
    }

    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// Decode one frameset into interleaved samples
    ///
    /// Leaves `bits` byte aligned after the terminator.
    pub fn decode_frameset(&self, bits: &mut BitReader) -> AlacResult<Vec<i32>> {
        self.read_frameset(bits).map_err(|err| {
            if err.is_protocol_violation() {
                tracing::warn!(%err, position = bits.bit_position(), "Rejected frameset");
            }
            err
        })
    }

    /// Decode back-to-back framesets until `payload` runs out
    pub fn decode_payload(&self, payload: &[u8]) -> AlacResult<Vec<i32>> {
        let mut samples = Vec::new();
        self.decode_into(payload, &mut samples)?;
        Ok(samples)
    }

    /// Like `decode_payload` but hands each frameset to `sink`; returns PCM frames decoded
    pub fn decode_into<K: PcmSink>(&self, payload: &[u8], sink: &mut K) -> AlacResult<u64> {
        let mut bits = BitReader::new(payload);
        let mut pcm_frames = 0u64;
        let mut framesets = 0usize;

        while !bits.is_exhausted() {
            let samples = self.decode_frameset(&mut bits)?;
            pcm_frames += (samples.len() / self.params.channels as usize) as u64;
            framesets += 1;
            sink.write(&samples)?;
        }

        tracing::debug!(framesets, pcm_frames, "Decoded payload");
        Ok(pcm_frames)
    }

    /// Seeking needs a sample-to-chunk index the decoder doesn't keep
    pub fn seek(&mut self, _pcm_frame: u64) -> AlacResult<()> {
        Err(AlacError::NotImplemented("seeking"))
    }

    fn read_frameset(&self, bits: &mut BitReader) -> AlacResult<Vec<i32>> {
        let stream_channels = self.params.channels as usize;
        let mut decoded: Vec<Vec<i32>> = Vec::with_capacity(stream_channels);
        let mut frame_widths = Vec::new();
        let mut block_size = None;

        loop {
            let channels = bits.read(3)?;
            if channels == FRAMESET_TERMINATOR {
                break;
            }
            let channels = channels + 1;

            if channels != 1 && channels != 2 {
                return Err(AlacError::InvalidFrameChannelCount(channels));
            }
            if decoded.len() + channels as usize > stream_channels {
                return Err(AlacError::ExcessiveFrameChannelCount);
            }

            let frame = self.read_frame(bits, channels)?;
            let frame_len = frame[0].len();
            if *block_size.get_or_insert(frame_len) != frame_len {
                return Err(AlacError::FrameBlockSizeMismatch);
            }

            tracing::trace!(channels, frame_len, "Decoded frame");
            frame_widths.push(channels as usize);
            decoded.extend(frame);
        }
        bits.byte_align();

        if decoded.len() != stream_channels {
            return Err(AlacError::IncompleteFrameset {
                found: decoded.len() as u32,
                expected: stream_channels as u32,
            });
        }

        Ok(interleave(&restore_channel_order(decoded, &frame_widths)))
    }

    fn read_frame_header(&self, bits: &mut BitReader, channels: u32) -> AlacResult<FrameHeader> {
        bits.skip(16)?; // unused
        let has_sample_count = bits.read(1)? == 1;
        let uncompressed_lsbs = bits.read(2)?;
        let uncompressed = bits.read(1)? == 1;

        let block_size = if has_sample_count {
            let block_size = bits.read(32)?;
            if block_size > self.params.block_size {
                return Err(AlacError::InvalidBlockSize);
            }
            block_size
        } else {
            self.params.block_size
        };

        if uncompressed_lsbs * 8 >= self.params.bits_per_sample {
            return Err(AlacError::InvalidUncompressedLsbs(uncompressed_lsbs));
        }

        Ok(FrameHeader {
            channels,
            has_sample_count,
            uncompressed_lsbs,
            uncompressed,
            block_size,
        })
    }

    fn read_frame(&self, bits: &mut BitReader, channels: u32) -> AlacResult<Vec<Vec<i32>>> {
        let header = self.read_frame_header(bits, channels)?;
        if header.uncompressed {
            self.read_uncompressed_frame(bits, &header)
        } else {
            self.read_compressed_frame(bits, &header)
        }
    }

    fn read_uncompressed_frame(
        &self,
        bits: &mut BitReader,
        header: &FrameHeader,
    ) -> AlacResult<Vec<Vec<i32>>> {
        let block_size = header.block_size as usize;
        let capacity = block_size.min(bits.bits_remaining() as usize);
        let mut channels = vec![Vec::with_capacity(capacity); header.channels as usize];

        for _ in 0..block_size {
            for channel in channels.iter_mut() {
                channel.push(bits.read_signed(self.params.bits_per_sample)?);
            }
        }

        Ok(channels)
    }

    fn read_compressed_frame(
        &self,
        bits: &mut BitReader,
        header: &FrameHeader,
    ) -> AlacResult<Vec<Vec<i32>>> {
        let block_size = header.block_size as usize;
        let channel_count = header.channels as usize;
        let lsb_bits = header.uncompressed_lsbs * 8;
        let sample_size = self
            .params
            .sample_size(header.uncompressed_lsbs, header.channels);

        let interlacing_shift = bits.read(8)?;
        let interlacing_leftweight = bits.read(8)?;

        let subframe_headers = (0..channel_count)
            .map(|_| read_subframe_header(bits))
            .collect::<AlacResult<Vec<_>>>()?;

        let mut lsbs = Vec::new();
        if lsb_bits > 0 {
            lsbs.reserve((block_size * channel_count).min(bits.bits_remaining() as usize));
            for _ in 0..block_size * channel_count {
                lsbs.push(bits.read(lsb_bits)?);
            }
        }

        let mut subframes = Vec::with_capacity(channel_count);
        for subframe_header in subframe_headers {
            let rice = self.rice.with_modifier(subframe_header.rice_modifier);
            let residuals = decode_residuals(bits, &rice, sample_size, block_size)?;
            let mut coefficients = subframe_header.coefficients;
            subframes.push(reconstruct_samples(
                &residuals,
                &mut coefficients,
                subframe_header.shift_needed,
                sample_size,
            ));
        }

        let mut channels = if channel_count == 2 {
            let (left, right) = decorrelate(
                &subframes[0],
                &subframes[1],
                interlacing_shift,
                interlacing_leftweight,
            );
            vec![left, right]
        } else {
            subframes
        };

        if lsb_bits > 0 {
            for i in 0..block_size {
                for (c, channel) in channels.iter_mut().enumerate() {
                    channel[i] = (channel[i] << lsb_bits) | lsbs[i * channel_count + c] as i32;
                }
            }
        }

        Ok(channels)
    }
}

fn read_subframe_header(bits: &mut BitReader) -> AlacResult<SubframeHeader> {
    let prediction_type = bits.read(4)?;
    if prediction_type != 0 {
        return Err(AlacError::InvalidPredictionType(prediction_type));
    }
    let shift_needed = bits.read(4)?;
    let rice_modifier = bits.read(3)?;
    let order = bits.read(5)?;

    let coefficients = (0..order)
        .map(|_| bits.read_signed(16))
        .collect::<AlacResult<Vec<_>>>()?;

    Ok(SubframeHeader {
        prediction_type,
        shift_needed,
        rice_modifier,
        coefficients,
    })
}

/// Put frames back into input channel order
///
/// Framesets laid out the way the encoder groups channels are mapped back
/// through that grouping; any other layout is taken in bitstream order.
fn restore_channel_order(decoded: Vec<Vec<i32>>, frame_widths: &[usize]) -> Vec<Vec<i32>> {
    let groups = channel_groups(decoded.len());
    let standard = groups.len() == frame_widths.len()
        && groups.iter().zip(frame_widths).all(|(g, &w)| g.len() == w);
    if !standard {
        return decoded;
    }

    let order: Vec<usize> = groups.into_iter().flatten().collect();
    let mut restored = vec![Vec::new(); decoded.len()];
    for (channel, samples) in order.into_iter().zip(decoded) {
        restored[channel] = samples;
    }
    restored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_three_channels() {
        let decoded = vec![vec![2], vec![0], vec![1]];
        let restored = restore_channel_order(decoded, &[1, 2]);
        assert_eq!(restored, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_nonstandard_layout_kept() {
        let decoded = vec![vec![0], vec![1], vec![2]];
        let restored = restore_channel_order(decoded.clone(), &[1, 1, 1]);
        assert_eq!(restored, decoded);
    }

    #[test]
    fn test_seek_not_implemented() {
        let mut decoder = Decoder::new(StreamParams::default()).unwrap();
        assert!(matches!(decoder.seek(0), Err(AlacError::NotImplemented(_))));
    }
}
