//! PCM source/sink plumbing around the codec
//!
//! Samples are always signed integers at the stream's bit depth, interleaved
//! by channel.

use super::error::AlacResult;

/// Something that hands out interleaved PCM a block at a time
pub trait PcmSource {
    fn channels(&self) -> u32;

    /// Append up to `pcm_frames` frames (all channels) to `out`, returning how
    /// many frames were read. 0 means end of stream; fewer than asked is only
    /// expected right before it.
    fn read(&mut self, pcm_frames: usize, out: &mut Vec<i32>) -> AlacResult<usize>;
}

/// Something that accepts decoded interleaved PCM
pub trait PcmSink {
    fn write(&mut self, samples: &[i32]) -> AlacResult<()>;
}

impl PcmSink for Vec<i32> {
    fn write(&mut self, samples: &[i32]) -> AlacResult<()> {
        self.extend_from_slice(samples);
        Ok(())
    }
}

/// In-memory source over an interleaved slice
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    samples: &'a [i32],
    channels: u32,
    position: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(samples: &'a [i32], channels: u32) -> Self {
        SliceSource {
            samples,
            channels,
            position: 0,
        }
    }

    /// frames not yet handed out
    pub fn remaining_frames(&self) -> usize {
        (self.samples.len() - self.position) / self.channels.max(1) as usize
    }
}

impl PcmSource for SliceSource<'_> {
    fn channels(&self) -> u32 {
        self.channels
    }

    fn read(&mut self, pcm_frames: usize, out: &mut Vec<i32>) -> AlacResult<usize> {
        let frames = pcm_frames.min(self.remaining_frames());
        let end = self.position + frames * self.channels as usize;
        out.extend_from_slice(&self.samples[self.position..end]);
        self.position = end;
        Ok(frames)
    }
}

/// Split interleaved samples into one vector per channel
pub fn deinterleave(samples: &[i32], channels: usize) -> Vec<Vec<i32>> {
    (0..channels)
        .map(|ch| samples.iter().skip(ch).step_by(channels).copied().collect())
        .collect()
}

/// Merge per-channel vectors of equal length back into interleaved order
pub fn interleave(channels: &[Vec<i32>]) -> Vec<i32> {
    let frames = channels.first().map(|c| c.len()).unwrap_or(0);
    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        for channel in channels {
            out.push(channel[i]);
        }
    }
    out
}
