use crate::core::{AlacResult, FrameSize, MagicCookie};
use crate::lossless::EncodedStream;

/// full-box header: size, name, version + flags
const FULL_BOX_HEADER: usize = 12;

/// writes the minimal atom layout around an encoded stream
///
/// `alac` (magic cookie), `stts` (pcm frames per frameset), `stsz` (bytes per
/// frameset), then the `mdat` produced by the encoder.
pub struct Writer {
    buffer: Vec<u8>,
}

impl Writer {
    /// new writer
    pub fn new() -> Self {
        Writer { buffer: Vec::new() }
    }

    /// write a complete file
    pub fn write(mut self, cookie: &MagicCookie, stream: &EncodedStream) -> AlacResult<Vec<u8>> {
        let cookie =
            cookie.with_frame_stats(stream.max_frame_bytes(), average_bit_rate(cookie, stream));

        self.buffer.extend_from_slice(&cookie.to_atom_bytes());
        self.write_stts(&stream.frame_sizes);
        self.write_stsz(&stream.frame_sizes);
        self.buffer.extend_from_slice(&stream.mdat);

        Ok(self.buffer)
    }

    /// time-to-sample table, run-length coded
    fn write_stts(&mut self, frame_sizes: &[FrameSize]) {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for frame in frame_sizes {
            match runs.last_mut() {
                Some((count, duration)) if *duration == frame.pcm_frames => *count += 1,
                _ => runs.push((1, frame.pcm_frames)),
            }
        }

        let size = FULL_BOX_HEADER + 4 + runs.len() * 8;
        self.write_full_box_header(size, b"stts");
        self.buffer.extend_from_slice(&(runs.len() as u32).to_be_bytes());
        for (count, duration) in runs {
            self.buffer.extend_from_slice(&count.to_be_bytes());
            self.buffer.extend_from_slice(&duration.to_be_bytes());
        }
    }

    /// sample size table, one entry per frameset
    fn write_stsz(&mut self, frame_sizes: &[FrameSize]) {
        let size = FULL_BOX_HEADER + 8 + frame_sizes.len() * 4;
        self.write_full_box_header(size, b"stsz");
        self.buffer.extend_from_slice(&0u32.to_be_bytes()); // no common size
        self.buffer.extend_from_slice(&(frame_sizes.len() as u32).to_be_bytes());
        for frame in frame_sizes {
            self.buffer.extend_from_slice(&frame.byte_size.to_be_bytes());
        }
    }

    fn write_full_box_header(&mut self, size: usize, name: &[u8; 4]) {
        self.buffer.extend_from_slice(&(size as u32).to_be_bytes());
        self.buffer.extend_from_slice(name);
        self.buffer.extend_from_slice(&0u32.to_be_bytes());
    }
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

/// bits per second of payload over the stream's duration
fn average_bit_rate(cookie: &MagicCookie, stream: &EncodedStream) -> u32 {
    if stream.total_pcm_frames == 0 || cookie.sample_rate == 0 {
        return 0;
    }
    let bits = stream.payload().len() as u64 * 8;
    let rate = bits * cookie.sample_rate as u64 / stream.total_pcm_frames;
    rate.min(u32::MAX as u64) as u32
}
