use anyhow::{bail, Context, Result};
use std::io::{Cursor, Write};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Interleaved integer PCM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmAudio {
    /// signed samples right-aligned to `bits_per_sample`
    pub samples: Vec<i32>,
    pub sample_rate: u32,
    pub channels: u32,
    pub bits_per_sample: u32,
    /// container or codec the samples came from, when known
    pub source_format: Option<String>,
}

impl PcmAudio {
    pub fn pcm_frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        self.pcm_frames() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Read an audio file into integer PCM.
///
/// `bits` picks the output depth (16 or 24). Without it the depth follows the
/// source: 16 for anything up to 16 bits (and lossy codecs), 24 above that.
pub fn read_audio_file(path: &Path, bits: Option<u32>) -> Result<PcmAudio> {
    let file = std::fs::File::open(path).context("Failed to open audio file")?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    read_from_source(mss, path.extension().and_then(|e| e.to_str()), bits)
}

/// Read audio from bytes
pub fn read_audio_from_bytes(bytes: &[u8], bits: Option<u32>) -> Result<PcmAudio> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());
    read_from_source(mss, None, bits)
}

fn read_from_source(
    mss: MediaSourceStream,
    extension: Option<&str>,
    bits: Option<u32>,
) -> Result<PcmAudio> {
    let mut hint = Hint::new();
    if let Some(ext) = extension {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .context("Unsupported audio format")?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Unknown sample rate")?;
    let channels = track
        .codec_params
        .channels
        .context("Unknown channel count")?
        .count();
    let bits_per_sample = match bits {
        Some(b) => b,
        None => match track.codec_params.bits_per_sample {
            Some(b) if b > 16 => 24,
            _ => 16,
        },
    };
    if bits_per_sample != 16 && bits_per_sample != 24 {
        bail!("Unsupported bit depth {} (expected 16 or 24)", bits_per_sample);
    }

    let source_format = extension
        .map(|ext| ext.to_uppercase())
        .or_else(|| codec_name(track.codec_params.codec).map(str::to_string));

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder")?;

    let shift = 32 - bits_per_sample;
    let mut samples = Vec::new();
    let mut buffer: Option<SampleBuffer<i32>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(e) => return Err(e).context("Error reading packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                tracing::warn!("skipping undecodable packet: {}", e);
                continue;
            }
            Err(e) => return Err(e).context("Error decoding packet"),
        };

        // packets can grow past the first one's capacity
        let needs_new = buffer
            .as_ref()
            .map_or(true, |b| b.capacity() < decoded.capacity() * channels);
        if needs_new {
            buffer = Some(SampleBuffer::new(decoded.capacity() as u64, *decoded.spec()));
        }
        if let Some(buf) = buffer.as_mut() {
            // full-scale i32 down to the target depth
            buf.copy_interleaved_ref(decoded);
            samples.extend(buf.samples().iter().map(|&s| s >> shift));
        }
    }

    tracing::debug!(
        sample_rate,
        channels,
        bits_per_sample,
        samples = samples.len(),
        "read source audio"
    );

    Ok(PcmAudio {
        samples,
        sample_rate,
        channels: channels as u32,
        bits_per_sample,
        source_format,
    })
}

fn codec_name(codec: symphonia::core::codecs::CodecType) -> Option<&'static str> {
    use symphonia::core::codecs::*;
    Some(match codec {
        CODEC_TYPE_FLAC => "FLAC",
        CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE | CODEC_TYPE_PCM_S24LE
        | CODEC_TYPE_PCM_S32LE => "WAV",
        CODEC_TYPE_MP3 => "MP3",
        CODEC_TYPE_VORBIS => "OGG",
        CODEC_TYPE_AAC => "AAC",
        _ => return None,
    })
}

/// Write PCM to a WAV file
pub fn write_wav(path: &Path, audio: &PcmAudio) -> Result<()> {
    let bytes = write_wav_to_bytes(audio)?;
    std::fs::write(path, bytes).context("Failed to write WAV file")
}

/// Integer PCM WAV in memory, 16 or 24 bits per sample
pub fn write_wav_to_bytes(audio: &PcmAudio) -> Result<Vec<u8>> {
    let bytes_per_sample = match audio.bits_per_sample {
        16 => 2usize,
        24 => 3,
        other => bail!("Cannot write {}-bit WAV", other),
    };

    let mut buffer = Vec::with_capacity(44 + audio.samples.len() * bytes_per_sample);
    let data_size = audio.samples.len() * bytes_per_sample;
    let file_size = 36 + data_size;

    // RIFF header
    buffer.write_all(b"RIFF")?;
    buffer.write_all(&(file_size as u32).to_le_bytes())?;
    buffer.write_all(b"WAVE")?;

    // fmt chunk
    buffer.write_all(b"fmt ")?;
    buffer.write_all(&16u32.to_le_bytes())?;
    buffer.write_all(&1u16.to_le_bytes())?; // PCM
    buffer.write_all(&(audio.channels as u16).to_le_bytes())?;
    buffer.write_all(&audio.sample_rate.to_le_bytes())?;
    let block_align = audio.channels * bytes_per_sample as u32;
    buffer.write_all(&(audio.sample_rate * block_align).to_le_bytes())?;
    buffer.write_all(&(block_align as u16).to_le_bytes())?;
    buffer.write_all(&(audio.bits_per_sample as u16).to_le_bytes())?;

    // data chunk
    buffer.write_all(b"data")?;
    buffer.write_all(&(data_size as u32).to_le_bytes())?;
    for &sample in &audio.samples {
        buffer.write_all(&sample.to_le_bytes()[..bytes_per_sample])?;
    }

    Ok(buffer)
}
