//! Internal streaming tests

use super::*;
use crate::core::StreamParams;

fn sine(pcm_frames: usize, channels: usize) -> Vec<i32> {
    (0..pcm_frames)
        .flat_map(|i| {
            (0..channels).map(move |c| ((i as f64 * 0.01 + c as f64).sin() * 12000.0) as i32)
        })
        .collect()
}

#[test]
fn test_streaming_encode_decode_roundtrip() {
    let params = StreamParams::new(2, 16, 44100).with_block_size(1024);
    let samples = sine(5000, 2);

    let mut encoder = StreamingEncoder::new(params).unwrap();
    encoder.push_samples(&samples).unwrap();
    let file = encoder.finalize().unwrap();

    let mut decoder = StreamingDecoder::new();
    decoder.feed(&file).unwrap();
    assert_eq!(decoder.state(), DecoderState::Ready);

    let decoded = decoder.decode_available().unwrap();
    assert_eq!(decoded, samples);
    assert_eq!(decoder.state(), DecoderState::Finished);
}

#[test]
fn test_streaming_incremental_feed() {
    let params = StreamParams::new(1, 16, 22050).with_block_size(512);
    let samples = sine(3000, 1);

    let mut encoder = StreamingEncoder::new(params).unwrap();
    encoder.push_samples(&samples).unwrap();
    let file = encoder.finalize().unwrap();

    let mut decoder = StreamingDecoder::new();
    let mut decoded = Vec::new();

    // Feed in small chunks
    for chunk in file.chunks(100) {
        decoder.feed(chunk).unwrap();
        decoded.extend(decoder.decode_available().unwrap());
    }
    decoded.extend(decoder.decode_available().unwrap());

    assert_eq!(decoded, samples);
    assert_eq!(decoder.info().unwrap().decoded_pcm_frames, 3000);
}

#[test]
fn test_streaming_encoder_frame_output() {
    let params = StreamParams::new(1, 16, 8000).with_block_size(4000);

    // 2.5 blocks of audio
    let samples = sine(10000, 1);

    let mut encoder = StreamingEncoder::new(params).unwrap();
    encoder.push_samples(&samples).unwrap();

    // Should have 2 complete framesets
    assert_eq!(encoder.pending_frames(), 2);
    assert_eq!(encoder.pending_samples(), 2000);

    let frame1 = encoder.next_frame().unwrap();
    let frame2 = encoder.next_frame().unwrap();
    assert!(encoder.next_frame().is_none());
    assert_eq!((frame1.index, frame1.timestamp_ms), (0, 0));
    assert_eq!((frame2.index, frame2.timestamp_ms), (1, 500));

    // the remaining half block comes out of flush
    let last = encoder.flush().unwrap().unwrap();
    assert_eq!(last.pcm_frames, 2000);
    assert_eq!(last.timestamp_ms, 1000);
    assert!(encoder.flush().unwrap().is_none());
}

#[test]
fn test_bare_frameset_stream() {
    let params = StreamParams::new(2, 16, 44100).with_block_size(256);
    let samples = sine(256, 2);

    let mut encoder = StreamingEncoder::new(params).unwrap();
    encoder.push_samples(&samples).unwrap();
    let frame = encoder.next_frame().unwrap();

    let mut decoder = StreamingDecoder::with_params(params).unwrap();
    let (head, tail) = frame.data.split_at(frame.data.len() / 2);
    decoder.feed(head).unwrap();
    assert!(decoder.next_frame().unwrap().is_none());
    decoder.feed(tail).unwrap();
    assert_eq!(decoder.next_frame().unwrap().unwrap(), samples);
}
