//! Edge case and stability tests
use libalac_audio::{decode_file_bytes, encode_file_bytes, Reader, StreamParams};

// Helper to encode and decode
fn roundtrip(samples: &[i32], params: StreamParams) -> Vec<i32> {
    let data = encode_file_bytes(samples, params).expect("Encoding failed");
    decode_file_bytes(&data).expect("Decoding failed")
}

fn stereo16() -> StreamParams {
    StreamParams::new(2, 16, 44100)
}

// ============================================================================
// Edge Case: Extreme Sample Values
// ============================================================================

#[test]
fn test_max_sample_values() {
    let samples = vec![32767; 8192];
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_min_sample_values() {
    let samples = vec![-32768; 8192];
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_alternating_extremes_stereo() {
    // left and right opposite and flipping every frame
    let samples: Vec<i32> = (0..4096)
        .flat_map(|i| {
            if i % 2 == 0 {
                [32767, -32768]
            } else {
                [-32768, 32767]
            }
        })
        .collect();
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_24bit_extremes() {
    let params = StreamParams::new(2, 24, 96000);
    let samples: Vec<i32> = (0..5000)
        .flat_map(|i| {
            if i % 3 == 0 {
                [8_388_607, -8_388_608]
            } else {
                [-8_388_608, i * 1000]
            }
        })
        .collect();
    assert_eq!(roundtrip(&samples, params), samples);
}

#[test]
fn test_dc_offset() {
    let samples = vec![1234; 10000];
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_white_noise() {
    // xorshift so the test is deterministic
    let mut state = 0x2545_F491u32;
    let samples: Vec<i32> = (0..20000)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 16) as i16 as i32
        })
        .collect();
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

// ============================================================================
// Edge Case: Boundary Conditions
// ============================================================================

#[test]
fn test_empty_input() {
    let data = encode_file_bytes(&[], stereo16()).unwrap();
    assert!(decode_file_bytes(&data).unwrap().is_empty());
}

#[test]
fn test_single_sample() {
    let params = StreamParams::new(1, 16, 44100);
    assert_eq!(roundtrip(&[42], params), vec![42]);
}

#[test]
fn test_just_under_compression_threshold() {
    let params = StreamParams::new(1, 16, 44100);
    for len in [9, 10, 11] {
        let samples: Vec<i32> = (0..len).map(|i| i * 100).collect();
        assert_eq!(roundtrip(&samples, params), samples);
    }
}

#[test]
fn test_exact_block_boundary() {
    let samples: Vec<i32> = (0..4096 * 2 * 2).map(|i| (i % 300) - 150).collect();
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_block_boundary_plus_one() {
    let samples: Vec<i32> = (0..(4096 + 1) * 2).map(|i| (i % 300) - 150).collect();
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_block_boundary_minus_one() {
    let samples: Vec<i32> = (0..(4096 - 1) * 2).map(|i| (i % 300) - 150).collect();
    assert_eq!(roundtrip(&samples, stereo16()), samples);
}

#[test]
fn test_tiny_block_size() {
    let params = stereo16().with_block_size(1);
    let samples: Vec<i32> = (0..200).map(|i| i * 3 - 300).collect();
    assert_eq!(roundtrip(&samples, params), samples);
}

#[test]
fn test_large_block_size() {
    let params = StreamParams::new(1, 16, 44100).with_block_size(65536);
    let samples: Vec<i32> = (0..100_000)
        .map(|i| ((i as f64 * 0.001).sin() * 20000.0) as i32)
        .collect();
    assert_eq!(roundtrip(&samples, params), samples);
}

// ============================================================================
// Edge Case: Rice Parameters
// ============================================================================

#[test]
fn test_maximum_k_extremes() {
    let samples: Vec<i32> = (0..10000)
        .map(|i| ((i as f64 * 0.05).sin() * 30000.0) as i32)
        .collect();
    for maximum_k in [1, 24] {
        let params = stereo16().with_maximum_k(maximum_k);
        assert_eq!(roundtrip(&samples, params), samples);
    }
}

#[test]
fn test_unusual_history_params() {
    let samples: Vec<i32> = (0..10000)
        .map(|i| ((i as f64 * 0.05).sin() * 30000.0) as i32)
        .collect();
    for (initial, multiplier) in [(0, 1), (255, 255), (1, 40)] {
        let params = stereo16().with_history(initial, multiplier);
        assert_eq!(roundtrip(&samples, params), samples);
    }
}

// ============================================================================
// Edge Case: Damaged Files
// ============================================================================

#[test]
fn test_truncated_file() {
    let samples: Vec<i32> = (0..20000).map(|i| (i % 1000) - 500).collect();
    let data = encode_file_bytes(&samples, stereo16()).unwrap();
    assert!(decode_file_bytes(&data[..data.len() - 10]).is_err());
}

#[test]
fn test_garbage_payload() {
    let samples: Vec<i32> = (0..20000).map(|i| (i % 1000) - 500).collect();
    let mut data = encode_file_bytes(&samples, stereo16()).unwrap();
    let file_len = data.len();
    let mdat_start = {
        let file = Reader::new().read(&data).unwrap();
        file_len - file.payload.len()
    };
    // first frame header claims three channels
    data[mdat_start] = 0b0100_0000;
    assert!(decode_file_bytes(&data).is_err());
}

#[test]
fn test_random_bytes_never_panic() {
    let mut state = 12345u32;
    for _ in 0..50 {
        let data: Vec<u8> = (0..300)
            .map(|_| {
                state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
                (state >> 16) as u8
            })
            .collect();
        let _ = decode_file_bytes(&data);
    }
}
