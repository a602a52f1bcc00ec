#[cfg(test)]
mod tests {
    use realac::audio::{read_audio_from_bytes, write_wav_to_bytes};
    use realac::{
        decode_file, decode_to_wav, encode_file, encode_samples, get_alac_info, validate_alac,
        EncodeOptions, PcmAudio,
    };

    fn sine_audio(bits: u32, channels: u32) -> PcmAudio {
        let sample_rate = 44100;
        let amplitude = ((1i64 << (bits - 1)) - 1) as f64 * 0.5;
        let samples = (0..sample_rate as usize)
            .flat_map(|i| {
                let t = i as f64 / sample_rate as f64;
                (0..channels).map(move |c| {
                    ((t * (440.0 + c as f64 * 110.0) * 2.0 * std::f64::consts::PI).sin()
                        * amplitude) as i32
                })
            })
            .collect();
        PcmAudio {
            samples,
            sample_rate,
            channels,
            bits_per_sample: bits,
            source_format: None,
        }
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let audio = sine_audio(16, 2);
        let alac = encode_samples(&audio, &EncodeOptions::default()).unwrap();
        assert!(alac.len() < audio.samples.len() * 2);

        let decoded = decode_file(&alac).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, 2);
        assert_eq!(decoded.bits_per_sample, 16);
        assert_eq!(decoded.samples, audio.samples);
    }

    #[test]
    fn test_wav_through_symphonia_is_lossless() {
        for bits in [16, 24] {
            let audio = sine_audio(bits, 2);
            let wav = write_wav_to_bytes(&audio).unwrap();

            let read_back = read_audio_from_bytes(&wav, None).unwrap();
            assert_eq!(read_back.bits_per_sample, bits);
            assert_eq!(read_back.samples, audio.samples);

            let alac = encode_file(&wav, &EncodeOptions::default()).unwrap();
            assert_eq!(decode_to_wav(&alac).unwrap(), wav);
        }
    }

    #[test]
    fn test_custom_options_recorded_in_cookie() {
        let audio = sine_audio(24, 1);
        let options = EncodeOptions {
            bits: Some(24),
            block_size: 1152,
            initial_history: 20,
            history_multiplier: 30,
            maximum_k: 12,
        };
        let alac = encode_samples(&audio, &options).unwrap();

        let info = get_alac_info(&alac).unwrap();
        assert_eq!(info.block_size, 1152);
        assert_eq!(info.initial_history, 20);
        assert_eq!(info.history_multiplier, 30);
        assert_eq!(info.maximum_k, 12);
        assert_eq!(info.total_pcm_frames, 44100);
        assert_eq!(info.framesets, 39); // 38 full blocks and a short one
        assert_eq!(decode_file(&alac).unwrap().samples, audio.samples);
    }

    #[test]
    fn test_info_serializes() {
        let alac = encode_samples(&sine_audio(16, 1), &EncodeOptions::default()).unwrap();
        let info = get_alac_info(&alac).unwrap();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["sample_rate"], 44100);
        assert_eq!(json["bits_per_sample"], 16);
    }

    #[test]
    fn test_mismatched_bits_rejected() {
        let audio = sine_audio(16, 1);
        assert!(encode_samples(&audio, &EncodeOptions::default().with_bits(24)).is_err());
        assert!(read_audio_from_bytes(&write_wav_to_bytes(&audio).unwrap(), Some(20)).is_err());
    }

    #[test]
    fn test_validate() {
        let alac = encode_samples(&sine_audio(16, 2), &EncodeOptions::default().with_block_size(2048))
            .unwrap();
        assert!(validate_alac(&alac));
        assert!(!validate_alac(&alac[..alac.len() - 20]));
        assert!(!validate_alac(b"not an alac stream"));
    }
}
