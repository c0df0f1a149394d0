use dubgate::infrastructure::audio::{AudioDecodeError, decode_audio};

use crate::helpers::{TEST_SAMPLE_RATE, wav_bytes};

#[test]
fn given_wav_bytes_when_decoding_then_returns_mono_samples_at_source_rate() {
    let wav = wav_bytes(4_000);

    let decoded = decode_audio(&wav, Some("wav")).unwrap();

    assert_eq!(decoded.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(decoded.samples.len(), 4_000);
    assert!((decoded.duration_secs() - 0.5).abs() < 1e-3);
}

#[test]
fn given_wav_without_extension_hint_when_decoding_then_probe_still_succeeds() {
    let wav = wav_bytes(800);
    let decoded = decode_audio(&wav, None).unwrap();
    assert_eq!(decoded.samples.len(), 800);
}

#[test]
fn given_garbage_bytes_when_decoding_then_probe_fails() {
    let result = decode_audio(b"definitely not audio", None);
    assert!(matches!(result, Err(AudioDecodeError::Probe(_))));
}
