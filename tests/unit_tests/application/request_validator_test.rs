use bytes::Bytes;

use dubgate::application::services::{RequestLimits, ValidationError};
use dubgate::domain::{GenerationParams, MediaPayload};

fn params(duration: Option<f32>, guidance: Option<f32>) -> GenerationParams {
    GenerationParams {
        duration_secs: duration,
        seed: None,
        guidance_scale: guidance,
    }
}

#[test]
fn given_blank_prompt_when_validating_then_rejected() {
    let limits = RequestLimits::default();

    assert_eq!(
        limits.validate("   ", None, &GenerationParams::default()),
        Err(ValidationError::EmptyPrompt)
    );
}

#[test]
fn given_prompt_over_limit_when_validating_then_rejected_with_lengths() {
    let limits = RequestLimits {
        max_prompt_chars: 5,
        ..RequestLimits::default()
    };

    assert_eq!(
        limits.validate("ééééééé", None, &GenerationParams::default()),
        Err(ValidationError::PromptTooLong { len: 7, max: 5 })
    );
}

#[test]
fn given_negative_zero_nan_or_too_long_duration_when_validating_then_rejected() {
    let limits = RequestLimits::default();

    for value in [-1.0, 0.0, f32::NAN, 61.0] {
        assert!(matches!(
            limits.validate("rain", None, &params(Some(value), None)),
            Err(ValidationError::DurationOutOfRange { .. })
        ));
    }
}

#[test]
fn given_boundary_values_when_validating_then_accepted() {
    let limits = RequestLimits::default();

    assert!(limits.validate("rain", None, &params(Some(60.0), Some(0.0))).is_ok());
    assert!(limits.validate("rain", None, &params(Some(0.1), Some(20.0))).is_ok());
}

#[test]
fn given_guidance_out_of_range_when_validating_then_rejected() {
    let limits = RequestLimits::default();

    assert!(matches!(
        limits.validate("rain", None, &params(None, Some(-0.5))),
        Err(ValidationError::GuidanceOutOfRange { .. })
    ));
}

#[test]
fn given_oversized_empty_or_non_media_payload_when_validating_then_rejected() {
    let limits = RequestLimits {
        max_media_bytes: 4,
        ..RequestLimits::default()
    };
    let big = MediaPayload::new(Bytes::from_static(b"12345"), Some("audio/wav"), None);
    let empty = MediaPayload::new(Bytes::new(), Some("audio/wav"), None);
    let text = MediaPayload::new(Bytes::from_static(b"1"), Some("text/plain"), None);

    assert!(matches!(
        limits.validate("rain", Some(&big), &GenerationParams::default()),
        Err(ValidationError::MediaTooLarge { size: 5, max: 4 })
    ));
    assert_eq!(
        limits.validate("rain", Some(&empty), &GenerationParams::default()),
        Err(ValidationError::EmptyMedia)
    );
    assert!(matches!(
        limits.validate("rain", Some(&text), &GenerationParams::default()),
        Err(ValidationError::UnsupportedMedia(_))
    ));
}
