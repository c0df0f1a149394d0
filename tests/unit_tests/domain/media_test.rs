use bytes::Bytes;

use dubgate::domain::{FALLBACK_MIME, MediaKind, MediaPayload, mime_from_filename};

#[test]
fn given_generic_mime_when_creating_payload_then_falls_back_to_filename_guess() {
    let media = MediaPayload::new(
        Bytes::from_static(b"x"),
        Some("application/octet-stream"),
        Some("clip.WAV".to_string()),
    );

    assert_eq!(media.mime_type, "audio/wav");
    assert_eq!(media.kind(), Some(MediaKind::Audio));
}

#[test]
fn given_unknown_extension_when_creating_payload_then_falls_back_to_mp4() {
    let media = MediaPayload::new(Bytes::from_static(b"x"), None, Some("clip".to_string()));

    assert_eq!(media.mime_type, FALLBACK_MIME);
    assert_eq!(media.kind(), Some(MediaKind::Video));
}

#[test]
fn given_declared_mime_when_creating_payload_then_it_is_kept() {
    let media = MediaPayload::new(Bytes::from_static(b"x"), Some("audio/ogg"), None);

    assert_eq!(media.mime_type, "audio/ogg");
}

#[test]
fn given_filenames_when_guessing_mime_then_uses_extension_table() {
    assert_eq!(mime_from_filename("talk.mov"), Some("video/quicktime"));
    assert_eq!(mime_from_filename("song.mp3"), Some("audio/mpeg"));
    assert_eq!(mime_from_filename("notes.txt"), None);
    assert_eq!(mime_from_filename("noextension"), None);
}
