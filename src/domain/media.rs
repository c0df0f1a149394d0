use bytes::Bytes;

pub const FALLBACK_MIME: &str = "video/mp4";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            m if m.starts_with("audio/") => Some(Self::Audio),
            m if m.starts_with("video/") => Some(Self::Video),
            _ => None,
        }
    }
}

/// Guesses a mime type from a filename extension.
pub fn mime_from_filename(filename: &str) -> Option<&'static str> {
    let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" | "oga" => "audio/ogg",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mkv" => "video/x-matroska",
        _ => return None,
    };
    Some(mime)
}

/// Reference audio or video attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaPayload {
    pub data: Bytes,
    pub mime_type: String,
    pub filename: Option<String>,
}

impl MediaPayload {
    /// Resolves the mime type the way uploads are treated: a declared type
    /// wins unless it is missing or generic, then the filename, then mp4.
    pub fn new(data: Bytes, declared_mime: Option<&str>, filename: Option<String>) -> Self {
        let mime_type = match declared_mime {
            Some(m) if !m.is_empty() && m != "application/octet-stream" => m.to_string(),
            _ => filename
                .as_deref()
                .and_then(mime_from_filename)
                .unwrap_or(FALLBACK_MIME)
                .to_string(),
        };
        Self {
            data,
            mime_type,
            filename,
        }
    }

    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_mime(&self.mime_type)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
