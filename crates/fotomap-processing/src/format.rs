//! Source format classification.

use std::path::Path;

/// Format family of a selected file, as declared by the picker.
///
/// Classification never reads file content; it goes by the declared MIME
/// type first and the filename extension second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Heic,
    Other,
}

impl SourceFormat {
    /// Classify from declared MIME type and filename. The MIME type wins
    /// when present and non-empty; the extension is the fallback, including
    /// when the MIME type is present but unrecognized.
    pub fn classify(content_type: &str, filename: &str) -> Self {
        let mime = content_type.trim().to_lowercase();
        if !mime.is_empty() {
            if let Some(format) = Self::from_mime(&mime) {
                return format;
            }
        }
        Self::from_filename(filename)
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/jpeg" | "image/jpg" => Some(SourceFormat::Jpeg),
            "image/png" => Some(SourceFormat::Png),
            "image/gif" => Some(SourceFormat::Gif),
            "image/webp" => Some(SourceFormat::WebP),
            "image/heic" | "image/heif" => Some(SourceFormat::Heic),
            _ => None,
        }
    }

    fn from_filename(filename: &str) -> Self {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "jpg" | "jpeg" => SourceFormat::Jpeg,
            "png" => SourceFormat::Png,
            "gif" => SourceFormat::Gif,
            "webp" => SourceFormat::WebP,
            "heic" | "heif" => SourceFormat::Heic,
            _ => SourceFormat::Other,
        }
    }

    pub fn is_heic(self) -> bool {
        matches!(self, SourceFormat::Heic)
    }

    /// WebP is the web display target; such input skips transcoding.
    pub fn is_target(self) -> bool {
        matches!(self, SourceFormat::WebP)
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "image/jpeg",
            SourceFormat::Png => "image/png",
            SourceFormat::Gif => "image/gif",
            SourceFormat::WebP => "image/webp",
            SourceFormat::Heic => "image/heic",
            SourceFormat::Other => "application/octet-stream",
        }
    }
}
