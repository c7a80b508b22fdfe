//! Identification stage: format family plus GPS, without a full decode.

use fotomap_core::{GpsResult, SelectedFile};

use crate::exif;
use crate::format::SourceFormat;

/// What identification learned about one selected file.
#[derive(Debug, Clone)]
pub struct Identification {
    pub format: SourceFormat,
    pub gps: GpsResult,
}

impl Identification {
    /// Whether the conversion stage has work to do for this file.
    pub fn needs_transcode(&self) -> bool {
        !self.format.is_target()
    }
}

/// Identify a selected file. The EXIF parse is CPU-bound and runs on the
/// blocking pool; extraction failures degrade to "no GPS" and never abort
/// the pipeline for this file.
pub async fn identify(file: &SelectedFile) -> Identification {
    let format = SourceFormat::classify(&file.content_type, &file.name);

    let data = file.data.clone();
    let gps = match tokio::task::spawn_blocking(move || exif::extract_gps(&data)).await {
        Ok(gps) => gps,
        Err(err) => {
            tracing::warn!(error = %err, "GPS extraction task failed");
            GpsResult::none()
        }
    };

    tracing::debug!(
        name = %file.name,
        format = ?format,
        has_gps = gps.has_gps,
        "identified file"
    );

    Identification { format, gps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn png_file(name: &str, content_type: &str) -> SelectedFile {
        let img = image::RgbaImage::from_pixel(16, 16, image::Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .unwrap();
        SelectedFile::new(name, content_type, 1_700_000_000_000, Bytes::from(buffer))
    }

    #[tokio::test]
    async fn test_identify_png() {
        let file = png_file("photo.png", "image/png");
        let ident = identify(&file).await;
        assert_eq!(ident.format, SourceFormat::Png);
        assert!(ident.needs_transcode());
        assert!(!ident.gps.has_gps);
    }

    #[tokio::test]
    async fn test_identify_heic_by_name_without_gps() {
        // declared-MIME-less HEIC with an unreadable body: classified by
        // extension, GPS degrades to none without an error
        let file = SelectedFile::new(
            "IMG_0001.heic",
            "",
            1_700_000_000_000,
            Bytes::from_static(b"not a real heic container"),
        );
        let ident = identify(&file).await;
        assert_eq!(ident.format, SourceFormat::Heic);
        assert!(!ident.gps.has_gps);
        assert_eq!(ident.gps.latitude, None);
        assert_eq!(ident.gps.longitude, None);
    }

    #[tokio::test]
    async fn test_identify_webp_needs_no_transcode() {
        let file = SelectedFile::new(
            "photo.webp",
            "image/webp",
            0,
            Bytes::from_static(b"RIFF....WEBP"),
        );
        let ident = identify(&file).await;
        assert!(!ident.needs_transcode());
    }
}
