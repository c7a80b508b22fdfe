//! WebP conversion: decode HEIC or standard raster input, re-encode to WebP.

use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use image::{DynamicImage, GenericImageView};

use crate::format::SourceFormat;

/// Convert `data` to WebP at `quality` (0-100, lossy).
///
/// WebP input skips transcoding: the original bytes are the converted
/// output. HEIC/HEIF decodes to raster first; any other raster re-encodes
/// directly.
pub fn convert_to_webp(data: &Bytes, format: SourceFormat, quality: f32) -> Result<Bytes> {
    if format.is_target() {
        tracing::debug!("input already WebP, skipping transcode");
        return Ok(data.clone());
    }

    let img = decode(data, format)?;
    encode_webp(&img, quality)
}

fn decode(data: &[u8], format: SourceFormat) -> Result<DynamicImage> {
    if format.is_heic() {
        return decode_heif(data);
    }

    // The declared format is advisory; sniff the real one from content.
    let reader = image::ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("unrecognized image container")?;
    reader.decode().context("image decode failed")
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Bytes> {
    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();

    let encoder = webp::Encoder::from_rgba(&rgba, width, height);
    let webp_data = encoder.encode(quality);

    Ok(Bytes::copy_from_slice(&webp_data))
}

#[cfg(feature = "heif")]
fn decode_heif(data: &[u8]) -> Result<DynamicImage> {
    use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

    let lib_heif = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(data).context("HEIF container parse failed")?;
    let handle = ctx
        .primary_image_handle()
        .context("HEIF container has no primary image")?;
    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgba), None)
        .context("HEIF decode failed")?;

    let width = decoded.width();
    let height = decoded.height();
    let planes = decoded.planes();
    let interleaved = planes
        .interleaved
        .ok_or_else(|| anyhow!("HEIF decode produced no interleaved plane"))?;

    // Rows are stride-padded; copy them out tightly.
    let row_bytes = width as usize * 4;
    let mut rgba = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * interleaved.stride;
        rgba.extend_from_slice(&interleaved.data[start..start + row_bytes]);
    }

    let buffer = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow!("HEIF decode produced malformed RGBA data"))?;
    Ok(DynamicImage::ImageRgba8(buffer))
}

#[cfg(not(feature = "heif"))]
fn decode_heif(_data: &[u8]) -> Result<DynamicImage> {
    Err(anyhow!(
        "HEIC/HEIF support is not enabled (build with the `heif` feature)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn encode(img: &RgbaImage, format: ImageFormat) -> Bytes {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        match format {
            // JPEG has no alpha channel; the image encoder rejects Rgba8, so
            // drop alpha before encoding this fixture.
            ImageFormat::Jpeg => {
                let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
                rgb.write_to(&mut cursor, format).unwrap();
            }
            _ => img.write_to(&mut cursor, format).unwrap(),
        }
        Bytes::from(buffer)
    }

    fn is_webp(data: &[u8]) -> bool {
        data.len() > 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
    }

    #[test]
    fn test_png_converts_to_webp() {
        let img = RgbaImage::from_pixel(64, 64, Rgba([200, 40, 40, 255]));
        let png = encode(&img, ImageFormat::Png);

        let out = convert_to_webp(&png, SourceFormat::Png, 80.0).unwrap();
        assert!(is_webp(&out), "output is not a WebP container");
        assert_ne!(out, png);
    }

    #[test]
    fn test_jpeg_converts_to_webp() {
        let img = RgbaImage::from_pixel(32, 32, Rgba([10, 200, 10, 255]));
        let jpeg = encode(&img, ImageFormat::Jpeg);

        let out = convert_to_webp(&jpeg, SourceFormat::Jpeg, 80.0).unwrap();
        assert!(is_webp(&out));
    }

    #[test]
    fn test_webp_input_is_passed_through() {
        let img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 250, 255]));
        let png = encode(&img, ImageFormat::Png);
        let webp_bytes = convert_to_webp(&png, SourceFormat::Png, 80.0).unwrap();

        let out = convert_to_webp(&webp_bytes, SourceFormat::WebP, 80.0).unwrap();
        assert_eq!(out, webp_bytes);
    }

    #[test]
    fn test_misdeclared_format_still_decodes_by_sniffing() {
        // a PNG that arrived classified as Other decodes anyway
        let img = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let png = encode(&img, ImageFormat::Png);

        let out = convert_to_webp(&png, SourceFormat::Other, 80.0).unwrap();
        assert!(is_webp(&out));
    }

    #[test]
    fn test_garbage_input_fails_without_panicking() {
        let garbage = Bytes::from_static(b"definitely not an image");
        let result = convert_to_webp(&garbage, SourceFormat::Jpeg, 80.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_heic_fails_cleanly() {
        let garbage = Bytes::from_static(b"ftypheic but not really");
        let result = convert_to_webp(&garbage, SourceFormat::Heic, 80.0);
        assert!(result.is_err());
    }
}
