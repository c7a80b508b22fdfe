//! EXIF GPS extraction.
//!
//! Two parse paths feed one numeric contract: a corruption-tolerant container
//! read first (HEIC containers frequently carry truncated EXIF blocks), then
//! a strict parse as fallback. Metadata absence is normal, never an error.

use std::io::Cursor;

use fotomap_core::GpsResult;

/// Extract GPS coordinates from image bytes.
///
/// Never fails: unreadable or absent metadata yields `GpsResult::none()`.
/// `has_gps` is false whenever either coordinate is missing.
pub fn extract_gps(data: &[u8]) -> GpsResult {
    match read_exif_tolerant(data) {
        Ok(exif) => {
            if let Some(result) = gps_from_exif(&exif) {
                return result;
            }
        }
        Err(err) => {
            tracing::debug!(error = %err, "tolerant EXIF read failed");
        }
    }

    // The tolerant path found nothing; a strict parse occasionally recovers
    // tags the salvage pass dropped.
    match read_exif_strict(data) {
        Ok(exif) => gps_from_exif(&exif).unwrap_or_else(GpsResult::none),
        Err(err) => {
            tracing::debug!(error = %err, "no readable EXIF metadata");
            GpsResult::none()
        }
    }
}

fn read_exif_tolerant(data: &[u8]) -> Result<exif::Exif, exif::Error> {
    let mut cursor = Cursor::new(data);
    let mut reader = exif::Reader::new();
    reader.continue_on_error(true);
    reader
        .read_from_container(&mut cursor)
        .or_else(|err| {
            err.distill_partial_result(|errors| {
                tracing::debug!(count = errors.len(), "salvaged partial EXIF read");
            })
        })
}

fn read_exif_strict(data: &[u8]) -> Result<exif::Exif, exif::Error> {
    let mut cursor = Cursor::new(data);
    exif::Reader::new().read_from_container(&mut cursor)
}

fn gps_from_exif(exif: &exif::Exif) -> Option<GpsResult> {
    let latitude = coordinate(exif, exif::Tag::GPSLatitude, exif::Tag::GPSLatitudeRef)?;
    let longitude = coordinate(exif, exif::Tag::GPSLongitude, exif::Tag::GPSLongitudeRef)?;
    Some(GpsResult::new(latitude, longitude, altitude(exif)))
}

/// Read one coordinate (latitude or longitude) in decimal degrees.
fn coordinate(exif: &exif::Exif, coord_tag: exif::Tag, ref_tag: exif::Tag) -> Option<f64> {
    let coord_field = exif.get_field(coord_tag, exif::In::PRIMARY)?;
    let ref_field = exif.get_field(ref_tag, exif::In::PRIMARY)?;

    let rationals = match &coord_field.value {
        exif::Value::Rational(r) => r,
        _ => return None,
    };

    let ref_str = ref_field.display_value().to_string();
    dms_to_decimal(rationals, ref_str == "S" || ref_str == "W")
}

/// Convert a [degrees, minutes, seconds] rational triple to decimal degrees.
fn dms_to_decimal(rationals: &[exif::Rational], negative: bool) -> Option<f64> {
    if rationals.len() < 3 {
        return None;
    }

    let degrees = rationals[0].to_f64();
    let minutes = rationals[1].to_f64();
    let seconds = rationals[2].to_f64();

    let decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if !decimal.is_finite() {
        return None;
    }

    Some(if negative { -decimal } else { decimal })
}

/// Read altitude in meters, negated when the reference flags below sea level.
fn altitude(exif: &exif::Exif) -> Option<f64> {
    let alt_field = exif.get_field(exif::Tag::GPSAltitude, exif::In::PRIMARY)?;

    let mut altitude = match &alt_field.value {
        exif::Value::Rational(r) if !r.is_empty() => r[0].to_f64(),
        _ => return None,
    };

    if let Some(ref_field) = exif.get_field(exif::Tag::GPSAltitudeRef, exif::In::PRIMARY) {
        if ref_field.value.get_uint(0) == Some(1) {
            altitude = -altitude;
        }
    }

    Some(altitude)
}
