//! Embedded GPS tag extraction.

use crate::geo::GeoPoint;
use exif::{Exif, In, Reader, Tag, Value};
use std::io::Cursor;
use tracing::debug;

/// Convert a degrees/minutes/seconds triple to decimal degrees.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

/// Read the GPS position from an image's metadata container.
///
/// Returns `None` when the container is unreadable or either coordinate is
/// missing. A southern latitude or western longitude comes back negative.
pub fn read_embedded(bytes: &[u8]) -> Option<GeoPoint> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            debug!("No readable metadata: {e}");
            return None;
        }
    };

    let latitude = coordinate(&exif, Tag::GPSLatitude, Tag::GPSLatitudeRef, b'S')?;
    let longitude = coordinate(&exif, Tag::GPSLongitude, Tag::GPSLongitudeRef, b'W')?;

    Some(GeoPoint {
        latitude,
        longitude,
    })
}

fn coordinate(exif: &Exif, tag: Tag, ref_tag: Tag, negative_ref: u8) -> Option<f64> {
    let field = exif.get_field(tag, In::PRIMARY)?;
    let Value::Rational(parts) = &field.value else {
        return None;
    };
    if parts.len() < 3 || parts.iter().any(|r| r.denom == 0) {
        return None;
    }

    let value = dms_to_decimal(parts[0].to_f64(), parts[1].to_f64(), parts[2].to_f64());

    let negate = exif
        .get_field(ref_tag, In::PRIMARY)
        .is_some_and(|f| match &f.value {
            Value::Ascii(strings) => strings
                .first()
                .and_then(|s| s.first())
                .is_some_and(|c| c.eq_ignore_ascii_case(&negative_ref)),
            _ => false,
        });

    Some(if negate { -value } else { value })
}
