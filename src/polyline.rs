//! Compact, reversible polyline encoding for coordinate sequences.
//!
//! Each (latitude, longitude) pair is rounded to a fixed number of decimal
//! digits, delta-encoded against the previous rounded pair, zig-zag
//! transformed so small negative deltas stay short, then emitted as 5-bit
//! chunks offset into printable ASCII. The format is the de-facto standard
//! polyline wire format used by routing providers, so encoded paths can be
//! exchanged with external route collaborators directly.

use crate::error::{Result, StopcastError};

/// Decimal digits kept per coordinate. Five digits is roughly 1.1 m of
/// resolution at the equator. `decode` always assumes this scaling; callers
/// encoding at a different precision must track it out of band.
pub const DEFAULT_PRECISION: u32 = 5;

/// Continuation flag carried by every chunk except the last of a value.
const CONTINUATION_BIT: i64 = 0x20;

/// Offset that maps 6-bit chunk values into printable ASCII.
const ASCII_OFFSET: i64 = 63;

/// Encode a sequence of (latitude, longitude) pairs at the given precision.
///
/// The encoding is deterministic and lossy at `precision` decimal digits.
/// An empty slice encodes to the empty string, which keeps
/// `decode(encode(&[]))` idempotent. The only failure mode is a non-finite
/// coordinate, which has no representation in the scaled integer space.
///
/// # Example
/// ```
/// use stopcast::polyline::{encode, DEFAULT_PRECISION};
///
/// let path = vec![(38.5, -120.2), (40.7, -120.95), (43.252, -126.453)];
/// let encoded = encode(&path, DEFAULT_PRECISION).unwrap();
/// assert_eq!(encoded, "_p~iF~ps|U_ulLnnqC_mqNvxq`@");
/// ```
pub fn encode(points: &[(f64, f64)], precision: u32) -> Result<String> {
    let factor = 10f64.powi(precision as i32);
    // Two coordinates per point, ~3 bytes per coordinate for typical traces.
    let mut out = String::with_capacity(points.len() * 6);
    let mut prev_lat = 0i64;
    let mut prev_lon = 0i64;

    for &(lat, lon) in points {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(StopcastError::Encoding {
                reason: format!("non-finite coordinate ({lat}, {lon})"),
            });
        }
        let lat_scaled = (lat * factor).round() as i64;
        let lon_scaled = (lon * factor).round() as i64;
        encode_value(lat_scaled - prev_lat, &mut out);
        encode_value(lon_scaled - prev_lon, &mut out);
        prev_lat = lat_scaled;
        prev_lon = lon_scaled;
    }

    Ok(out)
}

/// Decode a polyline string back to (latitude, longitude) pairs.
///
/// Exact inverse of [`encode`] at [`DEFAULT_PRECISION`] for any string
/// `encode` produced. Fails with a `Decoding` error on a truncated or
/// overlong continuation sequence, a byte outside the polyline alphabet,
/// or a trailing latitude with no matching longitude.
pub fn decode(encoded: &str) -> Result<Vec<(f64, f64)>> {
    let factor = 10f64.powi(DEFAULT_PRECISION as i32);
    let bytes = encoded.as_bytes();
    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut lat = 0i64;
    let mut lon = 0i64;
    let mut index = 0;

    while index < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, index)?;
        if next >= bytes.len() {
            return Err(StopcastError::Decoding {
                offset: next,
                reason: "latitude without matching longitude".to_string(),
            });
        }
        let (delta_lon, next) = decode_value(bytes, next)?;
        lat += delta_lat;
        lon += delta_lon;
        points.push((lat as f64 / factor, lon as f64 / factor));
        index = next;
    }

    Ok(points)
}

/// Emit one signed delta as zig-zag 5-bit chunks.
fn encode_value(delta: i64, out: &mut String) {
    let mut value = (delta << 1) ^ (delta >> 63);
    while value >= CONTINUATION_BIT {
        let chunk = (CONTINUATION_BIT | (value & 0x1f)) + ASCII_OFFSET;
        out.push(chunk as u8 as char);
        value >>= 5;
    }
    out.push((value + ASCII_OFFSET) as u8 as char);
}

/// Read one signed delta starting at `index`; returns the delta and the
/// index of the byte after it.
fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize)> {
    let mut index = start;
    let mut accumulated = 0i64;
    let mut shift = 0u32;

    loop {
        let Some(&byte) = bytes.get(index) else {
            return Err(StopcastError::Decoding {
                offset: start,
                reason: "truncated continuation sequence".to_string(),
            });
        };
        let chunk = byte as i64 - ASCII_OFFSET;
        if !(0..=63).contains(&chunk) {
            return Err(StopcastError::Decoding {
                offset: index,
                reason: format!("byte 0x{byte:02x} outside polyline alphabet"),
            });
        }
        index += 1;
        accumulated |= (chunk & 0x1f) << shift;
        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
        shift += 5;
        // An i64 zig-zag value spans at most 13 chunks; anything longer is
        // a malformed run, not a bigger number.
        if shift > 60 {
            return Err(StopcastError::Decoding {
                offset: start,
                reason: "continuation sequence too long".to_string(),
            });
        }
    }

    let delta = (accumulated >> 1) ^ -(accumulated & 1);
    Ok((delta, index))
}
