//! Short-code derivation contract and a default grid-offset scheme.

use thiserror::Error;

use crate::models::LatLng;

/// Maps a query point plus a polygon's reference point to a compact
/// alphanumeric code
pub trait ShortCodeEncoder: Send + Sync {
    fn encode(&self, point: LatLng, reference: LatLng) -> String;
}

const ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

#[derive(Debug, Error)]
#[error("grid precision must be a positive finite number of degrees, got {0}")]
pub struct InvalidPrecision(pub f64);

/// Encodes the offset from the reference point on a fixed-size degree grid.
///
/// Both axis offsets are zigzag encoded, written as base-32 digits, padded to
/// the same width and interleaved lat-first. A point in the reference cell
/// encodes as `"00"`.
#[derive(Debug, Clone, Copy)]
pub struct GridOffsetEncoder {
    precision: f64,
}

impl GridOffsetEncoder {
    /// Roughly 11 m at the equator
    pub const DEFAULT_PRECISION: f64 = 0.0001;

    pub fn new(precision: f64) -> Result<Self, InvalidPrecision> {
        if precision.is_finite() && precision > 0.0 {
            Ok(Self { precision })
        } else {
            Err(InvalidPrecision(precision))
        }
    }

    pub fn precision(&self) -> f64 {
        self.precision
    }

    fn cells(&self, delta: f64) -> i64 {
        (delta / self.precision).round() as i64
    }
}

impl Default for GridOffsetEncoder {
    fn default() -> Self {
        Self {
            precision: Self::DEFAULT_PRECISION,
        }
    }
}

impl ShortCodeEncoder for GridOffsetEncoder {
    fn encode(&self, point: LatLng, reference: LatLng) -> String {
        let lat = base32(zigzag(self.cells(point.lat - reference.lat)));
        let lng = base32(zigzag(self.cells(point.lng - reference.lng)));

        let width = lat.len().max(lng.len());
        let lat = pad(lat, width);
        let lng = pad(lng, width);

        lat.iter()
            .zip(&lng)
            .flat_map(|(&a, &b)| [a as char, b as char])
            .collect()
    }
}

fn zigzag(n: i64) -> u64 {
    ((n << 1) ^ (n >> 63)) as u64
}

/// Most significant digit first, at least one digit
fn base32(mut n: u64) -> Vec<u8> {
    let mut digits = Vec::new();
    loop {
        digits.push(ALPHABET[(n % 32) as usize]);
        n /= 32;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

fn pad(digits: Vec<u8>, width: usize) -> Vec<u8> {
    let mut padded = vec![b'0'; width - digits.len()];
    padded.extend(digits);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_cell() {
        let encoder = GridOffsetEncoder::default();
        let p = LatLng::new(-17.913307, 30.973464);
        assert_eq!(encoder.encode(p, p), "00");
    }

    #[test]
    fn test_single_cell_offsets() {
        let encoder = GridOffsetEncoder::new(1.0).unwrap();
        let origin = LatLng::new(0.0, 0.0);
        assert_eq!(encoder.encode(LatLng::new(1.0, 0.0), origin), "20");
        assert_eq!(encoder.encode(LatLng::new(-1.0, 0.0), origin), "10");
        assert_eq!(encoder.encode(LatLng::new(0.0, -1.0), origin), "01");
        // 16 cells -> zigzag 32 -> two digits
        assert_eq!(encoder.encode(LatLng::new(16.0, 0.0), origin), "1000");
    }

    #[test]
    fn test_codes_are_alphanumeric() {
        let encoder = GridOffsetEncoder::default();
        let code = encoder.encode(
            LatLng::new(-20.015061, 28.620266),
            LatLng::new(-19.0552, 29.6035),
        );
        assert!(code.len() % 2 == 0);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_invalid_precision() {
        assert!(GridOffsetEncoder::new(0.0).is_err());
        assert!(GridOffsetEncoder::new(-1.0).is_err());
        assert!(GridOffsetEncoder::new(f64::NAN).is_err());
    }
}
