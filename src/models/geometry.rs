//! Geometry primitives shared by the catalog and the PIP predicate.

use serde::{Deserialize, Serialize};

/// Geographic point (lat/lng, degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<LatLng> for geo::Coord<f64> {
    fn from(p: LatLng) -> Self {
        geo::Coord { x: p.lng, y: p.lat }
    }
}

impl From<geo::Coord<f64>> for LatLng {
    fn from(c: geo::Coord<f64>) -> Self {
        LatLng::new(c.y, c.x)
    }
}

/// Axis-aligned bounding box.
///
/// Boxes built from source data satisfy `min <= max` on both axes. The
/// [`BoundingBox::UNIVERSAL`] sentinel stands for "no geometry available"
/// and contains every point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub const UNIVERSAL: BoundingBox = BoundingBox {
        min_lat: f64::NEG_INFINITY,
        max_lat: f64::INFINITY,
        min_lng: f64::NEG_INFINITY,
        max_lng: f64::INFINITY,
    };

    /// Build a box from `[min_lat, max_lat, min_lng, max_lng]`, the order
    /// geocoders report `boundingbox` in
    pub fn from_nominatim(values: [f64; 4]) -> Self {
        let [min_lat, max_lat, min_lng, max_lng] = values;
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    pub fn is_universal(&self) -> bool {
        *self == Self::UNIVERSAL
    }

    /// Closed 5-point ring (4 corners, first repeated last) so the box can be
    /// fed to the same ray-casting test as real boundaries
    pub fn ring(&self) -> Vec<LatLng> {
        vec![
            LatLng::new(self.min_lat, self.min_lng),
            LatLng::new(self.max_lat, self.min_lng),
            LatLng::new(self.max_lat, self.max_lng),
            LatLng::new(self.min_lat, self.max_lng),
            LatLng::new(self.min_lat, self.min_lng),
        ]
    }

    /// Inclusive comparison against the edges
    pub fn contains(&self, point: LatLng) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }

    /// Whether `other` lies entirely within this box
    pub fn covers(&self, other: &BoundingBox) -> bool {
        other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
            && other.min_lng >= self.min_lng
            && other.max_lng <= self.max_lng
    }

    /// Box around a vertex ring, `None` for an empty ring
    pub fn of_ring(ring: &[LatLng]) -> Option<Self> {
        use geo::BoundingRect;

        let line: geo::LineString<f64> = ring
            .iter()
            .copied()
            .map(geo::Coord::<f64>::from)
            .collect();
        line.bounding_rect().map(|rect| Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }
}
