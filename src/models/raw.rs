//! Raw place records as returned by a Nominatim-style geocoder.
//!
//! Only the fields needed to build a [`PolygonRecord`](super::PolygonRecord)
//! are decoded. Numeric fields stay as JSON values here because geocoders
//! report some of them as strings; they are validated during construction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CatalogError;

/// Place identifier from the source catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceId {
    Int(i64),
    Text(String),
}

impl std::fmt::Display for PlaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceId::Int(id) => write!(f, "{}", id),
            PlaceId::Text(id) => write!(f, "{}", id),
        }
    }
}

/// One geocoder result for a place
#[derive(Debug, Clone, Deserialize)]
pub struct RawPlace {
    #[serde(default)]
    pub place_id: Option<PlaceId>,

    /// Reference latitude (number or numeric string)
    #[serde(default)]
    pub lat: Option<Value>,

    /// Reference longitude (number or numeric string)
    #[serde(default)]
    pub lon: Option<Value>,

    /// Full place name: "Midlands Province, Zimbabwe"
    #[serde(default)]
    pub display_name: Option<String>,

    /// `[min_lat, max_lat, min_lng, max_lng]`
    #[serde(default)]
    pub boundingbox: Option<Vec<Value>>,

    #[serde(default)]
    pub geojson: Option<RawGeometry>,
}

/// GeoJSON geometry, discriminated by its `type` tag
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum RawGeometry {
    /// `coordinates` is a list of rings of `[lng, lat]` pairs, outer ring first
    Polygon {
        #[serde(default)]
        coordinates: Value,
    },
    MultiPolygon { coordinates: Value },
    LineString { coordinates: Value },
    Point { coordinates: Value },
    #[serde(other)]
    Other,
}

impl RawPlace {
    /// Outer-ring coordinates if this result carries Polygon geometry
    pub fn polygon(&self) -> Option<&Value> {
        match &self.geojson {
            Some(RawGeometry::Polygon { coordinates }) => Some(coordinates),
            _ => None,
        }
    }
}

/// Parse a coordinate that may be encoded as a JSON number or a numeric string
pub(crate) fn parse_coord(field: &'static str, value: &Value) -> Result<f64, CatalogError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| CatalogError::data_format(field, value))
}
