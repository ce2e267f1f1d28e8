//! Polygon records: one administrative boundary in the catalog.

use serde::Serialize;
use serde_json::Value;

use super::geometry::{BoundingBox, LatLng};
use super::raw::{parse_coord, PlaceId, RawPlace};
use crate::error::CatalogError;

/// Whether a record was built from real Polygon geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryStatus {
    Resolved,
    /// The source had no Polygon entry; the record carries the universal box
    /// and an empty vertex ring, so it never matches a query
    Degraded,
}

/// A boundary polygon with its identity and lookup geometry
#[derive(Debug, Clone, Serialize)]
pub struct PolygonRecord {
    pub id: Option<PlaceId>,

    /// Representative point used for short-code derivation.
    /// Not necessarily inside the polygon.
    pub reference_point: Option<LatLng>,

    pub display_name: Option<String>,

    pub bounding_box: BoundingBox,

    /// `bounding_box` as a closed 5-point ring
    #[serde(skip)]
    pub bounding_box_ring: Vec<LatLng>,

    /// Outer boundary, not necessarily closed
    #[serde(skip)]
    pub vertex_ring: Vec<LatLng>,

    pub status: GeometryStatus,
}

impl PolygonRecord {
    /// Build a resolved record from already validated parts
    pub fn new(
        id: PlaceId,
        display_name: impl Into<String>,
        reference_point: LatLng,
        bounding_box: BoundingBox,
        vertex_ring: Vec<LatLng>,
    ) -> Self {
        Self {
            id: Some(id),
            reference_point: Some(reference_point),
            display_name: Some(display_name.into()),
            bounding_box_ring: bounding_box.ring(),
            bounding_box,
            vertex_ring,
            status: GeometryStatus::Resolved,
        }
    }

    /// Record standing in for a place without Polygon geometry
    pub fn degraded() -> Self {
        Self {
            id: None,
            reference_point: None,
            display_name: None,
            bounding_box: BoundingBox::UNIVERSAL,
            bounding_box_ring: BoundingBox::UNIVERSAL.ring(),
            vertex_ring: Vec::new(),
            status: GeometryStatus::Degraded,
        }
    }

    /// Build a record from the geocoder results for one place.
    ///
    /// The first result with Polygon geometry supplies every field; the
    /// others are alternate representations and are ignored. Without any
    /// Polygon result the record degrades instead of failing.
    pub fn from_raw(raw: &[RawPlace]) -> Result<Self, CatalogError> {
        let Some((place, coordinates)) = raw
            .iter()
            .find_map(|place| place.polygon().map(|coords| (place, coords)))
        else {
            return Ok(Self::degraded());
        };

        let vertex_ring = parse_outer_ring(coordinates)?;
        if vertex_ring.len() < 3 {
            return Err(CatalogError::EmptyPolygon {
                id: place.place_id.clone(),
                vertices: vertex_ring.len(),
            });
        }

        let bounding_box = parse_bounding_box(place.boundingbox.as_deref())?;

        let lat = place
            .lat
            .as_ref()
            .ok_or_else(|| CatalogError::data_format("lat", "missing"))?;
        let lng = place
            .lon
            .as_ref()
            .ok_or_else(|| CatalogError::data_format("lon", "missing"))?;
        let reference_point = LatLng::new(parse_coord("lat", lat)?, parse_coord("lon", lng)?);

        let display_name = place
            .display_name
            .as_deref()
            .map(short_display_name)
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CatalogError::data_format("display_name", "missing"))?;

        Ok(Self {
            id: place.place_id.clone(),
            reference_point: Some(reference_point),
            display_name: Some(display_name),
            bounding_box_ring: bounding_box.ring(),
            bounding_box,
            vertex_ring,
            status: GeometryStatus::Resolved,
        })
    }

    /// Cheap prefilter. The universal box passes without consulting its ring.
    pub fn bbox_contains(&self, point: LatLng) -> bool {
        self.bounding_box.is_universal()
            || crate::pip::contains(&self.bounding_box_ring, point)
    }

    /// Exact test against the vertex ring
    pub fn polygon_contains(&self, point: LatLng) -> bool {
        crate::pip::contains(&self.vertex_ring, point)
    }

    /// Two-phase test: the vertex ring is only examined when the box passes
    pub fn contains(&self, point: LatLng) -> bool {
        self.bbox_contains(point) && self.polygon_contains(point)
    }

    pub fn is_degraded(&self) -> bool {
        self.status == GeometryStatus::Degraded
    }

    /// Extent of the vertex ring, independent of the declared box
    pub fn vertex_bounds(&self) -> Option<BoundingBox> {
        BoundingBox::of_ring(&self.vertex_ring)
    }

    /// Convert to a `geo` polygon (x = lng, y = lat)
    pub fn to_geo_polygon(&self) -> geo::Polygon<f64> {
        let exterior: geo::LineString<f64> = self
            .vertex_ring
            .iter()
            .copied()
            .map(geo::Coord::<f64>::from)
            .collect();
        geo::Polygon::new(exterior, vec![])
    }
}

/// Label for a place: the text before the first comma, cut before
/// `" Province"` when present.
pub fn short_display_name(full: &str) -> String {
    let name = full.split(',').next().unwrap_or_default();
    match name.find(" Province") {
        Some(end) => name[..end].to_string(),
        None => name.to_string(),
    }
}

/// Outer ring of a GeoJSON Polygon: `[[[lng, lat], ...], holes...]`
fn parse_outer_ring(coordinates: &Value) -> Result<Vec<LatLng>, CatalogError> {
    let outer = coordinates
        .as_array()
        .and_then(|rings| rings.first())
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::data_format("coordinates", coordinates))?;

    outer
        .iter()
        .map(|pair| match pair.as_array().map(Vec::as_slice) {
            Some([lng, lat, ..]) => Ok(LatLng::new(
                parse_coord("coordinates", lat)?,
                parse_coord("coordinates", lng)?,
            )),
            _ => Err(CatalogError::data_format("coordinates", pair)),
        })
        .collect()
}

fn parse_bounding_box(values: Option<&[Value]>) -> Result<BoundingBox, CatalogError> {
    let values = values.ok_or_else(|| CatalogError::data_format("boundingbox", "missing"))?;
    let [min_lat, max_lat, min_lng, max_lng] = values else {
        return Err(CatalogError::data_format(
            "boundingbox",
            format!("{} values", values.len()),
        ));
    };

    Ok(BoundingBox::from_nominatim([
        parse_coord("boundingbox", min_lat)?,
        parse_coord("boundingbox", max_lat)?,
        parse_coord("boundingbox", min_lng)?,
        parse_coord("boundingbox", max_lng)?,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(values: Value) -> Vec<RawPlace> {
        serde_json::from_value(values).unwrap()
    }

    fn midlands() -> Vec<RawPlace> {
        raw(json!([
            {
                "place_id": 7,
                "lat": "-19.0",
                "lon": "29.5",
                "display_name": "Midlands Province, Zimbabwe",
                "geojson": {"type": "Point", "coordinates": [29.5, -19.0]}
            },
            {
                "place_id": 198765,
                "lat": "-19.0552",
                "lon": "29.6035",
                "display_name": "Midlands Province, Zimbabwe",
                "boundingbox": ["-21.0", "-17.0", "28.0", "31.0"],
                "geojson": {
                    "type": "Polygon",
                    "coordinates": [[[28.0, -21.0], [31.0, -21.0], [31.0, -17.0], [28.0, -17.0], [28.0, -21.0]]]
                }
            }
        ]))
    }

    #[test]
    fn test_display_name_truncation() {
        assert_eq!(short_display_name("Midlands Province, Zimbabwe"), "Midlands");
        assert_eq!(short_display_name("Harare, Zimbabwe"), "Harare");
        assert_eq!(short_display_name("Bulawayo"), "Bulawayo");
        assert_eq!(short_display_name("Provincetown, USA"), "Provincetown");
    }

    #[test]
    fn test_from_raw_picks_polygon_entry() {
        let record = PolygonRecord::from_raw(&midlands()).unwrap();
        assert_eq!(record.id, Some(PlaceId::Int(198765)));
        assert_eq!(record.display_name.as_deref(), Some("Midlands"));
        assert_eq!(record.reference_point, Some(LatLng::new(-19.0552, 29.6035)));
        assert_eq!(record.vertex_ring.len(), 5);
        assert_eq!(record.vertex_ring[1], LatLng::new(-21.0, 31.0));
        assert_eq!(record.bounding_box_ring.len(), 5);
        assert_eq!(record.status, GeometryStatus::Resolved);
        assert!(record.contains(LatLng::new(-20.015061, 28.620266)));
        assert!(!record.contains(LatLng::new(-15.89046, 29.380621)));
    }

    #[test]
    fn test_universal_fallback() {
        let record = PolygonRecord::from_raw(&raw(json!([
            {"place_id": 1, "lat": "0", "lon": "0", "display_name": "Somewhere",
             "geojson": {"type": "Point", "coordinates": [0.0, 0.0]}}
        ])))
        .unwrap();

        assert!(record.is_degraded());
        assert_eq!(record.bounding_box, BoundingBox::UNIVERSAL);
        assert!(record.id.is_none());
        assert!(record.display_name.is_none());
        assert!(record.reference_point.is_none());
        for point in [LatLng::new(0.0, 0.0), LatLng::new(-89.0, 179.0), LatLng::new(45.0, -120.0)] {
            assert!(record.bbox_contains(point));
            assert!(!record.contains(point));
        }

        assert!(PolygonRecord::from_raw(&[]).unwrap().is_degraded());
    }

    #[test]
    fn test_non_numeric_coordinates_rejected() {
        let err = PolygonRecord::from_raw(&raw(json!([
            {"place_id": 1, "lat": "-19", "lon": "29", "display_name": "X",
             "boundingbox": ["-21", "-17", "28", "31"],
             "geojson": {"type": "Polygon", "coordinates": [[[28.0, -21.0], ["east", -21.0], [31.0, -17.0]]]}}
        ])))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DataFormat { field: "coordinates", .. }));
    }

    #[test]
    fn test_bad_bounding_box_rejected() {
        let err = PolygonRecord::from_raw(&raw(json!([
            {"place_id": 1, "lat": "-19", "lon": "29", "display_name": "X",
             "boundingbox": ["-21", "-17", "28"],
             "geojson": {"type": "Polygon", "coordinates": [[[28.0, -21.0], [31.0, -21.0], [31.0, -17.0]]]}}
        ])))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DataFormat { field: "boundingbox", .. }));

        let err = PolygonRecord::from_raw(&raw(json!([
            {"place_id": 1, "lon": "29", "display_name": "X",
             "boundingbox": ["-21", "-17", "28", "31"],
             "geojson": {"type": "Polygon", "coordinates": [[[28.0, -21.0], [31.0, -21.0], [31.0, -17.0]]]}}
        ])))
        .unwrap_err();
        assert!(matches!(err, CatalogError::DataFormat { field: "lat", .. }));
    }

    #[test]
    fn test_missing_display_name_rejected() {
        for name in [json!(null), json!(""), json!(", Zimbabwe")] {
            let err = PolygonRecord::from_raw(&raw(json!([
                {"place_id": 3, "lat": "0.5", "lon": "0.5", "display_name": name,
                 "boundingbox": ["0", "1", "0", "1"],
                 "geojson": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 1]]]}}
            ])))
            .unwrap_err();
            assert!(matches!(err, CatalogError::DataFormat { field: "display_name", .. }));
        }
    }

    #[test]
    fn test_too_few_vertices() {
        let err = PolygonRecord::from_raw(&raw(json!([
            {"place_id": 5, "lat": "0", "lon": "0", "display_name": "Line",
             "boundingbox": ["0", "1", "0", "1"],
             "geojson": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0]]]}}
        ])))
        .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::EmptyPolygon { vertices: 2, id: Some(PlaceId::Int(5)) }
        ));
    }

    #[test]
    fn test_geo_polygon_conversion() {
        use geo::Area;

        let record = PolygonRecord::from_raw(&midlands()).unwrap();
        let poly = record.to_geo_polygon();
        assert!((poly.unsigned_area() - 12.0).abs() < 1e-9);
        assert_eq!(record.vertex_bounds(), Some(record.bounding_box));
    }
}
