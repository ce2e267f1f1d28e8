//! Data models for the polygon catalog.

mod geometry;
mod polygon;
mod raw;

pub use geometry::{BoundingBox, LatLng};
pub use polygon::{short_display_name, GeometryStatus, PolygonRecord};
pub use raw::{PlaceId, RawGeometry, RawPlace};
