//! Polycode - point location over administrative boundary polygons
//!
//! Resolves a latitude/longitude against a catalog of boundary polygons and
//! derives a short `"<DisplayName>.<ShortCode>"` location code.

pub mod config;
pub mod error;
pub mod models;
pub mod pip;
pub mod shortcode;

pub use error::CatalogError;
pub use models::{BoundingBox, LatLng, PlaceId, PolygonRecord};
pub use pip::{Catalog, CatalogIndex, LocationCode, Locator, ResolveMode};
