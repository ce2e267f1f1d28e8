//! Point-in-Polygon (PIP) lookup over the polygon catalog.
//!
//! A bounding-box prefilter rejects most records cheaply; the exact
//! ray-casting test on the vertex ring decides the rest.

pub mod catalog;
mod index;
mod ring;
mod service;

pub use catalog::{Catalog, CatalogStats, ResolveMode};
pub use index::CatalogIndex;
pub use ring::contains;
pub use service::{LocationCode, Locator};
