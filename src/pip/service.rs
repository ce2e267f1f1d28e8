//! Location coding: resolve a point and label it `"<DisplayName>.<ShortCode>"`.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::{Catalog, CatalogIndex, ResolveMode};
use crate::models::{LatLng, PlaceId, PolygonRecord};
use crate::shortcode::ShortCodeEncoder;

/// A location code for one matching polygon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationCode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_id: Option<PlaceId>,
    pub display_name: String,
    pub short_code: String,
    /// `"<display_name>.<short_code>"`
    pub code: String,
}

enum Backend {
    Linear(Arc<Catalog>),
    Indexed(CatalogIndex),
}

/// Point-to-code lookup service over a shared catalog
pub struct Locator {
    backend: Backend,
    encoder: Box<dyn ShortCodeEncoder>,
}

impl Locator {
    /// Linear two-phase scan over the catalog
    pub fn new(catalog: Arc<Catalog>, encoder: Box<dyn ShortCodeEncoder>) -> Self {
        Self {
            backend: Backend::Linear(catalog),
            encoder,
        }
    }

    /// Same results, with an R-tree prefilter in front of the catalog
    pub fn with_index(catalog: Arc<Catalog>, encoder: Box<dyn ShortCodeEncoder>) -> Self {
        Self {
            backend: Backend::Indexed(CatalogIndex::build(catalog)),
            encoder,
        }
    }

    pub fn resolve(&self, point: LatLng, mode: ResolveMode) -> Vec<&PolygonRecord> {
        match &self.backend {
            Backend::Linear(catalog) => catalog.resolve(point, mode),
            Backend::Indexed(index) => index.resolve(point, mode),
        }
    }

    /// Codes for the polygons containing `point`; empty when none does
    pub fn locate(&self, point: LatLng, mode: ResolveMode) -> Vec<LocationCode> {
        self.resolve(point, mode)
            .into_iter()
            .filter_map(|record| {
                let (Some(name), Some(reference)) =
                    (record.display_name.as_ref(), record.reference_point)
                else {
                    warn!(
                        "Dropping match {:?}: no display name or reference point",
                        record.id
                    );
                    return None;
                };

                let short_code = self.encoder.encode(point, reference);
                Some(LocationCode {
                    place_id: record.id.clone(),
                    code: format!("{}.{}", name, short_code),
                    display_name: name.clone(),
                    short_code,
                })
            })
            .collect()
    }

    pub fn catalog(&self) -> &Catalog {
        match &self.backend {
            Backend::Linear(catalog) => catalog.as_ref(),
            Backend::Indexed(index) => index.catalog().as_ref(),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self.backend, Backend::Indexed(_))
    }
}
