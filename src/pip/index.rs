//! R-tree accelerated resolution over a catalog.

use std::sync::Arc;

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use super::{Catalog, ResolveMode};
use crate::models::{LatLng, PolygonRecord};

/// Catalog position wrapped for R-tree indexing by its bounding box
#[derive(Debug, Clone)]
struct IndexedRecord {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRecord {
    /// Callers keep degraded and universal-box records out of the tree
    fn new(position: usize, record: &PolygonRecord) -> Self {
        let bbox = record.bounding_box;
        Self {
            position,
            envelope: AABB::from_corners([bbox.min_lng, bbox.min_lat], [bbox.max_lng, bbox.max_lat]),
        }
    }
}

/// Spatial index over a shared catalog.
///
/// Produces the same results as the linear [`Catalog`] methods, in catalog
/// order, while only examining records whose box intersects the point.
pub struct CatalogIndex {
    catalog: Arc<Catalog>,
    tree: RTree<IndexedRecord>,
    /// Resolved records whose box is universal; an infinite envelope would
    /// upset the tree, so they are checked on every query
    unbounded: Vec<usize>,
}

impl CatalogIndex {
    pub fn build(catalog: Arc<Catalog>) -> Self {
        info!("Building spatial index for {} records...", catalog.len());

        let mut indexed = Vec::new();
        let mut unbounded = Vec::new();

        // Degraded records can never match
        for (position, record) in catalog.records().iter().enumerate() {
            if record.is_degraded() {
                continue;
            }
            if record.bounding_box.is_universal() {
                unbounded.push(position);
            } else {
                indexed.push(IndexedRecord::new(position, record));
            }
        }

        let tree = RTree::bulk_load(indexed);
        info!(
            "Spatial index built with {} entries ({} unbounded)",
            tree.size(),
            unbounded.len()
        );

        Self {
            catalog,
            tree,
            unbounded,
        }
    }

    /// Catalog positions of records whose box and polygon contain `point`,
    /// ascending
    fn matching_positions(&self, point: LatLng) -> Vec<usize> {
        let query_envelope = AABB::from_point([point.lng, point.lat]);

        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ir| ir.position)
            .chain(self.unbounded.iter().copied())
            .filter(|&position| self.catalog.records()[position].contains(point))
            .collect();
        positions.sort_unstable();
        positions
    }

    pub fn resolve_first(&self, point: LatLng) -> Option<&PolygonRecord> {
        self.matching_positions(point)
            .first()
            .and_then(|&position| self.catalog.get(position))
    }

    pub fn resolve_all(&self, point: LatLng) -> Vec<&PolygonRecord> {
        self.matching_positions(point)
            .into_iter()
            .filter_map(|position| self.catalog.get(position))
            .collect()
    }

    pub fn resolve(&self, point: LatLng, mode: ResolveMode) -> Vec<&PolygonRecord> {
        match mode {
            ResolveMode::First => self.resolve_first(point).into_iter().collect(),
            ResolveMode::All => self.resolve_all(point),
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Number of indexed (non-degraded) records
    pub fn len(&self) -> usize {
        self.tree.size() + self.unbounded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pip::catalog::tests::{nested_catalog, square};

    fn ids(records: Vec<&PolygonRecord>) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.id.as_ref().map(|id| id.to_string()))
            .collect()
    }

    #[test]
    fn test_index_matches_linear_scan() {
        let catalog = Arc::new(nested_catalog());
        let index = CatalogIndex::build(Arc::clone(&catalog));
        assert_eq!(index.len(), 3);

        for point in [
            LatLng::new(-20.015061, 28.620266),
            LatLng::new(-17.913307, 30.973464),
            LatLng::new(-15.89046, 29.380621),
            LatLng::new(-15.5, 28.5),
            LatLng::new(0.0, 0.0),
        ] {
            for mode in [ResolveMode::First, ResolveMode::All] {
                assert_eq!(
                    ids(index.resolve(point, mode)),
                    ids(catalog.resolve(point, mode)),
                    "{:?} {}",
                    point,
                    mode
                );
            }
        }
    }

    #[test]
    fn test_index_keeps_catalog_order() {
        // Inner polygon listed first this time
        let catalog = Arc::new(Catalog::new(vec![
            square(2, "Inner", (1.0, 1.0), (2.0, 2.0)),
            square(1, "Outer", (0.0, 0.0), (5.0, 5.0)),
        ]));
        let index = CatalogIndex::build(catalog);
        let point = LatLng::new(1.5, 1.5);

        assert_eq!(ids(index.resolve_all(point)), vec!["2", "1"]);
        assert_eq!(
            index.resolve_first(point).and_then(|r| r.display_name.clone()),
            Some("Inner".to_string())
        );
    }

    #[test]
    fn test_universal_box_record_matches_like_linear_scan() {
        use crate::models::{BoundingBox, PlaceId};

        let unbounded = PolygonRecord::new(
            PlaceId::Int(7),
            "Everywhere",
            LatLng::new(0.0, 0.0),
            BoundingBox::UNIVERSAL,
            vec![
                LatLng::new(-1.0, -1.0),
                LatLng::new(-1.0, 1.0),
                LatLng::new(1.0, 1.0),
                LatLng::new(1.0, -1.0),
            ],
        );
        let catalog = Arc::new(Catalog::new(vec![
            square(1, "Outer", (-5.0, -5.0), (5.0, 5.0)),
            unbounded,
            square(2, "Inner", (-0.5, -0.5), (0.5, 0.5)),
        ]));
        let index = CatalogIndex::build(Arc::clone(&catalog));
        assert_eq!(index.len(), 3);

        for point in [LatLng::new(0.0, 0.0), LatLng::new(0.75, 0.75), LatLng::new(3.0, 3.0)] {
            for mode in [ResolveMode::First, ResolveMode::All] {
                assert_eq!(
                    ids(index.resolve(point, mode)),
                    ids(catalog.resolve(point, mode)),
                    "{:?} {}",
                    point,
                    mode
                );
            }
        }
        assert_eq!(ids(index.resolve_all(LatLng::new(0.0, 0.0))), vec!["1", "7", "2"]);
        assert_eq!(ids(index.resolve_all(LatLng::new(0.75, 0.75))), vec!["1", "7"]);
    }

    #[test]
    fn test_degraded_records_not_indexed() {
        let catalog = Arc::new(Catalog::new(vec![
            PolygonRecord::degraded(),
            square(1, "A", (0.0, 0.0), (1.0, 1.0)),
        ]));
        let index = CatalogIndex::build(catalog);
        assert_eq!(index.len(), 1);
        assert!(index.resolve_all(LatLng::new(50.0, 50.0)).is_empty());
    }
}
