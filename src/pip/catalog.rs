//! The polygon catalog and its linear two-phase resolution engine.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::GzDecoder;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::models::{LatLng, PolygonRecord, RawPlace};

/// How many matches a query should produce
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ResolveMode {
    /// Stop at the first match in catalog order
    #[default]
    First,
    /// Every containing polygon, in catalog order. Nested admin areas
    /// (country, province, district) all match.
    All,
}

impl std::str::FromStr for ResolveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "first" => Ok(ResolveMode::First),
            "all" => Ok(ResolveMode::All),
            other => Err(format!("unknown resolve mode '{}' (expected first|all)", other)),
        }
    }
}

impl TryFrom<String> for ResolveMode {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for ResolveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveMode::First => write!(f, "first"),
            ResolveMode::All => write!(f, "all"),
        }
    }
}

/// Counts gathered while building a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    /// Records held by the catalog (resolved + degraded)
    pub records: usize,
    pub resolved: usize,
    /// Entries without Polygon geometry
    pub degraded: usize,
    /// Entries dropped because they failed validation
    pub skipped: usize,
}

/// Immutable, ordered collection of polygon records.
///
/// Built once at startup. After that it is only read, so it can be shared
/// across threads behind an `Arc` without locking.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<PolygonRecord>,
    stats: CatalogStats,
}

impl Catalog {
    pub fn new(records: Vec<PolygonRecord>) -> Self {
        let degraded = records.iter().filter(|r| r.is_degraded()).count();
        let stats = CatalogStats {
            records: records.len(),
            resolved: records.len() - degraded,
            degraded,
            skipped: 0,
        };
        Self { records, stats }
    }

    /// Build from raw geocoder entries, one entry per place.
    ///
    /// In strict mode the first invalid entry aborts the build. Otherwise it
    /// is logged and skipped, and counted in [`CatalogStats::skipped`].
    pub fn from_raw_entries(
        entries: &[Vec<RawPlace>],
        strict: bool,
    ) -> Result<Self, CatalogError> {
        let mut records = Vec::with_capacity(entries.len());
        let mut skipped = 0;

        for (idx, entry) in entries.iter().enumerate() {
            match PolygonRecord::from_raw(entry) {
                Ok(record) => records.push(record),
                Err(e) if strict => return Err(e),
                Err(e) => {
                    warn!("Skipping catalog entry {}: {}", idx, e);
                    skipped += 1;
                }
            }
        }

        check_records(&records);

        let mut catalog = Self::new(records);
        catalog.stats.skipped = skipped;
        Ok(catalog)
    }

    /// Read a JSON array of raw entries from any reader
    pub fn from_reader<R: Read>(reader: R, strict: bool) -> Result<Self, CatalogError> {
        let entries: Vec<Vec<RawPlace>> = serde_json::from_reader(BufReader::new(reader))?;
        Self::from_raw_entries(&entries, strict)
    }

    /// Load a catalog file; `.gz` files are decompressed on the fly
    pub fn load_from_file(path: &Path, strict: bool) -> Result<Self, CatalogError> {
        info!("Loading polygon catalog from {}", path.display());

        let file = File::open(path)?;
        let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        };

        let catalog = Self::from_reader(reader, strict)?;
        let stats = catalog.stats();
        info!(
            "Catalog ready: {} records ({} resolved, {} degraded, {} skipped)",
            stats.records, stats.resolved, stats.degraded, stats.skipped
        );
        Ok(catalog)
    }

    /// First record, in catalog order, whose box and polygon contain `point`
    pub fn resolve_first(&self, point: LatLng) -> Option<&PolygonRecord> {
        self.records.iter().find(|r| r.contains(point))
    }

    /// Every record containing `point`, in catalog order
    pub fn resolve_all(&self, point: LatLng) -> Vec<&PolygonRecord> {
        self.records.iter().filter(|r| r.contains(point)).collect()
    }

    /// Mode dispatch. An empty result means no polygon contains the point.
    pub fn resolve(&self, point: LatLng, mode: ResolveMode) -> Vec<&PolygonRecord> {
        let matches = match mode {
            ResolveMode::First => self.resolve_first(point).into_iter().collect(),
            ResolveMode::All => self.resolve_all(point),
        };

        debug!(
            "Resolve ({}, {}) mode={}: {} matches",
            point.lat,
            point.lng,
            mode,
            matches.len()
        );
        matches
    }

    pub fn records(&self) -> &[PolygonRecord] {
        &self.records
    }

    pub fn get(&self, position: usize) -> Option<&PolygonRecord> {
        self.records.get(position)
    }

    pub fn stats(&self) -> CatalogStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Data-quality warnings that do not stop a load
fn check_records(records: &[PolygonRecord]) {
    let mut seen = HashSet::new();

    for record in records.iter().filter(|r| !r.is_degraded()) {
        if let Some(id) = &record.id {
            if !seen.insert(id) {
                warn!("Duplicate place id {} in catalog", id);
            }
        }

        // A box narrower than the ring makes the prefilter reject interior points
        if let Some(extent) = record.vertex_bounds() {
            if !record.bounding_box.covers(&extent) {
                warn!(
                    "Bounding box of {:?} does not cover its polygon ({:?} vs {:?})",
                    record.display_name, record.bounding_box, extent
                );
            }
        }
    }
}
