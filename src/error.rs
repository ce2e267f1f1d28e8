//! Error types for catalog construction and loading.

use thiserror::Error;

use crate::models::PlaceId;

/// Errors raised while turning raw source records into a catalog.
///
/// "No polygon contains this point" is not represented here: resolution
/// returns an empty result for that case.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A Polygon entry carried a missing or non-numeric field
    #[error("malformed `{field}` in polygon record: {value}")]
    DataFormat { field: &'static str, value: String },

    /// The outer ring has too few vertices to enclose anything
    #[error("polygon {id:?} has only {vertices} vertices")]
    EmptyPolygon { id: Option<PlaceId>, vertices: usize },

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn data_format(field: &'static str, value: impl ToString) -> Self {
        CatalogError::DataFormat {
            field,
            value: value.to_string(),
        }
    }
}
