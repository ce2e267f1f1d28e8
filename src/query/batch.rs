//! Batch lookups from a CSV of points.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use polycode::{LatLng, Locator, ResolveMode};

/// Input row: `lat,lng`
#[derive(Debug, Deserialize)]
struct PointRow {
    lat: f64,
    lng: f64,
}

/// Output row, one per match (or one with empty code when nothing matched)
#[derive(Debug, Serialize)]
struct CodeRow {
    lat: f64,
    lng: f64,
    place_id: Option<String>,
    code: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub points: usize,
    pub matched: usize,
}

/// Resolve every point in `input` and write the codes to `output`
pub fn run_batch<R: Read, W: Write>(
    locator: &Locator,
    input: R,
    output: W,
    mode: ResolveMode,
    progress: bool,
) -> Result<BatchSummary> {
    let mut reader = csv::Reader::from_reader(input);
    let points: Vec<PointRow> = reader
        .deserialize()
        .collect::<Result<_, _>>()
        .context("Failed to parse input points")?;

    info!("Resolving {} points (mode={})", points.len(), mode);

    let pb = if progress {
        ProgressBar::new(points.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    // The catalog is read-only, so queries fan out without locking
    let results: Vec<Vec<CodeRow>> = points
        .par_iter()
        .map(|row| {
            let codes = locator.locate(LatLng::new(row.lat, row.lng), mode);
            pb.inc(1);

            if codes.is_empty() {
                return vec![CodeRow {
                    lat: row.lat,
                    lng: row.lng,
                    place_id: None,
                    code: None,
                }];
            }
            codes
                .into_iter()
                .map(|c| CodeRow {
                    lat: row.lat,
                    lng: row.lng,
                    place_id: c.place_id.map(|id| id.to_string()),
                    code: Some(c.code),
                })
                .collect()
        })
        .collect();

    pb.finish_with_message("Batch complete");

    let mut writer = csv::Writer::from_writer(output);
    let mut summary = BatchSummary {
        points: points.len(),
        matched: 0,
    };
    for rows in results {
        if rows.iter().any(|r| r.code.is_some()) {
            summary.matched += 1;
        }
        for row in rows {
            writer.serialize(row)?;
        }
    }
    writer.flush()?;

    info!(
        "Batch done: {}/{} points matched",
        summary.matched, summary.points
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polycode::shortcode::GridOffsetEncoder;
    use polycode::{BoundingBox, Catalog, PlaceId, PolygonRecord};
    use std::sync::Arc;

    fn locator() -> Locator {
        let record = PolygonRecord::new(
            PlaceId::Int(1),
            "Harare",
            LatLng::new(-17.8, 31.0),
            BoundingBox::from_nominatim([-18.0, -17.6, 30.8, 31.2]),
            BoundingBox::from_nominatim([-18.0, -17.6, 30.8, 31.2]).ring(),
        );
        Locator::new(
            Arc::new(Catalog::new(vec![record])),
            Box::new(GridOffsetEncoder::new(0.1).unwrap()),
        )
    }

    #[test]
    fn test_batch_writes_codes_in_input_order() {
        let input = "lat,lng\n-17.8,31.0\n10.0,10.0\n-17.7,31.1\n";
        let mut output = Vec::new();

        let summary =
            run_batch(&locator(), input.as_bytes(), &mut output, ResolveMode::All, false).unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                points: 3,
                matched: 2
            }
        );

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "lat,lng,place_id,code");
        assert_eq!(lines[1], "-17.8,31.0,1,Harare.00");
        assert_eq!(lines[2], "10.0,10.0,,");
        assert!(lines[3].starts_with("-17.7,31.1,1,Harare."));
    }

    #[test]
    fn test_batch_rejects_bad_rows() {
        let input = "lat,lng\nnorth,31.0\n";
        let result = run_batch(&locator(), input.as_bytes(), Vec::new(), ResolveMode::First, false);
        assert!(result.is_err());
    }
}
