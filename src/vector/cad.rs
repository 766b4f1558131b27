use std::path::Path;

use anyhow::{Context, Result};
use dxf::entities::{Entity, EntityType, Line};
use dxf::enums::AcadVersion;
use dxf::Drawing;
use serde::Serialize;
use tracing::{info, warn};

use crate::models::SkippedItem;
use crate::vector::svg::{Segment, VectorDocument};

/// Outcome of a DXF conversion
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CadReport {
    /// LINE entities written to model space
    pub entities: usize,
    /// Segments the vector document parsed into
    pub parsed_segments: usize,
    /// Path commands the parser could not use
    pub rejected: Vec<SkippedItem>,
    /// Parsed segments that could not become a line entity
    pub failed: Vec<SkippedItem>,
}

impl CadReport {
    pub fn skipped_count(&self) -> usize {
        self.rejected.len() + self.failed.len()
    }
}

/// Re-parse an SVG file and write its segments as DXF line entities
pub fn svg_to_dxf(svg_path: &Path, dxf_path: &Path) -> Result<CadReport> {
    let document = VectorDocument::read(svg_path)?;
    write_dxf(&document, dxf_path)
}

/// Write a DXF drawing for a parsed document. An empty drawing is still written.
pub fn write_dxf(document: &VectorDocument, dxf_path: &Path) -> Result<CadReport> {
    let (mut drawing, report) = build_drawing(document);
    drawing
        .save_file(dxf_path)
        .with_context(|| format!("Failed to save DXF drawing {}", dxf_path.display()))?;

    info!(
        "Wrote {} line entities to {} ({} skipped)",
        report.entities,
        dxf_path.display(),
        report.skipped_count()
    );
    Ok(report)
}

/// Flatten every segment of every path into one LINE entity.
///
/// Curves and arcs are replaced by their chord. A segment that cannot be
/// converted is logged and counted; it never aborts the drawing.
pub fn build_drawing(document: &VectorDocument) -> (Drawing, CadReport) {
    let mut drawing = Drawing::new();
    drawing.header.version = AcadVersion::R2010;

    let mut report = CadReport::default();
    for (path_idx, path) in document.paths.iter().enumerate() {
        report.rejected.extend(path.rejected.iter().cloned());
        for (seg_idx, segment) in path.segments.iter().enumerate() {
            report.parsed_segments += 1;
            match segment_to_line(segment) {
                Ok(line) => {
                    drawing.add_entity(Entity::new(EntityType::Line(line)));
                    report.entities += 1;
                }
                Err(e) => {
                    warn!(
                        "Skipping {} segment {} of path {}: {}",
                        segment.kind(),
                        seg_idx,
                        path_idx,
                        e
                    );
                    report
                        .failed
                        .push(SkippedItem::new(path_idx, Some(seg_idx), e.to_string()));
                }
            }
        }
    }

    (drawing, report)
}

/// Chord from the segment's start to its end
fn segment_to_line(segment: &Segment) -> Result<Line> {
    let start = segment.start();
    let end = segment.end();
    if !start.is_finite() || !end.is_finite() {
        anyhow::bail!(
            "non-finite coordinates ({}, {}) -> ({}, {})",
            start.x,
            start.y,
            end.x,
            end.y
        );
    }
    Ok(Line::new(
        dxf::Point::new(start.x, start.y, 0.0),
        dxf::Point::new(end.x, end.y, 0.0),
    ))
}
