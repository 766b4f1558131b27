//! Path set → SVG file → parsed segments.

use vectorforge::vector::{write_svg, Segment, VectorDocument};
use vectorforge::{LineSegment, Path, PathSet, Point2};

fn polyline(points: &[(f64, f64)]) -> Path {
    Path::new(
        points
            .windows(2)
            .map(|w| LineSegment::new(Point2::new(w[0].0, w[0].1), Point2::new(w[1].0, w[1].1)))
            .collect(),
    )
}

#[test]
fn test_line_segments_survive_round_trip() -> anyhow::Result<()> {
    let paths = PathSet::new(vec![
        polyline(&[(0.0, 0.0), (10.0, -0.1), (1.0 / 3.0, -2.0 / 3.0), (0.0, 0.0)]),
        polyline(&[(-12345.678, 1e-7), (98765.4321, -0.000123), (2.5e10, -3.0)]),
        polyline(&[(5.0, -5.0), (6.0, -5.0)]),
    ]);

    let dir = tempfile::tempdir()?;
    let svg = dir.path().join("paths.svg");
    write_svg(&paths, &svg)?;

    let document = VectorDocument::read(&svg)?;
    assert_eq!(document.paths.len(), paths.len());
    assert_eq!(document.rejected_count(), 0);

    for (original, parsed) in paths.paths.iter().zip(&document.paths) {
        assert_eq!(original.segments.len(), parsed.segments.len());
        for (expected, segment) in original.segments.iter().zip(&parsed.segments) {
            assert!(matches!(segment, Segment::Line { .. }));
            assert!(expected.start.approx_eq(&segment.start(), 1e-6));
            assert!(expected.end.approx_eq(&segment.end(), 1e-6));
        }
    }
    Ok(())
}

#[test]
fn test_svg_uses_only_move_and_line() -> anyhow::Result<()> {
    let paths = PathSet::new(vec![polyline(&[(0.0, 0.0), (4.0, 0.0), (4.0, -4.0)])]);
    let dir = tempfile::tempdir()?;
    let svg = dir.path().join("paths.svg");
    write_svg(&paths, &svg)?;

    let content = std::fs::read_to_string(&svg)?;
    let d_start = content.find(" d=\"").unwrap() + 4;
    let d_end = d_start + content[d_start..].find('"').unwrap();
    let commands: String = content[d_start..d_end]
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    assert_eq!(commands, "MLL");
    Ok(())
}

#[test]
fn test_write_to_missing_directory_fails() {
    let paths = PathSet::new(vec![polyline(&[(0.0, 0.0), (1.0, 1.0)])]);
    let result = write_svg(&paths, std::path::Path::new("/nonexistent/dir/out.svg"));
    assert!(result.is_err());
}
