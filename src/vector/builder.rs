use crate::models::{Contour, LineSegment, Path, PathSet, Point2};

/// Turn one contour into straight segments in drawing space.
///
/// Consecutive points become one segment each. Closed contours with at
/// least three points also get the segment back to their first point.
/// Returns `None` for contours that cannot form a single segment.
pub fn contour_to_path(contour: &Contour) -> Option<Path> {
    if contour.len() < 2 {
        return None;
    }

    let points: Vec<Point2> = contour.points.iter().map(|&p| Point2::from_pixel(p)).collect();
    let mut segments: Vec<LineSegment> = points
        .windows(2)
        .map(|pair| LineSegment::new(pair[0], pair[1]))
        .collect();

    if contour.closed && points.len() >= 3 {
        segments.push(LineSegment::new(points[points.len() - 1], points[0]));
    }

    Some(Path::new(segments))
}

/// Build the path set for a request, one path per usable contour
pub fn build_path_set(contours: &[Contour]) -> PathSet {
    PathSet::new(contours.iter().filter_map(contour_to_path).collect())
}
