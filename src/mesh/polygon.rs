use thiserror::Error;

use crate::models::{Contour, Point2};
use crate::vector::svg::{ParsedPath, Segment};

/// Why a boundary cannot be extruded
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PolygonError {
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("polygon has non-finite coordinates")]
    NonFinite,

    #[error("polygon has zero area")]
    ZeroArea,

    #[error("polygon edges {0} and {1} intersect")]
    SelfIntersecting(usize, usize),

    #[error("path contains a {0} segment; only straight lines can be extruded")]
    NonLineSegment(&'static str),

    #[error("path does not return to its starting point")]
    NotClosed,

    #[error("cap triangulation failed for {0}-vertex polygon")]
    Triangulation(usize),
}

/// Closed planar boundary in drawing space. The first vertex is not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub vertices: Vec<Point2>,
}

impl Polygon {
    /// Build a polygon, dropping an explicit closing vertex and consecutive duplicates
    pub fn new(mut vertices: Vec<Point2>) -> Self {
        vertices.dedup();
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self { vertices }
    }

    /// Polygon from a traced contour, placed in drawing space like its path
    pub fn from_contour(contour: &Contour) -> Self {
        Self::new(contour.points.iter().map(|&p| Point2::from_pixel(p)).collect())
    }

    /// One polygon per subpath of a re-parsed vector path.
    ///
    /// A subpath ends where a segment does not start at the previous end, or
    /// where the boundary returns to the subpath's first point. Subpaths that
    /// never close, or that contain curves, come back as errors.
    pub fn split_parsed_path(path: &ParsedPath) -> Vec<Result<Self, PolygonError>> {
        const EPS: f64 = 1e-9;

        let mut polygons = Vec::new();
        let mut run: Vec<&Segment> = Vec::new();
        for segment in &path.segments {
            if let Some(prev) = run.last() {
                if !segment.start().approx_eq(&prev.end(), EPS) {
                    polygons.push(Err(PolygonError::NotClosed));
                    run.clear();
                }
            }
            run.push(segment);
            if segment.end().approx_eq(&run[0].start(), EPS) {
                polygons.push(Self::from_closed_run(&run));
                run.clear();
            }
        }
        if !run.is_empty() {
            polygons.push(Err(PolygonError::NotClosed));
        }
        if polygons.is_empty() {
            polygons.push(Err(PolygonError::TooFewVertices(0)));
        }
        polygons
    }

    fn from_closed_run(run: &[&Segment]) -> Result<Self, PolygonError> {
        if let Some(curve) = run.iter().find(|s| !s.is_line()) {
            return Err(PolygonError::NonLineSegment(curve.kind()));
        }
        Ok(Self::new(run.iter().map(|s| s.start()).collect()))
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Shoelace area, positive for counter-clockwise winding
    pub fn signed_area(&self) -> f64 {
        let n = self.vertices.len();
        if n < 3 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.vertices[i];
                let b = self.vertices[(i + 1) % n];
                a.x * b.y - b.x * a.y
            })
            .sum::<f64>()
            / 2.0
    }

    pub fn perimeter(&self) -> f64 {
        let n = self.vertices.len();
        (0..n)
            .map(|i| self.vertices[i].distance(&self.vertices[(i + 1) % n]))
            .sum()
    }

    /// Same boundary, counter-clockwise
    pub fn into_ccw(mut self) -> Self {
        if self.signed_area() < 0.0 {
            self.vertices.reverse();
        }
        self
    }

    /// Chaikin corner cutting; each pass doubles the vertex count
    pub fn smoothed(&self, iterations: u32) -> Self {
        let mut vertices = self.vertices.clone();
        for _ in 0..iterations {
            let n = vertices.len();
            if n < 3 {
                break;
            }
            let mut next = Vec::with_capacity(n * 2);
            for i in 0..n {
                let a = vertices[i];
                let b = vertices[(i + 1) % n];
                next.push(Point2::new(0.75 * a.x + 0.25 * b.x, 0.75 * a.y + 0.25 * b.y));
                next.push(Point2::new(0.25 * a.x + 0.75 * b.x, 0.25 * a.y + 0.75 * b.y));
            }
            vertices = next;
        }
        Self::new(vertices)
    }

    /// Check the polygon can be capped and walled
    pub fn validate(&self) -> Result<(), PolygonError> {
        let n = self.vertices.len();
        if n < 3 {
            return Err(PolygonError::TooFewVertices(n));
        }
        if self.vertices.iter().any(|v| !v.is_finite()) {
            return Err(PolygonError::NonFinite);
        }
        // a crossing boundary can have its lobes cancel out to zero area
        if let Some((i, j)) = self.first_self_intersection() {
            return Err(PolygonError::SelfIntersecting(i, j));
        }
        if self.signed_area().abs() < 1e-9 {
            return Err(PolygonError::ZeroArea);
        }
        Ok(())
    }

    /// First pair of non-adjacent edges that touch or cross
    fn first_self_intersection(&self) -> Option<(usize, usize)> {
        let n = self.vertices.len();
        for i in 0..n {
            let a1 = self.vertices[i];
            let a2 = self.vertices[(i + 1) % n];
            for j in i + 2..n {
                // the last edge shares vertex 0 with the first
                if i == 0 && j == n - 1 {
                    continue;
                }
                let b1 = self.vertices[j];
                let b2 = self.vertices[(j + 1) % n];
                if segments_intersect(a1, a2, b1, b2) {
                    return Some((i, j));
                }
            }
        }
        None
    }
}

fn orientation(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

fn segments_intersect(p1: Point2, p2: Point2, q1: Point2, q2: Point2) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
