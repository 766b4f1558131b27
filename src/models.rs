use serde::Serialize;

/// Integer pixel coordinate, origin top-left, y growing downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Drawing-space point, y growing upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Image space to drawing space: `(x, y) -> (x, -y)`.
    pub fn from_pixel(p: PixelPoint) -> Self {
        Self {
            x: f64::from(p.x),
            y: -f64::from(p.y),
        }
    }

    pub fn distance(&self, other: &Point2) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn approx_eq(&self, other: &Point2, tolerance: f64) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// A traced boundary in pixel space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contour {
    pub points: Vec<PixelPoint>,
    /// Traced borders are closed loops; the first point is not repeated
    pub closed: bool,
}

impl Contour {
    pub fn new(points: Vec<PixelPoint>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One straight segment of a path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LineSegment {
    pub start: Point2,
    pub end: Point2,
}

impl LineSegment {
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }
}

/// Ordered straight segments built from one contour.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Path {
    pub segments: Vec<LineSegment>,
}

impl Path {
    pub fn new(segments: Vec<LineSegment>) -> Self {
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        match (self.segments.first(), self.segments.last()) {
            (Some(first), Some(last)) => self.segments.len() >= 3 && first.start == last.end,
            _ => false,
        }
    }

    /// Path vertices in order; a closed path does not repeat its first vertex.
    pub fn vertices(&self) -> Vec<Point2> {
        let mut vertices: Vec<Point2> = self.segments.iter().map(|s| s.start).collect();
        if let Some(last) = self.segments.last() {
            if !self.is_closed() {
                vertices.push(last.end);
            }
        }
        vertices
    }
}

/// Every path traced for one request.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PathSet {
    pub paths: Vec<Path>,
}

impl PathSet {
    pub fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn segment_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }

    /// Bounding box of all segment endpoints as (min, max)
    pub fn bounds(&self) -> Option<(Point2, Point2)> {
        let mut points = self
            .paths
            .iter()
            .flat_map(|p| p.segments.iter())
            .flat_map(|s| [s.start, s.end]);
        let first = points.next()?;
        let (mut min, mut max) = (first, first);
        for p in points {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}

/// An item a stage could not process, reported instead of aborting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedItem {
    /// Which path/polygon the item belonged to
    pub source: usize,
    /// Position within that source, when meaningful
    pub index: Option<usize>,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(source: usize, index: Option<usize>, reason: impl Into<String>) -> Self {
        Self {
            source,
            index,
            reason: reason.into(),
        }
    }
}
