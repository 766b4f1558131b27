use serde::Serialize;

use crate::mesh::polygon::{Polygon, PolygonError};
use crate::models::SkippedItem;

pub type Point3 = [f64; 3];

/// Three corners, counter-clockwise seen from outside the solid
pub type Triangle3 = [Point3; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceKind {
    BottomCap,
    TopCap,
    Side,
}

/// Planar face of a solid, vertices ordered counter-clockwise from outside
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub kind: FaceKind,
    pub vertices: Vec<Point3>,
}

/// A polygon swept straight up along +Z
#[derive(Debug, Clone, PartialEq)]
pub struct Solid {
    pub profile: Polygon,
    pub height: f64,
    /// Counter-clockwise cap triangles as indices into the profile
    cap: Vec<[usize; 3]>,
}

impl Solid {
    /// Extrude a validated profile. The profile is normalized counter-clockwise
    /// and its cap triangulated up front.
    pub fn new(profile: Polygon, height: f64) -> Result<Self, PolygonError> {
        profile.validate()?;
        let profile = profile.into_ccw();
        let cap = triangulate_cap(&profile)?;
        Ok(Self {
            profile,
            height,
            cap,
        })
    }

    pub fn cap_faces(&self) -> usize {
        2
    }

    pub fn side_faces(&self) -> usize {
        self.profile.len()
    }

    pub fn face_count(&self) -> usize {
        self.cap_faces() + self.side_faces()
    }

    /// Bottom cap, top cap, then one quad per profile edge
    pub fn faces(&self) -> Vec<Face> {
        let n = self.profile.len();
        let h = self.height;
        let at = |i: usize, z: f64| -> Point3 {
            let v = self.profile.vertices[i % n];
            [v.x, v.y, z]
        };

        let mut faces = Vec::with_capacity(n + 2);
        faces.push(Face {
            kind: FaceKind::BottomCap,
            vertices: (0..n).rev().map(|i| at(i, 0.0)).collect(),
        });
        faces.push(Face {
            kind: FaceKind::TopCap,
            vertices: (0..n).map(|i| at(i, h)).collect(),
        });
        for i in 0..n {
            faces.push(Face {
                kind: FaceKind::Side,
                vertices: vec![at(i, 0.0), at(i + 1, 0.0), at(i + 1, h), at(i, h)],
            });
        }
        faces
    }

    /// Both caps from the stored triangulation, then each side quad split in two
    pub fn triangles(&self) -> Vec<Triangle3> {
        let verts = &self.profile.vertices;
        let n = verts.len();
        let h = self.height;

        let mut triangles = Vec::with_capacity(self.cap.len() * 2 + n * 2);
        for &[a, b, c] in &self.cap {
            let (a, b, c) = (verts[a], verts[b], verts[c]);
            triangles.push([[a.x, a.y, h], [b.x, b.y, h], [c.x, c.y, h]]);
            triangles.push([[c.x, c.y, 0.0], [b.x, b.y, 0.0], [a.x, a.y, 0.0]]);
        }

        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let (a0, b0, b1, a1) = (
                [a.x, a.y, 0.0],
                [b.x, b.y, 0.0],
                [b.x, b.y, h],
                [a.x, a.y, h],
            );
            triangles.push([a0, b0, b1]);
            triangles.push([a0, b1, a1]);
        }

        triangles
    }
}

/// Ear-clip a profile into counter-clockwise index triangles
fn triangulate_cap(profile: &Polygon) -> Result<Vec<[usize; 3]>, PolygonError> {
    let verts = &profile.vertices;
    let n = verts.len();
    let coords: Vec<f64> = verts.iter().flat_map(|v| [v.x, v.y]).collect();
    let indices = earcutr::earcut(&coords, &[], 2).map_err(|_| PolygonError::Triangulation(n))?;
    if indices.len() < 3 {
        return Err(PolygonError::Triangulation(n));
    }

    Ok(indices
        .chunks_exact(3)
        .map(|tri| {
            let (a, b, c) = (verts[tri[0]], verts[tri[1]], verts[tri[2]]);
            // earcut does not promise a winding
            if (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x) < 0.0 {
                [tri[2], tri[1], tri[0]]
            } else {
                [tri[0], tri[1], tri[2]]
            }
        })
        .collect())
}

/// Union of extruded solids, kept as independent bodies
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub solids: Vec<Solid>,
}

impl Mesh {
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.solids.iter().map(Solid::face_count).sum()
    }

    pub fn triangles(&self) -> Vec<Triangle3> {
        self.solids.iter().flat_map(Solid::triangles).collect()
    }
}

/// Counts for an extrusion run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeshReport {
    pub solids: usize,
    pub faces: usize,
    pub triangles: usize,
    pub skipped: Vec<SkippedItem>,
}

/// A profile headed for extrusion and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileCandidate {
    /// Contour or path index
    pub source: usize,
    /// Subpath within the source, when the source can hold several
    pub part: Option<usize>,
    pub polygon: Result<Polygon, PolygonError>,
}

impl ProfileCandidate {
    pub fn new(source: usize, polygon: Result<Polygon, PolygonError>) -> Self {
        Self {
            source,
            part: None,
            polygon,
        }
    }

    pub fn with_part(mut self, part: usize) -> Self {
        self.part = Some(part);
        self
    }
}

/// Extrude every valid polygon; invalid ones are recorded and skipped.
///
/// `smoothing` runs that many corner-cutting passes on each profile first.
pub fn extrude_polygons(
    candidates: impl IntoIterator<Item = ProfileCandidate>,
    height: f64,
    smoothing: u32,
) -> (Mesh, Vec<SkippedItem>) {
    let mut mesh = Mesh::default();
    let mut skipped = Vec::new();

    for candidate in candidates {
        let solid = candidate
            .polygon
            .and_then(|p| Solid::new(p.smoothed(smoothing), height));
        match solid {
            Ok(solid) => mesh.solids.push(solid),
            Err(e) => {
                match candidate.part {
                    Some(part) => {
                        tracing::warn!("Skipping polygon {}.{}: {}", candidate.source, part, e)
                    }
                    None => tracing::warn!("Skipping polygon {}: {}", candidate.source, e),
                }
                skipped.push(SkippedItem::new(
                    candidate.source,
                    candidate.part,
                    e.to_string(),
                ));
            }
        }
    }

    (mesh, skipped)
}
