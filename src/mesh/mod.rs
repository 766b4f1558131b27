//! Polygon extrusion into closed solids and mesh export.

pub mod export;
pub mod extrude;
pub mod polygon;

pub use export::{write_mesh, write_obj, write_stl};
pub use extrude::{extrude_polygons, Face, FaceKind, Mesh, MeshReport, ProfileCandidate, Solid};
pub use polygon::{Polygon, PolygonError};
