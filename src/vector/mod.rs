//! Contour → path → SVG → DXF.

pub mod builder;
pub mod cad;
pub mod svg;

pub use builder::{build_path_set, contour_to_path};
pub use cad::{svg_to_dxf, CadReport};
pub use svg::{write_svg, ParsedPath, Segment, VectorDocument};
