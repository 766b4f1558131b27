use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use stl_io::{Normal, Triangle, Vertex};

use crate::config::MeshFormat;
use crate::mesh::extrude::{Mesh, Triangle3};

/// Write the mesh in the requested format, returning the triangle count
pub fn write_mesh(mesh: &Mesh, format: MeshFormat, output: &Path) -> Result<usize> {
    match format {
        MeshFormat::Stl => write_stl(mesh, output),
        MeshFormat::Obj => write_obj(mesh, output),
    }
}

/// Binary STL with one facet per triangle
pub fn write_stl(mesh: &Mesh, output: &Path) -> Result<usize> {
    let triangles: Vec<Triangle> = mesh.triangles().iter().map(to_stl_triangle).collect();

    let file = File::create(output)
        .with_context(|| format!("Failed to create STL file {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter())
        .with_context(|| format!("Failed to write STL file {}", output.display()))?;
    writer.flush()?;

    Ok(triangles.len())
}

/// Wavefront OBJ, one object per solid with polygonal faces.
///
/// Each solid lists its bottom ring then its top ring once, and every face
/// indexes into those rings so neighbouring faces share vertices.
pub fn write_obj(mesh: &Mesh, output: &Path) -> Result<usize> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create OBJ file {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "# vectorforge extrusion")?;
    let mut offset = 1;
    let mut triangles = 0;
    for (idx, solid) in mesh.solids.iter().enumerate() {
        writeln!(writer, "o solid_{idx}")?;
        let n = solid.profile.len();
        for z in [0.0, solid.height] {
            for v in &solid.profile.vertices {
                writeln!(writer, "v {} {} {}", v.x, v.y, z)?;
            }
        }

        let bottom = |i: usize| offset + i % n;
        let top = |i: usize| offset + n + i % n;
        let mut faces: Vec<Vec<usize>> = Vec::with_capacity(n + 2);
        faces.push((0..n).rev().map(bottom).collect());
        faces.push((0..n).map(top).collect());
        for i in 0..n {
            faces.push(vec![bottom(i), bottom(i + 1), top(i + 1), top(i)]);
        }
        for face in &faces {
            let indices: Vec<String> = face.iter().map(|i| i.to_string()).collect();
            writeln!(writer, "f {}", indices.join(" "))?;
            triangles += face.len().saturating_sub(2);
        }
        offset += 2 * n;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write OBJ file {}", output.display()))?;

    Ok(triangles)
}

fn to_stl_triangle(tri: &Triangle3) -> Triangle {
    let [a, b, c] = *tri;
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    let unit = if len > 0.0 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 0.0]
    };

    let vertex = |p: [f64; 3]| Vertex::new([p[0] as f32, p[1] as f32, p[2] as f32]);
    Triangle {
        normal: Normal::new([unit[0] as f32, unit[1] as f32, unit[2] as f32]),
        vertices: [vertex(a), vertex(b), vertex(c)],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::mesh::extrude::Solid;
    use crate::mesh::polygon::Polygon;
    use crate::models::Point2;

    fn prism() -> Mesh {
        let profile = Polygon::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 3.0),
        ]);
        Mesh {
            solids: vec![Solid::new(profile, 2.0).unwrap()],
        }
    }

    #[test]
    fn stl_round_trips_through_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.stl");
        let written = write_stl(&prism(), &path).unwrap();
        assert_eq!(written, 8);

        let mut file = File::open(&path).unwrap();
        let stl = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(stl.faces.len(), 8);
        assert_eq!(stl.vertices.len(), 6);
    }

    #[test]
    fn obj_lists_caps_and_sides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.obj");
        let triangles = write_obj(&prism(), &path).unwrap();
        assert_eq!(triangles, 8);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("f ")).count(), 5);
        assert_eq!(content.lines().filter(|l| l.starts_with("v ")).count(), 6);
        assert!(content.contains("o solid_0"));
    }

    #[test]
    fn obj_faces_share_every_edge() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prism.obj");
        write_obj(&prism(), &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();

        let mut directed: HashMap<(usize, usize), usize> = HashMap::new();
        for line in content.lines().filter(|l| l.starts_with("f ")) {
            let face: Vec<usize> = line[2..]
                .split_whitespace()
                .map(|i| i.parse().unwrap())
                .collect();
            for i in 0..face.len() {
                *directed.entry((face[i], face[(i + 1) % face.len()])).or_default() += 1;
            }
        }

        // 3 bottom + 3 top + 3 vertical edges, each walked once in both directions
        assert_eq!(directed.len(), 9 * 2);
        for (&(a, b), &count) in &directed {
            assert_eq!(count, 1, "edge {a}-{b} repeated in one direction");
            assert_eq!(directed.get(&(b, a)), Some(&1), "edge {a}-{b} is a boundary edge");
        }
    }

    #[test]
    fn obj_indices_continue_across_solids() {
        let mut mesh = prism();
        mesh.solids.push(mesh.solids[0].clone());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two.obj");
        write_obj(&mesh, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().filter(|l| l.starts_with("v ")).count(), 12);
        let max_index = content
            .lines()
            .filter(|l| l.starts_with("f "))
            .flat_map(|l| l[2..].split_whitespace().map(|i| i.parse::<usize>().unwrap()))
            .max();
        assert_eq!(max_index, Some(12));
        assert!(content.lines().any(|l| l == "f 9 8 7"));
    }

    #[test]
    fn normals_are_unit_length() {
        let tri = to_stl_triangle(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
        assert_eq!(tri.normal[2], 1.0);
    }
}
