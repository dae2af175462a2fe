//! Wavefront OBJ, indexed vertices with optional named groups.
//!
//! Only geometry statements are read: `v`, `f`, `g` and `o`. Face corners may
//! carry texture and normal references (`a/b/c`, `a//c`), which are ignored;
//! normals are recomputed from the positions. Polygons are fan-triangulated
//! and negative indices count back from the most recent vertex.

use std::io::{self, Write};

use glam::Vec3;

use crate::error::ImportError;
use crate::mesh::{FaceGroup, Mesh, MeshData};

/// Parse OBJ text.
pub fn parse(bytes: &[u8]) -> Result<MeshData, ImportError> {
    let text =
        std::str::from_utf8(bytes).map_err(|_| ImportError::corrupt("OBJ is not valid UTF-8"))?;

    let mut positions: Vec<Vec3> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();
    let mut groups: Vec<FaceGroup> = Vec::new();
    let mut open_group: Option<String> = None;
    let mut group_start = 0u32;

    for (line_no, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default();
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("v") => {
                let coords: Vec<f32> = tokens
                    .take(3)
                    .map(|t| t.parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| bad_line(line_no, "vertex coordinate is not a number"))?;
                let &[x, y, z] = coords.as_slice() else {
                    return Err(bad_line(line_no, "vertex needs 3 coordinates"));
                };
                positions.push(Vec3::new(x, y, z));
            }
            Some("f") => {
                let corners = tokens
                    .map(|corner| resolve_corner(corner, positions.len(), line_no))
                    .collect::<Result<Vec<u32>, _>>()?;
                if corners.len() < 3 {
                    return Err(bad_line(line_no, "face needs at least 3 corners"));
                }
                for k in 1..corners.len() - 1 {
                    indices.extend([corners[0], corners[k], corners[k + 1]]);
                }
            }
            Some("g") | Some("o") => {
                let triangles = (indices.len() / 3) as u32;
                close_group(&mut groups, open_group.take(), group_start, triangles);
                let name = tokens.collect::<Vec<_>>().join(" ");
                open_group = Some(if name.is_empty() { "default".to_string() } else { name });
                group_start = triangles;
            }
            _ => {}
        }
    }
    close_group(
        &mut groups,
        open_group,
        group_start,
        (indices.len() / 3) as u32,
    );

    if positions.is_empty() || indices.is_empty() {
        return Err(ImportError::EmptyMesh);
    }
    // Positive indices may point forward, so they are range-checked at the end
    if let Some(index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(ImportError::corrupt(format!(
            "face index {} exceeds {} vertices",
            index + 1,
            positions.len()
        )));
    }

    Ok(MeshData {
        positions,
        normals: None,
        indices,
        groups,
    })
}

fn close_group(groups: &mut Vec<FaceGroup>, name: Option<String>, start: u32, end: u32) {
    match name {
        Some(name) if end > start => groups.push(FaceGroup {
            name,
            first_triangle: start,
            triangle_count: end - start,
        }),
        _ => {}
    }
}

/// Zero-based vertex index of one `a[/b[/c]]` corner.
fn resolve_corner(corner: &str, vertex_count: usize, line_no: usize) -> Result<u32, ImportError> {
    let position = corner.split('/').next().unwrap_or_default();
    let index: i64 = position
        .parse()
        .map_err(|_| bad_line(line_no, "face index is not an integer"))?;
    let resolved = match index {
        0 => return Err(bad_line(line_no, "face index 0 is invalid")),
        i if i > 0 => i - 1,
        i => vertex_count as i64 + i,
    };
    u32::try_from(resolved)
        .map_err(|_| bad_line(line_no, "relative face index before first vertex"))
}

fn bad_line(line_no: usize, message: &str) -> ImportError {
    ImportError::corrupt(format!("line {}: {message}", line_no + 1))
}

/// Write OBJ with per-vertex normals and the mesh's face groups.
pub fn write<W: Write>(
    mesh: &Mesh,
    positions: &[Vec3],
    normals: &[Vec3],
    writer: &mut W,
) -> io::Result<()> {
    writeln!(writer, "# Occlusal OBJ export")?;
    writeln!(
        writer,
        "# Vertices: {}, Triangles: {}",
        positions.len(),
        mesh.triangle_count()
    )?;
    writeln!(writer, "o {}", mesh.name())?;

    for v in positions {
        writeln!(writer, "v {:.6} {:.6} {:.6}", v.x, v.y, v.z)?;
    }
    for n in normals {
        writeln!(writer, "vn {:.6} {:.6} {:.6}", n.x, n.y, n.z)?;
    }

    let mut groups = mesh.groups().iter().peekable();
    for (face, tri) in mesh.indices().chunks_exact(3).enumerate() {
        if let Some(group) = groups.next_if(|g| g.first_triangle as usize == face) {
            writeln!(writer, "g {}", group.name)?;
        }
        let [a, b, c] = [tri[0] + 1, tri[1] + 1, tri[2] + 1];
        writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::MeshRole;

    const QUAD_AND_TRIANGLE: &str = "# two groups
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
vt 0 0
vn 0 1 0
g base plate
f 1/1/1 4/1/1 3/1/1 2/1/1
g cusp
v 0.5 1 0.5
f -1 1 2
";

    #[test]
    fn test_parse_groups_and_fans() {
        let data = parse(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(data.positions.len(), 5);
        assert_eq!(data.triangle_count(), 3);
        assert_eq!(data.indices[..6], [0, 3, 2, 0, 2, 1]);
        assert_eq!(data.indices[6..], [4, 0, 1]);
        assert_eq!(
            data.groups,
            vec![
                FaceGroup {
                    name: "base plate".into(),
                    first_triangle: 0,
                    triangle_count: 2
                },
                FaceGroup {
                    name: "cusp".into(),
                    first_triangle: 2,
                    triangle_count: 1
                },
            ]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse(b"v 0 0 0\n"), Err(ImportError::EmptyMesh));
        assert!(matches!(
            parse(b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 9\n"),
            Err(ImportError::CorruptData(_))
        ));
        assert!(matches!(
            parse(b"v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(ImportError::CorruptData(_))
        ));
        assert!(matches!(
            parse(b"v 0 zero 0\n"),
            Err(ImportError::CorruptData(_))
        ));
        assert!(matches!(
            parse(b"v 0 0 0\nf -4 1 1\n"),
            Err(ImportError::CorruptData(_))
        ));
    }

    #[test]
    fn test_write_keeps_groups() {
        let data = parse(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        let mesh = Mesh::from_data("scan", MeshRole::UpperArch, data).unwrap();
        let mut out = Vec::new();
        write(&mesh, mesh.positions(), mesh.normals(), &mut out).unwrap();

        let reparsed = parse(&out).unwrap();
        assert_eq!(reparsed.indices, mesh.indices());
        let names: Vec<_> = reparsed.groups.iter().map(|g| g.name.as_str()).collect();
        // the `o` line opens a group with no faces, which is dropped
        assert_eq!(names, ["base plate", "cusp"]);
    }
}
