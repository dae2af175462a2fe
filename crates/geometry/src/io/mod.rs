//! Mesh interchange: STL (triangle soup) and OBJ (indexed vertices).
//!
//! Import takes raw bytes and an optional format hint. With a hint only that
//! parser runs. Without one the indexed parser is tried first, then the
//! triangle-soup parser, and only when both reject the bytes does import
//! report [`ImportError::UnsupportedFormat`].

pub mod obj;
pub mod stl;

use std::io::{self, Write};
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ImportError;
use crate::mesh::{Mesh, MeshData};

/// Importable interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshFormat {
    Stl,
    Obj,
}

impl MeshFormat {
    /// Format for a file extension, case-insensitive
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    StlBinary,
    StlAscii,
    Obj,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::StlBinary | Self::StlAscii => "stl",
            Self::Obj => "obj",
        }
    }
}

/// Coordinate space of exported vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSpace {
    /// Apply the mesh transform, as placed in the scene
    #[default]
    World,
    /// Raw local vertex buffer
    Local,
}

/// Parse mesh bytes, inferring the format when no hint is given.
pub fn import(bytes: &[u8], format: Option<MeshFormat>) -> Result<MeshData, ImportError> {
    match format {
        Some(MeshFormat::Stl) => stl::parse(bytes),
        Some(MeshFormat::Obj) => obj::parse(bytes),
        None => match obj::parse(bytes) {
            Ok(data) => Ok(data),
            Err(obj_err) => {
                debug!("OBJ parse failed ({}), falling back to STL", obj_err);
                stl::parse(bytes).map_err(|stl_err| {
                    debug!("STL parse failed ({})", stl_err);
                    ImportError::UnsupportedFormat
                })
            }
        },
    }
}

/// Serialize a mesh into a byte buffer.
pub fn export(mesh: &Mesh, format: ExportFormat, space: ExportSpace) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    export_to(mesh, format, space, &mut buffer)?;
    Ok(buffer)
}

/// Serialize a mesh into any writer.
pub fn export_to<W: Write>(
    mesh: &Mesh,
    format: ExportFormat,
    space: ExportSpace,
    writer: &mut W,
) -> io::Result<()> {
    let (positions, normals) = export_buffers(mesh, space);
    match format {
        ExportFormat::StlBinary => {
            stl::write_binary(mesh.name(), &positions, mesh.indices(), writer)
        }
        ExportFormat::StlAscii => {
            stl::write_ascii(mesh.name(), &positions, mesh.indices(), writer)
        }
        ExportFormat::Obj => obj::write(mesh, &positions, &normals, writer),
    }
}

fn export_buffers(mesh: &Mesh, space: ExportSpace) -> (Vec<Vec3>, Vec<Vec3>) {
    match space {
        ExportSpace::Local => (mesh.positions().to_vec(), mesh.normals().to_vec()),
        ExportSpace::World => {
            let normal_matrix = mesh.transform.normal_matrix();
            let normals = mesh
                .normals()
                .iter()
                .map(|n| (normal_matrix * *n).try_normalize().unwrap_or(*n))
                .collect();
            (mesh.world_positions().collect(), normals)
        }
    }
}

/// Unit facet normal from corner winding, up-facing for degenerate facets
pub(crate) fn facet_normal(v0: Vec3, v1: Vec3, v2: Vec3) -> Vec3 {
    (v1 - v0).cross(v2 - v0).try_normalize().unwrap_or(Vec3::Y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{MeshRole, Transform};
    use crate::primitives::cuboid;

    fn placed_box() -> Mesh {
        let mut mesh = Mesh::from_data(
            "box",
            MeshRole::Restoration,
            cuboid(Vec3::splat(-1.0), Vec3::splat(1.0)),
        )
        .unwrap();
        mesh.transform = Transform::from_translation(Vec3::new(0.0, 5.0, 0.0));
        mesh
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(MeshFormat::from_extension("STL"), Some(MeshFormat::Stl));
        assert_eq!(
            MeshFormat::from_path(Path::new("scans/upper.obj")),
            Some(MeshFormat::Obj)
        );
        assert_eq!(MeshFormat::from_path(Path::new("scan.ply")), None);
    }

    #[test]
    fn test_fallback_detects_both_formats() {
        let mesh = placed_box();
        for format in [ExportFormat::StlBinary, ExportFormat::StlAscii, ExportFormat::Obj] {
            let bytes = export(&mesh, format, ExportSpace::Local).unwrap();
            let data = import(&bytes, None).unwrap();
            assert_eq!(data.triangle_count(), 12, "{format:?}");
        }
    }

    #[test]
    fn test_unrecognized_bytes() {
        assert_eq!(
            import(b"hello world", None).unwrap_err(),
            ImportError::UnsupportedFormat
        );
        assert_eq!(
            import(&[0xff, 0xfe, 0x00, 0x01], None).unwrap_err(),
            ImportError::UnsupportedFormat
        );
    }

    #[test]
    fn test_explicit_format_reports_parser_error() {
        assert_eq!(
            import(b"# only a comment\n", Some(MeshFormat::Obj)).unwrap_err(),
            ImportError::EmptyMesh
        );
        // header claims two facets but carries none
        let mut truncated = vec![0u8; 84];
        truncated[80] = 2;
        assert!(matches!(
            import(&truncated, Some(MeshFormat::Stl)).unwrap_err(),
            ImportError::CorruptData(_)
        ));
    }

    #[test]
    fn test_world_space_export() {
        let mesh = placed_box();
        let bytes = export(&mesh, ExportFormat::Obj, ExportSpace::World).unwrap();
        let data = import(&bytes, Some(MeshFormat::Obj)).unwrap();
        let max_y = data.positions.iter().map(|p| p.y).fold(f32::MIN, f32::max);
        assert!((max_y - 6.0).abs() < 1e-5);
    }
}
