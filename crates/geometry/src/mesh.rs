//! Triangle mesh with owned buffers and a world transform.
//!
//! A [`Mesh`] keeps its position, normal and index buffers private so the
//! buffer invariants hold for its whole lifetime:
//! - positions and normals always have the same length
//! - the index count is a multiple of 3
//! - every index references an existing vertex
//!
//! Vertex *values* may be edited in place through [`Mesh::positions_mut`];
//! the vertex *count* only changes through a checked constructor.

use glam::{Mat3, Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::MeshError;

/// Squared cross-product length below which a triangle counts as degenerate
pub const DEGENERATE_AREA: f32 = 1e-12;

/// What a mesh represents in the appliance workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshRole {
    UpperArch,
    LowerArch,
    BiteRegistration,
    Restoration,
}

/// Translation, rotation and non-uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    /// Local-to-world matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// World-to-local matrix, `None` when a scale axis is zero
    pub fn inverse_matrix(&self) -> Option<Mat4> {
        let matrix = self.matrix();
        if matrix.determinant().abs() <= f32::EPSILON {
            return None;
        }
        Some(matrix.inverse())
    }

    /// Matrix that maps local normals to world normals (inverse transpose)
    pub fn normal_matrix(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix()).inverse().transpose()
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix().transform_point3(point)
    }
}

/// A named, contiguous range of triangles (OBJ `g`/`o` statements).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceGroup {
    pub name: String,
    pub first_triangle: u32,
    pub triangle_count: u32,
}

/// Raw buffers produced by importers and primitive builders.
///
/// Not yet validated; turn into a [`Mesh`] with [`Mesh::from_data`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<Vec3>,
    /// Per-vertex normals, computed on construction when absent
    pub normals: Option<Vec<Vec3>>,
    pub indices: Vec<u32>,
    pub groups: Vec<FaceGroup>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Move every position by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        for position in &mut self.positions {
            *position += offset;
        }
    }

    /// Append another buffer set, rebasing its indices and groups.
    ///
    /// Normals are dropped unless both sides carry them.
    pub fn append(&mut self, other: MeshData) {
        let base_vertex = self.positions.len() as u32;
        let base_triangle = self.triangle_count() as u32;

        self.normals = match (self.normals.take(), other.normals) {
            (Some(mut ours), Some(theirs)) => {
                ours.extend(theirs);
                Some(ours)
            }
            _ => None,
        };
        self.positions.extend(other.positions);
        self.indices
            .extend(other.indices.into_iter().map(|index| index + base_vertex));
        self.groups.extend(other.groups.into_iter().map(|group| FaceGroup {
            first_triangle: group.first_triangle + base_triangle,
            ..group
        }));
    }
}

/// Packed vertex layout a renderer uploads directly.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Triangle mesh owned by the mesh store.
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    role: MeshRole,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    groups: Vec<FaceGroup>,
    /// Local-to-world placement
    pub transform: Transform,
    pub visible: bool,
    /// Whether brush strokes may target this mesh
    pub editable: bool,
}

impl Mesh {
    /// Validate raw buffers and build a mesh.
    ///
    /// Restoration meshes start editable; everything else starts read-only.
    pub fn from_data(
        name: impl Into<String>,
        role: MeshRole,
        data: MeshData,
    ) -> Result<Self, MeshError> {
        let MeshData {
            positions,
            normals,
            indices,
            groups,
        } = data;

        if indices.len() % 3 != 0 {
            return Err(MeshError::IndexCount(indices.len()));
        }
        if let Some(index) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(MeshError::IndexOutOfRange {
                index: *index,
                vertex_count: positions.len(),
            });
        }
        if let Some(bad) = positions.iter().position(|p| !p.is_finite()) {
            return Err(MeshError::NonFinite(bad));
        }
        let triangles = indices.len() / 3;
        if let Some(group) = groups
            .iter()
            .find(|g| (g.first_triangle as usize + g.triangle_count as usize) > triangles)
        {
            return Err(MeshError::GroupRange {
                name: group.name.clone(),
                triangles,
            });
        }

        let mut mesh = Self {
            name: name.into(),
            role,
            normals: Vec::new(),
            positions,
            indices,
            groups,
            transform: Transform::IDENTITY,
            visible: true,
            editable: role == MeshRole::Restoration,
        };

        match normals {
            Some(normals) if normals.len() == mesh.positions.len() => {
                mesh.normals = normals
                    .into_iter()
                    .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
                    .collect();
            }
            Some(normals) => {
                return Err(MeshError::NormalCount {
                    expected: mesh.positions.len(),
                    found: normals.len(),
                });
            }
            None => {
                mesh.normals = vec![Vec3::Y; mesh.positions.len()];
                mesh.recompute_normals();
            }
        }

        Ok(mesh)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn role(&self) -> MeshRole {
        self.role
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Positions for in-place editing; the slice length is fixed
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn groups(&self) -> &[FaceGroup] {
        &self.groups
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex indices of one triangle
    pub fn triangle(&self, face: usize) -> [u32; 3] {
        let base = face * 3;
        [
            self.indices[base],
            self.indices[base + 1],
            self.indices[base + 2],
        ]
    }

    /// Local-space corners of one triangle
    pub fn triangle_positions(&self, face: usize) -> [Vec3; 3] {
        self.triangle(face).map(|i| self.positions[i as usize])
    }

    /// Replace every position at once, keeping the vertex count.
    pub fn set_positions(&mut self, positions: &[Vec3]) -> Result<(), MeshError> {
        if positions.len() != self.positions.len() {
            return Err(MeshError::PositionCount {
                expected: self.positions.len(),
                found: positions.len(),
            });
        }
        self.positions.copy_from_slice(positions);
        Ok(())
    }

    /// Area-weighted vertex normals from the current positions.
    ///
    /// Vertices with no incident area keep an up-facing normal.
    pub fn recompute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.positions.len()];
        for face in self.indices.chunks_exact(3) {
            let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
            let weighted = (self.positions[b] - self.positions[a])
                .cross(self.positions[c] - self.positions[a]);
            accumulated[a] += weighted;
            accumulated[b] += weighted;
            accumulated[c] += weighted;
        }
        self.normals = accumulated
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }

    /// Positions transformed into world space
    pub fn world_positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        let matrix = self.transform.matrix();
        self.positions.iter().map(move |p| matrix.transform_point3(*p))
    }

    /// Mean of the local vertex positions
    pub fn local_centroid(&self) -> Vec3 {
        if self.positions.is_empty() {
            return Vec3::ZERO;
        }
        self.positions.iter().copied().sum::<Vec3>() / self.positions.len() as f32
    }

    /// Interleaved position/normal vertices in local space
    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .map(|(p, n)| GpuVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect()
    }

    /// Vertex buffer bytes ready for upload
    pub fn vertex_bytes(&self) -> Vec<u8> {
        bytemuck::cast_slice(&self.gpu_vertices()).to_vec()
    }

    /// Index buffer bytes ready for upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;

    fn triangle_data() -> MeshData {
        MeshData {
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            normals: None,
            indices: vec![0, 2, 1],
            groups: Vec::new(),
        }
    }

    #[test]
    fn test_normals_are_computed() {
        let mesh = Mesh::from_data("tri", MeshRole::LowerArch, triangle_data()).unwrap();
        assert_eq!(mesh.normals().len(), mesh.positions().len());
        for normal in mesh.normals() {
            assert!((*normal - Vec3::Y).length() < 1e-6);
        }
        assert!(!mesh.editable);
    }

    #[test]
    fn test_restoration_starts_editable() {
        let mesh = Mesh::from_data("pad", MeshRole::Restoration, triangle_data()).unwrap();
        assert!(mesh.editable);
        assert!(mesh.visible);
    }

    #[test]
    fn test_rejects_bad_indices() {
        let mut data = triangle_data();
        data.indices = vec![0, 1, 3];
        assert_eq!(
            Mesh::from_data("bad", MeshRole::UpperArch, data).unwrap_err(),
            MeshError::IndexOutOfRange {
                index: 3,
                vertex_count: 3
            }
        );

        let mut data = triangle_data();
        data.indices = vec![0, 1];
        assert_eq!(
            Mesh::from_data("bad", MeshRole::UpperArch, data).unwrap_err(),
            MeshError::IndexCount(2)
        );
    }

    #[test]
    fn test_rejects_mismatched_normals() {
        let mut data = triangle_data();
        data.normals = Some(vec![Vec3::Y]);
        assert!(matches!(
            Mesh::from_data("bad", MeshRole::UpperArch, data),
            Err(MeshError::NormalCount { .. })
        ));
    }

    #[test]
    fn test_set_positions_keeps_count() {
        let mut mesh = Mesh::from_data("tri", MeshRole::Restoration, triangle_data()).unwrap();
        assert!(mesh.set_positions(&[Vec3::ZERO]).is_err());
        mesh.set_positions(&[Vec3::ONE, Vec3::X, Vec3::Z]).unwrap();
        assert_eq!(mesh.positions()[0], Vec3::ONE);
    }

    #[test]
    fn test_cuboid_normals_point_outward() {
        let mesh = Mesh::from_data(
            "box",
            MeshRole::LowerArch,
            cuboid(Vec3::splat(-1.0), Vec3::splat(1.0)),
        )
        .unwrap();
        for (position, normal) in mesh.positions().iter().zip(mesh.normals()) {
            assert!(position.dot(*normal) > 0.0);
        }
    }

    #[test]
    fn test_transform_round_trip() {
        let transform = Transform {
            translation: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_rotation_y(0.5),
            scale: Vec3::new(2.0, 1.0, 0.5),
        };
        let point = Vec3::new(0.3, -0.7, 1.1);
        let world = transform.transform_point(point);
        let back = transform.inverse_matrix().unwrap().transform_point3(world);
        assert!((back - point).length() < 1e-5);

        let flat = Transform {
            scale: Vec3::new(1.0, 0.0, 1.0),
            ..Transform::IDENTITY
        };
        assert!(flat.inverse_matrix().is_none());
    }

    #[test]
    fn test_gpu_buffers() {
        let mesh = Mesh::from_data("tri", MeshRole::LowerArch, triangle_data()).unwrap();
        assert_eq!(
            mesh.vertex_bytes().len(),
            3 * std::mem::size_of::<GpuVertex>()
        );
        assert_eq!(mesh.index_bytes().len(), 3 * 4);
    }

    #[test]
    fn test_append_rebases_indices() {
        let mut data = triangle_data();
        let mut other = triangle_data();
        other.groups.push(FaceGroup {
            name: "second".into(),
            first_triangle: 0,
            triangle_count: 1,
        });
        data.append(other);
        assert_eq!(data.indices, vec![0, 2, 1, 3, 5, 4]);
        assert_eq!(data.groups[0].first_triangle, 1);
    }
}
