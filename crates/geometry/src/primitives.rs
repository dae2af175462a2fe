//! Procedural meshes: boxes and tapered elliptical cylinders.
//!
//! All primitives are centered on the local origin with outward-facing,
//! counter-clockwise winding.

use std::f32::consts::TAU;

use glam::{Vec2, Vec3};

use crate::mesh::MeshData;

/// Closed box spanning `min..max` with 8 shared corners.
pub fn cuboid(min: Vec3, max: Vec3) -> MeshData {
    // Corner `i` takes max on X when bit 0 is set, Y for bit 1, Z for bit 2
    let positions = (0..8)
        .map(|i| {
            Vec3::new(
                if i & 1 != 0 { max.x } else { min.x },
                if i & 2 != 0 { max.y } else { min.y },
                if i & 4 != 0 { max.z } else { min.z },
            )
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 4, 6,  0, 6, 2, // -X
        1, 3, 7,  1, 7, 5, // +X
        0, 1, 5,  0, 5, 4, // -Y
        2, 6, 7,  2, 7, 3, // +Y
        0, 2, 3,  0, 3, 1, // -Z
        4, 5, 7,  4, 7, 6, // +Z
    ];

    MeshData {
        positions,
        normals: None,
        indices,
        groups: Vec::new(),
    }
}

/// Shape of a capped cylinder whose cross-section is an ellipse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CylinderSpec {
    /// Semi-axes (X, Z) of the top rim
    pub top_radius: Vec2,
    /// Semi-axes (X, Z) of the bottom rim
    pub bottom_radius: Vec2,
    pub height: f32,
    pub radial_segments: u32,
    pub height_segments: u32,
    /// Concentric rings between the top rim and the top center
    pub cap_rings: u32,
}

impl CylinderSpec {
    pub fn vertex_count(&self) -> usize {
        let radial = self.radial_segments as usize;
        radial * (self.height_segments as usize + 1) + radial * self.cap_rings as usize + 2
    }
}

/// Capped cylinder spanning `-height/2..height/2` on Y.
///
/// Vertex layout: side rings bottom to top, then the top-cap rings from the
/// rim inward, then the top center, then the bottom center.
pub fn tapered_cylinder(spec: &CylinderSpec) -> MeshData {
    let radial = spec.radial_segments.max(3);
    let rows = spec.height_segments.max(1);
    let rings = spec.cap_rings;
    let half = spec.height * 0.5;

    let ring = |radius: Vec2, y: f32| {
        (0..radial).map(move |i| {
            let angle = TAU * i as f32 / radial as f32;
            Vec3::new(radius.x * angle.cos(), y, radius.y * angle.sin())
        })
    };

    let mut positions = Vec::with_capacity(spec.vertex_count());
    for row in 0..=rows {
        let t = row as f32 / rows as f32;
        let radius = spec.bottom_radius.lerp(spec.top_radius, t);
        positions.extend(ring(radius, -half + spec.height * t));
    }
    for cap in 1..=rings {
        let scale = (rings + 1 - cap) as f32 / (rings + 1) as f32;
        positions.extend(ring(spec.top_radius * scale, half));
    }
    let top_center = positions.len() as u32;
    positions.push(Vec3::new(0.0, half, 0.0));
    let bottom_center = positions.len() as u32;
    positions.push(Vec3::new(0.0, -half, 0.0));

    let at = |ring_index: u32, i: u32| ring_index * radial + i % radial;
    let mut indices = Vec::new();

    for row in 0..rows {
        for i in 0..radial {
            let a = at(row, i);
            let b = at(row, i + 1);
            let c = at(row + 1, i + 1);
            let d = at(row + 1, i);
            indices.extend([a, c, b, a, d, c]);
        }
    }

    // Top cap: rim ring, then each inner ring, then a fan to the center
    let mut outer = rows;
    for cap in 1..=rings {
        let inner = rows + cap;
        for i in 0..radial {
            let (q0, q1) = (at(inner, i), at(inner, i + 1));
            let (p0, p1) = (at(outer, i), at(outer, i + 1));
            indices.extend([q0, q1, p1, q0, p1, p0]);
        }
        outer = inner;
    }
    for i in 0..radial {
        indices.extend([top_center, at(outer, i + 1), at(outer, i)]);
    }

    for i in 0..radial {
        indices.extend([bottom_center, at(0, i), at(0, i + 1)]);
    }

    MeshData {
        positions,
        normals: None,
        indices,
        groups: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Mesh, MeshRole};
    use crate::spatial::{local_bounding_box, raycast};

    fn pad_spec() -> CylinderSpec {
        CylinderSpec {
            top_radius: Vec2::new(2.0, 3.0),
            bottom_radius: Vec2::new(1.6, 2.4),
            height: 7.0,
            radial_segments: 16,
            height_segments: 4,
            cap_rings: 2,
        }
    }

    #[test]
    fn test_cylinder_counts() {
        let spec = pad_spec();
        let data = tapered_cylinder(&spec);
        assert_eq!(data.positions.len(), spec.vertex_count());
        assert_eq!(data.positions.len(), 114);
        assert_eq!(data.triangle_count(), 224);
    }

    #[test]
    fn test_cylinder_bounds_and_taper() {
        let mesh = Mesh::from_data("pad", MeshRole::Restoration, tapered_cylinder(&pad_spec()))
            .unwrap();
        let bounds = local_bounding_box(&mesh);
        assert!((bounds.min.y + 3.5).abs() < 1e-5);
        assert!((bounds.max.y - 3.5).abs() < 1e-5);
        assert!((bounds.max.x - 2.0).abs() < 1e-5);
        assert!((bounds.max.z - 3.0).abs() < 1e-3);

        let bottom_ring_x = mesh.positions()[0].x;
        assert!((bottom_ring_x - 1.6).abs() < 1e-5);
    }

    #[test]
    fn test_cylinder_is_closed_from_every_side() {
        let mesh = Mesh::from_data("pad", MeshRole::Restoration, tapered_cylinder(&pad_spec()))
            .unwrap();
        let top = raycast(Vec3::new(0.3, 10.0, 0.2), Vec3::NEG_Y, &mesh).unwrap();
        assert!((top.point.y - 3.5).abs() < 1e-4);
        assert!(top.normal.y > 0.99);

        let bottom = raycast(Vec3::new(0.3, -10.0, 0.2), Vec3::Y, &mesh).unwrap();
        assert!(bottom.normal.y < -0.99);

        let side = raycast(Vec3::new(10.0, 0.0, 0.1), Vec3::NEG_X, &mesh).unwrap();
        assert!(side.normal.x > 0.9);
    }

    #[test]
    fn test_cuboid_counts() {
        let data = cuboid(Vec3::ZERO, Vec3::ONE);
        assert_eq!(data.positions.len(), 8);
        assert_eq!(data.triangle_count(), 12);
    }
}
