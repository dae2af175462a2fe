//! Ray-mesh intersection and world-space bounds.
//!
//! Rays are given in world space and moved into the mesh's local space through
//! the inverse of its transform, so meshes never have to be re-baked after a
//! placement change. Intersection uses the Moller-Trumbore algorithm and is
//! two-sided. Bounds are always recomputed from the current vertex buffer;
//! nothing here caches across a deformation.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::mesh::{DEGENERATE_AREA, Mesh};

/// Epsilon for floating point comparisons in ray intersection
const EPSILON: f32 = 1e-6;

/// Slack on the barycentric bounds so rays along a shared edge hit both sides
const EDGE_TOLERANCE: f32 = 1e-5;

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// A ray hit on a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshHit {
    /// World-space hit position
    pub point: Vec3,
    /// World-space geometric face normal (follows triangle winding)
    pub normal: Vec3,
    /// Triangle index
    pub face: u32,
    /// World-space distance from the ray origin
    pub distance: f32,
    /// Hit position in mesh-local space
    pub local_point: Vec3,
    /// Face normal in mesh-local space
    pub local_normal: Vec3,
    /// Barycentric weights (w, u, v) of the triangle corners
    pub barycentric: Vec3,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle in front of its origin. Both windings are accepted.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    let u = tvec.dot(pvec) * inv_det;
    if !(-EDGE_TOLERANCE..=1.0 + EDGE_TOLERANCE).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < -EDGE_TOLERANCE || u + v > 1.0 + EDGE_TOLERANCE {
        return None;
    }

    let t = edge2.dot(qvec) * inv_det;
    if t < EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Cast a world-space ray and return the nearest hit, if any.
pub fn raycast(origin: Vec3, direction: Vec3, mesh: &Mesh) -> Option<MeshHit> {
    let ray = LocalRay::new(origin, direction, mesh)?;

    let mut closest: Option<(u32, TriangleHit)> = None;
    for (face, hit) in triangle_hits(&ray, mesh) {
        if closest.is_none_or(|(_, best)| hit.t < best.t) {
            closest = Some((face, hit));
        }
    }

    closest.map(|(face, hit)| ray.to_mesh_hit(mesh, face, hit))
}

/// Cast a world-space ray and return every hit, nearest first.
pub fn raycast_all(origin: Vec3, direction: Vec3, mesh: &Mesh) -> Vec<MeshHit> {
    let Some(ray) = LocalRay::new(origin, direction, mesh) else {
        return Vec::new();
    };

    let mut hits: Vec<MeshHit> = triangle_hits(&ray, mesh)
        .map(|(face, hit)| ray.to_mesh_hit(mesh, face, hit))
        .collect();
    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    hits
}

/// World-space bounds of the transformed vertex set.
pub fn bounding_box(mesh: &Mesh) -> Aabb {
    Aabb::from_points(mesh.world_positions())
}

/// Bounds of the untransformed vertex set.
pub fn local_bounding_box(mesh: &Mesh) -> Aabb {
    Aabb::from_points(mesh.positions().iter().copied())
}

/// A world ray expressed in a mesh's local space.
struct LocalRay {
    world_origin: Vec3,
    world_dir: Vec3,
    origin: Vec3,
    dir: Vec3,
}

impl LocalRay {
    fn new(origin: Vec3, direction: Vec3, mesh: &Mesh) -> Option<Self> {
        let world_dir = direction.try_normalize()?;
        let inverse = mesh.transform.inverse_matrix()?;
        Some(Self {
            world_origin: origin,
            world_dir,
            origin: inverse.transform_point3(origin),
            dir: inverse.transform_vector3(world_dir),
        })
    }

    fn to_mesh_hit(&self, mesh: &Mesh, face: u32, hit: TriangleHit) -> MeshHit {
        let [v0, v1, v2] = mesh.triangle_positions(face as usize);
        let local_point = self.origin + self.dir * hit.t;
        let local_normal = (v1 - v0).cross(v2 - v0).normalize();

        let point = mesh.transform.transform_point(local_point);
        let normal = (mesh.transform.normal_matrix() * local_normal)
            .try_normalize()
            .unwrap_or(local_normal);

        MeshHit {
            point,
            normal,
            face,
            distance: (point - self.world_origin).dot(self.world_dir),
            local_point,
            local_normal,
            barycentric: Vec3::new(1.0 - hit.u - hit.v, hit.u, hit.v),
        }
    }
}

/// Every non-degenerate triangle the local ray passes through.
fn triangle_hits<'a>(
    ray: &'a LocalRay,
    mesh: &'a Mesh,
) -> impl Iterator<Item = (u32, TriangleHit)> + 'a {
    (0..mesh.triangle_count()).filter_map(move |face| {
        let [v0, v1, v2] = mesh.triangle_positions(face);
        if (v1 - v0).cross(v2 - v0).length_squared() <= DEGENERATE_AREA {
            return None;
        }
        ray_triangle_intersection(ray.origin, ray.dir, v0, v1, v2).map(|hit| (face as u32, hit))
    })
}
