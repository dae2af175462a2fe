//! Brush engine: turns a world ray and a brush configuration into one dab.
//!
//! The ray is cast against the target mesh only. The dab is applied in the
//! mesh's local space, so the radius and displacement are measured in local
//! units; restoration meshes carry unit scale, where the two coincide.

use geometry::{Mesh, MeshHit, raycast};
use glam::Vec3;
use tracing::{debug, trace};

use crate::deformation::{DabInfo, DeformationResult, apply_deformation};
use crate::types::BrushConfig;

/// Cast the ray at `mesh` and apply one dab where it lands.
///
/// Returns whether any vertex moved. An inactive brush or a missed ray leaves
/// the mesh untouched.
pub fn apply_stroke(
    mesh: &mut Mesh,
    ray_origin: Vec3,
    ray_dir: Vec3,
    config: &BrushConfig,
) -> bool {
    if !config.is_active() {
        trace!("Brush inactive (radius {}, strength {})", config.radius, config.strength);
        return false;
    }
    let Some(hit) = raycast(ray_origin, ray_dir, mesh) else {
        trace!("Brush ray missed {}", mesh.name());
        return false;
    };
    apply_at_hit(mesh, &hit, ray_dir, config).modified()
}

/// Apply one dab centred on an existing hit of `mesh`.
///
/// Normals are recomputed for the whole mesh when anything moved.
pub fn apply_at_hit(
    mesh: &mut Mesh,
    hit: &MeshHit,
    ray_dir: Vec3,
    config: &BrushConfig,
) -> DeformationResult {
    if !config.is_active() {
        return DeformationResult::default();
    }

    // Face the incoming ray; world and local normals share the sign of the dot
    let normal = if hit.normal.dot(ray_dir) > 0.0 {
        -hit.local_normal
    } else {
        hit.local_normal
    };

    let dab = DabInfo {
        position: hit.local_point,
        normal,
        radius: config.radius,
        strength: config.strength,
        falloff: config.falloff,
        sign: config.mode.sign(),
    };

    let normals = mesh.normals().to_vec();
    let result = apply_deformation(mesh.positions_mut(), &normals, &dab, config.operation);

    if result.modified() {
        mesh.recompute_normals();
        debug!(
            "{:?} dab on {} moved {} vertices",
            config.operation,
            mesh.name(),
            result.modified_vertices.len()
        );
    }
    result
}
