//! Push a restoration out of the other restorations it overlaps.
//!
//! Only the target moves; the meshes it collides with stay where they are.
//! Each overlap displaces the target by half the overlap box diagonal along
//! the line between the two box centers.

use geometry::{Aabb, Mesh, MeshRole, MeshSlot, MeshStore, bounding_box};
use glam::Vec3;
use tracing::{debug, info};

use crate::error::RestorationError;

/// Outcome of a collision pass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionReport {
    /// Overlaps that caused a displacement
    pub resolved: usize,
    /// Total translation applied to the target
    pub displacement: Vec3,
}

impl CollisionReport {
    pub fn moved(&self) -> bool {
        self.resolved > 0
    }
}

/// Resolve the mesh in `target` against every other restoration in the store.
pub fn resolve(
    store: &mut MeshStore,
    target: MeshSlot,
) -> Result<CollisionReport, RestorationError> {
    if !store.contains(target) {
        return Err(RestorationError::missing_mesh(target));
    }
    let others: Vec<Aabb> = store
        .iter()
        .filter(|(slot, _, mesh)| *slot != target && mesh.role() == MeshRole::Restoration)
        .map(|(_, _, mesh)| bounding_box(mesh))
        .collect();

    let mesh = store
        .get_mut(target)
        .ok_or_else(|| RestorationError::missing_mesh(target))?;
    Ok(resolve_against(mesh, &others))
}

/// Translate `mesh` out of each box in `others`, in order.
///
/// The mesh's bounds are recomputed after every displacement.
pub fn resolve_against(mesh: &mut Mesh, others: &[Aabb]) -> CollisionReport {
    let mut report = CollisionReport::default();

    for other in others {
        let bounds = bounding_box(mesh);
        let Some(overlap) = bounds.intersection(other) else {
            continue;
        };
        let direction = (bounds.center() - other.center())
            .try_normalize()
            .unwrap_or(Vec3::X);
        let offset = direction * overlap.size().length() * 0.5;

        mesh.transform.translation += offset;
        report.displacement += offset;
        report.resolved += 1;
        debug!("Pushed {} by {offset:?}", mesh.name());
    }

    if report.moved() {
        info!(
            "Resolved {} collisions for {}, moved {:.3}",
            report.resolved,
            mesh.name(),
            report.displacement.length()
        );
    }
    report
}
