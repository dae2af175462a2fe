//! Bite fitting: bring the two arches together at a shared occlusal plane.
//!
//! The fit is a heuristic on world bounding boxes. Both arches are translated
//! vertically only, the upper so its lowest point touches the plane and the
//! lower so its highest point does. Running it again changes nothing.

use geometry::{MeshSlot, MeshStore, bounding_box};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::RestorationError;

/// Outcome of [`assemble`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblyReport {
    /// Height at which the arches meet
    pub plane_y: f32,
    /// Vertical translation applied to the upper arch
    pub upper_shift: f32,
    /// Vertical translation applied to the lower arch
    pub lower_shift: f32,
    /// Bite registrations hidden by the fit
    pub hidden: Vec<MeshSlot>,
}

/// Align the upper and lower arch and hide the bite registrations.
///
/// Fails without touching any transform when either arch is missing.
pub fn assemble(store: &mut MeshStore) -> Result<AssemblyReport, RestorationError> {
    let upper = store
        .get(MeshSlot::UpperArch)
        .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::UpperArch))?;
    let lower = store
        .get(MeshSlot::LowerArch)
        .ok_or_else(|| RestorationError::missing_mesh(MeshSlot::LowerArch))?;

    let upper_box = bounding_box(upper);
    let lower_box = bounding_box(lower);
    let plane_y = (upper_box.min.y + lower_box.max.y) * 0.5;
    let upper_shift = plane_y - upper_box.min.y;
    let lower_shift = plane_y - lower_box.max.y;

    if let Some(mesh) = store.get_mut(MeshSlot::UpperArch) {
        mesh.transform.translation.y += upper_shift;
    }
    if let Some(mesh) = store.get_mut(MeshSlot::LowerArch) {
        mesh.transform.translation.y += lower_shift;
    }

    let mut hidden = Vec::new();
    for slot in [MeshSlot::FirstBite, MeshSlot::SecondBite] {
        if store.set_visible(slot, false) {
            hidden.push(slot);
        }
    }

    debug!("Upper shifted {upper_shift:.3}, lower shifted {lower_shift:.3}");
    info!("Assembled arches at y = {plane_y:.3}");

    Ok(AssemblyReport {
        plane_y,
        upper_shift,
        lower_shift,
        hidden,
    })
}
