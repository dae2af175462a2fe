//! Slot-keyed ownership of every mesh in the session.
//!
//! Each slot holds at most one mesh. Every stored mesh gets a fresh
//! [`MeshId`]; replacing or removing a mesh retires its id, which is how
//! in-flight strokes notice that their target is gone.

use std::collections::BTreeMap;

use glam::Vec3;
use occlusal_config::StoreConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ImportError;
use crate::io::{self, MeshFormat};
use crate::mesh::{Mesh, MeshRole};

/// Named place a mesh occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSlot {
    UpperArch,
    LowerArch,
    FirstBite,
    SecondBite,
    /// Restoration imported from a file
    OcclusionPad,
    /// Restoration produced by the generator
    Restoration,
}

impl MeshSlot {
    pub const ALL: [MeshSlot; 6] = [
        Self::UpperArch,
        Self::LowerArch,
        Self::FirstBite,
        Self::SecondBite,
        Self::OcclusionPad,
        Self::Restoration,
    ];

    pub fn role(self) -> MeshRole {
        match self {
            Self::UpperArch => MeshRole::UpperArch,
            Self::LowerArch => MeshRole::LowerArch,
            Self::FirstBite | Self::SecondBite => MeshRole::BiteRegistration,
            Self::OcclusionPad | Self::Restoration => MeshRole::Restoration,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::UpperArch => "upper_arch",
            Self::LowerArch => "lower_arch",
            Self::FirstBite => "first_bite",
            Self::SecondBite => "second_bite",
            Self::OcclusionPad => "occlusion_pad",
            Self::Restoration => "restoration",
        }
    }
}

/// Handle to one stored mesh; never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshId(u64);

impl MeshId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
struct Entry {
    id: MeshId,
    mesh: Mesh,
}

/// Owns every loaded mesh.
#[derive(Debug)]
pub struct MeshStore {
    entries: BTreeMap<MeshSlot, Entry>,
    next_id: u64,
    config: StoreConfig,
}

impl Default for MeshStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl MeshStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            entries: BTreeMap::new(),
            next_id: 1,
            config,
        }
    }

    /// Placement given to a mesh freshly loaded into `slot`
    pub fn default_offset(&self, slot: MeshSlot) -> Vec3 {
        let offset = match slot {
            MeshSlot::UpperArch => self.config.upper_arch_offset,
            MeshSlot::LowerArch => self.config.lower_arch_offset,
            MeshSlot::FirstBite => self.config.first_bite_offset,
            MeshSlot::SecondBite => self.config.second_bite_offset,
            MeshSlot::OcclusionPad | MeshSlot::Restoration => [0.0; 3],
        };
        Vec3::from_array(offset)
    }

    /// Parse bytes into `slot`, replacing whatever it held.
    pub fn load(
        &mut self,
        slot: MeshSlot,
        bytes: &[u8],
        format: Option<MeshFormat>,
    ) -> Result<MeshId, ImportError> {
        let data = io::import(bytes, format)?;
        let mut mesh = Mesh::from_data(slot.label(), slot.role(), data)?;
        mesh.transform.translation = self.default_offset(slot);
        info!(
            "Loaded {} ({} vertices, {} triangles)",
            slot.label(),
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        Ok(self.insert(slot, mesh))
    }

    /// Store an already-built mesh, replacing and releasing any previous one.
    pub fn insert(&mut self, slot: MeshSlot, mesh: Mesh) -> MeshId {
        let id = MeshId(self.next_id);
        self.next_id += 1;
        if let Some(previous) = self.entries.insert(slot, Entry { id, mesh }) {
            info!(
                "Replaced {} mesh {:?}, releasing {} vertices",
                slot.label(),
                previous.id,
                previous.mesh.vertex_count()
            );
        }
        id
    }

    /// Take a mesh out of its slot; its id stops being live
    pub fn remove(&mut self, slot: MeshSlot) -> Option<Mesh> {
        let entry = self.entries.remove(&slot)?;
        debug!("Removed {} mesh {:?}", slot.label(), entry.id);
        Some(entry.mesh)
    }

    pub fn get(&self, slot: MeshSlot) -> Option<&Mesh> {
        self.entries.get(&slot).map(|entry| &entry.mesh)
    }

    pub fn get_mut(&mut self, slot: MeshSlot) -> Option<&mut Mesh> {
        self.entries.get_mut(&slot).map(|entry| &mut entry.mesh)
    }

    pub fn contains(&self, slot: MeshSlot) -> bool {
        self.entries.contains_key(&slot)
    }

    pub fn id(&self, slot: MeshSlot) -> Option<MeshId> {
        self.entries.get(&slot).map(|entry| entry.id)
    }

    /// Whether `id` still names a stored mesh
    pub fn is_live(&self, id: MeshId) -> bool {
        self.slot_of(id).is_some()
    }

    pub fn slot_of(&self, id: MeshId) -> Option<MeshSlot> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.id == id)
            .map(|(slot, _)| *slot)
    }

    pub fn get_by_id(&self, id: MeshId) -> Option<&Mesh> {
        self.get(self.slot_of(id)?)
    }

    pub fn get_mut_by_id(&mut self, id: MeshId) -> Option<&mut Mesh> {
        let slot = self.slot_of(id)?;
        self.get_mut(slot)
    }

    /// Show or hide a slot's mesh; false when the slot is empty
    pub fn set_visible(&mut self, slot: MeshSlot, visible: bool) -> bool {
        match self.get_mut(slot) {
            Some(mesh) => {
                mesh.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Stored meshes in slot order
    pub fn iter(&self) -> impl Iterator<Item = (MeshSlot, MeshId, &Mesh)> {
        self.entries
            .iter()
            .map(|(slot, entry)| (*slot, entry.id, &entry.mesh))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release every mesh
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            info!("Releasing {} meshes", self.entries.len());
        }
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{ExportFormat, ExportSpace, export};
    use crate::primitives::cuboid;
    use crate::spatial::bounding_box;

    fn box_bytes(format: ExportFormat) -> Vec<u8> {
        let mesh = Mesh::from_data(
            "box",
            MeshRole::LowerArch,
            cuboid(Vec3::new(-10.0, -2.0, -5.0), Vec3::new(10.0, 2.0, 5.0)),
        )
        .unwrap();
        export(&mesh, format, ExportSpace::Local).unwrap()
    }

    #[test]
    fn test_loaded_buffers_are_consistent() {
        let mut store = MeshStore::default();
        for (slot, format) in [
            (MeshSlot::UpperArch, ExportFormat::StlBinary),
            (MeshSlot::LowerArch, ExportFormat::Obj),
            (MeshSlot::FirstBite, ExportFormat::StlAscii),
        ] {
            store.load(slot, &box_bytes(format), None).unwrap();
            let mesh = store.get(slot).unwrap();
            assert_eq!(mesh.positions().len(), mesh.normals().len());
            assert!(mesh.indices().iter().all(|&i| (i as usize) < mesh.vertex_count()));
            assert_eq!(mesh.role(), slot.role());
        }
    }

    #[test]
    fn test_arches_start_apart() {
        let mut store = MeshStore::default();
        store
            .load(MeshSlot::UpperArch, &box_bytes(ExportFormat::Obj), None)
            .unwrap();
        store
            .load(MeshSlot::LowerArch, &box_bytes(ExportFormat::Obj), None)
            .unwrap();
        let upper = bounding_box(store.get(MeshSlot::UpperArch).unwrap());
        let lower = bounding_box(store.get(MeshSlot::LowerArch).unwrap());
        assert!(upper.min.y > lower.max.y);
        assert!(!upper.intersects(&lower));
    }

    #[test]
    fn test_replacement_retires_old_id() {
        let mut store = MeshStore::default();
        let first = store
            .load(MeshSlot::OcclusionPad, &box_bytes(ExportFormat::StlBinary), None)
            .unwrap();
        assert!(store.is_live(first));
        assert!(store.get(MeshSlot::OcclusionPad).unwrap().editable);

        let second = store
            .load(MeshSlot::OcclusionPad, &box_bytes(ExportFormat::Obj), None)
            .unwrap();
        assert_ne!(first, second);
        assert!(!store.is_live(first));
        assert_eq!(store.slot_of(second), Some(MeshSlot::OcclusionPad));
        assert_eq!(store.len(), 1);

        assert!(store.remove(MeshSlot::OcclusionPad).is_some());
        assert!(!store.is_live(second));
        assert!(store.remove(MeshSlot::OcclusionPad).is_none());
    }

    #[test]
    fn test_failed_load_keeps_previous_mesh() {
        let mut store = MeshStore::default();
        let id = store
            .load(MeshSlot::UpperArch, &box_bytes(ExportFormat::Obj), None)
            .unwrap();
        let err = store.load(MeshSlot::UpperArch, b"garbage", None).unwrap_err();
        assert_eq!(err, ImportError::UnsupportedFormat);
        assert!(store.is_live(id));
    }

    #[test]
    fn test_visibility() {
        let mut store = MeshStore::default();
        assert!(!store.set_visible(MeshSlot::FirstBite, false));
        store
            .load(MeshSlot::FirstBite, &box_bytes(ExportFormat::Obj), None)
            .unwrap();
        assert!(store.set_visible(MeshSlot::FirstBite, false));
        assert!(!store.get(MeshSlot::FirstBite).unwrap().visible);
    }
}
