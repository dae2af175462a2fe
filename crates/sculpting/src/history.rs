//! Undo/redo over whole position buffers and the placement that goes with them.
//!
//! Entries are snapshots taken before an edit. When the first undo
//! happens from the newest entry, the live buffer is pushed as a redo tip so
//! that undo followed by redo lands exactly where the operator was.

use std::collections::VecDeque;

use geometry::{Mesh, Transform};
use glam::Vec3;
use occlusal_config::DEFAULT_HISTORY_CAPACITY;
use tracing::{debug, warn};

/// Immutable copy of a mesh's vertex positions and transform.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    /// Monotonically increasing snapshot number
    pub index: u64,
    pub positions: Box<[Vec3]>,
    pub transform: Transform,
}

/// Ordered snapshots plus a cursor.
///
/// The cursor names the entry the next undo restores; `None` means nothing is
/// left to undo.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<HistorySnapshot>,
    cursor: Option<usize>,
    next_index: u64,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: None,
            next_index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record the mesh's current positions and transform as the newest undo point.
    ///
    /// Anything that could have been redone is discarded.
    pub fn snapshot(&mut self, mesh: &Mesh) {
        debug!("Snapshot of {}", mesh.name());
        self.snapshot_state(mesh.positions(), mesh.transform);
    }

    /// Record a state copied earlier as the newest undo point.
    ///
    /// Lets a caller copy the buffer before an edit and only keep it once the
    /// edit turns out to have changed something.
    pub fn snapshot_state(&mut self, positions: &[Vec3], transform: Transform) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        if self.entries.len() > keep {
            debug!("Discarding {} redo entries", self.entries.len() - keep);
            self.entries.truncate(keep);
        }

        let snapshot = HistorySnapshot {
            index: self.next_index,
            positions: positions.into(),
            transform,
        };
        self.next_index += 1;
        debug!("Snapshot {}", snapshot.index);
        self.entries.push_back(snapshot);

        while self.entries.len() > self.capacity {
            if let Some(dropped) = self.entries.pop_front() {
                debug!("History full, dropping snapshot {}", dropped.index);
            }
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self, mesh: &mut Mesh) -> bool {
        let Some(cursor) = self.cursor else {
            debug!("Undo: no entries available");
            return false;
        };

        let pushed_tip = cursor + 1 == self.entries.len();
        if pushed_tip {
            let tip = self.capture(mesh);
            self.entries.push_back(tip);
        }

        if !restore(&self.entries[cursor], mesh) {
            if pushed_tip {
                self.entries.pop_back();
            }
            return false;
        }

        debug!("Undo to snapshot {}", self.entries[cursor].index);
        self.cursor = cursor.checked_sub(1);
        true
    }

    /// Step forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self, mesh: &mut Mesh) -> bool {
        let target = self.cursor.map_or(1, |c| c + 2);
        let Some(entry) = self.entries.get(target) else {
            debug!("Redo: no entries available");
            return false;
        };
        if !restore(entry, mesh) {
            return false;
        }
        debug!("Redo to snapshot {}", entry.index);
        self.cursor = Some(target - 1);
        true
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            debug!("Clearing {} history entries", self.entries.len());
        }
        self.entries.clear();
        self.cursor = None;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.map_or(1, |c| c + 2) < self.entries.len()
    }

    /// Number of stored entries, including a redo tip
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn capture(&mut self, mesh: &Mesh) -> HistorySnapshot {
        let index = self.next_index;
        self.next_index += 1;
        HistorySnapshot {
            index,
            positions: mesh.positions().into(),
            transform: mesh.transform,
        }
    }
}

fn restore(snapshot: &HistorySnapshot, mesh: &mut Mesh) -> bool {
    if let Err(err) = mesh.set_positions(&snapshot.positions) {
        warn!("Cannot restore snapshot {} into {}: {err}", snapshot.index, mesh.name());
        return false;
    }
    mesh.recompute_normals();
    mesh.transform = snapshot.transform;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::MeshRole;
    use geometry::primitives::cuboid;

    fn mesh() -> Mesh {
        Mesh::from_data("pad", MeshRole::Restoration, cuboid(Vec3::ZERO, Vec3::ONE)).unwrap()
    }

    fn nudge(mesh: &mut Mesh, amount: f32) {
        mesh.positions_mut()[0].y += amount;
        mesh.recompute_normals();
    }

    #[test]
    fn test_boundaries_are_noops() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        let before = mesh.positions().to_vec();
        assert!(!history.undo(&mut mesh));
        assert!(!history.redo(&mut mesh));
        assert_eq!(mesh.positions(), before.as_slice());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_snapshot_mutate_undo_restores_exactly() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        let original = mesh.positions().to_vec();
        let original_normals = mesh.normals().to_vec();

        history.snapshot(&mesh);
        nudge(&mut mesh, 0.37);
        let edited = mesh.positions().to_vec();

        assert!(history.undo(&mut mesh));
        assert_eq!(mesh.positions(), original.as_slice());
        assert_eq!(mesh.normals(), original_normals.as_slice());
        assert!(!history.undo(&mut mesh));

        assert!(history.redo(&mut mesh));
        assert_eq!(mesh.positions(), edited.as_slice());
        assert!(!history.redo(&mut mesh));
    }

    #[test]
    fn test_multiple_strokes_walk_back_and_forth() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        let mut states = vec![mesh.positions().to_vec()];
        for step in 1..=3 {
            history.snapshot(&mesh);
            nudge(&mut mesh, step as f32);
            states.push(mesh.positions().to_vec());
        }

        for expected in states.iter().rev().skip(1) {
            assert!(history.undo(&mut mesh));
            assert_eq!(mesh.positions(), expected.as_slice());
        }
        assert!(!history.undo(&mut mesh));

        for expected in states.iter().skip(1) {
            assert!(history.redo(&mut mesh));
            assert_eq!(mesh.positions(), expected.as_slice());
        }
        assert!(!history.redo(&mut mesh));

        // undo then redo from the middle
        assert!(history.undo(&mut mesh));
        assert!(history.undo(&mut mesh));
        assert!(history.redo(&mut mesh));
        assert_eq!(mesh.positions(), states[2].as_slice());
    }

    #[test]
    fn test_late_snapshot_of_copied_state() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        let before = mesh.positions().to_vec();
        let placed = mesh.transform;
        nudge(&mut mesh, 0.5);
        mesh.transform.translation.x += 2.0;

        history.snapshot_state(&before, placed);
        assert!(history.undo(&mut mesh));
        assert_eq!(mesh.positions(), before.as_slice());
        assert_eq!(mesh.transform, placed);
    }

    #[test]
    fn test_undo_redo_restores_transform() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        let placed = mesh.transform;
        history.snapshot(&mesh);
        mesh.transform.translation = Vec3::new(1.0, 2.0, 3.0);
        let moved = mesh.transform;

        assert!(history.undo(&mut mesh));
        assert_eq!(mesh.transform, placed);
        assert!(history.redo(&mut mesh));
        assert_eq!(mesh.transform, moved);
    }

    #[test]
    fn test_new_snapshot_discards_redo() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        history.snapshot(&mesh);
        nudge(&mut mesh, 1.0);
        assert!(history.undo(&mut mesh));
        assert!(history.can_redo());

        history.snapshot(&mesh);
        nudge(&mut mesh, -2.0);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut mesh));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = HistoryManager::new(3);
        let mut mesh = mesh();
        for _ in 0..5 {
            history.snapshot(&mesh);
            nudge(&mut mesh, 1.0);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), Some(2));

        let mut undone = 0;
        while history.undo(&mut mesh) {
            undone += 1;
        }
        assert_eq!(undone, 3);
        // two of the five nudges could not be undone
        assert_eq!(mesh.positions()[0].y, 2.0);
    }

    #[test]
    fn test_restore_into_wrong_mesh_fails() {
        let mut history = HistoryManager::default();
        history.snapshot(&mesh());

        let mut other = Mesh::from_data(
            "other",
            MeshRole::Restoration,
            geometry::MeshData {
                positions: vec![Vec3::ZERO, Vec3::X, Vec3::Z],
                normals: None,
                indices: vec![0, 1, 2],
                groups: Vec::new(),
            },
        )
        .unwrap();
        let before = other.positions().to_vec();
        assert!(!history.undo(&mut other));
        assert_eq!(other.positions(), before.as_slice());
        assert_eq!(history.len(), 1);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_clear() {
        let mut history = HistoryManager::default();
        let mut mesh = mesh();
        history.snapshot(&mesh);
        history.clear();
        assert!(history.is_empty());
        assert!(!history.undo(&mut mesh));
    }
}
