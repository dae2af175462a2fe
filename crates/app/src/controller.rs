//! Interaction controller: pointer state machine for sculpt strokes.
//!
//! `Idle -> Stroking` on a pointer press over a visible, editable mesh while
//! the sculpt tool is active. Entering a stroke copies the target's positions
//! and applies one dab; moves apply further dabs once the hit has travelled
//! far enough. The copy becomes a history entry when the first dab actually
//! moves a vertex, so a stroke that changes nothing leaves history alone.
//! Release or leave ends the stroke and optionally pushes the target out of
//! other restorations.
//!
//! The stroke remembers its target by [`MeshId`]. Each step checks the id is
//! still live, so replacing or removing the mesh mid-stroke cancels the stroke
//! instead of touching a different mesh.

use geometry::{MeshHit, MeshId, MeshSlot, MeshStore, Transform, raycast};
use glam::Vec3;
use occlusal_config::{HistoryConfig, InteractionConfig};
use restoration::{CollisionReport, RestorationError};
use sculpting::HistoryManager;
use tracing::{debug, info, trace, warn};

use crate::input::Ray;
use crate::services::{BrushService, RestorationService};

/// What a primary drag does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolMode {
    #[default]
    Select,
    Sculpt,
}

#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    target: MeshId,
    last_hit: Vec3,
    applied_dabs: usize,
    /// Positions and transform at stroke start, until the first dab changes the mesh
    pending: Option<(Vec<Vec3>, Transform)>,
}

/// Result of a finished stroke.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSummary {
    pub slot: MeshSlot,
    pub applied_dabs: usize,
    pub collision: CollisionReport,
}

/// Outcome of a pointer move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStep {
    /// No stroke in progress
    Idle,
    /// A dab was applied
    Applied,
    /// Ray missed the target, hit too close to the last dab, or nothing moved
    Skipped,
    /// The target was released; the stroke is over
    Cancelled,
}

#[derive(Debug)]
pub struct InteractionController {
    mode: ToolMode,
    config: InteractionConfig,
    stroke: Option<ActiveStroke>,
    history: HistoryManager,
    /// Mesh the history entries belong to
    history_target: Option<MeshId>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default(), &HistoryConfig::default())
    }
}

impl InteractionController {
    pub fn new(config: InteractionConfig, history: &HistoryConfig) -> Self {
        Self {
            mode: ToolMode::Select,
            config,
            stroke: None,
            history: HistoryManager::new(history.capacity),
            history_target: None,
        }
    }

    pub fn mode(&self) -> ToolMode {
        self.mode
    }

    /// Switching tools ends any stroke in progress without post-processing.
    pub fn set_mode(&mut self, mode: ToolMode) {
        if mode != self.mode {
            if self.stroke.take().is_some() {
                debug!("Tool change ended the active stroke");
            }
            info!("Tool mode: {:?}", mode);
            self.mode = mode;
        }
    }

    pub fn is_stroking(&self) -> bool {
        self.stroke.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Begin a stroke if the ray lands on a sculptable mesh.
    ///
    /// Returns whether a stroke started.
    pub fn pointer_down(
        &mut self,
        store: &mut MeshStore,
        brush: &dyn BrushService,
        ray: Ray,
    ) -> bool {
        if self.mode != ToolMode::Sculpt {
            trace!("Pointer down ignored outside sculpt mode");
            return false;
        }
        if self.stroke.is_some() {
            debug!("Pointer down during a stroke, keeping the current stroke");
            return false;
        }
        let Some((id, hit)) = pick(store, ray) else {
            trace!("Pointer down missed every editable mesh");
            return false;
        };

        let Some(mesh) = store.get_mut_by_id(id) else {
            return false;
        };
        let before = (mesh.positions().to_vec(), mesh.transform);
        let applied = brush.apply(mesh, &hit, ray.direction);
        info!("Stroke started on {} at {:?}", mesh.name(), hit.point);

        let mut stroke = ActiveStroke {
            target: id,
            last_hit: hit.point,
            applied_dabs: 0,
            pending: Some(before),
        };
        if applied {
            stroke.applied_dabs = 1;
            if let Some((positions, transform)) = stroke.pending.take() {
                self.commit_snapshot(id, &positions, transform);
            }
        }
        self.stroke = Some(stroke);
        true
    }

    /// Continue the stroke with a new ray.
    pub fn pointer_move(
        &mut self,
        store: &mut MeshStore,
        brush: &dyn BrushService,
        ray: Ray,
    ) -> StrokeStep {
        let Some(stroke) = self.stroke.as_mut() else {
            return StrokeStep::Idle;
        };
        let Some(mesh) = store.get_mut_by_id(stroke.target) else {
            warn!("Stroke target {:?} was released, cancelling stroke", stroke.target);
            self.stroke = None;
            return StrokeStep::Cancelled;
        };
        let Some(hit) = raycast(ray.origin, ray.direction, mesh) else {
            return StrokeStep::Skipped;
        };
        if hit.point.distance(stroke.last_hit) < self.config.min_move_distance {
            return StrokeStep::Skipped;
        }

        stroke.last_hit = hit.point;
        if !brush.apply(mesh, &hit, ray.direction) {
            return StrokeStep::Skipped;
        }
        stroke.applied_dabs += 1;
        let target = stroke.target;
        if let Some((positions, transform)) = stroke.pending.take() {
            self.commit_snapshot(target, &positions, transform);
        }
        StrokeStep::Applied
    }

    /// End the stroke (pointer up or leave).
    ///
    /// Returns `Ok(None)` when no stroke was active or its target is gone.
    pub fn pointer_up(
        &mut self,
        store: &mut MeshStore,
        resolver: &dyn RestorationService,
    ) -> Result<Option<StrokeSummary>, RestorationError> {
        let Some(stroke) = self.stroke.take() else {
            return Ok(None);
        };
        let Some(slot) = store.slot_of(stroke.target) else {
            warn!("Stroke target {:?} was released before the stroke ended", stroke.target);
            return Ok(None);
        };

        let collision = if self.config.resolve_on_release {
            resolver.resolve_collisions(store, slot)?
        } else {
            CollisionReport::default()
        };
        info!(
            "Stroke ended on {} after {} dabs",
            slot.label(),
            stroke.applied_dabs
        );
        Ok(Some(StrokeSummary {
            slot,
            applied_dabs: stroke.applied_dabs,
            collision,
        }))
    }

    /// Snapshot `slot` outside a stroke, e.g. before a reset.
    pub fn snapshot_slot(&mut self, store: &MeshStore, slot: MeshSlot) -> bool {
        let (Some(id), Some(mesh)) = (store.id(slot), store.get(slot)) else {
            return false;
        };
        self.bind_history(id);
        self.history.snapshot(mesh);
        true
    }

    pub fn undo(&mut self, store: &mut MeshStore) -> bool {
        if self.stroke.is_some() {
            debug!("Undo ignored during a stroke");
            return false;
        }
        match self.history_mesh(store) {
            Some(id) => store
                .get_mut_by_id(id)
                .is_some_and(|mesh| self.history.undo(mesh)),
            None => false,
        }
    }

    pub fn redo(&mut self, store: &mut MeshStore) -> bool {
        if self.stroke.is_some() {
            debug!("Redo ignored during a stroke");
            return false;
        }
        match self.history_mesh(store) {
            Some(id) => store
                .get_mut_by_id(id)
                .is_some_and(|mesh| self.history.redo(mesh)),
            None => false,
        }
    }

    /// Drop every history entry and any stroke in progress.
    pub fn reset_history(&mut self) {
        if !self.history.is_empty() {
            info!("Discarding {} history entries", self.history.len());
        }
        self.history.clear();
        self.history_target = None;
        self.stroke = None;
    }

    /// Record the pre-stroke state of `id` once the stroke changed it.
    fn commit_snapshot(&mut self, id: MeshId, positions: &[Vec3], transform: Transform) {
        self.bind_history(id);
        self.history.snapshot_state(positions, transform);
    }

    /// Point history at `id`, clearing entries that belong to another mesh.
    fn bind_history(&mut self, id: MeshId) {
        if self.history_target != Some(id) {
            if !self.history.is_empty() {
                info!(
                    "Rebinding history from {:?} to {:?}, discarding {} entries",
                    self.history_target,
                    id,
                    self.history.len()
                );
            }
            self.history.clear();
            self.history_target = Some(id);
        }
    }

    /// Live history target; stale history is discarded.
    fn history_mesh(&mut self, store: &MeshStore) -> Option<MeshId> {
        let id = self.history_target?;
        if store.is_live(id) {
            Some(id)
        } else {
            warn!("History target {:?} was released, discarding history", id);
            self.history.clear();
            self.history_target = None;
            None
        }
    }
}

/// Nearest hit over visible, editable meshes.
fn pick(store: &MeshStore, ray: Ray) -> Option<(MeshId, MeshHit)> {
    store
        .iter()
        .filter(|(_, _, mesh)| mesh.visible && mesh.editable)
        .filter_map(|(_, id, mesh)| raycast(ray.origin, ray.direction, mesh).map(|hit| (id, hit)))
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
}
