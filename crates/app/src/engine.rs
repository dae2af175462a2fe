//! Engine facade: owns the session state and answers shell messages.
//!
//! Every command either succeeds and queues one or more [`EngineToShell`]
//! events, or fails and queues a single `Error` event. Nothing here panics on
//! bad input; callers drain the queue with [`Engine::take_events`].

use std::path::Path;

use geometry::io::{self, MeshFormat};
use geometry::{ExportFormat, ExportSpace, MeshId, MeshSlot, MeshStore};
use occlusal_config::EngineConfig;
use occlusal_ipc::{
    CameraState, EngineToShell, ExportReference, PointerEvent, PointerPhase, RecordState,
    RestorationRecord, ShellToEngine,
};
use restoration::{
    AssemblyReport, GapReport, Prerequisite, RestorationError, RestorationInfo,
    RestorationParameters, reset_to_rest,
};
use sculpting::BrushConfig;
use tracing::{debug, info, warn};

use crate::controller::{InteractionController, StrokeStep, StrokeSummary, ToolMode};
use crate::convert::{self, slot_to_ipc};
use crate::error::EngineError;
use crate::input::{Camera, Ray};
use crate::marker::AnchorMarker;
use crate::services::{
    AssemblyService, BrushService, KernelBrush, MidplaneAssembly, PadWorkshop, RestorationService,
};

/// Exported mesh bytes plus where they should go.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedMesh {
    pub slot: MeshSlot,
    pub reference: ExportReference,
    pub bytes: Vec<u8>,
}

pub struct Engine {
    config: EngineConfig,
    store: MeshStore,
    assembly: Box<dyn AssemblyService>,
    restoration: Box<dyn RestorationService>,
    brush: Box<dyn BrushService>,
    controller: InteractionController,
    camera: Camera,
    marker: Option<AnchorMarker>,
    assembled: bool,
    gap: Option<GapReport>,
    restoration_info: Option<RestorationInfo>,
    parameters: RestorationParameters,
    events: Vec<EngineToShell>,
}

impl Engine {
    /// Engine with the standard services.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let restoration = PadWorkshop::from_config(&config);
        Self::with_services(
            config,
            Box::new(MidplaneAssembly),
            Box::new(restoration),
            Box::new(KernelBrush::default()),
        )
    }

    pub fn with_services(
        config: EngineConfig,
        assembly: Box<dyn AssemblyService>,
        restoration: Box<dyn RestorationService>,
        brush: Box<dyn BrushService>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let camera = Camera::from_state(&CameraState::default())?;
        Ok(Self {
            store: MeshStore::new(config.store.clone()),
            controller: InteractionController::new(config.interaction.clone(), &config.history),
            parameters: RestorationParameters::from(&config.restoration),
            config,
            assembly,
            restoration,
            brush,
            camera,
            marker: None,
            assembled: false,
            gap: None,
            restoration_info: None,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &MeshStore {
        &self.store
    }

    pub fn is_assembled(&self) -> bool {
        self.assembled
    }

    pub fn gap_report(&self) -> Option<&GapReport> {
        self.gap.as_ref()
    }

    pub fn restoration_info(&self) -> Option<&RestorationInfo> {
        self.restoration_info.as_ref()
    }

    pub fn marker(&self) -> Option<&AnchorMarker> {
        self.marker.as_ref()
    }

    pub fn tool_mode(&self) -> ToolMode {
        self.controller.mode()
    }

    pub fn brush(&self) -> &BrushConfig {
        self.brush.config()
    }

    /// Drain queued events in the order they were produced.
    pub fn take_events(&mut self) -> Vec<EngineToShell> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Message dispatch
    // ========================================================================

    /// Apply one shell command; failures become an `Error` event.
    pub fn handle(&mut self, message: ShellToEngine) {
        if let Err(err) = self.dispatch(message) {
            warn!("Command failed: {}", err);
            self.events.push(EngineToShell::error(err.code(), err.to_string()));
        }
    }

    /// Parse and apply a JSON command.
    pub fn handle_json(&mut self, json: &str) {
        match occlusal_ipc::from_json::<ShellToEngine>(json) {
            Ok(message) => self.handle(message),
            Err(err) => {
                warn!("Rejected message: {}", err);
                self.events.push(EngineToShell::error(err.code(), err.to_string()));
            }
        }
    }

    fn dispatch(&mut self, message: ShellToEngine) -> Result<(), EngineError> {
        match message {
            ShellToEngine::LoadMesh {
                slot,
                bytes,
                file_name,
                format,
            } => {
                let slot = convert::slot_from_ipc(slot);
                let format = format.map(convert::mesh_format).or_else(|| {
                    file_name
                        .as_deref()
                        .and_then(|name| MeshFormat::from_path(Path::new(name)))
                });
                let id = self.load_mesh(slot, &bytes, format)?;
                if let Some(name) = file_name.as_deref().and_then(file_stem) {
                    if let Some(mesh) = self.store.get_mut(slot) {
                        mesh.set_name(name);
                    }
                }
                self.push_summary(slot, id, false);
            }
            ShellToEngine::RemoveMesh { slot } => {
                let slot = convert::slot_from_ipc(slot);
                if self.remove_mesh(slot) {
                    self.events.push(EngineToShell::MeshRemoved {
                        slot: slot_to_ipc(slot),
                    });
                }
            }
            ShellToEngine::SetVisibility { slot, visible } => {
                let slot = convert::slot_from_ipc(slot);
                self.set_visibility(slot, visible)?;
                self.push_slot(slot);
            }
            ShellToEngine::Assemble => {
                let report = self.assemble()?;
                self.events.push(EngineToShell::Assembled {
                    plane_y: report.plane_y,
                    hidden: report.hidden.iter().copied().map(slot_to_ipc).collect(),
                });
                self.push_slot(MeshSlot::UpperArch);
                self.push_slot(MeshSlot::LowerArch);
            }
            ShellToEngine::DetectGap => {
                let report = self.detect_gap()?.clone();
                self.events.push(EngineToShell::GapDetected {
                    anchor: report.anchor.to_array(),
                    clearance: report.best_clearance(),
                    clusters: report.clusters.len(),
                    fallback: report.fallback,
                });
                let interaction = &self.config.interaction;
                self.events.push(EngineToShell::MarkerShown {
                    position: report.anchor.to_array(),
                    radius: interaction.marker_radius,
                    seconds: interaction.marker_seconds,
                });
            }
            ShellToEngine::GenerateRestoration { parameters } => {
                let parameters = parameters.as_ref().map(convert::parameters_from_ipc);
                let info = self.generate_restoration(parameters)?.clone();
                if let (Some(id), Some(mesh)) = (
                    self.store.id(MeshSlot::Restoration),
                    self.store.get(MeshSlot::Restoration),
                ) {
                    self.events.push(EngineToShell::RestorationReady {
                        summary: convert::summarize(MeshSlot::Restoration, id, mesh),
                        dimensions: convert::dimensions_to_ipc(&info.dimensions),
                        anchor: info.anchor.to_array(),
                    });
                }
                self.push_history();
            }
            ShellToEngine::ResetRestoration => {
                self.reset_restoration()?;
                self.push_slot(MeshSlot::Restoration);
                self.push_history();
            }
            ShellToEngine::SetToolMode { mode } => {
                self.set_tool_mode(match mode {
                    occlusal_ipc::ToolMode::Select => ToolMode::Select,
                    occlusal_ipc::ToolMode::Sculpt => ToolMode::Sculpt,
                });
            }
            ShellToEngine::SetBrush { settings } => {
                self.set_brush(convert::brush_config(&settings))?;
            }
            ShellToEngine::Pointer(event) => self.pointer(event)?,
            ShellToEngine::SetCamera(state) => self.set_camera(&state)?,
            ShellToEngine::Undo => {
                if self.undo() {
                    self.push_history_target();
                }
                self.push_history();
            }
            ShellToEngine::Redo => {
                if self.redo() {
                    self.push_history_target();
                }
                self.push_history();
            }
            ShellToEngine::ResolveCollisions { slot } => {
                let slot = convert::slot_from_ipc(slot);
                let report = self.restoration.resolve_collisions(&mut self.store, slot)?;
                if report.moved() {
                    self.push_slot(slot);
                }
            }
            ShellToEngine::ExportRestoration {
                format,
                space,
                slot,
            } => {
                let slot = slot.map_or(MeshSlot::Restoration, convert::slot_from_ipc);
                let exported = self.export_mesh(
                    slot,
                    convert::export_format(format),
                    convert::export_space(space),
                )?;
                self.events.push(EngineToShell::Exported {
                    slot: slot_to_ipc(exported.slot),
                    reference: exported.reference,
                    bytes: exported.bytes,
                });
            }
            ShellToEngine::DescribeRestoration {
                patient_id,
                export_format,
            } => {
                let format = export_format.map(convert::export_format);
                let (record, export_bytes) = self.describe_restoration(&patient_id, format)?;
                self.events.push(EngineToShell::RecordReady {
                    record,
                    export_bytes,
                });
            }
            ShellToEngine::Tick { seconds } => {
                if self.tick(seconds) {
                    self.events.push(EngineToShell::MarkerExpired);
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Mesh store
    // ========================================================================

    /// Load bytes into `slot`, invalidating whatever depended on the old mesh.
    pub fn load_mesh(
        &mut self,
        slot: MeshSlot,
        bytes: &[u8],
        format: Option<MeshFormat>,
    ) -> Result<MeshId, EngineError> {
        let id = self.store.load(slot, bytes, format)?;
        self.invalidate(slot);
        Ok(id)
    }

    /// Remove `slot`'s mesh; false when the slot was empty.
    pub fn remove_mesh(&mut self, slot: MeshSlot) -> bool {
        if self.store.remove(slot).is_none() {
            debug!("Remove on empty slot {}", slot.label());
            return false;
        }
        self.invalidate(slot);
        true
    }

    pub fn set_visibility(&mut self, slot: MeshSlot, visible: bool) -> Result<(), EngineError> {
        if self.store.set_visible(slot, visible) {
            Ok(())
        } else {
            Err(missing(Prerequisite::Mesh(slot)))
        }
    }

    fn invalidate(&mut self, slot: MeshSlot) {
        match slot {
            MeshSlot::UpperArch | MeshSlot::LowerArch => {
                if self.assembled {
                    info!("Arch {} changed, assembly must be repeated", slot.label());
                }
                self.assembled = false;
                self.gap = None;
            }
            MeshSlot::Restoration => {
                self.restoration_info = None;
            }
            _ => {}
        }
    }

    // ========================================================================
    // Restoration workflow
    // ========================================================================

    pub fn assemble(&mut self) -> Result<AssemblyReport, EngineError> {
        let report = self.assembly.assemble(&mut self.store)?;
        self.assembled = true;
        self.gap = None;
        Ok(report)
    }

    /// Scan for the gap; requires assembled arches.
    pub fn detect_gap(&mut self) -> Result<&GapReport, EngineError> {
        if !self.assembled {
            return Err(missing(Prerequisite::Assembly));
        }
        let report = self.restoration.detect_gap(&self.store)?;
        let interaction = &self.config.interaction;
        self.marker = Some(AnchorMarker::new(
            report.anchor,
            interaction.marker_radius,
            interaction.marker_seconds,
        ));
        Ok(self.gap.insert(report))
    }

    /// Generate a pad at the detected anchor, scanning first when needed.
    ///
    /// Replaces any previous generated restoration and discards its history.
    pub fn generate_restoration(
        &mut self,
        parameters: Option<RestorationParameters>,
    ) -> Result<&RestorationInfo, EngineError> {
        let parameters = parameters.unwrap_or(self.parameters);
        parameters.validate()?;

        let anchor = match self.gap.as_ref().map(|report| report.anchor) {
            Some(anchor) => anchor,
            None => self.detect_gap()?.anchor,
        };

        let generated = self.restoration.generate(&self.store, anchor, &parameters)?;
        // Candidates are discarded once a pad is placed
        self.gap = None;
        self.controller.reset_history();
        self.store.insert(MeshSlot::Restoration, generated.mesh);
        self.parameters = parameters;
        Ok(self.restoration_info.insert(generated.info))
    }

    /// Put the generated pad back to its rest shape and placement; the sculpted
    /// state, including any collision push, stays undoable.
    pub fn reset_restoration(&mut self) -> Result<(), EngineError> {
        let Some(info) = self.restoration_info.as_ref() else {
            return Err(missing(Prerequisite::Restoration));
        };
        if !self.controller.snapshot_slot(&self.store, MeshSlot::Restoration) {
            return Err(missing(Prerequisite::Mesh(MeshSlot::Restoration)));
        }
        let mesh = self
            .store
            .get_mut(MeshSlot::Restoration)
            .ok_or_else(|| missing(Prerequisite::Mesh(MeshSlot::Restoration)))?;
        reset_to_rest(mesh, info)?;
        Ok(())
    }

    pub fn resolve_collisions(&mut self, slot: MeshSlot) -> Result<bool, EngineError> {
        Ok(self.restoration.resolve_collisions(&mut self.store, slot)?.moved())
    }

    // ========================================================================
    // Sculpting
    // ========================================================================

    pub fn set_tool_mode(&mut self, mode: ToolMode) {
        self.controller.set_mode(mode);
    }

    /// Install a brush; an invalid one is refused and the old brush stays.
    pub fn set_brush(&mut self, config: BrushConfig) -> Result<(), EngineError> {
        self.brush.set_config(config)?;
        debug!("Brush set to {:?}", config);
        Ok(())
    }

    pub fn set_camera(&mut self, state: &CameraState) -> Result<(), EngineError> {
        self.camera = Camera::from_state(state)?;
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) -> Result<(), EngineError> {
        let ray = self.camera.ray(event.x, event.y);
        match event.phase {
            PointerPhase::Down => {
                self.stroke_begin(ray);
            }
            PointerPhase::Move => {
                self.stroke_move(ray);
            }
            PointerPhase::Up | PointerPhase::Leave => {
                if let Some(summary) = self.stroke_end()? {
                    self.events.push(EngineToShell::StrokeFinished {
                        slot: slot_to_ipc(summary.slot),
                        applied_dabs: summary.applied_dabs,
                        moved: summary.collision.moved(),
                        displacement: summary.collision.displacement.to_array(),
                    });
                    self.push_slot(summary.slot);
                    self.push_history();
                }
            }
        }
        Ok(())
    }

    /// Start a stroke along a world ray.
    pub fn stroke_begin(&mut self, ray: Ray) -> bool {
        self.controller
            .pointer_down(&mut self.store, &*self.brush, ray)
    }

    pub fn stroke_move(&mut self, ray: Ray) -> bool {
        matches!(
            self.controller
                .pointer_move(&mut self.store, &*self.brush, ray),
            StrokeStep::Applied
        )
    }

    pub fn stroke_end(&mut self) -> Result<Option<StrokeSummary>, EngineError> {
        Ok(self
            .controller
            .pointer_up(&mut self.store, &*self.restoration)?)
    }

    pub fn undo(&mut self) -> bool {
        self.controller.undo(&mut self.store)
    }

    pub fn redo(&mut self) -> bool {
        self.controller.redo(&mut self.store)
    }

    pub fn can_undo(&self) -> bool {
        self.controller.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.controller.can_redo()
    }

    // ========================================================================
    // Export and record
    // ========================================================================

    pub fn export_mesh(
        &self,
        slot: MeshSlot,
        format: ExportFormat,
        space: ExportSpace,
    ) -> Result<ExportedMesh, EngineError> {
        let mesh = self
            .store
            .get(slot)
            .ok_or_else(|| missing(Prerequisite::Mesh(slot)))?;
        let bytes = io::export(mesh, format, space)?;
        info!("Exported {} as {:?} ({} bytes)", slot.label(), format, bytes.len());
        Ok(ExportedMesh {
            slot,
            reference: ExportReference {
                format: export_format_to_ipc(format),
                file_name: format!("{}.{}", slot.label(), format.extension()),
                byte_length: bytes.len(),
            },
            bytes,
        })
    }

    /// Record for the medical record collaborator, with optional world-space export.
    pub fn describe_restoration(
        &self,
        patient_id: &str,
        export_format: Option<ExportFormat>,
    ) -> Result<(RestorationRecord, Option<Vec<u8>>), EngineError> {
        let patient_id = patient_id.trim();
        if patient_id.is_empty() {
            return Err(RestorationError::InvalidParameters("patient id is empty".into()).into());
        }

        let has_restoration = self.store.contains(MeshSlot::Restoration);
        let exported = match export_format {
            Some(format) if has_restoration => {
                Some(self.export_mesh(MeshSlot::Restoration, format, ExportSpace::World)?)
            }
            _ => None,
        };

        let info = self.restoration_info.as_ref();
        let record = RestorationRecord {
            patient_id: patient_id.to_string(),
            parameters: convert::parameters_to_ipc(
                info.map_or(&self.parameters, |info| &info.parameters),
            ),
            dimensions: info.map(|info| convert::dimensions_to_ipc(&info.dimensions)),
            anchor: info.map(|info| info.anchor.to_array()),
            clearance: info.and_then(|info| info.clearance),
            state: RecordState {
                has_upper_arch: self.store.contains(MeshSlot::UpperArch),
                has_lower_arch: self.store.contains(MeshSlot::LowerArch),
                assembled: self.assembled,
                has_restoration,
            },
            export: exported.as_ref().map(|e| ExportReference {
                file_name: format!("{}-{}", patient_id, e.reference.file_name),
                ..e.reference.clone()
            }),
        };
        Ok((record, exported.map(|e| e.bytes)))
    }

    // ========================================================================
    // Timers
    // ========================================================================

    /// Advance the anchor marker; true when it expired on this tick.
    pub fn tick(&mut self, seconds: f32) -> bool {
        let expired = self.marker.as_mut().is_some_and(|marker| marker.tick(seconds));
        if expired {
            self.marker = None;
        }
        expired
    }

    // ========================================================================
    // Event helpers
    // ========================================================================

    fn push_summary(&mut self, slot: MeshSlot, id: MeshId, updated: bool) {
        if let Some(mesh) = self.store.get(slot) {
            let summary = convert::summarize(slot, id, mesh);
            self.events.push(if updated {
                EngineToShell::MeshUpdated(summary)
            } else {
                EngineToShell::MeshLoaded(summary)
            });
        }
    }

    fn push_slot(&mut self, slot: MeshSlot) {
        if let Some(id) = self.store.id(slot) {
            self.push_summary(slot, id, true);
        }
    }

    fn push_history_target(&mut self) {
        // Undo and redo only ever touch sculptable slots
        for slot in [MeshSlot::Restoration, MeshSlot::OcclusionPad] {
            self.push_slot(slot);
        }
    }

    fn push_history(&mut self) {
        self.events.push(EngineToShell::HistoryChanged {
            can_undo: self.controller.can_undo(),
            can_redo: self.controller.can_redo(),
        });
    }
}

fn missing(prerequisite: Prerequisite) -> EngineError {
    RestorationError::MissingInput(prerequisite).into()
}

fn file_stem(name: &str) -> Option<&str> {
    Path::new(name).file_stem().and_then(|stem| stem.to_str())
}

fn export_format_to_ipc(format: ExportFormat) -> occlusal_ipc::ExportFileFormat {
    match format {
        ExportFormat::StlBinary => occlusal_ipc::ExportFileFormat::StlBinary,
        ExportFormat::StlAscii => occlusal_ipc::ExportFileFormat::StlAscii,
        ExportFormat::Obj => occlusal_ipc::ExportFileFormat::Obj,
    }
}
