//! Main IPC message enums for communication between the shell and the engine.

use serde::{Deserialize, Serialize};

use crate::commands::{BrushSettings, CameraState, PointerEvent, ToolMode};
use crate::types::{
    ExportFileFormat, ExportReference, ExportSpaceName, MeshFileFormat, MeshSummary,
    RestorationDims, RestorationParams, RestorationRecord, SlotName,
};

/// Messages from the shell to the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ShellToEngine {
    /// Load a mesh file into a slot, replacing any previous occupant
    LoadMesh {
        slot: SlotName,
        bytes: Vec<u8>,
        /// Used for naming and format detection
        file_name: Option<String>,
        format: Option<MeshFileFormat>,
    },

    RemoveMesh { slot: SlotName },

    SetVisibility { slot: SlotName, visible: bool },

    /// Align both arches to their common mid-plane
    Assemble,

    /// Scan the inter-arch gap and pick a restoration anchor
    DetectGap,

    /// Generate a restoration at the last detected anchor
    GenerateRestoration { parameters: Option<RestorationParams> },

    /// Put the generated restoration back to its rest shape
    ResetRestoration,

    SetToolMode { mode: ToolMode },

    SetBrush { settings: BrushSettings },

    Pointer(PointerEvent),

    SetCamera(CameraState),

    Undo,

    Redo,

    /// Push the restoration out of any overlapping restoration
    ResolveCollisions { slot: SlotName },

    ExportRestoration {
        format: ExportFileFormat,
        space: ExportSpaceName,
        /// Defaults to the generated restoration
        slot: Option<SlotName>,
    },

    /// Build a record for the medical record collaborator
    DescribeRestoration {
        patient_id: String,
        export_format: Option<ExportFileFormat>,
    },

    /// Advance timers (anchor marker)
    Tick { seconds: f32 },
}

/// Messages from the engine to the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineToShell {
    MeshLoaded(MeshSummary),

    MeshRemoved { slot: SlotName },

    /// Also sent after assembly and collision moves
    MeshUpdated(MeshSummary),

    Assembled {
        plane_y: f32,
        /// Slots hidden by assembly
        hidden: Vec<SlotName>,
    },

    GapDetected {
        anchor: [f32; 3],
        /// Mean clearance of the winning cluster, absent on fallback
        clearance: Option<f32>,
        clusters: usize,
        fallback: bool,
    },

    RestorationReady {
        summary: MeshSummary,
        dimensions: RestorationDims,
        anchor: [f32; 3],
    },

    /// Pointer released after a sculpt drag
    StrokeFinished {
        slot: SlotName,
        applied_dabs: usize,
        /// Collision resolution moved the mesh
        moved: bool,
        displacement: [f32; 3],
    },

    HistoryChanged { can_undo: bool, can_redo: bool },

    /// Show a sphere at the anchor for a limited time
    MarkerShown {
        position: [f32; 3],
        radius: f32,
        seconds: f32,
    },

    MarkerExpired,

    Exported {
        slot: SlotName,
        reference: ExportReference,
        bytes: Vec<u8>,
    },

    RecordReady {
        record: RestorationRecord,
        export_bytes: Option<Vec<u8>>,
    },

    /// Error notification
    Error { code: String, message: String },
}

impl EngineToShell {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}
