//! Mesh identification and file formats.

use serde::{Deserialize, Serialize};

/// Named place a mesh occupies in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotName {
    UpperArch,
    LowerArch,
    FirstBite,
    SecondBite,
    /// Restoration imported from a file
    OcclusionPad,
    /// Restoration produced by the generator
    Restoration,
}

/// Import format hint; omitted when the shell cannot tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshFileFormat {
    Stl,
    Obj,
}

/// Export encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFileFormat {
    #[default]
    StlBinary,
    StlAscii,
    Obj,
}

/// Coordinate space of exported vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportSpaceName {
    #[default]
    World,
    Local,
}

/// What the shell needs to display a stored mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSummary {
    pub slot: SlotName,
    /// Store handle, never reused
    pub id: u64,
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub visible: bool,
    pub editable: bool,
    /// World-space bounds
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}
