//! Command types for IPC messages.

mod brush;
mod pointer;

pub use brush::*;
pub use pointer::*;

use serde::{Deserialize, Serialize};

/// What a primary-button drag does in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolMode {
    /// Camera navigation and selection; strokes are ignored
    #[default]
    Select,
    /// Drags sculpt the restoration under the pointer
    Sculpt,
}
