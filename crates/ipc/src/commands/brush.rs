//! Brush settings as sent by the shell.

use serde::{Deserialize, Serialize};

/// Deformation kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushKind {
    #[default]
    Sculpt,
    Smooth,
    Inflate,
    Pinch,
    Flatten,
    Remove,
}

/// Add or subtract for signed kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushDirection {
    #[default]
    Add,
    Subtract,
}

/// Complete brush state; replaces the engine's brush wholesale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Radius in world units (> 0)
    pub radius: f32,
    /// Strength (0 to 2)
    pub strength: f32,
    pub kind: BrushKind,
    pub direction: BrushDirection,
    /// Falloff exponent (>= 0)
    pub falloff: f32,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            radius: 5.0,
            strength: 0.5,
            kind: BrushKind::Sculpt,
            direction: BrushDirection::Add,
            falloff: 2.0,
        }
    }
}
