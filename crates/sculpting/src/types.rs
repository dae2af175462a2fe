//! Brush configuration types.

use serde::{Deserialize, Serialize};

/// Default brush radius in world units
pub const DEFAULT_BRUSH_RADIUS: f32 = 5.0;
/// Default brush strength
pub const DEFAULT_BRUSH_STRENGTH: f32 = 0.5;
/// Default falloff exponent
pub const DEFAULT_FALLOFF_EXPONENT: f32 = 2.0;
/// Largest accepted brush strength
pub const MAX_BRUSH_STRENGTH: f32 = 2.0;

/// Deformation kernel applied by a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BrushOperation {
    /// Move vertices along the hit face normal
    #[default]
    Sculpt = 0,
    /// Blend vertices toward their nearby neighbours
    Smooth = 1,
    /// Move vertices along their own normals
    Inflate = 2,
    /// Pull vertices toward the hit point
    Pinch = 3,
    /// Project vertices onto the plane through the hit point
    Flatten = 4,
    /// Carve inward along vertex normals regardless of mode
    Remove = 5,
}

/// Direction modifier for signed kernels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushMode {
    #[default]
    Add,
    Subtract,
}

impl BrushMode {
    /// +1 for add, -1 for subtract
    pub fn sign(self) -> f32 {
        match self {
            Self::Add => 1.0,
            Self::Subtract => -1.0,
        }
    }
}

/// Errors returned by [`BrushConfig::validate`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BrushConfigError {
    #[error("Brush radius must be positive, got {0}")]
    Radius(f32),

    #[error("Brush strength must lie in (0, 2], got {0}")]
    Strength(f32),

    #[error("Falloff exponent must not be negative, got {0}")]
    Falloff(f32),
}

/// Live brush settings; replaced wholesale whenever the operator changes them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushConfig {
    /// Influence radius in world units
    pub radius: f32,
    /// Displacement scale, (0, 2]
    pub strength: f32,
    pub operation: BrushOperation,
    pub mode: BrushMode,
    /// Exponent applied to the linear falloff, >= 0
    pub falloff: f32,
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_BRUSH_RADIUS,
            strength: DEFAULT_BRUSH_STRENGTH,
            operation: BrushOperation::Sculpt,
            mode: BrushMode::Add,
            falloff: DEFAULT_FALLOFF_EXPONENT,
        }
    }
}

impl BrushConfig {
    pub fn validate(&self) -> Result<(), BrushConfigError> {
        if !(self.radius > 0.0 && self.radius.is_finite()) {
            return Err(BrushConfigError::Radius(self.radius));
        }
        if !(self.strength > 0.0 && self.strength <= MAX_BRUSH_STRENGTH) {
            return Err(BrushConfigError::Strength(self.strength));
        }
        if !(self.falloff >= 0.0 && self.falloff.is_finite()) {
            return Err(BrushConfigError::Falloff(self.falloff));
        }
        Ok(())
    }

    /// Whether a stroke with these settings can move anything
    pub fn is_active(&self) -> bool {
        self.radius > 0.0 && self.strength > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_brush_is_valid() {
        let config = BrushConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_active());
        assert_eq!(config.operation, BrushOperation::Sculpt);
        assert_eq!(config.mode, BrushMode::Add);
    }

    #[test]
    fn test_validation_ranges() {
        let with = |edit: fn(&mut BrushConfig)| {
            let mut config = BrushConfig::default();
            edit(&mut config);
            config.validate()
        };
        assert_eq!(with(|c| c.radius = 0.0), Err(BrushConfigError::Radius(0.0)));
        assert_eq!(with(|c| c.strength = 2.5), Err(BrushConfigError::Strength(2.5)));
        assert!(with(|c| c.strength = 2.0).is_ok());
        assert_eq!(with(|c| c.falloff = -1.0), Err(BrushConfigError::Falloff(-1.0)));
        assert!(with(|c| c.falloff = 0.0).is_ok());
    }

    #[test]
    fn test_config_serde_names() {
        let json = r#"{ "operation": "flatten", "mode": "subtract", "radius": 2.0 }"#;
        let config: BrushConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.operation, BrushOperation::Flatten);
        assert_eq!(config.mode, BrushMode::Subtract);
        assert_eq!(config.radius, 2.0);
        assert_eq!(config.strength, DEFAULT_BRUSH_STRENGTH);
    }
}
