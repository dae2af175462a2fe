//! Restoration record handed to the medical record collaborator.

use occlusal_config::{DEFAULT_BORDER_THICKNESS, DEFAULT_CEMENT_GAP, DEFAULT_INSERTION_ANGLE};
use serde::{Deserialize, Serialize};

use super::mesh::ExportFileFormat;

/// Operator-editable restoration settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestorationParams {
    /// Cement gap in mm (>= 0)
    pub cement_gap: f32,
    /// Insertion-path angle in degrees (0 to 45)
    pub insertion_angle: f32,
    /// Border thickness in mm (> 0)
    pub border_thickness: f32,
}

impl Default for RestorationParams {
    fn default() -> Self {
        Self {
            cement_gap: DEFAULT_CEMENT_GAP,
            insertion_angle: DEFAULT_INSERTION_ANGLE,
            border_thickness: DEFAULT_BORDER_THICKNESS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestorationDims {
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

/// Progress of the session when the record was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordState {
    pub has_upper_arch: bool,
    pub has_lower_arch: bool,
    pub assembled: bool,
    pub has_restoration: bool,
}

/// Where the exported restoration bytes go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReference {
    pub format: ExportFileFormat,
    /// Suggested file name
    pub file_name: String,
    pub byte_length: usize,
}

/// Persistable summary of a restoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestorationRecord {
    pub patient_id: String,
    pub parameters: RestorationParams,
    pub dimensions: Option<RestorationDims>,
    pub anchor: Option<[f32; 3]>,
    /// Clearance measured at the anchor
    pub clearance: Option<f32>,
    pub state: RecordState,
    pub export: Option<ExportReference>,
}

impl RestorationRecord {
    pub fn to_json(&self) -> Result<String, crate::IpcError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occlusal_config::RestorationConfig;

    #[test]
    fn test_params_default_to_engine_config() {
        let config = RestorationConfig::default();
        let params = RestorationParams::default();
        assert_eq!(params.cement_gap, config.cement_gap);
        assert_eq!(params.insertion_angle, config.insertion_angle);
        assert_eq!(params.border_thickness, config.border_thickness);

        let partial: RestorationParams =
            serde_json::from_str(r#"{"insertion_angle": 12.0}"#).unwrap();
        assert_eq!(partial.insertion_angle, 12.0);
        assert_eq!(partial.cement_gap, config.cement_gap);
    }
}
