//! Engine-level error type.

use geometry::{ImportError, MeshError};
use occlusal_config::ConfigError;
use occlusal_ipc::IpcError;
use restoration::RestorationError;
use sculpting::BrushConfigError;

/// Every failure the engine can report to the shell.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Invalid mesh: {0}")]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Restoration(#[from] RestorationError),

    #[error("Invalid brush: {0}")]
    Brush(#[from] BrushConfigError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ipc(#[from] IpcError),

    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),

    #[error("Invalid camera: {0}")]
    Camera(String),
}

impl EngineError {
    /// Stable identifier carried by `Error` events
    pub fn code(&self) -> &'static str {
        match self {
            Self::Import(err) => err.code(),
            Self::Mesh(_) => "invalid_mesh",
            Self::Restoration(err) => err.code(),
            Self::Brush(_) | Self::Camera(_) => "invalid_parameters",
            Self::Config(_) => "invalid_config",
            Self::Ipc(err) => err.code(),
            Self::Export(_) => "export_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restoration::Prerequisite;

    #[test]
    fn test_codes_pass_through() {
        let err: EngineError = ImportError::EmptyMesh.into();
        assert_eq!(err.code(), "empty_mesh");

        let err: EngineError = RestorationError::MissingInput(Prerequisite::Assembly).into();
        assert_eq!(err.code(), "missing_input");
        assert!(err.to_string().contains("assembled"));

        let err: EngineError = BrushConfigError::Radius(0.0).into();
        assert_eq!(err.code(), "invalid_parameters");
    }
}
