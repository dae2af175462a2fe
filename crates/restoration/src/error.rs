use std::fmt;

use geometry::{MeshError, MeshSlot};

/// Step or mesh an operation depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    Mesh(MeshSlot),
    Assembly,
    Restoration,
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(slot) => write!(f, "{} mesh is not loaded", slot.label()),
            Self::Assembly => f.write_str("arches have not been assembled"),
            Self::Restoration => f.write_str("no restoration has been generated"),
        }
    }
}

/// Errors raised by assembly, detection and generation
#[derive(Debug, thiserror::Error)]
pub enum RestorationError {
    #[error("Missing input: {0}")]
    MissingInput(Prerequisite),

    #[error("Invalid restoration parameters: {0}")]
    InvalidParameters(String),

    #[error("Generated mesh is invalid: {0}")]
    Mesh(#[from] MeshError),
}

impl RestorationError {
    /// Stable identifier reported to the shell
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingInput(_) => "missing_input",
            Self::InvalidParameters(_) => "invalid_parameters",
            Self::Mesh(_) => "invalid_mesh",
        }
    }

    pub(crate) fn missing_mesh(slot: MeshSlot) -> Self {
        Self::MissingInput(Prerequisite::Mesh(slot))
    }
}
