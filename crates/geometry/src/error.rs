//! Error types for mesh construction and import.

/// Violations of the mesh buffer invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("Index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("Index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },

    #[error("Expected {expected} normals, found {found}")]
    NormalCount { expected: usize, found: usize },

    #[error("Expected {expected} positions, found {found}")]
    PositionCount { expected: usize, found: usize },

    #[error("Face group '{name}' exceeds {triangles} triangles")]
    GroupRange { name: String, triangles: usize },

    #[error("Non-finite vertex position at {0}")]
    NonFinite(usize),
}

/// Errors that can occur while importing a mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ImportError {
    #[error("Unsupported mesh format")]
    UnsupportedFormat,

    #[error("Corrupt mesh data: {0}")]
    CorruptData(String),

    #[error("Mesh contains no triangles")]
    EmptyMesh,
}

impl ImportError {
    /// Stable identifier reported to the UI shell
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::CorruptData(_) => "corrupt_data",
            Self::EmptyMesh => "empty_mesh",
        }
    }

    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::CorruptData(message.into())
    }
}

impl From<MeshError> for ImportError {
    fn from(err: MeshError) -> Self {
        Self::CorruptData(err.to_string())
    }
}
