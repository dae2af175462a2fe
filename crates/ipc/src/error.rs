//! Error types for IPC operations.

/// Errors that can occur while encoding or decoding protocol messages.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    #[error("Failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid message format: {0}")]
    InvalidFormat(String),
}

impl IpcError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Serialize(_) => "serialize",
            Self::InvalidFormat(_) => "invalid_format",
        }
    }
}
