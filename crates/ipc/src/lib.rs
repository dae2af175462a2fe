//! IPC message protocol for Occlusal
//!
//! Defines all message types exchanged between the interactive shell and the
//! assembly and sculpting engine. Everything here is plain serde data; the
//! engine converts to and from its domain types at the boundary.

pub mod commands;
pub mod error;
pub mod messages;
pub mod types;

pub use commands::*;
pub use error::IpcError;
pub use messages::*;
pub use types::*;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Parse a message from its JSON form.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, IpcError> {
    serde_json::from_str(text).map_err(|e| IpcError::InvalidFormat(e.to_string()))
}

pub fn to_json<T: Serialize>(message: &T) -> Result<String, IpcError> {
    Ok(serde_json::to_string(message)?)
}
