//! Type definitions for IPC messages.

mod mesh;
mod record;

pub use mesh::*;
pub use record::*;
