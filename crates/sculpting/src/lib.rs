//! Restoration sculpting for Occlusal.
//!
//! This crate provides brush-based deformation of restoration meshes with:
//! - Six deformation kernels (sculpt, smooth, inflate, pinch, flatten, remove)
//! - Polynomial falloff around the brush hit point
//! - Snapshot-based undo/redo with a redo tip
//!
//! ## Key Components
//!
//! - **Types**: Brush configuration and validation
//! - **Brush**: Ray to dab, then dab to mesh
//! - **Deformation**: Vertex displacement algorithms
//! - **History**: Position snapshots and the undo cursor

pub mod brush;
pub mod deformation;
pub mod history;
pub mod types;

pub use brush::{apply_at_hit, apply_stroke};
pub use deformation::{DabInfo, DeformationResult, falloff};
pub use history::{HistoryManager, HistorySnapshot};
pub use types::{BrushConfig, BrushConfigError, BrushMode, BrushOperation};
