//! Occlusal - dental arch assembly and restoration sculpting engine
//!
//! The [`Engine`] owns a session: the mesh store, the restoration workflow
//! services and the [`InteractionController`] that turns viewport pointer
//! input into brush strokes. Shells talk to it through the
//! [`occlusal_ipc`] message protocol; the `occlusal` binary drives the same
//! engine from the command line.

pub mod controller;
pub mod convert;
pub mod engine;
pub mod error;
pub mod input;
pub mod marker;
pub mod services;

pub use controller::{InteractionController, StrokeStep, StrokeSummary, ToolMode};
pub use engine::{Engine, ExportedMesh};
pub use error::EngineError;
pub use input::{Camera, Ray};
pub use marker::AnchorMarker;
pub use services::{
    AssemblyService, BrushService, KernelBrush, MidplaneAssembly, PadWorkshop, RestorationService,
};
