//! Occlusal restoration workflow: from two arch scans to a placed pad.
//!
//! - [`assembly`] - Fit the upper and lower arch together
//! - [`gap`] - Find the missing-tooth cavity with a scan grid
//! - [`generator`] - Build the occlusal pad at the chosen anchor
//! - [`collision`] - Keep restorations from overlapping each other

pub mod assembly;
pub mod collision;
pub mod error;
pub mod gap;
pub mod generator;

pub use assembly::{AssemblyReport, assemble};
pub use collision::{CollisionReport, resolve, resolve_against};
pub use error::{Prerequisite, RestorationError};
pub use gap::{GapCandidate, GapCluster, GapDetector, GapReport};
pub use generator::{
    GeneratedRestoration, RestorationDimensions, RestorationGenerator, RestorationInfo,
    RestorationParameters, reset_to_rest,
};
