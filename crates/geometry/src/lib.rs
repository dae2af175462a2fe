//! Occlusal geometry - meshes, spatial queries and the mesh store
//!
//! This crate provides the data layer every other component builds on:
//! - [`mesh::Mesh`] - Triangle mesh with parallel position/normal buffers and a world transform
//! - [`aabb::Aabb`] - Axis-aligned bounding boxes
//! - [`spatial`] - Ray casting and world-space bounds
//! - [`io`] - STL and OBJ import/export
//! - [`primitives`] - Procedural boxes and tapered cylinders
//! - [`store::MeshStore`] - Slot-keyed ownership of every loaded mesh

pub mod aabb;
pub mod error;
pub mod io;
pub mod mesh;
pub mod primitives;
pub mod spatial;
pub mod store;

pub use aabb::Aabb;
pub use error::{ImportError, MeshError};
pub use io::{ExportFormat, ExportSpace, MeshFormat};
pub use mesh::{FaceGroup, GpuVertex, Mesh, MeshData, MeshRole, Transform};
pub use spatial::{MeshHit, bounding_box, raycast, raycast_all};
pub use store::{MeshId, MeshSlot, MeshStore};
