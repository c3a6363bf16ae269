//! # pennant-mesh
//!
//! Rest-pose geometry for simulated cloth.
//!
//! ## Key Types
//!
//! - [`GridTopology`] — Regular row-major grid (positions, normals, UVs,
//!   triangle indices). Immutable once generated.
//! - [`GpuVec3`] / [`GpuVec2`] — `#[repr(C)]` vector layouts exactly as the
//!   device stores them.
//! - [`Placement`] — World transform of a cloth replacing a scene entity.

pub mod grid;
pub mod placement;
pub mod vector;

pub use grid::{generate, GridTopology};
pub use placement::Placement;
pub use vector::{GpuVec2, GpuVec3};
