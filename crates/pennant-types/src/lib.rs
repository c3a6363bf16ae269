//! # pennant-types
//!
//! Shared identifiers, error types, and pipeline constants
//! for the Pennant cloth compute pipeline.
//!
//! This crate has zero domain logic — it defines the vocabulary
//! that all other Pennant crates share.

pub mod constants;
pub mod error;
pub mod ids;

pub use error::{PennantError, PennantResult};
pub use ids::{BufferId, ClothId, RenderMeshId};
