//! # pennant-sim
//!
//! Host-side orchestration of the per-tick cloth compute pipeline.
//!
//! ## Pipeline
//!
//! ```text
//! SimulationDriver::tick()
//!   for each ClothInstance (insertion order):
//!     ParameterSource       → ExternalParameters (wind)
//!     ComputeStageSequencer → INTEGRATE → NORMALS → SMOOTH
//!     PresentationBridge    → copy positions | normals into the render mesh
//! ```
//!
//! ## Key Types
//!
//! - [`SimulationState`] — the fixed device buffers of one cloth, addressed
//!   by [`BufferRole`], with a ping-ponged [`VelocityPair`].
//! - [`ComputeStageSequencer`] — the three ordered dispatches of a tick.
//! - [`PresentationBridge`] — hand-off of tick results to the render mesh.
//! - [`SimulationDriver`] — owns the live instances and drives them.
//! - [`SimulationConfig`] — TOML-loadable settings with presets.

pub mod bridge;
pub mod buffers;
pub mod config;
pub mod driver;
pub mod instance;
pub mod params;
pub mod sequencer;

pub use bridge::{PresentationBridge, SyncOutcome};
pub use buffers::{BufferRole, SimulationState, VelocityPair};
pub use config::SimulationConfig;
pub use driver::{SimulationDriver, TickSummary};
pub use instance::ClothInstance;
pub use params::{ConstantWind, ParameterSource};
pub use sequencer::{ComputeStageSequencer, Stage};
