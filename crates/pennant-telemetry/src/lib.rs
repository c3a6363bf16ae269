//! # pennant-telemetry
//!
//! Event bus for pipeline telemetry. The driver emits structured events
//! (tick boundaries, stage dispatches, syncs, instance lifecycle) that are
//! consumed by pluggable sinks.

pub mod bus;
pub mod events;
pub mod sinks;

pub use bus::EventBus;
pub use events::{EventKind, SimulationEvent};
pub use sinks::{EventSink, TracingSink, VecSink};
