//! Pipeline event types.
//!
//! Lightweight value types emitted by the driver at fixed points of each
//! tick. They carry just enough data to monitor the pipeline.

use serde::{Deserialize, Serialize};

use pennant_types::ClothId;

/// An event tagged with the tick that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Driver tick number (0-indexed).
    pub tick: u64,
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Tick started.
    TickBegin {
        /// Instances scheduled this tick.
        instances: usize,
    },

    /// One compute stage was submitted for an instance.
    StageDispatched {
        cloth: ClothId,
        /// Stage label: `integrate`, `normals` or `smooth`.
        stage: String,
        groups: u32,
    },

    /// Positions and normals were copied into the render mesh.
    SyncCompleted { cloth: ClothId, bytes: usize },

    /// The render mesh was unavailable; nothing was copied.
    SyncSkipped { cloth: ClothId, reason: String },

    InstanceRegistered {
        cloth: ClothId,
        width: u32,
        height: u32,
    },

    InstanceRemoved { cloth: ClothId },

    /// Tick completed.
    TickEnd {
        /// Host-side submission time for the whole tick (seconds).
        wall_time: f64,
        synced: usize,
        skipped: usize,
    },

    /// Custom event for extensibility.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl SimulationEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    /// Short machine-friendly name of the payload variant.
    pub fn label(&self) -> &str {
        match &self.kind {
            EventKind::TickBegin { .. } => "tick_begin",
            EventKind::StageDispatched { .. } => "stage_dispatched",
            EventKind::SyncCompleted { .. } => "sync_completed",
            EventKind::SyncSkipped { .. } => "sync_skipped",
            EventKind::InstanceRegistered { .. } => "instance_registered",
            EventKind::InstanceRemoved { .. } => "instance_removed",
            EventKind::TickEnd { .. } => "tick_end",
            EventKind::Custom { label, .. } => label,
        }
    }
}
