//! The three ordered compute stages of a tick.
//!
//! ```text
//! toggle velocity pair
//!   [barrier on unordered queues]
//! INTEGRATE  (P_ref, P_out, V_prev, V_next; params) → P_out, V_next
//!   [barrier on unordered queues]
//! NORMALS    (P_out, P_ref, Nw)                     → Nw
//!   [barrier on unordered queues]
//! SMOOTH     (Nw, No)                               → No
//! ```
//!
//! No branches and no retries: a failing stage fails the tick.
//!
//! The leading barrier keeps INTEGRATE from overwriting `P_out` while the
//! previous tick's render mesh copy may still be reading it.

use std::sync::Arc;

use pennant_gpu::{
    ComputeDevice, DispatchSize, ExternalParameters, Kernel, KernelLibrary, KernelNames, KernelSet,
};
use pennant_types::PennantResult;

use crate::buffers::{BufferRole, SimulationState};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Integrate,
    Normals,
    Smooth,
}

impl Stage {
    /// Execution order within a tick.
    pub const ORDER: [Stage; 3] = [Stage::Integrate, Stage::Normals, Stage::Smooth];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Integrate => "integrate",
            Stage::Normals => "normals",
            Stage::Smooth => "smooth",
        }
    }

    /// Buffer roles bound to the stage's kernel, in slot order.
    pub fn bindings(self) -> &'static [BufferRole] {
        match self {
            Stage::Integrate => &[
                BufferRole::ReferencePositions,
                BufferRole::OutputPositions,
                BufferRole::PreviousVelocity,
                BufferRole::NextVelocity,
            ],
            Stage::Normals => &[
                BufferRole::OutputPositions,
                BufferRole::ReferencePositions,
                BufferRole::NormalWork,
            ],
            Stage::Smooth => &[BufferRole::NormalWork, BufferRole::NormalOutput],
        }
    }
}

/// Issues the per-tick dispatches over a [`SimulationState`].
#[derive(Debug, Clone)]
pub struct ComputeStageSequencer {
    kernels: KernelSet,
    width: u32,
}

impl ComputeStageSequencer {
    /// Builds a sequencer over already-resolved kernels.
    ///
    /// The work-group width is queried once, from the integrate kernel, and
    /// reused by all three stages.
    pub fn new(kernels: KernelSet) -> Self {
        let width = kernels.integrate.optimal_width().max(1);
        Self { kernels, width }
    }

    /// Resolves the three kernels from `library`.
    ///
    /// # Errors
    /// [`PennantError::KernelNotFound`](pennant_types::PennantError::KernelNotFound)
    /// naming the first missing kernel.
    pub fn from_library(library: &dyn KernelLibrary, names: &KernelNames) -> PennantResult<Self> {
        Ok(Self::new(KernelSet::resolve(library, names)?))
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn kernels(&self) -> &KernelSet {
        &self.kernels
    }

    /// `⌈vertex_count / width⌉` groups of `width`.
    pub fn dispatch_size(&self, vertex_count: usize) -> DispatchSize {
        DispatchSize::for_elements(vertex_count, self.width)
    }

    fn kernel(&self, stage: Stage) -> &Arc<dyn Kernel> {
        match stage {
            Stage::Integrate => &self.kernels.integrate,
            Stage::Normals => &self.kernels.normals,
            Stage::Smooth => &self.kernels.smooth,
        }
    }

    /// Submits one tick's worth of work for `state`.
    ///
    /// Returns the dispatch size used by every stage. Submission only; the
    /// host does not wait for completion.
    pub fn run_tick(
        &self,
        state: &mut SimulationState,
        params: &ExternalParameters,
        device: &mut dyn ComputeDevice,
    ) -> PennantResult<DispatchSize> {
        let size = self.dispatch_size(state.vertex_count());
        let fenced = device.ordering().requires_barriers();

        state.toggle_velocity();

        for stage in Stage::ORDER {
            if fenced {
                device.barrier().map_err(|e| {
                    tracing::error!(stage = stage.label(), error = %e, "barrier before stage failed");
                    e
                })?;
            }

            let bindings: Vec<_> = stage.bindings().iter().map(|&role| state.buffer(role)).collect();
            let stage_params: &[u8] = match stage {
                Stage::Integrate => params.as_bytes(),
                Stage::Normals | Stage::Smooth => &[],
            };

            device
                .dispatch(self.kernel(stage), &bindings, stage_params, size)
                .map_err(|e| {
                    tracing::error!(stage = stage.label(), error = %e, "stage dispatch failed");
                    e
                })?;
            tracing::trace!(stage = stage.label(), groups = size.groups, width = size.width, "dispatched");
        }

        Ok(size)
    }
}
