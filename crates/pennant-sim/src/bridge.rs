//! Hand-off of tick results to the render mesh.
//!
//! Positions land at byte offset 0 of the mesh's vertex buffer and normals
//! at byte offset `N * 16`, the start of its normal block. Only meshes sized
//! for exactly the cloth's `N` vertices are accepted.
//! Both copies run on the device, queued behind the tick's final stage.

use pennant_gpu::ComputeDevice;
use pennant_render::RenderMeshProvider;
use pennant_types::{PennantError, PennantResult, RenderMeshId};

use crate::buffers::{BufferRole, SimulationState};

/// Result of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Both blocks were copied; `bytes` in total.
    Synced { bytes: usize },
    /// The render mesh could not be acquired this tick. Nothing was copied.
    Skipped { reason: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Copies a cloth's final positions and normals into its render mesh.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationBridge;

impl PresentationBridge {
    /// Queues the copies for `state` into `mesh`.
    ///
    /// An unavailable render mesh is not an error: the sync is skipped for
    /// this tick and the simulation state is left untouched.
    ///
    /// # Errors
    /// [`PennantError::InvalidBufferAccess`] if the mesh's vertex capacity
    /// differs from the state's vertex count, or any device error.
    pub fn sync<M>(
        state: &SimulationState,
        mesh: RenderMeshId,
        meshes: &mut M,
        device: &mut dyn ComputeDevice,
    ) -> PennantResult<SyncOutcome>
    where
        M: RenderMeshProvider + ?Sized,
    {
        let target = match meshes.acquire_vertex_buffer(mesh) {
            Ok(handle) => handle,
            Err(PennantError::RenderMeshUnavailable(reason)) => {
                tracing::warn!(mesh = mesh.0, %reason, "render mesh unavailable, skipping sync");
                return Ok(SyncOutcome::Skipped { reason });
            }
            Err(e) => return Err(e),
        };

        let layout = meshes
            .descriptor(mesh)
            .map(|d| d.layout)
            .ok_or_else(|| PennantError::InvalidBufferAccess(format!("render mesh {} has no descriptor", mesh.0)))?;
        if layout.vertex_capacity != state.vertex_count() {
            return Err(PennantError::InvalidBufferAccess(format!(
                "render mesh {} holds {} vertices, cloth has {}",
                mesh.0,
                layout.vertex_capacity,
                state.vertex_count()
            )));
        }

        if device.ordering().requires_barriers() {
            device.barrier()?;
        }

        let block = state.buffer_len();
        device.copy(
            state.buffer(BufferRole::OutputPositions),
            0,
            target,
            layout.position_offset(),
            block,
        )?;
        device.copy(
            state.buffer(BufferRole::NormalOutput),
            0,
            target,
            layout.normal_offset(),
            block,
        )?;

        tracing::trace!(mesh = mesh.0, bytes = 2 * block, "synced render mesh");
        Ok(SyncOutcome::Synced { bytes: 2 * block })
    }
}
