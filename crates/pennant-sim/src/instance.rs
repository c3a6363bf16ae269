//! A simulated cloth: its state, its render mesh and where it sits.

use pennant_mesh::{GridTopology, Placement};
use pennant_types::{ClothId, RenderMeshId};

use crate::buffers::SimulationState;

/// Binds one [`SimulationState`] to one render mesh and a placement.
#[derive(Debug)]
pub struct ClothInstance {
    id: ClothId,
    topology: GridTopology,
    pub(crate) state: SimulationState,
    mesh: RenderMeshId,
    placement: Placement,
}

impl ClothInstance {
    pub(crate) fn new(
        id: ClothId,
        topology: GridTopology,
        state: SimulationState,
        mesh: RenderMeshId,
        placement: Placement,
    ) -> Self {
        Self {
            id,
            topology,
            state,
            mesh,
            placement,
        }
    }

    pub fn id(&self) -> ClothId {
        self.id
    }

    pub fn topology(&self) -> &GridTopology {
        &self.topology
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn mesh(&self) -> RenderMeshId {
        self.mesh
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub(crate) fn into_parts(self) -> (SimulationState, RenderMeshId) {
        (self.state, self.mesh)
    }
}
