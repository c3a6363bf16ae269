//! Device-resident state of one cloth.
//!
//! Every cloth owns six fixed-size device buffers of `N` vectors each
//! (`N` = vertex count), allocated once at spawn and never resized:
//!
//! ```text
//! ReferencePositions   rest pose, written once at allocation
//! OutputPositions      integrate target for the current tick
//! velocity slot 0 ┐    ping-ponged: NextVelocity = slot[active],
//! velocity slot 1 ┘                 PreviousVelocity = slot[1 - active]
//! NormalWork           raw per-vertex normals
//! NormalOutput         smoothed normals, seeded from the rest pose
//! ```

use pennant_gpu::{AccessHint, BufferHandle, ComputeDevice};
use pennant_mesh::vector::pack_vec3;
use pennant_mesh::{GpuVec3, GridTopology};
use pennant_types::constants::VEC3_STRIDE;
use pennant_types::{PennantError, PennantResult};

/// Number of physical buffers behind one [`SimulationState`].
pub const PHYSICAL_BUFFER_COUNT: usize = 6;

/// Logical role of a simulation buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
    ReferencePositions,
    OutputPositions,
    PreviousVelocity,
    NextVelocity,
    NormalWork,
    NormalOutput,
}

impl BufferRole {
    pub const ALL: [BufferRole; 6] = [
        BufferRole::ReferencePositions,
        BufferRole::OutputPositions,
        BufferRole::PreviousVelocity,
        BufferRole::NextVelocity,
        BufferRole::NormalWork,
        BufferRole::NormalOutput,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BufferRole::ReferencePositions => "reference_positions",
            BufferRole::OutputPositions => "output_positions",
            BufferRole::PreviousVelocity => "previous_velocity",
            BufferRole::NextVelocity => "next_velocity",
            BufferRole::NormalWork => "normal_work",
            BufferRole::NormalOutput => "normal_output",
        }
    }
}

/// Two velocity buffers and the index of the one being written this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VelocityPair {
    slots: [BufferHandle; 2],
    active: usize,
}

impl VelocityPair {
    pub fn new(slots: [BufferHandle; 2]) -> Self {
        Self { slots, active: 0 }
    }

    /// Index of the slot written this tick (0 or 1).
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active
    }

    #[inline]
    pub fn next(&self) -> BufferHandle {
        self.slots[self.active]
    }

    #[inline]
    pub fn previous(&self) -> BufferHandle {
        self.slots[1 - self.active]
    }

    pub fn slots(&self) -> [BufferHandle; 2] {
        self.slots
    }

    #[inline]
    pub(crate) fn toggle(&mut self) {
        self.active = 1 - self.active;
    }
}

/// The device buffers of one cloth.
#[derive(Debug)]
pub struct SimulationState {
    vertex_count: usize,
    reference_positions: BufferHandle,
    output_positions: BufferHandle,
    velocities: VelocityPair,
    normal_work: BufferHandle,
    normal_output: BufferHandle,
}

impl SimulationState {
    /// Allocates and seeds the buffers for `topology`.
    ///
    /// Reference positions and output normals are uploaded from the
    /// topology; everything else starts zeroed.
    ///
    /// # Errors
    /// [`PennantError::BufferAllocationFailure`] if the device runs out of
    /// memory. Buffers already allocated for this state are released first.
    pub fn allocate(topology: &GridTopology, device: &mut dyn ComputeDevice) -> PennantResult<Self> {
        let mut allocated = Vec::with_capacity(PHYSICAL_BUFFER_COUNT);
        if let Err(e) = allocate_roles(topology, device, &mut allocated) {
            tracing::debug!(
                partial = allocated.len(),
                error = %e,
                "rolling back partial simulation state"
            );
            for handle in allocated {
                if let Err(release_err) = device.release(handle) {
                    tracing::warn!(buffer = handle.id().0, error = %release_err, "rollback release failed");
                }
            }
            return Err(e);
        }

        let [reference_positions, output_positions, v0, v1, normal_work, normal_output]: [BufferHandle;
            PHYSICAL_BUFFER_COUNT] = allocated.try_into().map_err(|v: Vec<BufferHandle>| {
            PennantError::InvalidBufferAccess(format!(
                "expected {PHYSICAL_BUFFER_COUNT} simulation buffers, allocated {}",
                v.len()
            ))
        })?;

        Ok(Self {
            vertex_count: topology.vertex_count(),
            reference_positions,
            output_positions,
            velocities: VelocityPair::new([v0, v1]),
            normal_work,
            normal_output,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Byte length of every buffer in the set.
    #[inline]
    pub fn buffer_len(&self) -> usize {
        self.vertex_count * VEC3_STRIDE
    }

    /// The physical buffer currently playing `role`.
    pub fn buffer(&self, role: BufferRole) -> BufferHandle {
        match role {
            BufferRole::ReferencePositions => self.reference_positions,
            BufferRole::OutputPositions => self.output_positions,
            BufferRole::PreviousVelocity => self.velocities.previous(),
            BufferRole::NextVelocity => self.velocities.next(),
            BufferRole::NormalWork => self.normal_work,
            BufferRole::NormalOutput => self.normal_output,
        }
    }

    pub fn velocities(&self) -> &VelocityPair {
        &self.velocities
    }

    #[inline]
    pub fn active_velocity_index(&self) -> usize {
        self.velocities.active_index()
    }

    /// Flips the velocity pair. The sequencer calls this exactly once per
    /// tick, before the integrate stage reads the previous velocity.
    pub(crate) fn toggle_velocity(&mut self) {
        self.velocities.toggle();
    }

    pub fn physical_buffers(&self) -> [BufferHandle; PHYSICAL_BUFFER_COUNT] {
        let [v0, v1] = self.velocities.slots();
        [
            self.reference_positions,
            self.output_positions,
            v0,
            v1,
            self.normal_work,
            self.normal_output,
        ]
    }

    /// Blocking readback of one role's contents. Diagnostics only.
    pub fn read(&self, device: &mut dyn ComputeDevice, role: BufferRole) -> PennantResult<Vec<GpuVec3>> {
        let bytes = device.read(self.buffer(role), 0, self.buffer_len())?;
        Ok(pennant_gpu::buffers::decode_slice(&bytes))
    }

    /// Drains the device queue, then frees every buffer.
    ///
    /// All buffers are attempted; the first failure is returned.
    pub fn release(self, device: &mut dyn ComputeDevice) -> PennantResult<()> {
        device.wait_idle()?;
        let mut first_error = None;
        for handle in self.physical_buffers() {
            if let Err(e) = device.release(handle) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn allocate_roles(
    topology: &GridTopology,
    device: &mut dyn ComputeDevice,
    allocated: &mut Vec<BufferHandle>,
) -> PennantResult<()> {
    let len = topology.vertex_count() * VEC3_STRIDE;
    let reference = pack_vec3(topology.positions());
    let normals = pack_vec3(topology.normals());

    allocated.push(device.allocate_with_data(bytemuck::cast_slice(&reference), AccessHint::Shared)?);
    allocated.push(device.allocate(len, AccessHint::DevicePrivate)?);
    allocated.push(device.allocate(len, AccessHint::DevicePrivate)?);
    allocated.push(device.allocate(len, AccessHint::DevicePrivate)?);
    allocated.push(device.allocate(len, AccessHint::DevicePrivate)?);
    allocated.push(device.allocate_with_data(bytemuck::cast_slice(&normals), AccessHint::Shared)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pennant_gpu::CpuDevice;
    use pennant_mesh::generate;
    use proptest::prelude::*;

    fn state() -> (CpuDevice, SimulationState) {
        let mut device = CpuDevice::new();
        let state = SimulationState::allocate(&generate(2, 2).unwrap(), &mut device).unwrap();
        (device, state)
    }

    #[test]
    fn toggle_swaps_previous_and_next() {
        let (_device, mut state) = state();
        let next = state.buffer(BufferRole::NextVelocity);
        let previous = state.buffer(BufferRole::PreviousVelocity);
        assert_ne!(next, previous);

        state.toggle_velocity();
        assert_eq!(state.buffer(BufferRole::NextVelocity), previous);
        assert_eq!(state.buffer(BufferRole::PreviousVelocity), next);
        assert_eq!(state.active_velocity_index(), 1);
    }

    proptest! {
        #[test]
        fn active_index_is_toggle_parity(toggles in 0usize..200) {
            let (_device, mut state) = state();
            for _ in 0..toggles {
                state.toggle_velocity();
            }
            prop_assert_eq!(state.active_velocity_index(), toggles % 2);
        }
    }
}
