//! The per-tick driver.
//!
//! Owns the device, the render meshes and the live cloth instances, and
//! runs every instance through sequencer and bridge once per host tick.

use std::time::Instant;

use pennant_gpu::{ComputeDevice, CpuDevice, KernelLibrary, KernelNames, KernelRegistry};
use pennant_mesh::{generate, GpuVec3, Placement};
use pennant_render::{DeviceMeshStore, RenderMeshProvider};
use pennant_telemetry::{EventBus, EventKind, EventSink, SimulationEvent};
use pennant_types::{ClothId, PennantError, PennantResult};

use crate::bridge::{PresentationBridge, SyncOutcome};
use crate::buffers::{BufferRole, SimulationState};
use crate::config::SimulationConfig;
use crate::instance::ClothInstance;
use crate::params::{ConstantWind, ParameterSource};
use crate::sequencer::{ComputeStageSequencer, Stage};

/// What one call to [`SimulationDriver::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummary {
    pub tick: u64,
    /// Instances run through the pipeline.
    pub instances: usize,
    pub synced: usize,
    pub skipped: usize,
    /// Host-side submission time (seconds).
    pub wall_time: f64,
}

/// Drives every live cloth instance once per host tick.
pub struct SimulationDriver<D: ComputeDevice, M: RenderMeshProvider> {
    device: D,
    meshes: M,
    sequencer: ComputeStageSequencer,
    params: Box<dyn ParameterSource>,
    instances: Vec<ClothInstance>,
    next_id: u32,
    tick: u64,
    lost: Option<String>,
    bus: EventBus,
}

impl SimulationDriver<CpuDevice, DeviceMeshStore> {
    /// A driver over the reference device, reference kernels and a
    /// device-backed mesh store, blowing the configured wind.
    pub fn reference(config: &SimulationConfig) -> PennantResult<Self> {
        config.validate()?;
        let driver = Self::new(
            config.reference_device(),
            DeviceMeshStore::new(),
            &KernelRegistry::with_reference_kernels(),
            &config.kernels,
        )?;
        Ok(driver.with_parameter_source(ConstantWind::new(config.wind_vector())))
    }
}

impl<D: ComputeDevice, M: RenderMeshProvider> SimulationDriver<D, M> {
    /// Resolves the pipeline kernels and builds an empty driver blowing the
    /// default wind.
    ///
    /// # Errors
    /// [`PennantError::KernelNotFound`] if any of the three kernels is
    /// missing from `library`.
    pub fn new(device: D, meshes: M, library: &dyn KernelLibrary, names: &KernelNames) -> PennantResult<Self> {
        let sequencer = ComputeStageSequencer::from_library(library, names).map_err(|e| {
            tracing::error!(error = %e, "cannot build compute pipeline");
            e
        })?;
        tracing::debug!(
            device = device.name(),
            ordering = ?device.ordering(),
            width = sequencer.width(),
            "compute pipeline ready"
        );
        Ok(Self {
            device,
            meshes,
            sequencer,
            params: Box::new(ConstantWind::default()),
            instances: Vec::new(),
            next_id: 0,
            tick: 0,
            lost: None,
            bus: EventBus::new(),
        })
    }

    /// Replaces the per-tick parameter source.
    pub fn with_parameter_source(mut self, source: impl ParameterSource + 'static) -> Self {
        self.set_parameter_source(source);
        self
    }

    pub fn set_parameter_source(&mut self, source: impl ParameterSource + 'static) {
        self.params = Box::new(source);
    }

    /// Registers a telemetry sink. Events are flushed at the end of every tick.
    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.bus.add_sink(sink);
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Creates a cloth of `width × height` vertices and schedules it from
    /// the next tick on.
    ///
    /// # Errors
    /// - [`PennantError::InvalidDimension`] for a dimension below 2.
    /// - [`PennantError::BufferAllocationFailure`] when the device runs out
    ///   of memory; nothing is left allocated and nothing is registered.
    /// - [`PennantError::DeviceLost`] after a device failure.
    pub fn spawn_cloth(&mut self, width: u32, height: u32, placement: Placement) -> PennantResult<ClothId> {
        self.ensure_alive()?;
        let topology = generate(width, height)?;
        let state = match SimulationState::allocate(&topology, &mut self.device) {
            Ok(state) => state,
            Err(e) => return Err(self.record_failure(e)),
        };
        let mesh = match self.meshes.create_mesh(&mut self.device, &topology) {
            Ok(mesh) => mesh,
            Err(e) => {
                if let Err(release_err) = state.release(&mut self.device) {
                    tracing::warn!(error = %release_err, "releasing state of failed spawn");
                }
                return Err(self.record_failure(e));
            }
        };

        let id = ClothId(self.next_id);
        self.next_id += 1;
        self.instances.push(ClothInstance::new(id, topology, state, mesh, placement));

        tracing::info!(cloth = %id, width, height, mesh = mesh.0, "cloth registered");
        self.bus.emit(SimulationEvent::new(
            self.tick,
            EventKind::InstanceRegistered { cloth: id, width, height },
        ));
        Ok(id)
    }

    /// Stops scheduling a cloth and frees its buffers once the device queue
    /// has drained. Returns `false` if no such cloth is live.
    pub fn remove_cloth(&mut self, id: ClothId) -> PennantResult<bool> {
        let Some(position) = self.instances.iter().position(|c| c.id() == id) else {
            return Ok(false);
        };
        if let Err(e) = self.device.wait_idle() {
            return Err(self.record_failure(e));
        }
        let (state, mesh) = self.instances.remove(position).into_parts();

        let mesh_result = self.meshes.release_mesh(&mut self.device, mesh);
        let state_result = state.release(&mut self.device);
        if let Err(e) = mesh_result {
            if let Err(state_err) = state_result {
                tracing::warn!(cloth = %id, error = %state_err, "releasing state of removed cloth");
            }
            return Err(self.record_failure(e));
        }
        if let Err(e) = state_result {
            return Err(self.record_failure(e));
        }

        tracing::info!(cloth = %id, "cloth removed");
        self.bus.emit(SimulationEvent::new(self.tick, EventKind::InstanceRemoved { cloth: id }));
        self.bus.flush();
        Ok(true)
    }

    /// Removes every cloth and finalizes the telemetry sinks.
    pub fn shutdown(&mut self) -> PennantResult<()> {
        let ids: Vec<ClothId> = self.instances.iter().map(|c| c.id()).collect();
        for id in ids {
            self.remove_cloth(id)?;
        }
        self.bus.finalize();
        Ok(())
    }

    /// Runs every live instance through the pipeline once.
    ///
    /// # Errors
    /// [`PennantError::DeviceLost`] if the device fails; every later tick
    /// fails the same way. Other errors are programming errors and are
    /// propagated unchanged.
    pub fn tick(&mut self) -> PennantResult<TickSummary> {
        self.ensure_alive()?;
        let start = Instant::now();
        let tick = self.tick;
        tracing::debug!(tick, instances = self.instances.len(), "tick begin");
        self.bus.emit(SimulationEvent::new(
            tick,
            EventKind::TickBegin {
                instances: self.instances.len(),
            },
        ));

        let (synced, skipped) = match self.run_instances(tick) {
            Ok(counts) => counts,
            Err(e) => {
                let e = self.record_failure(e);
                self.bus.flush();
                return Err(e);
            }
        };

        let summary = TickSummary {
            tick,
            instances: self.instances.len(),
            synced,
            skipped,
            wall_time: start.elapsed().as_secs_f64(),
        };
        self.bus.emit(SimulationEvent::new(
            tick,
            EventKind::TickEnd {
                wall_time: summary.wall_time,
                synced,
                skipped,
            },
        ));
        self.bus.flush();
        self.tick += 1;
        Ok(summary)
    }

    fn run_instances(&mut self, tick: u64) -> PennantResult<(usize, usize)> {
        let mut synced = 0;
        let mut skipped = 0;

        for instance in &mut self.instances {
            let cloth = instance.id();
            let params = self.params.parameters(tick, cloth);
            let size = self.sequencer.run_tick(&mut instance.state, &params, &mut self.device)?;
            for stage in Stage::ORDER {
                self.bus.emit(SimulationEvent::new(
                    tick,
                    EventKind::StageDispatched {
                        cloth,
                        stage: stage.label().to_string(),
                        groups: size.groups,
                    },
                ));
            }

            match PresentationBridge::sync(&instance.state, instance.mesh(), &mut self.meshes, &mut self.device)? {
                SyncOutcome::Synced { bytes } => {
                    synced += 1;
                    self.bus.emit(SimulationEvent::new(tick, EventKind::SyncCompleted { cloth, bytes }));
                }
                SyncOutcome::Skipped { reason } => {
                    skipped += 1;
                    self.bus.emit(SimulationEvent::new(tick, EventKind::SyncSkipped { cloth, reason }));
                }
            }
        }

        Ok((synced, skipped))
    }

    fn ensure_alive(&self) -> PennantResult<()> {
        match &self.lost {
            Some(reason) => Err(PennantError::DeviceLost(reason.clone())),
            None => Ok(()),
        }
    }

    fn record_failure(&mut self, error: PennantError) -> PennantError {
        if let PennantError::DeviceLost(reason) = &error {
            tracing::error!(tick = self.tick, %reason, "device lost, refusing further ticks");
            self.lost = Some(reason.clone());
        }
        error
    }

    /// Blocking readback of one buffer of a live cloth. Diagnostics only.
    pub fn read_buffer(&mut self, id: ClothId, role: BufferRole) -> PennantResult<Vec<GpuVec3>> {
        let instance = self
            .instances
            .iter()
            .find(|c| c.id() == id)
            .ok_or_else(|| PennantError::InvalidBufferAccess(format!("unknown cloth {id}")))?;
        instance.state().read(&mut self.device, role)
    }

    // ─── Accessors ────────────────────────────────────────────

    /// Number of completed ticks.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn is_lost(&self) -> bool {
        self.lost.is_some()
    }

    pub fn instance(&self, id: ClothId) -> Option<&ClothInstance> {
        self.instances.iter().find(|c| c.id() == id)
    }

    /// Live instances in insertion order.
    pub fn instances(&self) -> &[ClothInstance] {
        &self.instances
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn sequencer(&self) -> &ComputeStageSequencer {
        &self.sequencer
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn meshes(&self) -> &M {
        &self.meshes
    }

    pub fn meshes_mut(&mut self) -> &mut M {
        &mut self.meshes
    }

    /// Split borrow of device and mesh provider, for frame capture.
    pub fn device_and_meshes(&mut self) -> (&mut D, &M) {
        (&mut self.device, &self.meshes)
    }
}
