//! Integration tests for pennant-sim building blocks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use pennant_gpu::{
    ComputeDevice, CpuDevice, ExternalParameters, Kernel, KernelInvocation, KernelNames, KernelRegistry,
};
use pennant_mesh::vector::{pack_vec2, pack_vec3};
use pennant_mesh::{generate, GpuVec3};
use pennant_render::{DeviceMeshStore, RenderMeshProvider};
use pennant_sim::bridge::{PresentationBridge, SyncOutcome};
use pennant_sim::buffers::{BufferRole, SimulationState};
use pennant_sim::config::SimulationConfig;
use pennant_sim::params::{ConstantWind, ParameterSource};
use pennant_sim::sequencer::{ComputeStageSequencer, Stage};
use pennant_types::{ClothId, PennantError, PennantResult};

// ─── Config ───────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = SimulationConfig::default();
    assert_eq!(config.grid_width, 32);
    assert_eq!(config.grid_height, 20);
    assert_eq!(config.wind, [1.8, 0.0, 0.0]);
    assert_eq!(config.kernels, KernelNames::default());
    assert_eq!(config.memory_budget_bytes, None);
    assert_eq!(config.vertex_count(), 640);
    config.validate().unwrap();
}

#[test]
fn presets_are_valid() {
    for name in ["default", "calm", "gale"] {
        SimulationConfig::preset(name).unwrap().validate().unwrap();
    }
    assert!(SimulationConfig::preset("hurricane").is_none());
    assert!(SimulationConfig::gale().wind_vector().length() > SimulationConfig::calm().wind_vector().length());
}

#[test]
fn partial_toml_uses_defaults() {
    let config = SimulationConfig::from_toml_str(
        r#"
        grid_width = 8
        wind = [0.5, 0.0, 0.25]

        [kernels]
        smooth = "blur_normal"
        "#,
    )
    .unwrap();
    assert_eq!(config.grid_width, 8);
    assert_eq!(config.grid_height, 20);
    assert_eq!(config.kernels.integrate, "update_vertex");
    assert_eq!(config.kernels.smooth, "blur_normal");
}

#[test]
fn invalid_configs_rejected() {
    let err = SimulationConfig::from_toml_str("grid_width = 1").unwrap_err();
    assert!(matches!(err, PennantError::InvalidDimension { width: 1, height: 20 }));

    let err = SimulationConfig::from_toml_str("grid_width = \"wide\"").unwrap_err();
    assert!(matches!(err, PennantError::Serialization(_)));

    let err = SimulationConfig::from_toml_str("[kernels]\nnormals = \" \"").unwrap_err();
    assert!(matches!(err, PennantError::InvalidConfig(_)));

    let config = SimulationConfig {
        wind: [f32::NAN, 0.0, 0.0],
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(PennantError::InvalidConfig(_))));
}

#[test]
fn config_toml_roundtrip() {
    let config = SimulationConfig {
        memory_budget_bytes: Some(1 << 20),
        ..SimulationConfig::gale()
    };
    let text = config.to_toml_string().unwrap();
    assert_eq!(SimulationConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn config_load_from_file() {
    let path = std::env::temp_dir().join(format!("pennant-config-{}.toml", std::process::id()));
    std::fs::write(&path, "grid_height = 6\nmemory_budget_bytes = 4096\n").unwrap();
    let config = SimulationConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(config.grid_height, 6);
    assert_eq!(config.memory_budget_bytes, Some(4096));

    let err = SimulationConfig::load(path.with_extension("missing")).unwrap_err();
    assert!(matches!(err, PennantError::Io(_)));
}

#[test]
fn reference_device_applies_budget() {
    let config = SimulationConfig {
        memory_budget_bytes: Some(32),
        ..Default::default()
    };
    let mut device = config.reference_device();
    assert!(device.allocate(64, pennant_gpu::AccessHint::Shared).is_err());
}

// ─── Parameter sources ────────────────────────────────────────

#[test]
fn constant_wind_every_tick() {
    let mut source = ConstantWind::default();
    let a = source.parameters(0, ClothId(0));
    let b = source.parameters(99, ClothId(3));
    assert_eq!(a, b);
    assert_eq!(a.wind, [1.8, 0.0, 0.0]);
}

#[test]
fn closure_parameter_source() {
    let mut source = |tick: u64, cloth: ClothId| {
        ExternalParameters::new(glam::Vec3::new(tick as f32, cloth.0 as f32, 0.0))
    };
    let p = ParameterSource::parameters(&mut source, 4, ClothId(2));
    assert_eq!(p.wind, [4.0, 2.0, 0.0]);
}

// ─── Simulation state ─────────────────────────────────────────

#[test]
fn state_allocation_seeds_buffers() {
    let grid = generate(4, 3).unwrap();
    let mut device = CpuDevice::new();
    let state = SimulationState::allocate(&grid, &mut device).unwrap();

    assert_eq!(device.buffer_count(), 6);
    assert_eq!(state.vertex_count(), 12);
    assert_eq!(state.buffer_len(), 12 * 16);
    assert_eq!(state.active_velocity_index(), 0);

    let reference = state.read(&mut device, BufferRole::ReferencePositions).unwrap();
    assert_eq!(reference, pack_vec3(grid.positions()));
    let normals = state.read(&mut device, BufferRole::NormalOutput).unwrap();
    assert!(normals.iter().all(|n| *n == GpuVec3::UP));
    for role in [
        BufferRole::OutputPositions,
        BufferRole::PreviousVelocity,
        BufferRole::NextVelocity,
        BufferRole::NormalWork,
    ] {
        let data = state.read(&mut device, role).unwrap();
        assert!(data.iter().all(|v| *v == GpuVec3::ZERO), "{role:?} not zeroed");
    }
}

#[test]
fn roles_map_to_distinct_buffers() {
    let mut device = CpuDevice::new();
    let state = SimulationState::allocate(&generate(2, 2).unwrap(), &mut device).unwrap();
    let handles: Vec<_> = BufferRole::ALL.iter().map(|&r| state.buffer(r).id()).collect();
    let mut unique = handles.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 6);
    assert_eq!(BufferRole::NormalWork.label(), "normal_work");
}

#[test]
fn failed_allocation_releases_partial_state() {
    // A 2x2 grid needs six 64-byte buffers; room for three.
    let mut device = CpuDevice::new().with_memory_budget(192);
    let err = SimulationState::allocate(&generate(2, 2).unwrap(), &mut device).unwrap_err();

    assert!(matches!(err, PennantError::BufferAllocationFailure { requested: 64, .. }));
    assert_eq!(device.buffer_count(), 0);
    assert_eq!(device.stats().allocations, 3);
    assert_eq!(device.stats().releases, 3);
    assert_eq!(device.stats().bytes_allocated, 0);
}

#[test]
fn release_drains_queue_first() {
    let grid = generate(3, 3).unwrap();
    let mut device = CpuDevice::new();
    let mut state = SimulationState::allocate(&grid, &mut device).unwrap();
    let sequencer = ComputeStageSequencer::from_library(
        &KernelRegistry::with_reference_kernels(),
        &KernelNames::default(),
    )
    .unwrap();

    sequencer.run_tick(&mut state, &ExternalParameters::default(), &mut device).unwrap();
    assert_eq!(device.pending_commands(), 3);

    state.release(&mut device).unwrap();
    assert_eq!(device.pending_commands(), 0);
    assert_eq!(device.buffer_count(), 0);
}

// ─── Sequencer ────────────────────────────────────────────────

/// Integrate kernel counting how often its width is queried.
struct CountingWidth {
    queries: Arc<AtomicUsize>,
}

impl Kernel for CountingWidth {
    fn name(&self) -> &str {
        "update_vertex"
    }

    fn optimal_width(&self) -> u32 {
        self.queries.fetch_add(1, Ordering::SeqCst);
        7
    }

    fn binding_count(&self) -> usize {
        4
    }

    fn execute(&self, _invocation: &mut KernelInvocation<'_>) -> PennantResult<()> {
        Ok(())
    }
}

#[test]
fn width_is_queried_once() {
    let queries = Arc::new(AtomicUsize::new(0));
    let mut registry = KernelRegistry::with_reference_kernels();
    registry.register(Arc::new(CountingWidth {
        queries: Arc::clone(&queries),
    }));

    let sequencer = ComputeStageSequencer::from_library(&registry, &KernelNames::default()).unwrap();
    assert_eq!(sequencer.width(), 7);

    let grid = generate(5, 4).unwrap();
    let mut device = CpuDevice::new();
    let mut state = SimulationState::allocate(&grid, &mut device).unwrap();
    for _ in 0..5 {
        let size = sequencer
            .run_tick(&mut state, &ExternalParameters::default(), &mut device)
            .unwrap();
        assert_eq!(size.groups, 3);
        assert_eq!(size.width, 7);
    }
    device.wait_idle().unwrap();
    assert_eq!(queries.load(Ordering::SeqCst), 1);
}

#[test]
fn default_grid_dispatch_size() {
    let sequencer = ComputeStageSequencer::from_library(
        &KernelRegistry::with_reference_kernels(),
        &KernelNames::default(),
    )
    .unwrap();
    let size = sequencer.dispatch_size(640);
    assert_eq!(size.groups, 20);
    assert_eq!(size.width, 32);
    assert_eq!(sequencer.dispatch_size(641).groups, 21);
}

#[test]
fn stage_order_and_bindings() {
    assert_eq!(Stage::ORDER, [Stage::Integrate, Stage::Normals, Stage::Smooth]);
    assert_eq!(Stage::Integrate.bindings().len(), 4);
    assert_eq!(Stage::Normals.bindings()[0], BufferRole::OutputPositions);
    assert_eq!(Stage::Smooth.bindings(), &[BufferRole::NormalWork, BufferRole::NormalOutput]);
    assert_eq!(Stage::Normals.label(), "normals");
}

#[test]
fn sequencer_fences_only_unordered_devices() {
    let sequencer = ComputeStageSequencer::from_library(
        &KernelRegistry::with_reference_kernels(),
        &KernelNames::default(),
    )
    .unwrap();
    let grid = generate(4, 4).unwrap();

    let mut in_order = CpuDevice::new();
    let mut state = SimulationState::allocate(&grid, &mut in_order).unwrap();
    sequencer.run_tick(&mut state, &ExternalParameters::default(), &mut in_order).unwrap();
    assert_eq!(in_order.stats().barriers, 0);
    assert_eq!(in_order.stats().dispatches, 3);

    let mut unordered = CpuDevice::unordered();
    let mut state = SimulationState::allocate(&grid, &mut unordered).unwrap();
    sequencer.run_tick(&mut state, &ExternalParameters::default(), &mut unordered).unwrap();
    assert_eq!(unordered.stats().barriers, 3);
}

#[test]
fn sequencer_toggles_once_per_tick() {
    let sequencer = ComputeStageSequencer::from_library(
        &KernelRegistry::with_reference_kernels(),
        &KernelNames::default(),
    )
    .unwrap();
    let mut device = CpuDevice::new();
    let mut state = SimulationState::allocate(&generate(3, 3).unwrap(), &mut device).unwrap();
    for tick in 1..=7 {
        sequencer.run_tick(&mut state, &ExternalParameters::default(), &mut device).unwrap();
        assert_eq!(state.active_velocity_index(), tick % 2);
    }
}

// ─── Bridge ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn bridge_offset_law(w in 2u32..24, h in 2u32..24, seed in -100.0f32..100.0) {
        let grid = generate(w, h).unwrap();
        let n = grid.vertex_count();
        let mut device = CpuDevice::new();
        let mut store = DeviceMeshStore::new();
        let state = SimulationState::allocate(&grid, &mut device).unwrap();
        let mesh = store.create_mesh(&mut device, &grid).unwrap();

        let positions: Vec<GpuVec3> = (0..n).map(|i| GpuVec3::new(i as f32, seed, -(i as f32))).collect();
        let normals: Vec<GpuVec3> = (0..n).map(|i| GpuVec3::new(seed, 1.0, i as f32 * 0.5)).collect();
        device
            .write(state.buffer(BufferRole::OutputPositions), 0, bytemuck::cast_slice(&positions))
            .unwrap();
        device
            .write(state.buffer(BufferRole::NormalOutput), 0, bytemuck::cast_slice(&normals))
            .unwrap();

        let outcome = PresentationBridge::sync(&state, mesh, &mut store, &mut device).unwrap();
        prop_assert_eq!(outcome, SyncOutcome::Synced { bytes: 2 * n * 16 });

        let target = store.vertex_buffer(mesh).unwrap();
        let at_zero = device.read(target, 0, n * 16).unwrap();
        prop_assert_eq!(at_zero.as_slice(), bytemuck::cast_slice::<GpuVec3, u8>(&positions));
        let at_n16 = device.read(target, n * 16, n * 16).unwrap();
        prop_assert_eq!(at_n16.as_slice(), bytemuck::cast_slice::<GpuVec3, u8>(&normals));

        // Texture coordinates are left alone.
        let uvs = device.read(target, 2 * n * 16, n * 8).unwrap();
        let packed_uvs = pack_vec2(grid.uvs());
        prop_assert_eq!(uvs.as_slice(), bytemuck::cast_slice::<_, u8>(&packed_uvs));
    }
}

#[test]
fn bridge_skips_locked_mesh() {
    let grid = generate(3, 3).unwrap();
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let state = SimulationState::allocate(&grid, &mut device).unwrap();
    let mesh = store.create_mesh(&mut device, &grid).unwrap();
    store.set_locked(mesh, true).unwrap();

    let before = device.stats().clone();
    let outcome = PresentationBridge::sync(&state, mesh, &mut store, &mut device).unwrap();
    assert!(matches!(outcome, SyncOutcome::Skipped { .. }));
    assert_eq!(device.stats(), &before);
}

#[test]
fn bridge_rejects_small_mesh() {
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let state = SimulationState::allocate(&generate(3, 3).unwrap(), &mut device).unwrap();
    let mesh = store.create_mesh(&mut device, &generate(2, 2).unwrap()).unwrap();

    let err = PresentationBridge::sync(&state, mesh, &mut store, &mut device).unwrap_err();
    assert!(matches!(err, PennantError::InvalidBufferAccess(_)));
    assert_eq!(device.stats().copies, 0);
}

#[test]
fn bridge_rejects_larger_mesh() {
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let state = SimulationState::allocate(&generate(2, 2).unwrap(), &mut device).unwrap();
    let mesh = store.create_mesh(&mut device, &generate(3, 3).unwrap()).unwrap();

    let err = PresentationBridge::sync(&state, mesh, &mut store, &mut device).unwrap_err();
    assert!(matches!(err, PennantError::InvalidBufferAccess(_)));
    assert_eq!(device.stats().copies, 0);
}

#[test]
fn bridge_fences_unordered_devices() {
    let grid = generate(2, 2).unwrap();
    let mut device = CpuDevice::unordered();
    let mut store = DeviceMeshStore::new();
    let state = SimulationState::allocate(&grid, &mut device).unwrap();
    let mesh = store.create_mesh(&mut device, &grid).unwrap();

    PresentationBridge::sync(&state, mesh, &mut store, &mut device).unwrap();
    assert_eq!(device.stats().barriers, 1);
    assert_eq!(device.stats().copies, 2);
}
