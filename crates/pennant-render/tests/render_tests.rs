//! Integration tests for pennant-render.

use pennant_gpu::{ComputeDevice, CpuDevice};
use pennant_mesh::{generate, GpuVec3};
use pennant_render::json_exporter::JsonFrameExporter;
use pennant_render::mesh_store::{DeviceMeshStore, RenderMeshProvider, VertexLayout};
use pennant_render::renderer::{FrameSink, HeadlessRenderer, RenderFrame};
use pennant_types::{PennantError, RenderMeshId};

// ─── Vertex layout ────────────────────────────────────────────

#[test]
fn planar_layout_offsets() {
    let layout = VertexLayout::new(6);
    assert_eq!(layout.position_offset(), 0);
    assert_eq!(layout.normal_offset(), 6 * 16);
    assert_eq!(layout.uv_offset(), 12 * 16);
    assert_eq!(layout.byte_len(), 12 * 16 + 6 * 8);
}

// ─── Device mesh store ────────────────────────────────────────

#[test]
fn create_mesh_uploads_rest_pose() {
    let grid = generate(3, 2).unwrap();
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();

    let mesh = store.create_mesh(&mut device, &grid).unwrap();
    assert_eq!(store.mesh_count(), 1);
    assert_eq!(device.buffer_count(), 2);

    let descriptor = store.descriptor(mesh).unwrap();
    assert_eq!(descriptor.layout.vertex_capacity, 6);
    assert_eq!(descriptor.index_capacity, 12);
    assert_eq!(descriptor.bounds_max, [3.0, 0.1, 2.0]);

    let frame = RenderFrame::capture(0, &mut device, &store, mesh).unwrap();
    assert_eq!(frame.vertex_count(), 6);
    assert_eq!(frame.positions[4], [1.0, 0.0, 1.0]);
    assert!(frame.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
}

#[test]
fn index_buffer_matches_topology() {
    let grid = generate(2, 2).unwrap();
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let mesh = store.create_mesh(&mut device, &grid).unwrap();

    let indices = store.index_buffer(mesh).unwrap();
    let bytes = device.read(indices, 0, indices.size()).unwrap();
    let decoded: Vec<u32> = pennant_gpu::buffers::decode_slice(&bytes);
    assert_eq!(decoded, grid.indices());
}

#[test]
fn locked_mesh_is_unavailable() {
    let grid = generate(2, 2).unwrap();
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let mesh = store.create_mesh(&mut device, &grid).unwrap();

    store.set_locked(mesh, true).unwrap();
    let err = store.acquire_vertex_buffer(mesh).unwrap_err();
    assert!(matches!(err, PennantError::RenderMeshUnavailable(_)));
    assert!(err.is_recoverable());

    store.set_locked(mesh, false).unwrap();
    assert_eq!(
        store.acquire_vertex_buffer(mesh).unwrap(),
        store.vertex_buffer(mesh).unwrap()
    );
}

#[test]
fn unknown_mesh_is_rejected() {
    let mut store = DeviceMeshStore::new();
    assert!(store.acquire_vertex_buffer(RenderMeshId(7)).is_err());
    assert!(store.set_locked(RenderMeshId(7), true).is_err());
    assert!(store.descriptor(RenderMeshId(7)).is_none());
}

#[test]
fn release_mesh_frees_buffers() {
    let grid = generate(2, 2).unwrap();
    let mut device = CpuDevice::new();
    let mut store = DeviceMeshStore::new();
    let a = store.create_mesh(&mut device, &grid).unwrap();
    let b = store.create_mesh(&mut device, &grid).unwrap();
    assert_ne!(a, b);

    store.release_mesh(&mut device, a).unwrap();
    assert_eq!(store.mesh_count(), 1);
    assert_eq!(device.buffer_count(), 2);
    assert!(store.release_mesh(&mut device, a).is_err());
}

#[test]
fn create_mesh_respects_memory_budget() {
    let grid = generate(4, 4).unwrap();
    let mut device = CpuDevice::new().with_memory_budget(64);
    let mut store = DeviceMeshStore::new();

    let err = store.create_mesh(&mut device, &grid).unwrap_err();
    assert!(matches!(err, PennantError::BufferAllocationFailure { .. }));
    assert_eq!(store.mesh_count(), 0);
    assert_eq!(device.buffer_count(), 0);
}

// ─── Frames ───────────────────────────────────────────────────

#[test]
fn frame_from_vertex_bytes() {
    let layout = VertexLayout::new(2);
    let mut bytes = vec![0u8; layout.byte_len()];
    let p = [GpuVec3::new(1.0, 2.0, 3.0), GpuVec3::new(4.0, 5.0, 6.0)];
    let n = [GpuVec3::UP, GpuVec3::UP];
    bytes[..32].copy_from_slice(bytemuck::cast_slice(&p));
    bytes[32..64].copy_from_slice(bytemuck::cast_slice(&n));

    let frame = RenderFrame::from_vertex_bytes(42, &bytes, layout, 2).unwrap();
    assert_eq!(frame.tick, 42);
    assert_eq!(frame.positions, vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    assert_eq!(frame.normals[1], [0.0, 1.0, 0.0]);
}

#[test]
fn frame_from_short_buffer_fails() {
    let layout = VertexLayout::new(4);
    assert!(RenderFrame::from_vertex_bytes(0, &[0u8; 16], layout, 4).is_err());
}

// ─── Sinks ────────────────────────────────────────────────────

#[test]
fn headless_init() {
    let grid = generate(2, 2).unwrap();
    let mut renderer = HeadlessRenderer::new();
    renderer.init(&grid).unwrap();
    assert_eq!(renderer.name(), "headless");
    assert_eq!(renderer.frame_count(), 0);
}

#[test]
fn headless_submit_frames() {
    let frame = RenderFrame {
        tick: 0,
        positions: vec![[0.0; 3]; 4],
        normals: vec![[0.0, 1.0, 0.0]; 4],
    };
    let mut renderer = HeadlessRenderer::new();
    renderer.submit_frame(&frame).unwrap();
    renderer.submit_frame(&frame).unwrap();
    assert_eq!(renderer.frame_count(), 2);
    renderer.finalize().unwrap();
}

#[test]
fn json_exporter_serializes_frames() {
    let grid = generate(2, 2).unwrap();
    let mut exporter = JsonFrameExporter::new("unused.json");
    exporter.init(&grid).unwrap();
    exporter
        .submit_frame(&RenderFrame {
            tick: 3,
            positions: vec![[1.0, 0.0, 0.0]; 4],
            normals: vec![[0.0, 1.0, 0.0]; 4],
        })
        .unwrap();
    assert_eq!(exporter.name(), "json_exporter");
    assert_eq!(exporter.frame_count(), 1);

    let json: serde_json::Value = serde_json::from_str(&exporter.to_json().unwrap()).unwrap();
    assert_eq!(json["width"], 2);
    assert_eq!(json["triangle_count"], 2);
    assert_eq!(json["frames"][0]["tick"], 3);
    assert_eq!(json["frames"][0]["positions"].as_array().unwrap().len(), 12);
    assert_eq!(json["uvs"].as_array().unwrap().len(), 8);
}
