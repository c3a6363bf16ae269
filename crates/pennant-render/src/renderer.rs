//! Frame capture and the `FrameSink` trait.
//!
//! A frame is a host copy of a render mesh's position and normal blocks,
//! taken by blocking readback. Capture is a diagnostic/export path and
//! never runs inside the per-tick pipeline.

use pennant_gpu::buffers::decode_slice;
use pennant_gpu::ComputeDevice;
use pennant_mesh::{GpuVec3, GridTopology};
use pennant_types::constants::VEC3_STRIDE;
use pennant_types::{PennantError, PennantResult, RenderMeshId};

use crate::mesh_store::{DeviceMeshStore, RenderMeshProvider, VertexLayout};

/// A single captured frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    /// Tick this frame corresponds to.
    pub tick: u64,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
}

impl RenderFrame {
    /// Decodes the first `vertex_count` positions and normals of a planar
    /// vertex buffer.
    pub fn from_vertex_bytes(
        tick: u64,
        bytes: &[u8],
        layout: VertexLayout,
        vertex_count: usize,
    ) -> PennantResult<Self> {
        let block = vertex_count * VEC3_STRIDE;
        let positions = bytes.get(layout.position_offset()..layout.position_offset() + block);
        let normals = bytes.get(layout.normal_offset()..layout.normal_offset() + block);
        match (positions, normals) {
            (Some(p), Some(n)) => Ok(Self {
                tick,
                positions: decode_slice::<GpuVec3>(p).into_iter().map(GpuVec3::to_array).collect(),
                normals: decode_slice::<GpuVec3>(n).into_iter().map(GpuVec3::to_array).collect(),
            }),
            _ => Err(PennantError::InvalidBufferAccess(format!(
                "vertex buffer of {} bytes too small for {} vertices",
                bytes.len(),
                vertex_count
            ))),
        }
    }

    /// Reads back a render mesh held by `store`.
    pub fn capture(
        tick: u64,
        device: &mut dyn ComputeDevice,
        store: &DeviceMeshStore,
        mesh: RenderMeshId,
    ) -> PennantResult<Self> {
        let (buffer, descriptor) = store
            .vertex_buffer(mesh)
            .zip(store.descriptor(mesh))
            .ok_or_else(|| PennantError::InvalidBufferAccess(format!("unknown render mesh {}", mesh.0)))?;
        let layout = descriptor.layout;
        let bytes = device.read(buffer, 0, layout.byte_len())?;
        Self::from_vertex_bytes(tick, &bytes, layout, layout.vertex_capacity)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Trait for consumers of captured frames.
///
/// # Implementations
/// - [`HeadlessRenderer`] — Discards frames (benchmarks, CI)
/// - [`JsonFrameExporter`](crate::json_exporter::JsonFrameExporter) — Writes frames to JSON
pub trait FrameSink: Send {
    /// Initialize the sink with the cloth topology.
    fn init(&mut self, topology: &GridTopology) -> PennantResult<()>;

    /// Submit a frame.
    fn submit_frame(&mut self, frame: &RenderFrame) -> PennantResult<()>;

    /// Finalize (flush buffers, close files, etc.).
    fn finalize(&mut self) -> PennantResult<()>;

    fn name(&self) -> &str;

    /// Returns the number of frames submitted.
    fn frame_count(&self) -> u32;
}

/// Headless sink — discards all frames.
pub struct HeadlessRenderer {
    frames: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self { frames: 0 }
    }
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for HeadlessRenderer {
    fn init(&mut self, _topology: &GridTopology) -> PennantResult<()> {
        Ok(())
    }

    fn submit_frame(&mut self, _frame: &RenderFrame) -> PennantResult<()> {
        self.frames += 1;
        Ok(())
    }

    fn finalize(&mut self) -> PennantResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "headless"
    }

    fn frame_count(&self) -> u32 {
        self.frames
    }
}
