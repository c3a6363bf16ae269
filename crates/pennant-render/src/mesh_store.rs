//! Render meshes living in device memory.
//!
//! A render mesh owns one vertex buffer laid out in planar blocks,
//! positions first, then normals, then texture coordinates:
//!
//! ```text
//! offset 0          : [GpuVec3; capacity]   positions
//! offset cap * 16   : [GpuVec3; capacity]   normals
//! offset cap * 32   : [GpuVec2; capacity]   uvs
//! ```
//!
//! plus one `u32` index buffer. Only the pipeline writes the position and
//! normal blocks; the render pass only reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pennant_gpu::{AccessHint, BufferHandle, ComputeDevice};
use pennant_mesh::vector::{pack_vec2, pack_vec3};
use pennant_mesh::GridTopology;
use pennant_types::constants::{VEC2_STRIDE, VEC3_STRIDE};
use pennant_types::{PennantError, PennantResult, RenderMeshId};

/// Planar vertex layout of a render mesh's vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLayout {
    pub vertex_capacity: usize,
}

impl VertexLayout {
    pub fn new(vertex_capacity: usize) -> Self {
        Self { vertex_capacity }
    }

    #[inline]
    pub fn position_offset(&self) -> usize {
        0
    }

    #[inline]
    pub fn normal_offset(&self) -> usize {
        self.vertex_capacity * VEC3_STRIDE
    }

    #[inline]
    pub fn uv_offset(&self) -> usize {
        2 * self.vertex_capacity * VEC3_STRIDE
    }

    /// Total byte size of the vertex buffer.
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.uv_offset() + self.vertex_capacity * VEC2_STRIDE
    }
}

/// Fixed shape of a render mesh, declared at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderMeshDescriptor {
    pub layout: VertexLayout,
    pub index_capacity: usize,
    pub bounds_min: [f32; 3],
    pub bounds_max: [f32; 3],
}

impl RenderMeshDescriptor {
    pub fn for_topology(topology: &GridTopology) -> Self {
        let (min, max) = topology.bounds();
        Self {
            layout: VertexLayout::new(topology.vertex_count()),
            index_capacity: topology.indices().len(),
            bounds_min: min.to_array(),
            bounds_max: max.to_array(),
        }
    }
}

/// Source of writable render meshes.
pub trait RenderMeshProvider {
    /// Creates a render mesh sized for `topology` and uploads its rest pose,
    /// texture coordinates and indices.
    fn create_mesh(
        &mut self,
        device: &mut dyn ComputeDevice,
        topology: &GridTopology,
    ) -> PennantResult<RenderMeshId>;

    /// Hands out the mesh's vertex buffer for this tick's write.
    ///
    /// # Errors
    /// [`PennantError::RenderMeshUnavailable`] while the presentation layer
    /// holds the buffer (e.g. resizing it).
    fn acquire_vertex_buffer(&mut self, mesh: RenderMeshId) -> PennantResult<BufferHandle>;

    fn descriptor(&self, mesh: RenderMeshId) -> Option<&RenderMeshDescriptor>;

    /// Frees the mesh's device buffers. The device queue must be drained.
    fn release_mesh(&mut self, device: &mut dyn ComputeDevice, mesh: RenderMeshId) -> PennantResult<()>;
}

#[derive(Debug)]
struct MeshEntry {
    descriptor: RenderMeshDescriptor,
    vertex_buffer: BufferHandle,
    index_buffer: BufferHandle,
    locked: bool,
}

/// Reference [`RenderMeshProvider`] backed by device buffers.
#[derive(Debug, Default)]
pub struct DeviceMeshStore {
    meshes: BTreeMap<RenderMeshId, MeshEntry>,
    next_id: u32,
}

impl DeviceMeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Marks a mesh as held by the presentation layer. While locked,
    /// [`RenderMeshProvider::acquire_vertex_buffer`] fails.
    pub fn set_locked(&mut self, mesh: RenderMeshId, locked: bool) -> PennantResult<()> {
        let entry = self.meshes.get_mut(&mesh).ok_or_else(|| unknown_mesh(mesh))?;
        entry.locked = locked;
        Ok(())
    }

    /// Read-side access for the render pass and frame capture.
    pub fn vertex_buffer(&self, mesh: RenderMeshId) -> Option<BufferHandle> {
        self.meshes.get(&mesh).map(|e| e.vertex_buffer)
    }

    pub fn index_buffer(&self, mesh: RenderMeshId) -> Option<BufferHandle> {
        self.meshes.get(&mesh).map(|e| e.index_buffer)
    }
}

fn unknown_mesh(mesh: RenderMeshId) -> PennantError {
    PennantError::InvalidBufferAccess(format!("unknown render mesh {}", mesh.0))
}

/// Initial contents of a planar vertex buffer.
fn rest_pose_bytes(topology: &GridTopology) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(VertexLayout::new(topology.vertex_count()).byte_len());
    bytes.extend_from_slice(bytemuck::cast_slice(&pack_vec3(topology.positions())));
    bytes.extend_from_slice(bytemuck::cast_slice(&pack_vec3(topology.normals())));
    bytes.extend_from_slice(bytemuck::cast_slice(&pack_vec2(topology.uvs())));
    bytes
}

impl RenderMeshProvider for DeviceMeshStore {
    fn create_mesh(
        &mut self,
        device: &mut dyn ComputeDevice,
        topology: &GridTopology,
    ) -> PennantResult<RenderMeshId> {
        let descriptor = RenderMeshDescriptor::for_topology(topology);

        let vertex_buffer = device.allocate_with_data(&rest_pose_bytes(topology), AccessHint::Shared)?;
        let index_buffer = match device
            .allocate_with_data(bytemuck::cast_slice(topology.indices()), AccessHint::Shared)
        {
            Ok(handle) => handle,
            Err(e) => {
                device.release(vertex_buffer)?;
                return Err(e);
            }
        };

        let id = RenderMeshId(self.next_id);
        self.next_id += 1;
        tracing::debug!(
            mesh = id.0,
            vertices = descriptor.layout.vertex_capacity,
            indices = descriptor.index_capacity,
            "created render mesh"
        );
        self.meshes.insert(
            id,
            MeshEntry {
                descriptor,
                vertex_buffer,
                index_buffer,
                locked: false,
            },
        );
        Ok(id)
    }

    fn acquire_vertex_buffer(&mut self, mesh: RenderMeshId) -> PennantResult<BufferHandle> {
        let entry = self.meshes.get(&mesh).ok_or_else(|| unknown_mesh(mesh))?;
        if entry.locked {
            return Err(PennantError::RenderMeshUnavailable(format!(
                "render mesh {} is held by the presentation layer",
                mesh.0
            )));
        }
        Ok(entry.vertex_buffer)
    }

    fn descriptor(&self, mesh: RenderMeshId) -> Option<&RenderMeshDescriptor> {
        self.meshes.get(&mesh).map(|e| &e.descriptor)
    }

    fn release_mesh(&mut self, device: &mut dyn ComputeDevice, mesh: RenderMeshId) -> PennantResult<()> {
        let entry = self.meshes.remove(&mesh).ok_or_else(|| unknown_mesh(mesh))?;
        device.release(entry.vertex_buffer)?;
        device.release(entry.index_buffer)
    }
}
