//! # pennant-render
//!
//! The presentation side of the pipeline.
//!
//! - [`RenderMeshProvider`] — hands out a render mesh's vertex buffer for
//!   writing, or reports it unavailable for this tick.
//! - [`DeviceMeshStore`] — reference provider keeping render meshes in
//!   device memory with a planar [`VertexLayout`].
//! - [`FrameSink`] — consumers of captured frames: [`HeadlessRenderer`]
//!   and [`JsonFrameExporter`].

pub mod json_exporter;
pub mod mesh_store;
pub mod renderer;

pub use json_exporter::JsonFrameExporter;
pub use mesh_store::{DeviceMeshStore, RenderMeshDescriptor, RenderMeshProvider, VertexLayout};
pub use renderer::{FrameSink, HeadlessRenderer, RenderFrame};
