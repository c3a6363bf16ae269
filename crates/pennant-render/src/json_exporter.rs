//! JSON frame exporter — writes captured frames for visual inspection.
//!
//! Captures positions and normals at each submitted frame, then serializes
//! the whole animation on `finalize()`.

use serde::Serialize;

use pennant_mesh::GridTopology;
use pennant_types::PennantResult;

use crate::renderer::{FrameSink, RenderFrame};

#[derive(Serialize)]
struct FrameData {
    tick: u64,
    positions: Vec<f32>, // Interleaved [x0,y0,z0, x1,y1,z1, ...]
    normals: Vec<f32>,
}

#[derive(Serialize)]
struct AnimationData {
    width: u32,
    height: u32,
    vertex_count: usize,
    triangle_count: usize,
    indices: Vec<u32>,
    uvs: Vec<f32>,
    frames: Vec<FrameData>,
}

/// Exports captured frames to a JSON file.
///
/// Usage:
/// ```text
/// let mut exporter = JsonFrameExporter::new("flag.json");
/// exporter.init(&topology)?;
/// // ... capture a RenderFrame per tick and submit it ...
/// exporter.finalize()?; // Writes the JSON file
/// ```
pub struct JsonFrameExporter {
    output_path: String,
    width: u32,
    height: u32,
    indices: Vec<u32>,
    uvs: Vec<f32>,
    frames: Vec<FrameData>,
}

impl JsonFrameExporter {
    pub fn new(output_path: &str) -> Self {
        Self {
            output_path: output_path.to_string(),
            width: 0,
            height: 0,
            indices: Vec::new(),
            uvs: Vec::new(),
            frames: Vec::new(),
        }
    }

    /// Serializes everything captured so far.
    pub fn to_json(&self) -> PennantResult<String> {
        let data = AnimationData {
            width: self.width,
            height: self.height,
            vertex_count: (self.width * self.height) as usize,
            triangle_count: self.indices.len() / 3,
            indices: self.indices.clone(),
            uvs: self.uvs.clone(),
            frames: self
                .frames
                .iter()
                .map(|f| FrameData {
                    tick: f.tick,
                    positions: f.positions.clone(),
                    normals: f.normals.clone(),
                })
                .collect(),
        };
        serde_json::to_string(&data).map_err(|e| {
            pennant_types::PennantError::Serialization(format!("JSON serialization failed: {e}"))
        })
    }
}

impl FrameSink for JsonFrameExporter {
    fn init(&mut self, topology: &GridTopology) -> PennantResult<()> {
        self.width = topology.width();
        self.height = topology.height();
        self.indices = topology.indices().to_vec();
        self.uvs = topology.uvs().iter().flat_map(|uv| [uv.x, uv.y]).collect();
        Ok(())
    }

    fn submit_frame(&mut self, frame: &RenderFrame) -> PennantResult<()> {
        self.frames.push(FrameData {
            tick: frame.tick,
            positions: frame.positions.iter().flatten().copied().collect(),
            normals: frame.normals.iter().flatten().copied().collect(),
        });
        Ok(())
    }

    fn finalize(&mut self) -> PennantResult<()> {
        let json = self.to_json()?;
        std::fs::write(&self.output_path, json)?;
        self.frames.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "json_exporter"
    }

    fn frame_count(&self) -> u32 {
        self.frames.len() as u32
    }
}
