//! Rest-pose grid generator.
//!
//! Produces a deterministic, row-major vertex grid lying in the XZ plane
//! with two triangles per quad and a fixed winding order.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use pennant_types::constants::{MIN_GRID_DIMENSION, REST_BOUNDS_THICKNESS};
use pennant_types::{PennantError, PennantResult};

/// A regular grid mesh in its rest pose.
///
/// Vertex `(x, y)` lives at index `y * width + x` and position `(x, 0, y)`.
/// Fields are private so a generated topology can never be edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridTopology {
    width: u32,
    height: u32,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    uvs: Vec<Vec2>,
    /// Flat triangle list: `[t0v0, t0v1, t0v2, t1v0, ...]`.
    indices: Vec<u32>,
}

/// Builds the rest-pose grid for a `width × height` vertex lattice.
///
/// Each quad with origin `i0 = y * width + x` is split into
/// `(i0, i2, i3)` and `(i0, i3, i1)` where `i1 = i0 + 1`,
/// `i2 = i0 + width` and `i3 = i2 + 1`.
///
/// # Errors
/// [`PennantError::InvalidDimension`] if either dimension is below 2, or
/// the grid has more vertices or indices than `u32` can address.
///
/// # Example
/// ```
/// let grid = pennant_mesh::generate(3, 3).unwrap();
/// assert_eq!(grid.vertex_count(), 9);
/// assert_eq!(grid.triangle_count(), 8);
/// ```
pub fn generate(width: u32, height: u32) -> PennantResult<GridTopology> {
    if width < MIN_GRID_DIMENSION || height < MIN_GRID_DIMENSION {
        return Err(PennantError::InvalidDimension { width, height });
    }

    // Indices are u32, so every vertex index and the index count must fit.
    let (vertex_count, index_count) = match (
        width.checked_mul(height),
        (width - 1).checked_mul(height - 1).and_then(|quads| quads.checked_mul(6)),
    ) {
        (Some(vertices), Some(indices)) => (vertices as usize, indices as usize),
        _ => return Err(PennantError::InvalidDimension { width, height }),
    };

    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);
    let mut indices = Vec::with_capacity(index_count);

    for y in 0..height {
        for x in 0..width {
            let p = Vec3::new(x as f32, 0.0, y as f32);
            positions.push(p);
            normals.push(Vec3::Y);
            uvs.push(Vec2::new(p.x / width as f32, 1.0 - p.z / height as f32));
        }
    }

    for y in 0..height - 1 {
        for x in 0..width - 1 {
            let i0 = y * width + x;
            let i1 = i0 + 1;
            let i2 = i0 + width;
            let i3 = i2 + 1;

            indices.extend_from_slice(&[i0, i2, i3]);
            indices.extend_from_slice(&[i0, i3, i1]);
        }
    }

    Ok(GridTopology {
        width,
        height,
        positions,
        normals,
        uvs,
        indices,
    })
}

impl GridTopology {
    /// Vertices along X.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Vertices along Z.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    pub fn uvs(&self) -> &[Vec2] {
        &self.uvs
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Row-major index of grid point `(x, y)`.
    #[inline]
    pub fn vertex_index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// Returns the three vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        let base = t * 3;
        [self.indices[base], self.indices[base + 1], self.indices[base + 2]]
    }

    /// Axis-aligned rest-pose bounds handed to the renderer.
    ///
    /// The box is given a small thickness along Y so that a flat cloth
    /// is never culled as degenerate.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        (
            Vec3::new(0.0, -REST_BOUNDS_THICKNESS, 0.0),
            Vec3::new(self.width as f32, REST_BOUNDS_THICKNESS, self.height as f32),
        )
    }

    /// Checks the structural invariants of the grid.
    ///
    /// Only deserialized topologies can fail this; [`generate`] output
    /// always passes.
    pub fn validate(&self) -> PennantResult<()> {
        if self.width < MIN_GRID_DIMENSION || self.height < MIN_GRID_DIMENSION {
            return Err(PennantError::InvalidDimension {
                width: self.width,
                height: self.height,
            });
        }

        let n = (self.width * self.height) as usize;
        if self.positions.len() != n || self.normals.len() != n || self.uvs.len() != n {
            return Err(PennantError::InvalidConfig(format!(
                "Vertex arrays do not match {}x{} grid ({} vertices expected)",
                self.width, self.height, n
            )));
        }

        let expected = 6 * ((self.width - 1) * (self.height - 1)) as usize;
        if self.indices.len() != expected {
            return Err(PennantError::InvalidConfig(format!(
                "Index count {} != expected {}",
                self.indices.len(),
                expected
            )));
        }

        if let Some(i) = self.indices.iter().position(|&idx| idx as usize >= n) {
            return Err(PennantError::InvalidConfig(format!(
                "Index {} at position {} is out of range (vertex count: {})",
                self.indices[i], i, n
            )));
        }

        Ok(())
    }
}
