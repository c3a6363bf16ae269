//! World placement of a simulated cloth.
//!
//! A cloth instance replaces an existing scene entity (a flat plane).
//! Its grid is measured in vertex units, so the placement rescales the
//! grid to the entity's footprint and centers it before applying the
//! entity's own transform.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use pennant_types::constants::MIN_GRID_DIMENSION;
use pennant_types::{PennantError, PennantResult};

/// World transform of a cloth instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub matrix: Mat4,
}

impl Placement {
    pub fn identity() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Fits a `grid_width`-wide grid onto the entity being replaced.
    ///
    /// The grid is scaled uniformly so its X extent matches the entity's
    /// bounding box, translated by half the box extents, then composed
    /// with `entity_transform`.
    pub fn fit_to_entity(
        entity_transform: Mat4,
        bounds_min: Vec3,
        bounds_max: Vec3,
        grid_width: u32,
    ) -> PennantResult<Self> {
        if grid_width < MIN_GRID_DIMENSION {
            return Err(PennantError::InvalidDimension {
                width: grid_width,
                height: MIN_GRID_DIMENSION,
            });
        }

        let extents = bounds_max - bounds_min;
        let scale = Mat4::from_scale(Vec3::splat(extents.x / grid_width as f32));
        let translation = Mat4::from_translation(-extents / 2.0);

        Ok(Self {
            matrix: entity_transform * scale * translation,
        })
    }

    /// Maps a grid-space point into world space.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.matrix.transform_point3(p)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::identity()
    }
}
