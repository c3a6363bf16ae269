//! Device-side vector layouts.
//!
//! A three-float vector occupies 16 bytes on GPU-class hardware, so every
//! per-vertex buffer is an array of [`GpuVec3`] with an explicit pad lane.
//! These types are `Pod`, which lets buffers move between host bytes and
//! typed slices through `bytemuck` without any unsafe code.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// A padded three-component vector (`x, y, z, _pad`), 16 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub _pad: f32,
}

/// A two-component texture coordinate, 8 bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Pod, Zeroable)]
pub struct GpuVec2 {
    pub u: f32,
    pub v: f32,
}

impl GpuVec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, _pad: 0.0 }
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Returns the vector as `[x, y, z]`, dropping the pad lane.
    #[inline]
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<Vec3> for GpuVec3 {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<GpuVec3> for Vec3 {
    fn from(v: GpuVec3) -> Self {
        v.to_vec3()
    }
}

impl From<Vec2> for GpuVec2 {
    fn from(v: Vec2) -> Self {
        Self { u: v.x, v: v.y }
    }
}

/// Packs host vectors into their device layout.
pub fn pack_vec3(values: &[Vec3]) -> Vec<GpuVec3> {
    values.iter().copied().map(GpuVec3::from).collect()
}

/// Packs texture coordinates into their device layout.
pub fn pack_vec2(values: &[Vec2]) -> Vec<GpuVec2> {
    values.iter().copied().map(GpuVec2::from).collect()
}
