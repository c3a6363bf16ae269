//! Per-tick parameters consumed by the integrate stage.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use pennant_types::constants::DEFAULT_WIND;

/// External inputs for one tick of one cloth.
///
/// Laid out as the kernel reads it: the wind vector followed by one float
/// of padding (16 bytes total).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ExternalParameters {
    pub wind: [f32; 3],
    pub _pad: f32,
}

impl ExternalParameters {
    pub fn new(wind: Vec3) -> Self {
        Self {
            wind: wind.to_array(),
            _pad: 0.0,
        }
    }

    #[inline]
    pub fn wind(&self) -> Vec3 {
        Vec3::from_array(self.wind)
    }

    /// Raw bytes as bound to the kernel.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for ExternalParameters {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_WIND))
    }
}
