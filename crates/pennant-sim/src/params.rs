//! Sources of per-tick external parameters.

use glam::Vec3;

use pennant_gpu::ExternalParameters;
use pennant_types::constants::DEFAULT_WIND;
use pennant_types::ClothId;

/// Supplies the [`ExternalParameters`] of one cloth for one tick.
///
/// Called by the driver once per instance per tick, before the instance's
/// integrate stage is dispatched. Any `FnMut(u64, ClothId) ->
/// ExternalParameters` closure is a source.
pub trait ParameterSource {
    fn parameters(&mut self, tick: u64, cloth: ClothId) -> ExternalParameters;
}

impl<F> ParameterSource for F
where
    F: FnMut(u64, ClothId) -> ExternalParameters,
{
    fn parameters(&mut self, tick: u64, cloth: ClothId) -> ExternalParameters {
        self(tick, cloth)
    }
}

/// The same wind for every cloth on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantWind {
    wind: Vec3,
}

impl ConstantWind {
    pub fn new(wind: Vec3) -> Self {
        Self { wind }
    }

    pub fn wind(&self) -> Vec3 {
        self.wind
    }
}

impl Default for ConstantWind {
    fn default() -> Self {
        Self::new(Vec3::from_array(DEFAULT_WIND))
    }
}

impl ParameterSource for ConstantWind {
    fn parameters(&mut self, _tick: u64, _cloth: ClothId) -> ExternalParameters {
        ExternalParameters::new(self.wind)
    }
}
