//! Simulation configuration.
//!
//! Grid resolution, the wind fed to the integrate stage, kernel
//! identifiers and the reference device's memory cap. Loaded from TOML;
//! every field is optional and falls back to [`SimulationConfig::default`].

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use pennant_gpu::{CpuDevice, KernelNames};
use pennant_types::constants::{DEFAULT_GRID_HEIGHT, DEFAULT_GRID_WIDTH, DEFAULT_WIND, MIN_GRID_DIMENSION};
use pennant_types::{PennantError, PennantResult};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid vertices along X.
    pub grid_width: u32,

    /// Grid vertices along Z.
    pub grid_height: u32,

    /// Wind vector [wx, wy, wz] handed to the integrate stage every tick.
    pub wind: [f32; 3],

    /// Memory cap of the reference device, in bytes. `None` = unlimited.
    pub memory_budget_bytes: Option<usize>,

    /// Identifiers the three pipeline kernels are resolved by.
    pub kernels: KernelNames,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            grid_width: DEFAULT_GRID_WIDTH,
            grid_height: DEFAULT_GRID_HEIGHT,
            wind: DEFAULT_WIND,
            memory_budget_bytes: None,
            kernels: KernelNames::default(),
        }
    }
}

impl SimulationConfig {
    /// A light breeze.
    pub fn calm() -> Self {
        Self {
            wind: [0.4, 0.0, 0.1],
            ..Default::default()
        }
    }

    /// Strong wind on a finer grid.
    pub fn gale() -> Self {
        Self {
            grid_width: 48,
            grid_height: 30,
            wind: [6.0, 0.5, 1.2],
            ..Default::default()
        }
    }

    /// Looks a preset up by name (`default`, `calm`, `gale`).
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "default" => Some(Self::default()),
            "calm" => Some(Self::calm()),
            "gale" => Some(Self::gale()),
            _ => None,
        }
    }

    pub fn wind_vector(&self) -> Vec3 {
        Vec3::from_array(self.wind)
    }

    pub fn vertex_count(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    /// Checks the values a TOML file cannot constrain by type alone.
    pub fn validate(&self) -> PennantResult<()> {
        if self.grid_width < MIN_GRID_DIMENSION || self.grid_height < MIN_GRID_DIMENSION {
            return Err(PennantError::InvalidDimension {
                width: self.grid_width,
                height: self.grid_height,
            });
        }
        if !self.wind.iter().all(|c| c.is_finite()) {
            return Err(PennantError::InvalidConfig(format!(
                "wind must be finite, got {:?}",
                self.wind
            )));
        }
        for (stage, name) in [
            ("integrate", &self.kernels.integrate),
            ("normals", &self.kernels.normals),
            ("smooth", &self.kernels.smooth),
        ] {
            if name.trim().is_empty() {
                return Err(PennantError::InvalidConfig(format!(
                    "kernel name for the {stage} stage is empty"
                )));
            }
        }
        if self.memory_budget_bytes == Some(0) {
            return Err(PennantError::InvalidConfig(
                "memory_budget_bytes must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> PennantResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| PennantError::Serialization(format!("invalid config TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> PennantResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn to_toml_string(&self) -> PennantResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| PennantError::Serialization(format!("config serialization failed: {e}")))
    }

    /// Builds the reference device this configuration describes.
    pub fn reference_device(&self) -> CpuDevice {
        match self.memory_budget_bytes {
            Some(budget) => CpuDevice::new().with_memory_budget(budget),
            None => CpuDevice::new(),
        }
    }
}
