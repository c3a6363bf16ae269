//! Benchmark scenarios — flags, their placement and run length.
//!
//! 1. **Single flag** — one default-resolution flag in steady wind
//! 2. **Flag row** — several flags side by side on an unordered queue, one
//!    of them periodically held by the presentation layer
//! 3. **Dense flag** — one high-resolution flag in a gale

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use pennant_mesh::Placement;
use pennant_sim::SimulationConfig;
use pennant_types::PennantResult;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    SingleFlag,
    FlagRow,
    DenseFlag,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[ScenarioKind::SingleFlag, ScenarioKind::FlagRow, ScenarioKind::DenseFlag]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::SingleFlag => "single_flag",
            ScenarioKind::FlagRow => "flag_row",
            ScenarioKind::DenseFlag => "dense_flag",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// One flag of a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlagSpec {
    pub width: u32,
    pub height: u32,
    pub placement: Placement,
}

/// A fully specified benchmark scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub config: SimulationConfig,
    pub flags: Vec<FlagSpec>,
    /// Number of ticks to run.
    pub ticks: u32,
    /// Run on a device that reorders unfenced work.
    pub unordered: bool,
    /// Hold the first flag's render mesh every `n`-th tick.
    pub hold_every: Option<u32>,
}

/// Places a `width`-wide grid on a unit plane centered at `position`.
fn flag_at(position: Vec3, width: u32, height: u32) -> PennantResult<FlagSpec> {
    let placement = Placement::fit_to_entity(
        Mat4::from_translation(position),
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, 0.5),
        width,
    )?;
    Ok(FlagSpec {
        width,
        height,
        placement,
    })
}

impl Scenario {
    /// One 32×20 flag, 2 seconds at 60 ticks per second.
    pub fn single_flag() -> PennantResult<Self> {
        let config = SimulationConfig::default();
        Ok(Self {
            kind: ScenarioKind::SingleFlag,
            flags: vec![flag_at(
                Vec3::new(-0.5, 0.8, -1.5),
                config.grid_width,
                config.grid_height,
            )?],
            config,
            ticks: 120,
            unordered: false,
            hold_every: None,
        })
    }

    /// Four flags on an unordered queue; the first one is held every 7th tick.
    pub fn flag_row() -> PennantResult<Self> {
        let config = SimulationConfig::calm();
        let flags = (0..4)
            .map(|i| {
                flag_at(
                    Vec3::new(i as f32 * 1.2 - 1.8, 0.8, -2.0),
                    config.grid_width,
                    config.grid_height,
                )
            })
            .collect::<PennantResult<Vec<_>>>()?;
        Ok(Self {
            kind: ScenarioKind::FlagRow,
            config,
            flags,
            ticks: 120,
            unordered: true,
            hold_every: Some(7),
        })
    }

    /// One 128×80 flag in a gale.
    pub fn dense_flag() -> PennantResult<Self> {
        let config = SimulationConfig {
            grid_width: 128,
            grid_height: 80,
            ..SimulationConfig::gale()
        };
        Ok(Self {
            kind: ScenarioKind::DenseFlag,
            flags: vec![flag_at(Vec3::new(0.0, 1.0, -2.0), 128, 80)?],
            config,
            ticks: 60,
            unordered: false,
            hold_every: None,
        })
    }

    pub fn from_kind(kind: ScenarioKind) -> PennantResult<Self> {
        match kind {
            ScenarioKind::SingleFlag => Self::single_flag(),
            ScenarioKind::FlagRow => Self::flag_row(),
            ScenarioKind::DenseFlag => Self::dense_flag(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.flags.iter().map(|f| (f.width * f.height) as usize).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.flags
            .iter()
            .map(|f| 2 * ((f.width - 1) * (f.height - 1)) as usize)
            .sum()
    }
}
