//! Benchmark runner — drives a scenario on the reference stack and
//! collects metrics.

use std::time::Instant;

use pennant_gpu::{ComputeDevice, KernelRegistry, QueueOrdering};
use pennant_render::DeviceMeshStore;
use pennant_sim::{BufferRole, ConstantWind, SimulationDriver};
use pennant_types::PennantResult;

use crate::metrics::BenchmarkMetrics;
use crate::scenarios::{Scenario, ScenarioKind};

/// Runs benchmark scenarios and collects metrics.
pub struct BenchmarkRunner;

impl BenchmarkRunner {
    /// Runs a single scenario to completion.
    pub fn run(scenario: &Scenario) -> PennantResult<BenchmarkMetrics> {
        scenario.config.validate()?;
        let device = scenario.config.reference_device();
        let device = if scenario.unordered {
            device.with_ordering(QueueOrdering::Unordered)
        } else {
            device
        };

        let mut driver = SimulationDriver::new(
            device,
            DeviceMeshStore::new(),
            &KernelRegistry::with_reference_kernels(),
            &scenario.config.kernels,
        )?
        .with_parameter_source(ConstantWind::new(scenario.config.wind_vector()));

        let ids = scenario
            .flags
            .iter()
            .map(|f| driver.spawn_cloth(f.width, f.height, f.placement))
            .collect::<PennantResult<Vec<_>>>()?;
        let held_mesh = ids.first().and_then(|id| driver.instance(*id)).map(|c| c.mesh());

        tracing::info!(
            scenario = scenario.kind.name(),
            instances = ids.len(),
            ticks = scenario.ticks,
            "benchmark start"
        );

        let mut tick_times = Vec::with_capacity(scenario.ticks as usize);
        let mut synced = 0;
        let mut skipped = 0;
        let total_start = Instant::now();

        for tick in 0..scenario.ticks {
            if let (Some(every), Some(mesh)) = (scenario.hold_every, held_mesh) {
                let hold = every > 0 && tick % every == every - 1;
                driver.meshes_mut().set_locked(mesh, hold)?;
            }
            let summary = driver.tick()?;
            tick_times.push(summary.wall_time);
            synced += summary.synced;
            skipped += summary.skipped;
        }
        driver.device_mut().wait_idle()?;
        let total_wall_time = total_start.elapsed().as_secs_f64();

        let mut max_displacement = 0.0f32;
        for &id in &ids {
            let rest = driver.read_buffer(id, BufferRole::ReferencePositions)?;
            let current = driver.read_buffer(id, BufferRole::OutputPositions)?;
            max_displacement = rest
                .iter()
                .zip(&current)
                .map(|(r, p)| (p.to_vec3() - r.to_vec3()).length())
                .fold(max_displacement, f32::max);
        }

        let stats = driver.device().stats().clone();
        driver.shutdown()?;

        let avg_tick_time = if tick_times.is_empty() {
            0.0
        } else {
            tick_times.iter().sum::<f64>() / tick_times.len() as f64
        };
        let min_tick_time = tick_times.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max_tick_time = tick_times.iter().copied().fold(0.0, f64::max);

        Ok(BenchmarkMetrics {
            scenario: scenario.kind.name().to_string(),
            instances: ids.len(),
            vertex_count: scenario.vertex_count(),
            triangle_count: scenario.triangle_count(),
            ticks: scenario.ticks,
            total_wall_time,
            avg_tick_time,
            min_tick_time,
            max_tick_time,
            synced,
            skipped,
            dispatches: stats.dispatches,
            barriers: stats.barriers,
            max_displacement,
        })
    }

    /// Run all scenarios and return metrics for each.
    pub fn run_all() -> PennantResult<Vec<BenchmarkMetrics>> {
        let mut results = Vec::new();
        for &kind in ScenarioKind::all() {
            let scenario = Scenario::from_kind(kind)?;
            results.push(Self::run(&scenario)?);
        }
        Ok(results)
    }
}
