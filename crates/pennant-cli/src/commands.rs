//! CLI command implementations.

use glam::{Mat4, Vec3};

use pennant_bench::metrics::BenchmarkMetrics;
use pennant_bench::runner::BenchmarkRunner;
use pennant_bench::scenarios::{Scenario, ScenarioKind};
use pennant_gpu::{KernelLibrary, KernelRegistry, KernelSet};
use pennant_mesh::Placement;
use pennant_render::{FrameSink, JsonFrameExporter, RenderFrame};
use pennant_sim::{SimulationConfig, SimulationDriver};
use pennant_telemetry::TracingSink;

fn load_config(config_path: Option<&str>, preset: &str) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    match config_path {
        Some(path) => Ok(SimulationConfig::load(path)?),
        None => SimulationConfig::preset(preset)
            .ok_or_else(|| format!("Unknown preset: '{preset}'. Available: default, calm, gale").into()),
    }
}

/// Run a flag simulation.
pub fn simulate(
    config_path: Option<&str>,
    preset: &str,
    ticks: u32,
    export_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Pennant Simulation");
    println!("──────────────────");

    let config = load_config(config_path, preset)?;
    println!("Source:  {}", config_path.unwrap_or(preset));
    println!("Grid:    {} × {}", config.grid_width, config.grid_height);
    println!("Wind:    {:?}", config.wind);
    println!("Ticks:   {ticks}");
    println!();

    let mut driver = SimulationDriver::reference(&config)?;
    driver.add_sink(Box::new(TracingSink::new(tracing::Level::DEBUG)));

    // The replaced entity: a unit plane in front of the viewer.
    let placement = Placement::fit_to_entity(
        Mat4::from_translation(Vec3::new(-0.5, 0.8, -1.5)),
        Vec3::new(-0.5, 0.0, -0.5),
        Vec3::new(0.5, 0.0, 0.5),
        config.grid_width,
    )?;
    let id = driver.spawn_cloth(config.grid_width, config.grid_height, placement)?;

    let mut exporter = match export_path {
        Some(path) => {
            let mut exporter = JsonFrameExporter::new(path);
            if let Some(instance) = driver.instance(id) {
                exporter.init(instance.topology())?;
            }
            Some(exporter)
        }
        None => None,
    };

    let mut synced = 0;
    let mut skipped = 0;
    let mut submit_time = 0.0;
    for _ in 0..ticks {
        let summary = driver.tick()?;
        synced += summary.synced;
        skipped += summary.skipped;
        submit_time += summary.wall_time;

        if let Some(exporter) = exporter.as_mut() {
            let mesh = driver.instance(id).map(|c| c.mesh()).ok_or("cloth vanished")?;
            let tick = summary.tick;
            let (device, meshes) = driver.device_and_meshes();
            exporter.submit_frame(&RenderFrame::capture(tick, device, meshes, mesh)?)?;
        }
    }

    let stats = driver.device().stats().clone();
    driver.shutdown()?;

    println!("  Synced:       {synced}");
    println!("  Skipped:      {skipped}");
    println!("  Dispatches:   {}", stats.dispatches);
    println!("  Submit time:  {:.3}ms", submit_time * 1000.0);

    if let (Some(mut exporter), Some(path)) = (exporter, export_path) {
        let frames = exporter.frame_count();
        exporter.finalize()?;
        println!();
        println!("{frames} frames written to: {path}");
    }

    Ok(())
}

/// Run benchmark suite.
pub fn benchmark(scenario_name: &str, output_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Pennant Benchmark Suite");
    println!("═══════════════════════");
    println!();

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        match ScenarioKind::from_name(scenario_name) {
            Some(kind) => vec![kind],
            None => {
                eprintln!("Unknown scenario: {scenario_name}");
                eprintln!("Available: single_flag, flag_row, dense_flag, all");
                return Err("Unknown scenario".into());
            }
        }
    };

    let mut all_metrics = Vec::new();
    for &kind in &scenarios {
        let scenario = Scenario::from_kind(kind)?;
        println!(
            "Running: {} ({} flags, {} verts, {} ticks)",
            kind.name(),
            scenario.flags.len(),
            scenario.vertex_count(),
            scenario.ticks,
        );

        let metrics = BenchmarkRunner::run(&scenario).map_err(|e| format!("Benchmark failed: {e}"))?;

        println!("  Wall time:     {:.3}s", metrics.total_wall_time);
        println!("  Avg tick:      {:.3}ms", metrics.avg_tick_time * 1000.0);
        println!("  Syncs:         {} ({} skipped)", metrics.synced, metrics.skipped);
        println!("  Max displace:  {:.4}", metrics.max_displacement);
        println!();

        all_metrics.push(metrics);
    }

    if let Some(path) = output_path {
        let csv = BenchmarkMetrics::to_csv(&all_metrics);
        std::fs::write(path, &csv)?;
        println!("Results written to: {path}");
    } else {
        println!("CSV Output:");
        println!("{}", BenchmarkMetrics::to_csv(&all_metrics));
    }

    Ok(())
}

/// Validate a simulation config file.
pub fn validate(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating: {path}");

    let config = SimulationConfig::load(path)?;
    println!("  Grid:          {} × {} ({} vertices)", config.grid_width, config.grid_height, config.vertex_count());
    println!("  Wind:          {:?}", config.wind);
    match config.memory_budget_bytes {
        Some(bytes) => println!("  Memory budget: {bytes} bytes"),
        None => println!("  Memory budget: unlimited"),
    }

    let registry = KernelRegistry::with_reference_kernels();
    if let Err(e) = KernelSet::resolve(&registry, &config.kernels) {
        println!("  ✗ {e}");
        println!("  Reference kernels: {}", registry.kernel_names().join(", "));
        return Err(e.into());
    }
    println!("  Kernels:       {}, {}, {}", config.kernels.integrate, config.kernels.normals, config.kernels.smooth);
    println!("  ✓ Valid");
    Ok(())
}
