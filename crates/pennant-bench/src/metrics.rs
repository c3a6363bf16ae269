//! Benchmark metrics — data collected during a benchmark run.

use serde::{Deserialize, Serialize};

/// Metrics collected from a benchmark scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    pub scenario: String,
    /// Cloth instances driven.
    pub instances: usize,
    /// Vertices across all instances.
    pub vertex_count: usize,
    /// Triangles across all instances.
    pub triangle_count: usize,
    pub ticks: u32,
    /// Total wall-clock time including final drain (seconds).
    pub total_wall_time: f64,
    /// Average host submission time per tick (seconds).
    pub avg_tick_time: f64,
    pub min_tick_time: f64,
    pub max_tick_time: f64,
    /// Render mesh syncs performed.
    pub synced: usize,
    /// Render mesh syncs skipped because the mesh was held.
    pub skipped: usize,
    /// Kernel dispatches submitted to the device.
    pub dispatches: u64,
    /// Barriers issued.
    pub barriers: u64,
    /// Maximum vertex displacement from the rest pose (grid units).
    pub max_displacement: f32,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,instances,vertex_count,triangle_count,ticks,total_wall_time_s,avg_tick_ms,min_tick_ms,max_tick_ms,synced,skipped,dispatches,barriers,max_displacement".to_string()
    }

    /// Format this metrics instance as a CSV data row.
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{:.6},{:.4},{:.4},{:.4},{},{},{},{},{:.6}",
            self.scenario,
            self.instances,
            self.vertex_count,
            self.triangle_count,
            self.ticks,
            self.total_wall_time,
            self.avg_tick_time * 1000.0,
            self.min_tick_time * 1000.0,
            self.max_tick_time * 1000.0,
            self.synced,
            self.skipped,
            self.dispatches,
            self.barriers,
            self.max_displacement,
        )
    }

    /// Format multiple metrics as a complete CSV string.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv
    }
}
