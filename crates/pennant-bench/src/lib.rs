//! # pennant-bench
//!
//! Benchmark suite for the Pennant cloth pipeline.
//!
//! Provides 3 procedural scenarios, metric collection,
//! and CSV export for regression tracking.

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::{FlagSpec, Scenario, ScenarioKind};
