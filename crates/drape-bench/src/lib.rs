//! # drape-bench
//!
//! Canonical scenarios, the scene runner and benchmark metrics.
//!
//! ## Key Types
//!
//! - [`ScenarioKind`] — Built-in scenes (ground drape, hanging sheet,
//!   inclined slide, free fall)
//! - [`BenchmarkRunner`] — Steps a scene, emits telemetry, collects metrics
//! - [`BenchmarkMetrics`] — Per-run timings and quality figures, CSV export

pub mod metrics;
pub mod runner;
pub mod scenarios;

pub use metrics::BenchmarkMetrics;
pub use runner::BenchmarkRunner;
pub use scenarios::ScenarioKind;
