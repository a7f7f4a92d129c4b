//! Benchmark metrics collected during a run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use drape_diagnostics::QualityLevel;
use drape_types::DrapeResult;

/// Metrics of one scene run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetrics {
    /// Scene or scenario name.
    pub scenario: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub timesteps: usize,
    /// Total wall-clock time (seconds).
    pub total_wall_time: f64,
    /// Wall-clock time per step (seconds).
    pub step_times: Vec<f64>,
    pub avg_step_time: f64,
    pub min_step_time: f64,
    pub max_step_time: f64,
    pub avg_newton_iterations: f64,
    pub avg_pcg_iterations: f64,
    /// Steps whose line search stalled.
    pub stalled_steps: usize,
    /// Kinetic energy after the last step (approaches 0 for a settled drape).
    pub final_kinetic_energy: f64,
    /// Largest vertex displacement from the initial positions.
    pub max_displacement: f64,
    /// Smallest contact gap seen after any step (`None` without contacts).
    pub min_gap: Option<f64>,
    /// Largest number of penetrating contacts after any step.
    pub max_penetrations: usize,
    /// Worst collision grade over the run.
    pub worst_quality: QualityLevel,
    /// Final total energy relative to the initial total, in percent.
    pub energy_drift_percent: f64,
    /// Simulated time (seconds).
    pub sim_time: f64,
}

impl BenchmarkMetrics {
    pub fn to_csv_header() -> String {
        "scenario,vertex_count,triangle_count,timesteps,total_wall_time_s,avg_step_ms,min_step_ms,max_step_ms,avg_newton,avg_pcg,stalled_steps,final_ke,max_displacement,min_gap,max_penetrations,worst_quality,energy_drift_pct".to_string()
    }

    /// One CSV data row; an absent `min_gap` is an empty field.
    pub fn to_csv_row(&self) -> String {
        let min_gap = self.min_gap.map(|g| format!("{g:.6e}")).unwrap_or_default();
        format!(
            "{},{},{},{},{:.6},{:.4},{:.4},{:.4},{:.2},{:.1},{},{:.6e},{:.6},{},{},{},{:.3}",
            self.scenario,
            self.vertex_count,
            self.triangle_count,
            self.timesteps,
            self.total_wall_time,
            self.avg_step_time * 1000.0,
            self.min_step_time * 1000.0,
            self.max_step_time * 1000.0,
            self.avg_newton_iterations,
            self.avg_pcg_iterations,
            self.stalled_steps,
            self.final_kinetic_energy,
            self.max_displacement,
            min_gap,
            self.max_penetrations,
            self.worst_quality.name(),
            self.energy_drift_percent,
        )
    }

    /// Header plus one row per run.
    pub fn to_csv(metrics: &[BenchmarkMetrics]) -> String {
        let mut csv = Self::to_csv_header();
        for m in metrics {
            csv.push('\n');
            csv.push_str(&m.to_csv_row());
        }
        csv.push('\n');
        csv
    }

    pub fn write_csv(metrics: &[BenchmarkMetrics], path: impl AsRef<Path>) -> DrapeResult<()> {
        fs::write(path, Self::to_csv(metrics))?;
        Ok(())
    }
}
