//! Per-step and per-iteration solver reports.

use serde::{Deserialize, Serialize};

/// Summary of one Newton iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonIterationReport {
    /// Zero-based iteration index.
    pub iteration: u32,
    /// `‖∇E‖∞` at the start of the iteration.
    pub gradient_norm: f64,
    /// Largest vertex displacement taken (0 when the line search stalled).
    pub step_length: f64,
    /// Linear solver iterations (1 for a direct solve).
    pub pcg_iterations: usize,
    /// Whether the linear solver met its tolerance.
    pub pcg_converged: bool,
    /// Active contacts at the start of the iteration.
    pub contacts: usize,
    /// Whether CCD shortened the initial line-search step.
    pub ccd_limited: bool,
}

/// Result of an integrator step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    /// Newton iterations that took a solve.
    pub newton_iterations: u32,
    /// Sum of linear solver iterations.
    pub total_pcg_iterations: usize,
    /// Whether the gradient test passed.
    pub converged: bool,
    /// Whether the line search failed to find a decreasing step.
    pub stalled: bool,
    /// `‖∇E‖∞` at the last evaluated iterate.
    pub final_gradient_norm: f64,
    /// Contacts active at the end of the step.
    pub num_contacts: usize,
    /// Smallest gap among the end-of-step contacts.
    pub min_gap: Option<f64>,
    /// Iterations whose step was shortened by CCD.
    pub ccd_limited_iterations: u32,
    /// Wall-clock time for this step (seconds).
    pub wall_time: f64,
    /// Per-iteration details.
    pub iterations: Vec<NewtonIterationReport>,
}
