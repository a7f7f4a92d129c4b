//! Simulation event types.
//!
//! Events are plain values tagged with the step index. Quantities are
//! copied out of solver and diagnostic reports so that this crate stays
//! free of engine dependencies.

use serde::{Deserialize, Serialize};

/// One event emitted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    /// Step index (0-based).
    pub timestep: u32,
    /// Event payload.
    pub kind: EventKind,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// A step is about to start.
    TimestepBegin {
        /// Simulation time at the start of the step (seconds).
        sim_time: f64,
        /// Step size (seconds).
        dt: f64,
    },

    /// A step finished.
    TimestepEnd {
        /// Wall-clock time of the step (seconds).
        wall_time: f64,
    },

    /// One Newton iteration finished.
    NewtonIteration {
        iteration: u32,
        /// `‖∇E‖∞` at the start of the iteration.
        gradient_norm: f64,
        /// Largest vertex displacement taken.
        step_length: f64,
        /// Linear solver iterations.
        pcg_iterations: usize,
        /// Whether CCD shortened the step.
        ccd_limited: bool,
    },

    /// Contacts at the end of a step.
    ContactDetection {
        contact_count: usize,
        /// Smallest signed gap (0 without contacts).
        min_gap: f64,
        /// Deepest penetration (meters).
        max_penetration: f64,
    },

    /// Energy snapshot.
    Energy {
        kinetic: f64,
        elastic: f64,
        barrier: f64,
        total: f64,
        /// Drift relative to the previous snapshot, in percent.
        drift_percent: f64,
    },

    /// Collision quality grade.
    CollisionQuality {
        /// Grade name (`excellent`, `good`, `warning`, `error`).
        level: String,
        penetrations: usize,
        max_penetration: f64,
    },

    /// The adaptive controller changed `dt`.
    TimestepAdapted {
        old_dt: f64,
        new_dt: f64,
        /// Largest vertex speed that drove the change.
        max_velocity: f64,
    },

    /// Newton convergence summary of one step.
    Convergence {
        newton_iterations: u32,
        pcg_iterations: usize,
        final_gradient_norm: f64,
        converged: bool,
        /// Whether the line search stalled.
        stalled: bool,
    },

    /// Free-form event.
    Custom {
        label: String,
        /// JSON-encoded payload.
        payload: String,
    },
}

impl EventKind {
    /// Stable snake_case name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TimestepBegin { .. } => "timestep_begin",
            Self::TimestepEnd { .. } => "timestep_end",
            Self::NewtonIteration { .. } => "newton_iteration",
            Self::ContactDetection { .. } => "contact_detection",
            Self::Energy { .. } => "energy",
            Self::CollisionQuality { .. } => "collision_quality",
            Self::TimestepAdapted { .. } => "timestep_adapted",
            Self::Convergence { .. } => "convergence",
            Self::Custom { .. } => "custom",
        }
    }
}

impl SimulationEvent {
    /// Creates an event for the given step.
    pub fn new(timestep: u32, kind: EventKind) -> Self {
        Self { timestep, kind }
    }
}
