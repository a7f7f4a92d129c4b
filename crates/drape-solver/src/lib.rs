//! # drape-solver
//!
//! Implicit time integration for shells with an elasticity-inclusive
//! cubic contact barrier.
//!
//! ## Key Types
//!
//! - [`SimulationState`] — Per-vertex positions, velocities, lumped masses
//! - [`ConstraintSet`] — Pins and static walls
//! - [`SimParams`] — Integrator configuration (serde)
//! - [`Integrator`] — Newton + PCG step with CCD-aware line search
//! - [`AdaptiveTimestep`] — CFL-style timestep control
//! - [`BarrierPotential`] — Cubic barrier and its derivatives

pub mod adaptive;
pub mod barrier;
pub mod bending;
pub mod config;
pub mod constraints;
pub mod elasticity;
pub mod friction;
pub mod integrator;
pub mod line_search;
pub mod report;
pub mod state;
pub mod stiffness;
pub mod strain_limit;

pub use adaptive::AdaptiveTimestep;
pub use barrier::BarrierPotential;
pub use config::{LinearSolverKind, SimParams};
pub use constraints::ConstraintSet;
pub use elasticity::Elasticity;
pub use friction::FrictionModel;
pub use integrator::Integrator;
pub use report::{NewtonIterationReport, StepReport};
pub use state::SimulationState;
pub use strain_limit::StrainLimiter;

/// The integrator under its algorithmic name.
pub type NewtonPcgSolver = Integrator;
