//! # drape-diagnostics
//!
//! Read-only diagnostics computed on demand from a simulation state.
//!
//! ## Key Types
//!
//! - [`EnergyTracker`] — Kinetic, elastic and barrier energy plus momenta
//! - [`EnergyDiagnostics`] — Energy snapshot with step-to-step drift
//! - [`CollisionValidator`] — Gap, penetration and approach-speed analysis
//! - [`CollisionMetrics`] — Collision snapshot with a [`QualityLevel`] grade

pub mod collision;
pub mod energy;

pub use collision::{CollisionMetrics, CollisionValidator, QualityLevel};
pub use energy::{EnergyDiagnostics, EnergyTracker};
