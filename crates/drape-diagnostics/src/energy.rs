//! Energy and momentum bookkeeping.
//!
//! The barrier term is evaluated at the current contacts with freshly
//! computed dynamic stiffness, so the reported total matches what a new
//! step would see at these positions (minus inertia).

use serde::{Deserialize, Serialize};

use drape_contact::ContactDetector;
use drape_math::Vec3;
use drape_mesh::Mesh;
use drape_solver::stiffness::{barrier_energy, FrozenStiffness, StiffnessContext};
use drape_solver::{ConstraintSet, Elasticity, SimParams, SimulationState};
use drape_types::DrapeResult;

/// Previous totals at or below this are treated as zero for drift.
const DRIFT_FLOOR: f64 = 1e-12;

/// Energy snapshot of one state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyDiagnostics {
    /// `Σ ½ m |v|²`.
    pub kinetic_energy: f64,
    /// Membrane plus bending energy.
    pub elastic_energy: f64,
    /// Barrier energy of the current contacts.
    pub barrier_energy: f64,
    /// `kinetic + elastic + barrier`.
    pub total_energy: f64,
    /// `Σ m v`.
    pub linear_momentum: Vec3,
    /// `Σ x × m v` about the origin.
    pub angular_momentum: Vec3,
    /// Largest vertex speed.
    pub max_velocity: f64,
    /// Contacts at the current positions.
    pub num_contacts: usize,
    /// Active pins.
    pub num_pins: usize,
    /// `total − previous total` (set by [`EnergyDiagnostics::update_drift`]).
    pub energy_drift_absolute: f64,
    /// Drift relative to the previous total, in percent.
    pub energy_drift_percent: f64,
}

impl EnergyDiagnostics {
    /// Fills the drift fields relative to `previous`.
    ///
    /// Both stay 0 when the previous total is not positive.
    pub fn update_drift(&mut self, previous: &EnergyDiagnostics) {
        let prev = previous.total_energy;
        if prev > DRIFT_FLOOR {
            self.energy_drift_absolute = self.total_energy - prev;
            self.energy_drift_percent = self.energy_drift_absolute / prev * 100.0;
        } else {
            self.energy_drift_absolute = 0.0;
            self.energy_drift_percent = 0.0;
        }
    }
}

/// Stateless energy evaluator.
pub struct EnergyTracker;

impl EnergyTracker {
    /// Computes the energy snapshot of `state`.
    ///
    /// # Errors
    /// Uninitialized or mismatched state, or out-of-range pins.
    pub fn compute(
        mesh: &Mesh,
        state: &SimulationState,
        constraints: &ConstraintSet,
        params: &SimParams,
    ) -> DrapeResult<EnergyDiagnostics> {
        state.ensure_matches(mesh)?;
        constraints.validate(mesh.num_vertices())?;

        let positions = state.positions();
        let elasticity = Elasticity::new(mesh);
        let response = elasticity.evaluate(positions);

        let detector = ContactDetector::new(params.broad_phase);
        let contacts =
            detector.compute_contacts(mesh, positions, constraints.walls(), params.contact_gap_max);
        let ctx = StiffnessContext {
            masses: state.masses(),
            elastic_diagonal: &response.diagonal,
            dt: params.dt,
            min_gap: params.min_gap,
        };
        let barrier = barrier_energy(
            &contacts,
            constraints.walls(),
            params.contact_gap_max,
            &FrozenStiffness::new(),
            &ctx,
        );

        let kinetic_energy = state.kinetic_energy();
        Ok(EnergyDiagnostics {
            kinetic_energy,
            elastic_energy: response.energy,
            barrier_energy: barrier,
            total_energy: kinetic_energy + response.energy + barrier,
            linear_momentum: Self::linear_momentum(state),
            angular_momentum: Self::angular_momentum(state),
            max_velocity: Self::max_velocity(state),
            num_contacts: contacts.len(),
            num_pins: constraints.num_active_pins(),
            energy_drift_absolute: 0.0,
            energy_drift_percent: 0.0,
        })
    }

    /// `Σ m v`.
    pub fn linear_momentum(state: &SimulationState) -> Vec3 {
        state
            .velocities()
            .iter()
            .zip(state.masses())
            .fold(Vec3::ZERO, |acc, (v, &m)| acc + *v * m)
    }

    /// `Σ x × m v` about the origin.
    pub fn angular_momentum(state: &SimulationState) -> Vec3 {
        state
            .positions()
            .iter()
            .zip(state.velocities())
            .zip(state.masses())
            .fold(Vec3::ZERO, |acc, ((x, v), &m)| acc + x.cross(*v * m))
    }

    /// Largest vertex speed.
    pub fn max_velocity(state: &SimulationState) -> f64 {
        state.velocities().iter().map(|v| v.length()).fold(0.0, f64::max)
    }
}
