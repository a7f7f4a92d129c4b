//! Simulation parameters.
//!
//! Parameters that control the implicit step: timestep, Newton and PCG
//! budgets, contact activation gaps, friction, damping and strain limits.

use serde::{Deserialize, Serialize};

use drape_contact::BroadPhaseKind;
use drape_types::constants;
use drape_types::{DrapeError, DrapeResult};

/// Back-end used for the Newton linear system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    /// Block-Jacobi preconditioned conjugate gradient.
    #[default]
    Pcg,
    /// faer sparse Cholesky, falling back to PCG on failure.
    Cholesky,
}

/// Parameters of the Newton + PCG integrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Timestep (seconds).
    pub dt: f64,
    /// Largest Newton step as a fraction of the shortest rest edge.
    pub beta_max: f64,
    /// Newton iterations performed before the convergence test applies.
    pub min_newton_steps: u32,
    /// Newton iteration cap.
    pub max_newton_steps: u32,
    /// Relative tolerance of both PCG and the Newton gradient test.
    pub pcg_tol: f64,
    /// PCG iteration cap.
    pub pcg_max_iters: u32,
    /// Barrier activation gap for mesh–mesh contacts (meters).
    pub contact_gap_max: f64,
    /// Default gap for walls added from scene files.
    pub wall_gap: f64,
    /// Limit line-search steps by continuous collision detection.
    pub enable_ccd: bool,
    /// Enable lagged Coulomb friction.
    pub enable_friction: bool,
    /// Coulomb friction coefficient.
    pub friction_mu: f64,
    /// Static/kinetic transition width of the friction mollifier (meters).
    pub friction_epsilon: f64,
    /// Velocity damping factor in `[0, 1]`.
    pub velocity_damping: f64,
    /// Coefficient of restitution in `[0, 1]` (0 = inelastic).
    pub contact_restitution: f64,
    /// Enable post-solve edge strain limiting.
    pub enable_strain_limiting: bool,
    /// Allowed edge strain before relaxation kicks in.
    pub strain_limit: f64,
    /// Relaxation time constant of strain limiting (seconds).
    pub strain_tau: f64,
    /// Eigenvalue floor for assembled diagonal blocks.
    pub hessian_epsilon: f64,
    /// Smallest gap used by the barrier stiffness takeover term.
    pub min_gap: f64,
    /// Line-search backtracking budget.
    pub max_backtracks: u32,
    /// Linear solver back-end.
    pub linear_solver: LinearSolverKind,
    /// Contact broad phase.
    pub broad_phase: BroadPhaseKind,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            dt: constants::DEFAULT_DT,
            beta_max: constants::DEFAULT_BETA_MAX,
            min_newton_steps: constants::DEFAULT_MIN_NEWTON_STEPS,
            max_newton_steps: constants::DEFAULT_MAX_NEWTON_STEPS,
            pcg_tol: constants::DEFAULT_PCG_TOL,
            pcg_max_iters: constants::DEFAULT_PCG_MAX_ITERS,
            contact_gap_max: constants::DEFAULT_CONTACT_GAP_MAX,
            wall_gap: constants::DEFAULT_WALL_GAP,
            enable_ccd: true,
            enable_friction: false,
            friction_mu: 0.1,
            friction_epsilon: 1e-5,
            velocity_damping: 0.0,
            contact_restitution: 0.0,
            enable_strain_limiting: false,
            strain_limit: 0.05,
            strain_tau: 0.05,
            hessian_epsilon: 1e-8,
            min_gap: 1e-8,
            max_backtracks: constants::DEFAULT_MAX_BACKTRACKS,
            linear_solver: LinearSolverKind::Pcg,
            broad_phase: BroadPhaseKind::Bvh,
        }
    }
}

impl SimParams {
    /// Creates params for debugging (few iterations, loose tolerance).
    pub fn debug() -> Self {
        Self {
            min_newton_steps: 1,
            max_newton_steps: 3,
            pcg_tol: 1e-2,
            pcg_max_iters: 100,
            ..Default::default()
        }
    }

    /// Creates high-quality params (more iterations, tighter tolerance).
    pub fn high_quality() -> Self {
        Self {
            dt: 1e-3,
            min_newton_steps: 3,
            max_newton_steps: 20,
            pcg_tol: 1e-5,
            pcg_max_iters: 5000,
            ..Default::default()
        }
    }

    /// Checks every parameter range.
    ///
    /// # Errors
    /// [`DrapeError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> DrapeResult<()> {
        fn positive(name: &str, value: f64) -> DrapeResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(DrapeError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )))
            }
        }
        fn unit_interval(name: &str, value: f64) -> DrapeResult<()> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(DrapeError::InvalidConfig(format!(
                    "{name} must lie in [0, 1], got {value}"
                )))
            }
        }

        positive("dt", self.dt)?;
        positive("beta_max", self.beta_max)?;
        if self.max_newton_steps == 0 {
            return Err(DrapeError::InvalidConfig(
                "max_newton_steps must be at least 1".into(),
            ));
        }
        if self.min_newton_steps > self.max_newton_steps {
            return Err(DrapeError::InvalidConfig(format!(
                "min_newton_steps ({}) exceeds max_newton_steps ({})",
                self.min_newton_steps, self.max_newton_steps
            )));
        }
        positive("pcg_tol", self.pcg_tol)?;
        if self.pcg_max_iters == 0 {
            return Err(DrapeError::InvalidConfig(
                "pcg_max_iters must be at least 1".into(),
            ));
        }
        positive("contact_gap_max", self.contact_gap_max)?;
        positive("wall_gap", self.wall_gap)?;
        if !self.friction_mu.is_finite() || self.friction_mu < 0.0 {
            return Err(DrapeError::InvalidConfig(format!(
                "friction_mu must be non-negative, got {}",
                self.friction_mu
            )));
        }
        positive("friction_epsilon", self.friction_epsilon)?;
        unit_interval("velocity_damping", self.velocity_damping)?;
        unit_interval("contact_restitution", self.contact_restitution)?;
        positive("strain_limit", self.strain_limit)?;
        positive("strain_tau", self.strain_tau)?;
        positive("hessian_epsilon", self.hessian_epsilon)?;
        positive("min_gap", self.min_gap)?;
        if self.max_backtracks == 0 {
            return Err(DrapeError::InvalidConfig(
                "max_backtracks must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
