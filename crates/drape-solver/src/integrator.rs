//! Newton + PCG implicit integrator.
//!
//! Each step minimises the incremental potential
//!
//! ```text
//! E(x) = ½(x − x̃)ᵀM(x − x̃)/dt² + E_membrane + E_bending + Σ V_barrier + E_friction
//! ```
//!
//! with `x̃ = x₀ + dt·v₀`. Per Newton iteration:
//! 1. **Contacts** — detect at the current iterate
//! 2. **Elasticity** — gradient and Gauss–Newton Hessian (parallel)
//! 3. **Stiffness** — freeze the dynamic barrier stiffness per contact
//! 4. **Friction** — lag normal forces and tangent projectors
//! 5. **Solve** — `H d = −∇E` with PCG or sparse Cholesky
//! 6. **Line search** — CCD-capped backtracking on `E`
//!
//! After the loop: strain limiting, velocity update, depenetration clamp,
//! damping, restitution.

use std::time::Instant;

use tracing::{debug, warn};

use drape_contact::{Contact, ContactDetector, Wall};
use drape_math::faer_solver::FaerSolver;
use drape_math::pcg::{BlockJacobi, PcgSolver};
use drape_math::sparse::{BlockCsrMatrix, SolveReport, SparseSolver};
use drape_math::spd::project_spd;
use drape_math::{dot, max_abs, Mat3, Vec3};
use drape_mesh::Mesh;
use drape_types::constants::EPSILON;
use drape_types::{DrapeError, DrapeResult};

use crate::barrier::BarrierPotential;
use crate::config::{LinearSolverKind, SimParams};
use crate::constraints::ConstraintSet;
use crate::elasticity::{ElasticResponse, Elasticity};
use crate::friction::{FrictionContact, FrictionModel};
use crate::line_search::{advance, backtrack, initial_step, step_length};
use crate::report::{NewtonIterationReport, StepReport};
use crate::state::SimulationState;
use crate::stiffness::{
    activation_gap, barrier_energy, contact_stiffness, FrozenStiffness, StiffnessContext,
};
use crate::strain_limit::StrainLimiter;

/// Implicit integrator with an elasticity-inclusive cubic barrier.
pub struct Integrator {
    params: SimParams,
    detector: ContactDetector,
    pcg: PcgSolver,
    cholesky: FaerSolver,
}

impl Integrator {
    /// Creates an integrator.
    ///
    /// # Errors
    /// [`DrapeError::InvalidConfig`] if `params` fail validation.
    pub fn new(params: SimParams) -> DrapeResult<Self> {
        params.validate()?;
        Ok(Self {
            detector: ContactDetector::new(params.broad_phase),
            pcg: PcgSolver::new(params.pcg_tol, params.pcg_max_iters as usize),
            cholesky: FaerSolver::new(),
            params,
        })
    }

    /// Current parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Replaces the parameters, rebuilding the detector and PCG settings.
    pub fn set_params(&mut self, params: SimParams) -> DrapeResult<()> {
        *self = Self::new(params)?;
        Ok(())
    }

    /// Changes only the timestep (used by adaptive stepping).
    pub fn set_dt(&mut self, dt: f64) -> DrapeResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(DrapeError::InvalidConfig(format!(
                "dt must be positive and finite, got {dt}"
            )));
        }
        self.params.dt = dt;
        Ok(())
    }

    /// Name of the configured linear solver.
    pub fn linear_solver_name(&self) -> &str {
        match self.params.linear_solver {
            LinearSolverKind::Pcg => self.pcg.name(),
            LinearSolverKind::Cholesky => self.cholesky.name(),
        }
    }

    /// Contacts at the state's current positions (read-only).
    pub fn compute_contacts(
        &self,
        mesh: &Mesh,
        state: &SimulationState,
        constraints: &ConstraintSet,
    ) -> DrapeResult<Vec<Contact>> {
        state.ensure_matches(mesh)?;
        constraints.validate(mesh.num_vertices())?;
        Ok(self.detector.compute_contacts(
            mesh,
            state.positions(),
            constraints.walls(),
            self.params.contact_gap_max,
        ))
    }

    /// Merit function `E(positions)` of a step starting from `state`
    /// (without the lagged friction term).
    pub fn total_energy(
        &self,
        mesh: &Mesh,
        state: &SimulationState,
        constraints: &ConstraintSet,
        positions: &[Vec3],
    ) -> DrapeResult<f64> {
        state.ensure_matches(mesh)?;
        constraints.validate(mesh.num_vertices())?;
        if positions.len() != mesh.num_vertices() {
            return Err(DrapeError::InvalidMesh(format!(
                "{} positions given for {} vertices",
                positions.len(),
                mesh.num_vertices()
            )));
        }
        let problem = StepProblem::new(mesh, &self.params, &self.detector, constraints, state);
        let elastic = problem.elasticity.evaluate(positions);
        let ctx = problem.stiffness_context(&elastic.diagonal);
        let friction = FrictionModel::new(0.0, self.params.friction_epsilon);
        Ok(problem.merit(positions, &FrozenStiffness::new(), &ctx, &friction))
    }

    /// Advances `state` by one timestep.
    ///
    /// # Errors
    /// Only for caller misuse: an uninitialized state, a state that does not
    /// match `mesh`, or out-of-range pins. Numerical trouble is reported in
    /// the [`StepReport`] instead.
    pub fn step(
        &mut self,
        mesh: &Mesh,
        state: &mut SimulationState,
        constraints: &ConstraintSet,
    ) -> DrapeResult<StepReport> {
        let start = Instant::now();
        state.ensure_matches(mesh)?;
        constraints.validate(mesh.num_vertices())?;

        let params = self.params.clone();
        let walls = constraints.walls();
        let min_edge = mesh.min_rest_edge_length();

        let problem = StepProblem::new(mesh, &params, &self.detector, constraints, state);
        let mut x = problem.initial_positions(constraints);
        let mut frozen = FrozenStiffness::new();
        let mut friction = FrictionModel::new(params.friction_mu, params.friction_epsilon);

        let mut report = StepReport::default();
        let mut gradient0: Option<f64> = None;

        for k in 0..params.max_newton_steps {
            // 1. Contacts at the current iterate.
            let contacts =
                self.detector
                    .compute_contacts(mesh, &x, walls, params.contact_gap_max);

            // 2. Elastic gradient and Hessian.
            let ElasticResponse {
                gradient: elastic_gradient,
                hessian: mut triplets,
                diagonal,
                ..
            } = problem.elasticity.evaluate(&x);
            let ctx = problem.stiffness_context(&diagonal);

            // 3. Frozen barrier stiffness.
            frozen.clear();
            let barriers: Vec<BarrierPotential> = contacts
                .iter()
                .map(|c| {
                    let gap_max = activation_gap(c, walls, params.contact_gap_max);
                    let k = contact_stiffness(c, gap_max, &ctx);
                    frozen.insert(c.key(), k);
                    BarrierPotential::new(k, gap_max)
                })
                .collect();

            // 4. Lagged friction.
            if params.enable_friction && params.friction_mu > 0.0 {
                friction.set_contacts(
                    contacts
                        .iter()
                        .zip(&barriers)
                        .filter_map(|(c, b)| {
                            let lambda = b.derivative(c.gap).abs();
                            (lambda > 0.0).then(|| FrictionContact::new(c, lambda))
                        })
                        .collect(),
                );
            }

            // 5. Gradient and convergence test.
            let mut gradient = problem.inertia_gradient(&x);
            for (g, e) in gradient.iter_mut().zip(&elastic_gradient) {
                *g += *e;
            }
            for (c, b) in contacts.iter().zip(&barriers) {
                for (v, g) in b.contact_gradient(c) {
                    gradient[v] += g;
                }
            }
            friction.add_gradient(&x, &problem.x_start, &mut gradient);
            problem.zero_pinned(&mut gradient);

            let gradient_norm = max_abs(&gradient);
            let g0 = *gradient0.get_or_insert(gradient_norm);
            report.final_gradient_norm = gradient_norm;
            let stationary = gradient_norm <= EPSILON;
            if k >= params.min_newton_steps
                && (stationary || gradient_norm <= params.pcg_tol * g0.max(EPSILON))
            {
                report.converged = true;
                break;
            }
            if stationary {
                // Nothing to solve, but the iteration floor still holds.
                report.converged = true;
                report.newton_iterations += 1;
                report.iterations.push(NewtonIterationReport {
                    iteration: k,
                    gradient_norm,
                    step_length: 0.0,
                    pcg_iterations: 0,
                    pcg_converged: true,
                    contacts: contacts.len(),
                    ccd_limited: false,
                });
                continue;
            }

            // 6. Hessian.
            for (i, &m) in problem.masses.iter().enumerate() {
                triplets.push((i, i, Mat3::from_diagonal(Vec3::splat(m * problem.inv_dt2))));
            }
            for (c, b) in contacts.iter().zip(&barriers) {
                triplets.extend(b.contact_hessian(c));
            }
            friction.add_hessian(&x, &problem.x_start, &mut triplets);
            let matrix = problem.system_matrix(triplets);

            // 7. Linear solve.
            let rhs: Vec<Vec3> = gradient.iter().map(|g| *g * -1.0).collect();
            let (mut direction, solve) = solve_direction(
                params.linear_solver,
                &mut self.pcg,
                &mut self.cholesky,
                &matrix,
                &rhs,
            );
            problem.zero_pinned(&mut direction);
            let mut slope = dot(&gradient, &direction);
            if !slope.is_finite() || slope >= 0.0 {
                warn!(iteration = k, slope, "non-descent Newton direction; using preconditioned gradient");
                direction = BlockJacobi::new(&matrix).apply(&rhs);
                problem.zero_pinned(&mut direction);
                slope = dot(&gradient, &direction);
            }
            report.total_pcg_iterations += solve.iterations;

            // 8. Line search.
            let mut alpha0 = initial_step(params.beta_max, min_edge, &direction);
            let mut ccd_limited = false;
            if params.enable_ccd {
                let scaled: Vec<Vec3> = direction.iter().map(|d| *d * alpha0).collect();
                let t = self.detector.max_step_fraction(mesh, &x, &scaled, walls);
                if t < 1.0 {
                    alpha0 *= t;
                    ccd_limited = true;
                    report.ccd_limited_iterations += 1;
                }
            }

            let energy0 = problem.merit(&x, &frozen, &ctx, &friction);
            let outcome = backtrack(energy0, slope, alpha0, params.max_backtracks, |alpha| {
                problem.merit(&advance(&x, &direction, alpha), &frozen, &ctx, &friction)
            });

            let mut iteration = NewtonIterationReport {
                iteration: k,
                gradient_norm,
                step_length: 0.0,
                pcg_iterations: solve.iterations,
                pcg_converged: solve.converged,
                contacts: contacts.len(),
                ccd_limited,
            };
            report.newton_iterations += 1;

            // 9. Accept or stall.
            match outcome.alpha {
                Some(alpha) => {
                    x = advance(&x, &direction, alpha);
                    iteration.step_length = step_length(&direction, alpha);
                    debug!(
                        iteration = k,
                        gradient_norm,
                        alpha,
                        energy = outcome.energy,
                        pcg_iterations = solve.iterations,
                        contacts = contacts.len(),
                        ccd_limited,
                        "Newton iteration"
                    );
                    report.iterations.push(iteration);
                }
                None => {
                    warn!(
                        iteration = k,
                        gradient_norm,
                        trials = outcome.trials,
                        "line search found no decreasing step; ending Newton loop"
                    );
                    report.stalled = true;
                    report.iterations.push(iteration);
                    break;
                }
            }
        }

        // Post-solve: strain limiting, velocities, damping, restitution.
        let inverse_masses = problem.inverse_masses();
        if params.enable_strain_limiting {
            let limiter = StrainLimiter::new(params.strain_limit, params.strain_tau);
            let relaxed = limiter.relax(mesh, &x, &inverse_masses, params.dt);
            let correction: Vec<Vec3> = relaxed.iter().zip(&x).map(|(r, xi)| *r - *xi).collect();
            let t = if params.enable_ccd {
                self.detector.max_step_fraction(mesh, &x, &correction, walls)
            } else {
                1.0
            };
            x = advance(&x, &correction, t);
        }

        let inv_dt = 1.0 / params.dt;
        let mut velocities: Vec<Vec3> = x
            .iter()
            .zip(&problem.x_start)
            .map(|(xi, x0)| (*xi - *x0) * inv_dt)
            .collect();
        remove_depenetration_velocity(walls, &problem.x_start, &problem.pinned, &mut velocities);

        let keep = 1.0 - params.velocity_damping;
        for (v, pinned) in velocities.iter_mut().zip(&problem.pinned) {
            if !pinned {
                *v *= keep;
            }
        }

        let final_contacts = self
            .detector
            .compute_contacts(mesh, &x, walls, params.contact_gap_max);
        apply_restitution(
            &final_contacts,
            &inverse_masses,
            params.contact_restitution,
            &mut velocities,
        );

        report.num_contacts = final_contacts.len();
        report.min_gap = final_contacts.iter().map(|c| c.gap).reduce(f64::min);
        report.wall_time = start.elapsed().as_secs_f64();

        state.commit(x, velocities, params.dt);

        debug!(
            newton_iterations = report.newton_iterations,
            converged = report.converged,
            stalled = report.stalled,
            contacts = report.num_contacts,
            wall_time = report.wall_time,
            "step complete"
        );
        Ok(report)
    }
}

/// Solves `H d = rhs` with the configured back-end.
///
/// A Cholesky failure falls back to PCG; a PCG failure yields a zero
/// direction, which the caller replaces by the preconditioned gradient.
fn solve_direction(
    kind: LinearSolverKind,
    pcg: &mut PcgSolver,
    cholesky: &mut FaerSolver,
    matrix: &BlockCsrMatrix,
    rhs: &[Vec3],
) -> (Vec<Vec3>, SolveReport) {
    let n = rhs.len();
    let mut solution = vec![Vec3::ZERO; n];

    if kind == LinearSolverKind::Cholesky {
        match cholesky.solve(matrix, rhs, &mut solution) {
            Ok(report) if solution.iter().all(|v| v.is_finite()) => return (solution, report),
            Ok(_) => warn!("sparse Cholesky produced a non-finite solution; falling back to PCG"),
            Err(err) => warn!(error = %err, "sparse Cholesky failed; falling back to PCG"),
        }
        solution.fill(Vec3::ZERO);
    }

    match pcg.solve(matrix, rhs, &mut solution) {
        Ok(report) => (solution, report),
        Err(err) => {
            warn!(error = %err, "PCG failed; using a zero direction");
            (
                vec![Vec3::ZERO; n],
                SolveReport {
                    iterations: 0,
                    relative_residual: 1.0,
                    converged: false,
                },
            )
        }
    }
}

/// Mass-weighted impulses turning each approaching normal velocity
/// `v_n < 0` into `−e·v_n`. Contacts are processed in detection order.
pub fn apply_restitution(
    contacts: &[Contact],
    inverse_masses: &[f64],
    restitution: f64,
    velocities: &mut [Vec3],
) {
    for contact in contacts {
        let vn = contact.normal_velocity(velocities);
        if vn >= 0.0 {
            continue;
        }
        let denom: f64 = contact
            .stencil
            .iter()
            .map(|(v, w)| w * w * inverse_masses[v])
            .sum();
        if denom <= 0.0 {
            continue;
        }
        let impulse = -(1.0 + restitution) * vn / denom;
        for (v, w) in contact.stencil.iter() {
            velocities[v] += contact.normal * (impulse * w * inverse_masses[v]);
        }
    }
}

/// Drops the outward wall-normal velocity of vertices that began the step
/// behind a wall. The barrier pushing such a vertex out is a positional
/// correction and must not turn into a launch velocity.
pub fn remove_depenetration_velocity(
    walls: &[Wall],
    x_start: &[Vec3],
    pinned: &[bool],
    velocities: &mut [Vec3],
) {
    for ((v, x0), &p) in velocities.iter_mut().zip(x_start).zip(pinned) {
        if p {
            continue;
        }
        for wall in walls {
            if wall.signed_distance(*x0) < 0.0 {
                let vn = v.dot(wall.normal);
                if vn > 0.0 {
                    *v -= wall.normal * vn;
                }
            }
        }
    }
}

/// Step-constant data of one implicit step.
struct StepProblem<'a> {
    mesh: &'a Mesh,
    params: &'a SimParams,
    detector: &'a ContactDetector,
    walls: &'a [Wall],
    elasticity: Elasticity,
    masses: Vec<f64>,
    pinned: Vec<bool>,
    x_start: Vec<Vec3>,
    x_tilde: Vec<Vec3>,
    inv_dt2: f64,
}

impl<'a> StepProblem<'a> {
    fn new(
        mesh: &'a Mesh,
        params: &'a SimParams,
        detector: &'a ContactDetector,
        constraints: &'a ConstraintSet,
        state: &SimulationState,
    ) -> Self {
        let dt = params.dt;
        let x_tilde = state
            .positions()
            .iter()
            .zip(state.velocities())
            .enumerate()
            .map(|(i, (x, v))| constraints.pin_target(i).unwrap_or(*x + *v * dt))
            .collect();
        Self {
            mesh,
            params,
            detector,
            walls: constraints.walls(),
            elasticity: Elasticity::new(mesh),
            masses: state.masses().to_vec(),
            pinned: constraints.pin_mask(mesh.num_vertices()),
            x_start: state.positions().to_vec(),
            x_tilde,
            inv_dt2: 1.0 / (dt * dt),
        }
    }

    /// Step-start positions with pins moved onto their targets.
    fn initial_positions(&self, constraints: &ConstraintSet) -> Vec<Vec3> {
        let mut x = self.x_start.clone();
        for (&v, &target) in constraints.pins() {
            x[v] = target;
        }
        x
    }

    fn stiffness_context<'b>(&'b self, elastic_diagonal: &'b [Mat3]) -> StiffnessContext<'b> {
        StiffnessContext {
            masses: &self.masses,
            elastic_diagonal,
            dt: self.params.dt,
            min_gap: self.params.min_gap,
        }
    }

    fn inverse_masses(&self) -> Vec<f64> {
        self.masses
            .iter()
            .zip(&self.pinned)
            .map(|(m, &p)| if p { 0.0 } else { 1.0 / m })
            .collect()
    }

    fn zero_pinned(&self, field: &mut [Vec3]) {
        for (f, &p) in field.iter_mut().zip(&self.pinned) {
            if p {
                *f = Vec3::ZERO;
            }
        }
    }

    fn inertia_energy(&self, x: &[Vec3]) -> f64 {
        let sum: f64 = x
            .iter()
            .zip(&self.x_tilde)
            .zip(&self.masses)
            .zip(&self.pinned)
            .filter(|(_, pinned)| !**pinned)
            .map(|(((xi, xt), m), _)| m * (*xi - *xt).length_squared())
            .sum();
        0.5 * sum * self.inv_dt2
    }

    fn inertia_gradient(&self, x: &[Vec3]) -> Vec<Vec3> {
        x.iter()
            .zip(&self.x_tilde)
            .zip(&self.masses)
            .map(|((xi, xt), m)| (*xi - *xt) * (m * self.inv_dt2))
            .collect()
    }

    /// Merit function at `x` with contacts detected at `x`.
    fn merit(
        &self,
        x: &[Vec3],
        frozen: &FrozenStiffness,
        ctx: &StiffnessContext<'_>,
        friction: &FrictionModel,
    ) -> f64 {
        let contacts = self
            .detector
            .compute_contacts(self.mesh, x, self.walls, self.params.contact_gap_max);
        self.inertia_energy(x)
            + self.elasticity.energy(x)
            + barrier_energy(&contacts, self.walls, self.params.contact_gap_max, frozen, ctx)
            + friction.energy(x, &self.x_start)
    }

    /// Block system with pinned rows/columns replaced by identity and every
    /// free diagonal block projected to SPD.
    fn system_matrix(&self, mut triplets: Vec<(usize, usize, Mat3)>) -> BlockCsrMatrix {
        let pinned = &self.pinned;
        triplets.retain(|&(r, c, _)| !pinned[r] && !pinned[c]);
        triplets.extend(
            pinned
                .iter()
                .enumerate()
                .filter(|(_, p)| **p)
                .map(|(i, _)| (i, i, Mat3::IDENTITY)),
        );
        let mut matrix = BlockCsrMatrix::from_block_triplets(pinned.len(), triplets);
        let epsilon = self.params.hessian_epsilon;
        matrix.map_diagonal_blocks(|i, block| {
            if pinned[i] {
                Mat3::IDENTITY
            } else {
                project_spd(block, epsilon)
            }
        });
        matrix
    }
}
