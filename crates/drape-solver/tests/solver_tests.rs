//! Integration tests for drape-solver.

use drape_contact::{Contact, ContactKind, Stencil, Wall};
use drape_material::Material;
use drape_math::{Mat3, Vec3};
use drape_mesh::generators::{grid_corners, quad_grid};
use drape_mesh::Mesh;
use drape_solver::adaptive::AdaptiveTimestep;
use drape_solver::bending::build_bending_elements;
use drape_solver::friction::{f0, f1_over_y};
use drape_solver::integrator::apply_restitution;
use drape_solver::line_search::{backtrack, initial_step};
use drape_solver::stiffness::{contact_stiffness, StiffnessContext};
use drape_solver::{
    BarrierPotential, ConstraintSet, Elasticity, Integrator, LinearSolverKind, SimParams,
    SimulationState, StrainLimiter,
};
use drape_types::DrapeError;

fn sheet(n: usize, material: Material) -> Mesh {
    quad_grid(n, n, 1.0, 1.0).into_mesh(material).unwrap()
}

fn stretched_state(mesh: &Mesh, factor: f64) -> SimulationState {
    let mut state = SimulationState::from_mesh(mesh);
    for p in state.positions_mut() {
        p.x *= factor;
    }
    state
}

fn pin_corners(state: &SimulationState, n: usize) -> ConstraintSet {
    let mut constraints = ConstraintSet::new();
    for v in grid_corners(n, n) {
        constraints.add_pin(v, state.positions()[v]);
    }
    constraints
}

// ─── SimulationState Tests ────────────────────────────────────

#[test]
fn state_from_mesh_starts_at_rest() {
    let mesh = sheet(4, Material::default());
    let state = SimulationState::from_mesh(&mesh);

    assert!(state.is_initialized());
    assert_eq!(state.num_vertices(), mesh.num_vertices());
    assert_eq!(state.positions(), mesh.rest_positions());
    assert!(state.velocities().iter().all(|v| *v == Vec3::ZERO));
    assert!(state.masses().iter().all(|&m| m > 0.0));

    // ρ·h·area = 1000 · 1e-3 · 1 m² = 1 kg in total.
    let total: f64 = state.masses().iter().sum();
    assert!((total - 1.0).abs() < 1e-12);
}

#[test]
fn uninitialized_state_is_rejected() {
    let mut state = SimulationState::new();
    assert!(matches!(
        state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), 0.01),
        Err(DrapeError::StateNotInitialized)
    ));

    let mesh = sheet(2, Material::default());
    let mut integrator = Integrator::new(SimParams::default()).unwrap();
    let result = integrator.step(&mesh, &mut state, &ConstraintSet::new());
    assert!(matches!(result, Err(DrapeError::StateNotInitialized)));
}

#[test]
fn apply_gravity_adds_velocity() {
    let mesh = sheet(2, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    state.apply_gravity(Vec3::new(0.0, 0.0, -10.0), 0.01).unwrap();
    for v in state.velocities() {
        assert!((v.z + 0.1).abs() < 1e-15);
    }
}

#[test]
fn material_hot_reload_updates_masses() {
    let mut mesh = sheet(3, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    let before = state.masses().to_vec();

    let mut heavier = Material::default();
    heavier.density *= 2.0;
    mesh.set_material(heavier).unwrap();
    state.update_masses(&mesh).unwrap();

    for (a, b) in before.iter().zip(state.masses()) {
        assert!((b - 2.0 * a).abs() < 1e-12);
    }
    assert_eq!(state.positions(), mesh.rest_positions());
}

// ─── Constraint and Config Tests ─────────────────────────────

#[test]
fn pins_replace_and_validate() {
    let mut constraints = ConstraintSet::new();
    constraints.add_pin(3, Vec3::ZERO);
    constraints.add_pin(3, Vec3::ONE);
    assert_eq!(constraints.num_active_pins(), 1);
    assert_eq!(constraints.pin_target(3), Some(Vec3::ONE));
    assert!(constraints.is_pinned(3));
    assert!(!constraints.is_pinned(2));

    assert!(constraints.validate(4).is_ok());
    assert!(matches!(
        constraints.validate(3),
        Err(DrapeError::InvalidConstraint(_))
    ));
}

#[test]
fn walls_are_normalised_and_checked() {
    let mut constraints = ConstraintSet::new();
    let idx = constraints
        .add_wall(Vec3::new(0.0, 3.0, 0.0), 0.5, 1e-3)
        .unwrap();
    assert_eq!(idx, 0);
    assert_eq!(constraints.walls()[0].normal, Vec3::Y);
    assert!(constraints.add_wall(Vec3::ZERO, 0.0, 1e-3).is_err());
    assert!(constraints.add_wall(Vec3::Z, 0.0, -1.0).is_err());
    assert_eq!(constraints.num_walls(), 1);
}

#[test]
fn out_of_range_pin_fails_step() {
    let mesh = sheet(2, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    constraints.add_pin(100, Vec3::ZERO);
    let mut integrator = Integrator::new(SimParams::default()).unwrap();
    assert!(matches!(
        integrator.step(&mesh, &mut state, &constraints),
        Err(DrapeError::InvalidConstraint(_))
    ));
}

#[test]
fn params_presets_validate() {
    assert!(SimParams::default().validate().is_ok());
    assert!(SimParams::debug().validate().is_ok());
    assert!(SimParams::high_quality().validate().is_ok());
}

#[test]
fn params_reject_bad_values() {
    let cases: Vec<SimParams> = vec![
        SimParams { dt: 0.0, ..Default::default() },
        SimParams { dt: f64::NAN, ..Default::default() },
        SimParams { beta_max: 0.0, ..Default::default() },
        SimParams { max_newton_steps: 0, min_newton_steps: 0, ..Default::default() },
        SimParams { min_newton_steps: 9, max_newton_steps: 8, ..Default::default() },
        SimParams { pcg_tol: 0.0, ..Default::default() },
        SimParams { pcg_max_iters: 0, ..Default::default() },
        SimParams { contact_gap_max: -1.0, ..Default::default() },
        SimParams { friction_mu: -0.1, ..Default::default() },
        SimParams { velocity_damping: 1.5, ..Default::default() },
        SimParams { contact_restitution: -0.2, ..Default::default() },
        SimParams { strain_limit: 0.0, ..Default::default() },
        SimParams { max_backtracks: 0, ..Default::default() },
    ];
    for params in cases {
        assert!(
            matches!(params.validate(), Err(DrapeError::InvalidConfig(_))),
            "accepted {params:?}"
        );
        assert!(Integrator::new(params).is_err());
    }
}

#[test]
fn params_toml_round_trip() {
    let params = SimParams {
        linear_solver: LinearSolverKind::Cholesky,
        enable_friction: true,
        ..SimParams::high_quality()
    };
    let text = toml::to_string(&params).unwrap();
    let back: SimParams = toml::from_str(&text).unwrap();
    assert_eq!(back, params);

    let partial: SimParams = toml::from_str("dt = 0.004\nlinear_solver = \"cholesky\"").unwrap();
    assert_eq!(partial.dt, 0.004);
    assert_eq!(partial.linear_solver, LinearSolverKind::Cholesky);
    assert_eq!(partial.max_newton_steps, SimParams::default().max_newton_steps);
}

// ─── Barrier and Stiffness Tests ─────────────────────────────

#[test]
fn barrier_activates_with_c2_continuity() {
    let barrier = BarrierPotential::new(1e4, 1e-3);
    assert_eq!(barrier.energy(1e-3), 0.0);
    assert_eq!(barrier.derivative(1e-3), 0.0);
    assert_eq!(barrier.second_derivative(1e-3), 0.0);
    assert_eq!(barrier.energy(2e-3), 0.0);

    let g = 1e-3 * (1.0 - 1e-6);
    assert!(barrier.energy(g) < 1e-12);
    assert!(barrier.derivative(g).abs() < 1e-6);

    assert!(barrier.energy(5e-4) > 0.0);
    assert!(barrier.derivative(5e-4) < 0.0);
    assert!(barrier.second_derivative(5e-4) > 0.0);

    // Continues for negative gaps.
    assert!(barrier.energy(-1e-4) > barrier.energy(0.0));
    assert!(barrier.energy(-1e-4).is_finite());

    assert_eq!(BarrierPotential::new(1e4, 0.0).energy(-1.0), 0.0);
}

#[test]
fn barrier_derivatives_match_finite_differences() {
    let barrier = BarrierPotential::new(250.0, 2e-3);
    let h = 1e-8;
    for &g in &[1e-4, 5e-4, 1.2e-3, 1.9e-3] {
        let fd1 = (barrier.energy(g + h) - barrier.energy(g - h)) / (2.0 * h);
        let fd2 = (barrier.derivative(g + h) - barrier.derivative(g - h)) / (2.0 * h);
        assert!((fd1 - barrier.derivative(g)).abs() <= 1e-5 * barrier.derivative(g).abs().max(1.0));
        assert!(
            (fd2 - barrier.second_derivative(g)).abs()
                <= 1e-5 * barrier.second_derivative(g).abs().max(1.0)
        );
    }
}

fn wall_contact_at(vertex: usize, gap: f64) -> Contact {
    Contact {
        kind: ContactKind::Wall { vertex, wall: 0 },
        witness: Vec3::ZERO,
        normal: Vec3::Z,
        gap,
        stencil: Stencil::single(vertex),
    }
}

#[test]
fn stiffness_grows_with_youngs_modulus() {
    let soft = sheet(3, Material::default());
    let stiff = sheet(3, Material { youngs_modulus: 1e8, ..Material::default() });
    let contact = wall_contact_at(5, 5e-4);

    let stiffness_of = |mesh: &Mesh| {
        // Bend the sheet slightly so the membrane Hessian sees the normal.
        let mut x = mesh.rest_positions().to_vec();
        x[5].z += 0.05;
        let response = Elasticity::new(mesh).evaluate(&x);
        let masses = mesh.lumped_masses();
        let ctx = StiffnessContext {
            masses: &masses,
            elastic_diagonal: &response.diagonal,
            dt: 0.002,
            min_gap: 1e-8,
        };
        contact_stiffness(&contact, 1e-3, &ctx)
    };

    let k_soft = stiffness_of(&soft);
    let k_stiff = stiffness_of(&stiff);
    assert!(k_soft > 0.0);
    assert!(k_stiff > k_soft);
}

#[test]
fn stiffness_takeover_grows_as_gap_closes() {
    let mesh = sheet(3, Material::default());
    let masses = mesh.lumped_masses();
    let diagonal = vec![Mat3::ZERO; mesh.num_vertices()];
    let ctx = StiffnessContext {
        masses: &masses,
        elastic_diagonal: &diagonal,
        dt: 0.002,
        min_gap: 1e-8,
    };
    let far = contact_stiffness(&wall_contact_at(5, 9e-4), 1e-3, &ctx);
    let near = contact_stiffness(&wall_contact_at(5, 1e-5), 1e-3, &ctx);
    let touching = contact_stiffness(&wall_contact_at(5, -1.0), 1e-3, &ctx);
    assert!(near > far);
    assert!(touching.is_finite() && touching >= near);

    // Below ḡ/100 the takeover term stops growing, penetrating or not.
    let inside = contact_stiffness(&wall_contact_at(5, -2e-4), 1e-3, &ctx);
    let m = masses[5];
    let expected = m / (0.002 * 0.002) + m / (1e-5 * 1e-5);
    assert!((inside - expected).abs() <= 1e-9 * expected);
    assert_eq!(inside, touching);
}

// ─── Elasticity Tests ────────────────────────────────────────

#[test]
fn rest_configuration_has_zero_elastic_energy() {
    let mesh = sheet(4, Material::default().with_bending(1e-3));
    let elasticity = Elasticity::new(&mesh);
    assert_eq!(elasticity.model_name(), "co_rotational");
    assert!(elasticity.energy(mesh.rest_positions()) < 1e-12);

    let response = elasticity.evaluate(mesh.rest_positions());
    assert!(response.gradient.iter().all(|g| g.length() < 1e-9));
}

#[test]
fn rigid_motion_is_free() {
    let mesh = sheet(3, Material::default().with_bending(1e-3));
    let elasticity = Elasticity::new(&mesh);
    let rotation = Mat3::from_rotation_x(0.7) * Mat3::from_rotation_z(-0.3);
    let moved: Vec<Vec3> = mesh
        .rest_positions()
        .iter()
        .map(|p| rotation * *p + Vec3::new(1.0, -2.0, 0.5))
        .collect();
    assert!(elasticity.energy(&moved) < 1e-10);
}

#[test]
fn stretching_and_folding_cost_energy() {
    let mesh = sheet(3, Material::default().with_bending(1e-3));
    let elasticity = Elasticity::new(&mesh);

    let stretched: Vec<Vec3> = mesh.rest_positions().iter().map(|p| *p * 1.1).collect();
    assert!(elasticity.membrane_energy(&stretched) > 0.0);

    let mut folded = mesh.rest_positions().to_vec();
    folded[5].z += 0.05;
    assert!(elasticity.bending_energy(&folded) > 0.0);
    assert!(!build_bending_elements(&mesh).is_empty());
    assert!(build_bending_elements(&sheet(3, Material::default())).is_empty());
}

#[test]
fn elastic_gradient_matches_finite_differences() {
    let mesh = sheet(2, Material::default().with_bending(1e-2));
    let elasticity = Elasticity::new(&mesh);
    let mut x = mesh.rest_positions().to_vec();
    x[4] += Vec3::new(0.03, -0.02, 0.04);
    x[1] += Vec3::new(-0.01, 0.0, 0.02);

    let response = elasticity.evaluate(&x);
    let h = 1e-7;
    for axis in 0..3 {
        let mut plus = x.clone();
        let mut minus = x.clone();
        plus[4][axis] += h;
        minus[4][axis] -= h;
        let fd = (elasticity.energy(&plus) - elasticity.energy(&minus)) / (2.0 * h);
        let analytic = response.gradient[4][axis];
        assert!(
            (fd - analytic).abs() <= 1e-4 * analytic.abs().max(1.0),
            "axis {axis}: fd {fd} vs analytic {analytic}"
        );
    }
}

// ─── Friction, Strain and Line Search Tests ──────────────────

#[test]
fn friction_mollifier_is_c1() {
    let eps = 1e-3;
    assert!((f0(0.0, eps) - eps / 3.0).abs() < 1e-18);
    assert!((f0(eps, eps) - eps).abs() < 1e-15);
    assert!((f1_over_y(0.0, eps) - 2.0 / eps).abs() < 1e-9);
    // f₁(ε) = 1 from both sides.
    assert!((f1_over_y(eps * (1.0 - 1e-9), eps) * eps - 1.0).abs() < 1e-6);
    assert!((f1_over_y(2.0 * eps, eps) - 0.5 / eps).abs() < 1e-9);
}

#[test]
fn strain_limiter_pulls_a_stretched_sheet_back_to_the_limit() {
    let mesh = sheet(2, Material::default());
    let limiter = StrainLimiter::new(0.05, 0.001);
    let stretched: Vec<Vec3> = mesh.rest_positions().iter().map(|p| *p * 1.5).collect();
    assert!((StrainLimiter::max_triangle_strain(&mesh, mesh.rest_positions()) - 1.0).abs() < 1e-9);
    assert!((StrainLimiter::max_edge_strain(&mesh, mesh.rest_positions()) - 1.0).abs() < 1e-9);
    assert!((StrainLimiter::max_triangle_strain(&mesh, &stretched) - 1.5).abs() < 1e-9);
    assert!((StrainLimiter::max_edge_strain(&mesh, &stretched) - 1.5).abs() < 1e-9);

    let mut inverse_masses = vec![1.0; mesh.num_vertices()];
    inverse_masses[0] = 0.0;
    let relaxed = limiter.relax(&mesh, &stretched, &inverse_masses, 0.01);
    assert_eq!(relaxed[0], stretched[0]);

    let triangle = StrainLimiter::max_triangle_strain(&mesh, &relaxed);
    let edge = StrainLimiter::max_edge_strain(&mesh, &relaxed);
    assert!(triangle <= 1.06, "triangle strain {triangle}");
    assert!(edge <= 1.06, "edge strain {edge}");
}

#[test]
fn strain_limiter_handles_a_free_sheet() {
    let mesh = sheet(4, Material::default());
    let limiter = StrainLimiter::new(0.05, 0.001);
    let stretched: Vec<Vec3> = mesh.rest_positions().iter().map(|p| *p * 1.2).collect();
    let inverse_masses = vec![1.0; mesh.num_vertices()];

    let relaxed = limiter.relax(&mesh, &stretched, &inverse_masses, 0.01);
    let triangle = StrainLimiter::max_triangle_strain(&mesh, &relaxed);
    let edge = StrainLimiter::max_edge_strain(&mesh, &relaxed);
    assert!(triangle <= 1.06, "triangle strain {triangle}");
    assert!(edge <= 1.06, "edge strain {edge}");

    // Equal masses: the centroid stays put.
    let centroid = |x: &[Vec3]| x.iter().fold(Vec3::ZERO, |a, p| a + *p) / x.len() as f64;
    assert!((centroid(&relaxed) - centroid(&stretched)).length() < 1e-9);
}

#[test]
fn strain_limiter_relaxes_by_the_time_fraction() {
    let mesh = sheet(2, Material::default());
    let stretched: Vec<Vec3> = mesh.rest_positions().iter().map(|p| *p * 1.5).collect();
    let inverse_masses = vec![1.0; mesh.num_vertices()];

    let full = StrainLimiter::new(0.05, 1e-6).relax(&mesh, &stretched, &inverse_masses, 0.01);
    let slow = StrainLimiter::new(0.05, 1.0).relax(&mesh, &stretched, &inverse_masses, 0.01);
    let fraction = 1.0 - (-0.01f64).exp();
    for ((s, f), x0) in slow.iter().zip(&full).zip(&stretched) {
        assert!((*s - (*x0 + (*f - *x0) * fraction)).length() < 1e-12);
    }

    // Within the limit nothing moves.
    let relaxed = StrainLimiter::new(0.05, 1e-3).relax(&mesh, mesh.rest_positions(), &inverse_masses, 0.01);
    assert_eq!(relaxed, mesh.rest_positions());
}

#[test]
fn initial_step_respects_edge_cap() {
    let d = vec![Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO];
    assert!((initial_step(0.25, 0.1, &d) - 0.0125).abs() < 1e-15);
    assert_eq!(initial_step(0.25, 100.0, &d), 1.0);
    assert_eq!(initial_step(0.25, 0.1, &[Vec3::ZERO]), 1.0);
}

#[test]
fn backtracking_accepts_armijo_step() {
    // E(α) = (α − 0.1)², slope at 0 is −0.2.
    let outcome = backtrack(0.01, -0.2, 1.0, 20, |a| (a - 0.1) * (a - 0.1));
    let alpha = outcome.alpha.unwrap();
    assert!(alpha <= 0.125 + 1e-15);
    assert!(outcome.energy < 0.01);

    let stalled = backtrack(0.0, -1.0, 1.0, 5, |_| 1.0);
    assert!(stalled.alpha.is_none());
    assert_eq!(stalled.trials, 5);
}

#[test]
fn restitution_reflects_normal_velocity() {
    let contact = wall_contact_at(0, 1e-4);
    let mut v = vec![Vec3::new(1.0, 0.0, -2.0)];
    apply_restitution(&[contact], &[1.0], 0.5, &mut v);
    assert!((v[0].z - 1.0).abs() < 1e-12);
    assert_eq!(v[0].x, 1.0);

    let mut v = vec![Vec3::new(0.0, 0.0, -2.0)];
    apply_restitution(&[contact], &[1.0], 0.0, &mut v);
    assert!(v[0].z.abs() < 1e-12);

    // Pinned vertices are not moved.
    let mut v = vec![Vec3::new(0.0, 0.0, -2.0)];
    apply_restitution(&[contact], &[0.0], 1.0, &mut v);
    assert_eq!(v[0].z, -2.0);
}

// ─── Adaptive Timestep Tests ─────────────────────────────────

#[test]
fn adaptive_timestep_rules() {
    let mesh = sheet(4, Material::default());
    let rest = vec![Vec3::ZERO; mesh.num_vertices()];
    assert_eq!(
        AdaptiveTimestep::compute_next_dt(&rest, &mesh, 1e-3, 1e-4, 1e-2, 0.5),
        1e-2
    );
    assert_eq!(AdaptiveTimestep::compute_cfl_timestep(1.0, 0.0, 0.5), 0.0);
    assert_eq!(AdaptiveTimestep::compute_cfl_timestep(1.0, f64::NAN, 0.5), 0.0);
    assert!((AdaptiveTimestep::compute_cfl_timestep(2.0, 0.25, 0.5) - 0.0625).abs() < 1e-15);
    assert!((AdaptiveTimestep::compute_min_edge_length(&mesh) - 0.25).abs() < 1e-12);

    // Growth is limited to 1.5× the current step.
    let slow = vec![Vec3::new(0.01, 0.0, 0.0); mesh.num_vertices()];
    let next = AdaptiveTimestep::compute_next_dt(&slow, &mesh, 1e-3, 1e-4, 1.0, 0.5);
    assert!((next - 1.5e-3).abs() < 1e-15);

    // Fast motion shrinks immediately, bounded below by dt_min.
    let fast = vec![Vec3::new(1e4, 0.0, 0.0); mesh.num_vertices()];
    let next = AdaptiveTimestep::compute_next_dt(&fast, &mesh, 1e-3, 1e-4, 1.0, 0.5);
    assert_eq!(next, 1e-4);

    // Inverted bounds do not panic.
    let next = AdaptiveTimestep::compute_next_dt(&slow, &mesh, 1e-3, 1e-2, 1e-3, 0.5);
    assert!(next.is_finite());
}

// ─── Integrator Tests ────────────────────────────────────────

#[test]
fn merit_function_decreases_over_a_step() {
    let n = 4;
    let mesh = sheet(n, Material::default());
    let mut state = stretched_state(&mesh, 1.2);
    let constraints = pin_corners(&state, n);
    let mut integrator = Integrator::new(SimParams::default()).unwrap();

    let start = state.clone();
    let e_before = integrator
        .total_energy(&mesh, &start, &constraints, start.positions())
        .unwrap();
    let report = integrator.step(&mesh, &mut state, &constraints).unwrap();
    let e_after = integrator
        .total_energy(&mesh, &start, &constraints, state.positions())
        .unwrap();

    assert!(report.newton_iterations >= 1);
    assert!(e_after < e_before);
    assert_eq!(report.iterations.len() as u32, report.newton_iterations);
}

#[test]
fn newton_floor_holds_for_a_sheet_at_rest() {
    let mesh = sheet(2, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    let params = SimParams {
        min_newton_steps: 3,
        max_newton_steps: 5,
        ..Default::default()
    };
    let mut integrator = Integrator::new(params).unwrap();
    let report = integrator.step(&mesh, &mut state, &ConstraintSet::new()).unwrap();

    assert!(report.converged);
    assert!(!report.stalled);
    assert_eq!(report.newton_iterations, 3);
    assert_eq!(report.iterations.len(), 3);
    assert_eq!(report.total_pcg_iterations, 0);
    assert!(report.iterations.iter().all(|it| it.step_length == 0.0));
    assert_eq!(state.positions(), mesh.rest_positions());
}

#[test]
fn sheet_starting_behind_a_wall_is_not_launched() {
    let gap = 1e-3;
    let mesh = quad_grid(2, 2, 0.5, 0.5)
        .translated(Vec3::new(0.0, 0.0, -2e-4))
        .into_mesh(Material::default())
        .unwrap();
    let mut state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    constraints.add_wall(Vec3::Z, 0.0, gap).unwrap();
    let params = SimParams::default();
    assert_eq!(params.contact_restitution, 0.0);
    let dt = params.dt;
    let mut integrator = Integrator::new(params).unwrap();

    for _ in 0..5 {
        state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), dt).unwrap();
        integrator.step(&mesh, &mut state, &constraints).unwrap();
        assert!(state.positions().iter().all(|p| p.z > -2e-4 && p.z < gap));
    }
    assert!(state.positions().iter().all(|p| p.z > 0.0));
    assert!(state.velocities().iter().all(|v| v.z.abs() < 0.05));
}

#[test]
fn moving_pin_drives_velocity() {
    let mesh = sheet(2, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    let target = mesh.rest_positions()[0] + Vec3::new(0.0, 0.0, 0.01);
    constraints.add_pin(0, target);

    let params = SimParams::default();
    let dt = params.dt;
    let mut integrator = Integrator::new(params).unwrap();
    integrator.step(&mesh, &mut state, &constraints).unwrap();

    assert_eq!(state.positions()[0], target);
    assert!((state.velocities()[0].z - 0.01 / dt).abs() < 1e-9);
    assert!(state.positions().iter().all(|p| p.is_finite()));
    assert!((state.time - dt).abs() < 1e-15);
}

#[test]
fn full_damping_stops_free_vertices() {
    let mesh = sheet(3, Material::default());
    let mut state = SimulationState::from_mesh(&mesh);
    for v in state.velocities_mut() {
        *v = Vec3::new(0.3, 0.0, 0.0);
    }
    let params = SimParams {
        velocity_damping: 1.0,
        ..Default::default()
    };
    let mut integrator = Integrator::new(params).unwrap();
    integrator.step(&mesh, &mut state, &ConstraintSet::new()).unwrap();
    assert!(state.velocities().iter().all(|v| v.length() == 0.0));
    // Positions still advanced before damping.
    assert!(state.positions()[0].x > mesh.rest_positions()[0].x);
}

#[test]
fn fast_sheet_never_passes_the_ground() {
    let mesh = quad_grid(4, 4, 1.0, 1.0)
        .translated(Vec3::new(0.0, 0.0, 0.05))
        .into_mesh(Material::default())
        .unwrap();
    let mut state = SimulationState::from_mesh(&mesh);
    for v in state.velocities_mut() {
        *v = Vec3::new(0.0, 0.0, -50.0);
    }
    let mut constraints = ConstraintSet::new();
    constraints.add_wall(Vec3::Z, 0.0, 1e-3).unwrap();
    let mut integrator = Integrator::new(SimParams::default()).unwrap();

    let mut limited = 0;
    for _ in 0..10 {
        let report = integrator.step(&mesh, &mut state, &constraints).unwrap();
        limited += report.ccd_limited_iterations;
        assert!(
            state.positions().iter().all(|p| p.z > 0.0),
            "vertex crossed the wall"
        );
    }
    assert!(limited > 0);
}

#[test]
fn resting_sheet_stays_above_ground() {
    let mesh = quad_grid(3, 3, 0.6, 0.6)
        .translated(Vec3::new(0.0, 0.0, 5e-4))
        .into_mesh(Material::default())
        .unwrap();
    let mut state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    constraints.add_wall(Vec3::Z, 0.0, 1e-3).unwrap();
    let params = SimParams::default();
    let dt = params.dt;
    let mut integrator = Integrator::new(params).unwrap();

    let mut contact_steps = 0;
    for _ in 0..20 {
        state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), dt).unwrap();
        let report = integrator.step(&mesh, &mut state, &constraints).unwrap();
        if let Some(gap) = report.min_gap {
            contact_steps += 1;
            assert!(gap > -1e-3);
        }
    }
    assert!(contact_steps > 0);
    assert!(state.positions().iter().all(|p| p.z > -1e-3));
    let contacts = integrator.compute_contacts(&mesh, &state, &constraints).unwrap();
    assert!(contacts.iter().all(|c| !c.is_penetrating()));
}

#[test]
fn pcg_and_cholesky_agree() {
    let n = 3;
    let mesh = sheet(n, Material::default().with_bending(1e-4));
    let run = |kind: LinearSolverKind| {
        let mut state = stretched_state(&mesh, 1.1);
        let constraints = pin_corners(&state, n);
        let params = SimParams {
            linear_solver: kind,
            pcg_tol: 1e-10,
            pcg_max_iters: 10_000,
            min_newton_steps: 3,
            max_newton_steps: 3,
            ..Default::default()
        };
        let mut integrator = Integrator::new(params).unwrap();
        integrator.step(&mesh, &mut state, &constraints).unwrap();
        state.positions().to_vec()
    };

    let pcg = run(LinearSolverKind::Pcg);
    let chol = run(LinearSolverKind::Cholesky);
    for (a, b) in pcg.iter().zip(&chol) {
        assert!((*a - *b).length() < 1e-6, "{a} vs {b}");
    }
}

#[test]
fn wall_helper_matches_constraint_wall() {
    let wall = Wall::ground(0.0, 1e-3).unwrap();
    let mut constraints = ConstraintSet::new();
    constraints.add_wall(Vec3::Z, 0.0, 1e-3).unwrap();
    assert_eq!(constraints.walls()[0], wall);
}
