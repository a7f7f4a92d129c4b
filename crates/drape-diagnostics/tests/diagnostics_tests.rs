//! Integration tests for drape-diagnostics.

use drape_contact::{Contact, ContactKind, Stencil};
use drape_diagnostics::{
    CollisionMetrics, CollisionValidator, EnergyDiagnostics, EnergyTracker, QualityLevel,
};
use drape_material::Material;
use drape_math::{Mat3, Vec3};
use drape_mesh::generators::{grid_corners, quad_grid};
use drape_mesh::Mesh;
use drape_solver::{ConstraintSet, Integrator, SimParams, SimulationState};

fn sheet_at(n: usize, offset: Vec3) -> Mesh {
    quad_grid(n, n, 1.0, 1.0)
        .translated(offset)
        .into_mesh(Material::default())
        .unwrap()
}

fn mean_height(state: &SimulationState) -> f64 {
    state.positions().iter().map(|p| p.z).sum::<f64>() / state.num_vertices() as f64
}

fn mean_vertical_velocity(state: &SimulationState) -> f64 {
    state.velocities().iter().map(|v| v.z).sum::<f64>() / state.num_vertices() as f64
}

fn wall_contact(vertex: usize, gap: f64) -> Contact {
    Contact {
        kind: ContactKind::Wall { vertex, wall: 0 },
        witness: Vec3::ZERO,
        normal: Vec3::Z,
        gap,
        stencil: Stencil::single(vertex),
    }
}

// ─── EnergyTracker Tests ─────────────────────────────────────

#[test]
fn energy_of_rigid_translation() {
    let mesh = sheet_at(4, Vec3::new(0.0, 1.0, 0.0));
    let mut state = SimulationState::from_mesh(&mesh);
    for v in state.velocities_mut() {
        *v = Vec3::X;
    }

    let diag = EnergyTracker::compute(&mesh, &state, &ConstraintSet::new(), &SimParams::default())
        .unwrap();

    assert!((diag.kinetic_energy - 0.5).abs() < 1e-12);
    assert!(diag.elastic_energy < 1e-12);
    assert_eq!(diag.barrier_energy, 0.0);
    assert_eq!(diag.num_contacts, 0);
    assert!((diag.total_energy - 0.5).abs() < 1e-12);
    assert!((diag.linear_momentum - Vec3::X).length() < 1e-12);
    assert!((diag.angular_momentum - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    assert!((diag.max_velocity - 1.0).abs() < 1e-15);
}

#[test]
fn energy_counts_pins_and_contacts() {
    let mesh = sheet_at(3, Vec3::new(0.0, 0.0, 5e-4));
    let state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    constraints.add_pin(0, state.positions()[0]);
    constraints.add_wall(Vec3::Z, 0.0, 1e-3).unwrap();

    let diag = EnergyTracker::compute(&mesh, &state, &constraints, &SimParams::default()).unwrap();
    assert_eq!(diag.num_pins, 1);
    assert_eq!(diag.num_contacts, mesh.num_vertices());
    assert!(diag.barrier_energy > 0.0);
    assert!(
        (diag.total_energy - diag.kinetic_energy - diag.elastic_energy - diag.barrier_energy).abs()
            < 1e-15
    );
}

#[test]
fn energy_rejects_uninitialized_state() {
    let mesh = sheet_at(2, Vec3::ZERO);
    let state = SimulationState::new();
    assert!(
        EnergyTracker::compute(&mesh, &state, &ConstraintSet::new(), &SimParams::default())
            .is_err()
    );
}

#[test]
fn drift_relative_to_previous_total() {
    let previous = EnergyDiagnostics {
        total_energy: 2.0,
        ..Default::default()
    };
    let mut current = EnergyDiagnostics {
        total_energy: 1.5,
        ..Default::default()
    };
    current.update_drift(&previous);
    assert!((current.energy_drift_absolute + 0.5).abs() < 1e-15);
    assert!((current.energy_drift_percent + 25.0).abs() < 1e-12);

    current.update_drift(&EnergyDiagnostics::default());
    assert_eq!(current.energy_drift_absolute, 0.0);
    assert_eq!(current.energy_drift_percent, 0.0);
}

// ─── CollisionValidator Tests ────────────────────────────────

#[test]
fn empty_contact_set_is_excellent() {
    let metrics = CollisionMetrics::from_contacts(&[], 1e-3, true);
    assert_eq!(metrics.num_total_contacts, 0);
    assert_eq!(metrics.min_gap, 0.0);
    assert_eq!(metrics.avg_gap, 0.0);
    assert!(metrics.is_stable);
    assert_eq!(metrics.ccd_effectiveness, 0.0);
    assert_eq!(metrics.quality_level(), QualityLevel::Excellent);
}

#[test]
fn gap_statistics_and_ccd_share() {
    let contacts = [
        wall_contact(0, 2e-4),
        wall_contact(1, 4e-4),
        wall_contact(2, 9e-4),
    ];
    let metrics = CollisionMetrics::from_contacts(&contacts, 1e-3, true);
    assert_eq!(metrics.num_wall, 3);
    assert_eq!(metrics.num_point_triangle + metrics.num_edge_edge, 0);
    assert_eq!(metrics.min_gap, 2e-4);
    assert_eq!(metrics.max_gap, 9e-4);
    assert!((metrics.avg_gap - 5e-4).abs() < 1e-15);
    assert!((metrics.ccd_effectiveness - 200.0 / 3.0).abs() < 1e-9);

    let no_ccd = CollisionMetrics::from_contacts(&contacts, 1e-3, false);
    assert_eq!(no_ccd.ccd_effectiveness, 0.0);
}

#[test]
fn quality_levels_follow_penetration_depth() {
    let grade = |gap: f64| CollisionMetrics::from_contacts(&[wall_contact(0, gap)], 1e-2, true);

    let tiny = grade(-5e-5);
    assert_eq!(tiny.quality_level(), QualityLevel::Good);
    assert!(!tiny.is_stable);
    assert_eq!(tiny.num_penetrations, 1);
    assert!((tiny.avg_penetration - 5e-5).abs() < 1e-18);

    assert_eq!(grade(-5e-4).quality_level(), QualityLevel::Warning);

    let deep = grade(-2e-3);
    assert!(deep.has_tunneling);
    assert!(deep.has_major_penetration);
    assert_eq!(deep.quality_level(), QualityLevel::Error);

    // Tunneling is relative to the activation gap.
    let tight = CollisionMetrics::from_contacts(&[wall_contact(0, -5e-5)], 1e-4, true);
    assert!(tight.has_tunneling);
    assert_eq!(tight.quality_level(), QualityLevel::Error);

    assert!(QualityLevel::Excellent < QualityLevel::Good);
    assert!(QualityLevel::Warning < QualityLevel::Error);
    assert!(QualityLevel::Error.description().starts_with("Error"));
}

#[test]
fn velocity_statistics() {
    let mesh = sheet_at(1, Vec3::ZERO);
    let mut state = SimulationState::from_mesh(&mesh);
    state.velocities_mut()[0] = Vec3::new(0.0, 0.0, -2.0);
    state.velocities_mut()[1] = Vec3::new(1.0, 0.0, 0.0);
    let contacts = [wall_contact(0, 1e-4), wall_contact(1, 1e-4), wall_contact(99, 1e-4)];

    let rel = CollisionValidator::relative_velocities(&state, &contacts);
    assert_eq!(rel, vec![2.0, 1.0]);

    let metrics = CollisionValidator::compute_metrics(&mesh, &state, &contacts, 1e-3, true);
    assert_eq!(metrics.max_relative_velocity, 2.0);
    assert!((metrics.avg_relative_velocity - 1.5).abs() < 1e-15);
    assert_eq!(metrics.max_approach_velocity, 2.0);

    assert!(!CollisionValidator::has_penetrations(&contacts));
    assert!(CollisionValidator::has_penetrations(&[wall_contact(0, -1e-6)]));
    assert_eq!(
        CollisionValidator::max_penetration_depth(&[wall_contact(0, -1e-6), wall_contact(1, -3e-6)]),
        3e-6
    );
}

// ─── Scenario Properties ─────────────────────────────────────

#[test]
fn pinned_sheet_drapes_onto_ground_cleanly() {
    let n = 4;
    let gap = 1e-3;
    let mesh = sheet_at(n, Vec3::new(0.0, 0.0, 0.01));
    assert_eq!(mesh.num_vertices(), 25);
    let mut state = SimulationState::from_mesh(&mesh);
    let mut constraints = ConstraintSet::new();
    let corners = grid_corners(n, n);
    for &v in &corners[..2] {
        constraints.add_pin(v, state.positions()[v]);
    }
    constraints.add_wall(Vec3::Z, 0.0, gap).unwrap();

    let params = SimParams {
        dt: 0.01,
        ..Default::default()
    };
    let dt = params.dt;
    let mut integrator = Integrator::new(params).unwrap();

    let mut heights = vec![mean_height(&state)];
    for _ in 0..50 {
        state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), dt).unwrap();
        integrator.step(&mesh, &mut state, &constraints).unwrap();
        heights.push(mean_height(&state));
        assert!(state.positions().iter().all(|p| p.z > -gap));

        let contacts = integrator.compute_contacts(&mesh, &state, &constraints).unwrap();
        let metrics = CollisionValidator::compute_metrics(&mesh, &state, &contacts, gap, true);
        assert_eq!(metrics.num_penetrations, 0);
        assert!(!metrics.has_tunneling);
        assert!(metrics.quality_level() <= QualityLevel::Good);
    }

    // Falls first, then settles.
    assert!(heights[1] < heights[0]);
    assert!(heights[2] < heights[1]);
    assert!(heights[50] < heights[0]);
    assert!((heights[50] - heights[40]).abs() < 1e-3);
    let max_vz = state.velocities().iter().map(|v| v.z.abs()).fold(0.0, f64::max);
    assert!(max_vz < 0.05, "sheet still moving vertically at {max_vz}");
    for &v in &corners[..2] {
        assert!((state.positions()[v].z - 0.01).abs() < 1e-12);
    }
}

#[test]
fn wider_activation_gap_catches_a_falling_sheet_earlier() {
    let run = |gap_max: f64| {
        let mesh = sheet_at(3, Vec3::new(0.0, 0.0, 0.005));
        let mut state = SimulationState::from_mesh(&mesh);
        for v in state.velocities_mut() {
            v.z = -0.1;
        }
        let mut constraints = ConstraintSet::new();
        constraints.add_wall(Vec3::Z, 0.0, gap_max).unwrap();
        let params = SimParams {
            contact_gap_max: gap_max,
            wall_gap: gap_max,
            ..Default::default()
        };
        let dt = params.dt;
        let mut integrator = Integrator::new(params).unwrap();

        let mut braking_height = None;
        for _ in 0..150 {
            let vz_before = mean_vertical_velocity(&state);
            state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), dt).unwrap();
            integrator.step(&mesh, &mut state, &constraints).unwrap();
            if braking_height.is_none() && mean_vertical_velocity(&state) > vz_before {
                braking_height = Some(mean_height(&state));
            }
        }

        let contacts = integrator.compute_contacts(&mesh, &state, &constraints).unwrap();
        let metrics = CollisionValidator::compute_metrics(&mesh, &state, &contacts, gap_max, true);
        (braking_height, metrics)
    };

    let (narrow_braking, narrow) = run(1e-3);
    let (wide_braking, wide) = run(2e-3);
    let narrow_braking = narrow_braking.unwrap();
    let wide_braking = wide_braking.unwrap();

    assert!(narrow_braking < 1e-3);
    assert!(wide_braking > narrow_braking);
    assert!(wide_braking < 2e-3);

    assert_eq!(narrow.num_penetrations + wide.num_penetrations, 0);
    assert!(narrow.num_total_contacts > 0);
    assert!(wide.num_total_contacts > 0);
    assert!(wide.avg_gap > narrow.avg_gap);
    assert!(wide.min_gap > narrow.avg_gap);
}

#[test]
fn larger_activation_gap_shifts_gap_statistics_up() {
    let n = 4;
    let mesh = sheet_at(n, Vec3::ZERO);
    let mut state = SimulationState::from_mesh(&mesh);
    // Tilt the sheet so heights range from 1e-4 to 3.1e-3.
    for p in state.positions_mut() {
        p.z = 1e-4 + 3e-3 * (p.y + 0.5);
    }

    let metrics_for = |gap_max: f64| {
        let mut constraints = ConstraintSet::new();
        constraints.add_wall(Vec3::Z, 0.0, gap_max).unwrap();
        let params = SimParams {
            contact_gap_max: gap_max,
            ..Default::default()
        };
        let integrator = Integrator::new(params).unwrap();
        let contacts = integrator.compute_contacts(&mesh, &state, &constraints).unwrap();
        CollisionValidator::compute_metrics(&mesh, &state, &contacts, gap_max, true)
    };

    let narrow = metrics_for(1e-3);
    let wide = metrics_for(2e-3);
    assert!(narrow.num_total_contacts > 0);
    assert!(wide.num_total_contacts > narrow.num_total_contacts);
    assert!(wide.max_gap > narrow.max_gap);
    assert!(wide.avg_gap > narrow.avg_gap);
    assert_eq!(wide.min_gap, narrow.min_gap);
}

#[test]
fn friction_holds_a_sheet_on_an_incline() {
    let tilt: f64 = 0.35;
    let gap = 1e-3;
    let normal = Vec3::new(0.0, -tilt.sin(), tilt.cos());

    let slide = |mu: f64| {
        let mesh = quad_grid(3, 3, 0.5, 0.5)
            .rotated(Mat3::from_rotation_x(tilt))
            .translated(Vec3::new(0.0, 0.0, 9e-4 / tilt.cos()))
            .into_mesh(Material::default())
            .unwrap();
        let mut state = SimulationState::from_mesh(&mesh);
        let mut constraints = ConstraintSet::new();
        constraints.add_wall(normal, 0.0, gap).unwrap();
        let params = SimParams {
            enable_friction: mu > 0.0,
            friction_mu: mu,
            ..Default::default()
        };
        let dt = params.dt;
        let mut integrator = Integrator::new(params).unwrap();
        for _ in 0..100 {
            state.apply_gravity(Vec3::new(0.0, 0.0, -9.81), dt).unwrap();
            integrator.step(&mesh, &mut state, &constraints).unwrap();
        }

        let contacts = integrator.compute_contacts(&mesh, &state, &constraints).unwrap();
        let metrics = CollisionValidator::compute_metrics(&mesh, &state, &contacts, gap, true);
        assert!(metrics.num_total_contacts > 0);
        assert_eq!(metrics.num_penetrations, 0);
        metrics.max_relative_velocity
    };

    let slippery = slide(0.0);
    let rough = slide(0.8);
    assert!(slippery > 0.1, "frictionless sheet only reached {slippery}");
    assert!(rough < 0.25 * slippery, "rough {rough} vs slippery {slippery}");
}

#[test]
fn energy_never_grows_without_external_forces() {
    let n = 4;
    let mesh = sheet_at(n, Vec3::ZERO);
    let mut state = SimulationState::from_mesh(&mesh);
    for p in state.positions_mut() {
        p.x *= 1.2;
    }
    let mut constraints = ConstraintSet::new();
    for v in grid_corners(n, n) {
        constraints.add_pin(v, state.positions()[v]);
    }

    let params = SimParams {
        dt: 0.01,
        max_newton_steps: 40,
        pcg_tol: 1e-8,
        enable_friction: false,
        contact_restitution: 0.0,
        velocity_damping: 0.0,
        ..Default::default()
    };
    let mut integrator = Integrator::new(params.clone()).unwrap();

    let e0 = EnergyTracker::compute(&mesh, &state, &constraints, &params)
        .unwrap()
        .total_energy;
    assert!(e0 > 0.0);

    let mut previous = e0;
    for step in 0..10 {
        integrator.step(&mesh, &mut state, &constraints).unwrap();
        let energy = EnergyTracker::compute(&mesh, &state, &constraints, &params)
            .unwrap()
            .total_energy;
        assert!(
            energy <= previous + 1e-6 * e0,
            "energy grew at step {step}: {previous} -> {energy}"
        );
        previous = energy;
    }
    assert!(previous < e0);

    for (&v, target) in constraints.pins() {
        assert!(state.positions()[v].distance(*target) < 1e-12);
    }
}

#[test]
fn metrics_serialize_to_json() {
    let metrics = CollisionMetrics::from_contacts(&[wall_contact(0, -5e-4)], 1e-2, true);
    let json = serde_json::to_string(&metrics).unwrap();
    let back: CollisionMetrics = serde_json::from_str(&json).unwrap();
    assert_eq!(back, metrics);
    assert_eq!(
        serde_json::to_string(&QualityLevel::Warning).unwrap(),
        "\"warning\""
    );
}
