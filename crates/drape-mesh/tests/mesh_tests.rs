//! Integration tests for drape-mesh.

use drape_material::Material;
use drape_math::{Mat3, Vec3};
use drape_mesh::generators::{grid_corners, grid_top_edge, quad_grid, single_triangle};
use drape_mesh::{Mesh, MeshGeometry};
use drape_types::constants::MIN_VERTEX_MASS;
use drape_types::DrapeError;

fn grid_mesh(cols: usize, rows: usize) -> Mesh {
    quad_grid(cols, rows, 1.0, 1.0)
        .into_mesh(Material::default())
        .unwrap()
}

// ─── Mesh Tests ───────────────────────────────────────────────

#[test]
fn single_triangle_rest_data() {
    let mesh = single_triangle().into_mesh(Material::default()).unwrap();
    assert_eq!(mesh.num_vertices(), 3);
    assert_eq!(mesh.num_triangles(), 1);
    let rest = mesh.triangle_rest()[0];
    assert!((rest.area - 0.5).abs() < 1e-12);
    assert!(!rest.is_degenerate());
    assert!((mesh.total_area() - 0.5).abs() < 1e-12);
}

#[test]
fn empty_mesh_rejected() {
    let err = Mesh::initialize(vec![], vec![], Material::default()).unwrap_err();
    assert!(matches!(err, DrapeError::InvalidMesh(_)));
}

#[test]
fn out_of_range_index_rejected() {
    let err = Mesh::initialize(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![[0, 1, 3]],
        Material::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DrapeError::InvalidMesh(_)));
}

#[test]
fn repeated_index_rejected() {
    let err = Mesh::initialize(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![[0, 1, 1]],
        Material::default(),
    )
    .unwrap_err();
    assert!(matches!(err, DrapeError::InvalidMesh(_)));
}

#[test]
fn invalid_material_rejected() {
    let bad = Material::new(-1.0, 0.3, 1000.0, 1e-3);
    let err = single_triangle().into_mesh(bad).unwrap_err();
    assert!(matches!(err, DrapeError::InvalidMaterial(_)));
}

#[test]
fn degenerate_triangle_has_zero_area() {
    let mesh = Mesh::initialize(
        vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::Y],
        vec![[0, 1, 2], [0, 1, 3]],
        Material::default(),
    )
    .unwrap();
    let rest = mesh.triangle_rest();
    assert!(rest[0].is_degenerate());
    assert_eq!(rest[0].area, 0.0);
    assert!(!rest[1].is_degenerate());
}

#[test]
fn lumped_masses_sum_to_total_mass() {
    let mesh = grid_mesh(4, 4);
    let masses = mesh.lumped_masses();
    let total: f64 = masses.iter().sum();
    let expected = Material::default().areal_density() * mesh.total_area();
    assert!((total - expected).abs() < 1e-12);
    assert!(masses.iter().all(|&m| m > 0.0));
}

#[test]
fn isolated_vertex_gets_smallest_positive_mass() {
    let mesh = Mesh::initialize(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(5.0, 5.0, 5.0)],
        vec![[0, 1, 2]],
        Material::default(),
    )
    .unwrap();
    let masses = mesh.lumped_masses();
    assert!((masses[3] - masses[0]).abs() < 1e-15);
}

#[test]
fn point_cloud_gets_min_vertex_mass() {
    let mesh = Mesh::initialize(vec![Vec3::ZERO, Vec3::X], vec![], Material::default()).unwrap();
    assert_eq!(mesh.lumped_masses(), vec![MIN_VERTEX_MASS; 2]);
    assert_eq!(mesh.min_rest_edge_length(), 0.0);
}

#[test]
fn set_material_changes_masses_not_topology() {
    let mut mesh = grid_mesh(2, 2);
    let edges_before = mesh.topology().edges.clone();
    let mass_before = mesh.lumped_masses()[4];

    let heavier = Material {
        density: 2.0 * Material::default().density,
        ..Material::default()
    };
    mesh.set_material(heavier).unwrap();
    assert_eq!(mesh.topology().edges, edges_before);
    assert!((mesh.lumped_masses()[4] - 2.0 * mass_before).abs() < 1e-15);

    let bad = Material {
        poisson_ratio: 0.7,
        ..Material::default()
    };
    assert!(mesh.set_material(bad).is_err());
    assert_eq!(mesh.material().density, heavier.density);
}

// ─── Topology Tests ───────────────────────────────────────────

#[test]
fn single_triangle_topology() {
    let mesh = single_triangle().into_mesh(Material::default()).unwrap();
    let topo = mesh.topology();
    assert_eq!(topo.edges, vec![[0, 1], [0, 2], [1, 2]]);
    assert_eq!(topo.boundary_edge_count(), 3);
    assert!(topo.interior_edges.is_empty());
    assert!(!topo.is_closed());
}

#[test]
fn grid_topology_counts() {
    let mesh = grid_mesh(4, 4);
    let topo = mesh.topology();
    // 5×5 grid: 40 axis-aligned edges + 16 diagonals.
    assert_eq!(topo.edges.len(), 56);
    assert_eq!(topo.boundary_edge_count(), 16);
    assert_eq!(topo.interior_edges.len(), 40);

    let mut sorted = topo.edges.clone();
    sorted.sort();
    assert_eq!(sorted, topo.edges);
}

#[test]
fn interior_edge_wings_are_opposite_vertices() {
    let mesh = grid_mesh(1, 1);
    let topo = mesh.topology();
    assert_eq!(topo.interior_edges.len(), 1);
    let ie = topo.interior_edges[0];
    // Diagonal between top-right (1) and bottom-left (2).
    assert_eq!([ie.v0, ie.v1], [1, 2]);
    let mut wings = [ie.wing_a, ie.wing_b];
    wings.sort();
    assert_eq!(wings, [0, 3]);
    assert_eq!(topo.edges[ie.edge], [1, 2]);
}

#[test]
fn edges_share_vertex_query() {
    let mesh = single_triangle().into_mesh(Material::default()).unwrap();
    assert!(mesh.topology().edges_share_vertex(0, 1));
}

// ─── Generator Tests ──────────────────────────────────────────

#[test]
fn quad_grid_layout() {
    let grid = quad_grid(4, 4, 2.0, 1.0);
    assert_eq!(grid.positions.len(), 25);
    assert_eq!(grid.triangles.len(), 32);
    assert_eq!(grid.positions[0], Vec3::new(-1.0, 0.5, 0.0));
    assert_eq!(grid.positions[24], Vec3::new(1.0, -0.5, 0.0));

    let mesh = grid.into_mesh(Material::default()).unwrap();
    assert!((mesh.total_area() - 2.0).abs() < 1e-12);
    assert!((mesh.min_rest_edge_length() - 0.25).abs() < 1e-12);
}

#[test]
fn grid_corner_and_edge_indices() {
    assert_eq!(grid_corners(4, 4), [0, 4, 20, 24]);
    assert_eq!(grid_top_edge(3), vec![0, 1, 2, 3]);
}

#[test]
fn geometry_transforms() {
    let geom: MeshGeometry = single_triangle()
        .rotated(Mat3::from_rotation_x(std::f64::consts::FRAC_PI_2))
        .translated(Vec3::new(0.0, 0.0, 1.0));
    // Y axis maps onto Z.
    assert!((geom.positions[2] - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-12);
    assert_eq!(geom.positions[0], Vec3::new(0.0, 0.0, 1.0));
}

#[test]
fn geometry_json_roundtrip() {
    let geom = quad_grid(1, 1, 1.0, 1.0);
    let json = serde_json::to_string(&geom).unwrap();
    let back: MeshGeometry = serde_json::from_str(&json).unwrap();
    assert_eq!(geom, back);
}
