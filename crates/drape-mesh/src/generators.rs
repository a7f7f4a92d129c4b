//! Procedural mesh generators for scenes, benchmarks and testing.
//!
//! These generators produce deterministic, resolution-configurable
//! geometry with consistent winding order. A [`MeshGeometry`] is plain
//! data; attach a material with [`MeshGeometry::into_mesh`].

use serde::{Deserialize, Serialize};

use drape_material::Material;
use drape_math::{Mat3, Vec3};
use drape_types::DrapeResult;

use crate::mesh::Mesh;

/// Raw vertex positions and triangle indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangle index triples.
    pub triangles: Vec<[usize; 3]>,
}

impl MeshGeometry {
    /// Returns the geometry translated by `offset`.
    pub fn translated(mut self, offset: Vec3) -> Self {
        for p in &mut self.positions {
            *p += offset;
        }
        self
    }

    /// Returns the geometry with every position multiplied by `rotation`.
    pub fn rotated(mut self, rotation: Mat3) -> Self {
        for p in &mut self.positions {
            *p = rotation * *p;
        }
        self
    }

    /// Builds a [`Mesh`] with the given material.
    pub fn into_mesh(self, material: Material) -> DrapeResult<Mesh> {
        Mesh::initialize(self.positions, self.triangles, material)
    }
}

/// Generates a flat rectangular quad grid in the XY plane.
///
/// The grid spans `[-width/2, width/2]` in X and `[-height/2, height/2]` in Y,
/// centered at the origin at Z=0. Rows run from +Y (row 0) to −Y.
///
/// # Arguments
/// - `cols` — Number of quads along X (vertex count = cols + 1).
/// - `rows` — Number of quads along Y (vertex count = rows + 1).
/// - `width` — Total width in meters.
/// - `height` — Total height in meters.
///
/// # Example
/// ```
/// use drape_mesh::generators::quad_grid;
/// let grid = quad_grid(2, 2, 1.0, 1.0);
/// assert_eq!(grid.positions.len(), 9);  // 3×3 vertices
/// assert_eq!(grid.triangles.len(), 8);  // 2×2 quads × 2 tris each
/// ```
pub fn quad_grid(cols: usize, rows: usize, width: f64, height: f64) -> MeshGeometry {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    let mut positions = Vec::with_capacity(verts_x * verts_y);
    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f64 / cols as f64;
            let v = j as f64 / rows as f64;
            positions.push(Vec3::new(-half_w + u * width, half_h - v * height, 0.0));
        }
    }

    let mut triangles = Vec::with_capacity(cols * rows * 2);
    for j in 0..rows {
        for i in 0..cols {
            let top_left = j * verts_x + i;
            let top_right = top_left + 1;
            let bot_left = top_left + verts_x;
            let bot_right = bot_left + 1;

            triangles.push([top_left, bot_left, top_right]);
            triangles.push([top_right, bot_left, bot_right]);
        }
    }

    MeshGeometry {
        positions,
        triangles,
    }
}

/// A single right triangle with unit legs in the XY plane.
pub fn single_triangle() -> MeshGeometry {
    MeshGeometry {
        positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        triangles: vec![[0, 1, 2]],
    }
}

/// Vertex indices of the four corners of a [`quad_grid`]:
/// `[top_left, top_right, bottom_left, bottom_right]`.
pub fn grid_corners(cols: usize, rows: usize) -> [usize; 4] {
    let cols = cols.max(1);
    let rows = rows.max(1);
    let verts_x = cols + 1;
    [0, cols, rows * verts_x, rows * verts_x + cols]
}

/// Vertex indices of the top row (+Y edge) of a [`quad_grid`].
pub fn grid_top_edge(cols: usize) -> Vec<usize> {
    (0..=cols.max(1)).collect()
}
