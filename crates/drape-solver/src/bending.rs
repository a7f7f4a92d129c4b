//! Quadratic isometric bending on interior edges (Discrete Shells stencil).
//!
//! Each interior edge carries a constant 4-vertex stencil `c` over
//! `[v0, v1, wing_a, wing_b]` built from the rest geometry. For small folds
//! `Σ cᵢ xᵢ` is the bending-angle vector of the hinge, so
//!
//!   E_bend = ½ · w · ‖Σ cᵢ xᵢ‖²,   w = k_b · 3|e|² / A_e
//!
//! where `A_e` is the combined rest area of the two adjacent triangles.
//! The Hessian `w cᵢ cⱼ I` is constant and positive semi-definite.
//!
//! ## Geometry
//!
//! ```text
//!        wa
//!       / \
//!      /   \
//!    v0 ─── v1
//!      \   /
//!       \ /
//!        wb
//! ```

use drape_math::{Mat3, Vec3};
use drape_mesh::Mesh;

/// Rest edges shorter than this produce no bending element.
const MIN_EDGE_LENGTH: f64 = 1e-10;

/// A single bending hinge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BendingElement {
    /// Vertex indices `[v0, v1, wing_a, wing_b]`.
    pub vertices: [usize; 4],
    /// Stencil coefficients parallel to `vertices` (sum to zero).
    pub stencil: [f64; 4],
    /// Energy weight `k_b · 3|e|² / A_e`.
    pub weight: f64,
}

impl BendingElement {
    /// Bending vector `Σ cᵢ xᵢ`.
    #[inline]
    pub fn curvature(&self, positions: &[Vec3]) -> Vec3 {
        self.vertices
            .iter()
            .zip(&self.stencil)
            .fold(Vec3::ZERO, |acc, (&v, &c)| acc + positions[v] * c)
    }

    /// Energy `½ w ‖Σ cᵢ xᵢ‖²`.
    #[inline]
    pub fn energy(&self, positions: &[Vec3]) -> f64 {
        0.5 * self.weight * self.curvature(positions).length_squared()
    }

    /// Gradient blocks `w cᵢ (Σ cⱼ xⱼ)` parallel to `vertices`.
    pub fn gradient(&self, positions: &[Vec3]) -> [Vec3; 4] {
        let kappa = self.curvature(positions) * self.weight;
        self.stencil.map(|c| kappa * c)
    }

    /// Hessian block `(i, j)` for local indices.
    #[inline]
    pub fn hessian_block(&self, i: usize, j: usize) -> Mat3 {
        Mat3::from_diagonal(Vec3::splat(self.weight * self.stencil[i] * self.stencil[j]))
    }
}

/// Builds one element per interior edge of `mesh`.
///
/// Returns an empty list when the material has no bending stiffness.
pub fn build_bending_elements(mesh: &Mesh) -> Vec<BendingElement> {
    let stiffness = mesh.material().bending_stiffness;
    if stiffness <= 0.0 {
        return Vec::new();
    }
    let rest = mesh.rest_positions();
    let triangle_rest = mesh.triangle_rest();

    mesh.topology()
        .interior_edges
        .iter()
        .filter_map(|ie| {
            let area_a = triangle_rest[ie.tri_a].area;
            let area_b = triangle_rest[ie.tri_b].area;
            if area_a <= 0.0 || area_b <= 0.0 {
                return None;
            }

            let (p0, p1) = (rest[ie.v0], rest[ie.v1]);
            let (pa, pb) = (rest[ie.wing_a], rest[ie.wing_b]);
            let edge = p1 - p0;
            let edge_len = edge.length();
            if edge_len < MIN_EDGE_LENGTH {
                return None;
            }
            let inv_e2 = 1.0 / (edge_len * edge_len);

            // Wing coefficients are inverse heights over the shared edge;
            // the edge coefficients make the stencil sum to exactly zero.
            let c_wa = edge_len / (2.0 * area_a);
            let c_wb = edge_len / (2.0 * area_b);
            let c_0 = -(p1 - pa).dot(edge) * inv_e2 * c_wa - (p1 - pb).dot(edge) * inv_e2 * c_wb;
            let c_1 = -(pa - p0).dot(edge) * inv_e2 * c_wa - (pb - p0).dot(edge) * inv_e2 * c_wb;

            let weight = stiffness * 3.0 * edge_len * edge_len / (area_a + area_b);

            Some(BendingElement {
                vertices: [ie.v0, ie.v1, ie.wing_a, ie.wing_b],
                stencil: [c_0, c_1, c_wa, c_wb],
                weight,
            })
        })
        .collect()
}
