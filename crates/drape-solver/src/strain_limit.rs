//! Post-solve strain limiting.
//!
//! Two constraint families bound the stretch of the cloth:
//!
//! - every edge stays within `(1 + limit)·rest`
//! - every triangle's largest principal stretch `σ_max` stays within `1 + limit`
//!
//! Both are projected in ascending order (Gauss–Seidel, deterministic),
//! sweeping until nothing is violated or [`MAX_SWEEPS`] is reached. The
//! converged correction is then applied by the fraction `1 − exp(−dt/τ)`.
//! Corrections are split by inverse mass, so pinned vertices never move.

use drape_math::decomposition::{deformation_gradient, limit_principal_stretch, principal_stretches};
use drape_math::{Vec2, Vec3};
use drape_mesh::Mesh;

/// Upper bound on projection sweeps per relaxation.
pub const MAX_SWEEPS: usize = 100;

/// Relative violation below which a constraint counts as satisfied.
const TOLERANCE: f64 = 1e-6;

/// Edge and face strain limiter.
#[derive(Debug, Clone, Copy)]
pub struct StrainLimiter {
    /// Allowed strain before relaxation (e.g. 0.05 = 5%).
    pub limit: f64,
    /// Relaxation time constant (seconds).
    pub tau: f64,
}

impl StrainLimiter {
    /// Creates a limiter.
    pub fn new(limit: f64, tau: f64) -> Self {
        Self { limit, tau }
    }

    /// Largest principal stretch `σ_max` over all non-degenerate triangles
    /// (1 for an undeformed mesh, 0 for a mesh without elements).
    pub fn max_triangle_strain(mesh: &Mesh, positions: &[Vec3]) -> f64 {
        mesh.triangles()
            .iter()
            .zip(mesh.triangle_rest())
            .filter(|(_, rest)| !rest.is_degenerate())
            .map(|(&[a, b, c], rest)| {
                let f = deformation_gradient(positions[a], positions[b], positions[c], rest.dm_inv);
                principal_stretches(&f).0
            })
            .fold(0.0, f64::max)
    }

    /// Largest ratio `length / rest length` over all edges.
    pub fn max_edge_strain(mesh: &Mesh, positions: &[Vec3]) -> f64 {
        mesh.topology()
            .edges
            .iter()
            .zip(mesh.rest_edge_lengths())
            .filter(|(_, &rest)| rest > 0.0)
            .map(|(&[a, b], &rest)| positions[a].distance(positions[b]) / rest)
            .fold(0.0, f64::max)
    }

    /// Relaxed copy of `positions`.
    ///
    /// `inverse_masses` is zero for pinned vertices, which never move.
    pub fn relax(&self, mesh: &Mesh, positions: &[Vec3], inverse_masses: &[f64], dt: f64) -> Vec<Vec3> {
        let fraction = 1.0 - (-dt / self.tau).exp();
        if fraction <= 0.0 {
            return positions.to_vec();
        }

        let max_stretch = 1.0 + self.limit;
        let mut x = positions.to_vec();
        for _ in 0..MAX_SWEEPS {
            let edge_excess = self.project_edges(mesh, &mut x, inverse_masses, max_stretch);
            let face_excess = self.project_faces(mesh, &mut x, inverse_masses, max_stretch);
            if edge_excess.max(face_excess) <= TOLERANCE {
                break;
            }
        }

        positions
            .iter()
            .zip(&x)
            .map(|(x0, xr)| *x0 + (*xr - *x0) * fraction)
            .collect()
    }

    /// One sweep over the edges; returns the largest relative excess seen.
    fn project_edges(&self, mesh: &Mesh, x: &mut [Vec3], w: &[f64], max_stretch: f64) -> f64 {
        let mut worst: f64 = 0.0;
        let edges = &mesh.topology().edges;
        for (&[a, b], &rest) in edges.iter().zip(mesh.rest_edge_lengths()) {
            let max_len = max_stretch * rest;
            let delta = x[b] - x[a];
            let len = delta.length();
            if len <= max_len || len <= 0.0 {
                continue;
            }
            let w_sum = w[a] + w[b];
            if w_sum <= 0.0 {
                continue;
            }
            worst = worst.max(len / max_len - 1.0);
            let correction = delta / len * (len - max_len);
            x[a] += correction * (w[a] / w_sum);
            x[b] -= correction * (w[b] / w_sum);
        }
        worst
    }

    /// One sweep over the triangles; returns the largest relative excess of
    /// `σ_max` seen.
    ///
    /// An over-stretched triangle is replaced by its shape under the clamped
    /// deformation gradient, placed at the mass-weighted centroid, or
    /// anchored on its pinned vertices when it has any.
    fn project_faces(&self, mesh: &Mesh, x: &mut [Vec3], w: &[f64], max_stretch: f64) -> f64 {
        let mut worst: f64 = 0.0;
        for (&tri, rest) in mesh.triangles().iter().zip(mesh.triangle_rest()) {
            if rest.is_degenerate() {
                continue;
            }
            let [a, b, c] = tri;
            let f = deformation_gradient(x[a], x[b], x[c], rest.dm_inv);
            let sigma_max = principal_stretches(&f).0;
            if sigma_max <= max_stretch {
                continue;
            }
            let free = tri.iter().filter(|&&v| w[v] > 0.0).count();
            if free == 0 {
                continue;
            }
            worst = worst.max(sigma_max / max_stretch - 1.0);

            let limited = limit_principal_stretch(&f, max_stretch);
            let dm = rest.dm_inv.inverse();
            let centroid = (dm.x_axis + dm.y_axis) / 3.0;
            let reference = [Vec2::ZERO, dm.x_axis, dm.y_axis];
            let shape = reference.map(|u| limited.mul_vec2(u - centroid));

            let anchor = if free < 3 {
                let pinned: Vec<Vec3> = (0..3)
                    .filter(|&i| w[tri[i]] <= 0.0)
                    .map(|i| x[tri[i]] - shape[i])
                    .collect();
                pinned.iter().fold(Vec3::ZERO, |acc, p| acc + *p) / pinned.len() as f64
            } else {
                let (sum, mass) = (0..3).fold((Vec3::ZERO, 0.0), |(sum, mass), i| {
                    let m = 1.0 / w[tri[i]];
                    (sum + (x[tri[i]] - shape[i]) * m, mass + m)
                });
                sum / mass
            };

            for i in 0..3 {
                if w[tri[i]] > 0.0 {
                    x[tri[i]] = anchor + shape[i];
                }
            }
        }
        worst
    }
}
