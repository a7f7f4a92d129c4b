//! Symmetric 3×3 utilities: outer products, eigen-decomposition and
//! projection onto the positive semi-definite cone.
//!
//! Hessian blocks assembled from barrier and friction terms are only
//! symmetric up to round-off; the solver symmetrizes and clamps them
//! before handing the system to a linear solver.

use glam::{DMat3, DVec3};

/// Maximum Jacobi sweeps before giving up on further refinement.
const MAX_JACOBI_SWEEPS: usize = 32;

/// Outer product `a bᵀ` as a 3×3 matrix.
#[inline]
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// Symmetric part `(M + Mᵀ) / 2`.
#[inline]
pub fn symmetrize(m: DMat3) -> DMat3 {
    (m + m.transpose()) * 0.5
}

/// Eigen-decomposition of a symmetric 3×3 matrix.
///
/// `vectors` holds the eigenvectors as columns, matching `values` order.
#[derive(Debug, Clone, Copy)]
pub struct SymmetricEigen3 {
    pub values: DVec3,
    pub vectors: DMat3,
}

impl SymmetricEigen3 {
    /// Rebuild `V diag(λ) Vᵀ`.
    pub fn recompose(&self) -> DMat3 {
        let v = self.vectors;
        let scaled = DMat3::from_cols(
            v.x_axis * self.values.x,
            v.y_axis * self.values.y,
            v.z_axis * self.values.z,
        );
        scaled * v.transpose()
    }
}

#[inline]
fn get(m: &[[f64; 3]; 3], r: usize, c: usize) -> f64 {
    m[c][r]
}

#[inline]
fn set(m: &mut [[f64; 3]; 3], r: usize, c: usize, v: f64) {
    m[c][r] = v;
}

/// Cyclic Jacobi eigen-solver for symmetric 3×3 matrices.
///
/// Only the symmetric part of `m` is used. Converges quadratically; in
/// practice three to five sweeps reach machine precision.
pub fn symmetric_eigen3(m: DMat3) -> SymmetricEigen3 {
    let mut a = symmetrize(m).to_cols_array_2d();
    let mut v = DMat3::IDENTITY.to_cols_array_2d();

    let scale = a
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0_f64, |acc, x| acc.max(x.abs()));
    if scale == 0.0 {
        return SymmetricEigen3 {
            values: DVec3::ZERO,
            vectors: DMat3::IDENTITY,
        };
    }

    for _ in 0..MAX_JACOBI_SWEEPS {
        let off = get(&a, 0, 1).powi(2) + get(&a, 0, 2).powi(2) + get(&a, 1, 2).powi(2);
        if off.sqrt() <= f64::EPSILON * scale {
            break;
        }

        for (p, q) in [(0, 1), (0, 2), (1, 2)] {
            let apq = get(&a, p, q);
            if apq.abs() <= f64::MIN_POSITIVE {
                continue;
            }
            let app = get(&a, p, p);
            let aqq = get(&a, q, q);

            let theta = (aqq - app) / (2.0 * apq);
            let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;

            set(&mut a, p, p, app - t * apq);
            set(&mut a, q, q, aqq + t * apq);
            set(&mut a, p, q, 0.0);
            set(&mut a, q, p, 0.0);

            let r = 3 - p - q;
            let arp = get(&a, r, p);
            let arq = get(&a, r, q);
            let new_rp = c * arp - s * arq;
            let new_rq = s * arp + c * arq;
            set(&mut a, r, p, new_rp);
            set(&mut a, p, r, new_rp);
            set(&mut a, r, q, new_rq);
            set(&mut a, q, r, new_rq);

            for k in 0..3 {
                let vkp = get(&v, k, p);
                let vkq = get(&v, k, q);
                set(&mut v, k, p, c * vkp - s * vkq);
                set(&mut v, k, q, s * vkp + c * vkq);
            }
        }
    }

    SymmetricEigen3 {
        values: DVec3::new(get(&a, 0, 0), get(&a, 1, 1), get(&a, 2, 2)),
        vectors: DMat3::from_cols_array_2d(&v),
    }
}

/// Project a symmetric 3×3 matrix onto the PSD cone.
///
/// Eigenvalues below `min_eigenvalue` are clamped up to it. Passing a small
/// positive value makes the result strictly positive definite.
pub fn project_spd(m: DMat3, min_eigenvalue: f64) -> DMat3 {
    let mut eig = symmetric_eigen3(m);
    if eig.values.min_element() >= min_eigenvalue {
        return symmetrize(m);
    }
    eig.values = eig.values.max(DVec3::splat(min_eigenvalue));
    eig.recompose()
}

/// Returns true if every entry of the matrix is finite.
#[inline]
pub fn is_finite_mat3(m: &DMat3) -> bool {
    m.x_axis.is_finite() && m.y_axis.is_finite() && m.z_axis.is_finite()
}
