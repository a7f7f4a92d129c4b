//! Preconditioned Conjugate Gradient on 3×3 block-sparse systems.
//!
//! Uses block-Jacobi preconditioning (inverse of each diagonal 3×3 block).
//! The iteration keeps the best iterate seen so far, so a solve that
//! stalls or hits the iteration cap still returns a useful direction.

use glam::{DMat3, DVec3};
use tracing::warn;

use drape_types::DrapeResult;
use drape_types::DrapeError;

use crate::sparse::{BlockCsrMatrix, SolveReport, SparseSolver};
use crate::{dot, max_abs};

/// Block-Jacobi preconditioner: `P⁻¹ = blockdiag(Aᵢᵢ⁻¹)`.
#[derive(Debug, Clone)]
pub struct BlockJacobi {
    inverses: Vec<DMat3>,
}

impl BlockJacobi {
    /// Builds the preconditioner from the matrix diagonal.
    ///
    /// Singular or non-finite blocks fall back to the identity.
    pub fn new(matrix: &BlockCsrMatrix) -> Self {
        let inverses = (0..matrix.num_blocks)
            .map(|i| {
                let d = matrix.diagonal_block(i);
                let det = d.determinant();
                if det.is_finite() && det.abs() > f64::MIN_POSITIVE {
                    let inv = d.inverse();
                    if crate::spd::is_finite_mat3(&inv) {
                        return inv;
                    }
                }
                DMat3::IDENTITY
            })
            .collect();
        Self { inverses }
    }

    /// Computes `z = P⁻¹ r`.
    pub fn apply(&self, r: &[DVec3]) -> Vec<DVec3> {
        self.inverses.iter().zip(r).map(|(m, v)| *m * *v).collect()
    }
}

/// Block-Jacobi preconditioned conjugate gradient solver.
#[derive(Debug, Clone)]
pub struct PcgSolver {
    /// Relative residual target `‖r‖∞ / ‖b‖∞`.
    pub tolerance: f64,
    /// Iteration cap.
    pub max_iterations: usize,
}

impl PcgSolver {
    /// Creates a solver with the given tolerance and iteration cap.
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }
}

impl Default for PcgSolver {
    fn default() -> Self {
        Self::new(
            drape_types::constants::DEFAULT_PCG_TOL,
            drape_types::constants::DEFAULT_PCG_MAX_ITERS as usize,
        )
    }
}

impl SparseSolver for PcgSolver {
    fn solve(
        &mut self,
        matrix: &BlockCsrMatrix,
        rhs: &[DVec3],
        solution: &mut [DVec3],
    ) -> DrapeResult<SolveReport> {
        let n = matrix.num_blocks;
        if rhs.len() != n || solution.len() != n {
            return Err(DrapeError::LinearSolve(format!(
                "dimension mismatch: matrix has {n} blocks, rhs {} and solution {}",
                rhs.len(),
                solution.len()
            )));
        }

        let b_norm = max_abs(rhs);
        if b_norm == 0.0 {
            solution.fill(DVec3::ZERO);
            return Ok(SolveReport {
                iterations: 0,
                relative_residual: 0.0,
                converged: true,
            });
        }

        let precond = BlockJacobi::new(matrix);

        // r = b − A x0
        let ax = matrix.mul_vec(solution);
        let mut r: Vec<DVec3> = rhs.iter().zip(&ax).map(|(b, a)| *b - *a).collect();
        let mut z = precond.apply(&r);
        let mut p = z.clone();
        let mut rz = dot(&r, &z);

        let mut best = solution.to_vec();
        let mut best_residual = max_abs(&r) / b_norm;
        let mut iterations = 0;

        while iterations < self.max_iterations && best_residual > self.tolerance {
            let ap = matrix.mul_vec(&p);
            let pap = dot(&p, &ap);
            if !pap.is_finite() || pap <= 0.0 {
                // Matrix not positive definite along p.
                break;
            }
            let alpha = rz / pap;

            for i in 0..n {
                solution[i] += p[i] * alpha;
                r[i] -= ap[i] * alpha;
            }
            iterations += 1;

            let residual = max_abs(&r) / b_norm;
            if residual < best_residual {
                best_residual = residual;
                best.copy_from_slice(solution);
            }
            if residual <= self.tolerance {
                break;
            }

            z = precond.apply(&r);
            let rz_next = dot(&r, &z);
            if rz.abs() <= f64::MIN_POSITIVE {
                break;
            }
            let beta = rz_next / rz;
            rz = rz_next;
            for i in 0..n {
                p[i] = z[i] + p[i] * beta;
            }
        }

        solution.copy_from_slice(&best);
        let converged = best_residual <= self.tolerance;
        if !converged {
            warn!(
                iterations,
                relative_residual = best_residual,
                tolerance = self.tolerance,
                "PCG did not reach tolerance; returning best iterate"
            );
        }

        Ok(SolveReport {
            iterations,
            relative_residual: best_residual,
            converged,
        })
    }

    fn name(&self) -> &str {
        "PCG (block Jacobi)"
    }
}
