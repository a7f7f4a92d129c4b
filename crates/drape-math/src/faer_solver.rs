//! Sparse Cholesky solver backed by `faer`.
//!
//! Implements the [`SparseSolver`] trait using faer's supernodal LLᵀ
//! factorization. Block systems are expanded to scalar CSR, converted to
//! faer's CSC layout, factorized and solved in one shot.
//!
//! ## Workflow
//! 1. `factorize(matrix)`: converts CSR→CSC, computes symbolic + numeric LLᵀ
//! 2. `solve_scalar(rhs, solution)`: forward/backward substitution
//! 3. Repeat `solve_scalar()` with different RHS without re-factorizing

use faer::Side;
use faer::linalg::solvers::Solve;
use faer::sparse::SparseColMat;
use faer::sparse::Triplet;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use glam::DVec3;

use drape_types::{DrapeError, DrapeResult};

use crate::sparse::{relative_residual, BlockCsrMatrix, CsrMatrix, SolveReport, SparseSolver};

/// Sparse Cholesky (LLᵀ) solver using `faer`.
///
/// The Newton matrix changes every iteration, so the [`SparseSolver`]
/// implementation refactorizes on each call. The scalar API keeps the
/// factorization for repeated right-hand sides.
pub struct FaerSolver {
    /// Cached LLᵀ factorization.
    factorization: Option<Llt<usize, f64>>,
    /// Matrix dimension (N×N).
    dimension: usize,
}

impl FaerSolver {
    /// Creates a new solver (unfactorized).
    pub fn new() -> Self {
        Self {
            factorization: None,
            dimension: 0,
        }
    }

    /// Convert a CSR matrix to faer's CSC matrix.
    ///
    /// Only the upper triangle is passed on; faer reads `Side::Upper`.
    fn csr_to_csc(matrix: &CsrMatrix) -> DrapeResult<SparseColMat<usize, f64>> {
        let mut triplets: Vec<Triplet<usize, usize, f64>> =
            Vec::with_capacity(matrix.values.len());
        for row in 0..matrix.rows {
            for idx in matrix.row_ptr[row]..matrix.row_ptr[row + 1] {
                let col = matrix.col_idx[idx];
                if col >= row {
                    triplets.push(Triplet {
                        row,
                        col,
                        val: matrix.values[idx],
                    });
                }
            }
        }

        SparseColMat::try_new_from_triplets(matrix.rows, matrix.cols, &triplets).map_err(|e| {
            DrapeError::LinearSolve(format!("failed to construct faer CSC matrix: {e:?}"))
        })
    }

    /// Factorize a symmetric positive-definite matrix.
    pub fn factorize(&mut self, matrix: &CsrMatrix) -> DrapeResult<()> {
        if matrix.rows != matrix.cols {
            return Err(DrapeError::LinearSolve(format!(
                "matrix must be square, got {}×{}",
                matrix.rows, matrix.cols
            )));
        }
        if matrix.rows == 0 {
            return Err(DrapeError::LinearSolve(
                "cannot factorize empty matrix".into(),
            ));
        }

        self.factorization = None;
        self.dimension = matrix.rows;

        let csc = Self::csr_to_csc(matrix)?;

        // Symbolic analysis (ordering, fill-in prediction)
        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| DrapeError::LinearSolve(format!("symbolic analysis failed: {e:?}")))?;

        // Numeric factorization
        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper).map_err(|e| {
            DrapeError::LinearSolve(format!("Cholesky factorization failed: {e:?}"))
        })?;

        self.factorization = Some(llt);
        Ok(())
    }

    /// Solve `A x = b` with the cached factorization.
    pub fn solve_scalar(&self, rhs: &[f64], solution: &mut [f64]) -> DrapeResult<()> {
        let llt = self.factorization.as_ref().ok_or_else(|| {
            DrapeError::LinearSolve("solver not factorized; call factorize() first".into())
        })?;

        if rhs.len() != self.dimension || solution.len() != self.dimension {
            return Err(DrapeError::LinearSolve(format!(
                "vector lengths (rhs {}, solution {}) != matrix dimension ({})",
                rhs.len(),
                solution.len(),
                self.dimension
            )));
        }

        let rhs_mat: faer::Mat<f64> = faer::Mat::from_fn(self.dimension, 1, |i, _| rhs[i]);
        let sol = llt.solve(&rhs_mat);

        for (i, out) in solution.iter_mut().enumerate() {
            *out = sol[(i, 0)];
        }
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(DrapeError::LinearSolve(
                "Cholesky solve produced non-finite values".into(),
            ));
        }
        Ok(())
    }

    /// Returns true if the solver holds a valid factorization.
    pub fn is_factorized(&self) -> bool {
        self.factorization.is_some()
    }
}

impl Default for FaerSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SparseSolver for FaerSolver {
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
        if n == 0 {
            return Ok(SolveReport {
                iterations: 0,
                relative_residual: 0.0,
                converged: true,
            });
        }

        self.factorize(&matrix.to_csr())?;

        let flat_rhs: Vec<f64> = rhs.iter().flat_map(|v| v.to_array()).collect();
        let mut flat_sol = vec![0.0; flat_rhs.len()];
        self.solve_scalar(&flat_rhs, &mut flat_sol)?;

        for (i, out) in solution.iter_mut().enumerate() {
            *out = DVec3::new(flat_sol[3 * i], flat_sol[3 * i + 1], flat_sol[3 * i + 2]);
        }

        Ok(SolveReport {
            iterations: 1,
            relative_residual: relative_residual(matrix, rhs, solution),
            converged: true,
        })
    }

    fn name(&self) -> &str {
        "Sparse Cholesky (faer)"
    }
}
