//! Sparse matrix representations and the linear solver interface.
//!
//! Two storage formats are provided:
//! - [`CsrMatrix`]: scalar Compressed Sparse Row, the exchange format for
//!   direct factorization backends (faer).
//! - [`BlockCsrMatrix`]: 3×3 block CSR, the native format of the Newton
//!   system where each block couples two vertices.
//!
//! Solvers implement [`SparseSolver`] and operate directly on block vectors.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use drape_types::DrapeResult;
use glam::{DMat3, DVec3};

/// Compressed Sparse Row (CSR) matrix.
///
/// Stores a sparse matrix in row-major order. Column indices within each
/// row are sorted and unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsrMatrix {
    /// Number of rows.
    pub rows: usize,
    /// Number of columns.
    pub cols: usize,
    /// Row pointer array (length = rows + 1).
    /// `row_ptr[i]..row_ptr[i+1]` are the indices into `col_idx` and `values`
    /// for non-zeros in row `i`.
    pub row_ptr: Vec<usize>,
    /// Column indices of non-zero entries.
    pub col_idx: Vec<usize>,
    /// Non-zero values.
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Creates an empty CSR matrix with the given dimensions.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            row_ptr: vec![0; rows + 1],
            col_idx: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Creates a CSR matrix from triplets (row, col, value).
    ///
    /// Duplicate entries are summed. Triplets outside the matrix bounds
    /// are ignored.
    pub fn from_triplets(rows: usize, cols: usize, triplets: &[(usize, usize, f64)]) -> Self {
        let mut sorted: Vec<(usize, usize, f64)> = triplets
            .iter()
            .copied()
            .filter(|&(r, c, _)| r < rows && c < cols)
            .collect();
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx = Vec::with_capacity(sorted.len());
        let mut values: Vec<f64> = Vec::with_capacity(sorted.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, v) in sorted {
            if last == Some((r, c)) {
                if let Some(slot) = values.last_mut() {
                    *slot += v;
                }
                continue;
            }
            col_idx.push(c);
            values.push(v);
            row_ptr[r + 1] += 1;
            last = Some((r, c));
        }

        for i in 0..rows {
            row_ptr[i + 1] += row_ptr[i];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Returns the entry at `(row, col)` (zero if not stored).
    pub fn get(&self, row: usize, col: usize) -> f64 {
        if row >= self.rows {
            return 0.0;
        }
        let range = self.row_ptr[row]..self.row_ptr[row + 1];
        match self.col_idx[range.clone()].binary_search(&col) {
            Ok(pos) => self.values[range.start + pos],
            Err(_) => 0.0,
        }
    }

    /// Computes `y = A x`.
    pub fn mul_vec(&self, x: &[f64]) -> Vec<f64> {
        (0..self.rows)
            .map(|row| {
                (self.row_ptr[row]..self.row_ptr[row + 1])
                    .map(|idx| self.values[idx] * x[self.col_idx[idx]])
                    .sum()
            })
            .collect()
    }
}

/// Square block-sparse matrix with 3×3 blocks in CSR layout.
///
/// Row `i` of blocks couples vertex `i` with the vertices listed in
/// `block_cols[block_ptr[i]..block_ptr[i+1]]`.
#[derive(Debug, Clone)]
pub struct BlockCsrMatrix {
    /// Number of block rows (= block columns = vertices).
    pub num_blocks: usize,
    /// Block row pointer array (length = num_blocks + 1).
    pub block_ptr: Vec<usize>,
    /// Block column indices, sorted within each row.
    pub block_cols: Vec<usize>,
    /// 3×3 blocks, parallel to `block_cols`.
    pub blocks: Vec<DMat3>,
}

impl BlockCsrMatrix {
    /// Creates an all-zero block matrix of dimension `num_blocks`.
    pub fn zeros(num_blocks: usize) -> Self {
        Self {
            num_blocks,
            block_ptr: vec![0; num_blocks + 1],
            block_cols: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Assembles a block matrix from `(row, col, block)` triplets.
    ///
    /// Blocks with the same `(row, col)` are summed. Out-of-range
    /// triplets are ignored.
    pub fn from_block_triplets(num_blocks: usize, mut triplets: Vec<(usize, usize, DMat3)>) -> Self {
        triplets.retain(|&(r, c, _)| r < num_blocks && c < num_blocks);
        triplets.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let mut block_ptr = vec![0usize; num_blocks + 1];
        let mut block_cols = Vec::with_capacity(triplets.len());
        let mut blocks: Vec<DMat3> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (r, c, b) in triplets {
            if last == Some((r, c)) {
                if let Some(slot) = blocks.last_mut() {
                    *slot += b;
                }
                continue;
            }
            block_cols.push(c);
            blocks.push(b);
            block_ptr[r + 1] += 1;
            last = Some((r, c));
        }

        for i in 0..num_blocks {
            block_ptr[i + 1] += block_ptr[i];
        }

        Self {
            num_blocks,
            block_ptr,
            block_cols,
            blocks,
        }
    }

    /// Scalar dimension (3 × blocks).
    pub fn dim(&self) -> usize {
        3 * self.num_blocks
    }

    /// Number of stored blocks.
    pub fn nnz_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the block at `(row, col)` if stored.
    pub fn block(&self, row: usize, col: usize) -> Option<DMat3> {
        if row >= self.num_blocks {
            return None;
        }
        let range = self.block_ptr[row]..self.block_ptr[row + 1];
        self.block_cols[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|pos| self.blocks[range.start + pos])
    }

    /// Returns the diagonal block of row `i` (zero if not stored).
    pub fn diagonal_block(&self, i: usize) -> DMat3 {
        self.block(i, i).unwrap_or(DMat3::ZERO)
    }

    /// Applies `f` to every stored diagonal block in place.
    pub fn map_diagonal_blocks<F>(&mut self, mut f: F)
    where
        F: FnMut(usize, DMat3) -> DMat3,
    {
        for row in 0..self.num_blocks {
            let range = self.block_ptr[row]..self.block_ptr[row + 1];
            if let Ok(pos) = self.block_cols[range.clone()].binary_search(&row) {
                let idx = range.start + pos;
                self.blocks[idx] = f(row, self.blocks[idx]);
            }
        }
    }

    /// Computes `y = A x` for a block vector, parallel over block rows.
    pub fn mul_vec(&self, x: &[DVec3]) -> Vec<DVec3> {
        (0..self.num_blocks)
            .into_par_iter()
            .map(|row| {
                (self.block_ptr[row]..self.block_ptr[row + 1])
                    .map(|idx| self.blocks[idx] * x[self.block_cols[idx]])
                    .fold(DVec3::ZERO, |acc, v| acc + v)
            })
            .collect()
    }

    /// Expands into a scalar CSR matrix, dropping exact zeros.
    pub fn to_csr(&self) -> CsrMatrix {
        let mut triplets = Vec::with_capacity(self.blocks.len() * 9);
        for row in 0..self.num_blocks {
            for idx in self.block_ptr[row]..self.block_ptr[row + 1] {
                let col = self.block_cols[idx];
                let block = self.blocks[idx];
                for c in 0..3 {
                    let column = block.col(c);
                    for r in 0..3 {
                        let val = column[r];
                        if val != 0.0 {
                            triplets.push((3 * row + r, 3 * col + c, val));
                        }
                    }
                }
            }
        }
        CsrMatrix::from_triplets(self.dim(), self.dim(), &triplets)
    }
}

/// Outcome of a linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolveReport {
    /// Iterations performed (1 for direct solvers).
    pub iterations: usize,
    /// Final residual `‖b − A x‖∞ / ‖b‖∞`.
    pub relative_residual: f64,
    /// Whether the requested tolerance was met.
    pub converged: bool,
}

/// Trait for symmetric positive-definite block system solvers.
///
/// Implementations: [`PcgSolver`](crate::pcg::PcgSolver) (iterative),
/// [`FaerSolver`](crate::faer_solver::FaerSolver) (sparse Cholesky).
pub trait SparseSolver: Send {
    /// Solve `A x = b`. `x` provides the initial guess where supported and
    /// receives the solution.
    fn solve(
        &mut self,
        matrix: &BlockCsrMatrix,
        rhs: &[DVec3],
        solution: &mut [DVec3],
    ) -> DrapeResult<SolveReport>;

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Relative residual `‖b − A x‖∞ / ‖b‖∞` (0 when `b` is zero and `x` solves it).
pub fn relative_residual(matrix: &BlockCsrMatrix, rhs: &[DVec3], solution: &[DVec3]) -> f64 {
    let ax = matrix.mul_vec(solution);
    let res = ax
        .iter()
        .zip(rhs)
        .map(|(a, b)| (*b - *a).abs().max_element())
        .fold(0.0, f64::max);
    let b_norm = crate::max_abs(rhs);
    if b_norm > 0.0 {
        res / b_norm
    } else {
        res
    }
}
