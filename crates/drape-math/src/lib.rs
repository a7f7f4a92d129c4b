//! # drape-math
//!
//! Linear algebra primitives for the drape cloth solver.
//!
//! Provides:
//! - Re-exports of the double-precision `glam` types under short names
//!   (`Vec3`, `Mat3`, ...)
//! - 3×2 matrix type for shell deformation gradients
//! - Polar decomposition, principal stretches and rest-frame edge matrices
//! - Symmetric 3×3 eigen-solver and SPD projection of Hessian blocks
//! - 3×3 block-sparse matrices, a block-Jacobi PCG solver and a faer-backed
//!   sparse Cholesky solver behind the [`SparseSolver`](sparse::SparseSolver) trait

pub mod decomposition;
pub mod faer_solver;
pub mod mat3x2;
pub mod pcg;
pub mod sparse;
pub mod spd;

// The solver works in double precision; these are the canonical math types.
pub use glam::{DMat2 as Mat2, DMat3 as Mat3, DVec2 as Vec2, DVec3 as Vec3};

/// Infinity norm of a block vector (largest absolute component).
pub fn max_abs(v: &[Vec3]) -> f64 {
    v.iter()
        .map(|x| x.abs().max_element())
        .fold(0.0, f64::max)
}

/// Dot product of two block vectors.
pub fn dot(a: &[Vec3], b: &[Vec3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x.dot(*y)).sum()
}
