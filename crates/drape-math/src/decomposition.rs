//! Matrix decompositions for shell constitutive models.
//!
//! Provides polar decomposition (F = R·S) needed by the co-rotational
//! membrane, principal stretches for strain limiting, and the rest-frame
//! edge matrix that defines the deformation gradient of a triangle.

use glam::{DMat2, DVec2, DVec3};

use crate::mat3x2::Mat3x2;

/// Singular values below this are treated as a collapsed direction.
const SINGULAR_EPSILON: f64 = 1.0e-12;

/// Result of a 3×2 polar decomposition: F = R · S
///
/// - `R` is a 3×2 matrix with orthonormal columns
/// - `S` is a 2×2 symmetric positive semi-definite stretch tensor
#[derive(Debug, Clone, Copy)]
pub struct PolarDecomposition {
    /// Rotation part (3×2, orthonormal columns).
    pub rotation: Mat3x2,
    /// Stretch part (2×2 symmetric).
    pub stretch: DMat2,
}

/// Eigen-decomposition of the 2×2 symmetric matrix C = Fᵀ F.
///
/// Returns `(λ_max, λ_min, v_max, v_min)` with unit eigenvectors.
fn eigen_ftf(f: &Mat3x2) -> (f64, f64, DVec2, DVec2) {
    let c = f.ftf();
    let a = c.x_axis.x;
    let b = c.x_axis.y;
    let d = c.y_axis.y;

    // λ = (a+d)/2 ± sqrt(((a-d)/2)^2 + b^2)
    let half_trace = 0.5 * (a + d);
    let half_diff = 0.5 * (a - d);
    let disc = (half_diff * half_diff + b * b).sqrt();

    let lambda0 = (half_trace + disc).max(0.0);
    let lambda1 = (half_trace - disc).max(0.0);

    let scale = a.abs().max(d.abs()).max(1.0);
    let (v0, v1) = if b.abs() > SINGULAR_EPSILON * scale {
        let v0 = DVec2::new(lambda0 - d, b).normalize();
        (v0, DVec2::new(-v0.y, v0.x))
    } else if a >= d {
        (DVec2::X, DVec2::Y)
    } else {
        (DVec2::Y, DVec2::X)
    };

    (lambda0, lambda1, v0, v1)
}

/// Compute the polar decomposition of a 3×2 deformation gradient.
///
/// Uses the SVD-based approach for robustness:
/// 1. Eigendecompose C = Fᵀ F = V Σ² Vᵀ
/// 2. U columns: uᵢ = F vᵢ / σᵢ
/// 3. R = U Vᵀ, S = V Σ Vᵀ
///
/// A collapsed direction (σ_min ≈ 0) is completed with a unit vector
/// orthogonal to the surviving column, so `R` always has orthonormal
/// columns. A fully collapsed F returns the identity embedding.
pub fn polar_decomposition_3x2(f: &Mat3x2) -> PolarDecomposition {
    let (lambda0, lambda1, v0, v1) = eigen_ftf(f);
    let s0 = lambda0.sqrt();
    let s1 = lambda1.sqrt();

    if s0 < SINGULAR_EPSILON {
        return PolarDecomposition {
            rotation: Mat3x2::IDENTITY,
            stretch: DMat2::ZERO,
        };
    }

    let u0 = f.mul_vec2(v0) / s0;
    let u1 = if s1 > SINGULAR_EPSILON * s0.max(1.0) {
        let u1 = f.mul_vec2(v1) / s1;
        // Re-orthogonalise against round-off.
        (u1 - u0 * u0.dot(u1)).normalize_or(u0.any_orthonormal_vector())
    } else {
        u0.any_orthonormal_vector()
    };

    // R = u0 v0ᵀ + u1 v1ᵀ
    let rotation = Mat3x2::from_cols(u0 * v0.x + u1 * v1.x, u0 * v0.y + u1 * v1.y);

    // S = V diag(s0, s1) Vᵀ
    let s00 = v0.x * v0.x * s0 + v1.x * v1.x * s1;
    let s01 = v0.x * v0.y * s0 + v1.x * v1.y * s1;
    let s11 = v0.y * v0.y * s0 + v1.y * v1.y * s1;

    PolarDecomposition {
        rotation,
        stretch: DMat2::from_cols(DVec2::new(s00, s01), DVec2::new(s01, s11)),
    }
}

/// Principal stretches `(σ_max, σ_min)` of a 3×2 deformation gradient.
pub fn principal_stretches(f: &Mat3x2) -> (f64, f64) {
    let (lambda0, lambda1, _, _) = eigen_ftf(f);
    (lambda0.sqrt(), lambda1.sqrt())
}

/// `F` with every principal stretch above `max_stretch` clamped to it.
///
/// With `F = U Σ Vᵀ` this is `F · V diag(cᵢ) Vᵀ`, `cᵢ = min(1, max/σᵢ)`;
/// rotation and the stretches already below the bound are unchanged.
pub fn limit_principal_stretch(f: &Mat3x2, max_stretch: f64) -> Mat3x2 {
    let (lambda0, lambda1, v0, v1) = eigen_ftf(f);
    let scale = |lambda: f64| {
        let sigma = lambda.sqrt();
        if sigma > max_stretch && sigma > SINGULAR_EPSILON {
            max_stretch / sigma
        } else {
            1.0
        }
    };
    let (c0, c1) = (scale(lambda0), scale(lambda1));
    if c0 == 1.0 && c1 == 1.0 {
        return *f;
    }
    let m00 = v0.x * v0.x * c0 + v1.x * v1.x * c1;
    let m01 = v0.x * v0.y * c0 + v1.x * v1.y * c1;
    let m11 = v0.y * v0.y * c0 + v1.y * v1.y * c1;
    f.mul_mat2(DMat2::from_cols(DVec2::new(m00, m01), DVec2::new(m01, m11)))
}

/// Compute the deformation gradient F for a triangle.
///
/// Given three 3D vertex positions and the precomputed inverse of the
/// rest-state edge matrix `Dm⁻¹` (2×2), returns the 3×2 gradient
/// F = Ds · Dm⁻¹ with Ds = [p1 − p0, p2 − p0].
pub fn deformation_gradient(p0: DVec3, p1: DVec3, p2: DVec3, dm_inv: DMat2) -> Mat3x2 {
    let ds = Mat3x2::from_cols(p1 - p0, p2 - p0);
    ds.mul_mat2(dm_inv)
}

/// Inverse of the rest edge matrix expressed in the triangle's own frame.
///
/// The frame has its first axis along `e1 = p1 − p0` and its second axis
/// in the triangle plane, so `Dm = [[|e1|, e2·u], [0, e2·v]]`.
/// Returns `None` for degenerate (zero-area) triangles.
pub fn rest_edge_matrix_inverse(e1: DVec3, e2: DVec3) -> Option<DMat2> {
    let len_e1 = e1.length();
    if len_e1 < SINGULAR_EPSILON {
        return None;
    }
    let u = e1 / len_e1;
    let n = e1.cross(e2);
    if n.length() < SINGULAR_EPSILON * len_e1.max(1.0) {
        return None;
    }
    let v = n.cross(u).normalize();

    let dm = DMat2::from_cols(DVec2::new(len_e1, 0.0), DVec2::new(e2.dot(u), e2.dot(v)));
    let det = dm.determinant();
    if det.abs() < SINGULAR_EPSILON * SINGULAR_EPSILON {
        return None;
    }
    Some(dm.inverse())
}

/// Per-vertex shape-function gradients of a linear triangle.
///
/// Returns `[a0, a1, a2]` with F = Σᵢ xᵢ aᵢᵀ, i.e. `a1` and `a2` are the rows
/// of `Dm⁻¹` and `a0 = −(a1 + a2)`.
pub fn shape_gradients(dm_inv: DMat2) -> [DVec2; 3] {
    let a1 = DVec2::new(dm_inv.x_axis.x, dm_inv.y_axis.x);
    let a2 = DVec2::new(dm_inv.x_axis.y, dm_inv.y_axis.y);
    [-(a1 + a2), a1, a2]
}
