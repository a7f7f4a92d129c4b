//! Membrane model trait, the in-plane constitutive abstraction.
//!
//! Every membrane model implements this trait, enabling the elasticity
//! assembly to swap material strategies without changing its loop.

use drape_math::mat3x2::Mat3x2;
use drape_math::{Mat3, Vec2, Vec3};

/// Energy, gradient and Hessian of one triangle element.
///
/// `gradient[j]` is ∂E/∂xⱼ and `hessian[j][l]` the 3×3 block ∂²E/∂xⱼ∂xₗ
/// for the triangle's local vertex order.
#[derive(Debug, Clone, Copy)]
pub struct ElementResponse {
    /// Elastic energy of this element at the current deformation.
    pub energy: f64,
    /// Per-vertex gradient.
    pub gradient: [Vec3; 3],
    /// Symmetric positive semi-definite Hessian blocks.
    pub hessian: [[Mat3; 3]; 3],
}

impl ElementResponse {
    /// Zero response (degenerate or disabled element).
    pub const ZERO: Self = Self {
        energy: 0.0,
        gradient: [Vec3::ZERO; 3],
        hessian: [[Mat3::ZERO; 3]; 3],
    };
}

/// Trait for membrane constitutive models.
///
/// Implementations define how a triangle element responds to in-plane
/// deformation, given the deformation gradient F = Ds · Dm⁻¹ and the
/// shape-function gradients `aⱼ` (F = Σ xⱼ aⱼᵀ).
pub trait MembraneModel: Send + Sync {
    /// Elastic energy only (used by line-search trials).
    ///
    /// # Arguments
    /// - `deformation_gradient` — The 3×2 deformation gradient
    /// - `weight` — Stiffness weight of the element (area · thickness · μ)
    fn energy(&self, deformation_gradient: &Mat3x2, weight: f64) -> f64;

    /// Energy, gradient and Gauss–Newton Hessian of one element.
    ///
    /// # Arguments
    /// - `deformation_gradient` — The 3×2 deformation gradient
    /// - `shape_gradients` — `[a0, a1, a2]` from the rest edge matrix
    /// - `weight` — Stiffness weight of the element
    fn evaluate(
        &self,
        deformation_gradient: &Mat3x2,
        shape_gradients: &[Vec2; 3],
        weight: f64,
    ) -> ElementResponse;

    /// Returns the name of this membrane model.
    fn name(&self) -> &str;
}
