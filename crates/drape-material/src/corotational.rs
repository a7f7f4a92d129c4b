//! Co-rotational (ARAP) membrane model.
//!
//! Performs polar decomposition F = R·S on the deformation gradient and
//! penalises the distance of F from its rotation. This handles large
//! rotations (folds, drapes) correctly: strain is measured in the
//! element's rotated frame rather than the world frame.
//!
//! Energy: E = w · ||F - R||²_F

use drape_math::decomposition::polar_decomposition_3x2;
use drape_math::mat3x2::Mat3x2;
use drape_math::{Mat3, Vec2, Vec3};

use crate::traits::{ElementResponse, MembraneModel};

/// Co-rotational FEM membrane model.
///
/// The gradient with respect to vertex j is `2w (F − R) aⱼ`. The Hessian is
/// the Gauss–Newton approximation obtained by holding R fixed,
/// `2w (aⱼ·aₗ) I`, which is positive semi-definite for any F.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoRotationalModel;

impl CoRotationalModel {
    /// Creates a new co-rotational model.
    pub fn new() -> Self {
        Self
    }
}

impl MembraneModel for CoRotationalModel {
    fn energy(&self, deformation_gradient: &Mat3x2, weight: f64) -> f64 {
        let polar = polar_decomposition_3x2(deformation_gradient);
        let diff = *deformation_gradient - polar.rotation;
        weight * diff.frobenius_norm_sq()
    }

    fn evaluate(
        &self,
        deformation_gradient: &Mat3x2,
        shape_gradients: &[Vec2; 3],
        weight: f64,
    ) -> ElementResponse {
        if weight <= 0.0 {
            return ElementResponse::ZERO;
        }

        let polar = polar_decomposition_3x2(deformation_gradient);
        let diff = *deformation_gradient - polar.rotation;
        let energy = weight * diff.frobenius_norm_sq();

        let mut gradient = [Vec3::ZERO; 3];
        for (g, a) in gradient.iter_mut().zip(shape_gradients) {
            *g = diff.mul_vec2(*a) * (2.0 * weight);
        }

        let mut hessian = [[Mat3::ZERO; 3]; 3];
        for j in 0..3 {
            for l in 0..3 {
                let c = 2.0 * weight * shape_gradients[j].dot(shape_gradients[l]);
                hessian[j][l] = Mat3::from_diagonal(Vec3::splat(c));
            }
        }

        ElementResponse {
            energy,
            gradient,
            hessian,
        }
    }

    fn name(&self) -> &str {
        "co_rotational"
    }
}
