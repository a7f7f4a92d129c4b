//! Cubic contact barrier.
//!
//! For activation gap `ḡ > 0` and gap `g < ḡ`:
//!
//! ```text
//! V(g)   =  k/(2ḡ) · (ḡ − g)³
//! V'(g)  = −3k/(2ḡ) · (ḡ − g)²
//! V''(g) =  3k/ḡ · (ḡ − g)
//! ```
//!
//! All three vanish at `g = ḡ`, so contacts switch on with C² continuity.
//! The polynomial keeps growing for `g < 0`.

use drape_contact::Contact;
use drape_math::spd::outer;
use drape_math::{Mat3, Vec3};

/// Cubic barrier with stiffness `k` and activation gap `ḡ`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierPotential {
    /// Barrier stiffness `k`.
    pub stiffness: f64,
    /// Activation gap `ḡ`.
    pub gap_max: f64,
}

impl BarrierPotential {
    /// Creates a barrier.
    pub fn new(stiffness: f64, gap_max: f64) -> Self {
        Self { stiffness, gap_max }
    }

    #[inline]
    fn active(&self, gap: f64) -> bool {
        self.gap_max > 0.0 && gap < self.gap_max
    }

    /// Barrier energy `V(g)`.
    pub fn energy(&self, gap: f64) -> f64 {
        if !self.active(gap) {
            return 0.0;
        }
        let d = self.gap_max - gap;
        self.stiffness / (2.0 * self.gap_max) * d * d * d
    }

    /// First derivative `V'(g)` (non-positive).
    pub fn derivative(&self, gap: f64) -> f64 {
        if !self.active(gap) {
            return 0.0;
        }
        let d = self.gap_max - gap;
        -1.5 * self.stiffness / self.gap_max * d * d
    }

    /// Second derivative `V''(g)` (non-negative).
    pub fn second_derivative(&self, gap: f64) -> f64 {
        if !self.active(gap) {
            return 0.0;
        }
        3.0 * self.stiffness / self.gap_max * (self.gap_max - gap)
    }

    /// Per-vertex gradient `V'(g) wᵢ n` over the contact's stencil.
    pub fn contact_gradient(&self, contact: &Contact) -> Vec<(usize, Vec3)> {
        let force = contact.normal * self.derivative(contact.gap);
        contact.stencil.iter().map(|(v, w)| (v, force * w)).collect()
    }

    /// Gauss–Newton Hessian blocks `V''(g) wᵢ wⱼ nnᵀ` over the stencil.
    pub fn contact_hessian(&self, contact: &Contact) -> Vec<(usize, usize, Mat3)> {
        let curvature = self.second_derivative(contact.gap);
        if curvature <= 0.0 {
            return Vec::new();
        }
        let nn = outer(contact.normal, contact.normal) * curvature;
        let mut blocks = Vec::with_capacity(contact.stencil.len * contact.stencil.len);
        for (vi, wi) in contact.stencil.iter() {
            for (vj, wj) in contact.stencil.iter() {
                blocks.push((vi, vj, nn * (wi * wj)));
            }
        }
        blocks
    }
}
