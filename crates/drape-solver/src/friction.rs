//! Lagged, mollified Coulomb friction.
//!
//! Each friction contact freezes its normal force `λ`, normal `n` and
//! stencil at the start of a Newton iteration. Tangential displacement is
//! `u = (I − nnᵀ) Σ wᵢ (xᵢ − x₀ᵢ)` relative to the step-start positions,
//! and the energy is `μλ f₀(‖u‖)` with the C¹ mollifier
//!
//! ```text
//! f₀(y) = −y³/(3ε²) + y²/ε + ε/3   (y < ε)
//! f₀(y) = y                         (y ≥ ε)
//! ```

use drape_contact::{Contact, Stencil};
use drape_math::spd::outer;
use drape_math::{Mat3, Vec3};

/// Mollified friction energy profile `f₀(y)`.
pub fn f0(y: f64, epsilon: f64) -> f64 {
    if y < epsilon {
        -y * y * y / (3.0 * epsilon * epsilon) + y * y / epsilon + epsilon / 3.0
    } else {
        y
    }
}

/// `f₁(y)/y` where `f₁ = f₀'`; finite at `y = 0`.
pub fn f1_over_y(y: f64, epsilon: f64) -> f64 {
    if y < epsilon {
        2.0 / epsilon - y / (epsilon * epsilon)
    } else {
        1.0 / y
    }
}

/// One lagged friction contact.
#[derive(Debug, Clone, Copy)]
pub struct FrictionContact {
    /// Contact stencil.
    pub stencil: Stencil,
    /// Tangent projector `I − nnᵀ`.
    pub projector: Mat3,
    /// Normal force magnitude `λ = |V'(g)|`.
    pub normal_force: f64,
}

impl FrictionContact {
    /// Freezes a contact with normal force `normal_force`.
    pub fn new(contact: &Contact, normal_force: f64) -> Self {
        Self {
            stencil: contact.stencil,
            projector: Mat3::IDENTITY - outer(contact.normal, contact.normal),
            normal_force,
        }
    }

    /// Tangential relative displacement `u`.
    pub fn tangential_displacement(&self, x: &[Vec3], x0: &[Vec3]) -> Vec3 {
        let rel = self
            .stencil
            .iter()
            .fold(Vec3::ZERO, |acc, (v, w)| acc + (x[v] - x0[v]) * w);
        self.projector * rel
    }
}

/// Coulomb friction with coefficient `mu` and mollifier width `epsilon`.
#[derive(Debug, Clone)]
pub struct FrictionModel {
    /// Friction coefficient μ.
    pub mu: f64,
    /// Mollifier width ε.
    pub epsilon: f64,
    contacts: Vec<FrictionContact>,
}

impl FrictionModel {
    /// Creates a model with no contacts.
    pub fn new(mu: f64, epsilon: f64) -> Self {
        Self {
            mu,
            epsilon,
            contacts: Vec::new(),
        }
    }

    /// Replaces the lagged contact set.
    pub fn set_contacts(&mut self, contacts: Vec<FrictionContact>) {
        self.contacts = contacts;
    }

    /// Lagged contacts.
    pub fn contacts(&self) -> &[FrictionContact] {
        &self.contacts
    }

    fn enabled(&self) -> bool {
        self.mu > 0.0 && !self.contacts.is_empty()
    }

    /// Friction energy at `x` relative to the step start `x0`.
    pub fn energy(&self, x: &[Vec3], x0: &[Vec3]) -> f64 {
        if !self.enabled() {
            return 0.0;
        }
        self.contacts
            .iter()
            .map(|c| {
                let y = c.tangential_displacement(x, x0).length();
                self.mu * c.normal_force * f0(y, self.epsilon)
            })
            .sum()
    }

    /// Adds the friction gradient into `gradient`.
    pub fn add_gradient(&self, x: &[Vec3], x0: &[Vec3], gradient: &mut [Vec3]) {
        if !self.enabled() {
            return;
        }
        for c in &self.contacts {
            let u = c.tangential_displacement(x, x0);
            let scale = self.mu * c.normal_force * f1_over_y(u.length(), self.epsilon);
            for (v, w) in c.stencil.iter() {
                gradient[v] += u * (scale * w);
            }
        }
    }

    /// Appends PSD Hessian blocks `μλ (f₁/y) wᵢ wⱼ (I − nnᵀ)`.
    pub fn add_hessian(&self, x: &[Vec3], x0: &[Vec3], hessian: &mut Vec<(usize, usize, Mat3)>) {
        if !self.enabled() {
            return;
        }
        for c in &self.contacts {
            let y = c.tangential_displacement(x, x0).length();
            let block = c.projector * (self.mu * c.normal_force * f1_over_y(y, self.epsilon));
            for (vi, wi) in c.stencil.iter() {
                for (vj, wj) in c.stencil.iter() {
                    hessian.push((vi, vj, block * (wi * wj)));
                }
            }
        }
    }
}
