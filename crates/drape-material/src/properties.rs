//! Physical shell material parameters.
//!
//! A [`Material`] describes a homogeneous, isotropic thin shell. Membrane
//! response is derived from Young's modulus and Poisson's ratio through
//! the Lamé parameters; bending is an independent scalar stiffness.

use serde::{Deserialize, Serialize};

use drape_types::{DrapeError, DrapeResult};

/// Physical properties of a shell material.
///
/// | Field | Unit | Role |
/// |---|---|---|
/// | `youngs_modulus` | Pa | membrane stiffness |
/// | `poisson_ratio` | – | lateral contraction, must lie in (−1, 0.5) |
/// | `density` | kg/m³ | volumetric density, lumped into vertex mass |
/// | `thickness` | m | shell thickness |
/// | `bending_stiffness` | N·m | dihedral bending weight (0 disables bending) |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Young's modulus E in Pascals.
    pub youngs_modulus: f64,
    /// Poisson's ratio ν.
    pub poisson_ratio: f64,
    /// Volumetric density ρ in kg/m³.
    pub density: f64,
    /// Shell thickness in meters.
    pub thickness: f64,
    /// Bending stiffness. Zero disables the bending term.
    pub bending_stiffness: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            youngs_modulus: 1.0e6,
            poisson_ratio: 0.3,
            density: 1000.0,
            thickness: 1.0e-3,
            bending_stiffness: 0.0,
        }
    }
}

impl Material {
    /// Creates a material with the given membrane parameters and no bending.
    pub fn new(youngs_modulus: f64, poisson_ratio: f64, density: f64, thickness: f64) -> Self {
        Self {
            youngs_modulus,
            poisson_ratio,
            density,
            thickness,
            bending_stiffness: 0.0,
        }
    }

    /// Returns a copy with the given bending stiffness.
    pub fn with_bending(mut self, bending_stiffness: f64) -> Self {
        self.bending_stiffness = bending_stiffness;
        self
    }

    /// Checks physical admissibility.
    ///
    /// # Errors
    /// [`DrapeError::InvalidMaterial`] if E, ρ or thickness is not positive
    /// and finite, ν is outside (−1, 0.5), or bending stiffness is negative.
    pub fn validate(&self) -> DrapeResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(DrapeError::InvalidMaterial(format!(
                    "{name} must be positive and finite, got {v}"
                )))
            }
        };
        positive("youngs_modulus", self.youngs_modulus)?;
        positive("density", self.density)?;
        positive("thickness", self.thickness)?;

        let nu = self.poisson_ratio;
        if !(nu.is_finite() && nu > -1.0 && nu < 0.5) {
            return Err(DrapeError::InvalidMaterial(format!(
                "poisson_ratio must lie in (-1, 0.5), got {nu}"
            )));
        }
        if !(self.bending_stiffness.is_finite() && self.bending_stiffness >= 0.0) {
            return Err(DrapeError::InvalidMaterial(format!(
                "bending_stiffness must be non-negative, got {}",
                self.bending_stiffness
            )));
        }
        Ok(())
    }

    /// Shear modulus μ = E / (2(1 + ν)).
    pub fn shear_modulus(&self) -> f64 {
        self.youngs_modulus / (2.0 * (1.0 + self.poisson_ratio))
    }

    /// First Lamé parameter λ = Eν / ((1 + ν)(1 − 2ν)).
    pub fn lame_lambda(&self) -> f64 {
        let nu = self.poisson_ratio;
        self.youngs_modulus * nu / ((1.0 + nu) * (1.0 - 2.0 * nu))
    }

    /// Lamé pair `(μ, λ)`.
    pub fn lame_parameters(&self) -> (f64, f64) {
        (self.shear_modulus(), self.lame_lambda())
    }

    /// Mass per unit area ρ·h in kg/m².
    pub fn areal_density(&self) -> f64 {
        self.density * self.thickness
    }

    /// Membrane stiffness weight of a triangle with the given rest area:
    /// `area · thickness · μ`.
    pub fn membrane_weight(&self, rest_area: f64) -> f64 {
        rest_area * self.thickness * self.shear_modulus()
    }
}
