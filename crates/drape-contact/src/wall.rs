//! Static half-space walls.
//!
//! A wall is the plane `n·x = offset` with the free side along `n`.
//! Vertices closer than the wall's own gap produce wall contacts.

use serde::{Deserialize, Serialize};

use drape_math::Vec3;
use drape_types::{DrapeError, DrapeResult};

/// A static half-space constraint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    /// Unit outward normal.
    pub normal: Vec3,
    /// Plane offset along the normal.
    pub offset: f64,
    /// Barrier activation distance for this wall.
    pub gap: f64,
}

impl Wall {
    /// Creates a wall, normalising `normal`.
    ///
    /// # Errors
    /// [`DrapeError::InvalidConstraint`] if the normal is zero or not
    /// finite, or if `gap` is not positive.
    pub fn new(normal: Vec3, offset: f64, gap: f64) -> DrapeResult<Self> {
        let len = normal.length();
        if !len.is_finite() || len <= 0.0 {
            return Err(DrapeError::InvalidConstraint(format!(
                "wall normal must be non-zero and finite, got {normal}"
            )));
        }
        if !gap.is_finite() || gap <= 0.0 {
            return Err(DrapeError::InvalidConstraint(format!(
                "wall gap must be positive, got {gap}"
            )));
        }
        if !offset.is_finite() {
            return Err(DrapeError::InvalidConstraint(format!(
                "wall offset must be finite, got {offset}"
            )));
        }
        Ok(Self {
            normal: normal / len,
            offset,
            gap,
        })
    }

    /// A horizontal ground plane `z = height`, free side +Z.
    pub fn ground(height: f64, gap: f64) -> DrapeResult<Self> {
        Self::new(Vec3::Z, height, gap)
    }

    /// Signed distance `n·x − offset` (negative means penetration).
    #[inline]
    pub fn signed_distance(&self, x: Vec3) -> f64 {
        self.normal.dot(x) - self.offset
    }

    /// Orthogonal projection of `x` onto the wall plane.
    #[inline]
    pub fn project(&self, x: Vec3) -> Vec3 {
        x - self.normal * self.signed_distance(x)
    }
}
