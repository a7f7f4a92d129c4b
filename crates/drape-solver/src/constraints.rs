//! Kinematic constraints: vertex pins and static half-space walls.

use std::collections::BTreeMap;

use drape_contact::Wall;
use drape_math::Vec3;
use drape_types::{DrapeError, DrapeResult};

/// Pins and walls applied to a simulation.
///
/// Pinned vertices are removed from the free degrees of freedom and moved
/// onto their targets at the start of every step.
#[derive(Debug, Clone, Default)]
pub struct ConstraintSet {
    pins: BTreeMap<usize, Vec3>,
    walls: Vec<Wall>,
}

impl ConstraintSet {
    /// Creates an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins `vertex` to `target`. Re-adding a pin replaces its target.
    ///
    /// Range checks happen in [`validate`](Self::validate).
    pub fn add_pin(&mut self, vertex: usize, target: Vec3) {
        self.pins.insert(vertex, target);
    }

    /// Removes the pin on `vertex`, returning its target.
    pub fn remove_pin(&mut self, vertex: usize) -> Option<Vec3> {
        self.pins.remove(&vertex)
    }

    /// Adds a wall with the given normal (normalised here), offset and gap.
    ///
    /// Returns the wall's index.
    ///
    /// # Errors
    /// [`DrapeError::InvalidConstraint`] for a zero normal or a non-positive gap.
    pub fn add_wall(&mut self, normal: Vec3, offset: f64, gap: f64) -> DrapeResult<usize> {
        let wall = Wall::new(normal, offset, gap)?;
        self.walls.push(wall);
        Ok(self.walls.len() - 1)
    }

    /// Pins, ordered by vertex index.
    pub fn pins(&self) -> &BTreeMap<usize, Vec3> {
        &self.pins
    }

    /// Walls in insertion order.
    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Target of the pin on `vertex`, if any.
    pub fn pin_target(&self, vertex: usize) -> Option<Vec3> {
        self.pins.get(&vertex).copied()
    }

    /// Whether `vertex` is pinned.
    pub fn is_pinned(&self, vertex: usize) -> bool {
        self.pins.contains_key(&vertex)
    }

    /// Number of pins.
    pub fn num_active_pins(&self) -> usize {
        self.pins.len()
    }

    /// Number of walls.
    pub fn num_walls(&self) -> usize {
        self.walls.len()
    }

    /// Per-vertex pin mask for a mesh with `num_vertices` vertices.
    pub fn pin_mask(&self, num_vertices: usize) -> Vec<bool> {
        let mut mask = vec![false; num_vertices];
        for &v in self.pins.keys() {
            if let Some(slot) = mask.get_mut(v) {
                *slot = true;
            }
        }
        mask
    }

    /// Checks every pin index and target against a mesh of `num_vertices`.
    ///
    /// # Errors
    /// [`DrapeError::InvalidConstraint`] for an out-of-range vertex or a
    /// non-finite target.
    pub fn validate(&self, num_vertices: usize) -> DrapeResult<()> {
        for (&vertex, target) in &self.pins {
            if vertex >= num_vertices {
                return Err(DrapeError::InvalidConstraint(format!(
                    "pin on vertex {vertex} but the mesh has {num_vertices} vertices"
                )));
            }
            if !target.is_finite() {
                return Err(DrapeError::InvalidConstraint(format!(
                    "pin on vertex {vertex} has non-finite target {target}"
                )));
            }
        }
        Ok(())
    }
}
