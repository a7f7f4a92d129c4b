//! Material database with named shell presets.
//!
//! The presets span the useful stiffness range of the solver, from soft
//! silk to rubber sheet, with densities and thicknesses of the real
//! materials.

use std::collections::BTreeMap;

use crate::properties::Material;

/// A named collection of material presets.
///
/// Materials are looked up by name (e.g., "cotton", "denim").
/// Custom materials can be registered at runtime.
#[derive(Debug, Clone)]
pub struct MaterialDatabase {
    materials: BTreeMap<String, Material>,
}

impl MaterialDatabase {
    /// Creates a new database with the 5 built-in presets.
    pub fn with_defaults() -> Self {
        let mut db = Self::empty();

        db.register("cotton", cotton());
        db.register("silk", silk());
        db.register("denim", denim());
        db.register("leather", leather());
        db.register("rubber", rubber());

        db
    }

    /// Creates an empty database.
    pub fn empty() -> Self {
        Self {
            materials: BTreeMap::new(),
        }
    }

    /// Registers a material. Overwrites if the name already exists.
    pub fn register(&mut self, name: impl Into<String>, material: Material) {
        self.materials.insert(name.into(), material);
    }

    /// Looks up a material by name. Returns `None` if not found.
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// Returns all registered material names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.materials.keys().map(|s| s.as_str()).collect()
    }

    /// Returns the number of registered materials.
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Returns true if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

impl Default for MaterialDatabase {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ─── Built-in Presets ─────────────────────────────────────────────────

/// Cotton: medium-weight woven fabric, holds defined folds.
fn cotton() -> Material {
    Material::new(5.0e5, 0.3, 1500.0, 5.0e-4).with_bending(1.0e-5)
}

/// Silk: lightweight and flowing, many small folds.
fn silk() -> Material {
    Material::new(2.0e5, 0.3, 1300.0, 2.0e-4).with_bending(1.0e-6)
}

/// Denim: heavy and stiff, sharp creases.
fn denim() -> Material {
    Material::new(2.0e6, 0.3, 1200.0, 1.2e-3).with_bending(1.0e-4)
}

/// Leather: thick and stiff, broad folds.
fn leather() -> Material {
    Material::new(5.0e6, 0.4, 900.0, 1.5e-3).with_bending(5.0e-4)
}

/// Rubber sheet: soft and highly stretchable.
fn rubber() -> Material {
    Material::new(1.0e5, 0.45, 1100.0, 1.0e-3).with_bending(2.0e-5)
}
