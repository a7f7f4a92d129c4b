//! # drape-material
//!
//! Shell material parameters, membrane constitutive models and presets.
//!
//! ## Design
//!
//! The [`MembraneModel`] trait defines the interface for computing the
//! in-plane elastic energy, gradient and Hessian of a triangle from its
//! deformation gradient. [`CoRotationalModel`] is the production model.
//!
//! The [`MaterialDatabase`] stores named presets with physically
//! meaningful parameters.

pub mod corotational;
pub mod database;
pub mod properties;
pub mod traits;

pub use corotational::CoRotationalModel;
pub use database::MaterialDatabase;
pub use properties::Material;
pub use traits::{ElementResponse, MembraneModel};
