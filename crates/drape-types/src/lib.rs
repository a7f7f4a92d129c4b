//! # drape-types
//!
//! Shared error types and physical constants
//! for the drape cloth solver.
//!
//! This crate has no domain logic. It defines the vocabulary
//! that all other drape crates share.

pub mod constants;
pub mod error;

pub use error::{DrapeError, DrapeResult};
