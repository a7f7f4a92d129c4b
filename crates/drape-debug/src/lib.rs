//! # drape-debug
//!
//! Binary state snapshots for resuming, replaying and comparing drape
//! simulations.
//!
//! ## Key Types
//!
//! - [`StateSnapshot`] — Positions, velocities and simulation time (bincode)
//! - [`SnapshotSummary`] — Bounding box and speed statistics for inspection

pub mod snapshot;

pub use snapshot::{SnapshotSummary, StateSnapshot};
