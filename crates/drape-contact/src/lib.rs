//! # drape-contact
//!
//! Contact detection for shell simulation.
//!
//! The pipeline is split into three phases:
//! 1. **Broad phase** — Spatial acceleration (BVH / spatial hash) behind
//!    the [`BroadPhase`] trait
//! 2. **Narrow phase** — Exact point–triangle, edge–edge and point–wall
//!    distances producing [`Contact`]s with barycentric stencils
//! 3. **CCD** — Additive conservative advancement bounding the step
//!    fraction of a candidate displacement
//!
//! [`ContactDetector`] ties them together.

pub mod aabb;
pub mod broad;
pub mod bvh;
pub mod ccd;
pub mod contact;
pub mod detector;
pub mod narrow;
pub mod spatial_hash;
pub mod wall;

pub use broad::{BroadPhase, BroadPhaseKind, CandidateSet};
pub use bvh::BvhBroadPhase;
pub use contact::{Contact, ContactKey, ContactKind, Stencil, TriangleRegion};
pub use detector::ContactDetector;
pub use spatial_hash::SpatialHashBroadPhase;
pub use wall::Wall;
