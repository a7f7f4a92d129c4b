//! # drape-mesh
//!
//! Immutable triangle mesh topology and rest-state geometry.
//!
//! ## Key Types
//!
//! - [`Mesh`] — Rest positions, triangles, per-triangle rest data, edge
//!   topology and the attached material.
//! - [`Topology`] — Adjacency queries (vertex-to-triangle, unique edges,
//!   interior edges with wing vertices).
//! - Procedural generators for scenes and benchmarks (quad grids).

pub mod generators;
pub mod mesh;
pub mod topology;

pub use generators::MeshGeometry;
pub use mesh::{Mesh, TriangleRest};
pub use topology::{InteriorEdge, Topology};
