//! Broad phase collision detection trait.
//!
//! Quickly identifies *candidate* primitive pairs using spatial
//! acceleration structures. The narrow phase then refines these
//! candidates into actual contacts.

use serde::{Deserialize, Serialize};

use drape_mesh::Mesh;

use crate::aabb::PrimitiveBounds;
use crate::bvh::BvhBroadPhase;
use crate::spatial_hash::SpatialHashBroadPhase;

/// Candidate pairs from the broad phase, sorted ascending and unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    /// `(vertex, triangle)` pairs; the vertex is never part of the triangle.
    pub vertex_triangle: Vec<(usize, usize)>,
    /// `(edge_a, edge_b)` pairs with `edge_a < edge_b` and no shared vertex.
    pub edge_edge: Vec<(usize, usize)>,
}

impl CandidateSet {
    /// Total number of candidate pairs.
    pub fn len(&self) -> usize {
        self.vertex_triangle.len() + self.edge_edge.len()
    }

    /// Returns true if there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorts and removes duplicates.
    pub fn normalize(&mut self) {
        self.vertex_triangle.sort_unstable();
        self.vertex_triangle.dedup();
        self.edge_edge.sort_unstable();
        self.edge_edge.dedup();
    }
}

/// Trait for broad phase collision detection.
///
/// Implementations use spatial acceleration to quickly cull pairs whose
/// bounding boxes are disjoint. Every reported pair must pass
/// [`accept_vertex_triangle`] / [`accept_edge_edge`] so that all
/// strategies agree exactly.
///
/// # Implementations
/// - [`BvhBroadPhase`] — Bounding volume hierarchy (default)
/// - [`SpatialHashBroadPhase`] — Uniform grid
pub trait BroadPhase: Send + Sync {
    /// Find all candidate pairs whose boxes overlap.
    fn find_candidates(&self, mesh: &Mesh, bounds: &PrimitiveBounds) -> CandidateSet;

    /// Returns the broad phase strategy name.
    fn name(&self) -> &str;
}

/// Selects a broad phase strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadPhaseKind {
    /// Median-split bounding volume hierarchy.
    #[default]
    Bvh,
    /// Uniform spatial hash grid.
    SpatialHash,
}

impl BroadPhaseKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Box<dyn BroadPhase> {
        match self {
            BroadPhaseKind::Bvh => Box::new(BvhBroadPhase::new()),
            BroadPhaseKind::SpatialHash => Box::new(SpatialHashBroadPhase::new()),
        }
    }
}

/// Vertex–triangle pair filter shared by all broad phases.
#[inline]
pub fn accept_vertex_triangle(
    mesh: &Mesh,
    bounds: &PrimitiveBounds,
    vertex: usize,
    triangle: usize,
) -> bool {
    !mesh.triangles()[triangle].contains(&vertex)
        && bounds.vertices[vertex].intersects(&bounds.triangles[triangle])
}

/// Edge–edge pair filter shared by all broad phases.
#[inline]
pub fn accept_edge_edge(mesh: &Mesh, bounds: &PrimitiveBounds, edge_a: usize, edge_b: usize) -> bool {
    edge_a < edge_b
        && !mesh.topology().edges_share_vertex(edge_a, edge_b)
        && bounds.edges[edge_a].intersects(&bounds.edges[edge_b])
}
