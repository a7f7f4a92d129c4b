//! Spatial hash broad phase for uniform-grid collision detection.
//!
//! Partitions space into a uniform grid and bins triangle and edge boxes
//! into every cell they overlap. Candidate pairs are generated by looking
//! up the cells covered by each vertex box (against triangles) and each
//! edge box (against edges).

use std::collections::HashMap;

use drape_mesh::Mesh;

use crate::aabb::{Aabb, PrimitiveBounds};
use crate::broad::{accept_edge_edge, accept_vertex_triangle, BroadPhase, CandidateSet};

type CellKey = (i64, i64, i64);

/// Uniform grid keyed by integer cell coordinates.
#[derive(Debug, Clone)]
pub struct SpatialHash {
    /// Inverse cell size (cached for performance).
    inv_cell_size: f64,
    /// Hash map from cell key to list of primitive indices.
    grid: HashMap<CellKey, Vec<usize>>,
}

impl SpatialHash {
    /// Create a new spatial hash with the given cell size.
    pub fn new(cell_size: f64) -> Self {
        let cell_size = if cell_size.is_finite() {
            cell_size.max(1e-9)
        } else {
            1.0
        };
        Self {
            inv_cell_size: 1.0 / cell_size,
            grid: HashMap::new(),
        }
    }

    /// Hash a coordinate to a cell index.
    #[inline]
    fn cell_coord(&self, x: f64) -> i64 {
        (x * self.inv_cell_size).floor() as i64
    }

    fn cell_range(&self, aabb: &Aabb) -> (CellKey, CellKey) {
        (
            (
                self.cell_coord(aabb.min.x),
                self.cell_coord(aabb.min.y),
                self.cell_coord(aabb.min.z),
            ),
            (
                self.cell_coord(aabb.max.x),
                self.cell_coord(aabb.max.y),
                self.cell_coord(aabb.max.z),
            ),
        )
    }

    /// Insert primitive `id` into every cell overlapped by `aabb`.
    pub fn insert(&mut self, id: usize, aabb: &Aabb) {
        let (lo, hi) = self.cell_range(aabb);
        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                for cz in lo.2..=hi.2 {
                    self.grid.entry((cx, cy, cz)).or_default().push(id);
                }
            }
        }
    }

    /// Calls `visit` with every primitive sharing a cell with `aabb`.
    /// The same primitive may be reported more than once.
    pub fn query<F: FnMut(usize)>(&self, aabb: &Aabb, mut visit: F) {
        let (lo, hi) = self.cell_range(aabb);
        for cx in lo.0..=hi.0 {
            for cy in lo.1..=hi.1 {
                for cz in lo.2..=hi.2 {
                    if let Some(ids) = self.grid.get(&(cx, cy, cz)) {
                        for &id in ids {
                            visit(id);
                        }
                    }
                }
            }
        }
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.grid.len()
    }
}

/// Spatial hash broad phase.
///
/// The cell size adapts to the largest primitive box of each query so
/// that every box spans at most two cells per axis.
#[derive(Debug, Clone, Default)]
pub struct SpatialHashBroadPhase;

impl SpatialHashBroadPhase {
    /// Creates a new spatial hash broad phase.
    pub fn new() -> Self {
        Self
    }
}

impl BroadPhase for SpatialHashBroadPhase {
    fn find_candidates(&self, mesh: &Mesh, bounds: &PrimitiveBounds) -> CandidateSet {
        let mut set = CandidateSet::default();
        let cell_size = bounds.max_extent();

        let mut tri_hash = SpatialHash::new(cell_size);
        for (t, tbox) in bounds.triangles.iter().enumerate() {
            tri_hash.insert(t, tbox);
        }
        for (vertex, vbox) in bounds.vertices.iter().enumerate() {
            tri_hash.query(vbox, |triangle| {
                if accept_vertex_triangle(mesh, bounds, vertex, triangle) {
                    set.vertex_triangle.push((vertex, triangle));
                }
            });
        }

        let mut edge_hash = SpatialHash::new(cell_size);
        for (e, ebox) in bounds.edges.iter().enumerate() {
            edge_hash.insert(e, ebox);
        }
        for (edge_a, ebox) in bounds.edges.iter().enumerate() {
            edge_hash.query(ebox, |edge_b| {
                if accept_edge_edge(mesh, bounds, edge_a, edge_b) {
                    set.edge_edge.push((edge_a, edge_b));
                }
            });
        }

        set.normalize();
        set
    }

    fn name(&self) -> &str {
        "spatial_hash"
    }
}
