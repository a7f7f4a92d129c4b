//! Mesh topology queries.
//!
//! Builds adjacency data structures from the triangle list, enabling
//! the neighbor queries needed by the solver (vertex-to-triangle, unique
//! edges, interior edges for bending). All lists are in a deterministic
//! sorted order.

use std::collections::BTreeMap;

/// Precomputed topology information for a triangle mesh.
///
/// Built once when a mesh is constructed. Used by:
/// - Bending assembly (interior edges with their wing vertices)
/// - Edge–edge contact candidates and strain limiting (unique edges)
/// - Mass lumping and diagnostics (vertex-to-triangle fan)
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// For each vertex, the triangles that contain it (ascending).
    pub vertex_triangles: Vec<Vec<usize>>,

    /// Unique edges as `[v_min, v_max]`, sorted lexicographically.
    pub edges: Vec<[usize; 2]>,

    /// For each edge, the adjacent triangles (ascending).
    /// Boundary edges have exactly 1 adjacent triangle.
    pub edge_triangles: Vec<Vec<usize>>,

    /// Edges shared by exactly 2 triangles.
    pub interior_edges: Vec<InteriorEdge>,
}

/// An interior (non-boundary) edge with its two adjacent triangles.
///
/// The wing vertices are the vertices of `tri_a` and `tri_b` opposite to
/// the shared edge `(v0, v1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteriorEdge {
    /// Index of the edge in [`Topology::edges`].
    pub edge: usize,
    /// First vertex of the shared edge.
    pub v0: usize,
    /// Second vertex of the shared edge.
    pub v1: usize,
    /// The wing vertex of triangle A.
    pub wing_a: usize,
    /// The wing vertex of triangle B.
    pub wing_b: usize,
    /// Index of adjacent triangle A.
    pub tri_a: usize,
    /// Index of adjacent triangle B.
    pub tri_b: usize,
}

impl Topology {
    /// Build topology for `vertex_count` vertices and the given triangles.
    ///
    /// Triangle indices must already be validated.
    pub fn build(vertex_count: usize, triangles: &[[usize; 3]]) -> Self {
        let mut vertex_triangles: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];
        let mut edge_map: BTreeMap<[usize; 2], Vec<usize>> = BTreeMap::new();

        for (t, &[a, b, c]) in triangles.iter().enumerate() {
            vertex_triangles[a].push(t);
            vertex_triangles[b].push(t);
            vertex_triangles[c].push(t);
            for (v0, v1) in [(a, b), (b, c), (c, a)] {
                let key = if v0 < v1 { [v0, v1] } else { [v1, v0] };
                edge_map.entry(key).or_default().push(t);
            }
        }

        let mut edges = Vec::with_capacity(edge_map.len());
        let mut edge_triangles = Vec::with_capacity(edge_map.len());
        let mut interior_edges = Vec::new();

        for (edge, ([v0, v1], tris)) in edge_map.into_iter().enumerate() {
            if let [tri_a, tri_b] = tris[..] {
                interior_edges.push(InteriorEdge {
                    edge,
                    v0,
                    v1,
                    wing_a: wing_vertex(&triangles[tri_a], v0, v1),
                    wing_b: wing_vertex(&triangles[tri_b], v0, v1),
                    tri_a,
                    tri_b,
                });
            }
            edges.push([v0, v1]);
            edge_triangles.push(tris);
        }

        Self {
            vertex_triangles,
            edges,
            edge_triangles,
            interior_edges,
        }
    }

    /// Returns the number of boundary edges (edges with only 1 adjacent triangle).
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_triangles
            .iter()
            .filter(|tris| tris.len() == 1)
            .count()
    }

    /// Returns true if the mesh is closed (no boundary edges).
    pub fn is_closed(&self) -> bool {
        !self.edges.is_empty() && self.boundary_edge_count() == 0
    }

    /// Returns true if the two edges share a vertex.
    #[inline]
    pub fn edges_share_vertex(&self, a: usize, b: usize) -> bool {
        let [a0, a1] = self.edges[a];
        let [b0, b1] = self.edges[b];
        a0 == b0 || a0 == b1 || a1 == b0 || a1 == b1
    }
}

/// The vertex of `tri` that is not on edge `(v0, v1)`.
fn wing_vertex(tri: &[usize; 3], v0: usize, v1: usize) -> usize {
    tri.iter()
        .copied()
        .find(|&v| v != v0 && v != v1)
        .unwrap_or(tri[0])
}
