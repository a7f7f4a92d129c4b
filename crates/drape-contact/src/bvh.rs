//! Bounding volume hierarchy broad phase.
//!
//! Builds a binary tree of boxes over the triangles and over the edges,
//! then queries every vertex box against the triangle tree and every edge
//! box against the edge tree. Nodes split at the median centroid along
//! the longest axis; leaves hold at most [`MAX_LEAF_SIZE`] primitives.

use drape_mesh::Mesh;

use crate::aabb::{Aabb, PrimitiveBounds};
use crate::broad::{accept_edge_edge, accept_vertex_triangle, BroadPhase, CandidateSet};

/// Maximum primitives per leaf.
pub const MAX_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { start: usize, count: usize },
    Internal { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// A static BVH over a set of boxes, stored as a flat node array.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    /// Primitive indices, permuted so each leaf owns a contiguous range.
    order: Vec<usize>,
}

impl Bvh {
    /// Builds a BVH over `boxes`. Primitive ids are the box indices.
    pub fn build(boxes: &[Aabb]) -> Self {
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * boxes.len() / MAX_LEAF_SIZE + 1),
            order: (0..boxes.len()).collect(),
        };
        if !boxes.is_empty() {
            bvh.build_recursive(boxes, 0, boxes.len());
        }
        bvh
    }

    fn build_recursive(&mut self, boxes: &[Aabb], start: usize, end: usize) -> usize {
        let slice = &mut self.order[start..end];
        let bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.union(&boxes[i]));

        let node_index = self.nodes.len();
        let count = end - start;
        if count <= MAX_LEAF_SIZE {
            self.nodes.push(Node {
                bounds,
                kind: NodeKind::Leaf { start, count },
            });
            return node_index;
        }

        // Split at the median centroid along the longest centroid axis.
        let centroid_bounds = slice
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.union_point(boxes[i].center()));
        let axis = centroid_bounds.longest_axis();
        let mid = count / 2;
        slice.select_nth_unstable_by(mid, |&a, &b| {
            boxes[a].center()[axis]
                .total_cmp(&boxes[b].center()[axis])
                .then(a.cmp(&b))
        });

        // Placeholder; children are filled in after recursion.
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf { start, count: 0 },
        });
        let left = self.build_recursive(boxes, start, start + mid);
        let right = self.build_recursive(boxes, start + mid, end);
        self.nodes[node_index].kind = NodeKind::Internal { left, right };
        node_index
    }

    /// Calls `visit` with every primitive whose subtree box overlaps `query`.
    ///
    /// Leaf primitives are reported without an individual box test; callers
    /// confirm overlap themselves.
    pub fn query<F: FnMut(usize)>(&self, query: &Aabb, mut visit: F) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.intersects(query) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for &prim in &self.order[start..start + count] {
                        visit(prim);
                    }
                }
                NodeKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// BVH broad phase (rebuilt on every query).
#[derive(Debug, Clone, Default)]
pub struct BvhBroadPhase;

impl BvhBroadPhase {
    /// Creates a new BVH broad phase.
    pub fn new() -> Self {
        Self
    }
}

impl BroadPhase for BvhBroadPhase {
    fn find_candidates(&self, mesh: &Mesh, bounds: &PrimitiveBounds) -> CandidateSet {
        let mut set = CandidateSet::default();

        let tri_tree = Bvh::build(&bounds.triangles);
        for (vertex, vbox) in bounds.vertices.iter().enumerate() {
            tri_tree.query(vbox, |triangle| {
                if accept_vertex_triangle(mesh, bounds, vertex, triangle) {
                    set.vertex_triangle.push((vertex, triangle));
                }
            });
        }

        let edge_tree = Bvh::build(&bounds.edges);
        for (edge_a, ebox) in bounds.edges.iter().enumerate() {
            edge_tree.query(ebox, |edge_b| {
                if accept_edge_edge(mesh, bounds, edge_a, edge_b) {
                    set.edge_edge.push((edge_a, edge_b));
                }
            });
        }

        set.normalize();
        set
    }

    fn name(&self) -> &str {
        "bvh"
    }
}
