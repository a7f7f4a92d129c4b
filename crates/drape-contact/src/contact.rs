//! Contact data types.
//!
//! A [`Contact`] is a detected proximity between two primitives (or a
//! vertex and a wall). Contacts are regenerated from positions on every
//! query; the [`ContactKey`] identifies the same primitive pair across
//! Newton iterations.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use drape_math::Vec3;

/// Which feature of the triangle holds the closest point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriangleRegion {
    /// Interior of the face.
    Face,
    /// Edge starting at local vertex `i` (0: ab, 1: bc, 2: ca).
    Edge(u8),
    /// Local vertex 0, 1 or 2.
    Vertex(u8),
}

/// Type of contact and the primitives involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactKind {
    /// Mesh vertex against a mesh triangle.
    PointTriangle {
        vertex: usize,
        triangle: usize,
        face: TriangleRegion,
    },
    /// Two mesh edges (indices into `topology().edges`, `edge_a < edge_b`).
    EdgeEdge { edge_a: usize, edge_b: usize },
    /// Mesh vertex against a static wall.
    Wall { vertex: usize, wall: usize },
}

impl ContactKind {
    /// Sort rank used to break gap ties.
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            ContactKind::PointTriangle { .. } => 0,
            ContactKind::EdgeEdge { .. } => 1,
            ContactKind::Wall { .. } => 2,
        }
    }

    /// Short label for logs and reports.
    pub fn label(&self) -> &'static str {
        match self {
            ContactKind::PointTriangle { .. } => "point_triangle",
            ContactKind::EdgeEdge { .. } => "edge_edge",
            ContactKind::Wall { .. } => "wall",
        }
    }
}

/// Identity of a contact across Newton iterations.
///
/// The closest-point region of a point–triangle contact may change while
/// the pair stays the same, so it is not part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContactKey {
    PointTriangle { vertex: usize, triangle: usize },
    EdgeEdge { edge_a: usize, edge_b: usize },
    Wall { vertex: usize, wall: usize },
}

/// Vertex indices and weights such that `gap ≈ n · Σ wᵢ xᵢ (+ const)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stencil {
    /// Vertex indices (only the first `len` are used).
    pub vertices: [usize; 4],
    /// Weights parallel to `vertices`.
    pub weights: [f64; 4],
    /// Number of active entries (1 for walls, 4 otherwise).
    pub len: usize,
}

impl Stencil {
    /// Single-vertex stencil with weight 1.
    pub fn single(vertex: usize) -> Self {
        Self {
            vertices: [vertex, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
            len: 1,
        }
    }

    /// Four-vertex stencil.
    pub fn quad(vertices: [usize; 4], weights: [f64; 4]) -> Self {
        Self {
            vertices,
            weights,
            len: 4,
        }
    }

    /// Iterates over `(vertex, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.vertices[..self.len]
            .iter()
            .copied()
            .zip(self.weights[..self.len].iter().copied())
    }

    /// Weighted combination `Σ wᵢ vᵢ` of a per-vertex field.
    pub fn combine(&self, field: &[Vec3]) -> Vec3 {
        self.iter()
            .fold(Vec3::ZERO, |acc, (v, w)| acc + field[v] * w)
    }

    /// Sum of squared weights `Σ wᵢ²`.
    pub fn weight_norm_sq(&self) -> f64 {
        self.weights[..self.len].iter().map(|w| w * w).sum()
    }
}

/// A detected contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Contact type and primitives.
    pub kind: ContactKind,
    /// Closest point on the second primitive (triangle, edge B or wall).
    pub witness: Vec3,
    /// Unit normal pointing from the second primitive towards the first.
    pub normal: Vec3,
    /// Signed gap. Mesh–mesh gaps are distances (≥ 0); wall gaps may be negative.
    pub gap: f64,
    /// Barycentric stencil.
    pub stencil: Stencil,
}

impl Contact {
    /// Identity of this contact across Newton iterations.
    pub fn key(&self) -> ContactKey {
        match self.kind {
            ContactKind::PointTriangle {
                vertex, triangle, ..
            } => ContactKey::PointTriangle { vertex, triangle },
            ContactKind::EdgeEdge { edge_a, edge_b } => ContactKey::EdgeEdge { edge_a, edge_b },
            ContactKind::Wall { vertex, wall } => ContactKey::Wall { vertex, wall },
        }
    }

    /// Penetration depth (positive if penetrating, zero otherwise).
    pub fn penetration_depth(&self) -> f64 {
        (-self.gap).max(0.0)
    }

    /// Returns true if the contact represents actual penetration.
    pub fn is_penetrating(&self) -> bool {
        self.gap < 0.0
    }

    /// Relative velocity `Σ wᵢ vᵢ` of the stencil.
    pub fn relative_velocity(&self, velocities: &[Vec3]) -> Vec3 {
        self.stencil.combine(velocities)
    }

    /// Normal component of the relative velocity (negative when approaching).
    pub fn normal_velocity(&self, velocities: &[Vec3]) -> f64 {
        self.normal.dot(self.relative_velocity(velocities))
    }
}

/// Deterministic contact order: ascending gap, then kind, then indices.
pub fn contact_order(a: &Contact, b: &Contact) -> Ordering {
    a.gap
        .total_cmp(&b.gap)
        .then_with(|| a.kind.rank().cmp(&b.kind.rank()))
        .then_with(|| a.key().cmp(&b.key()))
}
