//! Axis-aligned bounding boxes for mesh primitives.
//!
//! Both broad phases consume the same [`PrimitiveBounds`], and candidate
//! pairs are confirmed with the same exact box overlap test, so the two
//! strategies report identical candidate sets.

use drape_math::Vec3;
use drape_mesh::Mesh;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// An empty box that any union will replace.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f64::INFINITY),
        max: Vec3::splat(f64::NEG_INFINITY),
    };

    /// Creates a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all the points.
    pub fn from_points(points: &[Vec3]) -> Self {
        points
            .iter()
            .fold(Self::EMPTY, |acc, p| acc.union_point(*p))
    }

    /// Grows the box to contain `p`.
    #[inline]
    pub fn union_point(self, p: Vec3) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Smallest box containing both boxes.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Expands every face outwards by `margin`.
    #[inline]
    pub fn inflated(&self, margin: f64) -> Self {
        Self {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    /// Center point.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths along each axis.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z).
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Returns true if the boxes overlap (touching counts).
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Bounding boxes of every vertex, triangle and edge of a mesh.
#[derive(Debug, Clone)]
pub struct PrimitiveBounds {
    /// One box per vertex.
    pub vertices: Vec<Aabb>,
    /// One box per triangle.
    pub triangles: Vec<Aabb>,
    /// One box per edge, parallel to `mesh.topology().edges`.
    pub edges: Vec<Aabb>,
}

impl PrimitiveBounds {
    /// Boxes of the primitives at `positions`, each inflated by `margin`.
    pub fn from_positions(mesh: &Mesh, positions: &[Vec3], margin: f64) -> Self {
        let vertices: Vec<Aabb> = positions
            .iter()
            .map(|p| Aabb::new(*p, *p).inflated(margin))
            .collect();
        Self::from_vertex_boxes(mesh, vertices)
    }

    /// Boxes swept along the straight-line motion `start → end`.
    pub fn swept(mesh: &Mesh, start: &[Vec3], end: &[Vec3], margin: f64) -> Self {
        let vertices: Vec<Aabb> = start
            .iter()
            .zip(end)
            .map(|(a, b)| Aabb::new(a.min(*b), a.max(*b)).inflated(margin))
            .collect();
        Self::from_vertex_boxes(mesh, vertices)
    }

    fn from_vertex_boxes(mesh: &Mesh, vertices: Vec<Aabb>) -> Self {
        let triangles = mesh
            .triangles()
            .iter()
            .map(|&[a, b, c]| vertices[a].union(&vertices[b]).union(&vertices[c]))
            .collect();
        let edges = mesh
            .topology()
            .edges
            .iter()
            .map(|&[a, b]| vertices[a].union(&vertices[b]))
            .collect();
        Self {
            vertices,
            triangles,
            edges,
        }
    }

    /// Largest box extent over all primitives (0 if there are none).
    pub fn max_extent(&self) -> f64 {
        self.vertices
            .iter()
            .chain(&self.triangles)
            .chain(&self.edges)
            .map(|b| b.size().max_element())
            .filter(|e| e.is_finite())
            .fold(0.0, f64::max)
    }
}
