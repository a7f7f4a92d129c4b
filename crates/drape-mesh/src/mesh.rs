//! Immutable triangle mesh with precomputed rest-state data.
//!
//! A [`Mesh`] owns the rest positions, the triangle list, per-triangle rest
//! data (area and the inverse rest edge matrix), the edge topology and the
//! attached [`Material`]. Geometry and topology are fixed once built; only
//! the material can be swapped (hot-reload).

use drape_material::Material;
use drape_math::decomposition::rest_edge_matrix_inverse;
use drape_math::{Mat2, Vec3};
use drape_types::constants::{DEGENERATE_AREA_THRESHOLD, MIN_VERTEX_MASS};
use drape_types::{DrapeError, DrapeResult};

use crate::topology::Topology;

/// Rest-state data of one triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleRest {
    /// Rest area in m². Zero for degenerate triangles.
    pub area: f64,
    /// Inverse rest edge matrix `Dm⁻¹` in the triangle's own frame.
    /// Zero for degenerate triangles.
    pub dm_inv: Mat2,
}

impl TriangleRest {
    /// Degenerate triangles contribute no elasticity.
    pub fn is_degenerate(&self) -> bool {
        self.area <= 0.0
    }
}

/// A triangle mesh with rest geometry, topology and material.
#[derive(Debug, Clone)]
pub struct Mesh {
    rest_positions: Vec<Vec3>,
    triangles: Vec<[usize; 3]>,
    triangle_rest: Vec<TriangleRest>,
    rest_edge_lengths: Vec<f64>,
    topology: Topology,
    material: Material,
}

impl Mesh {
    /// Builds a mesh, validating indices and precomputing rest data.
    ///
    /// # Errors
    /// - [`DrapeError::InvalidMesh`] if there are no vertices, a triangle
    ///   index is out of range, or a triangle repeats a vertex.
    /// - [`DrapeError::InvalidMaterial`] if the material is not admissible.
    pub fn initialize(
        rest_positions: Vec<Vec3>,
        triangles: Vec<[usize; 3]>,
        material: Material,
    ) -> DrapeResult<Self> {
        let n = rest_positions.len();
        if n == 0 {
            return Err(DrapeError::InvalidMesh("mesh has no vertices".into()));
        }
        if let Some(i) = rest_positions.iter().position(|p| !p.is_finite()) {
            return Err(DrapeError::InvalidMesh(format!(
                "vertex {i} has a non-finite rest position"
            )));
        }
        for (t, tri) in triangles.iter().enumerate() {
            if let Some(&idx) = tri.iter().find(|&&idx| idx >= n) {
                return Err(DrapeError::InvalidMesh(format!(
                    "triangle {t} references vertex {idx}, but the mesh has {n} vertices"
                )));
            }
            let [a, b, c] = *tri;
            if a == b || b == c || a == c {
                return Err(DrapeError::InvalidMesh(format!(
                    "triangle {t} has repeated vertex indices: [{a}, {b}, {c}]"
                )));
            }
        }
        material.validate()?;

        let triangle_rest = triangles
            .iter()
            .map(|&[a, b, c]| compute_triangle_rest(rest_positions[a], rest_positions[b], rest_positions[c]))
            .collect();

        let topology = Topology::build(n, &triangles);
        let rest_edge_lengths = topology
            .edges
            .iter()
            .map(|&[a, b]| (rest_positions[b] - rest_positions[a]).length())
            .collect();

        Ok(Self {
            rest_positions,
            triangles,
            triangle_rest,
            rest_edge_lengths,
            topology,
            material,
        })
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.rest_positions.len()
    }

    /// Returns the number of triangles.
    #[inline]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Rest positions of all vertices.
    #[inline]
    pub fn rest_positions(&self) -> &[Vec3] {
        &self.rest_positions
    }

    /// Triangle index triples.
    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Rest data of every triangle, parallel to [`triangles`](Self::triangles).
    #[inline]
    pub fn triangle_rest(&self) -> &[TriangleRest] {
        &self.triangle_rest
    }

    /// Rest length of every edge, parallel to `topology().edges`.
    #[inline]
    pub fn rest_edge_lengths(&self) -> &[f64] {
        &self.rest_edge_lengths
    }

    /// Edge and adjacency topology.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The attached material.
    #[inline]
    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Replaces the material (hot-reload).
    ///
    /// Topology and rest geometry are untouched. Callers holding a
    /// simulation state must re-derive vertex masses afterwards.
    pub fn set_material(&mut self, material: Material) -> DrapeResult<()> {
        material.validate()?;
        self.material = material;
        Ok(())
    }

    /// Shortest rest edge length, or 0 if the mesh has no edges.
    pub fn min_rest_edge_length(&self) -> f64 {
        self.rest_edge_lengths
            .iter()
            .copied()
            .reduce(f64::min)
            .unwrap_or(0.0)
    }

    /// Total rest area of all triangles.
    pub fn total_area(&self) -> f64 {
        self.triangle_rest.iter().map(|r| r.area).sum()
    }

    /// Lumped vertex masses, `ρ·thickness·area/3` per incident triangle.
    ///
    /// Vertices that receive no mass (isolated or only touching degenerate
    /// triangles) get the smallest positive mass of the mesh, or
    /// `MIN_VERTEX_MASS` if every vertex is massless.
    pub fn lumped_masses(&self) -> Vec<f64> {
        let areal_density = self.material.areal_density();
        let mut masses = vec![0.0; self.num_vertices()];
        for (tri, rest) in self.triangles.iter().zip(&self.triangle_rest) {
            let share = areal_density * rest.area / 3.0;
            for &v in tri {
                masses[v] += share;
            }
        }

        let fallback = masses
            .iter()
            .copied()
            .filter(|&m| m > 0.0)
            .reduce(f64::min)
            .unwrap_or(MIN_VERTEX_MASS);
        for m in &mut masses {
            if *m <= 0.0 {
                *m = fallback;
            }
        }
        masses
    }
}

/// Rest area and inverse edge matrix of one triangle.
fn compute_triangle_rest(p0: Vec3, p1: Vec3, p2: Vec3) -> TriangleRest {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let area = 0.5 * e1.cross(e2).length();
    if area <= DEGENERATE_AREA_THRESHOLD {
        return TriangleRest {
            area: 0.0,
            dm_inv: Mat2::ZERO,
        };
    }
    match rest_edge_matrix_inverse(e1, e2) {
        Some(dm_inv) => TriangleRest { area, dm_inv },
        None => TriangleRest {
            area: 0.0,
            dm_inv: Mat2::ZERO,
        },
    }
}
