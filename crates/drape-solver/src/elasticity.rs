//! Elastic energy of the shell: membrane triangles plus bending hinges.
//!
//! Per-element rest data is precomputed from the mesh once per step so that
//! material hot-reloads take effect at the next step. Evaluation runs in
//! parallel over elements (rayon); element contributions are then scattered
//! sequentially in element order, which keeps the assembled gradient and
//! Hessian bit-identical across runs.

use rayon::prelude::*;

use drape_material::{CoRotationalModel, MembraneModel};
use drape_math::decomposition::{deformation_gradient, shape_gradients};
use drape_math::{Mat2, Mat3, Vec2, Vec3};
use drape_mesh::Mesh;

use crate::bending::{build_bending_elements, BendingElement};

/// Rest data of one membrane triangle.
#[derive(Debug, Clone, Copy)]
pub struct MembraneElement {
    /// Triangle vertex indices.
    pub indices: [usize; 3],
    /// Inverse rest edge matrix in the triangle's own frame.
    pub dm_inv: Mat2,
    /// Shape-function gradients `[a0, a1, a2]`.
    pub shape_gradients: [Vec2; 3],
    /// Stiffness weight `area · thickness · μ`.
    pub weight: f64,
}

/// Assembled elastic response at one configuration.
#[derive(Debug, Clone)]
pub struct ElasticResponse {
    /// Membrane + bending energy.
    pub energy: f64,
    /// Per-vertex gradient.
    pub gradient: Vec<Vec3>,
    /// Gauss–Newton Hessian as `(row, col, block)` triplets.
    pub hessian: Vec<(usize, usize, Mat3)>,
    /// Per-vertex diagonal blocks of the Hessian.
    pub diagonal: Vec<Mat3>,
}

/// Membrane and bending elements of a mesh.
pub struct Elasticity {
    membrane: Vec<MembraneElement>,
    bending: Vec<BendingElement>,
    model: Box<dyn MembraneModel>,
    num_vertices: usize,
}

impl Elasticity {
    /// Builds elements with the co-rotational membrane model.
    pub fn new(mesh: &Mesh) -> Self {
        Self::with_model(mesh, Box::new(CoRotationalModel::new()))
    }

    /// Builds elements with a custom membrane model.
    ///
    /// Degenerate triangles produce no membrane element.
    pub fn with_model(mesh: &Mesh, model: Box<dyn MembraneModel>) -> Self {
        let material = mesh.material();
        let membrane = mesh
            .triangles()
            .iter()
            .zip(mesh.triangle_rest())
            .filter(|(_, rest)| !rest.is_degenerate())
            .map(|(&indices, rest)| MembraneElement {
                indices,
                dm_inv: rest.dm_inv,
                shape_gradients: shape_gradients(rest.dm_inv),
                weight: material.membrane_weight(rest.area),
            })
            .collect();

        Self {
            membrane,
            bending: build_bending_elements(mesh),
            model,
            num_vertices: mesh.num_vertices(),
        }
    }

    /// Membrane elements.
    pub fn membrane_elements(&self) -> &[MembraneElement] {
        &self.membrane
    }

    /// Bending elements.
    pub fn bending_elements(&self) -> &[BendingElement] {
        &self.bending
    }

    /// Name of the membrane model.
    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Membrane energy at `positions`.
    pub fn membrane_energy(&self, positions: &[Vec3]) -> f64 {
        let model = self.model.as_ref();
        self.membrane
            .par_iter()
            .map(|e| {
                let [i0, i1, i2] = e.indices;
                let f = deformation_gradient(positions[i0], positions[i1], positions[i2], e.dm_inv);
                model.energy(&f, e.weight)
            })
            .sum()
    }

    /// Bending energy at `positions`.
    pub fn bending_energy(&self, positions: &[Vec3]) -> f64 {
        self.bending.par_iter().map(|b| b.energy(positions)).sum()
    }

    /// Total elastic energy at `positions`.
    pub fn energy(&self, positions: &[Vec3]) -> f64 {
        self.membrane_energy(positions) + self.bending_energy(positions)
    }

    /// Energy, gradient and PSD Hessian at `positions`.
    pub fn evaluate(&self, positions: &[Vec3]) -> ElasticResponse {
        let model = self.model.as_ref();
        let membrane: Vec<_> = self
            .membrane
            .par_iter()
            .map(|e| {
                let [i0, i1, i2] = e.indices;
                let f = deformation_gradient(positions[i0], positions[i1], positions[i2], e.dm_inv);
                model.evaluate(&f, &e.shape_gradients, e.weight)
            })
            .collect();
        let bending: Vec<_> = self
            .bending
            .par_iter()
            .map(|b| (b.energy(positions), b.gradient(positions)))
            .collect();

        let n = self.num_vertices;
        let mut energy = 0.0;
        let mut gradient = vec![Vec3::ZERO; n];
        let mut diagonal = vec![Mat3::ZERO; n];
        let mut hessian = Vec::with_capacity(9 * self.membrane.len() + 16 * self.bending.len());

        for (element, response) in self.membrane.iter().zip(&membrane) {
            energy += response.energy;
            for (j, &vj) in element.indices.iter().enumerate() {
                gradient[vj] += response.gradient[j];
                diagonal[vj] += response.hessian[j][j];
                for (l, &vl) in element.indices.iter().enumerate() {
                    hessian.push((vj, vl, response.hessian[j][l]));
                }
            }
        }

        for (element, (e, grad)) in self.bending.iter().zip(&bending) {
            energy += e;
            for (i, &vi) in element.vertices.iter().enumerate() {
                gradient[vi] += grad[i];
                diagonal[vi] += element.hessian_block(i, i);
                for (j, &vj) in element.vertices.iter().enumerate() {
                    hessian.push((vi, vj, element.hessian_block(i, j)));
                }
            }
        }

        ElasticResponse {
            energy,
            gradient,
            hessian,
            diagonal,
        }
    }
}
