//! Contact detection pipeline.
//!
//! 1. **Broad phase**: primitive boxes inflated by the query margin,
//!    candidate pairs from the configured [`BroadPhase`]
//! 2. **Narrow phase**: exact distances evaluated in parallel, keeping
//!    pairs closer than the activation gap
//! 3. **Ordering**: ascending gap, then kind, then indices
//!
//! The same candidate machinery, run on swept boxes, bounds the line-search
//! step with continuous collision detection.

use rayon::prelude::*;
use tracing::trace;

use drape_math::Vec3;
use drape_mesh::Mesh;

use crate::aabb::PrimitiveBounds;
use crate::broad::{BroadPhase, BroadPhaseKind};
use crate::ccd::{edge_edge_toi, point_triangle_toi, point_wall_toi};
use crate::contact::{contact_order, Contact};
use crate::narrow::{edge_edge_contact, point_triangle_contact, wall_contact};
use crate::wall::Wall;

/// Detects contacts and bounds motion for a mesh against itself and walls.
pub struct ContactDetector {
    broad_phase: Box<dyn BroadPhase>,
}

impl ContactDetector {
    /// Creates a detector with the given broad phase strategy.
    pub fn new(kind: BroadPhaseKind) -> Self {
        Self {
            broad_phase: kind.build(),
        }
    }

    /// Creates a detector around a custom broad phase.
    pub fn with_broad_phase(broad_phase: Box<dyn BroadPhase>) -> Self {
        Self { broad_phase }
    }

    /// Name of the broad phase in use.
    pub fn broad_phase_name(&self) -> &str {
        self.broad_phase.name()
    }

    /// All contacts closer than `gap_max` (mesh pairs) or the wall's own gap.
    ///
    /// The result is deterministic: identical inputs produce identical
    /// sequences regardless of thread scheduling or broad phase.
    pub fn compute_contacts(
        &self,
        mesh: &Mesh,
        positions: &[Vec3],
        walls: &[Wall],
        gap_max: f64,
    ) -> Vec<Contact> {
        let mut contacts = if gap_max > 0.0 && mesh.num_triangles() > 0 {
            self.mesh_contacts(mesh, positions, gap_max)
        } else {
            Vec::new()
        };

        for (w, wall) in walls.iter().enumerate() {
            contacts.extend(
                positions
                    .iter()
                    .enumerate()
                    .filter_map(|(v, x)| wall_contact(*x, v, w, wall)),
            );
        }

        contacts.sort_by(contact_order);
        trace!(
            contacts = contacts.len(),
            broad_phase = self.broad_phase.name(),
            "contact detection"
        );
        contacts
    }

    fn mesh_contacts(&self, mesh: &Mesh, positions: &[Vec3], gap_max: f64) -> Vec<Contact> {
        let bounds = PrimitiveBounds::from_positions(mesh, positions, gap_max);
        let candidates = self.broad_phase.find_candidates(mesh, &bounds);
        let triangles = mesh.triangles();
        let edges = &mesh.topology().edges;

        let mut contacts: Vec<Contact> = candidates
            .vertex_triangle
            .par_iter()
            .filter_map(|&(v, t)| point_triangle_contact(positions, v, t, triangles[t], gap_max))
            .collect();

        let edge_contacts: Vec<Contact> = candidates
            .edge_edge
            .par_iter()
            .filter_map(|&(a, b)| edge_edge_contact(positions, a, b, edges[a], edges[b], gap_max))
            .collect();

        contacts.extend(edge_contacts);
        contacts
    }

    /// Largest fraction `t ∈ [0, 1]` of the displacement `d` that can be
    /// taken from `x` without any vertex–triangle, edge–edge or vertex–wall
    /// pair losing more than 90% of its current separation.
    pub fn max_step_fraction(&self, mesh: &Mesh, x: &[Vec3], d: &[Vec3], walls: &[Wall]) -> f64 {
        let mut fraction: f64 = 1.0;

        for wall in walls {
            let wall_min = x
                .par_iter()
                .zip(d.par_iter())
                .map(|(xi, di)| point_wall_toi(*xi, *di, wall))
                .reduce(|| 1.0, f64::min);
            fraction = fraction.min(wall_min);
        }

        if mesh.num_triangles() == 0 {
            return fraction;
        }

        let end: Vec<Vec3> = x.iter().zip(d).map(|(a, b)| *a + *b).collect();
        let bounds = PrimitiveBounds::swept(mesh, x, &end, 0.0);
        let candidates = self.broad_phase.find_candidates(mesh, &bounds);
        let triangles = mesh.triangles();
        let edges = &mesh.topology().edges;

        let vt_min = candidates
            .vertex_triangle
            .par_iter()
            .map(|&(v, t)| {
                let [a, b, c] = triangles[t];
                point_triangle_toi([x[v], x[a], x[b], x[c]], [d[v], d[a], d[b], d[c]])
            })
            .reduce(|| 1.0, f64::min);

        let ee_min = candidates
            .edge_edge
            .par_iter()
            .map(|&(ea, eb)| {
                let [a0, a1] = edges[ea];
                let [b0, b1] = edges[eb];
                edge_edge_toi([x[a0], x[a1], x[b0], x[b1]], [d[a0], d[a1], d[b0], d[b1]])
            })
            .reduce(|| 1.0, f64::min);

        fraction.min(vt_min).min(ee_min).clamp(0.0, 1.0)
    }
}

impl Default for ContactDetector {
    fn default() -> Self {
        Self::new(BroadPhaseKind::default())
    }
}
