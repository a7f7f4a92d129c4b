//! Elasticity-inclusive barrier stiffness.
//!
//! ```text
//! k = m/dt² + max(0, nᵀ H n) + m/ĝ²,   ĝ = clamp(g, max(min_gap, ḡ/100), ḡ)
//! ```
//!
//! `m` and `H` are the stencil-weighted lumped mass and elastic Hessian
//! diagonal block. Stiffer materials yield stiffer barriers, and the `m/ĝ²`
//! term lets the barrier take over as the gap closes.

use std::collections::BTreeMap;

use drape_contact::{Contact, ContactKey, Wall};
use drape_math::Mat3;

use crate::barrier::BarrierPotential;

/// Floor of the clamped gap in the takeover term.
const GAP_FLOOR: f64 = 1e-12;

/// The takeover term stops growing once the gap closes below this
/// fraction of `ḡ`, so a vertex that starts inside a wall is not
/// ejected by an unbounded stiffness.
pub const TAKEOVER_FLOOR_FRACTION: f64 = 0.01;

/// Inputs shared by every stiffness evaluation of one Newton iteration.
#[derive(Debug, Clone, Copy)]
pub struct StiffnessContext<'a> {
    /// Lumped vertex masses.
    pub masses: &'a [f64],
    /// Elastic Hessian diagonal block per vertex.
    pub elastic_diagonal: &'a [Mat3],
    /// Timestep.
    pub dt: f64,
    /// Lower bound for the clamped gap.
    pub min_gap: f64,
}

/// Dynamic stiffness of one contact with activation gap `gap_max`.
pub fn contact_stiffness(contact: &Contact, gap_max: f64, ctx: &StiffnessContext<'_>) -> f64 {
    let mut weight_sum = 0.0;
    let mut mass = 0.0;
    let mut hessian = Mat3::ZERO;
    for (v, w) in contact.stencil.iter() {
        let a = w.abs();
        weight_sum += a;
        mass += a * ctx.masses[v];
        hessian += ctx.elastic_diagonal[v] * a;
    }
    if weight_sum <= 0.0 {
        return 0.0;
    }
    mass /= weight_sum;
    hessian *= 1.0 / weight_sum;

    let n = contact.normal;
    let elastic = n.dot(hessian * n).max(0.0);
    let floor = ctx
        .min_gap
        .max(TAKEOVER_FLOOR_FRACTION * gap_max)
        .max(GAP_FLOOR);
    let g_hat = contact.gap.max(floor).min(gap_max.max(floor));

    mass / (ctx.dt * ctx.dt) + elastic + mass / (g_hat * g_hat)
}

/// Activation gap of a contact: the wall's own gap, or `contact_gap_max`
/// for mesh–mesh pairs.
pub fn activation_gap(contact: &Contact, walls: &[Wall], contact_gap_max: f64) -> f64 {
    match contact.key() {
        ContactKey::Wall { wall, .. } => walls.get(wall).map_or(contact_gap_max, |w| w.gap),
        _ => contact_gap_max,
    }
}

/// Stiffness frozen per [`ContactKey`] for one Newton iteration.
#[derive(Debug, Clone, Default)]
pub struct FrozenStiffness {
    values: BTreeMap<ContactKey, f64>,
}

impl FrozenStiffness {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every frozen value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Freezes `stiffness` for `key`.
    pub fn insert(&mut self, key: ContactKey, stiffness: f64) {
        self.values.insert(key, stiffness);
    }

    /// Frozen stiffness for `key`, if known.
    pub fn get(&self, key: &ContactKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    /// Frozen stiffness, or a fresh value for contacts not seen yet.
    pub fn get_or_compute(&self, contact: &Contact, gap_max: f64, ctx: &StiffnessContext<'_>) -> f64 {
        self.get(&contact.key())
            .unwrap_or_else(|| contact_stiffness(contact, gap_max, ctx))
    }

    /// Number of frozen contacts.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is frozen.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Barrier energy of `contacts`, using frozen stiffness where known and
/// fresh stiffness otherwise.
pub fn barrier_energy(
    contacts: &[Contact],
    walls: &[Wall],
    contact_gap_max: f64,
    frozen: &FrozenStiffness,
    ctx: &StiffnessContext<'_>,
) -> f64 {
    contacts
        .iter()
        .map(|c| {
            let gap_max = activation_gap(c, walls, contact_gap_max);
            let k = frozen.get_or_compute(c, gap_max, ctx);
            BarrierPotential::new(k, gap_max).energy(c.gap)
        })
        .sum()
}
