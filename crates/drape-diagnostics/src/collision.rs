//! Collision-quality analysis of a contact set.
//!
//! Gaps are signed: a negative gap is a penetration whose depth is `−gap`.

use std::fmt;

use serde::{Deserialize, Serialize};

use drape_contact::{Contact, ContactKind};
use drape_mesh::Mesh;
use drape_solver::SimulationState;
use drape_types::constants::{MAJOR_PENETRATION_DEPTH, MINOR_PENETRATION_DEPTH};

/// Penetration deeper than this fraction of `gap_max` counts as tunneling.
const TUNNELING_FRACTION: f64 = 0.1;

/// Coarse collision grade, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    /// No penetrations.
    Excellent,
    /// Penetrations no deeper than 0.1 mm.
    Good,
    /// Penetrations deeper than 0.1 mm.
    Warning,
    /// Tunneling or penetrations deeper than 1 mm.
    Error,
}

impl QualityLevel {
    /// Snake-case label, as serialized.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    /// Human-readable summary.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Excellent => "Excellent - no penetrations",
            Self::Good => "Good - tiny penetrations (< 0.1 mm)",
            Self::Warning => "Warning - minor penetrations detected",
            Self::Error => "Error - major penetrations or tunneling",
        }
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Collision statistics of one contact set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollisionMetrics {
    // ─── Counts ──────────────────────────────────────────────
    pub num_point_triangle: usize,
    pub num_edge_edge: usize,
    pub num_wall: usize,
    pub num_total_contacts: usize,

    // ─── Gaps ────────────────────────────────────────────────
    /// Smallest gap (0 without contacts).
    pub min_gap: f64,
    /// Largest gap (0 without contacts).
    pub max_gap: f64,
    /// Mean gap (0 without contacts).
    pub avg_gap: f64,

    // ─── Penetration ─────────────────────────────────────────
    /// Contacts with a negative gap.
    pub num_penetrations: usize,
    /// Deepest penetration (positive).
    pub max_penetration: f64,
    /// Mean depth over penetrating contacts.
    pub avg_penetration: f64,

    // ─── CCD ─────────────────────────────────────────────────
    pub ccd_enabled: bool,
    /// Percentage of contacts closer than half the activation gap
    /// (0 with CCD off).
    pub ccd_effectiveness: f64,

    // ─── Velocities ──────────────────────────────────────────
    /// Largest `‖Σ wᵢ vᵢ‖` over contacts.
    pub max_relative_velocity: f64,
    /// Mean `‖Σ wᵢ vᵢ‖` over contacts.
    pub avg_relative_velocity: f64,
    /// Largest approach speed `−n·Σ wᵢ vᵢ` (0 if nothing approaches).
    pub max_approach_velocity: f64,

    // ─── Flags ───────────────────────────────────────────────
    /// Some penetration exceeds 10% of `gap_max`.
    pub has_tunneling: bool,
    /// Some penetration exceeds 1 mm.
    pub has_major_penetration: bool,
    /// No penetrations at all.
    pub is_stable: bool,
}

impl CollisionMetrics {
    /// Grade of this contact set.
    pub fn quality_level(&self) -> QualityLevel {
        if self.has_tunneling || self.has_major_penetration {
            QualityLevel::Error
        } else if self.max_penetration > MINOR_PENETRATION_DEPTH {
            QualityLevel::Warning
        } else if self.num_penetrations > 0 {
            QualityLevel::Good
        } else {
            QualityLevel::Excellent
        }
    }

    /// Gap and penetration statistics of `contacts`; velocity fields stay 0.
    pub fn from_contacts(contacts: &[Contact], gap_max: f64, ccd_enabled: bool) -> Self {
        let mut metrics = Self {
            ccd_enabled,
            is_stable: true,
            num_total_contacts: contacts.len(),
            ..Default::default()
        };
        if contacts.is_empty() {
            return metrics;
        }

        metrics.min_gap = f64::INFINITY;
        metrics.max_gap = f64::NEG_INFINITY;
        let mut gap_sum = 0.0;
        let mut depth_sum = 0.0;
        let mut close = 0usize;

        for contact in contacts {
            match contact.kind {
                ContactKind::PointTriangle { .. } => metrics.num_point_triangle += 1,
                ContactKind::EdgeEdge { .. } => metrics.num_edge_edge += 1,
                ContactKind::Wall { .. } => metrics.num_wall += 1,
            }

            let gap = contact.gap;
            metrics.min_gap = metrics.min_gap.min(gap);
            metrics.max_gap = metrics.max_gap.max(gap);
            gap_sum += gap;
            if gap < 0.5 * gap_max {
                close += 1;
            }

            if contact.is_penetrating() {
                let depth = contact.penetration_depth();
                metrics.num_penetrations += 1;
                metrics.max_penetration = metrics.max_penetration.max(depth);
                depth_sum += depth;
                if depth > MAJOR_PENETRATION_DEPTH {
                    metrics.has_major_penetration = true;
                }
                if depth > TUNNELING_FRACTION * gap_max {
                    metrics.has_tunneling = true;
                }
            }
        }

        let n = contacts.len() as f64;
        metrics.avg_gap = gap_sum / n;
        if metrics.num_penetrations > 0 {
            metrics.avg_penetration = depth_sum / metrics.num_penetrations as f64;
            metrics.is_stable = false;
        }
        if ccd_enabled {
            metrics.ccd_effectiveness = close as f64 / n * 100.0;
        }
        metrics
    }
}

/// Stateless collision analysis.
pub struct CollisionValidator;

impl CollisionValidator {
    /// Full metrics of `contacts` at the velocities of `state`.
    ///
    /// Contacts whose stencil does not fit the state are skipped by the
    /// velocity statistics.
    pub fn compute_metrics(
        mesh: &Mesh,
        state: &SimulationState,
        contacts: &[Contact],
        gap_max: f64,
        ccd_enabled: bool,
    ) -> CollisionMetrics {
        let mut metrics = CollisionMetrics::from_contacts(contacts, gap_max, ccd_enabled);
        if state.num_vertices() != mesh.num_vertices() {
            return metrics;
        }

        let relative = Self::relative_velocities(state, contacts);
        if !relative.is_empty() {
            metrics.max_relative_velocity = relative.iter().copied().fold(0.0, f64::max);
            metrics.avg_relative_velocity = relative.iter().sum::<f64>() / relative.len() as f64;
        }
        metrics.max_approach_velocity = contacts
            .iter()
            .filter(|c| fits(c, state.num_vertices()))
            .map(|c| -c.normal_velocity(state.velocities()))
            .fold(0.0, f64::max);
        metrics
    }

    /// Whether any contact has a negative gap.
    pub fn has_penetrations(contacts: &[Contact]) -> bool {
        contacts.iter().any(Contact::is_penetrating)
    }

    /// Deepest penetration (0 if none).
    pub fn max_penetration_depth(contacts: &[Contact]) -> f64 {
        contacts
            .iter()
            .map(Contact::penetration_depth)
            .fold(0.0, f64::max)
    }

    /// `‖Σ wᵢ vᵢ‖` per contact, in contact order.
    pub fn relative_velocities(state: &SimulationState, contacts: &[Contact]) -> Vec<f64> {
        let n = state.num_vertices();
        contacts
            .iter()
            .filter(|c| fits(c, n))
            .map(|c| c.relative_velocity(state.velocities()).length())
            .collect()
    }
}

fn fits(contact: &Contact, num_vertices: usize) -> bool {
    contact.stencil.iter().all(|(v, _)| v < num_vertices)
}
