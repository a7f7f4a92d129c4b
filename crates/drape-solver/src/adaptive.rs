//! CFL-style adaptive timestep control.
//!
//! All functions are stateless and never panic; a degenerate mesh is
//! reported through the `dt = 0` sentinel instead of an error.

use drape_math::Vec3;
use drape_mesh::Mesh;
use drape_types::constants::REST_VELOCITY_THRESHOLD;

/// Largest allowed growth of `dt` between consecutive steps.
pub const MAX_GROWTH: f64 = 1.5;

/// Stateless timestep controller.
pub struct AdaptiveTimestep;

impl AdaptiveTimestep {
    /// Largest vertex speed (0 for no vertices).
    pub fn compute_max_velocity(velocities: &[Vec3]) -> f64 {
        velocities.iter().map(|v| v.length()).fold(0.0, f64::max)
    }

    /// Shortest rest edge length (0 if the mesh has no edges).
    pub fn compute_min_edge_length(mesh: &Mesh) -> f64 {
        mesh.min_rest_edge_length()
    }

    /// CFL timestep `safety · min_edge / max_v`.
    ///
    /// Returns 0 for a non-positive or non-finite `min_edge`; speeds at or
    /// below the rest threshold are treated as the threshold itself.
    pub fn compute_cfl_timestep(max_velocity: f64, min_edge: f64, safety: f64) -> f64 {
        if !min_edge.is_finite() || min_edge <= 0.0 {
            return 0.0;
        }
        if max_velocity <= REST_VELOCITY_THRESHOLD {
            return safety * min_edge / REST_VELOCITY_THRESHOLD;
        }
        safety * min_edge / max_velocity
    }

    /// Next timestep from the current velocities.
    ///
    /// At rest this is `dt_max`; a mesh without edges yields 0. Otherwise
    /// the CFL target is clamped to `[dt_min, dt_max]`, limited to
    /// `1.5 · current_dt` and clamped again.
    pub fn compute_next_dt(
        velocities: &[Vec3],
        mesh: &Mesh,
        current_dt: f64,
        dt_min: f64,
        dt_max: f64,
        safety: f64,
    ) -> f64 {
        let max_v = Self::compute_max_velocity(velocities);
        if max_v <= REST_VELOCITY_THRESHOLD {
            return dt_max;
        }
        let min_edge = Self::compute_min_edge_length(mesh);
        if min_edge <= 0.0 {
            return 0.0;
        }

        let target = Self::compute_cfl_timestep(max_v, min_edge, safety);
        let clamped = clamp_lenient(target, dt_min, dt_max);
        let limited = clamped.min(MAX_GROWTH * current_dt);
        clamp_lenient(limited, dt_min, dt_max)
    }
}

/// `max(lo, min(hi, x))`; unlike `f64::clamp` this tolerates `lo > hi`.
fn clamp_lenient(x: f64, lo: f64, hi: f64) -> f64 {
    x.min(hi).max(lo)
}
