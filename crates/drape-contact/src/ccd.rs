//! Continuous collision detection by additive conservative advancement.
//!
//! For a primitive pair moving linearly from `x` to `x + d`, the distance
//! can shrink at most `L` per unit of time, where `L` is the sum of the
//! largest vertex displacement on each side. Advancing
//! `t += (dist(t) − s·d₀) / L` therefore never lets the distance drop below
//! `s·d₀`, and every visited `t` is a safe step fraction.

use drape_math::Vec3;

use crate::narrow::{point_triangle_distance, segment_segment_distance};
use crate::wall::Wall;

/// Fraction of the initial distance that must be kept.
pub const SEPARATION_FRACTION: f64 = 0.1;

/// Iteration cap for the advancement loop.
pub const MAX_CCD_ITERATIONS: usize = 64;

/// Advances until the motion completes or progress stalls.
///
/// `distance(t)` evaluates the pair distance at time `t ∈ [0, 1]` and
/// `motion_bound` is the relative-motion bound `L`.
fn conservative_advancement<F>(distance: F, motion_bound: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    if motion_bound <= 0.0 || !motion_bound.is_finite() {
        return 1.0;
    }
    let d0 = distance(0.0);
    if d0 <= 0.0 {
        return 0.0;
    }
    if d0 * (1.0 - SEPARATION_FRACTION) >= motion_bound {
        // Cannot close the gap within the step.
        return 1.0;
    }

    let target = SEPARATION_FRACTION * d0;
    let mut t = 0.0;
    for _ in 0..MAX_CCD_ITERATIONS {
        let advance = (distance(t) - target) / motion_bound;
        if advance <= f64::EPSILON {
            return t;
        }
        t += advance;
        if t >= 1.0 {
            return 1.0;
        }
    }
    t
}

/// Safe step fraction for a vertex moving against a triangle.
///
/// `x` holds the start positions `[p, a, b, c]` and `d` their displacements.
pub fn point_triangle_toi(x: [Vec3; 4], d: [Vec3; 4]) -> f64 {
    let tri_bound = d[1].length().max(d[2].length()).max(d[3].length());
    let bound = d[0].length() + tri_bound;
    conservative_advancement(
        |t| {
            point_triangle_distance(
                x[0] + d[0] * t,
                x[1] + d[1] * t,
                x[2] + d[2] * t,
                x[3] + d[3] * t,
            )
        },
        bound,
    )
}

/// Safe step fraction for two moving edges.
///
/// `x` holds the start positions `[a0, a1, b0, b1]` and `d` their displacements.
pub fn edge_edge_toi(x: [Vec3; 4], d: [Vec3; 4]) -> f64 {
    let bound_a = d[0].length().max(d[1].length());
    let bound_b = d[2].length().max(d[3].length());
    conservative_advancement(
        |t| {
            segment_segment_distance(
                x[0] + d[0] * t,
                x[1] + d[1] * t,
                x[2] + d[2] * t,
                x[3] + d[3] * t,
            )
        },
        bound_a + bound_b,
    )
}

/// Safe step fraction for a vertex moving towards a wall.
///
/// Exact for linear motion: keeps `SEPARATION_FRACTION` of the start
/// distance. A vertex already on or behind the wall may not move further in.
pub fn point_wall_toi(x: Vec3, d: Vec3, wall: &Wall) -> f64 {
    let g0 = wall.signed_distance(x);
    let rate = wall.normal.dot(d);
    if rate >= 0.0 {
        return 1.0;
    }
    if g0 <= 0.0 {
        return 0.0;
    }
    let t = (1.0 - SEPARATION_FRACTION) * g0 / -rate;
    t.min(1.0)
}
