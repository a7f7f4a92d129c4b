//! Backtracking line search with an Armijo condition.

use drape_math::Vec3;

/// Sufficient-decrease constant `c` of the Armijo test.
pub const ARMIJO_C: f64 = 1e-4;

/// Initial step `α₀ = min(1, β·ℓ_min / max‖dᵢ‖)`.
///
/// Returns 1 for a zero direction or a mesh without edges.
pub fn initial_step(beta_max: f64, min_edge_length: f64, direction: &[Vec3]) -> f64 {
    let max_move = direction
        .iter()
        .map(|d| d.length())
        .fold(0.0, f64::max);
    if max_move <= 0.0 || min_edge_length <= 0.0 {
        return 1.0;
    }
    (beta_max * min_edge_length / max_move).min(1.0)
}

/// Outcome of a backtracking search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchOutcome {
    /// Accepted step, or `None` if every trial failed.
    pub alpha: Option<f64>,
    /// Energy at the accepted step (the start energy on failure).
    pub energy: f64,
    /// Number of trial energies evaluated.
    pub trials: u32,
}

/// Halves `α` from `alpha0` until `E(α) ≤ E₀ + c·α·slope` and `E(α) < E₀`.
///
/// `slope` is the directional derivative `∇E·d` (negative for a descent
/// direction); `energy_at(α)` evaluates the merit function along the ray.
pub fn backtrack<F>(
    energy0: f64,
    slope: f64,
    alpha0: f64,
    max_backtracks: u32,
    mut energy_at: F,
) -> LineSearchOutcome
where
    F: FnMut(f64) -> f64,
{
    let mut alpha = alpha0;
    let mut trials = 0;
    while trials < max_backtracks && alpha > 0.0 {
        let energy = energy_at(alpha);
        trials += 1;
        if energy.is_finite() && energy < energy0 && energy <= energy0 + ARMIJO_C * alpha * slope {
            return LineSearchOutcome {
                alpha: Some(alpha),
                energy,
                trials,
            };
        }
        alpha *= 0.5;
    }
    LineSearchOutcome {
        alpha: None,
        energy: energy0,
        trials,
    }
}

/// `x + α d`.
pub fn advance(x: &[Vec3], direction: &[Vec3], alpha: f64) -> Vec<Vec3> {
    x.iter().zip(direction).map(|(xi, di)| *xi + *di * alpha).collect()
}

/// Largest per-vertex displacement of `α d`.
pub fn step_length(direction: &[Vec3], alpha: f64) -> f64 {
    alpha * direction.iter().map(|d| d.length()).fold(0.0, f64::max)
}
