//! Physical constants and simulation defaults.

/// Gravitational acceleration (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Default simulation timestep (seconds).
pub const DEFAULT_DT: f64 = 0.002;

/// Default barrier influence radius for mesh–mesh contacts (meters).
pub const DEFAULT_CONTACT_GAP_MAX: f64 = 1.0e-3;

/// Default barrier influence radius for walls (meters).
pub const DEFAULT_WALL_GAP: f64 = 1.0e-3;

/// Default Newton step-size cap as a fraction of the shortest rest edge.
pub const DEFAULT_BETA_MAX: f64 = 0.25;

/// Default Newton iteration floor.
pub const DEFAULT_MIN_NEWTON_STEPS: u32 = 2;

/// Default Newton iteration cap.
pub const DEFAULT_MAX_NEWTON_STEPS: u32 = 8;

/// Default PCG relative tolerance.
pub const DEFAULT_PCG_TOL: f64 = 1.0e-3;

/// Default PCG iteration cap.
pub const DEFAULT_PCG_MAX_ITERS: u32 = 1000;

/// Default line-search backtrack budget.
pub const DEFAULT_MAX_BACKTRACKS: u32 = 20;

/// Speed below which a vertex is considered at rest (m/s).
pub const REST_VELOCITY_THRESHOLD: f64 = 1.0e-8;

/// Smallest lumped vertex mass handed out to vertices with no incident area (kg).
pub const MIN_VERTEX_MASS: f64 = 1.0e-6;

/// Epsilon for floating-point comparisons.
pub const EPSILON: f64 = 1.0e-12;

/// Epsilon for degenerate triangle detection (area threshold, m²).
pub const DEGENERATE_AREA_THRESHOLD: f64 = 1.0e-14;

/// Penetration depth above which a contact is a major penetration (meters).
pub const MAJOR_PENETRATION_DEPTH: f64 = 1.0e-3;

/// Penetration depth above which a collision is reported as a warning (meters).
pub const MINOR_PENETRATION_DEPTH: f64 = 1.0e-4;
