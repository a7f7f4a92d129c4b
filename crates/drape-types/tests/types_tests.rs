//! Integration tests for drape-types.

use drape_types::constants;
use drape_types::{DrapeError, DrapeResult};

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = DrapeError::InvalidMesh("triangle 3 references vertex 42".into());
    assert!(err.to_string().contains("vertex 42"));
}

#[test]
fn state_not_initialized_display() {
    let err = DrapeError::StateNotInitialized;
    assert!(err.to_string().contains("not initialized"));
}

#[test]
fn io_error_conversion() {
    fn read_missing() -> DrapeResult<String> {
        Ok(std::fs::read_to_string("/definitely/not/a/real/path.toml")?)
    }
    match read_missing() {
        Err(DrapeError::Io(_)) => {}
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn config_error_is_distinct_from_mesh_error() {
    let err = DrapeError::InvalidConfig("min_newton_steps > max_newton_steps".into());
    assert!(matches!(err, DrapeError::InvalidConfig(_)));
    assert!(err.to_string().starts_with("Invalid configuration"));
}

// ─── Constant Tests ───────────────────────────────────────────

#[test]
fn newton_defaults_are_ordered() {
    assert!(constants::DEFAULT_MIN_NEWTON_STEPS <= constants::DEFAULT_MAX_NEWTON_STEPS);
}

#[test]
fn penetration_thresholds_are_ordered() {
    assert!(constants::MINOR_PENETRATION_DEPTH < constants::MAJOR_PENETRATION_DEPTH);
}

#[test]
fn gaps_are_positive() {
    assert!(constants::DEFAULT_CONTACT_GAP_MAX > 0.0);
    assert!(constants::DEFAULT_WALL_GAP > 0.0);
}
