//! Scene and file validation.
//!
//! Catches description-level mistakes before any mesh or solver object is
//! built, with messages that name the offending field.

use std::path::Path;

use drape_types::{DrapeError, DrapeResult};

use crate::recording::FrameRecording;
use crate::scene::{MeshSource, SceneConfig};

/// What [`validate_file`] found.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedFile {
    /// A scene that builds.
    Scene {
        name: String,
        vertices: usize,
        triangles: usize,
        pins: usize,
        walls: usize,
        steps: usize,
    },
    /// A consistent frame recording.
    Recording {
        name: String,
        vertices: usize,
        frames: usize,
    },
}

/// Checks a scene description without building it.
///
/// # Errors
/// [`DrapeError::InvalidConfig`] for bad counts, sizes, gravity or
/// adaptive bounds, plus whatever [`drape_solver::SimParams::validate`]
/// reports.
pub fn validate_scene(config: &SceneConfig) -> DrapeResult<()> {
    config.params.validate()?;

    if config.steps == 0 {
        return Err(DrapeError::InvalidConfig("steps must be at least 1".into()));
    }
    if !config.gravity.is_finite() || !config.initial_velocity.is_finite() {
        return Err(DrapeError::InvalidConfig(format!(
            "gravity and initial velocity must be finite, got {} and {}",
            config.gravity, config.initial_velocity
        )));
    }
    if config.output.record_every == 0 {
        return Err(DrapeError::InvalidConfig(
            "output.record_every must be at least 1".into(),
        ));
    }

    match &config.mesh {
        MeshSource::Grid {
            cols,
            rows,
            width,
            height,
            elevation,
            tilt_degrees,
            ..
        } => {
            if *cols == 0 || *rows == 0 {
                return Err(DrapeError::InvalidConfig(format!(
                    "grid resolution must be positive, got {cols}x{rows}"
                )));
            }
            if !(width.is_finite() && *width > 0.0 && height.is_finite() && *height > 0.0) {
                return Err(DrapeError::InvalidConfig(format!(
                    "grid size must be positive, got {width}x{height}"
                )));
            }
            if !elevation.is_finite() || !tilt_degrees.is_finite() {
                return Err(DrapeError::InvalidConfig(
                    "grid elevation and tilt must be finite".into(),
                ));
            }
        }
        MeshSource::Inline {
            vertices,
            triangles,
        } => {
            if vertices.is_empty() || triangles.is_empty() {
                return Err(DrapeError::InvalidConfig(
                    "inline mesh needs vertices and triangles".into(),
                ));
            }
        }
    }

    for (i, wall) in config.walls.iter().enumerate() {
        if !wall.normal.is_finite() || wall.normal.length_squared() == 0.0 {
            return Err(DrapeError::InvalidConfig(format!(
                "wall {i} needs a non-zero finite normal"
            )));
        }
        if let Some(gap) = wall.gap {
            if !(gap.is_finite() && gap > 0.0) {
                return Err(DrapeError::InvalidConfig(format!(
                    "wall {i} gap must be positive, got {gap}"
                )));
            }
        }
    }

    if let Some(adaptive) = &config.adaptive {
        let ok = adaptive.dt_min.is_finite()
            && adaptive.dt_min > 0.0
            && adaptive.dt_max.is_finite()
            && adaptive.dt_max >= adaptive.dt_min
            && adaptive.safety > 0.0
            && adaptive.safety <= 1.0;
        if !ok {
            return Err(DrapeError::InvalidConfig(format!(
                "adaptive timestep needs 0 < dt_min <= dt_max and safety in (0, 1], got {adaptive:?}"
            )));
        }
    }

    Ok(())
}

/// Validates a `.toml` scene (by building it) or a `.json` recording.
pub fn validate_file(path: impl AsRef<Path>) -> DrapeResult<ValidatedFile> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("toml") => {
            let config = SceneConfig::load(path)?;
            let scene = config.build()?;
            Ok(ValidatedFile::Scene {
                name: scene.name,
                vertices: scene.mesh.num_vertices(),
                triangles: scene.mesh.num_triangles(),
                pins: scene.constraints.num_active_pins(),
                walls: scene.constraints.num_walls(),
                steps: scene.steps,
            })
        }
        Some("json") => {
            let recording = FrameRecording::load(path)?;
            recording.validate()?;
            Ok(ValidatedFile::Recording {
                name: recording.name.clone(),
                vertices: recording.vertex_count,
                frames: recording.num_frames(),
            })
        }
        _ => Err(DrapeError::InvalidConfig(format!(
            "cannot validate '{}': expected a .toml scene or .json recording",
            path.display()
        ))),
    }
}
