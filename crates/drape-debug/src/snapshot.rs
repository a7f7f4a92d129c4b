//! State snapshot serialization for resume and replay.
//!
//! A snapshot stores positions, velocities and the simulation time of a
//! [`SimulationState`]. Masses are not stored; they are re-derived from
//! the mesh when the target state is initialized.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use drape_math::Vec3;
use drape_solver::SimulationState;
use drape_types::{DrapeError, DrapeResult};

/// Bumped whenever the binary layout changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A captured simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Layout version ([`SNAPSHOT_VERSION`] when written by this crate).
    pub version: u32,
    /// Step index at capture time.
    pub timestep: u32,
    /// Simulation time in seconds.
    pub sim_time: f64,
    pub positions: Vec<Vec3>,
    pub velocities: Vec<Vec3>,
}

/// Quick statistics of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub vertex_count: usize,
    pub bbox_min: Vec3,
    pub bbox_max: Vec3,
    pub max_speed: f64,
    pub mean_speed: f64,
}

impl StateSnapshot {
    /// Captures `state` at step `timestep`.
    ///
    /// # Errors
    /// [`DrapeError::StateNotInitialized`] for an uninitialized state.
    pub fn capture(timestep: u32, state: &SimulationState) -> DrapeResult<Self> {
        state.require_initialized()?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            timestep,
            sim_time: state.time,
            positions: state.positions().to_vec(),
            velocities: state.velocities().to_vec(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Restores positions, velocities and time into `state`.
    ///
    /// # Errors
    /// Uninitialized state, or a vertex count that differs from the
    /// snapshot.
    pub fn apply_to(&self, state: &mut SimulationState) -> DrapeResult<()> {
        state.require_initialized()?;
        if state.num_vertices() != self.vertex_count() {
            return Err(DrapeError::InvalidMesh(format!(
                "snapshot has {} vertices, state has {}",
                self.vertex_count(),
                state.num_vertices()
            )));
        }
        state.positions_mut().copy_from_slice(&self.positions);
        state.velocities_mut().copy_from_slice(&self.velocities);
        state.time = self.sim_time;
        Ok(())
    }

    /// Encodes to bincode.
    pub fn to_bytes(&self) -> DrapeResult<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| DrapeError::Serialization(format!("snapshot encode failed: {e}")))
    }

    /// Decodes from bincode and checks internal consistency.
    pub fn from_bytes(data: &[u8]) -> DrapeResult<Self> {
        let snapshot: Self = bincode::deserialize(data)
            .map_err(|e| DrapeError::Serialization(format!("snapshot decode failed: {e}")))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DrapeError::Serialization(format!(
                "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
                snapshot.version
            )));
        }
        if snapshot.positions.len() != snapshot.velocities.len() {
            return Err(DrapeError::Serialization(format!(
                "snapshot has {} positions but {} velocities",
                snapshot.positions.len(),
                snapshot.velocities.len()
            )));
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DrapeResult<()> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> DrapeResult<Self> {
        Self::from_bytes(&fs::read(path)?)
    }

    /// Largest per-vertex position difference to `other`
    /// (`None` when the vertex counts differ).
    pub fn max_position_delta(&self, other: &StateSnapshot) -> Option<f64> {
        if self.vertex_count() != other.vertex_count() {
            return None;
        }
        Some(
            self.positions
                .iter()
                .zip(&other.positions)
                .map(|(a, b)| a.distance(*b))
                .fold(0.0, f64::max),
        )
    }

    pub fn summary(&self) -> SnapshotSummary {
        let (bbox_min, bbox_max) = if self.positions.is_empty() {
            (Vec3::ZERO, Vec3::ZERO)
        } else {
            self.positions.iter().fold(
                (Vec3::splat(f64::INFINITY), Vec3::splat(f64::NEG_INFINITY)),
                |(lo, hi), p| (lo.min(*p), hi.max(*p)),
            )
        };
        let speeds = self.velocities.iter().map(|v| v.length());
        let max_speed = speeds.clone().fold(0.0, f64::max);
        let mean_speed = if self.velocities.is_empty() {
            0.0
        } else {
            speeds.sum::<f64>() / self.velocities.len() as f64
        };
        SnapshotSummary {
            vertex_count: self.vertex_count(),
            bbox_min,
            bbox_max,
            max_speed,
            mean_speed,
        }
    }
}
