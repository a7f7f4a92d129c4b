//! JSON frame recording.
//!
//! Captures triangle connectivity once and vertex positions per recorded
//! frame, then writes everything as a single JSON document that external
//! viewers can play back.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use drape_math::Vec3;
use drape_mesh::Mesh;
use drape_types::{DrapeError, DrapeResult};

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Step index the frame was taken after.
    pub timestep: u32,
    /// Simulation time (seconds).
    pub time: f64,
    pub positions: Vec<Vec3>,
}

/// A recorded animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecording {
    pub name: String,
    pub vertex_count: usize,
    pub triangles: Vec<[usize; 3]>,
    pub frames: Vec<Frame>,
}

impl FrameRecording {
    /// Empty recording for `mesh`.
    pub fn new(name: impl Into<String>, mesh: &Mesh) -> Self {
        Self {
            name: name.into(),
            vertex_count: mesh.num_vertices(),
            triangles: mesh.triangles().to_vec(),
            frames: Vec::new(),
        }
    }

    /// Appends a frame.
    ///
    /// # Errors
    /// [`DrapeError::InvalidMesh`] if the position count is wrong.
    pub fn push_frame(&mut self, timestep: u32, time: f64, positions: &[Vec3]) -> DrapeResult<()> {
        if positions.len() != self.vertex_count {
            return Err(DrapeError::InvalidMesh(format!(
                "frame has {} positions, recording expects {}",
                positions.len(),
                self.vertex_count
            )));
        }
        self.frames.push(Frame {
            timestep,
            time,
            positions: positions.to_vec(),
        });
        Ok(())
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Checks connectivity, frame sizes, finiteness and frame ordering.
    pub fn validate(&self) -> DrapeResult<()> {
        for (t, tri) in self.triangles.iter().enumerate() {
            if tri.iter().any(|&v| v >= self.vertex_count) {
                return Err(DrapeError::InvalidMesh(format!(
                    "triangle {t} indexes past {} vertices",
                    self.vertex_count
                )));
            }
        }
        let mut last_time = f64::NEG_INFINITY;
        for frame in &self.frames {
            if frame.positions.len() != self.vertex_count {
                return Err(DrapeError::InvalidMesh(format!(
                    "frame {} has {} positions, expected {}",
                    frame.timestep,
                    frame.positions.len(),
                    self.vertex_count
                )));
            }
            if !frame.positions.iter().all(|p| p.is_finite()) {
                return Err(DrapeError::InvariantViolation(format!(
                    "frame {} contains non-finite positions",
                    frame.timestep
                )));
            }
            if frame.time < last_time {
                return Err(DrapeError::InvalidConfig(format!(
                    "frame {} goes back in time",
                    frame.timestep
                )));
            }
            last_time = frame.time;
        }
        Ok(())
    }

    pub fn to_json(&self) -> DrapeResult<String> {
        serde_json::to_string(self).map_err(|e| DrapeError::Serialization(e.to_string()))
    }

    pub fn from_json(text: &str) -> DrapeResult<Self> {
        serde_json::from_str(text).map_err(|e| DrapeError::Serialization(e.to_string()))
    }

    /// Writes the recording to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> DrapeResult<()> {
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer(writer, self).map_err(|e| DrapeError::Serialization(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> DrapeResult<Self> {
        let reader = BufReader::new(fs::File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| DrapeError::Serialization(e.to_string()))
    }
}
