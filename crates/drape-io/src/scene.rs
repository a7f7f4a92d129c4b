//! Scene description.
//!
//! A scene file is TOML:
//!
//! ```toml
//! name = "tablecloth"
//! steps = 200
//! gravity = [0.0, 0.0, -9.81]
//! material = "cotton"
//!
//! [mesh]
//! kind = "grid"
//! cols = 20
//! rows = 20
//! width = 1.0
//! height = 1.0
//! elevation = 0.3
//!
//! [pins]
//! corners = ["top_left", "top_right"]
//!
//! [[walls]]
//! normal = [0.0, 0.0, 1.0]
//! offset = 0.0
//!
//! [params]
//! dt = 0.002
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use drape_material::{Material, MaterialDatabase};
use drape_math::{Mat3, Vec3};
use drape_mesh::generators::{grid_corners, grid_top_edge, quad_grid};
use drape_mesh::{Mesh, MeshGeometry};
use drape_solver::{ConstraintSet, SimParams, SimulationState};
use drape_types::constants::GRAVITY;
use drape_types::{DrapeError, DrapeResult};

use crate::validator::validate_scene;

/// Plane a procedural grid is laid out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridOrientation {
    /// XY plane, row 0 at +Y.
    #[default]
    Horizontal,
    /// XZ plane, row 0 at the top (+Z).
    Vertical,
}

/// Where the mesh comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeshSource {
    /// Procedural quad grid.
    Grid {
        cols: usize,
        rows: usize,
        width: f64,
        height: f64,
        /// Offset along +Z applied after orientation and tilt.
        #[serde(default)]
        elevation: f64,
        #[serde(default)]
        orientation: GridOrientation,
        /// Rotation about +X in degrees, applied after orientation.
        #[serde(default)]
        tilt_degrees: f64,
    },
    /// Explicit vertex and triangle lists.
    Inline {
        vertices: Vec<Vec3>,
        triangles: Vec<[usize; 3]>,
    },
}

impl MeshSource {
    /// Horizontal grid at height `elevation`.
    pub fn grid(cols: usize, rows: usize, width: f64, height: f64, elevation: f64) -> Self {
        Self::Grid {
            cols,
            rows,
            width,
            height,
            elevation,
            orientation: GridOrientation::Horizontal,
            tilt_degrees: 0.0,
        }
    }

    /// Vertex positions and triangles.
    pub fn geometry(&self) -> MeshGeometry {
        match self {
            Self::Grid {
                cols,
                rows,
                width,
                height,
                elevation,
                orientation,
                tilt_degrees,
            } => {
                let mut geometry = quad_grid(*cols, *rows, *width, *height);
                if *orientation == GridOrientation::Vertical {
                    geometry = geometry.rotated(Mat3::from_rotation_x(std::f64::consts::FRAC_PI_2));
                }
                if *tilt_degrees != 0.0 {
                    geometry = geometry.rotated(Mat3::from_rotation_x(tilt_degrees.to_radians()));
                }
                geometry.translated(Vec3::new(0.0, 0.0, *elevation))
            }
            Self::Inline {
                vertices,
                triangles,
            } => MeshGeometry {
                positions: vertices.clone(),
                triangles: triangles.clone(),
            },
        }
    }
}

/// Preset name or explicit material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaterialSource {
    Preset(String),
    Explicit(Material),
}

impl Default for MaterialSource {
    fn default() -> Self {
        Self::Explicit(Material::default())
    }
}

impl MaterialSource {
    /// Resolves against the built-in preset database.
    pub fn resolve(&self) -> DrapeResult<Material> {
        match self {
            Self::Explicit(material) => Ok(*material),
            Self::Preset(name) => {
                let db = MaterialDatabase::with_defaults();
                db.get(name).copied().ok_or_else(|| {
                    DrapeError::InvalidMaterial(format!(
                        "unknown material preset '{name}' (known: {})",
                        db.names().join(", ")
                    ))
                })
            }
        }
    }
}

/// Named corner of a procedural grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridCorner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl GridCorner {
    fn vertex(self, cols: usize, rows: usize) -> usize {
        let [tl, tr, bl, br] = grid_corners(cols, rows);
        match self {
            Self::TopLeft => tl,
            Self::TopRight => tr,
            Self::BottomLeft => bl,
            Self::BottomRight => br,
        }
    }
}

/// Vertices pinned at their initial positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    /// Explicit vertex indices.
    pub vertices: Vec<usize>,
    /// Named grid corners (grid meshes only).
    pub corners: Vec<GridCorner>,
    /// Pin the whole top row (grid meshes only).
    pub top_edge: bool,
}

impl PinConfig {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.corners.is_empty() && !self.top_edge
    }

    /// Sorted, de-duplicated vertex list for `mesh`.
    pub fn resolve(&self, mesh: &MeshSource) -> DrapeResult<Vec<usize>> {
        let mut pins = self.vertices.clone();
        if !self.corners.is_empty() || self.top_edge {
            let MeshSource::Grid { cols, rows, .. } = mesh else {
                return Err(DrapeError::InvalidConstraint(
                    "corner and top-edge pins need a grid mesh".into(),
                ));
            };
            pins.extend(self.corners.iter().map(|c| c.vertex(*cols, *rows)));
            if self.top_edge {
                pins.extend(grid_top_edge(*cols));
            }
        }
        pins.sort_unstable();
        pins.dedup();
        Ok(pins)
    }
}

/// A static half-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallConfig {
    /// Outward normal (normalized on build).
    pub normal: Vec3,
    /// Signed offset along the normal.
    #[serde(default)]
    pub offset: f64,
    /// Activation gap; `params.wall_gap` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap: Option<f64>,
}

/// Adaptive timestep bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    pub dt_min: f64,
    pub dt_max: f64,
    #[serde(default = "default_safety")]
    pub safety: f64,
}

fn default_safety() -> f64 {
    0.5
}

/// Optional output files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON frame recording.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recording: Option<PathBuf>,
    /// Final-state snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    /// Record every n-th step.
    pub record_every: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            recording: None,
            snapshot: None,
            record_every: 1,
        }
    }
}

/// Complete scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_steps")]
    pub steps: usize,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
    /// Velocity given to every free vertex at the start.
    #[serde(default)]
    pub initial_velocity: Vec3,
    #[serde(default)]
    pub material: MaterialSource,
    pub mesh: MeshSource,
    #[serde(default)]
    pub pins: PinConfig,
    #[serde(default)]
    pub walls: Vec<WallConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive: Option<AdaptiveConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub params: SimParams,
}

fn default_name() -> String {
    "scene".to_string()
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, 0.0, -GRAVITY)
}

fn default_steps() -> usize {
    100
}

impl SceneConfig {
    /// Scene with default material, gravity, params and no constraints.
    pub fn new(name: impl Into<String>, mesh: MeshSource) -> Self {
        Self {
            name: name.into(),
            mesh,
            material: MaterialSource::default(),
            gravity: default_gravity(),
            initial_velocity: Vec3::ZERO,
            pins: PinConfig::default(),
            walls: Vec::new(),
            steps: default_steps(),
            adaptive: None,
            output: OutputConfig::default(),
            params: SimParams::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> DrapeResult<Self> {
        toml::from_str(text).map_err(|e| DrapeError::Serialization(format!("scene TOML: {e}")))
    }

    pub fn to_toml_string(&self) -> DrapeResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| DrapeError::Serialization(format!("scene TOML: {e}")))
    }

    pub fn load(path: impl AsRef<Path>) -> DrapeResult<Self> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> DrapeResult<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    /// Validates the description and builds the scene.
    ///
    /// # Errors
    /// Any configuration, material, mesh or constraint error.
    pub fn build(&self) -> DrapeResult<Scene> {
        validate_scene(self)?;

        let material = self.material.resolve()?;
        let geometry = self.mesh.geometry();
        let mesh = Mesh::initialize(geometry.positions, geometry.triangles, material)?;
        let mut state = SimulationState::from_mesh(&mesh);

        let mut constraints = ConstraintSet::new();
        for v in self.pins.resolve(&self.mesh)? {
            let target = mesh.rest_positions().get(v).copied().ok_or_else(|| {
                DrapeError::InvalidConstraint(format!(
                    "pin vertex {v} out of range for {} vertices",
                    mesh.num_vertices()
                ))
            })?;
            constraints.add_pin(v, target);
        }
        for (v, velocity) in state.velocities_mut().iter_mut().enumerate() {
            if !constraints.is_pinned(v) {
                *velocity = self.initial_velocity;
            }
        }
        for wall in &self.walls {
            constraints.add_wall(
                wall.normal,
                wall.offset,
                wall.gap.unwrap_or(self.params.wall_gap),
            )?;
        }

        debug!(
            scene = %self.name,
            vertices = mesh.num_vertices(),
            triangles = mesh.num_triangles(),
            pins = constraints.num_active_pins(),
            walls = constraints.num_walls(),
            "scene built"
        );

        Ok(Scene {
            name: self.name.clone(),
            mesh,
            state,
            constraints,
            params: self.params.clone(),
            gravity: self.gravity,
            steps: self.steps,
            adaptive: self.adaptive,
            output: self.output.clone(),
        })
    }
}

/// A scene ready to step.
#[derive(Debug, Clone)]
pub struct Scene {
    pub name: String,
    pub mesh: Mesh,
    pub state: SimulationState,
    pub constraints: ConstraintSet,
    pub params: SimParams,
    pub gravity: Vec3,
    pub steps: usize,
    pub adaptive: Option<AdaptiveConfig>,
    pub output: OutputConfig,
}
