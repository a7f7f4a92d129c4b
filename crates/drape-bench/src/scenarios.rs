//! Canonical benchmark scenarios.
//!
//! Every scenario is a [`SceneConfig`], so it runs through the same
//! runner as user scene files and can be written out as TOML.
//!
//! 1. **Ground drape**: 5×5 sheet, two corners pinned, falls onto the ground
//! 2. **Hanging sheet**: vertical sheet pinned along its top edge, no walls
//! 3. **Inclined slide**: sheet resting on a tilted wall with friction
//! 4. **Free fall**: unpinned sheet thrown at the ground (CCD stress)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use drape_io::{GridCorner, GridOrientation, MaterialSource, MeshSource, SceneConfig, WallConfig};
use drape_math::Vec3;
use drape_types::DrapeError;

/// Tilt of the inclined slide (degrees).
pub const INCLINE_DEGREES: f64 = 20.0;

/// Which benchmark scenario to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    GroundDrape,
    HangingSheet,
    InclinedSlide,
    FreeFall,
}

impl ScenarioKind {
    pub fn all() -> &'static [ScenarioKind] {
        &[
            ScenarioKind::GroundDrape,
            ScenarioKind::HangingSheet,
            ScenarioKind::InclinedSlide,
            ScenarioKind::FreeFall,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioKind::GroundDrape => "ground_drape",
            ScenarioKind::HangingSheet => "hanging_sheet",
            ScenarioKind::InclinedSlide => "inclined_slide",
            ScenarioKind::FreeFall => "free_fall",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioKind::GroundDrape => "5x5 sheet with two pinned corners draping onto the ground",
            ScenarioKind::HangingSheet => "vertical sheet hanging from its top edge",
            ScenarioKind::InclinedSlide => "sheet sliding down a tilted wall with friction",
            ScenarioKind::FreeFall => "unpinned sheet thrown at the ground",
        }
    }

    /// The scene description of this scenario.
    pub fn scene(&self) -> SceneConfig {
        match self {
            ScenarioKind::GroundDrape => ground_drape(),
            ScenarioKind::HangingSheet => hanging_sheet(),
            ScenarioKind::InclinedSlide => inclined_slide(),
            ScenarioKind::FreeFall => free_fall(),
        }
    }

    /// Scene with the material replaced by a named preset.
    pub fn scene_with_material(&self, preset: Option<&str>) -> SceneConfig {
        let mut scene = self.scene();
        if let Some(name) = preset {
            scene.material = MaterialSource::Preset(name.to_string());
        }
        scene
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioKind {
    type Err = DrapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScenarioKind::all()
            .iter()
            .copied()
            .find(|k| k.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = ScenarioKind::all().iter().map(|k| k.name()).collect();
                DrapeError::InvalidConfig(format!(
                    "unknown scenario '{s}' (known: {})",
                    names.join(", ")
                ))
            })
    }
}

fn ground_wall() -> WallConfig {
    WallConfig {
        normal: Vec3::Z,
        offset: 0.0,
        gap: None,
    }
}

fn ground_drape() -> SceneConfig {
    let mut scene = SceneConfig::new(
        ScenarioKind::GroundDrape.name(),
        MeshSource::grid(5, 5, 1.0, 1.0, 0.05),
    );
    scene.pins.corners = vec![GridCorner::TopLeft, GridCorner::TopRight];
    scene.walls.push(ground_wall());
    scene.steps = 150;
    scene
}

fn hanging_sheet() -> SceneConfig {
    let mut scene = SceneConfig::new(
        ScenarioKind::HangingSheet.name(),
        MeshSource::Grid {
            cols: 8,
            rows: 8,
            width: 1.0,
            height: 1.0,
            elevation: 1.0,
            orientation: GridOrientation::Vertical,
            tilt_degrees: 0.0,
        },
    );
    scene.pins.top_edge = true;
    scene.steps = 100;
    scene
}

fn inclined_slide() -> SceneConfig {
    let tilt = INCLINE_DEGREES.to_radians();
    let rest_gap = 5e-4;
    let mut scene = SceneConfig::new(
        ScenarioKind::InclinedSlide.name(),
        MeshSource::Grid {
            cols: 4,
            rows: 4,
            width: 0.5,
            height: 0.5,
            // Vertical lift that leaves `rest_gap` along the wall normal.
            elevation: rest_gap / tilt.cos(),
            orientation: GridOrientation::Horizontal,
            tilt_degrees: INCLINE_DEGREES,
        },
    );
    scene.walls.push(WallConfig {
        normal: Vec3::new(0.0, -tilt.sin(), tilt.cos()),
        offset: 0.0,
        gap: None,
    });
    scene.params.enable_friction = true;
    scene.params.friction_mu = 0.4;
    scene.steps = 100;
    scene
}

fn free_fall() -> SceneConfig {
    let mut scene = SceneConfig::new(
        ScenarioKind::FreeFall.name(),
        MeshSource::grid(6, 6, 1.0, 1.0, 0.1),
    );
    scene.initial_velocity = Vec3::new(0.0, 0.0, -20.0);
    scene.walls.push(ground_wall());
    scene.steps = 60;
    scene
}
