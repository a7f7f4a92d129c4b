//! # drape-io
//!
//! Scene description files, scene validation and construction, and JSON
//! frame recording.
//!
//! ## Key Types
//!
//! - [`SceneConfig`] — Serializable (TOML) description of a simulation run
//! - [`Scene`] — Ready-to-step mesh, state, constraints and parameters
//! - [`FrameRecording`] — Per-frame vertex positions written as JSON
//! - [`ValidatedFile`] — Result of validating a scene or recording file

pub mod recording;
pub mod scene;
pub mod validator;

pub use recording::{Frame, FrameRecording};
pub use scene::{
    AdaptiveConfig, GridCorner, GridOrientation, MaterialSource, MeshSource, OutputConfig,
    PinConfig, Scene, SceneConfig, WallConfig,
};
pub use validator::{validate_file, validate_scene, ValidatedFile};
