//! Simulation state: per-vertex positions, velocities and lumped masses.
//!
//! This is the primary mutable data structure during simulation.
//! The integrator reads and writes these buffers each timestep; the mesh
//! topology stays immutable after initialization.

use drape_math::Vec3;
use drape_mesh::Mesh;
use drape_types::{DrapeError, DrapeResult};

/// Per-vertex simulation buffers.
///
/// A state is either uninitialized ([`SimulationState::new`]) or bound to a
/// mesh by [`SimulationState::initialize`]. All buffers have one entry per
/// mesh vertex and are only resized by re-initialization.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    masses: Vec<f64>,
    /// Accumulated simulated time (seconds).
    pub time: f64,
    initialized: bool,
}

impl SimulationState {
    /// Creates an uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state initialized against `mesh`.
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let mut state = Self::new();
        state.initialize(mesh);
        state
    }

    /// Binds the state to `mesh`: copies rest positions, zeroes
    /// velocities and lumps mass (`ρ·h·area/3` per incident triangle).
    pub fn initialize(&mut self, mesh: &Mesh) {
        self.positions = mesh.rest_positions().to_vec();
        self.velocities = vec![Vec3::ZERO; mesh.num_vertices()];
        self.masses = mesh.lumped_masses();
        self.time = 0.0;
        self.initialized = true;
    }

    /// Whether [`initialize`](Self::initialize) has been called.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of vertices (0 when uninitialized).
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Current positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Mutable positions (for scripted initial conditions).
    pub fn positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.positions
    }

    /// Current velocities.
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Mutable velocities.
    pub fn velocities_mut(&mut self) -> &mut [Vec3] {
        &mut self.velocities
    }

    /// Lumped vertex masses (all positive).
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    /// Adds `gravity · dt` to every velocity.
    ///
    /// # Errors
    /// [`DrapeError::StateNotInitialized`] if the state has no mesh.
    pub fn apply_gravity(&mut self, gravity: Vec3, dt: f64) -> DrapeResult<()> {
        self.require_initialized()?;
        let dv = gravity * dt;
        for v in &mut self.velocities {
            *v += dv;
        }
        Ok(())
    }

    /// Re-derives lumped masses after a material hot-reload.
    ///
    /// Positions and velocities are kept.
    pub fn update_masses(&mut self, mesh: &Mesh) -> DrapeResult<()> {
        self.ensure_matches(mesh)?;
        self.masses = mesh.lumped_masses();
        Ok(())
    }

    /// Overwrites positions and velocities after a completed step.
    pub(crate) fn commit(&mut self, positions: Vec<Vec3>, velocities: Vec<Vec3>, dt: f64) {
        self.positions = positions;
        self.velocities = velocities;
        self.time += dt;
    }

    /// Total kinetic energy `½ Σ mᵢ‖vᵢ‖²`.
    pub fn kinetic_energy(&self) -> f64 {
        self.velocities
            .iter()
            .zip(&self.masses)
            .map(|(v, m)| 0.5 * m * v.length_squared())
            .sum()
    }

    /// Errors unless the state is initialized.
    pub fn require_initialized(&self) -> DrapeResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(DrapeError::StateNotInitialized)
        }
    }

    /// Errors unless the state is initialized with `mesh`'s vertex count.
    pub fn ensure_matches(&self, mesh: &Mesh) -> DrapeResult<()> {
        self.require_initialized()?;
        if self.positions.len() != mesh.num_vertices() {
            return Err(DrapeError::InvalidMesh(format!(
                "state has {} vertices but mesh has {}",
                self.positions.len(),
                mesh.num_vertices()
            )));
        }
        Ok(())
    }
}
