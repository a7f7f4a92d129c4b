//! Scene runner: steps a [`Scene`], emits telemetry and collects metrics.

use std::time::Instant;

use tracing::{debug, info};

use drape_diagnostics::{CollisionValidator, EnergyDiagnostics, EnergyTracker, QualityLevel};
use drape_io::{FrameRecording, Scene};
use drape_solver::{AdaptiveTimestep, Integrator, StepReport};
use drape_telemetry::{EventBus, EventKind, SimulationEvent};
use drape_types::{DrapeError, DrapeResult};

use crate::metrics::BenchmarkMetrics;

/// Progress is logged at `info` this many times per run.
const PROGRESS_REPORTS: usize = 10;

/// Runs scenes and scenarios, publishing events on its bus.
pub struct BenchmarkRunner {
    bus: EventBus,
}

impl BenchmarkRunner {
    /// Runner with an empty bus.
    pub fn new() -> Self {
        Self {
            bus: EventBus::new(),
        }
    }

    /// Bus for registering sinks.
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Steps `scene` for `scene.steps` steps.
    ///
    /// Frames go into `recording` at `scene.output.record_every`, starting
    /// with the initial state.
    ///
    /// # Errors
    /// Invalid parameters, or a zero timestep from the adaptive controller.
    pub fn run(
        &mut self,
        scene: &mut Scene,
        mut recording: Option<&mut FrameRecording>,
    ) -> DrapeResult<BenchmarkMetrics> {
        let mut integrator = Integrator::new(scene.params.clone())?;
        let initial_positions = scene.state.positions().to_vec();
        let record_every = scene.output.record_every.max(1);

        if let Some(rec) = recording.as_deref_mut() {
            rec.push_frame(0, scene.state.time, scene.state.positions())?;
        }

        let initial_energy =
            EnergyTracker::compute(&scene.mesh, &scene.state, &scene.constraints, integrator.params())?;
        let mut previous_energy = initial_energy;

        info!(
            scene = %scene.name,
            vertices = scene.mesh.num_vertices(),
            triangles = scene.mesh.num_triangles(),
            steps = scene.steps,
            solver = integrator.linear_solver_name(),
            "run started"
        );

        let mut step_times = Vec::with_capacity(scene.steps);
        let mut newton_total = 0u64;
        let mut pcg_total = 0u64;
        let mut stalled_steps = 0;
        let mut min_gap: Option<f64> = None;
        let mut max_penetrations = 0;
        let mut worst_quality = QualityLevel::Excellent;
        let progress_every = (scene.steps / PROGRESS_REPORTS).max(1);
        let total_start = Instant::now();

        for step in 0..scene.steps {
            let timestep = u32::try_from(step).unwrap_or(u32::MAX);
            let step_start = Instant::now();
            let dt = integrator.params().dt;
            self.emit(timestep, EventKind::TimestepBegin {
                sim_time: scene.state.time,
                dt,
            });

            scene.state.apply_gravity(scene.gravity, dt)?;
            let report = integrator.step(&scene.mesh, &mut scene.state, &scene.constraints)?;
            self.emit_report(timestep, &report);

            newton_total += u64::from(report.newton_iterations);
            pcg_total += report.total_pcg_iterations as u64;
            if report.stalled {
                stalled_steps += 1;
            }

            // Collision quality at the committed state.
            let params = integrator.params();
            let contacts =
                integrator.compute_contacts(&scene.mesh, &scene.state, &scene.constraints)?;
            let collision = CollisionValidator::compute_metrics(
                &scene.mesh,
                &scene.state,
                &contacts,
                params.contact_gap_max,
                params.enable_ccd,
            );
            if !contacts.is_empty() {
                min_gap = Some(min_gap.map_or(collision.min_gap, |g| g.min(collision.min_gap)));
            }
            max_penetrations = max_penetrations.max(collision.num_penetrations);
            worst_quality = worst_quality.max(collision.quality_level());
            self.emit(timestep, EventKind::ContactDetection {
                contact_count: contacts.len(),
                min_gap: collision.min_gap,
                max_penetration: collision.max_penetration,
            });
            self.emit(timestep, EventKind::CollisionQuality {
                level: collision.quality_level().name().to_string(),
                penetrations: collision.num_penetrations,
                max_penetration: collision.max_penetration,
            });

            let mut energy =
                EnergyTracker::compute(&scene.mesh, &scene.state, &scene.constraints, params)?;
            energy.update_drift(&previous_energy);
            self.emit_energy(timestep, &energy);
            previous_energy = energy;

            if let Some(adaptive) = scene.adaptive {
                let next = AdaptiveTimestep::compute_next_dt(
                    scene.state.velocities(),
                    &scene.mesh,
                    dt,
                    adaptive.dt_min,
                    adaptive.dt_max,
                    adaptive.safety,
                );
                if next <= 0.0 {
                    return Err(DrapeError::InvariantViolation(
                        "adaptive timestep collapsed to zero on a degenerate mesh".into(),
                    ));
                }
                if next != dt {
                    integrator.set_dt(next)?;
                    self.emit(timestep, EventKind::TimestepAdapted {
                        old_dt: dt,
                        new_dt: next,
                        max_velocity: AdaptiveTimestep::compute_max_velocity(
                            scene.state.velocities(),
                        ),
                    });
                }
            }

            if (step + 1) % record_every == 0 {
                if let Some(rec) = recording.as_deref_mut() {
                    rec.push_frame(timestep + 1, scene.state.time, scene.state.positions())?;
                }
            }

            let wall_time = step_start.elapsed().as_secs_f64();
            step_times.push(wall_time);
            self.emit(timestep, EventKind::TimestepEnd { wall_time });
            self.bus.flush();

            if (step + 1) % progress_every == 0 {
                info!(
                    scene = %scene.name,
                    step = step + 1,
                    sim_time = scene.state.time,
                    kinetic = previous_energy.kinetic_energy,
                    contacts = contacts.len(),
                    quality = ?collision.quality_level(),
                    "progress"
                );
            }
        }

        let total_wall_time = total_start.elapsed().as_secs_f64();
        let steps = scene.steps.max(1) as f64;
        let max_displacement = scene
            .state
            .positions()
            .iter()
            .zip(&initial_positions)
            .map(|(x, x0)| x.distance(*x0))
            .fold(0.0, f64::max);
        let mut final_energy = previous_energy;
        final_energy.update_drift(&initial_energy);

        let metrics = BenchmarkMetrics {
            scenario: scene.name.clone(),
            vertex_count: scene.mesh.num_vertices(),
            triangle_count: scene.mesh.num_triangles(),
            timesteps: scene.steps,
            total_wall_time,
            avg_step_time: step_times.iter().sum::<f64>() / steps,
            min_step_time: step_times.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max_step_time: step_times.iter().copied().fold(0.0, f64::max),
            step_times,
            avg_newton_iterations: newton_total as f64 / steps,
            avg_pcg_iterations: pcg_total as f64 / steps,
            stalled_steps,
            final_kinetic_energy: final_energy.kinetic_energy,
            max_displacement,
            min_gap,
            max_penetrations,
            worst_quality,
            energy_drift_percent: final_energy.energy_drift_percent,
            sim_time: scene.state.time,
        };

        info!(
            scene = %metrics.scenario,
            wall_time = metrics.total_wall_time,
            avg_newton = metrics.avg_newton_iterations,
            stalled = metrics.stalled_steps,
            worst_quality = ?metrics.worst_quality,
            "run finished"
        );
        Ok(metrics)
    }

    fn emit(&self, timestep: u32, kind: EventKind) {
        self.bus.emit(SimulationEvent::new(timestep, kind));
    }

    fn emit_report(&self, timestep: u32, report: &StepReport) {
        for it in &report.iterations {
            self.emit(timestep, EventKind::NewtonIteration {
                iteration: it.iteration,
                gradient_norm: it.gradient_norm,
                step_length: it.step_length,
                pcg_iterations: it.pcg_iterations,
                ccd_limited: it.ccd_limited,
            });
        }
        self.emit(timestep, EventKind::Convergence {
            newton_iterations: report.newton_iterations,
            pcg_iterations: report.total_pcg_iterations,
            final_gradient_norm: report.final_gradient_norm,
            converged: report.converged,
            stalled: report.stalled,
        });
        debug!(
            timestep,
            newton = report.newton_iterations,
            pcg = report.total_pcg_iterations,
            contacts = report.num_contacts,
            "step report"
        );
    }

    fn emit_energy(&self, timestep: u32, energy: &EnergyDiagnostics) {
        self.emit(timestep, EventKind::Energy {
            kinetic: energy.kinetic_energy,
            elastic: energy.elastic_energy,
            barrier: energy.barrier_energy,
            total: energy.total_energy,
            drift_percent: energy.energy_drift_percent,
        });
    }
}

impl Default for BenchmarkRunner {
    fn default() -> Self {
        Self::new()
    }
}
