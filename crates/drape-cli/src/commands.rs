//! CLI command implementations.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;

use drape_bench::{BenchmarkMetrics, BenchmarkRunner, ScenarioKind};
use drape_debug::StateSnapshot;
use drape_io::{validate_file, FrameRecording, SceneConfig, ValidatedFile};
use drape_material::MaterialDatabase;
use drape_telemetry::{JsonLinesSink, TracingSink};
use drape_types::{DrapeError, DrapeResult};

/// Run a simulation from a scene file.
pub fn simulate(
    config_path: &Path,
    output: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    events: Option<PathBuf>,
) -> DrapeResult<()> {
    let config = SceneConfig::load(config_path)?;
    let mut scene = config.build()?;
    let recording_path = output.or_else(|| scene.output.recording.clone());
    let snapshot_path = snapshot.or_else(|| scene.output.snapshot.clone());

    println!("drape simulation");
    println!("────────────────");
    println!("Scene:     {} ({})", scene.name, config_path.display());
    println!(
        "Mesh:      {} verts, {} tris",
        scene.mesh.num_vertices(),
        scene.mesh.num_triangles()
    );
    println!(
        "Steps:     {} at dt = {:.2e}s{}",
        scene.steps,
        scene.params.dt,
        if scene.adaptive.is_some() { " (adaptive)" } else { "" }
    );
    println!();

    let mut runner = BenchmarkRunner::new();
    runner.bus_mut().add_sink(Box::new(TracingSink::new()));
    if let Some(path) = &events {
        let writer = BufWriter::new(File::create(path)?);
        runner.bus_mut().add_sink(Box::new(JsonLinesSink::new(writer)));
    }

    let mut recording = recording_path
        .as_ref()
        .map(|_| FrameRecording::new(scene.name.clone(), &scene.mesh));
    let metrics = runner.run(&mut scene, recording.as_mut())?;
    runner.bus_mut().finish();

    print_metrics(&metrics);

    if let (Some(path), Some(recording)) = (&recording_path, &recording) {
        recording.write_json(path)?;
        info!(path = %path.display(), frames = recording.num_frames(), "recording written");
        println!("Recording: {} ({} frames)", path.display(), recording.num_frames());
    }
    if let Some(path) = &snapshot_path {
        let timestep = u32::try_from(scene.steps).unwrap_or(u32::MAX);
        StateSnapshot::capture(timestep, &scene.state)?.save(path)?;
        info!(path = %path.display(), "snapshot written");
        println!("Snapshot:  {}", path.display());
    }
    if let Some(path) = &events {
        println!("Events:    {}", path.display());
    }
    Ok(())
}

/// Run benchmark scenarios.
pub fn benchmark(
    scenario_name: &str,
    output_path: Option<&Path>,
    material_name: Option<&str>,
) -> DrapeResult<()> {
    println!("drape benchmark suite");
    println!("═════════════════════");
    println!();

    if let Some(name) = material_name {
        let db = MaterialDatabase::with_defaults();
        if db.get(name).is_none() {
            return Err(DrapeError::InvalidMaterial(format!(
                "unknown material '{name}' (available: {})",
                db.names().join(", ")
            )));
        }
        println!("Material: {name}");
        println!();
    }

    let scenarios: Vec<ScenarioKind> = if scenario_name == "all" {
        ScenarioKind::all().to_vec()
    } else {
        vec![scenario_name.parse()?]
    };

    let mut runner = BenchmarkRunner::new();
    let mut all_metrics = Vec::with_capacity(scenarios.len());
    for kind in scenarios {
        let mut scene = kind.scene_with_material(material_name).build()?;
        println!(
            "Running: {} ({} verts, {} tris, {} steps)",
            kind.name(),
            scene.mesh.num_vertices(),
            scene.mesh.num_triangles(),
            scene.steps,
        );
        let metrics = runner.run(&mut scene, None)?;
        print_metrics(&metrics);
        all_metrics.push(metrics);
    }
    runner.bus_mut().finish();

    match output_path {
        Some(path) => {
            BenchmarkMetrics::write_csv(&all_metrics, path)?;
            println!("Results written to: {}", path.display());
        }
        None => {
            println!("CSV Output:");
            print!("{}", BenchmarkMetrics::to_csv(&all_metrics));
        }
    }
    Ok(())
}

fn print_metrics(metrics: &BenchmarkMetrics) {
    println!("  Wall time:     {:.3}s", metrics.total_wall_time);
    println!("  Avg step:      {:.3}ms", metrics.avg_step_time * 1000.0);
    println!("  Avg Newton:    {:.2}", metrics.avg_newton_iterations);
    println!("  Stalled steps: {}", metrics.stalled_steps);
    println!("  Final KE:      {:.6e}", metrics.final_kinetic_energy);
    println!("  Max displace:  {:.4}m", metrics.max_displacement);
    match metrics.min_gap {
        Some(gap) => println!("  Min gap:       {gap:.3e}m"),
        None => println!("  Min gap:       (no contacts)"),
    }
    println!("  Quality:       {}", metrics.worst_quality);
    println!("  Energy drift:  {:.3}%", metrics.energy_drift_percent);
    println!();
}

/// Inspect a state snapshot.
pub fn inspect(path: &Path) -> DrapeResult<()> {
    println!("drape snapshot inspector");
    println!("────────────────────────");
    println!();

    let snapshot = StateSnapshot::load(path)?;
    let summary = snapshot.summary();

    println!("Version:      {}", snapshot.version);
    println!("Timestep:     {}", snapshot.timestep);
    println!("Sim time:     {:.4}s", snapshot.sim_time);
    println!("Vertices:     {}", summary.vertex_count);
    if summary.vertex_count > 0 {
        let (lo, hi) = (summary.bbox_min, summary.bbox_max);
        println!("BBox min:     [{:.4}, {:.4}, {:.4}]", lo.x, lo.y, lo.z);
        println!("BBox max:     [{:.4}, {:.4}, {:.4}]", hi.x, hi.y, hi.z);
        println!("Max speed:    {:.4e} m/s", summary.max_speed);
        println!("Mean speed:   {:.4e} m/s", summary.mean_speed);
    }
    Ok(())
}

/// Validate a scene or recording.
pub fn validate(path: &Path) -> DrapeResult<()> {
    println!("drape validator");
    println!("───────────────");
    println!();

    match validate_file(path)? {
        ValidatedFile::Scene {
            name,
            vertices,
            triangles,
            pins,
            walls,
            steps,
        } => println!(
            "✅ Scene '{name}' is valid ({vertices} verts, {triangles} tris, {pins} pins, {walls} walls, {steps} steps)."
        ),
        ValidatedFile::Recording {
            name,
            vertices,
            frames,
        } => println!("✅ Recording '{name}' is valid ({vertices} verts, {frames} frames)."),
    }
    Ok(())
}
