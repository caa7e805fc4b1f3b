//! Headless 2D particle simulation
//!
//! Spawns a seeded box of disks, steps them at a fixed physics rate and
//! optionally records frames and timings to JSON.

mod config;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use config::{Args, RunConfig};
use particle_capture::{
    build_instances, instance_bytes, JsonExporter, ParticleInstance, Profiler,
};
use particle_physics::Particle;
use particle_simulation::{FixedTimestep, ParticleSystem, PhysicsEngine, StepStats};

/// Particles included in the startup and progress logs
const LOGGED_PARTICLES: usize = 3;

fn initialize_particles(config: &RunConfig) -> Result<(ParticleSystem, u64)> {
    let bounds = config.world_bounds()?;
    let spawn = config.spawn_params(bounds);
    let seed = config.spawn.seed.unwrap_or_else(rand::random);

    let system = ParticleSystem::from_spawn(&spawn, seed).context("failed to spawn particles")?;

    log::info!("✓ Initialized {} particles (seed {})", system.len(), seed);
    log::info!(
        "  Particle struct size: {} bytes, instance size: {} bytes",
        std::mem::size_of::<Particle>(),
        std::mem::size_of::<ParticleInstance>()
    );
    log::info!(
        "  Instance buffer: {} bytes",
        instance_bytes(&build_instances(&system, &bounds)).len()
    );
    log::info!("  First {} particles:", LOGGED_PARTICLES.min(system.len()));
    log_particles(&system, log::Level::Info);

    Ok((system, seed))
}

fn log_particles(system: &ParticleSystem, level: log::Level) {
    for (i, p) in system.iter().take(LOGGED_PARTICLES).enumerate() {
        log::log!(
            level,
            "    [{}] pos=({:.2}, {:.2}), vel=({:.2}, {:.2}), mass={:.2}, radius={:.2}",
            i,
            p.position.x,
            p.position.y,
            p.velocity.x,
            p.velocity.y,
            p.mass(),
            p.radius()
        );
    }
}

fn run(config: &RunConfig) -> Result<()> {
    let engine =
        PhysicsEngine::new(config.physics_params()).context("invalid physics configuration")?;
    let bounds = config.world_bounds()?;
    let frame_time = config.frame_time()?;
    let run = &config.run;

    let (mut system, seed) = initialize_particles(config)?;
    let mut clock = FixedTimestep::new(run.physics_rate, run.max_steps_per_frame)
        .context("invalid physics rate")?;
    log::info!("✓ Simulation initialized ({} steps/s)", run.physics_rate);

    let mut exporter = run.export.as_ref().map(|_| {
        let mut exporter = JsonExporter::with_max_frames(run.max_export_frames);
        exporter.add_custom_data("seed", seed);
        exporter.add_custom_data("physics_rate", run.physics_rate);
        exporter.add_custom_data("damping", config.physics.damping);
        exporter
    });

    let mut profiler = Profiler::new();
    profiler.set_target_fps(run.target_fps);
    profiler.set_target_physics_steps(run.physics_rate);

    let frame_budget =
        Duration::try_from_secs_f32(frame_time).context("frame time out of range")?;
    let log_interval = run.log_interval.max(1);
    let capture_interval = run.capture_interval.max(1);
    let mut totals = StepStats::default();
    let mut sim_time = 0.0f64;
    let started = Instant::now();

    for frame in 0..run.frames {
        let frame_start = Instant::now();
        profiler.begin_frame();

        let steps = clock.advance(frame_time)?;
        {
            let _timer = profiler.scope("physics");
            for _ in 0..steps {
                totals += engine.step(&mut system, clock.step(), &bounds)?;
            }
        }
        sim_time += f64::from(clock.step()) * f64::from(steps);
        profiler.update_physics_steps(steps);
        profiler.update_particle_count(system.len());

        if let Some(exporter) = exporter.as_mut() {
            if frame % capture_interval == 0 {
                let fps = profiler.current_fps();
                let _timer = profiler.scope("capture");
                exporter.capture_frame(&system, sim_time, frame, fps);
            }
        }

        if frame > 0 && frame % log_interval == 0 {
            log::info!(
                "t={:.2}s frame={} energy={:.2} contacts={} collisions={}",
                sim_time,
                frame,
                system.kinetic_energy(),
                totals.wall_contacts,
                totals.collisions
            );
            log_particles(&system, log::Level::Debug);
        }

        if run.realtime {
            if let Some(remaining) = frame_budget.checked_sub(frame_start.elapsed()) {
                std::thread::sleep(remaining);
            }
        }

        profiler.end_frame();
        let frame_ms = profiler.last_frame_ms();
        if frame_ms > 0.0 {
            profiler.update_fps((1000.0 / frame_ms) as f32);
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "✓ Simulated {} frames ({:.2}s simulated, {} physics steps) in {:.2?}",
        run.frames,
        sim_time,
        clock.total_steps(),
        elapsed
    );
    log::info!(
        "  wall contacts={}, collisions={}, impulses={}, coincident={}",
        totals.wall_contacts,
        totals.collisions,
        totals.impulses,
        totals.coincident
    );
    log_particles(&system, log::Level::Info);

    if let (Some(exporter), Some(path)) = (exporter.as_ref(), run.export.as_ref()) {
        log::info!(
            "  captured {} frames (~{:.2} MB/h)",
            exporter.frame_count(),
            exporter.data_rate_mb_per_hour()
        );
        exporter
            .export_to_file(path)
            .with_context(|| format!("failed to export frames to {}", path.display()))?;
    }

    for line in profiler.report().lines() {
        log::info!("{line}");
    }
    if let Some(path) = run.profile.as_ref() {
        profiler
            .export_to_file(path)
            .with_context(|| format!("failed to write profile to {}", path.display()))?;
    }

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logger (RUST_LOG=debug for per-particle progress)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = args.resolve()?;

    log::info!("Starting 2D particle simulation...");
    run(&config)
}
