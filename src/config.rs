//! Run configuration: JSON file plus command-line overrides
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. Example:
//!
//! ```json
//! {
//!   "physics": { "gravity": [0.0, -9.81], "air_resistance": 0.01, "damping": 0.8 },
//!   "world":   { "min": [-100.0, -100.0], "max": [100.0, 100.0] },
//!   "spawn":   { "count": 100, "seed": 42, "mass": [0.5, 2.0], "radius": [5.0, 5.0] },
//!   "run":     { "frames": 300, "target_fps": 60.0, "physics_rate": 100 }
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use particle_physics::{
    AIR_RESISTANCE, COLLISION_DAMPING, DEFAULT_RADIUS, GRAVITY, PHYSICS_STEPS_PER_SECOND,
    TARGET_FPS, WORLD_HALF_EXTENT,
};
use particle_simulation::{PhysicsParams, SampleRange, SpawnParams, WorldBounds};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(about = "Headless 2D particle simulation")]
pub struct Args {
    /// JSON run configuration
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of frames to simulate
    #[arg(short, long)]
    pub frames: Option<u64>,

    /// Number of particles to spawn
    #[arg(short = 'n', long)]
    pub particles: Option<usize>,

    /// Seed for the initial distribution
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Write captured frames to this JSON file
    #[arg(short, long)]
    pub export: Option<PathBuf>,

    /// Write the performance profile to this JSON file
    #[arg(short, long)]
    pub profile: Option<PathBuf>,

    /// Pace frames to the target frame rate instead of running flat out
    #[arg(long)]
    pub realtime: bool,
}

impl Args {
    /// Load the configuration file (if any) and apply overrides.
    pub fn resolve(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(frames) = self.frames {
            config.run.frames = frames;
        }
        if let Some(count) = self.particles {
            config.spawn.count = count;
        }
        if self.seed.is_some() {
            config.spawn.seed = self.seed;
        }
        if self.export.is_some() {
            config.run.export = self.export.clone();
        }
        if self.profile.is_some() {
            config.run.profile = self.profile.clone();
        }
        config.run.realtime |= self.realtime;

        Ok(config)
    }
}

#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub physics: PhysicsConfig,
    pub world: WorldConfig,
    pub spawn: SpawnConfig,
    pub run: LoopConfig,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    pub gravity: [f32; 2],
    pub air_resistance: f32,
    pub damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -GRAVITY],
            air_resistance: AIR_RESISTANCE,
            damping: COLLISION_DAMPING,
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            min: [-WORLD_HALF_EXTENT; 2],
            max: [WORLD_HALF_EXTENT; 2],
        }
    }
}

/// Initial distribution; each range is `[min, max]`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnConfig {
    pub count: usize,
    /// Random when absent
    pub seed: Option<u64>,
    pub velocity_x: [f32; 2],
    pub velocity_y: [f32; 2],
    pub mass: [f32; 2],
    pub radius: [f32; 2],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed: None,
            velocity_x: [-20.0, 20.0],
            velocity_y: [-20.0, 20.0],
            mass: [0.5, 2.0],
            radius: [DEFAULT_RADIUS; 2],
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    pub frames: u64,
    pub target_fps: f32,
    /// Physics steps per simulated second
    pub physics_rate: u32,
    pub max_steps_per_frame: u32,
    pub realtime: bool,
    /// Frames between progress log lines
    pub log_interval: u64,
    pub export: Option<PathBuf>,
    /// Frames between captures when exporting
    pub capture_interval: u64,
    pub max_export_frames: usize,
    pub profile: Option<PathBuf>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            frames: 300,
            target_fps: TARGET_FPS,
            physics_rate: PHYSICS_STEPS_PER_SECOND,
            max_steps_per_frame: 8,
            realtime: false,
            log_interval: 60,
            export: None,
            capture_interval: 1,
            max_export_frames: 1000,
            profile: None,
        }
    }
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open config {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn physics_params(&self) -> PhysicsParams {
        PhysicsParams {
            gravity: Vec2::from_array(self.physics.gravity),
            air_resistance: self.physics.air_resistance,
            damping: self.physics.damping,
        }
    }

    pub fn world_bounds(&self) -> Result<WorldBounds> {
        WorldBounds::new(
            Vec2::from_array(self.world.min),
            Vec2::from_array(self.world.max),
        )
        .context("invalid world bounds")
    }

    /// Spawn inside the whole world.
    pub fn spawn_params(&self, region: WorldBounds) -> SpawnParams {
        let range = |[min, max]: [f32; 2]| SampleRange::new(min, max);

        SpawnParams {
            count: self.spawn.count,
            region,
            velocity_x: range(self.spawn.velocity_x),
            velocity_y: range(self.spawn.velocity_y),
            mass: range(self.spawn.mass),
            radius: range(self.spawn.radius),
        }
    }

    /// Seconds per rendered frame.
    pub fn frame_time(&self) -> Result<f32> {
        let fps = self.run.target_fps;
        if !fps.is_finite() || fps <= 0.0 {
            anyhow::bail!("target fps {fps} must be finite and > 0");
        }

        let frame_time = 1.0 / fps;
        if !frame_time.is_finite() {
            anyhow::bail!("target fps {fps} is too small to give a finite frame time");
        }
        Ok(frame_time)
    }
}
