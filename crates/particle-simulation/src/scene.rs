//! Seeded random initial conditions

use glam::Vec2;
use particle_physics::{Particle, PhysicsError, Result, DEFAULT_RADIUS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::params::WorldBounds;
use crate::system::ParticleSystem;

/// Closed interval `[min, max]` sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleRange {
    pub min: f32,
    pub max: f32,
}

impl SampleRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Degenerate range always yielding `value`.
    pub const fn constant(value: f32) -> Self {
        Self::new(value, value)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(PhysicsError::InvalidParam(format!(
                "{name} range [{}, {}] must be finite with min <= max",
                self.min, self.max
            )));
        }
        Ok(())
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.min == self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// Distribution of the initial particle population.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnParams {
    pub count: usize,
    /// Area the particles are spawned in; each disk is kept fully inside
    pub region: WorldBounds,
    pub velocity_x: SampleRange,
    pub velocity_y: SampleRange,
    pub mass: SampleRange,
    pub radius: SampleRange,
}

impl SpawnParams {
    pub fn validate(&self) -> Result<()> {
        self.velocity_x.validate("velocity x")?;
        self.velocity_y.validate("velocity y")?;
        self.mass.validate("mass")?;
        self.radius.validate("radius")?;

        if self.mass.min <= 0.0 {
            return Err(PhysicsError::InvalidMass(self.mass.min));
        }
        if self.radius.min <= 0.0 {
            return Err(PhysicsError::InvalidRadius(self.radius.min));
        }
        Ok(())
    }
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            count: 100,
            region: WorldBounds::default(),
            velocity_x: SampleRange::new(-20.0, 20.0),
            velocity_y: SampleRange::new(-20.0, 20.0),
            mass: SampleRange::new(0.5, 2.0),
            radius: SampleRange::constant(DEFAULT_RADIUS),
        }
    }
}

/// Sample `params.count` particles from `rng`.
///
/// Positions are drawn inside the region shrunk by each particle's radius. If a
/// particle is wider than the region on some axis it is centered on that axis.
/// Particles may overlap; the first step separates them.
pub fn spawn_particles<R: Rng>(params: &SpawnParams, rng: &mut R) -> Result<Vec<Particle>> {
    params.validate()?;

    let (min, max) = (params.region.min(), params.region.max());
    let center = params.region.center();
    let mut particles = Vec::with_capacity(params.count);

    for _ in 0..params.count {
        let mass = params.mass.sample(rng);
        let radius = params.radius.sample(rng);

        let mut position = center;
        for axis in 0..2 {
            let lo = min[axis] + radius;
            let hi = max[axis] - radius;
            if lo < hi {
                position[axis] = rng.random_range(lo..=hi);
            }
        }

        let velocity = Vec2::new(params.velocity_x.sample(rng), params.velocity_y.sample(rng));

        particles.push(
            Particle::new(position, mass)?
                .with_radius(radius)?
                .with_velocity(velocity)?,
        );
    }

    Ok(particles)
}

impl ParticleSystem {
    /// Build a collection from `params` with a deterministic seed.
    ///
    /// The same seed and parameters always produce the same collection.
    pub fn from_spawn(params: &SpawnParams, seed: u64) -> Result<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        let particles = spawn_particles(params, &mut rng)?;
        Ok(particles.into_iter().collect())
    }
}
