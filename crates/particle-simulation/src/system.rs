//! Ordered particle collection

use glam::Vec2;
use particle_physics::{ForceAccumulator, Particle};

/// Insertion-ordered set of particles owned by value.
///
/// Order is stable and meaningful for export, never for physics. The
/// collection applies no forces of its own; it only commits integration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Append a particle at the end of the sequence.
    pub fn add_particle(&mut self, particle: Particle) {
        self.particles.push(particle);
    }

    /// Read view over all particles in insertion order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// In-place access for per-particle physics updates.
    ///
    /// A slice cannot be resized, so callers cannot add or drop particles
    /// through it.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Zeroed accumulator with one slot per particle.
    pub fn force_accumulator(&self) -> ForceAccumulator {
        ForceAccumulator::new(self.particles.len())
    }

    /// Integrate every particle, in sequence order, with its accumulated
    /// acceleration. The accumulator is consumed.
    ///
    /// Panics if `forces` was sized for a different number of particles.
    pub fn advance(&mut self, forces: ForceAccumulator, delta_time: f32) {
        assert_eq!(
            forces.len(),
            self.particles.len(),
            "force accumulator does not match particle count"
        );

        for (particle, acceleration) in self.particles.iter_mut().zip(forces) {
            particle.integrate(acceleration, delta_time);
        }
    }

    /// Total kinetic energy
    pub fn kinetic_energy(&self) -> f32 {
        self.particles.iter().map(Particle::kinetic_energy).sum()
    }

    /// Total linear momentum
    pub fn momentum(&self) -> Vec2 {
        self.particles.iter().map(Particle::momentum).sum()
    }
}

impl FromIterator<Particle> for ParticleSystem {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        Self {
            particles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParticleSystem {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}
