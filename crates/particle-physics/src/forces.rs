//! Global force laws and the per-step force accumulator

use glam::Vec2;

use crate::particle::Particle;

/// Uniform gravitational field.
/// F = m * g, so every particle sees the same acceleration regardless of mass.
#[inline]
pub fn gravity_force(particle: &Particle, gravity: Vec2) -> Vec2 {
    gravity * particle.mass()
}

/// Quadratic air drag opposing the velocity.
/// F = -k * |v|² * v̂
///
/// A particle at rest receives no drag.
pub fn drag_force(particle: &Particle, coefficient: f32) -> Vec2 {
    let speed = particle.speed();
    if speed <= 0.0 {
        return Vec2::ZERO;
    }

    -(particle.velocity / speed) * coefficient * speed * speed
}

/// Accelerations accumulated for one step, one slot per particle.
///
/// Built zeroed at the start of a step, filled by force application and then
/// consumed by value by the integration commit, so nothing carries over into
/// the next step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ForceAccumulator {
    accelerations: Vec<Vec2>,
}

impl ForceAccumulator {
    /// Zeroed accumulator for `len` particles.
    pub fn new(len: usize) -> Self {
        Self {
            accelerations: vec![Vec2::ZERO; len],
        }
    }

    pub fn len(&self) -> usize {
        self.accelerations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accelerations.is_empty()
    }

    /// Newton's second law: add `force / mass` to the slot of `particle`.
    ///
    /// Panics if `index` is out of range, like slice indexing.
    #[inline]
    pub fn apply_force(&mut self, index: usize, particle: &Particle, force: Vec2) {
        self.accelerations[index] += force * particle.inverse_mass();
    }

    /// Add an acceleration directly, bypassing the mass.
    #[inline]
    pub fn apply_acceleration(&mut self, index: usize, acceleration: Vec2) {
        self.accelerations[index] += acceleration;
    }

    /// Accumulated acceleration for `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Vec2 {
        self.accelerations[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.accelerations.iter().copied()
    }

    pub fn into_inner(self) -> Vec<Vec2> {
        self.accelerations
    }
}

impl IntoIterator for ForceAccumulator {
    type Item = Vec2;
    type IntoIter = std::vec::IntoIter<Vec2>;

    fn into_iter(self) -> Self::IntoIter {
        self.accelerations.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn particle(mass: f32, velocity: Vec2) -> Particle {
        Particle::new(Vec2::ZERO, mass)
            .unwrap()
            .with_velocity(velocity)
            .unwrap()
    }

    #[test]
    fn test_gravity_scales_with_mass() {
        let g = Vec2::new(0.0, -9.81);
        let light = particle(1.0, Vec2::ZERO);
        let heavy = particle(4.0, Vec2::ZERO);

        assert_eq!(gravity_force(&light, g), g);
        assert_eq!(gravity_force(&heavy, g), g * 4.0);

        let mut forces = ForceAccumulator::new(2);
        forces.apply_force(0, &light, gravity_force(&light, g));
        forces.apply_force(1, &heavy, gravity_force(&heavy, g));
        assert_relative_eq!(forces.get(0).y, forces.get(1).y);
    }

    #[test]
    fn test_drag_opposes_velocity_quadratically() {
        let p = particle(1.0, Vec2::new(3.0, 4.0));
        let f = drag_force(&p, 0.1);

        // |v| = 5, |F| = 0.1 * 25 = 2.5, direction -(0.6, 0.8)
        assert_relative_eq!(f.x, -1.5, epsilon = 1e-6);
        assert_relative_eq!(f.y, -2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_no_drag_at_rest() {
        let p = particle(1.0, Vec2::ZERO);
        assert_eq!(drag_force(&p, 10.0), Vec2::ZERO);
    }

    #[test]
    fn test_forces_accumulate_additively() {
        let p = particle(2.0, Vec2::ZERO);
        let mut forces = ForceAccumulator::new(1);

        forces.apply_force(0, &p, Vec2::new(2.0, 0.0));
        forces.apply_force(0, &p, Vec2::new(0.0, -4.0));
        forces.apply_acceleration(0, Vec2::new(1.0, 1.0));

        assert_eq!(forces.get(0), Vec2::new(2.0, -1.0));
        assert_eq!(forces.into_inner(), vec![Vec2::new(2.0, -1.0)]);
    }
}
