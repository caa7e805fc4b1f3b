//! Per-step physics pipeline
//!
//! A step runs four phases in a fixed order, each depending on state left by
//! the previous one:
//!
//! 1. global forces (gravity, air drag) into a fresh [`ForceAccumulator`]
//! 2. boundary confinement (position clamp, damped velocity reflection)
//! 3. pairwise collision resolution, sequential and in place
//! 4. integration commit through [`ParticleSystem::advance`]
//!
//! NOTE: phase 3 is a brute-force scan over every unordered pair `(i, j)`,
//! `i < j`. Pairs are resolved one after another against the current state,
//! so a particle hit twice in one step sees the result of its first contact.
//! Results for dense overlapping clusters therefore depend on particle order.

use glam::Vec2;
use particle_physics::{drag_force, gravity_force, ForceAccumulator, PhysicsError, Result};

use crate::collision::{check_collision, resolve_collision, CollisionOutcome};
use crate::params::{validate_air_resistance, validate_damping, PhysicsParams, WorldBounds};
use crate::system::ParticleSystem;

/// Counters describing what a single step did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Per-axis wall corrections
    pub wall_contacts: usize,
    /// Overlapping pairs found
    pub collisions: usize,
    /// Pairs that exchanged an impulse
    pub impulses: usize,
    /// Pairs skipped because their centers coincided
    pub coincident: usize,
}

impl std::ops::AddAssign for StepStats {
    fn add_assign(&mut self, other: Self) {
        self.wall_contacts += other.wall_contacts;
        self.collisions += other.collisions;
        self.impulses += other.impulses;
        self.coincident += other.coincident;
    }
}

/// Stateless physics engine; holds only global configuration.
#[derive(Debug, Clone, Default)]
pub struct PhysicsEngine {
    params: PhysicsParams,
}

impl PhysicsEngine {
    pub fn new(params: PhysicsParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PhysicsParams {
        &self.params
    }

    /// Replace the whole configuration. Takes effect on the next step.
    pub fn set_params(&mut self, params: PhysicsParams) -> Result<()> {
        params.validate()?;
        self.params = params;
        Ok(())
    }

    pub fn set_gravity(&mut self, gravity: Vec2) -> Result<()> {
        if !gravity.is_finite() {
            return Err(PhysicsError::NonFinite("gravity"));
        }
        self.params.gravity = gravity;
        Ok(())
    }

    pub fn set_air_resistance(&mut self, air_resistance: f32) -> Result<()> {
        validate_air_resistance(air_resistance)?;
        self.params.air_resistance = air_resistance;
        Ok(())
    }

    pub fn set_damping(&mut self, damping: f32) -> Result<()> {
        validate_damping(damping)?;
        self.params.damping = damping;
        Ok(())
    }

    /// Advance `system` by one step of `delta_time` inside `bounds`.
    ///
    /// Fails only if `delta_time` is negative or not finite, in which case no
    /// particle is touched.
    pub fn step(
        &self,
        system: &mut ParticleSystem,
        delta_time: f32,
        bounds: &WorldBounds,
    ) -> Result<StepStats> {
        let forces = system.force_accumulator();
        self.step_with_forces(system, forces, delta_time, bounds)
    }

    /// Same as [`PhysicsEngine::step`], starting from an accumulator the caller
    /// has already loaded with external forces.
    pub fn step_with_forces(
        &self,
        system: &mut ParticleSystem,
        mut forces: ForceAccumulator,
        delta_time: f32,
        bounds: &WorldBounds,
    ) -> Result<StepStats> {
        if !delta_time.is_finite() || delta_time < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(delta_time));
        }
        if forces.len() != system.len() {
            return Err(PhysicsError::InvalidParam(format!(
                "force accumulator holds {} slots for {} particles",
                forces.len(),
                system.len()
            )));
        }

        // Phase 1: global forces
        self.apply_gravity(system, &mut forces);
        self.apply_air_resistance(system, &mut forces);

        // Phase 2: walls
        let wall_contacts = self.apply_boundary_constraints(system, bounds);

        // Phase 3: pairwise collisions
        let mut stats = self.handle_collisions(system);
        stats.wall_contacts = wall_contacts;

        // Phase 4: commit
        system.advance(forces, delta_time);

        log::trace!(
            "step dt={:.4}: {} walls, {} collisions ({} impulses, {} coincident)",
            delta_time,
            stats.wall_contacts,
            stats.collisions,
            stats.impulses,
            stats.coincident
        );

        Ok(stats)
    }

    /// Gravity: F = m * g on every particle
    pub fn apply_gravity(&self, system: &ParticleSystem, forces: &mut ForceAccumulator) {
        for (i, particle) in system.iter().enumerate() {
            forces.apply_force(i, particle, gravity_force(particle, self.params.gravity));
        }
    }

    /// Quadratic drag on every moving particle
    pub fn apply_air_resistance(&self, system: &ParticleSystem, forces: &mut ForceAccumulator) {
        if self.params.air_resistance == 0.0 {
            return;
        }
        for (i, particle) in system.iter().enumerate() {
            forces.apply_force(i, particle, drag_force(particle, self.params.air_resistance));
        }
    }

    /// Apply the same force to every particle (acceleration varies with mass).
    pub fn apply_global_force(
        &self,
        system: &ParticleSystem,
        forces: &mut ForceAccumulator,
        force: Vec2,
    ) {
        for (i, particle) in system.iter().enumerate() {
            forces.apply_force(i, particle, force);
        }
    }

    /// Clamp every particle inside `bounds` and reflect the offending velocity
    /// component, damped. Returns the number of axis corrections made.
    ///
    /// Each axis is handled independently, so a particle in a corner is
    /// corrected once per axis.
    pub fn apply_boundary_constraints(
        &self,
        system: &mut ParticleSystem,
        bounds: &WorldBounds,
    ) -> usize {
        let damping = self.params.damping;
        let (min, max) = (bounds.min(), bounds.max());
        let mut contacts = 0;

        for particle in system.particles_mut() {
            let radius = particle.radius();

            for axis in 0..2 {
                if particle.position[axis] - radius < min[axis] {
                    particle.position[axis] = min[axis] + radius;
                    particle.velocity[axis] = -particle.velocity[axis] * damping;
                    contacts += 1;
                }
                if particle.position[axis] + radius > max[axis] {
                    particle.position[axis] = max[axis] - radius;
                    particle.velocity[axis] = -particle.velocity[axis] * damping;
                    contacts += 1;
                }
            }
        }

        contacts
    }

    /// Test every unordered pair in sequence order and resolve overlaps in
    /// place, using the damping factor as restitution.
    pub fn handle_collisions(&self, system: &mut ParticleSystem) -> StepStats {
        let restitution = self.params.damping;
        let particles = system.particles_mut();
        let mut stats = StepStats::default();

        for i in 0..particles.len() {
            let (head, tail) = particles.split_at_mut(i + 1);
            let a = &mut head[i];

            for (offset, b) in tail.iter_mut().enumerate() {
                if !check_collision(a, b) {
                    continue;
                }
                stats.collisions += 1;

                match resolve_collision(a, b, restitution) {
                    CollisionOutcome::Resolved { .. } => stats.impulses += 1,
                    CollisionOutcome::Separated => {}
                    CollisionOutcome::Coincident => {
                        stats.coincident += 1;
                        log::debug!(
                            "particles {} and {} share a center, skipping",
                            i,
                            i + 1 + offset
                        );
                    }
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use particle_physics::Particle;

    fn disk(position: Vec2, velocity: Vec2) -> Particle {
        Particle::new(position, 1.0)
            .unwrap()
            .with_radius(1.0)
            .unwrap()
            .with_velocity(velocity)
            .unwrap()
    }

    fn box_of(half_extent: f32) -> WorldBounds {
        WorldBounds::centered(half_extent).unwrap()
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        let params = PhysicsParams {
            damping: -0.1,
            ..Default::default()
        };
        assert!(PhysicsEngine::new(params).is_err());

        let mut engine = PhysicsEngine::default();
        assert!(engine.set_damping(2.0).is_err());
        assert!(engine.set_air_resistance(-1.0).is_err());
        assert!(engine.set_gravity(Vec2::new(0.0, f32::INFINITY)).is_err());
        // Failed setters leave the configuration untouched
        assert_eq!(*engine.params(), PhysicsParams::default());

        engine.set_damping(0.5).unwrap();
        engine.set_air_resistance(0.0).unwrap();
        engine.set_gravity(Vec2::new(1.0, 0.0)).unwrap();
        assert_eq!(engine.params().damping, 0.5);
        assert_eq!(engine.params().air_resistance, 0.0);
        assert_eq!(engine.params().gravity, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_rejects_negative_time_step_without_mutation() {
        let engine = PhysicsEngine::default();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::ZERO, Vec2::new(1.0, 0.0)));
        let before = system.clone();

        assert_eq!(
            engine.step(&mut system, -0.1, &box_of(10.0)),
            Err(PhysicsError::InvalidTimeStep(-0.1))
        );
        assert!(engine.step(&mut system, f32::NAN, &box_of(10.0)).is_err());
        assert_eq!(system, before);
    }

    #[test]
    fn test_zero_time_step_leaves_positions() {
        let engine = PhysicsEngine::default();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::new(1.0, 2.0), Vec2::new(3.0, 0.0)));

        engine.step(&mut system, 0.0, &box_of(10.0)).unwrap();

        assert_eq!(system.particles()[0].position, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_gravity_is_mass_independent() {
        let engine = PhysicsEngine::new(PhysicsParams {
            gravity: Vec2::new(0.0, -10.0),
            air_resistance: 0.0,
            damping: 1.0,
        })
        .unwrap();

        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::new(-5.0, 0.0), Vec2::ZERO));
        system.add_particle(
            Particle::new(Vec2::new(5.0, 0.0), 50.0)
                .unwrap()
                .with_radius(1.0)
                .unwrap(),
        );

        engine.step(&mut system, 0.1, &box_of(100.0)).unwrap();

        let [light, heavy] = [system.particles()[0], system.particles()[1]];
        assert_relative_eq!(light.velocity.y, -1.0, epsilon = 1e-6);
        assert_relative_eq!(heavy.velocity.y, light.velocity.y, epsilon = 1e-6);
        assert_relative_eq!(heavy.acceleration().y, -10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_air_resistance_slows_particle() {
        let engine = PhysicsEngine::new(PhysicsParams {
            gravity: Vec2::ZERO,
            air_resistance: 0.5,
            damping: 1.0,
        })
        .unwrap();

        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::ZERO, Vec2::new(2.0, 0.0)));

        engine.step(&mut system, 0.1, &box_of(100.0)).unwrap();

        // a = -0.5 * 4 = -2, v = 2 - 0.2
        let p = system.particles()[0];
        assert_relative_eq!(p.velocity.x, 1.8, epsilon = 1e-6);
        assert_eq!(p.velocity.y, 0.0);
    }

    #[test]
    fn test_global_force_scales_with_inverse_mass() {
        let engine = PhysicsEngine::new(PhysicsParams::frictionless()).unwrap();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::new(-10.0, 0.0), Vec2::ZERO));
        system.add_particle(
            Particle::new(Vec2::new(10.0, 0.0), 2.0)
                .unwrap()
                .with_radius(1.0)
                .unwrap(),
        );

        let mut forces = system.force_accumulator();
        engine.apply_global_force(&system, &mut forces, Vec2::new(4.0, 0.0));
        engine
            .step_with_forces(&mut system, forces, 1.0, &box_of(100.0))
            .unwrap();

        assert_relative_eq!(system.particles()[0].velocity.x, 4.0);
        assert_relative_eq!(system.particles()[1].velocity.x, 2.0);
    }

    #[test]
    fn test_step_with_forces_rejects_wrong_size() {
        let engine = PhysicsEngine::default();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::ZERO, Vec2::ZERO));

        let result =
            engine.step_with_forces(&mut system, ForceAccumulator::new(3), 0.1, &box_of(10.0));
        assert!(matches!(result, Err(PhysicsError::InvalidParam(_))));
    }

    #[test]
    fn test_boundary_clamps_and_reflects() {
        let engine = PhysicsEngine::new(PhysicsParams {
            damping: 0.5,
            ..PhysicsParams::frictionless()
        })
        .unwrap();

        let mut system = ParticleSystem::new();
        // Past the right wall and below the floor at once
        system.add_particle(disk(Vec2::new(9.5, -9.8), Vec2::new(4.0, -2.0)));

        let contacts = engine.apply_boundary_constraints(&mut system, &box_of(10.0));

        let p = system.particles()[0];
        assert_eq!(contacts, 2);
        assert_eq!(p.position, Vec2::new(9.0, -9.0));
        assert_eq!(p.velocity, Vec2::new(-2.0, 1.0));
    }

    #[test]
    fn test_boundary_leaves_interior_particles() {
        let engine = PhysicsEngine::default();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::new(8.0, 0.0), Vec2::new(5.0, 5.0)));
        let before = system.clone();

        assert_eq!(engine.apply_boundary_constraints(&mut system, &box_of(10.0)), 0);
        assert_eq!(system, before);
    }

    #[test]
    fn test_collision_counts() {
        let engine = PhysicsEngine::new(PhysicsParams::frictionless()).unwrap();
        let mut system = ParticleSystem::new();
        system.add_particle(disk(Vec2::new(-0.5, 0.0), Vec2::new(1.0, 0.0)));
        system.add_particle(disk(Vec2::new(0.5, 0.0), Vec2::new(-1.0, 0.0)));
        system.add_particle(disk(Vec2::new(20.0, 20.0), Vec2::ZERO));
        system.add_particle(disk(Vec2::new(20.0, 20.0), Vec2::ZERO));

        let stats = engine.handle_collisions(&mut system);

        assert_eq!(
            stats,
            StepStats {
                wall_contacts: 0,
                collisions: 2,
                impulses: 1,
                coincident: 1,
            }
        );
        // The coincident pair is left where it was
        assert_eq!(system.particles()[2].position, Vec2::new(20.0, 20.0));
        assert_eq!(system.particles()[3].position, Vec2::new(20.0, 20.0));
    }

    #[test]
    fn test_sequential_resolution_uses_updated_state() {
        let engine = PhysicsEngine::new(PhysicsParams::frictionless()).unwrap();
        let mut system = ParticleSystem::new();
        // Middle particle overlaps both neighbours; the second pair sees the
        // velocity the first pair handed over.
        system.add_particle(disk(Vec2::new(-1.9, 0.0), Vec2::new(1.0, 0.0)));
        system.add_particle(disk(Vec2::new(0.0, 0.0), Vec2::ZERO));
        system.add_particle(disk(Vec2::new(1.9, 0.0), Vec2::ZERO));

        let stats = engine.handle_collisions(&mut system);

        assert_eq!(stats.impulses, 2);
        let v: Vec<f32> = system.iter().map(|p| p.velocity.x).collect();
        assert_relative_eq!(v[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut total = StepStats::default();
        total += StepStats {
            wall_contacts: 1,
            collisions: 2,
            impulses: 1,
            coincident: 0,
        };
        total += StepStats {
            wall_contacts: 2,
            collisions: 0,
            impulses: 0,
            coincident: 1,
        };
        assert_eq!(total.wall_contacts, 3);
        assert_eq!(total.collisions, 2);
        assert_eq!(total.coincident, 1);
    }
}
