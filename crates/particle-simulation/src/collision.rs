//! Circle-circle narrow phase and impulse response

use particle_physics::Particle;

/// What [`resolve_collision`] did with an overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionOutcome {
    /// Centers coincide; no normal exists, nothing was changed
    Coincident,
    /// Pushed apart, but already separating so velocities were kept
    Separated,
    /// Pushed apart and an impulse of this magnitude was exchanged
    Resolved { impulse: f32 },
}

/// Two disks collide when their centers are closer than the sum of their
/// radii. Touching exactly is not a collision.
#[inline]
pub fn check_collision(a: &Particle, b: &Particle) -> bool {
    a.position.distance(b.position) < a.radius() + b.radius()
}

/// Separate an overlapping pair and exchange an impulse along the normal.
///
/// Each particle moves half the overlap along the normal from `a` to `b`,
/// independent of mass. The impulse uses `restitution` as the coefficient of
/// restitution and is only applied while the pair is approaching.
pub fn resolve_collision(a: &mut Particle, b: &mut Particle, restitution: f32) -> CollisionOutcome {
    let delta = b.position - a.position;
    let distance = delta.length();
    if distance == 0.0 {
        return CollisionOutcome::Coincident;
    }
    let normal = delta / distance;

    let overlap = (a.radius() + b.radius()) - distance;
    let separation = normal * (overlap * 0.5);
    a.position -= separation;
    b.position += separation;

    let relative_velocity = b.velocity - a.velocity;
    let velocity_along_normal = relative_velocity.dot(normal);
    if velocity_along_normal >= 0.0 {
        return CollisionOutcome::Separated;
    }

    let impulse = -(1.0 + restitution) * velocity_along_normal
        / (a.inverse_mass() + b.inverse_mass());
    let impulse_vector = normal * impulse;
    a.velocity -= impulse_vector * a.inverse_mass();
    b.velocity += impulse_vector * b.inverse_mass();

    CollisionOutcome::Resolved { impulse }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn disk(x: f32, y: f32, vx: f32, mass: f32) -> Particle {
        Particle::new(Vec2::new(x, y), mass)
            .unwrap()
            .with_radius(1.0)
            .unwrap()
            .with_velocity(Vec2::new(vx, 0.0))
            .unwrap()
    }

    #[test]
    fn test_touching_is_not_a_collision() {
        let a = disk(0.0, 0.0, 0.0, 1.0);
        let b = disk(2.0, 0.0, 0.0, 1.0);
        assert!(!check_collision(&a, &b));

        let c = disk(1.99, 0.0, 0.0, 1.0);
        assert!(check_collision(&a, &c));
    }

    #[test]
    fn test_coincident_centers_are_skipped() {
        let mut a = disk(1.0, 1.0, 1.0, 1.0);
        let mut b = disk(1.0, 1.0, -1.0, 1.0);
        let (before_a, before_b) = (a, b);

        assert_eq!(
            resolve_collision(&mut a, &mut b, 1.0),
            CollisionOutcome::Coincident
        );
        assert_eq!(a, before_a);
        assert_eq!(b, before_b);
    }

    #[test]
    fn test_elastic_equal_masses_swap_velocities() {
        let mut a = disk(-0.9, 0.0, 2.0, 1.0);
        let mut b = disk(0.9, 0.0, -2.0, 1.0);

        let outcome = resolve_collision(&mut a, &mut b, 1.0);

        assert_eq!(outcome, CollisionOutcome::Resolved { impulse: 4.0 });
        assert_relative_eq!(a.velocity.x, -2.0);
        assert_relative_eq!(b.velocity.x, 2.0);
        assert_relative_eq!(a.position.distance(b.position), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_separating_pair_keeps_velocities() {
        let mut a = disk(-0.5, 0.0, -1.0, 1.0);
        let mut b = disk(0.5, 0.0, 1.0, 1.0);

        assert_eq!(
            resolve_collision(&mut a, &mut b, 1.0),
            CollisionOutcome::Separated
        );
        assert_eq!(a.velocity.x, -1.0);
        assert_eq!(b.velocity.x, 1.0);
        assert_relative_eq!(a.position.x, -1.0, epsilon = 1e-6);
        assert_relative_eq!(b.position.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_heavier_particle_changes_less() {
        let mut light = disk(-0.9, 0.0, 1.0, 1.0);
        let mut heavy = disk(0.9, 0.0, 0.0, 4.0);

        resolve_collision(&mut light, &mut heavy, 1.0);

        let light_dv = (light.velocity.x - 1.0).abs();
        let heavy_dv = heavy.velocity.x.abs();
        assert_relative_eq!(light_dv, heavy_dv * 4.0, epsilon = 1e-5);
        // Momentum is conserved by the impulse exchange
        assert_relative_eq!(light.momentum().x + heavy.momentum().x, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_inelastic_pair_moves_together() {
        let mut a = disk(-0.9, 0.0, 2.0, 1.0);
        let mut b = disk(0.9, 0.0, -2.0, 1.0);

        resolve_collision(&mut a, &mut b, 0.0);

        assert_relative_eq!(a.velocity.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(b.velocity.x, 0.0, epsilon = 1e-6);
    }
}
