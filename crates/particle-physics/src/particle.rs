//! Point-mass disk particle and its integration rule

use glam::Vec2;

use crate::constants::DEFAULT_RADIUS;
use crate::error::{PhysicsError, Result};

/// A single body: a disk of `radius` carrying `mass` at `position`.
///
/// `mass` and `radius` are only settable through validated constructors, so
/// every live particle satisfies `mass > 0` and `radius > 0`. Position and
/// velocity are public because the engine corrects them in place during
/// boundary and collision handling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Center of the disk
    pub position: Vec2,
    /// Velocity vector
    pub velocity: Vec2,
    mass: f32,
    radius: f32,
    /// Acceleration applied by the last integration commit
    acceleration: Vec2,
}

impl Particle {
    /// Create a particle at rest with the default radius.
    pub fn new(position: Vec2, mass: f32) -> Result<Self> {
        if !mass.is_finite() || mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(mass));
        }
        if !position.is_finite() {
            return Err(PhysicsError::NonFinite("position"));
        }

        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            mass,
            radius: DEFAULT_RADIUS,
            acceleration: Vec2::ZERO,
        })
    }

    /// Override the radius.
    pub fn with_radius(mut self, radius: f32) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidRadius(radius));
        }
        self.radius = radius;
        Ok(self)
    }

    /// Override the initial velocity.
    pub fn with_velocity(mut self, velocity: Vec2) -> Result<Self> {
        if !velocity.is_finite() {
            return Err(PhysicsError::NonFinite("velocity"));
        }
        self.velocity = velocity;
        Ok(self)
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Acceleration consumed by the most recent [`Particle::integrate`] call.
    ///
    /// Zero until the first commit. Diagnostic only; the next step starts from
    /// a fresh accumulator regardless of this value.
    #[inline]
    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Kinetic energy: 1/2 m |v|²
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Linear momentum: m v
    #[inline]
    pub fn momentum(&self) -> Vec2 {
        self.velocity * self.mass
    }

    /// Commit one step of semi-implicit Euler integration.
    ///
    /// The velocity is updated first and the *new* velocity moves the
    /// position. Negative `delta_time` is treated as zero.
    pub fn integrate(&mut self, acceleration: Vec2, delta_time: f32) {
        let dt = delta_time.max(0.0);
        self.velocity += acceleration * dt;
        self.position += self.velocity * dt;
        self.acceleration = acceleration;
    }
}
