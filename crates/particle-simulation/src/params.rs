//! Physics parameters and world bounds

use glam::Vec2;
use particle_physics::{
    PhysicsError, Result, AIR_RESISTANCE, COLLISION_DAMPING, GRAVITY, WORLD_HALF_EXTENT,
};

/// Global physics configuration held by the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParams {
    /// Uniform acceleration field applied to every particle
    pub gravity: Vec2,
    /// Quadratic drag coefficient (>= 0)
    pub air_resistance: f32,
    /// Restitution for walls and collisions, in [0, 1]
    pub damping: f32,
}

impl PhysicsParams {
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::NonFinite("gravity"));
        }
        validate_air_resistance(self.air_resistance)?;
        validate_damping(self.damping)
    }

    /// No gravity, no drag, perfectly elastic.
    pub fn frictionless() -> Self {
        Self {
            gravity: Vec2::ZERO,
            air_resistance: 0.0,
            damping: 1.0,
        }
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -GRAVITY),
            air_resistance: AIR_RESISTANCE,
            damping: COLLISION_DAMPING,
        }
    }
}

pub(crate) fn validate_air_resistance(air_resistance: f32) -> Result<()> {
    if !air_resistance.is_finite() || air_resistance < 0.0 {
        return Err(PhysicsError::InvalidParam(format!(
            "air resistance {air_resistance} must be finite and >= 0"
        )));
    }
    Ok(())
}

pub(crate) fn validate_damping(damping: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&damping) {
        return Err(PhysicsError::InvalidParam(format!(
            "damping {damping} must be within [0, 1]"
        )));
    }
    Ok(())
}

/// Axis-aligned rectangle confining the particles.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    min: Vec2,
    max: Vec2,
}

impl WorldBounds {
    /// Bounds with `min` strictly below `max` on both axes.
    pub fn new(min: Vec2, max: Vec2) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min.cmpge(max).any() {
            return Err(PhysicsError::InvalidBounds {
                min: min.to_array(),
                max: max.to_array(),
            });
        }
        Ok(Self { min, max })
    }

    /// Square box `[-half_extent, half_extent]²`.
    pub fn centered(half_extent: f32) -> Result<Self> {
        Self::new(Vec2::splat(-half_extent), Vec2::splat(half_extent))
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.max
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Whether a disk of `radius` at `position` lies fully inside, within `tolerance`.
    pub fn contains_disk(&self, position: Vec2, radius: f32, tolerance: f32) -> bool {
        let lo = position - Vec2::splat(radius);
        let hi = position + Vec2::splat(radius);
        lo.cmpge(self.min - Vec2::splat(tolerance)).all()
            && hi.cmple(self.max + Vec2::splat(tolerance)).all()
    }
}

impl Default for WorldBounds {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-WORLD_HALF_EXTENT),
            max: Vec2::splat(WORLD_HALF_EXTENT),
        }
    }
}
