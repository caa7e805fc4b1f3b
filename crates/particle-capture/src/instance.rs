//! Render instances built from committed particle state
//!
//! Positions are mapped from world space into normalized device coordinates
//! so any backend can draw the disks without knowing the world bounds.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use particle_physics::Particle;
use particle_simulation::{ParticleSystem, WorldBounds};

/// Speed at which the color ramp saturates to red
pub const COLOR_RAMP_MAX_SPEED: f32 = 20.0;

/// Lowest value of each color channel so slow particles stay visible
const MIN_CHANNEL: f32 = 0.3;

/// GPU-compatible particle instance
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    /// Center in NDC, [-1, 1] on both axes
    pub position: [f32; 2],
    /// Radius in NDC along x
    pub radius: f32,
    /// Speed in world units, for shader-side effects
    pub speed: f32,
    /// RGBA
    pub color: [f32; 4],
}

impl ParticleInstance {
    pub fn from_particle(particle: &Particle, bounds: &WorldBounds) -> Self {
        let speed = particle.speed();
        let ndc = world_to_ndc(particle.position, bounds);

        Self {
            position: ndc.to_array(),
            radius: particle.radius() * 2.0 / bounds.size().x,
            speed,
            color: speed_color(speed),
        }
    }
}

/// Map a world position into [-1, 1]², clamping anything outside `bounds`.
pub fn world_to_ndc(position: Vec2, bounds: &WorldBounds) -> Vec2 {
    let unit = (position - bounds.min()) / bounds.size();
    (unit * 2.0 - Vec2::ONE).clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Blue → green → red ramp over `[0, COLOR_RAMP_MAX_SPEED]`.
pub fn speed_color(speed: f32) -> [f32; 4] {
    let t = (speed / COLOR_RAMP_MAX_SPEED).clamp(0.0, 1.0);

    let [r, g, b] = if t < 0.5 {
        [0.0, t * 2.0, 1.0 - t * 2.0]
    } else {
        let u = (t - 0.5) * 2.0;
        [u, 1.0 - u, 0.0]
    };

    [
        r.max(MIN_CHANNEL),
        g.max(MIN_CHANNEL),
        b.max(MIN_CHANNEL),
        1.0,
    ]
}

/// One instance per particle, in collection order.
pub fn build_instances(system: &ParticleSystem, bounds: &WorldBounds) -> Vec<ParticleInstance> {
    system
        .iter()
        .map(|p| ParticleInstance::from_particle(p, bounds))
        .collect()
}

/// Raw bytes for upload into a vertex or storage buffer.
pub fn instance_bytes(instances: &[ParticleInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
