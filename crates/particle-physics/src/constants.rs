//! Default physical constants for the simulation
//!
//! World units are arbitrary; the defaults describe a 200x200 box with
//! Earth-like gravity pointing down the y axis.

/// Radius given to particles that do not override it
pub const DEFAULT_RADIUS: f32 = 5.0;

/// Gravitational acceleration (world units / s²), applied along -y
pub const GRAVITY: f32 = 9.81;

/// Quadratic air drag coefficient
pub const AIR_RESISTANCE: f32 = 0.01;

/// Coefficient of restitution for wall bounces and particle collisions
/// (1 = perfectly elastic, 0 = fully inelastic)
pub const COLLISION_DAMPING: f32 = 0.8;

/// Half extent of the default square world
pub const WORLD_HALF_EXTENT: f32 = 100.0;

/// Target render frame rate of the loop driver
pub const TARGET_FPS: f32 = 60.0;

/// Target number of physics steps per simulated second
pub const PHYSICS_STEPS_PER_SECOND: u32 = 100;
