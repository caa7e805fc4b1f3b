//! # Particle Physics
//!
//! Point-mass disk particles, the per-step force accumulator and the global
//! force laws (uniform gravity, quadratic air drag) for the 2D simulation.

pub mod constants;
pub mod error;
pub mod forces;
pub mod particle;

pub use constants::*;
pub use error::*;
pub use forces::*;
pub use particle::*;
