//! # Particle Simulation Engine
//!
//! CPU simulation kernel: the particle collection, the per-step physics
//! pipeline (global forces, boundary confinement, pairwise collisions,
//! integration) and the helpers that feed it (seeded spawning, fixed-rate
//! stepping).

pub mod collision;
pub mod params;
pub mod scene;
pub mod simulation;
pub mod system;
pub mod timestep;

pub use collision::*;
pub use params::*;
pub use scene::*;
pub use simulation::*;
pub use system::*;
pub use timestep::*;
