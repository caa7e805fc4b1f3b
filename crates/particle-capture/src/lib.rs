//! # Particle Capture
//!
//! Read-only consumers of committed simulation state: GPU-ready render
//! instances, the JSON state exporter and the frame profiler. None of them
//! can mutate the particles they observe.

pub mod error;
pub mod exporter;
pub mod instance;
pub mod profiler;

pub use error::*;
pub use exporter::*;
pub use instance::*;
pub use profiler::*;
