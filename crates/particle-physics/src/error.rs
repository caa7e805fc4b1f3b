//! Configuration errors for the physics kernel

use thiserror::Error;

/// Result alias used across the physics crates.
pub type Result<T> = std::result::Result<T, PhysicsError>;

/// Invalid configuration rejected at construction time.
///
/// The kernel never produces these mid-step: every value is checked where it
/// enters (particle construction, engine parameters, `step` arguments).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhysicsError {
    #[error("invalid mass {0}: must be finite and > 0")]
    InvalidMass(f32),

    #[error("invalid radius {0}: must be finite and > 0")]
    InvalidRadius(f32),

    #[error("{0} must be finite")]
    NonFinite(&'static str),

    #[error("invalid time step {0}: must be finite and >= 0")]
    InvalidTimeStep(f32),

    #[error("invalid world bounds: min {min:?} must be strictly below max {max:?}")]
    InvalidBounds { min: [f32; 2], max: [f32; 2] },

    #[error("invalid parameter: {0}")]
    InvalidParam(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_value() {
        let msg = PhysicsError::InvalidMass(-2.0).to_string();
        assert!(msg.contains("mass"));
        assert!(msg.contains("-2"));

        let msg = PhysicsError::InvalidBounds {
            min: [0.0, 0.0],
            max: [0.0, 1.0],
        }
        .to_string();
        assert!(msg.contains("world bounds"));
    }
}
