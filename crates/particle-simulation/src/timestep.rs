//! Fixed-rate physics clock for the loop driver

use particle_physics::{PhysicsError, Result, PHYSICS_STEPS_PER_SECOND, TARGET_FPS};

/// Converts variable frame time into a whole number of fixed physics steps.
///
/// Leftover time is carried to the next frame. At most `max_steps_per_frame`
/// steps are issued per frame; any backlog beyond that is dropped so a slow
/// frame cannot trigger an ever-growing catch-up.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps_per_frame: u32,
    accumulator: f32,
    total_steps: u64,
}

impl FixedTimestep {
    pub fn new(steps_per_second: u32, max_steps_per_frame: u32) -> Result<Self> {
        if steps_per_second == 0 {
            return Err(PhysicsError::InvalidParam(
                "physics rate must be at least one step per second".into(),
            ));
        }
        if max_steps_per_frame == 0 {
            return Err(PhysicsError::InvalidParam(
                "max steps per frame must be at least 1".into(),
            ));
        }

        Ok(Self {
            step: 1.0 / steps_per_second as f32,
            max_steps_per_frame,
            accumulator: 0.0,
            total_steps: 0,
        })
    }

    /// Length of one physics step in seconds.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Steps issued since creation.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Unconsumed time as a fraction of one step, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.step
    }

    /// Add `frame_time` seconds and return how many steps to run now.
    pub fn advance(&mut self, frame_time: f32) -> Result<u32> {
        if !frame_time.is_finite() || frame_time < 0.0 {
            return Err(PhysicsError::InvalidTimeStep(frame_time));
        }

        self.accumulator += frame_time;
        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps_per_frame {
            self.accumulator -= self.step;
            steps += 1;
        }

        if self.accumulator >= self.step {
            log::warn!(
                "physics fell behind by {:.3}s, dropping backlog",
                self.accumulator
            );
            self.accumulator %= self.step;
        }

        self.total_steps += u64::from(steps);
        Ok(steps)
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self {
            step: 1.0 / PHYSICS_STEPS_PER_SECOND as f32,
            max_steps_per_frame: (PHYSICS_STEPS_PER_SECOND as f32 / TARGET_FPS).ceil() as u32 * 4,
            accumulator: 0.0,
            total_steps: 0,
        }
    }
}
