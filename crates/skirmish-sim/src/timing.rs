//! Frame timing for the simulated clock.
//!
//! Splits variable frame deltas into fixed physics steps and keeps a short
//! history of frame times for the run summary.

use std::collections::VecDeque;

/// Fixed physics rate.
pub const FIXED_DT: f32 = 1.0 / 60.0;
/// Largest frame delta accepted before clamping.
pub const MAX_FRAME_DT: f32 = 0.25;
/// Most fixed steps run for a single frame.
pub const MAX_FIXED_STEPS: u32 = 10;

const MAX_SAMPLES: usize = 120;

/// Frame timing manager.
#[derive(Debug)]
pub struct FrameTiming {
    /// Accumulator for fixed timestep
    accumulator: f32,
    /// Fixed timestep delta (for physics)
    fixed_dt: f32,
    /// Maximum delta time to prevent spiral of death
    max_dt: f32,
    /// Simulated seconds so far
    elapsed: f32,
    /// Frames processed
    frames: u64,
    /// Fixed steps processed
    fixed_steps: u64,
    /// Recent frame times for averaging
    frame_times: VecDeque<f32>,
}

impl Default for FrameTiming {
    fn default() -> Self {
        Self::new(FIXED_DT)
    }
}

impl FrameTiming {
    /// Create a timing manager with the given physics step.
    #[must_use]
    pub fn new(fixed_dt: f32) -> Self {
        Self {
            accumulator: 0.0,
            fixed_dt: fixed_dt.max(0.001),
            max_dt: MAX_FRAME_DT,
            elapsed: 0.0,
            frames: 0,
            fixed_steps: 0,
            frame_times: VecDeque::with_capacity(MAX_SAMPLES),
        }
    }

    /// Get the fixed timestep value.
    #[must_use]
    pub const fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Clamps a raw frame delta and records it.
    pub fn frame(&mut self, raw_dt: f32) -> f32 {
        let dt = raw_dt.clamp(0.0, self.max_dt);
        self.elapsed += dt;
        self.frames += 1;

        self.frame_times.push_back(dt);
        if self.frame_times.len() > MAX_SAMPLES {
            self.frame_times.pop_front();
        }
        dt
    }

    /// Accumulate time for fixed timestep updates.
    /// Returns the number of fixed updates that should be performed.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt;
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_FIXED_STEPS {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.accumulator = 0.0;
        }

        self.fixed_steps += u64::from(count);
        count
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Frames processed.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Fixed steps processed.
    #[must_use]
    pub const fn fixed_steps(&self) -> u64 {
        self.fixed_steps
    }

    /// Get the average frame time in milliseconds.
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }

        (self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32) * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timing_creation() {
        let timing = FrameTiming::default();
        assert!((timing.fixed_dt() - 1.0 / 60.0).abs() < 0.001);
        assert_eq!(timing.frames(), 0);
    }

    #[test]
    fn test_frame_delta_is_clamped() {
        let mut timing = FrameTiming::default();
        assert_eq!(timing.frame(1.0), MAX_FRAME_DT);
        assert_eq!(timing.frame(-0.5), 0.0);
        assert_eq!(timing.frames(), 2);
        assert!((timing.elapsed() - MAX_FRAME_DT).abs() < 1e-6);
    }

    #[test]
    fn test_fixed_timestep() {
        let mut timing = FrameTiming::default();

        // 32ms frame should trigger one or two fixed updates
        let updates = timing.accumulate(0.032);
        assert!(updates == 1 || updates == 2);
    }

    #[test]
    fn test_accumulate_spiral_prevention() {
        let mut timing = FrameTiming::default();
        let updates = timing.accumulate(1.0);
        assert_eq!(updates, MAX_FIXED_STEPS);
        assert_eq!(timing.accumulate(0.0), 0);
        assert_eq!(timing.fixed_steps(), u64::from(MAX_FIXED_STEPS));
    }

    #[test]
    fn test_average_frame_time() {
        let mut timing = FrameTiming::default();
        for _ in 0..10 {
            timing.frame(0.02);
        }
        assert!((timing.average_frame_time_ms() - 20.0).abs() < 0.01);
    }
}
