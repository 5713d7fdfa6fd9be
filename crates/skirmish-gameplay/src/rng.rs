//! Seedable random source for AI rolls, spawn placement, and drops.
//!
//! Every subsystem owns its own generator so that a single seed reproduces
//! a whole run. Enemies receive a generator forked from the spawner's.

use glam::Vec2;
use std::f32::consts::TAU;

/// Seeded random number generator used throughout the gameplay core.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: fastrand::Rng,
}

impl SimRng {
    /// Creates a new RNG with seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: fastrand::Rng::with_seed(seed),
        }
    }

    /// Creates an independent child generator seeded from this one.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        Self::new(self.inner.u64(..))
    }

    /// Uniform value in [0, 1).
    pub fn value(&mut self) -> f32 {
        self.inner.f32()
    }

    /// Uniform value in [min, max). Returns `min` when the range is empty.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + self.inner.f32() * (max - min)
    }

    /// Uniform integer in [min, max]. Returns `min` when `max < min`.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        self.inner.u32(min..=max)
    }

    /// Uniform signed integer in [min, max]. Returns `min` when `max < min`.
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        self.inner.i32(min..=max)
    }

    /// Uniform angle in radians in [0, TAU).
    pub fn angle(&mut self) -> f32 {
        self.inner.f32() * TAU
    }

    /// Uniform point inside the unit circle.
    pub fn inside_unit_circle(&mut self) -> Vec2 {
        let angle = self.angle();
        // sqrt keeps the density uniform over the disc area
        let radius = self.inner.f32().sqrt();
        Vec2::new(angle.cos(), angle.sin()) * radius
    }

    /// Returns true with probability `chance`.
    pub fn chance(&mut self, chance: f32) -> bool {
        self.value() < chance
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0x5EED_0F_5C1A)
    }
}
