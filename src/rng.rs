// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Provides a random-number generator for placing blocks.

use crate::geometry::Point;
use std::time::{SystemTime, UNIX_EPOCH};

/// A pseudorandom number generator (PRNG) for applications that don't require
/// cryptographically secure random numbers. Pass the same number to
/// [Rng::new_with_seed()] to get the same stream back again.
#[derive(Debug)]
pub struct Rng(oorandom::Rand64);
impl Default for Rng {
    fn default() -> Self {
        // A poor source of entropy, but all it picks is where new blocks land.
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        Self(oorandom::Rand64::new(seed))
    }
}
impl Rng {
    #[allow(missing_docs)]
    pub fn new_with_seed(seed: u64) -> Self {
        Self(oorandom::Rand64::new(seed as u128))
    }

    /// A float in 0.0..1.0.
    pub fn rand_float(&mut self) -> f64 {
        self.0.rand_float()
    }

    /// A point in (0..width, 0..height).
    pub fn rand_point(&mut self, width: f64, height: f64) -> Point {
        Point::new(self.rand_float() * width, self.rand_float() * height)
    }
}
