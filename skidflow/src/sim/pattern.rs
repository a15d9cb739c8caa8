//! Per-step boolean patterns driving `valid` and `ready` wishes.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::*;

/// Source of one boolean per step.
pub trait Pattern: fmt::Debug {
    /// The value for the next step.
    fn next(&mut self) -> bool;
}

impl<P: Pattern + ?Sized> Pattern for Box<P> {
    fn next(&mut self) -> bool { (**self).next() }
}

/// Always asserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl Pattern for Always {
    fn next(&mut self) -> bool { true }
}

/// Never asserted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl Pattern for Never {
    fn next(&mut self) -> bool { false }
}

/// Cycles through a fixed list.
#[derive(Debug, Clone)]
pub struct Repeat {
    pattern: Vec<bool>,
    index: usize,
}

impl Repeat {
    /// Creates a cyclic pattern. The list must not be empty.
    pub fn new(pattern: Vec<bool>) -> Result<Self, SimError> {
        if pattern.is_empty() {
            return Err(SimError::Config { reason: "repeat pattern is empty".to_string() });
        }
        Ok(Self { pattern, index: 0 })
    }
}

impl Pattern for Repeat {
    fn next(&mut self) -> bool {
        let value = self.pattern[self.index];
        self.index = (self.index + 1) % self.pattern.len();
        value
    }
}

/// Independently asserted with a fixed probability each step.
#[derive(Debug, Clone)]
pub struct Bernoulli {
    rng: StdRng,
    probability: f64,
}

impl Bernoulli {
    /// Creates a seeded pattern. `probability` must be within `0.0..=1.0`.
    pub fn new(seed: u64, probability: f64) -> Result<Self, SimError> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(SimError::Config { reason: format!("probability {} is not within 0.0..=1.0", probability) });
        }
        Ok(Self { rng: StdRng::seed_from_u64(seed), probability })
    }

    /// Probability of assertion.
    pub fn probability(&self) -> f64 { self.probability }
}

impl Pattern for Bernoulli {
    fn next(&mut self) -> bool { self.rng.gen_bool(self.probability) }
}
