//! Deterministic per-drone RNG used by the random flight-plan generator.
//!
//! # Determinism strategy
//!
//! Each drone gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (drone_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive drone ids uniformly across the seed space.
//! Adding drones at the end of a generated swarm does not change the plans
//! of the drones already in it.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::DroneId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-drone deterministic RNG.
pub struct PlanRng(SmallRng);

impl PlanRng {
    /// Seed deterministically from the run's global seed and a drone id.
    pub fn new(global_seed: u64, drone: DroneId) -> Self {
        let seed = global_seed ^ (drone.0 as u64).wrapping_mul(MIXING_CONSTANT);
        PlanRng(SmallRng::seed_from_u64(seed))
    }

    /// Generate a value uniformly in `range`.
    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a non-empty slice.
    /// Returns `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }
}
