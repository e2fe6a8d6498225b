//! Bounded discrete log recovery: find x in [0, bound) given x·G
//!
//! ElGamal decryption only yields the plaintext lifted into the group, so
//! every cipher key chunk ends in a search. The search strategy sits behind
//! [`DiscreteLog`] so the pipeline does not care how it is done.
//!
//! [`BabyStepGiantStep`] precomputes 2^k baby steps (j·G for j < 2^k) and
//! then walks at most 2^(bits-k) giant steps of -2^k·G. With the defaults
//! (k = 16, bits = 32) the table holds 65536 entries (~2.5 MiB) and a
//! worst-case lookup performs 65536 point additions and compressions.
//! Raising k trades memory and setup time for faster lookups.

use std::collections::HashMap;
use std::fmt;

use curve25519_dalek::{
    constants::RISTRETTO_BASEPOINT_POINT, ristretto::RistrettoPoint, scalar::Scalar,
    traits::Identity,
};
use tracing::debug;

/// Recover a small scalar from a point
pub trait DiscreteLog: Send + Sync {
    /// Returns x such that x·G == point, if x lies inside the search bound
    fn recover(&self, point: &RistrettoPoint) -> Option<u32>;

    /// Exclusive upper bound of recoverable values
    fn bound(&self) -> u64;
}

/// Table-driven baby-step giant-step search
pub struct BabyStepGiantStep {
    table: HashMap<[u8; 32], u32>,
    baby_steps: u64,
    giant_steps: u64,
    /// -(baby_steps)·G
    giant_stride: RistrettoPoint,
}

impl BabyStepGiantStep {
    pub const DEFAULT_BABY_STEP_BITS: u32 = 16;
    pub const MAX_BOUND_BITS: u32 = 32;

    /// Full u32 search with a 2^baby_step_bits table
    pub fn new(baby_step_bits: u32) -> Self {
        Self::with_bound(baby_step_bits, Self::MAX_BOUND_BITS)
    }

    /// Search [0, 2^bound_bits) with a 2^baby_step_bits table
    ///
    /// bound_bits is clamped to 1..=32 and baby_step_bits to 1..=bound_bits.
    pub fn with_bound(baby_step_bits: u32, bound_bits: u32) -> Self {
        let bound_bits = bound_bits.clamp(1, Self::MAX_BOUND_BITS);
        let baby_step_bits = baby_step_bits.clamp(1, bound_bits);

        let baby_steps = 1u64 << baby_step_bits;
        let giant_steps = 1u64 << (bound_bits - baby_step_bits);

        let g = RISTRETTO_BASEPOINT_POINT;
        let mut table = HashMap::with_capacity(baby_steps as usize);
        let mut point = RistrettoPoint::identity();
        for j in 0..baby_steps {
            table.insert(point.compress().to_bytes(), j as u32);
            point = &point + &g;
        }

        let giant_stride = -(&Scalar::from(baby_steps) * &g);

        debug!(baby_steps, giant_steps, "built baby-step table");

        Self {
            table,
            baby_steps,
            giant_steps,
            giant_stride,
        }
    }
}

impl Default for BabyStepGiantStep {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BABY_STEP_BITS)
    }
}

impl DiscreteLog for BabyStepGiantStep {
    fn recover(&self, point: &RistrettoPoint) -> Option<u32> {
        let mut current = *point;
        for i in 0..self.giant_steps {
            if let Some(&j) = self.table.get(current.compress().as_bytes()) {
                return u32::try_from(i * self.baby_steps + u64::from(j)).ok();
            }
            current = &current + &self.giant_stride;
        }
        None
    }

    fn bound(&self) -> u64 {
        self.baby_steps * self.giant_steps
    }
}

impl fmt::Debug for BabyStepGiantStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BabyStepGiantStep")
            .field("baby_steps", &self.baby_steps)
            .field("giant_steps", &self.giant_steps)
            .finish_non_exhaustive()
    }
}

/// Walks 0·G, 1·G, ... up to the bound; no table
///
/// Only practical for small bounds. Used as a reference strategy.
#[derive(Debug, Clone, Copy)]
pub struct LinearSearch {
    bound: u32,
}

impl LinearSearch {
    pub fn new(bound: u32) -> Self {
        Self { bound }
    }
}

impl DiscreteLog for LinearSearch {
    fn recover(&self, point: &RistrettoPoint) -> Option<u32> {
        let g = RISTRETTO_BASEPOINT_POINT;
        let mut current = RistrettoPoint::identity();
        for x in 0..self.bound {
            if current == *point {
                return Some(x);
            }
            current = &current + &g;
        }
        None
    }

    fn bound(&self) -> u64 {
        u64::from(self.bound)
    }
}
