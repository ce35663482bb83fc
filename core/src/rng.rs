//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call any platform RNG.
//! All randomness flows through SimRng instances derived
//! from the single master seed stored on the Run record.
//!
//! Each customer gets its own RNG stream, seeded deterministically
//! from (master_seed XOR customer_index). This means:
//!   - Customer i's data never depends on how many draws customer i-1 made.
//!   - Customers can be replayed (or generated in parallel) in isolation.

use rand::{distributions::Distribution, RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;

/// A deterministic RNG stream for a single customer run.
pub struct SimRng {
    inner: Pcg64Mcg,
}

impl SimRng {
    /// Create a stream from the master seed and a stable stream index.
    pub fn new(master_seed: u64, stream_index: u64) -> Self {
        let derived_seed = master_seed ^ (stream_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Draw a raw u64 (full range).
    pub fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Roll a u64 uniformly in [lo, hi].
    pub fn range_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        match (hi - lo).checked_add(1) {
            Some(span) => lo + self.next_u64_below(span),
            None => self.next_u64(),
        }
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Pick uniformly from a non-empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    /// Weighted categorical draw over `(item, weight)` pairs.
    /// Weights are expected to sum to 1.0; any rounding shortfall
    /// falls through to the last entry.
    pub fn weighted<'a, T>(&mut self, choices: &'a [(T, f64)]) -> &'a T {
        assert!(!choices.is_empty(), "weighted draw over no choices");
        let roll = self.next_f64();
        let mut cumulative = 0.0;
        for (item, weight) in choices {
            cumulative += weight;
            if roll < cumulative {
                return item;
            }
        }
        &choices[choices.len() - 1].0
    }

    /// Draw 16 random bytes (UUID material).
    pub fn next_bytes16(&mut self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        self.inner.fill_bytes(&mut bytes);
        bytes
    }

    /// Sample any `rand` distribution from this stream.
    pub fn sample<T, D: Distribution<T>>(&mut self, dist: &D) -> T {
        dist.sample(&mut self.inner)
    }
}

/// Hands out per-customer RNG streams for a single run.
pub struct RngBank {
    master_seed: u64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// The stream for the customer at `index` (0-based position in the run).
    pub fn for_customer(&self, index: u64) -> SimRng {
        SimRng::new(self.master_seed, index)
    }
}
