//! # Seeds and Deterministic Randomness
//!
//! Every stochastic component in the workspace draws from a [`SeededRng`]
//! built out of a [`Seed`]. One world seed is split into independent
//! per-purpose streams with [`Seed::derive`], so the noise sampler, the
//! grammar engines, and the placement search never share state.
//!
//! ## Determinism Guarantee
//!
//! Given the same `Seed`, a `SeededRng` produces **exactly** the same
//! sequence on any platform, any time. The backing generator is ChaCha8,
//! which has no platform-dependent behavior.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Seed for deterministic generation.
///
/// All procedural generation derives from a seed of this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Seed(u64);

impl Seed {
    /// Creates a new seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g. one automaton region).
    ///
    /// Uses a hash mix to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        // FNV-1a style mixing
        let mut hash = self.0;
        hash ^= purpose.wrapping_add(0x9E37_79B9_7F4A_7C15);
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self(0xCAFE_F00D_D15E_A5E5)
    }
}

/// Reseedable deterministic pseudo-random source.
///
/// Thin wrapper over `ChaCha8Rng` exposing exactly the operations the
/// generation code needs. The half-open conventions match the rest of the
/// workspace: floats in `[0, 1)`, integer ranges `[lo, hi)`.
pub struct SeededRng {
    inner: ChaCha8Rng,
}

impl SeededRng {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn from_seed(seed: Seed) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }

    /// Resets the generator to the start of the stream for `seed`.
    pub fn reseed(&mut self, seed: Seed) {
        self.inner = ChaCha8Rng::seed_from_u64(seed.value());
    }

    /// Returns a uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Returns a uniform float in `[lo, hi)`.
    ///
    /// # Panics
    ///
    /// Panics if `lo >= hi`.
    #[inline]
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        self.inner.gen_range(lo..hi)
    }

    /// Returns a uniform integer in `[lo, hi)`.
    ///
    /// # Panics
    ///
    /// Panics if `lo >= hi`.
    #[inline]
    pub fn range_usize(&mut self, lo: usize, hi: usize) -> usize {
        self.inner.gen_range(lo..hi)
    }

    /// Returns a uniform integer in `[lo, hi)`.
    ///
    /// # Panics
    ///
    /// Panics if `lo >= hi`.
    #[inline]
    pub fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
        self.inner.gen_range(lo..hi)
    }
}

impl std::fmt::Debug for SeededRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededRng").finish_non_exhaustive()
    }
}
