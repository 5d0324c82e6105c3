//! The design philosophy underlying `qrprng` is small, yet mathematically exact.
//! Each module encapsulates one step of the quadratic-residue construction,
//! illustrating how modest arithmetic primitives compose into a full-period permutation.
//!
//! Counter-based pseudorandom number generator.
//!
//! [`QuadraticResiduePrng`] walks a [`PermutationParams`] permutation with a
//! monotonically increasing counter.  With `offset = 0` the first `prime`
//! outputs are every integer below `prime`, each exactly once; after that
//! the sequence repeats.  The generator is not cryptographically secure and
//! is not meant to be shared between threads without external locking.

use crate::permutation::{IndexOutOfRange, ParamError, PermutationParams};
use once_cell::sync::Lazy;
use tracing::trace;

/// Clears the sign bit of a 64-bit output.
pub const INT63_MASK: u64 = (1 << 63) - 1;

/// Largest prime congruent to 3 mod 4 below `2^64`; permutes `[0, 2^64 - 189)`.
pub const DEFAULT_PRIME: u64 = u64::MAX - 188;

/// Intermediate offset used by [`QuadraticResiduePrng::default`].
///
/// The mask is derived from the wrapping sum `DEFAULT_PRIME + DEFAULT_INTERMEDIATE_OFFSET`,
/// giving the same default mask as the reference generator.
pub const DEFAULT_INTERMEDIATE_OFFSET: u64 = 5_577_006_791_947_779_410;

static DEFAULT_PARAMS: Lazy<PermutationParams> = Lazy::new(|| {
    PermutationParams::new(DEFAULT_PRIME, DEFAULT_INTERMEDIATE_OFFSET, 0)
        .unwrap_or_else(|err| panic!("default generator parameters rejected: {err}"))
});

/// A seedable generator whose output stream is a full-period permutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuadraticResiduePrng {
    params: PermutationParams,
    idx: u64,
}

impl QuadraticResiduePrng {
    /// Creates a generator after validating its parameters.
    ///
    /// See [`PermutationParams::new`] for the rules.
    pub fn new(prime: u64, intermediate_offset: u64, offset: u64) -> Result<Self, ParamError> {
        PermutationParams::new(prime, intermediate_offset, offset).map(Self::from_params)
    }

    /// Creates a generator at position zero over already validated parameters.
    pub fn from_params(params: PermutationParams) -> Self {
        Self { params, idx: 0 }
    }

    /// Returns the parameters currently driving the generator.
    pub fn params(&self) -> &PermutationParams {
        &self.params
    }

    /// Returns the index the next output will be computed from.
    pub fn position(&self) -> u64 {
        self.idx
    }

    /// Returns the current intermediate offset (seed).
    pub fn intermediate_offset(&self) -> u64 {
        self.params.intermediate_offset()
    }

    /// Returns the `i`-th element of the permutation without moving the counter.
    pub fn index(&self, i: u64) -> Result<u64, IndexOutOfRange> {
        self.params.index(i)
    }

    /// Advances the generator and returns the next 64-bit output.
    ///
    /// Never fails: once the counter passes the prime the stream starts the
    /// same permutation over.
    ///
    /// ```
    /// use qrprng::QuadraticResiduePrng;
    ///
    /// let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
    /// let first: Vec<u64> = (0..11).map(|_| rng.next_u64()).collect();
    /// let second: Vec<u64> = (0..11).map(|_| rng.next_u64()).collect();
    /// assert_eq!(first, second);
    /// ```
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let value = self.params.evaluate(self.idx % self.params.prime());
        self.idx = self.idx.wrapping_add(1);
        value
    }

    /// Advances the generator and returns the next output as a non-negative `i64`.
    #[inline]
    pub fn next_i63(&mut self) -> i64 {
        (self.next_u64() & INT63_MASK) as i64
    }

    /// Replaces the intermediate offset and rewinds the counter to zero.
    ///
    /// Non-negative seeds are used as-is; negative seeds map to
    /// `u64::MAX - |seed|`.  The new offset is not checked against the
    /// prime, and the mask derived at construction is kept.
    pub fn reseed(&mut self, seed: i64) {
        let intermediate_offset = if seed >= 0 {
            seed as u64
        } else {
            u64::MAX - seed.unsigned_abs()
        };
        trace!(seed, intermediate_offset, "reseeding generator");
        self.params = self.params.with_intermediate_offset(intermediate_offset);
        self.idx = 0;
    }
}

impl Default for QuadraticResiduePrng {
    /// Generator over [`DEFAULT_PRIME`] and [`DEFAULT_INTERMEDIATE_OFFSET`]
    /// with no output offset.
    ///
    /// # Panics
    ///
    /// Panics if the built-in constants fail validation, which would be a
    /// bug in this crate.
    fn default() -> Self {
        Self::from_params(*DEFAULT_PARAMS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_parameters() {
        let rng = QuadraticResiduePrng::default();
        assert_eq!(rng.params().prime(), DEFAULT_PRIME);
        assert_eq!(DEFAULT_PRIME as u128, (1u128 << 64) - 189);
        assert_eq!(rng.intermediate_offset(), DEFAULT_INTERMEDIATE_OFFSET);
        assert_eq!(rng.params().offset(), 0);
        assert_eq!(rng.position(), 0);
    }

    #[test]
    fn test_default_first_outputs() {
        let mut rng = QuadraticResiduePrng::default();
        let values: Vec<u64> = (0..5).map(|_| rng.next_u64()).collect();
        assert_eq!(values, vec![204_304, 205_209, 200_704, 212_521, 250_000]);
    }

    #[test]
    fn test_default_outputs_stay_below_prime() {
        let mut rng = QuadraticResiduePrng::default();
        for _ in 0..10_000 {
            assert!(rng.next_u64() < DEFAULT_PRIME);
        }
    }

    #[test]
    fn test_custom_parameters_first_outputs() {
        let mut rng = QuadraticResiduePrng::new(9_021_057_379, 2_947_624_585, 1_000_014_012).unwrap();
        let values: Vec<u64> = (0..5).map(|_| rng.next_u64()).collect();
        assert_eq!(
            values,
            vec![1_048_522_094, 1_084_612_675, 4_103_661_991, 9_816_944_902, 6_870_076_944]
        );
    }

    #[test]
    fn test_stream_matches_index() {
        let mut rng = QuadraticResiduePrng::new(43, 17, 5).unwrap();
        for i in 0..43 {
            let expected = rng.index(i).unwrap();
            assert_eq!(rng.next_u64(), expected);
        }
        assert_eq!(rng.position(), 43);
    }

    #[test]
    fn test_stream_cycles_past_prime() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        let values: Vec<u64> = (0..22).map(|_| rng.next_u64()).collect();
        let period = vec![8, 6, 4, 7, 9, 3, 2, 0, 5, 1, 10];
        assert_eq!(&values[..11], period.as_slice());
        assert_eq!(&values[11..], period.as_slice());
        // Direct access still reports the bound.
        assert!(rng.index(rng.position()).is_err());
    }

    #[test]
    fn test_next_i63_clears_sign_bit() {
        let mut rng = QuadraticResiduePrng::new(DEFAULT_PRIME, 0, 1 << 63).unwrap();
        let mut reference = rng.clone();
        for _ in 0..1_000 {
            let signed = rng.next_i63();
            assert!(signed >= 0);
            assert_eq!(signed as u64, reference.next_u64() & INT63_MASK);
        }
    }

    #[test]
    fn test_reseed_resets_counter() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        for _ in 0..5 {
            rng.next_u64();
        }
        rng.reseed(3);
        assert_eq!(rng.position(), 0);
        assert_eq!(rng.intermediate_offset(), 3);
        // (11 + 3) and (11 + 0) agree modulo 3, so both generators share a mask.
        let mut fresh = QuadraticResiduePrng::new(11, 3, 0).unwrap();
        assert_eq!(fresh.params().mask(), rng.params().mask());
        assert_eq!(rng.next_u64(), 3);
        assert_eq!(fresh.next_u64(), 3);
        assert_eq!(rng.next_u64(), fresh.next_u64());
    }

    #[test]
    fn test_reseed_keeps_construction_mask() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        rng.reseed(1);
        let fresh = QuadraticResiduePrng::new(11, 1, 0).unwrap();
        assert_eq!(rng.params().mask(), 6);
        assert_eq!(fresh.params().mask(), 4);
        assert_eq!(rng.index(0).unwrap(), 6);
        assert_eq!(fresh.index(0).unwrap(), 3);
    }

    #[test]
    fn test_reseeded_params_survive_json() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        rng.reseed(1);
        let json = serde_json::to_string(rng.params()).unwrap();
        let back: PermutationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, rng.params());
        assert_eq!(back.mask(), 6);
        let mut restored = QuadraticResiduePrng::from_params(back);
        for _ in 0..22 {
            assert_eq!(restored.next_u64(), rng.next_u64());
        }

        let mut rng = QuadraticResiduePrng::default();
        rng.reseed(-1);
        let json = serde_json::to_string(rng.params()).unwrap();
        let back: PermutationParams = serde_json::from_str(&json).unwrap();
        assert_eq!(back.intermediate_offset(), u64::MAX - 1);
        assert_eq!(back.mask_offset(), DEFAULT_INTERMEDIATE_OFFSET);
        let mut restored = QuadraticResiduePrng::from_params(back);
        for _ in 0..16 {
            assert_eq!(restored.next_u64(), rng.next_u64());
        }
    }

    #[test]
    fn test_negative_seeds_fold_to_top_of_range() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        rng.reseed(-1);
        assert_eq!(rng.intermediate_offset(), u64::MAX - 1);
        rng.reseed(i64::MIN);
        assert_eq!(rng.intermediate_offset(), (1u64 << 63) - 1);
        rng.reseed(i64::MAX);
        assert_eq!(rng.intermediate_offset(), i64::MAX as u64);
    }

    #[test]
    fn test_reseed_past_prime_keeps_permutation() {
        let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
        rng.reseed(-7);
        let mut values: Vec<u64> = (0..11).map(|_| rng.next_u64()).collect();
        values.sort_unstable();
        assert_eq!(values, (0..11).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_same_seed_same_sequence(seed in any::<i64>()) {
            let mut a = QuadraticResiduePrng::default();
            let mut b = QuadraticResiduePrng::default();
            a.next_u64();
            a.reseed(seed);
            b.reseed(seed);
            for _ in 0..64 {
                prop_assert_eq!(a.next_u64(), b.next_u64());
            }
        }

        #[test]
        fn prop_stream_matches_index(io in 0u64..1_000, skip in 0usize..200) {
            let prime = 1_019;
            let mut rng = QuadraticResiduePrng::new(prime, io, 0).unwrap();
            for _ in 0..skip {
                rng.next_u64();
            }
            let expected = rng.index(skip as u64).unwrap();
            prop_assert_eq!(rng.next_u64(), expected);
        }
    }
}
