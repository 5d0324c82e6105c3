//! `rand_core` integration.
//!
//! Implementing [`RngCore`] and [`SeedableRng`] lets the generator drive
//! every `rand::Rng` helper (`gen_range`, `gen::<f64>()`, shuffles, ...).

use crate::prng::QuadraticResiduePrng;
use rand_core::{impls, Error, RngCore, SeedableRng};

impl RngCore for QuadraticResiduePrng {
    fn next_u32(&mut self) -> u32 {
        (QuadraticResiduePrng::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        QuadraticResiduePrng::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for QuadraticResiduePrng {
    /// Little-endian bytes of the signed seed passed to
    /// [`reseed`](QuadraticResiduePrng::reseed).
    type Seed = [u8; 8];

    /// Default generator reseeded with `i64::from_le_bytes(seed)`.
    fn from_seed(seed: Self::Seed) -> Self {
        let mut rng = QuadraticResiduePrng::default();
        rng.reseed(i64::from_le_bytes(seed));
        rng
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::from_seed(state.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_next_u32_takes_high_bits() {
        let mut rng = QuadraticResiduePrng::new(9_021_057_379, 2_947_624_585, 1_000_014_012).unwrap();
        let mut reference = rng.clone();
        for _ in 0..100 {
            let expected = (reference.next_u64() >> 32) as u32;
            assert_eq!(RngCore::next_u32(&mut rng), expected);
        }
    }

    #[test]
    fn test_fill_bytes_uses_little_endian_words() {
        let mut rng = QuadraticResiduePrng::default();
        let mut reference = rng.clone();
        let mut buf = [0u8; 12];
        rng.fill_bytes(&mut buf);
        let first = reference.next_u64().to_le_bytes();
        // A tail of four bytes or fewer comes from next_u32, the high half.
        let tail = ((reference.next_u64() >> 32) as u32).to_le_bytes();
        assert_eq!(&buf[..8], &first);
        assert_eq!(&buf[8..], &tail);
    }

    #[test]
    fn test_fill_bytes_long_tail_uses_next_u64() {
        let mut rng = QuadraticResiduePrng::new(9_021_057_379, 2_947_624_585, 1_000_014_012).unwrap();
        let mut reference = rng.clone();
        let mut buf = [0u8; 13];
        rng.fill_bytes(&mut buf);
        let first = reference.next_u64().to_le_bytes();
        let second = reference.next_u64().to_le_bytes();
        assert_eq!(&buf[..8], &first);
        assert_eq!(&buf[8..], &second[..5]);
        assert_eq!(rng.position(), 2);
    }

    #[test]
    fn test_seed_from_u64_matches_reseed() {
        let mut seeded = QuadraticResiduePrng::seed_from_u64(42);
        let mut manual = QuadraticResiduePrng::default();
        manual.reseed(42);
        assert_eq!(seeded.intermediate_offset(), 42);
        for _ in 0..16 {
            assert_eq!(RngCore::next_u64(&mut seeded), manual.next_u64());
        }
    }

    #[test]
    fn test_negative_seed_bytes() {
        let rng = QuadraticResiduePrng::from_seed((-5i64).to_le_bytes());
        assert_eq!(rng.intermediate_offset(), u64::MAX - 5);
        assert_eq!(rng.position(), 0);
    }

    #[test]
    fn test_rand_helpers() {
        let mut rng = QuadraticResiduePrng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v: u32 = rng.gen_range(10..20);
            assert!((10..20).contains(&v));
            let f: f64 = rng.gen();
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_gen_u64_is_next_u64() {
        let mut adapted = QuadraticResiduePrng::default();
        let mut reference = adapted.clone();
        for _ in 0..32 {
            assert_eq!(adapted.gen::<u64>(), reference.next_u64());
        }
    }

    #[test]
    fn test_try_fill_bytes_never_fails() {
        let mut rng = QuadraticResiduePrng::default();
        let mut buf = [0u8; 33];
        assert!(rng.try_fill_bytes(&mut buf).is_ok());
    }
}
