#![deny(missing_docs)]

//! # qrprng
//!
//! **qrprng** is a deterministic, seedable pseudorandom number generator
//! whose output is a *permutation*.  Given a prime `p ≡ 3 (mod 4)` it
//! defines a bijection on `[0, p)`: drawing `p` values visits every integer
//! below `p` exactly once before the sequence repeats.  Ordinary PRNGs make
//! no such promise.
//!
//! The construction follows the quadratic-residue permutation: squaring
//! modulo such a prime, folded around `p / 2`, is itself a bijection.  Two
//! applications separated by an additive intermediate offset and an XOR
//! mask over the low band give output without obvious small-input
//! structure.
//!
//! ## Features
//!
//! * **Permutation engine**: [`PermutationParams`] validates a parameter set
//!   and evaluates the `i`-th element of the permutation directly.
//! * **Generator**: [`QuadraticResiduePrng`] walks the permutation with a
//!   counter and supports reseeding.
//! * **`rand` integration**: the generator implements
//!   [`rand_core::RngCore`] and [`rand_core::SeedableRng`], so all
//!   `rand::Rng` helpers are available.
//! * **Configuration**: [`GeneratorConfig`] loads parameters from JSON and
//!   `QRPRNG_*` environment variables.
//!
//! The generator is not cryptographically secure and holds a mutable
//! counter, so give each thread its own instance.
//!
//! ## Usage
//!
//! ```rust
//! use qrprng::QuadraticResiduePrng;
//!
//! // A tiny prime makes the permutation property easy to see.
//! let mut rng = QuadraticResiduePrng::new(11, 0, 0).unwrap();
//! let mut values: Vec<u64> = (0..11).map(|_| rng.next_u64()).collect();
//! values.sort_unstable();
//! assert_eq!(values, (0..11).collect::<Vec<_>>());
//!
//! // The default generator covers almost all of u64.
//! let mut rng = QuadraticResiduePrng::default();
//! let _value = rng.next_u64();
//! ```

pub mod config;
mod field;
pub mod permutation;
mod prng;
mod rng;

pub use config::{ConfigError, GeneratorConfig};
pub use field::{is_prime, Field};
pub use permutation::{
    apply_mask, check_full_period, quadratic_residue, IndexOutOfRange, ParamError, PeriodError,
    PermutationIter, PermutationParams,
};
pub use prng::{QuadraticResiduePrng, DEFAULT_INTERMEDIATE_OFFSET, DEFAULT_PRIME, INT63_MASK};
