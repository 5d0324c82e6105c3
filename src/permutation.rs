//! The design philosophy underlying `qrprng` is small, yet mathematically exact.
//! Each module encapsulates one step of the quadratic-residue construction,
//! illustrating how modest arithmetic primitives compose into a full-period permutation.
//!
//! Quadratic-residue permutation engine.
//!
//! For a prime `p ≡ 3 (mod 4)` the map
//!
//! ```text
//! q(x) = x² mod p          if x ≤ p / 2
//!      = p − (x² mod p)    otherwise
//! ```
//!
//! is a bijection on `[0, p)`.  A single application still sends small
//! inputs to small outputs, so [`PermutationParams::index`] composes two
//! applications around an additive intermediate offset and an XOR mask
//! over the low band `[0, max_mask]`.  The mask removes the fixed points
//! (`0 ↦ 0` among them) that raw residue folding keeps near zero.
//!
//! Everything here is pure: the same parameters and index always produce
//! the same value.

use crate::field::{is_prime, Field};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;

/// Largest prime accepted by [`check_full_period`].
pub const MAX_CHECKED_PRIME: u64 = 1 << 26;

/// Reasons a parameter set is rejected.  Checks run in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("invalid prime {prime}: must be 3 mod 4")]
    /// The modulus is not congruent to 3 modulo 4.
    InvalidPrimeForm {
        /// Rejected modulus.
        prime: u64,
    },
    #[error("invalid intermediate offset {intermediate_offset}: must be less than prime {prime}")]
    /// The intermediate offset lies outside `[0, prime)`.
    OffsetOutOfRange {
        /// Rejected intermediate offset.
        intermediate_offset: u64,
        /// Modulus it was checked against.
        prime: u64,
    },
    #[error("invalid prime {prime}: number is not prime")]
    /// The modulus failed the primality test.
    NotPrime {
        /// Rejected modulus.
        prime: u64,
    },
}

/// Advisory error for an index past the end of the first period.
///
/// Callers that are happy with a cycling sequence can reduce the index
/// modulo the prime and try again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid index {index}: must be less than prime {prime}")]
pub struct IndexOutOfRange {
    /// Offending index.
    pub index: u64,
    /// Prime bounding the period.
    pub prime: u64,
}

/// Failures reported by [`check_full_period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("prime {prime} exceeds the checkable limit {limit}")]
    /// The period is too long to materialise.
    TooLarge {
        /// Prime of the parameter set.
        prime: u64,
        /// Largest supported prime.
        limit: u64,
    },
    #[error("index {index} produced {value}, outside the output range")]
    /// An output fell outside `[offset, offset + prime)`.
    OutOfRange {
        /// Index that produced the value.
        index: u64,
        /// Offending output.
        value: u64,
    },
    #[error("value {value} produced by both index {first} and index {second}")]
    /// Two indices collided.
    Repeated {
        /// Duplicated output.
        value: u64,
        /// First index producing it.
        first: u64,
        /// Second index producing it.
        second: u64,
    },
}

/// Validated, immutable parameters of one permutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParams")]
pub struct PermutationParams {
    prime: u64,
    intermediate_offset: u64,
    offset: u64,
    max_mask: u64,
    mask: u64,
    mask_offset: u64,
    #[serde(skip_serializing)]
    field: Field,
}

/// Unvalidated wire form of [`PermutationParams`].
///
/// `mask_offset` is the intermediate offset the mask was derived from.  It
/// is absent for freshly configured parameters and differs from
/// `intermediate_offset` after a reseed.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawParams {
    prime: u64,
    intermediate_offset: u64,
    #[serde(default)]
    offset: u64,
    #[serde(default)]
    mask_offset: Option<u64>,
}

impl TryFrom<RawParams> for PermutationParams {
    type Error = ParamError;

    fn try_from(raw: RawParams) -> Result<Self, Self::Error> {
        let mask_offset = raw.mask_offset.unwrap_or(raw.intermediate_offset);
        let params = PermutationParams::new(raw.prime, mask_offset, raw.offset)?;
        Ok(params.with_intermediate_offset(raw.intermediate_offset))
    }
}

impl PermutationParams {
    /// Validates the parameters and derives the mask band.
    ///
    /// `prime` must be a prime congruent to 3 modulo 4 and
    /// `intermediate_offset` must be smaller than it.  `offset` is added to
    /// every output and is unconstrained.
    ///
    /// ```
    /// use qrprng::{ParamError, PermutationParams};
    ///
    /// assert!(PermutationParams::new(11, 0, 0).is_ok());
    /// assert_eq!(
    ///     PermutationParams::new(13, 0, 0),
    ///     Err(ParamError::InvalidPrimeForm { prime: 13 })
    /// );
    /// ```
    pub fn new(prime: u64, intermediate_offset: u64, offset: u64) -> Result<Self, ParamError> {
        if let Err(err) = validate(prime, intermediate_offset) {
            debug!(prime, intermediate_offset, %err, "rejected permutation parameters");
            return Err(err);
        }
        let max_mask = calculate_max_mask(prime);
        let mask = calculate_mask(prime, intermediate_offset, max_mask);
        debug!(
            prime,
            intermediate_offset, offset, max_mask, mask, "permutation parameters validated"
        );
        Ok(Self {
            prime,
            intermediate_offset,
            offset,
            max_mask,
            mask,
            mask_offset: intermediate_offset,
            field: Field::new(prime),
        })
    }

    /// Returns the prime bounding the permutation domain.
    pub fn prime(&self) -> u64 {
        self.prime
    }

    /// Returns the intermediate offset (secondary seed).
    pub fn intermediate_offset(&self) -> u64 {
        self.intermediate_offset
    }

    /// Returns the offset added to every output.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Returns the upper bound of the masked low band.
    pub fn max_mask(&self) -> u64 {
        self.max_mask
    }

    /// Returns the XOR mask applied inside the low band.
    pub fn mask(&self) -> u64 {
        self.mask
    }

    /// Returns the intermediate offset the mask was derived from.
    ///
    /// Equal to [`intermediate_offset`](Self::intermediate_offset) until a
    /// generator reseeds these parameters.
    pub fn mask_offset(&self) -> u64 {
        self.mask_offset
    }

    /// Copies these parameters with a different intermediate offset while
    /// keeping the derived mask values.
    ///
    /// The new offset is not checked against the prime; the permutation
    /// still holds because the offset is reduced modulo the prime when
    /// applied.
    pub(crate) fn with_intermediate_offset(mut self, intermediate_offset: u64) -> Self {
        self.intermediate_offset = intermediate_offset;
        self
    }

    /// Returns the `i`-th element of the permutation.
    ///
    /// Indices at or past the prime are reported as [`IndexOutOfRange`];
    /// use [`evaluate`](Self::evaluate) to accept them anyway.
    ///
    /// ```
    /// use qrprng::PermutationParams;
    ///
    /// let params = PermutationParams::new(11, 0, 0).unwrap();
    /// let mut seen: Vec<u64> = (0..11).map(|i| params.index(i).unwrap()).collect();
    /// seen.sort_unstable();
    /// assert_eq!(seen, (0..11).collect::<Vec<_>>());
    /// assert!(params.index(11).is_err());
    /// ```
    pub fn index(&self, i: u64) -> Result<u64, IndexOutOfRange> {
        if i >= self.prime {
            return Err(IndexOutOfRange {
                index: i,
                prime: self.prime,
            });
        }
        Ok(self.evaluate(i))
    }

    /// Evaluates the permutation without the index bound check.
    ///
    /// Inputs past the prime are folded by the residue arithmetic and do
    /// not extend the permutation property.
    #[inline]
    pub fn evaluate(&self, i: u64) -> u64 {
        let intermediate = self
            .field
            .add(quadratic_residue(i, self.prime), self.intermediate_offset);
        let masked = apply_mask(intermediate, self.max_mask, self.mask);
        self.offset.wrapping_add(quadratic_residue(masked, self.prime))
    }

    /// Iterates over one full period, index `0` through `prime - 1`.
    pub fn iter(&self) -> PermutationIter {
        PermutationIter {
            params: *self,
            next: 0,
        }
    }
}

/// Computes the folded quadratic residue of `i` modulo `prime`.
///
/// For `i ≤ prime / 2` this is `i² mod prime`, otherwise `prime − (i² mod prime)`.
/// Only a prime `≡ 3 (mod 4)` makes this a bijection, but any non-zero
/// modulus is evaluated.
///
/// # Panics
///
/// Panics if `prime` is zero.
#[inline]
pub fn quadratic_residue(i: u64, prime: u64) -> u64 {
    let residue = ((i as u128 * i as u128) % prime as u128) as u64;
    if i <= prime / 2 {
        residue
    } else {
        prime - residue
    }
}

/// XORs `i` with `mask` when `i ≤ max_mask`; larger values pass through.
#[inline]
pub fn apply_mask(i: u64, max_mask: u64, mask: u64) -> u64 {
    if i <= max_mask {
        i ^ mask
    } else {
        i
    }
}

fn validate(prime: u64, intermediate_offset: u64) -> Result<(), ParamError> {
    if prime % 4 != 3 {
        Err(ParamError::InvalidPrimeForm { prime })
    } else if intermediate_offset >= prime {
        Err(ParamError::OffsetOutOfRange {
            intermediate_offset,
            prime,
        })
    } else if !is_prime(prime) {
        Err(ParamError::NotPrime { prime })
    } else {
        Ok(())
    }
}

/// `2^(bitlen(prime - 1) - 1) - 1`: all ones, one bit shorter than `prime - 1`.
fn calculate_max_mask(prime: u64) -> u64 {
    let prime_bits = bit_len(prime - 1);
    (1u64 << (prime_bits - 1)) - 1
}

/// Picks a mask in `[min, max_mask)` where `min` is the top bit of `max_mask`.
fn calculate_mask(prime: u64, intermediate_offset: u64, max_mask: u64) -> u64 {
    let min = 1u64 << (bit_len(max_mask) - 1);
    let span = max_mask - min;
    if span == 0 {
        // Only reachable for prime = 3.
        return min;
    }
    // Wrapping sum: keeps the default generator on the reference stream.
    min + prime.wrapping_add(intermediate_offset) % span
}

#[inline]
fn bit_len(n: u64) -> u32 {
    u64::BITS - n.leading_zeros()
}

/// Iterator over one full period of a permutation.
#[derive(Debug, Clone)]
pub struct PermutationIter {
    params: PermutationParams,
    next: u64,
}

impl Iterator for PermutationIter {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.next >= self.params.prime {
            return None;
        }
        let value = self.params.evaluate(self.next);
        self.next += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.params.prime - self.next) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(target_pointer_width = "64")]
impl ExactSizeIterator for PermutationIter {}

/// Verifies that one period visits every value of `[offset, offset + prime)`
/// exactly once.
///
/// Materialises the whole period, so memory grows linearly with the prime;
/// primes above [`MAX_CHECKED_PRIME`] are refused.
pub fn check_full_period(params: &PermutationParams) -> Result<(), PeriodError> {
    let prime = params.prime();
    if prime > MAX_CHECKED_PRIME {
        return Err(PeriodError::TooLarge {
            prime,
            limit: MAX_CHECKED_PRIME,
        });
    }
    let values = evaluate_period(params);
    const UNSEEN: u64 = u64::MAX;
    let mut first_seen = vec![UNSEEN; prime as usize];
    for (index, &value) in values.iter().enumerate() {
        let index = index as u64;
        let slot = value.wrapping_sub(params.offset());
        if slot >= prime {
            return Err(PeriodError::OutOfRange { index, value });
        }
        let first = first_seen[slot as usize];
        if first != UNSEEN {
            return Err(PeriodError::Repeated {
                value,
                first,
                second: index,
            });
        }
        first_seen[slot as usize] = index;
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn evaluate_period(params: &PermutationParams) -> Vec<u64> {
    const PARALLEL_THRESHOLD: u64 = 1 << 16;
    let prime = params.prime();
    if prime >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
        (0..prime as usize)
            .into_par_iter()
            .map(|i| params.evaluate(i as u64))
            .collect()
    } else {
        params.iter().collect()
    }
}

#[cfg(target_arch = "wasm32")]
fn evaluate_period(params: &PermutationParams) -> Vec<u64> {
    params.iter().collect()
}
