//! The design philosophy underlying `qrprng` is small, yet mathematically exact.
//! Each module encapsulates one step of the quadratic-residue construction,
//! illustrating how modest arithmetic primitives compose into a full-period permutation.
//!
//! Prime field arithmetic.
//!
//! This module provides the handful of modular operations the permutation
//! engine needs.  The [`Field`](struct.Field.html) type encapsulates a
//! modulus and exposes addition, squaring, multiplication and
//! exponentiation.  Products are computed with 128-bit intermediates so
//! that moduli close to `2^64` never overflow.  The free function
//! [`is_prime`] runs a deterministic Miller–Rabin test over `u64`.

/// Witness set that makes Miller–Rabin exact for every `n < 2^64`.
const MILLER_RABIN_BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];

/// Arithmetic modulo a fixed odd modulus.
///
/// The `Field` type does not perform primality testing on construction;
/// call [`is_prime`] first when the modulus comes from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    p: u64,
}

impl Field {
    /// Creates arithmetic modulo `p`.
    ///
    /// # Panics
    ///
    /// Panics if the modulus is less than 3 or even.
    pub fn new(p: u64) -> Self {
        assert!(p >= 3 && p % 2 == 1, "p must be an odd modulus >= 3");
        Field { p }
    }

    /// Returns the modulus.
    #[inline]
    pub fn modulus(&self) -> u64 {
        self.p
    }

    /// Adds two values modulo `p`.  Neither operand needs to be reduced.
    #[inline]
    pub fn add(&self, a: u64, b: u64) -> u64 {
        ((a as u128 + b as u128) % self.p as u128) as u64
    }

    /// Multiplies two values modulo `p`.
    #[inline]
    pub fn mul(&self, a: u64, b: u64) -> u64 {
        ((a as u128 * b as u128) % self.p as u128) as u64
    }

    /// Squares `a` modulo `p`.
    #[inline]
    pub fn square(&self, a: u64) -> u64 {
        self.mul(a, a)
    }

    /// Exponentiates `a` by `e` modulo `p`.
    #[inline]
    pub fn pow(&self, mut a: u64, mut e: u64) -> u64 {
        a %= self.p;
        let mut result = 1u64;
        while e > 0 {
            if e & 1 == 1 {
                result = self.mul(result, a);
            }
            a = self.mul(a, a);
            e >>= 1;
        }
        result
    }
}

/// Returns `true` when `n` is prime.
///
/// Uses Miller–Rabin with the first twelve primes as witnesses, which has
/// no false positives below `2^64`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    for &small in &MILLER_RABIN_BASES {
        if n == small {
            return true;
        }
        if n % small == 0 {
            return false;
        }
    }
    let field = Field::new(n);
    let mut d = n - 1;
    let mut s = 0u32;
    while d % 2 == 0 {
        d >>= 1;
        s += 1;
    }
    'witness: for &a in &MILLER_RABIN_BASES {
        let mut x = field.pow(a, d);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = field.square(x);
            if x == n - 1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
