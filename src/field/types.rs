use alloc::vec;
use alloc::vec::Vec;
use core::fmt::{Debug, Display};
use core::hash::Hash;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use num::bigint::BigUint;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::field::ops::Square;

/// Sampling
pub trait Sample: Sized {
    /// Samples a single value using `rng`.
    fn sample<R>(rng: &mut R) -> Self
    where
        R: rand::RngCore + ?Sized;

    /// Samples a single value using the [`OsRng`].
    #[inline]
    fn rand() -> Self {
        Self::sample(&mut OsRng)
    }

    /// Samples a [`Vec`] of values of length `n` using [`OsRng`].
    #[inline]
    fn rand_vec(n: usize) -> Vec<Self> {
        (0..n).map(|_| Self::rand()).collect()
    }

    /// Samples an array of values of length `N` using [`OsRng`].
    #[inline]
    fn rand_array<const N: usize>() -> [Self; N] {
        Self::rand_vec(N)
            .try_into()
            .ok()
            .expect("This conversion can never fail.")
    }
}

/// A finite field.
pub trait Field:
    'static
    + Copy
    + Eq
    + Hash
    + Neg<Output = Self>
    + Add<Self, Output = Self>
    + AddAssign<Self>
    + Sum
    + Sub<Self, Output = Self>
    + SubAssign<Self>
    + Mul<Self, Output = Self>
    + MulAssign<Self>
    + Square
    + Debug
    + Default
    + Display
    + Sample
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
{
    const ZERO: Self;
    const ONE: Self;
    const TWO: Self;
    const NEG_ONE: Self;

    /// The bit length of the field order.
    const BITS: usize;

    fn order() -> BigUint;

    #[inline]
    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    #[inline]
    fn is_nonzero(&self) -> bool {
        *self != Self::ZERO
    }

    #[inline]
    fn is_one(&self) -> bool {
        *self == Self::ONE
    }

    #[inline]
    fn double(&self) -> Self {
        *self + *self
    }

    /// Compute the multiplicative inverse of this field element.
    fn try_inverse(&self) -> Option<Self>;

    fn inverse(&self) -> Self {
        self.try_inverse().expect("Tried to invert zero")
    }

    fn batch_multiplicative_inverse(x: &[Self]) -> Vec<Self> {
        // This is Montgomery's trick. At a high level, we invert the product of the given field
        // elements, then derive the individual inverses from that via multiplication.
        let n = x.len();
        if n == 0 {
            return Vec::new();
        }
        if n == 1 {
            return vec![x[0].inverse()];
        }

        // cumul[i] = x[0] * ... * x[i]
        let mut cumul = Vec::with_capacity(n);
        let mut acc = x[0];
        cumul.push(acc);
        for &xi in &x[1..] {
            acc *= xi;
            cumul.push(acc);
        }

        // Invert the total product once, then peel off individual inverses from the back.
        let mut inv_acc = acc.inverse();
        let mut res = vec![Self::ZERO; n];
        for i in (1..n).rev() {
            res[i] = inv_acc * cumul[i - 1];
            inv_acc *= x[i];
        }
        res[0] = inv_acc;

        for (&ri, &xi) in res.iter().zip(x) {
            // Sanity check only.
            debug_assert_eq!(ri * xi, Self::ONE);
        }

        res
    }

    /// Returns `n % Self::order()`.
    fn from_noncanonical_biguint(n: BigUint) -> Self;

    /// Returns `n`. Assumes that `n` is already in canonical form, i.e. `n < Self::order()`.
    fn from_canonical_u64(n: u64) -> Self;

    fn from_bool(b: bool) -> Self {
        Self::from_canonical_u64(b as u64)
    }

    fn exp_power_of_2(&self, power_log: usize) -> Self {
        let mut res = *self;
        for _ in 0..power_log {
            res = res.square();
        }
        res
    }

    fn exp_u64(&self, power: u64) -> Self {
        let mut current = *self;
        let mut product = Self::ONE;

        for j in 0..(64 - power.leading_zeros() as usize) {
            if ((power >> j) & 1) != 0 {
                product *= current;
            }
            current = current.square();
        }
        product
    }

    fn exp_biguint(&self, power: &BigUint) -> Self {
        let mut result = Self::ONE;
        for &digit in power.to_u64_digits().iter().rev() {
            result = result.exp_power_of_2(64);
            result *= self.exp_u64(digit);
        }
        result
    }

    /// Equivalent to *self + x * y, but may be cheaper.
    #[inline]
    fn multiply_accumulate(&self, x: Self, y: Self) -> Self {
        // Default implementation.
        *self + x * y
    }
}

pub trait PrimeField: Field {
    fn to_canonical_biguint(&self) -> BigUint;

    /// Interprets `bytes` as a big-endian unsigned integer, reduced modulo the field
    /// order.
    fn from_noncanonical_bytes_be(bytes: &[u8]) -> Self {
        Self::from_noncanonical_biguint(BigUint::from_bytes_be(bytes))
    }

    /// Canonical big-endian encoding, zero-padded to the full field width.
    fn to_bytes_be(&self) -> Vec<u8> {
        let raw = self.to_canonical_biguint().to_bytes_be();
        let width = (Self::BITS + 7) / 8;
        let mut bytes = vec![0u8; width];
        bytes[width - raw.len()..].copy_from_slice(&raw);
        bytes
    }
}
