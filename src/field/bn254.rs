use alloc::vec::Vec;
use core::fmt;
use core::fmt::{Debug, Display, Formatter};
use core::hash::{Hash, Hasher};
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use itertools::Itertools;
use num::bigint::BigUint;
use num::Integer;
use serde::{Deserialize, Serialize};

use crate::field::types::{Field, PrimeField, Sample};

/// The order of the BN254 scalar field,
/// p = 21888242871839275222246405745257275088548364400416034343698204186575808495617,
/// as little-endian u64 limbs.
const ORDER_LIMBS: [u64; 4] = [
    0x43e1f593f0000001,
    0x2833e84879b97091,
    0xb85045b68181585d,
    0x30644e72e131a029,
];

/// An element of the BN254 scalar field, stored as a fully reduced residue in
/// little-endian u64 limbs.
#[derive(Copy, Clone, Serialize, Deserialize)]
pub struct Bn254Field(pub [u64; 4]);

fn biguint_from_array(arr: [u64; 4]) -> BigUint {
    BigUint::from_slice(&[
        arr[0] as u32,
        (arr[0] >> 32) as u32,
        arr[1] as u32,
        (arr[1] >> 32) as u32,
        arr[2] as u32,
        (arr[2] >> 32) as u32,
        arr[3] as u32,
        (arr[3] >> 32) as u32,
    ])
}

/// Limb-wise `lhs >= rhs`.
#[inline]
fn ge(lhs: &[u64; 4], rhs: &[u64; 4]) -> bool {
    for i in (0..4).rev() {
        if lhs[i] != rhs[i] {
            return lhs[i] > rhs[i];
        }
    }
    true
}

/// Limb-wise addition; the carry out of the top limb cannot occur for reduced operands.
#[inline]
fn add_limbs(lhs: &[u64; 4], rhs: &[u64; 4]) -> [u64; 4] {
    let mut res = [0u64; 4];
    let mut carry = 0u64;
    for i in 0..4 {
        let sum = (lhs[i] as u128) + (rhs[i] as u128) + (carry as u128);
        res[i] = sum as u64;
        carry = (sum >> 64) as u64;
    }
    debug_assert_eq!(carry, 0);
    res
}

/// Limb-wise subtraction, assuming `lhs >= rhs`.
#[inline]
fn sub_limbs(lhs: &[u64; 4], rhs: &[u64; 4]) -> [u64; 4] {
    let mut res = [0u64; 4];
    let mut borrow = 0u64;
    for i in 0..4 {
        let (d, b1) = lhs[i].overflowing_sub(rhs[i]);
        let (d, b2) = d.overflowing_sub(borrow);
        res[i] = d;
        borrow = (b1 | b2) as u64;
    }
    debug_assert_eq!(borrow, 0);
    res
}

impl Default for Bn254Field {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Bn254Field {
    fn eq(&self, other: &Self) -> bool {
        // Residues are kept reduced, so limb equality is canonical equality.
        self.0 == other.0
    }
}

impl Eq for Bn254Field {}

impl Hash for Bn254Field {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Display for Bn254Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.to_canonical_biguint(), f)
    }
}

impl Debug for Bn254Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.to_canonical_biguint(), f)
    }
}

impl Sample for Bn254Field {
    #[inline]
    fn sample<R>(rng: &mut R) -> Self
    where
        R: rand::RngCore + ?Sized,
    {
        use num::bigint::RandBigInt;
        Self::from_noncanonical_biguint(rng.gen_biguint_below(&Self::order()))
    }
}

impl Field for Bn254Field {
    const ZERO: Self = Self([0; 4]);

    const ONE: Self = Self([1, 0, 0, 0]);

    const TWO: Self = Self([2, 0, 0, 0]);

    const NEG_ONE: Self = Self([
        0x43e1f593f0000000,
        0x2833e84879b97091,
        0xb85045b68181585d,
        0x30644e72e131a029,
    ]);

    const BITS: usize = 254;

    fn order() -> BigUint {
        biguint_from_array(ORDER_LIMBS)
    }

    fn try_inverse(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }

        // Fermat's Little Theorem
        Some(self.exp_biguint(&(Self::order() - 2u32)))
    }

    fn from_noncanonical_biguint(n: BigUint) -> Self {
        Self(
            n.mod_floor(&Self::order())
                .to_u64_digits()
                .into_iter()
                .pad_using(4, |_| 0)
                .collect::<Vec<_>>()[..]
                .try_into()
                .expect("error converting to u64 array"),
        )
    }

    fn from_canonical_u64(n: u64) -> Self {
        Self([n, 0, 0, 0])
    }
}

impl PrimeField for Bn254Field {
    fn to_canonical_biguint(&self) -> BigUint {
        biguint_from_array(self.0)
    }
}

impl Neg for Bn254Field {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        if self.is_zero() {
            Self::ZERO
        } else {
            Self(sub_limbs(&ORDER_LIMBS, &self.0))
        }
    }
}

impl Add for Bn254Field {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut sum = add_limbs(&self.0, &rhs.0);
        if ge(&sum, &ORDER_LIMBS) {
            sum = sub_limbs(&sum, &ORDER_LIMBS);
        }
        Self(sum)
    }
}

impl AddAssign for Bn254Field {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for Bn254Field {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, x| acc + x)
    }
}

impl Sub for Bn254Field {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        if ge(&self.0, &rhs.0) {
            Self(sub_limbs(&self.0, &rhs.0))
        } else {
            Self(sub_limbs(&add_limbs(&self.0, &ORDER_LIMBS), &rhs.0))
        }
    }
}

impl SubAssign for Bn254Field {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul for Bn254Field {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self::from_noncanonical_biguint(self.to_canonical_biguint() * rhs.to_canonical_biguint())
    }
}

impl MulAssign for Bn254Field {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}
