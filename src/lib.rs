//! Poseidon hash function over the BN254 scalar field.
//!
//! The permutation follows <https://eprint.iacr.org/2019/458.pdf> with x⁵ S-boxes,
//! 8 full rounds and a width-dependent number of partial rounds executed through the
//! sparse-matrix schedule, for state widths 2..=17. On top of it sit fixed-input
//! hashing of up to 16 big integers and sponge hashing of arbitrary-length element
//! streams or byte strings (31-byte chunks). Digests are compatible with the
//! circomlib / go-iden3-crypto parameter sets for BN254.
//!
//! ```
//! use num::bigint::BigUint;
//! use poseidon_bn254::hash;
//!
//! let digest = hash(&[BigUint::from(1u32), BigUint::from(2u32)]).unwrap();
//! assert_eq!(
//!     digest,
//!     BigUint::parse_bytes(
//!         b"7853200120776062878684798364095072458815029376092732009249414926327459813530",
//!         10,
//!     )
//!     .unwrap(),
//! );
//! ```

#![allow(clippy::needless_range_loop)]

extern crate alloc;

pub mod field;
pub mod hash;

pub use field::bn254::Bn254Field;
pub use hash::error::PoseidonError;
pub use hash::hashing::{hash, hash_ex, hash_fixed, hash_with_state, hash_with_state_ex, MAX_INPUTS};
pub use hash::sponge::{
    sponge_hash, sponge_hash_bytes, sponge_hash_bytes_digest, sponge_hash_bytes_ex,
    sponge_hash_ex, DEFAULT_FRAME_SIZE, MAX_FRAME_SIZE, MIN_FRAME_SIZE, SPONGE_CHUNK_SIZE,
};
