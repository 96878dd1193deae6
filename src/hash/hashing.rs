//! Fixed-width Poseidon hashing over big integers.
//!
//! A hash of n inputs runs one permutation of width t = n + 1: slot 0 carries the
//! capacity (initial state) on input and the digest on output, slots 1..=n carry the
//! inputs in order.

use alloc::vec;
use alloc::vec::Vec;

use num::bigint::BigUint;

use crate::field::bn254::Bn254Field;
use crate::field::types::{Field, PrimeField};
use crate::hash::constants::{constants, MAX_WIDTH};
use crate::hash::error::PoseidonError;
use crate::hash::poseidon::permute;

/// Largest number of inputs a single permutation can absorb.
pub const MAX_INPUTS: usize = MAX_WIDTH - 1;

/// Hashes 1..=[`MAX_INPUTS`] field elements with the given capacity element, returning
/// the first `n_outs` state slots.
pub fn hash_fixed(
    inputs: &[Bn254Field],
    init_state: Bn254Field,
    n_outs: usize,
) -> Result<Vec<Bn254Field>, PoseidonError> {
    if inputs.is_empty() || inputs.len() > MAX_INPUTS {
        return Err(PoseidonError::InputsLengthInvalid { len: inputs.len() });
    }
    let t = inputs.len() + 1;
    if n_outs < 1 || n_outs > t {
        return Err(PoseidonError::NOutsInvalid { n_outs, max: t });
    }

    let mut state = vec![Bn254Field::ZERO; t];
    state[0] = init_state;
    state[1..].copy_from_slice(inputs);
    let mut scratch = vec![Bn254Field::ZERO; t];
    permute(&mut state, &mut scratch, constants().for_width(t));

    state.truncate(n_outs);
    Ok(state)
}

/// Converts big integers to field elements, rejecting any value outside `[0, p)`.
pub(crate) fn parse_inputs(inputs: &[BigUint]) -> Result<Vec<Bn254Field>, PoseidonError> {
    let order = Bn254Field::order();
    inputs
        .iter()
        .enumerate()
        .map(|(index, n)| {
            if *n < order {
                Ok(Bn254Field::from_noncanonical_biguint(n.clone()))
            } else {
                Err(PoseidonError::InputNotInField { index })
            }
        })
        .collect()
}

/// Poseidon hash of 1..=16 big integers in `[0, p)`.
pub fn hash(inputs: &[BigUint]) -> Result<BigUint, PoseidonError> {
    hash_with_state(inputs, &BigUint::from(0u32))
}

/// Like [`hash`], but returns the first `n_outs` state slots, which include the
/// intermediate state beyond the digest.
pub fn hash_ex(inputs: &[BigUint], n_outs: usize) -> Result<Vec<BigUint>, PoseidonError> {
    hash_with_state_ex(inputs, &BigUint::from(0u32), n_outs)
}

/// Poseidon hash with an explicit capacity element.
pub fn hash_with_state(
    inputs: &[BigUint],
    init_state: &BigUint,
) -> Result<BigUint, PoseidonError> {
    let mut outs = hash_with_state_ex(inputs, init_state, 1)?;
    Ok(outs.remove(0))
}

/// Poseidon hash with an explicit capacity element, returning `n_outs` state slots.
pub fn hash_with_state_ex(
    inputs: &[BigUint],
    init_state: &BigUint,
    n_outs: usize,
) -> Result<Vec<BigUint>, PoseidonError> {
    if inputs.is_empty() || inputs.len() > MAX_INPUTS {
        return Err(PoseidonError::InputsLengthInvalid { len: inputs.len() });
    }
    let elements = parse_inputs(inputs)?;
    let t = inputs.len() + 1;
    if n_outs < 1 || n_outs > t {
        return Err(PoseidonError::NOutsInvalid { n_outs, max: t });
    }
    if *init_state >= Bn254Field::order() {
        return Err(PoseidonError::InitStateNotInField);
    }
    let init = Bn254Field::from_noncanonical_biguint(init_state.clone());

    let outs = hash_fixed(&elements, init, n_outs)?;
    Ok(outs.iter().map(PrimeField::to_canonical_biguint).collect())
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use num::bigint::BigUint;

    use super::{hash, hash_ex, hash_with_state, hash_with_state_ex, MAX_INPUTS};
    use crate::field::bn254::Bn254Field;
    use crate::field::types::Field;
    use crate::hash::error::PoseidonError;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    fn big_str(s: &str) -> BigUint {
        BigUint::parse_bytes(s.as_bytes(), 10).unwrap()
    }

    #[test]
    fn known_vectors() {
        assert_eq!(
            hash(&[big(1)]).unwrap(),
            big_str("18586133768512220936620570745912940619677854269274689475585506675881198879027"),
        );
        assert_eq!(
            hash(&[big(1), big(2)]).unwrap(),
            big_str("7853200120776062878684798364095072458815029376092732009249414926327459813530"),
        );
        assert_eq!(
            hash(&[big(1), big(2), big(3), big(4), big(5)]).unwrap(),
            big_str("6183221330272524915741101941148645335231805277611746212440159767200113488975"),
        );
    }

    #[test]
    fn zero_capacity_matches_plain_hash() {
        let inputs = [big(1), big(2), big(3)];
        assert_eq!(
            hash(&inputs).unwrap(),
            hash_with_state(&inputs, &big(0)).unwrap()
        );
    }

    #[test]
    fn capacity_changes_digest() {
        let inputs = [big(1)];
        assert_ne!(
            hash(&inputs).unwrap(),
            hash_with_state(&inputs, &big(7)).unwrap()
        );
    }

    #[test]
    fn every_width_produces_a_reduced_digest() {
        let order = Bn254Field::order();
        for n in 1..=MAX_INPUTS {
            let inputs: Vec<BigUint> = (1..=n as u64).map(big).collect();
            let digest = hash(&inputs).unwrap();
            assert!(digest < order, "digest out of field for {} inputs", n);
        }
    }

    #[test]
    fn hash_ex_extends_the_digest() {
        let inputs = [big(1), big(2)];
        let outs = hash_ex(&inputs, 3).unwrap();
        assert_eq!(outs.len(), 3);
        assert_eq!(outs[0], hash(&inputs).unwrap());
    }

    #[test]
    fn determinism() {
        let inputs = [big(42), big(43)];
        assert_eq!(hash(&inputs).unwrap(), hash(&inputs).unwrap());
    }

    #[test]
    fn rejects_invalid_input_counts() {
        assert_eq!(
            hash(&[]),
            Err(PoseidonError::InputsLengthInvalid { len: 0 })
        );
        let too_many: Vec<BigUint> = (0..17u64).map(big).collect();
        assert_eq!(
            hash(&too_many),
            Err(PoseidonError::InputsLengthInvalid { len: 17 })
        );
        let max: Vec<BigUint> = (0..16u64).map(big).collect();
        assert!(hash(&max).is_ok());
    }

    #[test]
    fn rejects_unreduced_values() {
        let order = Bn254Field::order();
        assert_eq!(
            hash(&[big(1), order.clone()]),
            Err(PoseidonError::InputNotInField { index: 1 })
        );
        assert_eq!(
            hash_with_state(&[big(1)], &order),
            Err(PoseidonError::InitStateNotInField)
        );
        // p - 1 is the largest admissible value.
        assert!(hash(&[order - 1u32]).is_ok());
    }

    #[test]
    fn rejects_invalid_n_outs() {
        assert_eq!(
            hash_ex(&[big(1)], 0),
            Err(PoseidonError::NOutsInvalid { n_outs: 0, max: 2 })
        );
        assert_eq!(
            hash_ex(&[big(1)], 3),
            Err(PoseidonError::NOutsInvalid { n_outs: 3, max: 2 })
        );
        assert_eq!(hash_ex(&[big(1)], 2).unwrap().len(), 2);
    }

    #[test]
    fn full_state_output_matches_ex_variants() {
        let inputs = [big(5), big(6)];
        let with_state = hash_with_state_ex(&inputs, &big(0), 3).unwrap();
        let plain = hash_ex(&inputs, 3).unwrap();
        assert_eq!(with_state, plain);
    }
}
