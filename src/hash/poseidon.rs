//! Implementation of the Poseidon permutation, as described in
//! https://eprint.iacr.org/2019/458.pdf

use alloc::vec::Vec;

use crate::field::types::Field;
use crate::hash::constants::{WidthConstants, N_ROUNDS_F};

pub(crate) const HALF_N_FULL_ROUNDS: usize = N_ROUNDS_F / 2;

/// x ↦ x⁵; the smallest odd exponent coprime to the order of the multiplicative group,
/// so the map is a bijection.
#[inline]
pub(crate) fn sbox_monomial<F: Field>(x: F) -> F {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x
}

#[inline]
fn sbox_layer<F: Field>(state: &mut [F]) {
    for x in state.iter_mut() {
        *x = sbox_monomial(*x);
    }
}

#[inline]
fn constant_layer<F: Field>(state: &mut [F], constants: &[F], offset: usize) {
    for (i, x) in state.iter_mut().enumerate() {
        *x += constants[offset + i];
    }
}

/// Mixes `state` through `m`, accumulating into `scratch` to avoid aliasing. Output
/// slot i collects `m[j][i] * state[j]` over all input slots j; swapping the indices
/// inverts the matrix and breaks digest compatibility.
#[inline]
fn mds_layer<F: Field>(state: &mut [F], scratch: &mut [F], m: &[Vec<F>]) {
    for (i, out) in scratch.iter_mut().enumerate() {
        *out = F::ZERO;
        for (j, &s) in state.iter().enumerate() {
            *out = out.multiply_accumulate(m[j][i], s);
        }
    }
    state.copy_from_slice(scratch);
}

/// Applies the Poseidon permutation to `state` in place.
///
/// `scratch` must have the same length as `state`; its contents are ignored on entry
/// and unspecified on exit. Nothing is allocated inside the round loops.
pub fn permute<F: Field>(state: &mut [F], scratch: &mut [F], k: &WidthConstants<F>) {
    let t = state.len();
    assert_eq!(t, k.width, "state width does not match the constant tables");
    assert_eq!(t, scratch.len(), "scratch length does not match the state");

    let c = &k.round_constants;
    constant_layer(state, c, 0);

    for r in 0..HALF_N_FULL_ROUNDS - 1 {
        sbox_layer(state);
        constant_layer(state, c, (r + 1) * t);
        mds_layer(state, scratch, &k.mds);
    }
    sbox_layer(state);
    constant_layer(state, c, HALF_N_FULL_ROUNDS * t);
    mds_layer(state, scratch, &k.pre_sparse);

    for i in 0..k.n_rounds_p {
        state[0] = sbox_monomial(state[0]);
        state[0] += c[(HALF_N_FULL_ROUNDS + 1) * t + i];

        let s = &k.sparse_factors;
        let off = (2 * t - 1) * i;
        let mut new0 = F::ZERO;
        for (j, &x) in state.iter().enumerate() {
            new0 = new0.multiply_accumulate(s[off + j], x);
        }
        // The fan-out below reads the pre-update slot 0, so the new value is written
        // only after the other slots are done with the old one.
        let old0 = state[0];
        for j in 1..t {
            state[j] = state[j].multiply_accumulate(old0, s[off + t + j - 1]);
        }
        state[0] = new0;
    }

    for r in 0..HALF_N_FULL_ROUNDS - 1 {
        sbox_layer(state);
        constant_layer(state, c, (HALF_N_FULL_ROUNDS + 1) * t + k.n_rounds_p + r * t);
        mds_layer(state, scratch, &k.mds);
    }
    sbox_layer(state);
    mds_layer(state, scratch, &k.mds);
}

/// Dense reference schedule: every round adds a full constant block, applies the S-box
/// (all slots in full rounds, slot 0 only in partial rounds) and mixes through the
/// dense matrix. The sparse schedule in [`permute`] is checked against this.
#[cfg(test)]
pub(crate) fn permute_naive<F: Field>(
    state: &mut [F],
    ark: &[Vec<F>],
    a: &[Vec<F>],
    n_rounds_p: usize,
) {
    let t = state.len();
    let mut scratch = alloc::vec![F::ZERO; t];
    for (r, block) in ark.iter().enumerate() {
        for (x, &c) in state.iter_mut().zip(block) {
            *x += c;
        }
        if r < HALF_N_FULL_ROUNDS || r >= HALF_N_FULL_ROUNDS + n_rounds_p {
            sbox_layer(state);
        } else {
            state[0] = sbox_monomial(state[0]);
        }
        for (i, out) in scratch.iter_mut().enumerate() {
            *out = F::ZERO;
            for (j, &s) in state.iter().enumerate() {
                *out = out.multiply_accumulate(a[i][j], s);
            }
        }
        state.copy_from_slice(&scratch);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::{permute, permute_naive, sbox_monomial};
    use crate::field::bn254::Bn254Field;
    use crate::field::types::{Field, Sample};
    use crate::hash::constants::{constants, grain_parameters, MAX_WIDTH, MIN_WIDTH, N_ROUNDS_P};

    #[test]
    fn sparse_schedule_matches_dense() {
        for t in MIN_WIDTH..=MAX_WIDTH {
            let k = constants().for_width(t);
            let input: Vec<Bn254Field> =
                (0..t as u64).map(Bn254Field::from_canonical_u64).collect();

            let mut fast = input.clone();
            let mut scratch = vec![Bn254Field::ZERO; t];
            permute(&mut fast, &mut scratch, k);

            let (ark, a) = grain_parameters::<Bn254Field>(t);
            let mut dense = input;
            permute_naive(&mut dense, &ark, &a, N_ROUNDS_P[t - MIN_WIDTH]);

            assert_eq!(fast, dense, "schedules disagree at width {}", t);
        }
    }

    #[test]
    fn determinism() {
        let t = 3;
        let k = constants().for_width(t);
        let input = Bn254Field::rand_vec(t);
        let mut scratch = vec![Bn254Field::ZERO; t];

        let mut first = input.clone();
        permute(&mut first, &mut scratch, k);
        let mut second = input;
        permute(&mut second, &mut scratch, k);
        assert_eq!(first, second);
    }

    #[test]
    fn sbox_is_fifth_power() {
        for _ in 0..10 {
            let x = Bn254Field::rand();
            assert_eq!(sbox_monomial(x), x.exp_u64(5));
        }
    }
}
