//! Round-constant and matrix tables for the Poseidon permutation.
//!
//! The reference parameter sets are multi-megabyte tables, so they are not shipped as
//! data. Instead they are rebuilt on first use by the deterministic procedure they were
//! originally drawn with: an 80-bit Grain LFSR seeded with the permutation parameters
//! yields the round constants (by rejection sampling) and a Cauchy MDS matrix, and the
//! dense schedule is then rebased into the sparse partial-round form consumed by
//! [`crate::hash::poseidon::permute`]. The tables live in a process-global cell and are
//! never mutated after construction.

use alloc::vec;
use alloc::vec::Vec;

use num::bigint::BigUint;
use once_cell::sync::Lazy;

use crate::field::bn254::Bn254Field;
use crate::field::types::{Field, PrimeField};

/// Number of full rounds.
pub const N_ROUNDS_F: usize = 8;

/// Number of partial rounds, indexed by `t - 2` where `t` is the state width.
pub const N_ROUNDS_P: [usize; 16] = [
    56, 57, 56, 60, 60, 63, 64, 63, 60, 66, 60, 65, 70, 60, 64, 68,
];

/// Smallest supported state width.
pub const MIN_WIDTH: usize = 2;

/// Largest supported state width.
pub const MAX_WIDTH: usize = MIN_WIDTH + N_ROUNDS_P.len() - 1;

/// The 80-bit LFSR stream the reference parameter sets are drawn from.
///
/// Taps are at offsets 62, 51, 38, 23, 13 and 0; the raw keystream is passed through a
/// shrinking step that consumes bits in pairs and emits the second bit of a pair only
/// when the first is set.
struct GrainLfsr {
    state: [bool; 80],
    head: usize,
    prime_num_bits: usize,
}

impl GrainLfsr {
    fn new(prime_num_bits: usize, t: usize, n_rounds_f: usize, n_rounds_p: usize) -> Self {
        let mut state = [false; 80];

        // Seed layout: 2 bits field tag (01 = prime field), 4 bits S-box tag
        // (0000 = monomial), 12 bits field size, 12 bits width, 10 bits full rounds,
        // 10 bits partial rounds, 30 set bits.
        state[1] = true;
        Self::seed_bits(&mut state, 6, 17, prime_num_bits as u64);
        Self::seed_bits(&mut state, 18, 29, t as u64);
        Self::seed_bits(&mut state, 30, 39, n_rounds_f as u64);
        Self::seed_bits(&mut state, 40, 49, n_rounds_p as u64);
        for bit in state.iter_mut().skip(50) {
            *bit = true;
        }

        let mut lfsr = Self {
            state,
            head: 0,
            prime_num_bits,
        };
        // The first 160 keystream bits are discarded.
        for _ in 0..160 {
            lfsr.next_bit();
        }
        lfsr
    }

    /// Writes `value` into `state[lo..=hi]`, most significant bit first.
    fn seed_bits(state: &mut [bool; 80], lo: usize, hi: usize, value: u64) {
        let mut cur = value;
        for i in (lo..=hi).rev() {
            state[i] = cur & 1 == 1;
            cur >>= 1;
        }
        debug_assert_eq!(cur, 0);
    }

    fn next_bit(&mut self) -> bool {
        let bit = self.state[(self.head + 62) % 80]
            ^ self.state[(self.head + 51) % 80]
            ^ self.state[(self.head + 38) % 80]
            ^ self.state[(self.head + 23) % 80]
            ^ self.state[(self.head + 13) % 80]
            ^ self.state[self.head];
        self.state[self.head] = bit;
        self.head = (self.head + 1) % 80;
        bit
    }

    fn next_output_bit(&mut self) -> bool {
        loop {
            let select = self.next_bit();
            let bit = self.next_bit();
            if select {
                return bit;
            }
        }
    }

    /// The next `prime_num_bits`-bit integer, most significant bit first.
    fn next_integer(&mut self) -> BigUint {
        let mut acc = BigUint::from(0u32);
        for _ in 0..self.prime_num_bits {
            acc <<= 1u32;
            if self.next_output_bit() {
                acc |= BigUint::from(1u32);
            }
        }
        acc
    }

    /// Rejection-samples a uniformly distributed field element.
    fn next_field_element_rejecting<F: Field>(&mut self) -> F {
        let order = F::order();
        loop {
            let candidate = self.next_integer();
            if candidate < order {
                return F::from_noncanonical_biguint(candidate);
            }
        }
    }

    /// Reduces the next integer modulo the field order; matrix sampling does not reject.
    fn next_field_element_reducing<F: Field>(&mut self) -> F {
        let n = self.next_integer();
        F::from_noncanonical_biguint(n)
    }
}

/// Draws the raw parameter set for width `t`: one constant block per round, and the
/// dense mixing matrix whose entry `(i, j)` is the coefficient of input slot `j` in
/// output slot `i` (a Cauchy matrix `1 / (xs[i] + ys[j])` over sampled `xs`, `ys`).
pub(crate) fn grain_parameters<F: PrimeField>(t: usize) -> (Vec<Vec<F>>, Vec<Vec<F>>) {
    let n_rounds_p = N_ROUNDS_P[t - MIN_WIDTH];
    let mut lfsr = GrainLfsr::new(F::BITS, t, N_ROUNDS_F, n_rounds_p);

    let round_constants = (0..N_ROUNDS_F + n_rounds_p)
        .map(|_| (0..t).map(|_| lfsr.next_field_element_rejecting()).collect())
        .collect();

    let xs: Vec<F> = (0..t).map(|_| lfsr.next_field_element_reducing()).collect();
    let ys: Vec<F> = (0..t).map(|_| lfsr.next_field_element_reducing()).collect();
    let sums: Vec<F> = xs
        .iter()
        .flat_map(|&x| ys.iter().map(move |&y| x + y))
        .collect();
    let inverses = F::batch_multiplicative_inverse(&sums);
    let mds = inverses.chunks(t).map(|row| row.to_vec()).collect();

    (round_constants, mds)
}

fn mat_vec_mul<F: Field>(m: &[Vec<F>], v: &[F]) -> Vec<F> {
    m.iter()
        .map(|row| {
            row.iter()
                .zip(v)
                .fold(F::ZERO, |acc, (&mij, &vj)| acc.multiply_accumulate(mij, vj))
        })
        .collect()
}

fn mat_transpose<F: Field>(m: &[Vec<F>]) -> Vec<Vec<F>> {
    let n = m.len();
    (0..n).map(|i| (0..n).map(|j| m[j][i]).collect()).collect()
}

/// Gauss-Jordan inversion. The matrices inverted here are MDS matrices or submatrices
/// of them, which are nonsingular by construction.
fn mat_inverse<F: Field>(m: &[Vec<F>]) -> Vec<Vec<F>> {
    let n = m.len();
    let mut a = m.to_vec();
    let mut inv: Vec<Vec<F>> = (0..n)
        .map(|i| (0..n).map(|j| F::from_bool(i == j)).collect())
        .collect();

    for col in 0..n {
        let pivot = (col..n)
            .find(|&r| a[r][col].is_nonzero())
            .expect("matrix is singular");
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let scale = a[col][col].inverse();
        for j in 0..n {
            a[col][j] *= scale;
            inv[col][j] *= scale;
        }
        for r in 0..n {
            if r == col {
                continue;
            }
            let factor = a[r][col];
            if factor.is_zero() {
                continue;
            }
            for j in 0..n {
                let ta = a[col][j] * factor;
                a[r][j] -= ta;
                let ti = inv[col][j] * factor;
                inv[r][j] -= ti;
            }
        }
    }
    inv
}

/// The frozen table set for one state width.
pub struct WidthConstants<F> {
    /// Flat round-constant schedule: one block of `width` constants applied before the
    /// first round, one block after the S-box of each full round, and one single slot-0
    /// constant per partial round. The trailing block is zero; the final full round
    /// consumes no constants.
    pub round_constants: Vec<F>,
    /// Sparse partial-round factors, `2 * width - 1` per round: `width` coefficients
    /// combining the full state into the new slot 0, then `width - 1` fan-out
    /// coefficients applied to the pre-update slot 0.
    pub sparse_factors: Vec<F>,
    /// Dense mixing matrix; `mds[j][i]` is the coefficient of input slot `j` in output
    /// slot `i`.
    pub mds: Vec<Vec<F>>,
    /// Replaces `mds` in the full round preceding the partial rounds; same orientation.
    pub pre_sparse: Vec<Vec<F>>,
    /// State width this table set serves.
    pub width: usize,
    /// Number of partial rounds at this width.
    pub n_rounds_p: usize,
}

/// Rebases the dense per-round schedule for width `t` into the sparse form.
///
/// Round constants move to the post-S-box position by pulling them through the mixing
/// layer; partial-round blocks collapse to single slot-0 constants, with the remaining
/// components pushed into earlier rounds. The partial-round matrices factor as
/// `M = Λ · B₁` with `Λ` sparse (first row, first column, identity elsewhere); each
/// dense residue `B₁` folds into the preceding round, ending in the pre-sparse matrix
/// applied by the round just before the partial section. The result computes exactly
/// the same permutation as the dense schedule.
fn derive_width_constants<F: PrimeField>(t: usize) -> WidthConstants<F> {
    let half_full = N_ROUNDS_F / 2;
    let n_rounds_p = N_ROUNDS_P[t - MIN_WIDTH];
    let (ark, a) = grain_parameters::<F>(t);
    let a_inv = mat_inverse(&a);

    // rebased[r] is round r's constant block moved to its post-S-box position.
    let rebased: Vec<Vec<F>> = ark[1..].iter().map(|c| mat_vec_mul(&a_inv, c)).collect();

    // Collapse the partial-round blocks (rounds half_full .. half_full + n_rounds_p)
    // to slot-0 singles, moving the residues backwards into earlier rounds. The residue
    // of the first partial round lands in the transition round's block.
    let mut transition = rebased[half_full - 1].clone();
    let mut partial_blocks: Vec<Vec<F>> =
        rebased[half_full..half_full + n_rounds_p].to_vec();
    let mut singles = vec![F::ZERO; n_rounds_p];
    for i in (0..n_rounds_p).rev() {
        singles[i] = partial_blocks[i][0];
        let mut rest = partial_blocks[i].clone();
        rest[0] = F::ZERO;
        let moved = mat_vec_mul(&a_inv, &rest);
        let target = if i > 0 {
            &mut partial_blocks[i - 1]
        } else {
            &mut transition
        };
        for (dst, src) in target.iter_mut().zip(moved) {
            *dst += src;
        }
    }

    // Factor the partial-round matrices, last round first.
    let mut m_cur = a.clone();
    let mut sparse_factors = vec![F::ZERO; (2 * t - 1) * n_rounds_p];
    for i in (0..n_rounds_p).rev() {
        let a00 = m_cur[0][0];
        let v: Vec<F> = m_cur[0][1..].to_vec();
        let w: Vec<F> = (1..t).map(|r| m_cur[r][0]).collect();
        let a_hat: Vec<Vec<F>> = (1..t).map(|r| m_cur[r][1..].to_vec()).collect();

        // Solve a_hatᵀ · u = v so the sparse factor reproduces row 0 of m_cur.
        let u = mat_vec_mul(&mat_inverse(&mat_transpose(&a_hat)), &v);

        let off = (2 * t - 1) * i;
        sparse_factors[off] = a00;
        sparse_factors[off + 1..off + t].copy_from_slice(&u);
        sparse_factors[off + t..off + 2 * t - 1].copy_from_slice(&w);

        // The dense residue diag(1, a_hat) folds into the previous round's matrix.
        let mut folded = vec![vec![F::ZERO; t]; t];
        folded[0] = a[0].clone();
        for r in 1..t {
            for (c, entry) in folded[r].iter_mut().enumerate() {
                let mut acc = F::ZERO;
                for k in 1..t {
                    acc = acc.multiply_accumulate(a_hat[r - 1][k - 1], a[k][c]);
                }
                *entry = acc;
            }
        }
        m_cur = folded;
    }
    let pre_sparse_effective = m_cur;

    let mut round_constants = Vec::with_capacity((N_ROUNDS_F + 1) * t + n_rounds_p);
    round_constants.extend_from_slice(&ark[0]);
    for block in &rebased[..half_full - 1] {
        round_constants.extend_from_slice(block);
    }
    round_constants.extend_from_slice(&transition);
    round_constants.extend_from_slice(&singles);
    for block in &rebased[half_full + n_rounds_p..half_full + n_rounds_p + half_full - 1] {
        round_constants.extend_from_slice(block);
    }
    round_constants.resize((N_ROUNDS_F + 1) * t + n_rounds_p, F::ZERO);

    WidthConstants {
        round_constants,
        sparse_factors,
        mds: mat_transpose(&a),
        pre_sparse: mat_transpose(&pre_sparse_effective),
        width: t,
        n_rounds_p,
    }
}

/// The table sets for every supported width, addressable by width.
pub struct PoseidonConstants<F> {
    widths: Vec<WidthConstants<F>>,
}

impl<F: PrimeField> PoseidonConstants<F> {
    fn build() -> Self {
        Self {
            widths: (MIN_WIDTH..=MAX_WIDTH).map(derive_width_constants).collect(),
        }
    }

    pub fn for_width(&self, t: usize) -> &WidthConstants<F> {
        assert!(
            (MIN_WIDTH..=MAX_WIDTH).contains(&t),
            "unsupported state width {}",
            t
        );
        &self.widths[t - MIN_WIDTH]
    }
}

static CONSTANTS: Lazy<PoseidonConstants<Bn254Field>> = Lazy::new(|| {
    let constants = PoseidonConstants::build();
    log::debug!(
        "built Poseidon round-constant tables for widths {}..={}",
        MIN_WIDTH,
        MAX_WIDTH
    );
    constants
});

/// The process-global tables over the BN254 scalar field. Built once, on first use;
/// safe for unlimited concurrent readers afterwards.
pub fn constants() -> &'static PoseidonConstants<Bn254Field> {
    &CONSTANTS
}

#[cfg(test)]
mod tests {
    use super::{constants, grain_parameters, MAX_WIDTH, MIN_WIDTH, N_ROUNDS_F, N_ROUNDS_P};
    use crate::field::bn254::Bn254Field;
    use crate::field::types::Field;

    #[test]
    fn table_shapes() {
        for t in MIN_WIDTH..=MAX_WIDTH {
            let k = constants().for_width(t);
            let n_rounds_p = N_ROUNDS_P[t - MIN_WIDTH];
            assert_eq!(k.width, t);
            assert_eq!(k.n_rounds_p, n_rounds_p);
            assert_eq!(k.round_constants.len(), (N_ROUNDS_F + 1) * t + n_rounds_p);
            assert_eq!(k.sparse_factors.len(), (2 * t - 1) * n_rounds_p);
            assert_eq!(k.mds.len(), t);
            assert_eq!(k.pre_sparse.len(), t);
            for row in k.mds.iter().chain(k.pre_sparse.iter()) {
                assert_eq!(row.len(), t);
            }
            // The final full round consumes no constants.
            let tail = &k.round_constants[N_ROUNDS_F * t + n_rounds_p..];
            assert!(tail.iter().all(Bn254Field::is_zero));
        }
    }

    #[test]
    fn mds_entries_nonzero() {
        for t in MIN_WIDTH..=MAX_WIDTH {
            let k = constants().for_width(t);
            for row in &k.mds {
                assert!(row.iter().all(Bn254Field::is_nonzero));
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let (ark_a, mds_a) = grain_parameters::<Bn254Field>(3);
        let (ark_b, mds_b) = grain_parameters::<Bn254Field>(3);
        assert_eq!(ark_a, ark_b);
        assert_eq!(mds_a, mds_b);
    }
}
