//! Sponge-mode Poseidon hashing for element streams and byte strings.
//!
//! Inputs are absorbed in frames of F elements through a width F + 1 permutation in
//! overwrite mode. The digest of each full frame is carried into slot 0 of the next
//! frame; a partially filled trailing frame is flushed with its unused slots zero.
//! Byte input is consumed as big-endian 31-byte chunks, one field element each.

use alloc::vec;
use alloc::vec::Vec;

use num::bigint::BigUint;

use crate::field::bn254::Bn254Field;
use crate::field::types::{Field, PrimeField};
use crate::hash::constants::constants;
use crate::hash::error::PoseidonError;
use crate::hash::hashing::parse_inputs;
use crate::hash::poseidon::permute;

/// Bytes absorbed per field element. 2^248 < p, so a chunk is always a reduced residue.
pub const SPONGE_CHUNK_SIZE: usize = 31;

/// Frame size used by the convenience entry points.
pub const DEFAULT_FRAME_SIZE: usize = 16;

/// Smallest accepted frame size.
pub const MIN_FRAME_SIZE: usize = 2;

/// Largest accepted frame size.
pub const MAX_FRAME_SIZE: usize = 16;

/// Absorber over a width `frame_size + 1` state. Slot 0 is the capacity and stays zero
/// at the start of every frame; the running digest chains through frame slot 0 (state
/// slot 1). The state and scratch buffers are allocated once and reused across frames.
struct Sponge {
    state: Vec<Bn254Field>,
    scratch: Vec<Bn254Field>,
    frame_size: usize,
    /// Next frame slot to fill.
    k: usize,
    /// Whether the current frame holds input that has not been permuted yet.
    dirty: bool,
    digest: Bn254Field,
}

impl Sponge {
    fn new(frame_size: usize) -> Result<Self, PoseidonError> {
        if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&frame_size) {
            return Err(PoseidonError::FrameSizeInvalid { frame_size });
        }
        Ok(Self {
            state: vec![Bn254Field::ZERO; frame_size + 1],
            scratch: vec![Bn254Field::ZERO; frame_size + 1],
            frame_size,
            k: 0,
            dirty: false,
            digest: Bn254Field::ZERO,
        })
    }

    fn absorb(&mut self, value: Bn254Field) {
        self.state[1 + self.k] = value;
        self.dirty = true;
        if self.k == self.frame_size - 1 {
            self.permute_frame();
            self.state[1] = self.digest;
            self.k = 1;
            self.dirty = false;
        } else {
            self.k += 1;
        }
    }

    /// Runs the permutation, records the digest and clears the state for the next frame.
    fn permute_frame(&mut self) {
        let k = constants().for_width(self.frame_size + 1);
        permute(&mut self.state, &mut self.scratch, k);
        self.digest = self.state[0];
        for slot in self.state.iter_mut() {
            *slot = Bn254Field::ZERO;
        }
    }

    fn finish(mut self) -> Bn254Field {
        if self.dirty {
            self.permute_frame();
        }
        self.digest
    }
}

fn sponge_elements(
    inputs: &[Bn254Field],
    frame_size: usize,
) -> Result<Bn254Field, PoseidonError> {
    let mut sponge = Sponge::new(frame_size)?;
    if inputs.is_empty() {
        // An empty stream never assigns a digest; reject it rather than invent one.
        return Err(PoseidonError::InputsLengthInvalid { len: 0 });
    }
    for &value in inputs {
        sponge.absorb(value);
    }
    Ok(sponge.finish())
}

fn sponge_bytes(msg: &[u8], frame_size: usize) -> Result<Bn254Field, PoseidonError> {
    let mut sponge = Sponge::new(frame_size)?;
    if msg.is_empty() {
        return Err(PoseidonError::InputsLengthInvalid { len: 0 });
    }
    let mut chunks = msg.chunks_exact(SPONGE_CHUNK_SIZE);
    for chunk in &mut chunks {
        sponge.absorb(Bn254Field::from_noncanonical_bytes_be(chunk));
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        // A short final chunk is zero-padded on the right, so 0xdeadbeaf becomes
        // 0xdeadbeaf000000000000000000000000000000000000000000000000000000.
        let mut buf = [0u8; SPONGE_CHUNK_SIZE];
        buf[..tail.len()].copy_from_slice(tail);
        sponge.absorb(Bn254Field::from_noncanonical_bytes_be(&buf));
    }
    Ok(sponge.finish())
}

/// Sponge hash of an arbitrary-length big-integer sequence, frame size 16.
pub fn sponge_hash(inputs: &[BigUint]) -> Result<BigUint, PoseidonError> {
    sponge_hash_ex(inputs, DEFAULT_FRAME_SIZE)
}

/// Sponge hash of an arbitrary-length big-integer sequence with a configurable frame
/// size F ∈ [2, 16].
pub fn sponge_hash_ex(inputs: &[BigUint], frame_size: usize) -> Result<BigUint, PoseidonError> {
    if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&frame_size) {
        return Err(PoseidonError::FrameSizeInvalid { frame_size });
    }
    let elements = parse_inputs(inputs)?;
    sponge_elements(&elements, frame_size).map(|digest| digest.to_canonical_biguint())
}

/// Sponge hash of a byte string split into 31-byte chunks, frame size 16.
pub fn sponge_hash_bytes(msg: &[u8]) -> Result<BigUint, PoseidonError> {
    sponge_hash_bytes_ex(msg, DEFAULT_FRAME_SIZE)
}

/// Sponge hash of a byte string split into 31-byte chunks, with a configurable frame
/// size F ∈ [2, 16].
pub fn sponge_hash_bytes_ex(msg: &[u8], frame_size: usize) -> Result<BigUint, PoseidonError> {
    sponge_bytes(msg, frame_size).map(|digest| digest.to_canonical_biguint())
}

/// Like [`sponge_hash_bytes_ex`], but returns the canonical 32-byte big-endian digest,
/// leading zeros preserved.
pub fn sponge_hash_bytes_digest(
    msg: &[u8],
    frame_size: usize,
) -> Result<[u8; 32], PoseidonError> {
    let digest = sponge_bytes(msg, frame_size)?;
    Ok(digest
        .to_bytes_be()
        .try_into()
        .expect("digest is always 32 bytes"))
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use num::bigint::BigUint;

    use super::{
        sponge_hash, sponge_hash_bytes, sponge_hash_bytes_digest, sponge_hash_bytes_ex,
        sponge_hash_ex, DEFAULT_FRAME_SIZE, SPONGE_CHUNK_SIZE,
    };
    use crate::field::bn254::Bn254Field;
    use crate::field::types::Field;
    use crate::hash::error::PoseidonError;
    use crate::hash::hashing::hash;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn single_frame_equals_zero_padded_hash() {
        let inputs = [big(1), big(2), big(3)];
        let padded = [big(1), big(2), big(3), big(0)];
        assert_eq!(
            sponge_hash_ex(&inputs, 4).unwrap(),
            hash(&padded).unwrap()
        );
    }

    #[test]
    fn chaining_carries_the_digest_into_the_next_frame() {
        // 31 inputs fill exactly two frames at F = 16: the second frame is the first
        // digest followed by the remaining 15 inputs.
        let inputs: Vec<BigUint> = (1..=31u64).map(big).collect();
        let first = hash(&inputs[..16]).unwrap();
        let mut second_frame = Vec::with_capacity(16);
        second_frame.push(first);
        second_frame.extend_from_slice(&inputs[16..]);
        let expected = hash(&second_frame).unwrap();
        assert_eq!(sponge_hash(&inputs).unwrap(), expected);
    }

    #[test]
    fn trailing_partial_frame_is_flushed_zero_padded() {
        let inputs: Vec<BigUint> = (1..=17u64).map(big).collect();
        let first = hash(&inputs[..16]).unwrap();
        let mut second_frame = vec![big(0); 16];
        second_frame[0] = first;
        second_frame[1] = big(17);
        let expected = hash(&second_frame).unwrap();
        assert_eq!(sponge_hash(&inputs).unwrap(), expected);
    }

    #[test]
    fn single_byte_lands_in_the_most_significant_position() {
        // "a" zero-padded to a 31-byte chunk is 0x61 · 2^240, absorbed into an
        // otherwise empty frame.
        let mut frame = vec![big(0); DEFAULT_FRAME_SIZE];
        frame[0] = big(0x61) << 240u32;
        let expected = hash(&frame).unwrap();
        assert_eq!(sponge_hash_bytes(b"a").unwrap(), expected);
    }

    #[test]
    fn byte_sponge_matches_element_sponge_on_chunks() {
        for (len, frame_size) in [(SPONGE_CHUNK_SIZE * 17, 16), (40, 3), (62, 2)] {
            let msg: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
            let mut chunks: Vec<BigUint> = Vec::new();
            for chunk in msg.chunks(SPONGE_CHUNK_SIZE) {
                let mut buf = [0u8; SPONGE_CHUNK_SIZE];
                buf[..chunk.len()].copy_from_slice(chunk);
                chunks.push(BigUint::from_bytes_be(&buf));
            }
            assert_eq!(
                sponge_hash_bytes_ex(&msg, frame_size).unwrap(),
                sponge_hash_ex(&chunks, frame_size).unwrap(),
                "mismatch for message length {} at frame size {}",
                len,
                frame_size,
            );
        }
    }

    #[test]
    fn byte_digest_is_the_big_endian_encoding() {
        let msg = b"byte digest round trip";
        let digest = sponge_hash_bytes_ex(msg, DEFAULT_FRAME_SIZE).unwrap();
        let bytes = sponge_hash_bytes_digest(msg, DEFAULT_FRAME_SIZE).unwrap();
        assert_eq!(BigUint::from_bytes_be(&bytes), digest);
        // The encoding is zero-padded to 32 bytes; p < 2^254, so the digest's hex form
        // always fits in 64 digits.
        assert_eq!(
            hex::encode(bytes),
            format!("{:0>64}", digest.to_str_radix(16))
        );
    }

    #[test]
    fn rejects_bad_frame_sizes() {
        assert_eq!(
            sponge_hash_ex(&[big(1)], 1),
            Err(PoseidonError::FrameSizeInvalid { frame_size: 1 })
        );
        assert_eq!(
            sponge_hash_ex(&[big(1)], 17),
            Err(PoseidonError::FrameSizeInvalid { frame_size: 17 })
        );
        assert_eq!(
            sponge_hash_bytes_ex(b"x", 0),
            Err(PoseidonError::FrameSizeInvalid { frame_size: 0 })
        );
        // Frame-size validation precedes the emptiness check.
        assert_eq!(
            sponge_hash_ex(&[], 17),
            Err(PoseidonError::FrameSizeInvalid { frame_size: 17 })
        );
    }

    #[test]
    fn rejects_empty_streams() {
        assert_eq!(
            sponge_hash(&[]),
            Err(PoseidonError::InputsLengthInvalid { len: 0 })
        );
        assert_eq!(
            sponge_hash_bytes(b""),
            Err(PoseidonError::InputsLengthInvalid { len: 0 })
        );
        assert_eq!(
            sponge_hash_bytes_digest(b"", 4),
            Err(PoseidonError::InputsLengthInvalid { len: 0 })
        );
    }

    #[test]
    fn rejects_unreduced_stream_values() {
        let inputs = [big(1), Bn254Field::order()];
        assert_eq!(
            sponge_hash(&inputs),
            Err(PoseidonError::InputNotInField { index: 1 })
        );
    }

    #[test]
    fn frame_boundary_message_needs_no_padding_chunk() {
        // Two full chunks fill one frame exactly at F = 2; nothing is left to flush.
        let msg: Vec<u8> = (0..SPONGE_CHUNK_SIZE * 2).map(|i| i as u8).collect();
        let digest = sponge_hash_bytes_ex(&msg, 2).unwrap();
        assert!(digest < Bn254Field::order());
    }
}
