use core::fmt;

use crate::hash::hashing::MAX_INPUTS;
use crate::hash::sponge::{MAX_FRAME_SIZE, MIN_FRAME_SIZE};

/// Validation error raised before any hashing happens. Once the inputs pass
/// validation, no further failure path exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseidonError {
    /// The number of inputs is zero or exceeds the widest supported state.
    InputsLengthInvalid {
        /// Number of inputs supplied.
        len: usize,
    },
    /// An input integer is not a reduced residue.
    InputNotInField {
        /// Position of the first offending input.
        index: usize,
    },
    /// The capacity (initial state) integer is not a reduced residue.
    InitStateNotInField,
    /// The requested number of outputs is zero or exceeds the state width.
    NOutsInvalid {
        /// Requested number of outputs.
        n_outs: usize,
        /// State width, the largest permitted value.
        max: usize,
    },
    /// The sponge frame size lies outside the supported range.
    FrameSizeInvalid {
        /// Requested frame size.
        frame_size: usize,
    },
}

impl fmt::Display for PoseidonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoseidonError::InputsLengthInvalid { len } => {
                write!(f, "invalid inputs length {}, min 1, max {}", len, MAX_INPUTS)
            }
            PoseidonError::InputNotInField { index } => {
                write!(f, "input {} not inside the finite field", index)
            }
            PoseidonError::InitStateNotInField => {
                write!(f, "init state not inside the finite field")
            }
            PoseidonError::NOutsInvalid { n_outs, max } => {
                write!(f, "invalid nOuts {}, min 1, max {}", n_outs, max)
            }
            PoseidonError::FrameSizeInvalid { frame_size } => {
                write!(
                    f,
                    "invalid frame size {}, min {}, max {}",
                    frame_size, MIN_FRAME_SIZE, MAX_FRAME_SIZE
                )
            }
        }
    }
}

impl std::error::Error for PoseidonError {}
