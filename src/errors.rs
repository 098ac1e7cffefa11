//! Error type shared by every fallible operation in the crate.

use std::io;
use std::num::ParseFloatError;

pub type Result<T> = std::result::Result<T, ForestError>;

#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// The randomized split search ran out of trials without a usable split.
    /// Usually means the leaf thresholds are too strict for the data.
    #[error("split search exhausted {trials} trials without finding a valid split")]
    SplitSearchExhausted { trials: usize },

    #[error("line {line}: expected {expected} fields, found {found}")]
    MalformedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number: {source}")]
    ParseFloat {
        line: usize,
        #[source]
        source: ParseFloatError,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("this operation needs target values but none were supplied")]
    MissingTargets,

    #[error("number of targets ({targets}) does not match number of inputs ({inputs})")]
    TargetLengthMismatch { inputs: usize, targets: usize },

    #[error("sample index {index} out of range for dataset of {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
}
