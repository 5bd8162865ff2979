//! DTW Engine error types.

use thiserror::Error;

pub type DtwResultT<T> = Result<T, DtwError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DtwError {
    #[error("sequences have mismatched dimensionality: {a} != {b}")]
    DimMismatch { a: usize, b: usize },

    #[error("cannot run DTW on an empty sequence")]
    EmptySequence,

    #[error("Sakoe-Chiba band excludes the path endpoint")]
    BandInfeasible,
}
