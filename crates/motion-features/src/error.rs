//! Errors for the feature-extraction boundary.

use thiserror::Error;

pub type ExtractResult<T> = Result<T, ExtractError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractError {
    /// Required landmarks were absent for the requested model; per §4.2
    /// this is the normal "drop" outcome, counted but not surfaced as an
    /// error on the transport.
    #[error("no usable landmarks for model {0}")]
    Drop(&'static str),
}
