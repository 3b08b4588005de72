//! Error signals shared by the whole simulation layer.

use schmidt::MpsError;
use thiserror::Error;

/// Everything the simulator can report to a caller.
///
/// Validation errors are raised at the earliest detectable moment: circuit
/// construction fails at build time, observable registration at track time,
/// and state operations at call time. After an executor error the
/// simulation state is well-defined but possibly partially evolved; discard
/// it if the trajectory no longer matters.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value is out of range or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request is well-formed but this engine does not implement it.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A Born measurement ran out of probability weight, or a matrix
    /// factorization failed to converge.
    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    /// An internal consistency check failed; this indicates a bug in gate
    /// or operator construction rather than a user error.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<MpsError> for Error {
    fn from(err: MpsError) -> Self {
        match err {
            MpsError::LinalgFailure(msg) => Error::NumericalFailure(msg),
            other => Error::Internal(other.to_string()),
        }
    }
}

pub(crate) fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidArgument(msg.into())
}

pub(crate) fn unsupported(msg: impl Into<String>) -> Error {
    Error::Unsupported(msg.into())
}
