//! Signing error types.

use std::fmt;

/// Errors from computing a request signature.
///
/// None of these are expected for well-formed input; a signing failure
/// indicates a bug rather than a bad request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The HMAC key could not be initialised.
    InvalidKey {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for SigningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidKey { details } => {
                write!(f, "failed to initialise HMAC key: {details}")
            }
        }
    }
}

impl std::error::Error for SigningError {}
