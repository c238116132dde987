//! Error types for the integration crate.
//!
//! - `ConnectorError`: a single operation failed (validation, signing or transport)
//! - `BatchError`: a batch was aborted by one of its items

use std::fmt;
use zadarma_signer::SigningError;

/// Coarse classification of a [`ConnectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input was rejected before any network call.
    Validation,
    /// The signature could not be computed.
    Signing,
    /// The request failed on the wire or its response was unusable.
    Transport,
}

/// Errors from connector operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// Operation name is not one the connector knows.
    OperationNotSupported { operation: String },
    /// A required field is missing or malformed.
    InvalidParameters { operation: String, reason: String },
    /// Computing the request signature failed.
    SigningFailed { reason: String },
    /// Connection to the service failed.
    ConnectionFailed { reason: String },
    /// Timeout waiting for response.
    Timeout,
    /// The service answered with a non-success status.
    UnexpectedStatus { status: u16, body: String },
    /// The response body was not valid JSON.
    ResponseParseFailed { reason: String },
}

impl ConnectorError {
    /// Returns the kind of failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OperationNotSupported { .. } | Self::InvalidParameters { .. } => {
                ErrorKind::Validation
            }
            Self::SigningFailed { .. } => ErrorKind::Signing,
            Self::ConnectionFailed { .. }
            | Self::Timeout
            | Self::UnexpectedStatus { .. }
            | Self::ResponseParseFailed { .. } => ErrorKind::Transport,
        }
    }

    /// Returns true if the error must abort a batch under every policy.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Signing)
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationNotSupported { operation } => {
                write!(f, "operation not supported: {operation}")
            }
            Self::InvalidParameters { operation, reason } => {
                write!(f, "invalid parameters for '{operation}': {reason}")
            }
            Self::SigningFailed { reason } => {
                write!(f, "failed to sign request: {reason}")
            }
            Self::ConnectionFailed { reason } => {
                write!(f, "connection failed: {reason}")
            }
            Self::Timeout => write!(f, "operation timed out"),
            Self::UnexpectedStatus { status, body } => {
                write!(f, "unexpected HTTP status {status}: {body}")
            }
            Self::ResponseParseFailed { reason } => {
                write!(f, "failed to parse response: {reason}")
            }
        }
    }
}

impl std::error::Error for ConnectorError {}

impl From<SigningError> for ConnectorError {
    fn from(err: SigningError) -> Self {
        Self::SigningFailed {
            reason: err.to_string(),
        }
    }
}

/// Errors that stop a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// An item failed and the batch was not allowed to continue past it.
    ItemFailed {
        index: usize,
        operation: String,
        error: ConnectorError,
    },
}

impl BatchError {
    /// Index of the input item that stopped the batch.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::ItemFailed { index, .. } => *index,
        }
    }
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemFailed {
                index,
                operation,
                error,
            } => {
                write!(f, "item {index} ('{operation}') failed: {error}")
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ItemFailed { error, .. } => Some(error),
        }
    }
}
