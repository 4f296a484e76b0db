//! Error types for record store operations.
//!
//! This module defines [`Error`], the error type shared by the record store,
//! the authenticator, and the request router, along with a [`Result`] alias.

use common::StorageError;

/// Error type for record store operations.
///
/// # Error Categories
///
/// - Caller errors: [`Unauthorized`](Error::Unauthorized),
///   [`MethodNotAllowed`](Error::MethodNotAllowed),
///   [`InvalidInput`](Error::InvalidInput), [`NotFound`](Error::NotFound).
///   These are terminal for the request and never retried.
/// - Server errors: [`Storage`](Error::Storage), [`Encoding`](Error::Encoding),
///   [`Internal`](Error::Internal). A failed request never leaves a partial
///   envelope behind because every envelope is written with a single put.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The request carried no credential, a malformed one, or one that is
    /// not on the allow-list.
    Unauthorized,

    /// The HTTP method does not match the operation, or the operation is
    /// unknown.
    MethodNotAllowed(String),

    /// Missing path parameters, a payload that is not a JSON object, or a
    /// collection/key name the store cannot address.
    InvalidInput(String),

    /// The record does not exist or has no visible version.
    NotFound(String),

    /// The key-value backend failed.
    Storage(String),

    /// A stored blob could not be decoded, or an envelope could not be
    /// encoded.
    Encoding(String),

    /// Invariant violations that indicate a bug or a misconfigured host.
    Internal(String),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unauthorized => write!(f, "Unauthorized"),
            Error::MethodNotAllowed(msg) => write!(f, "Method not allowed: {}", msg),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Encoding(msg) => write!(f, "Encoding error: {}", msg),
            Error::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Storage(msg) => Error::Storage(msg),
            StorageError::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Result type alias for record store operations.
pub type Result<T> = std::result::Result<T, Error>;
