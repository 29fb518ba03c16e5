//! Typed error taxonomy for the token lifecycle.
//!
//! Scheduled cycles catch everything at the loop boundary; these variants
//! exist so the refresh path can tell a recoverable store conflict apart
//! from a fatal issuance or I/O failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing or empty credentials supplied to the issuer. Never retried
    /// within a cycle; surfaced immediately to the caller.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Issuance(#[from] IssuanceError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Failure modes of a single credentials-for-token exchange.
#[derive(Debug, Error)]
pub enum IssuanceError {
    /// Network-level failure: timeout, DNS, connection refused.
    #[error("token endpoint unreachable: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status.
    #[error("token endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Success status but a required field is missing or unparseable.
    #[error("token response missing or invalid field '{0}'")]
    MalformedResponse(&'static str),
}

/// Failure modes of the credential store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying storage is not readable/writable. Fatal to the cycle.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// The token value already exists. Recoverable: someone else stored a
    /// usable token first, so the caller re-reads the latest record.
    #[error("token value already stored for provider '{0}'")]
    Conflict(String),
}

pub type Result<T> = std::result::Result<T, Error>;
