//! Error types for container sealing operations.
//!
//! This module provides a unified error type for the sealing engine.
//! Every failure on the unseal path formats to the same vague message
//! ("container cannot be opened") so that callers cannot be turned into
//! a decryption oracle; the specific kind stays available through
//! pattern matching.

use thiserror::Error;

/// Errors that can occur when sealing or unsealing a container.
#[derive(Debug, Error)]
pub enum SealError {
    /// The container byte string failed to decode: wrong magic, wrong
    /// version, inconsistent lengths or trailing data.
    /// Intentionally vague for security.
    #[error("container cannot be opened")]
    MalformedContainer,

    /// A public key was off-curve, the point at infinity, or not in the
    /// canonical 97-byte uncompressed encoding.
    /// Intentionally vague for security.
    #[error("container cannot be opened")]
    InvalidPublicKey,

    /// Sealing was requested with an empty recipient list.
    #[error("at least one recipient public key is required")]
    NoRecipients,

    /// No recipient identifier matched the derived shared key.
    /// Intentionally vague for security.
    #[error("container cannot be opened")]
    NoMatchingRecipient,

    /// A recipient identifier matched but its wrapped key failed to
    /// authenticate. Intentionally vague for security.
    #[error("container cannot be opened")]
    CorruptRecipient,

    /// The payload failed authenticated decryption.
    /// Intentionally vague for security.
    #[error("container cannot be opened")]
    CorruptPayload,

    /// The container signature did not verify against the producer key.
    /// Intentionally vague for security.
    #[error("container cannot be opened")]
    BadSignature,

    /// The caller asked for an operating mode that is disabled by policy,
    /// e.g. unauthenticated unseal without the `unauthenticated-unseal`
    /// build feature. Intentionally vague for security.
    #[error("container cannot be opened")]
    PolicyViolation,

    /// RNG or primitive failure.
    #[error("cryptographic operation failed")]
    Internal,
}

/// Result type alias for sealing operations.
pub type SealResult<T> = Result<T, SealError>;
