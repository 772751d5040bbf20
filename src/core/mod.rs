//! Core container sealing types and operations.
//!
//! This module provides the fundamental building blocks of the v2 sealing
//! engine:
//!
//! - [`error`] - Error types for sealing operations
//! - [`pae`] - Pre-Authentication Encoding for signed and MACed inputs
//! - [`types`] - Key material and container types
//! - [`codec`] - The binary on-wire container format
//! - [`operations`] - Recipient packing and the seal/unseal protocol

pub mod codec;
pub mod error;
pub(crate) mod kdf;
pub mod operations;
pub mod pae;
pub mod types;

// Re-export commonly used items
pub use error::{SealError, SealResult};

/// Container format version, embedded in the magic.
pub const CONTAINER_VERSION: u8 = 2;

/// Encoding version carried in the header.
pub const ENCODING_VERSION: u32 = 2;

/// Content type written by the sealer (an opaque bundle payload).
pub const CONTENT_TYPE_BUNDLE: u32 = 1;

/// Size of the per-container payload key.
pub const PAYLOAD_KEY_SIZE: usize = 32;

/// Size of the ECDH-derived shared key.
pub const SHARED_KEY_SIZE: usize = 32;

/// Size of the wrap seed stored in a recipient entry.
pub const SEED_SIZE: usize = 32;

/// Size of the derived recipient encryption key.
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Size of the derived recipient MAC key.
pub const MAC_KEY_SIZE: usize = 32;

/// Size of the truncated recipient MAC.
pub const MAC_SIZE: usize = 32;

/// Size of a recipient identifier.
pub const KEY_IDENTIFIER_SIZE: usize = 32;

/// Size of an optional pre-shared key.
pub const PRE_SHARED_KEY_SIZE: usize = 32;

/// Size of a P-384 public key in uncompressed SEC1 encoding (0x04 || X || Y).
pub const PUBLIC_KEY_SIZE: usize = 97;

/// Size of a P-384 private scalar.
pub const PRIVATE_KEY_SIZE: usize = 48;

/// Size of the derived XChaCha20 nonces.
pub const NONCE_SIZE: usize = 24;

/// Size of the Poly1305 tag appended to the payload ciphertext.
pub const TAG_SIZE: usize = 16;

/// Size of the fixed-width ECDSA-P384 signature (r || s).
pub const SIGNATURE_SIZE: usize = 96;

/// Size of a wrapped recipient key: seed || encrypted payload key || MAC.
pub const RECIPIENT_KEY_SIZE: usize = SEED_SIZE + ENCRYPTION_KEY_SIZE + MAC_SIZE;
