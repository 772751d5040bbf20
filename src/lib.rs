//! Sealing engine for harp secret containers (v2).
//!
//! A container is a signed, encrypted envelope holding an opaque bundle
//! of secrets. Sealing takes the serialized bundle and a set of
//! recipient public keys and produces a self-contained byte artifact
//! that any listed recipient (and only a listed recipient) can open,
//! optionally gated by a 32-byte pre-shared key.
//!
//! # Construction
//!
//! | Concern | Primitive |
//! |---------|-----------|
//! | Key agreement | ECDH on NIST P-384, fresh ephemeral key per container |
//! | Key derivation | HKDF-SHA-512 / HKDF-SHA-384 with fixed ASCII labels |
//! | Payload encryption | XChaCha20-Poly1305, nonce derived from the payload key |
//! | Recipient key wrap | XChaCha20 + HMAC-SHA-384 (encrypt-then-MAC), 96 bytes |
//! | Producer signature | ECDSA-P384 over SHA-384 (RFC 6979, deterministic) |
//! | Authenticated framing | PAE length-prefixed encoding everywhere |
//!
//! Sealing is deterministic given the RNG inputs, so identical inputs
//! reproduce identical containers for auditing.
//!
//! # Quick Start
//!
//! ```rust
//! use harp_container::{
//!     generate_recipient_key, generate_signing_key, seal, unseal, SealOptions, UnsealOptions,
//! };
//! use rand_core::OsRng;
//!
//! // Recipient and producer key material
//! let (recipient_secret, recipient_public) = generate_recipient_key(&mut OsRng);
//! let (signing_key, signer_public) = generate_signing_key(&mut OsRng);
//!
//! // Seal a bundle for one recipient
//! let sealed = seal(
//!     &mut OsRng,
//!     b"secret bundle bytes",
//!     &[recipient_public],
//!     &signing_key,
//!     &SealOptions::default(),
//! )?;
//!
//! // Open it with the recipient private key, verifying the producer
//! let options = UnsealOptions {
//!     signer_public_key: Some(signer_public),
//!     ..UnsealOptions::default()
//! };
//! let content = unseal(&sealed, &recipient_secret, &options)?;
//! assert_eq!(content, b"secret bundle bytes");
//! # Ok::<(), harp_container::SealError>(())
//! ```
//!
//! # Security
//!
//! - Payload key, shared keys and the ephemeral scalar are zeroized on
//!   every exit path
//! - Recipient lookup uses constant-time identifier comparison without
//!   short-circuiting
//! - Every unseal failure renders the same error message, blunting
//!   decryption oracles
//! - Signature verification is mandatory unless the crate is built with
//!   the loudly-warned `unauthenticated-unseal` feature
//!
//! # Modules
//!
//! - [`core`] - Core types, codec and operations
//! - [`transformer`] - Abstract payload-key escrow contract

#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused
)]
#![deny(clippy::unwrap_used)]

pub mod core;
pub mod transformer;

// Re-export the public surface at the crate root
pub use crate::core::error::{SealError, SealResult};
pub use crate::core::operations::protocol::{seal, unseal, SealOptions, UnsealOptions};
pub use crate::core::types::{
    generate_recipient_key, generate_signing_key, Container, ContainerHeader, PreSharedKey,
    Recipient, RecipientPublicKey, RecipientSecretKey, SigningPublicKey, SigningSecretKey,
};
pub use crate::transformer::{Transformer, TransformerFactory};
