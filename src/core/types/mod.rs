//! Sealing engine type implementations.
//!
//! This module provides the first-class types of the sealing engine:
//!
//! - [`Container`] - A sealed, signed container
//! - [`ContainerHeader`] - Format metadata and the ephemeral sender key
//! - [`Recipient`] - A stable identifier plus a wrapped payload key
//! - [`RecipientPublicKey`] / [`RecipientSecretKey`] - ECDH recipient keys
//! - [`SigningPublicKey`] / [`SigningSecretKey`] - producer ECDSA keys
//! - [`PreSharedKey`] - optional 32-byte second factor

mod container;
mod keys;

pub use container::{Container, ContainerHeader, Recipient};
pub use keys::{
    generate_recipient_key, generate_signing_key, PreSharedKey, RecipientPublicKey,
    RecipientSecretKey, SigningPublicKey, SigningSecretKey,
};
