//! Cryptographic operations of the sealing engine.
//!
//! This module provides the two layers of the protocol:
//!
//! - [`recipient`] - shared-key derivation and payload-key wrapping
//! - [`protocol`] - the seal/unseal pipeline built on top of it

pub mod protocol;
pub(crate) mod recipient;
