//! Key material types for the sealing engine.
//!
//! Every key crossing the public API has a canonical byte encoding:
//! public keys are 97-byte uncompressed SEC1 points (`0x04 || X || Y`),
//! private keys are 48-byte big-endian scalars, pre-shared keys are
//! exactly 32 bytes.
//!
//! # Security
//!
//! - Secret material is zeroized on drop
//! - Debug output redacts secret material
//! - Pre-shared key equality uses constant-time comparison

use core::fmt::{self, Debug};

use p384::ecdsa;
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::{PublicKey, SecretKey};
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::core::error::{SealError, SealResult};
use crate::core::{PRE_SHARED_KEY_SIZE, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

// =============================================================================
// Recipient keys (ECDH)
// =============================================================================

/// A recipient's P-384 public key.
///
/// Construction validates the canonical encoding: exactly 97 bytes,
/// uncompressed SEC1 form, on-curve and not the point at infinity. Once a
/// value exists it is always a usable ECDH peer key.
#[derive(Clone, PartialEq, Eq)]
pub struct RecipientPublicKey {
    key: PublicKey,
}

impl RecipientPublicKey {
    /// Parses a public key from its canonical 97-byte encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidPublicKey`] for a wrong length, a
    /// compressed encoding, an off-curve point or the point at infinity.
    pub fn from_sec1_bytes(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE || bytes[0] != 0x04 {
            return Err(SealError::InvalidPublicKey);
        }
        let key = PublicKey::from_sec1_bytes(bytes).map_err(|_| SealError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// Returns the canonical 97-byte uncompressed encoding.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.key.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Borrow the inner curve point.
    pub(crate) const fn as_public(&self) -> &PublicKey {
        &self.key
    }

    pub(crate) const fn from_public(key: PublicKey) -> Self {
        Self { key }
    }
}

impl Debug for RecipientPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientPublicKey")
            .field("key", &"[P-384 point]")
            .finish()
    }
}

/// A recipient's P-384 private key.
#[derive(Clone)]
pub struct RecipientSecretKey {
    key: SecretKey,
}

impl RecipientSecretKey {
    /// Parses a private key from its canonical 48-byte scalar encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Internal`] for a wrong length or an
    /// out-of-range scalar.
    pub fn from_bytes(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(SealError::Internal);
        }
        let key = SecretKey::from_slice(bytes).map_err(|_| SealError::Internal)?;
        Ok(Self { key })
    }

    /// Returns the canonical 48-byte scalar encoding, wiped on drop.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.key.to_bytes());
        out
    }

    /// Returns the matching public key.
    #[must_use]
    pub fn public_key(&self) -> RecipientPublicKey {
        RecipientPublicKey::from_public(self.key.public_key())
    }

    /// Borrow the inner secret key.
    pub(crate) const fn as_secret(&self) -> &SecretKey {
        &self.key
    }
}

impl Debug for RecipientSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecipientSecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generates a fresh P-384 recipient keypair from the given RNG.
pub fn generate_recipient_key<R: CryptoRngCore>(
    rng: &mut R,
) -> (RecipientSecretKey, RecipientPublicKey) {
    let key = SecretKey::random(rng);
    let public = RecipientPublicKey::from_public(key.public_key());
    (RecipientSecretKey { key }, public)
}

// =============================================================================
// Producer signing keys (ECDSA)
// =============================================================================

/// The container producer's ECDSA-P384 signing key.
#[derive(Clone)]
pub struct SigningSecretKey {
    key: ecdsa::SigningKey,
}

impl SigningSecretKey {
    /// Parses a signing key from its canonical 48-byte scalar encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Internal`] for a wrong length or an
    /// out-of-range scalar.
    pub fn from_bytes(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(SealError::Internal);
        }
        let key = ecdsa::SigningKey::from_slice(bytes).map_err(|_| SealError::Internal)?;
        Ok(Self { key })
    }

    /// Returns the canonical 48-byte scalar encoding, wiped on drop.
    #[must_use]
    pub fn to_bytes(&self) -> Zeroizing<[u8; PRIVATE_KEY_SIZE]> {
        let mut out = Zeroizing::new([0u8; PRIVATE_KEY_SIZE]);
        out.copy_from_slice(&self.key.to_bytes());
        out
    }

    /// Returns the matching verification key.
    #[must_use]
    pub fn verifying_key(&self) -> SigningPublicKey {
        SigningPublicKey {
            key: self.key.verifying_key().clone(),
        }
    }

    /// Borrow the inner signing key.
    pub(crate) const fn as_signing(&self) -> &ecdsa::SigningKey {
        &self.key
    }
}

impl Debug for SigningSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecretKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// The container producer's ECDSA-P384 verification key.
///
/// Distributed out-of-band; the container itself never carries it.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningPublicKey {
    key: ecdsa::VerifyingKey,
}

impl SigningPublicKey {
    /// Parses a verification key from its canonical 97-byte encoding.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidPublicKey`] for a wrong length, a
    /// compressed encoding or an off-curve point.
    pub fn from_sec1_bytes(bytes: &[u8]) -> SealResult<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE || bytes[0] != 0x04 {
            return Err(SealError::InvalidPublicKey);
        }
        let key =
            ecdsa::VerifyingKey::from_sec1_bytes(bytes).map_err(|_| SealError::InvalidPublicKey)?;
        Ok(Self { key })
    }

    /// Returns the canonical 97-byte uncompressed encoding.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        let point = self.key.to_encoded_point(false);
        let mut out = [0u8; PUBLIC_KEY_SIZE];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Borrow the inner verification key.
    pub(crate) const fn as_verifying(&self) -> &ecdsa::VerifyingKey {
        &self.key
    }
}

impl Debug for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningPublicKey")
            .field("key", &"[P-384 point]")
            .finish()
    }
}

/// Generates a fresh ECDSA-P384 producer keypair from the given RNG.
pub fn generate_signing_key<R: CryptoRngCore>(
    rng: &mut R,
) -> (SigningSecretKey, SigningPublicKey) {
    let key = ecdsa::SigningKey::random(rng);
    let public = SigningPublicKey {
        key: key.verifying_key().clone(),
    };
    (SigningSecretKey { key }, public)
}

// =============================================================================
// Pre-shared key
// =============================================================================

/// An optional 32-byte pre-shared key acting as a second factor.
///
/// The PSK mode is carried by `Option<PreSharedKey>`, not by the value:
/// an all-zero PSK is a legitimate key and produces identifiers and
/// shared keys disjoint from the no-PSK mode.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct PreSharedKey {
    key: [u8; PRE_SHARED_KEY_SIZE],
}

impl PreSharedKey {
    /// Creates a pre-shared key from raw bytes.
    #[must_use]
    pub const fn new(key: [u8; PRE_SHARED_KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Returns a reference to the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PRE_SHARED_KEY_SIZE] {
        &self.key
    }
}

impl From<[u8; PRE_SHARED_KEY_SIZE]> for PreSharedKey {
    fn from(key: [u8; PRE_SHARED_KEY_SIZE]) -> Self {
        Self::new(key)
    }
}

impl From<&[u8; PRE_SHARED_KEY_SIZE]> for PreSharedKey {
    fn from(key: &[u8; PRE_SHARED_KEY_SIZE]) -> Self {
        Self::new(*key)
    }
}

impl Debug for PreSharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreSharedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl PartialEq for PreSharedKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.key.ct_eq(&other.key).into()
    }
}

impl Eq for PreSharedKey {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    #[test]
    fn test_recipient_key_roundtrip() {
        let (secret, public) = generate_recipient_key(&mut OsRng);

        let secret_bytes = secret.to_bytes();
        let restored = RecipientSecretKey::from_bytes(secret_bytes.as_ref()).unwrap();
        assert_eq!(restored.public_key().to_bytes(), public.to_bytes());

        let public_bytes = public.to_bytes();
        assert_eq!(public_bytes.len(), PUBLIC_KEY_SIZE);
        assert_eq!(public_bytes[0], 0x04);
        let reparsed = RecipientPublicKey::from_sec1_bytes(&public_bytes).unwrap();
        assert_eq!(reparsed, public);
    }

    #[test]
    fn test_public_key_rejects_compressed() {
        let (_, public) = generate_recipient_key(&mut OsRng);
        let uncompressed = public.to_bytes();

        // Compressed form of the same point: prefix by Y parity, X only.
        let mut compressed = [0u8; 49];
        compressed[0] = 0x02 | (uncompressed[PUBLIC_KEY_SIZE - 1] & 1);
        compressed[1..].copy_from_slice(&uncompressed[1..49]);

        let result = RecipientPublicKey::from_sec1_bytes(&compressed);
        assert!(matches!(result, Err(SealError::InvalidPublicKey)));
    }

    #[test]
    fn test_public_key_rejects_off_curve() {
        let mut bytes = [0u8; PUBLIC_KEY_SIZE];
        bytes[0] = 0x04;
        // X = Y = 0 does not satisfy the curve equation.
        let result = RecipientPublicKey::from_sec1_bytes(&bytes);
        assert!(matches!(result, Err(SealError::InvalidPublicKey)));
    }

    #[test]
    fn test_public_key_rejects_identity_and_garbage_length() {
        assert!(RecipientPublicKey::from_sec1_bytes(&[0x00]).is_err());
        assert!(RecipientPublicKey::from_sec1_bytes(&[]).is_err());
        assert!(RecipientPublicKey::from_sec1_bytes(&[0x04; 96]).is_err());
    }

    #[test]
    fn test_signing_key_roundtrip() {
        let (secret, public) = generate_signing_key(&mut OsRng);
        let restored = SigningSecretKey::from_bytes(secret.to_bytes().as_ref()).unwrap();
        assert_eq!(restored.verifying_key().to_bytes(), public.to_bytes());

        let reparsed = SigningPublicKey::from_sec1_bytes(&public.to_bytes()).unwrap();
        assert_eq!(reparsed, public);
    }

    #[test]
    fn test_secret_debug_redacted() {
        let (secret, _) = generate_recipient_key(&mut OsRng);
        let debug_str = format!("{secret:?}");
        assert!(debug_str.contains("[REDACTED]"));

        let psk = PreSharedKey::new([0x42; 32]);
        let debug_str = format!("{psk:?}");
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_psk_equality() {
        let a = PreSharedKey::new([7u8; 32]);
        let b = PreSharedKey::new([7u8; 32]);
        let c = PreSharedKey::new([8u8; 32]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
