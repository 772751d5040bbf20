//! Key derivation for the v2 sealing protocol.
//!
//! All derivations are HKDF based with fixed ASCII domain separators:
//!
//! - shared key: HKDF-SHA-512 extract/expand over the ECDH secret
//! - recipient identifier: HKDF-SHA-384 expand over the shared key
//! - wrap key split: HKDF-SHA-512 expand over the shared key
//! - nonces: HKDF-SHA-384 expand over the relevant key material
//!
//! Expand steps run directly over HMAC because the PRKs here are 32-byte
//! keys, shorter than the hash output the `hkdf` crate requires for
//! `from_prk`. Output lengths never exceed 255 blocks so the single-byte
//! counter is sufficient.

use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use sha2::{Sha384, Sha512};
use zeroize::{Zeroize, Zeroizing};

use crate::core::error::{SealError, SealResult};
use crate::core::{
    ENCRYPTION_KEY_SIZE, KEY_IDENTIFIER_SIZE, MAC_KEY_SIZE, NONCE_SIZE, SEED_SIZE,
    SHARED_KEY_SIZE,
};

/// Salt for the shared-key extraction step.
const SHARED_KEY_SALT: &[u8] = b"harp.container.v2.derive";

/// Info for the shared-key expansion step.
const SHARED_KEY_INFO: &[u8] = b"shared-key";

/// Info prefix for recipient identifier derivation.
const KEY_IDENTIFIER_INFO: &[u8] = b"identifier";

/// Info for splitting a shared key into seed, encryption and MAC keys.
const WRAP_KEYS_INFO: &[u8] = b"harp.container.v2.wrap";

/// Info for deriving the payload AEAD nonce from the payload key.
const PAYLOAD_NONCE_INFO: &[u8] = b"harp.container.payload.nonce";

/// RFC 5869 expand step over HMAC-SHA-384.
fn expand_sha384(prk: &[u8], infos: &[&[u8]], okm: &mut [u8]) -> SealResult<()> {
    debug_assert!(okm.len() <= 255 * 48);
    let mut prev = [0u8; 48];
    let mut offset = 0usize;
    let mut counter = 1u8;
    while offset < okm.len() {
        let mut mac =
            <Hmac<Sha384> as Mac>::new_from_slice(prk).map_err(|_| SealError::Internal)?;
        if counter > 1 {
            mac.update(&prev);
        }
        for info in infos {
            mac.update(info);
        }
        mac.update(&[counter]);
        let block = mac.finalize().into_bytes();
        let take = core::cmp::min(48, okm.len() - offset);
        okm[offset..offset + take].copy_from_slice(&block[..take]);
        prev.copy_from_slice(&block);
        offset += take;
        counter += 1;
    }
    prev.zeroize();
    Ok(())
}

/// RFC 5869 expand step over HMAC-SHA-512.
fn expand_sha512(prk: &[u8], infos: &[&[u8]], okm: &mut [u8]) -> SealResult<()> {
    debug_assert!(okm.len() <= 255 * 64);
    let mut prev = [0u8; 64];
    let mut offset = 0usize;
    let mut counter = 1u8;
    while offset < okm.len() {
        let mut mac =
            <Hmac<Sha512> as Mac>::new_from_slice(prk).map_err(|_| SealError::Internal)?;
        if counter > 1 {
            mac.update(&prev);
        }
        for info in infos {
            mac.update(info);
        }
        mac.update(&[counter]);
        let block = mac.finalize().into_bytes();
        let take = core::cmp::min(64, okm.len() - offset);
        okm[offset..offset + take].copy_from_slice(&block[..take]);
        prev.copy_from_slice(&block);
        offset += take;
        counter += 1;
    }
    prev.zeroize();
    Ok(())
}

/// Derives the 32-byte shared key from an ECDH secret.
///
/// `z` is the X coordinate of the shared point, left-padded to 48 bytes.
/// When a pre-shared key is supplied it is appended to the extraction
/// input, so PSK-off and any PSK value (including all zeros) live in
/// disjoint key spaces.
pub(crate) fn shared_key_from_ecdh(
    z: &[u8; 48],
    psk: Option<&[u8; 32]>,
) -> SealResult<Zeroizing<[u8; SHARED_KEY_SIZE]>> {
    let mut ikm = Zeroizing::new([0u8; 48 + 32]);
    ikm[..48].copy_from_slice(z);
    let ikm_len = match psk {
        Some(psk) => {
            ikm[48..].copy_from_slice(psk);
            80
        }
        None => 48,
    };

    let hk = Hkdf::<Sha512>::new(Some(SHARED_KEY_SALT), &ikm[..ikm_len]);
    let mut shared_key = Zeroizing::new([0u8; SHARED_KEY_SIZE]);
    hk.expand(SHARED_KEY_INFO, shared_key.as_mut())
        .map_err(|_| SealError::Internal)?;

    Ok(shared_key)
}

/// Derives the stable recipient identifier for a shared key.
///
/// The identifier is public: it is embedded in the container so that a
/// recipient can locate its wrapped key without trial decryption.
pub(crate) fn key_identifier(
    shared_key: &[u8; SHARED_KEY_SIZE],
    psk: Option<&[u8; 32]>,
) -> SealResult<[u8; KEY_IDENTIFIER_SIZE]> {
    let mut identifier = [0u8; KEY_IDENTIFIER_SIZE];
    match psk {
        Some(psk) => expand_sha384(shared_key, &[KEY_IDENTIFIER_INFO, psk], &mut identifier)?,
        None => expand_sha384(shared_key, &[KEY_IDENTIFIER_INFO], &mut identifier)?,
    }
    Ok(identifier)
}

/// Splits a shared key into the wrap seed, encryption key and MAC key.
pub(crate) fn wrap_keys(
    shared_key: &[u8; SHARED_KEY_SIZE],
) -> SealResult<Zeroizing<[u8; SEED_SIZE + ENCRYPTION_KEY_SIZE + MAC_KEY_SIZE]>> {
    let mut okm = Zeroizing::new([0u8; SEED_SIZE + ENCRYPTION_KEY_SIZE + MAC_KEY_SIZE]);
    expand_sha512(shared_key, &[WRAP_KEYS_INFO], okm.as_mut())?;
    Ok(okm)
}

/// Derives the XChaCha20 nonce for a wrapped recipient key from the
/// stored seed and the recipient identifier.
pub(crate) fn recipient_nonce(
    seed: &[u8; SEED_SIZE],
    identifier: &[u8; KEY_IDENTIFIER_SIZE],
) -> SealResult<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    expand_sha384(seed, &[identifier], &mut nonce)?;
    Ok(nonce)
}

/// Derives the payload AEAD nonce from the payload key.
///
/// The payload key is fresh per container, so a derived nonce cannot
/// repeat under the same key and sealing stays byte-reproducible.
pub(crate) fn payload_nonce(payload_key: &[u8; 32]) -> SealResult<[u8; NONCE_SIZE]> {
    let mut nonce = [0u8; NONCE_SIZE];
    expand_sha384(payload_key, &[PAYLOAD_NONCE_INFO], &mut nonce)?;
    Ok(nonce)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DK: [u8; 32] = [
        0x9f, 0x6c, 0xb8, 0x33, 0xf4, 0x7a, 0x04, 0xb2, 0xba, 0x65, 0x30, 0xf2, 0x0c, 0x7c, 0xb1,
        0x30, 0x22, 0xa0, 0x6a, 0x15, 0x57, 0x73, 0xc1, 0xa9, 0xc7, 0x21, 0x48, 0xdd, 0x3c, 0xc8,
        0x36, 0xc7,
    ];

    #[test]
    fn test_key_identifier() {
        let id = key_identifier(&DK, None).unwrap();
        assert_eq!(
            id,
            [
                0xe5, 0xcf, 0xa3, 0x88, 0xe5, 0x7d, 0x60, 0x42, 0x33, 0x81, 0x7a, 0x1d, 0x91,
                0x3a, 0x2e, 0xa2, 0xf8, 0xe6, 0xea, 0x1e, 0xc6, 0x62, 0xe8, 0x39, 0xda, 0x7a,
                0x97, 0x13, 0x34, 0x54, 0xca, 0x5f,
            ]
        );
    }

    #[test]
    fn test_key_identifier_with_psk() {
        let psk = [0u8; 32];
        let id = key_identifier(&DK, Some(&psk)).unwrap();
        assert_eq!(
            id,
            [
                0xce, 0x76, 0x19, 0x6e, 0x84, 0x88, 0x29, 0x07, 0x54, 0xcf, 0x95, 0x7f, 0xfc,
                0xb9, 0x69, 0x53, 0x8a, 0x0a, 0xf6, 0x26, 0xf0, 0x73, 0xf0, 0x84, 0x04, 0x88,
                0x73, 0x58, 0xe1, 0x43, 0x80, 0x78,
            ]
        );
    }

    #[test]
    fn test_key_identifier_is_pure() {
        let a = key_identifier(&DK, None).unwrap();
        let b = key_identifier(&DK, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_psk_differs_from_no_psk() {
        // The PSK mode flag is separate from the PSK value: all-zero bytes
        // must still land in a different identifier space than "no PSK".
        let zero_psk = [0u8; 32];
        let without = key_identifier(&DK, None).unwrap();
        let with = key_identifier(&DK, Some(&zero_psk)).unwrap();
        assert_ne!(without, with);
    }

    #[test]
    fn test_shared_key_psk_separation() {
        let z = [0x42u8; 48];
        let zero_psk = [0u8; 32];
        let without = shared_key_from_ecdh(&z, None).unwrap();
        let with = shared_key_from_ecdh(&z, Some(&zero_psk)).unwrap();
        assert_ne!(*without, *with);
    }

    #[test]
    fn test_wrap_keys_are_distinct() {
        let okm = wrap_keys(&DK).unwrap();
        let (seed, rest) = okm.split_at(SEED_SIZE);
        let (enc, mac) = rest.split_at(ENCRYPTION_KEY_SIZE);
        assert_ne!(seed, enc);
        assert_ne!(enc, mac);
        assert_ne!(seed, mac);
    }

    #[test]
    fn test_nonces_are_domain_separated() {
        let key = [0x13u8; 32];
        let seed = [0x13u8; 32];
        let id = [0x07u8; 32];
        let payload = payload_nonce(&key).unwrap();
        let recipient = recipient_nonce(&seed, &id).unwrap();
        assert_ne!(payload, recipient);
    }

    #[test]
    fn test_expand_multi_block_output() {
        // 96 bytes forces two HMAC-SHA-512 blocks; make sure the chained
        // block differs from a fresh single-block expansion.
        let okm = wrap_keys(&DK).unwrap();
        let mut first_block = [0u8; 64];
        expand_sha512(&DK, &[b"harp.container.v2.wrap"], &mut first_block).unwrap();
        assert_eq!(&okm[..64], &first_block[..]);
        assert_ne!(&okm[64..96], &first_block[..32]);
    }
}
