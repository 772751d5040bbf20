//! Recipient key packing.
//!
//! Each recipient entry wraps the per-container payload key for one
//! reader. The wrap derives a shared key via ECDH between the ephemeral
//! sender key and the recipient key, splits it into a seed, an
//! encryption key and a MAC key, encrypts the payload key with the
//! XChaCha20 stream and authenticates everything with HMAC-SHA-384
//! (encrypt-then-MAC). The stored entry is `seed || ciphertext || mac`,
//! 96 bytes, next to the 32-byte recipient identifier.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::XChaCha20;
use hmac::{Hmac, Mac};
use p384::ecdh::diffie_hellman;
use p384::SecretKey;
use rand_core::CryptoRngCore;
use sha2::Sha384;
use subtle::{Choice, ConstantTimeEq};
use zeroize::Zeroizing;

use crate::core::error::{SealError, SealResult};
use crate::core::kdf;
use crate::core::pae::pae;
use crate::core::types::{PreSharedKey, Recipient, RecipientPublicKey};
use crate::core::{
    ENCRYPTION_KEY_SIZE, MAC_KEY_SIZE, MAC_SIZE, PAYLOAD_KEY_SIZE, PUBLIC_KEY_SIZE,
    RECIPIENT_KEY_SIZE, SEED_SIZE, SHARED_KEY_SIZE,
};

/// Derives the 32-byte shared key between a local private key and a peer
/// public key, optionally mixing in a pre-shared key.
///
/// The derivation is symmetric: both sides of the exchange compute the
/// same value from their own private half and the other's public half.
pub(crate) fn derive_shared_key(
    peer: &RecipientPublicKey,
    secret: &SecretKey,
    psk: Option<&PreSharedKey>,
) -> SealResult<Zeroizing<[u8; SHARED_KEY_SIZE]>> {
    let shared = diffie_hellman(secret.to_nonzero_scalar(), peer.as_public().as_affine());
    let mut z = Zeroizing::new([0u8; 48]);
    z.copy_from_slice(shared.raw_secret_bytes());
    kdf::shared_key_from_ecdh(&z, psk.map(PreSharedKey::as_bytes))
}

/// Computes the stable recipient identifier for a shared key.
pub(crate) fn key_identifier(
    shared_key: &[u8; SHARED_KEY_SIZE],
    psk: Option<&PreSharedKey>,
) -> SealResult<[u8; 32]> {
    kdf::key_identifier(shared_key, psk.map(PreSharedKey::as_bytes))
}

/// Wraps the payload key for one recipient.
///
/// In deterministic mode (the default) the wrap seed comes from the
/// shared-key split, keeping the container byte-reproducible; otherwise
/// the seed is drawn from the injected RNG. Either way the seed is
/// stored in the entry, so unwrapping never depends on the mode.
pub(crate) fn pack_recipient<R: CryptoRngCore>(
    rng: &mut R,
    payload_key: &[u8; PAYLOAD_KEY_SIZE],
    ephemeral: &SecretKey,
    sender_public: &[u8; PUBLIC_KEY_SIZE],
    recipient: &RecipientPublicKey,
    psk: Option<&PreSharedKey>,
    deterministic: bool,
) -> SealResult<Recipient> {
    // Derive shared key and identifier
    let shared_key = derive_shared_key(recipient, ephemeral, psk)?;
    let identifier = key_identifier(&shared_key, psk)?;

    // Split into seed, encryption key and MAC key
    let okm = kdf::wrap_keys(&shared_key)?;
    let mut seed = [0u8; SEED_SIZE];
    seed.copy_from_slice(&okm[..SEED_SIZE]);
    if !deterministic {
        rng.try_fill_bytes(&mut seed)
            .map_err(|_| SealError::Internal)?;
    }
    let mut encryption_key = Zeroizing::new([0u8; ENCRYPTION_KEY_SIZE]);
    encryption_key.copy_from_slice(&okm[SEED_SIZE..SEED_SIZE + ENCRYPTION_KEY_SIZE]);
    let mut mac_key = Zeroizing::new([0u8; MAC_KEY_SIZE]);
    mac_key.copy_from_slice(&okm[SEED_SIZE + ENCRYPTION_KEY_SIZE..]);

    // Encrypt the payload key
    let nonce = kdf::recipient_nonce(&seed, &identifier)?;
    let mut ciphertext = *payload_key;
    let mut cipher = XChaCha20::new((&*encryption_key).into(), (&nonce).into());
    cipher.apply_keystream(&mut ciphertext);

    // Authenticate identifier, sender key and ciphertext
    let mut mac = <Hmac<Sha384> as Mac>::new_from_slice(mac_key.as_ref())
        .map_err(|_| SealError::Internal)?;
    mac.update(&pae(&[&identifier, sender_public, &ciphertext]));
    let tag: [u8; 48] = mac.finalize().into_bytes().into();

    let mut key = [0u8; RECIPIENT_KEY_SIZE];
    key[..SEED_SIZE].copy_from_slice(&seed);
    key[SEED_SIZE..SEED_SIZE + PAYLOAD_KEY_SIZE].copy_from_slice(&ciphertext);
    key[SEED_SIZE + PAYLOAD_KEY_SIZE..].copy_from_slice(&tag[..MAC_SIZE]);

    Ok(Recipient::new(identifier, key))
}

/// Looks up and unwraps the payload key in a recipient list.
///
/// Every identifier in the list is compared in constant time before any
/// further work; the scan never short-circuits, so the comparison cost
/// is independent of which entry (if any) matches. The first matching
/// entry that also authenticates wins.
pub(crate) fn try_recipient_keys(
    shared_key: &[u8; SHARED_KEY_SIZE],
    sender_public: &[u8; PUBLIC_KEY_SIZE],
    recipients: &[Recipient],
    psk: Option<&PreSharedKey>,
) -> SealResult<Zeroizing<[u8; PAYLOAD_KEY_SIZE]>> {
    let expected = key_identifier(shared_key, psk)?;

    // Full scan first: no early exit across recipients
    let mut any = Choice::from(0u8);
    let mut hits = Vec::with_capacity(recipients.len());
    for recipient in recipients {
        let hit = recipient.identifier().ct_eq(&expected);
        any |= hit;
        hits.push(hit);
    }
    if !bool::from(any) {
        return Err(SealError::NoMatchingRecipient);
    }

    let okm = kdf::wrap_keys(shared_key)?;
    let mut encryption_key = Zeroizing::new([0u8; ENCRYPTION_KEY_SIZE]);
    encryption_key.copy_from_slice(&okm[SEED_SIZE..SEED_SIZE + ENCRYPTION_KEY_SIZE]);
    let mut mac_key = Zeroizing::new([0u8; MAC_KEY_SIZE]);
    mac_key.copy_from_slice(&okm[SEED_SIZE + ENCRYPTION_KEY_SIZE..]);

    for (recipient, hit) in recipients.iter().zip(hits) {
        if !bool::from(hit) {
            continue;
        }

        let key = recipient.key();
        let mut seed = [0u8; SEED_SIZE];
        seed.copy_from_slice(&key[..SEED_SIZE]);
        let mut ciphertext = [0u8; PAYLOAD_KEY_SIZE];
        ciphertext.copy_from_slice(&key[SEED_SIZE..SEED_SIZE + PAYLOAD_KEY_SIZE]);
        let stored_mac = &key[SEED_SIZE + PAYLOAD_KEY_SIZE..];

        let mut mac = <Hmac<Sha384> as Mac>::new_from_slice(mac_key.as_ref())
            .map_err(|_| SealError::Internal)?;
        mac.update(&pae(&[recipient.identifier(), sender_public, &ciphertext]));
        let tag: [u8; 48] = mac.finalize().into_bytes().into();
        if !bool::from(tag[..MAC_SIZE].ct_eq(stored_mac)) {
            continue;
        }

        let nonce = kdf::recipient_nonce(&seed, recipient.identifier())?;
        let mut payload_key = Zeroizing::new([0u8; PAYLOAD_KEY_SIZE]);
        payload_key.copy_from_slice(&ciphertext);
        let mut cipher = XChaCha20::new((&*encryption_key).into(), (&nonce).into());
        cipher.apply_keystream(payload_key.as_mut());
        return Ok(payload_key);
    }

    // An identifier matched but nothing authenticated
    Err(SealError::CorruptRecipient)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::core::types::{Recipient, RecipientSecretKey};
    use rand_core::OsRng;

    // P-384 scalars derived from the deterministic "00001-..." / "00002-..."
    // test seed buffers.
    fn test_key_1() -> RecipientSecretKey {
        let bytes = hex::decode(
            "7465726d696e69737469632d62756666701a36e793032c42d410bd740edfa5f5\
             96646feb22bd23b31b10922b5a2f544a",
        )
        .unwrap();
        RecipientSecretKey::from_bytes(&bytes).unwrap()
    }

    fn test_key_2() -> RecipientSecretKey {
        let bytes = hex::decode(
            "7465726d696e69737469632d62756666701a36e7933bc8f5521c86462f888ce2\
             e518b843a6bf3f87ba4fd000d5355437",
        )
        .unwrap();
        RecipientSecretKey::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_derive_shared_key() {
        let key1 = test_key_1();
        let key2 = test_key_2();

        let dk1 = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        assert_eq!(
            *dk1,
            [
                0xd1, 0x71, 0x62, 0xf8, 0xaf, 0x56, 0x5e, 0x0e, 0xab, 0x30, 0xb6, 0xa8, 0x8c,
                0xcb, 0x37, 0x66, 0xc2, 0xa7, 0x9d, 0xa9, 0x4b, 0x87, 0x40, 0xb6, 0xfa, 0x42,
                0xc8, 0xf6, 0xd9, 0x67, 0x84, 0x2e,
            ]
        );

        // Symmetry: swapping the halves yields the same key
        let dk2 = derive_shared_key(&key2.public_key(), key1.as_secret(), None).unwrap();
        assert_eq!(*dk1, *dk2);
    }

    #[test]
    fn test_derive_shared_key_with_psk() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let psk = PreSharedKey::new([0u8; 32]);

        let dk1 = derive_shared_key(&key1.public_key(), key2.as_secret(), Some(&psk)).unwrap();
        assert_eq!(
            *dk1,
            [
                0x6b, 0x74, 0x02, 0xca, 0x1b, 0x65, 0x2f, 0x8e, 0x1b, 0x8f, 0x15, 0xdc, 0x87,
                0x57, 0x18, 0x29, 0xc4, 0xec, 0x4a, 0x6c, 0x9b, 0x3f, 0xaf, 0x50, 0xb4, 0x05,
                0xc3, 0x6b, 0x4a, 0xd9, 0x38, 0x30,
            ]
        );

        let dk2 = derive_shared_key(&key2.public_key(), key1.as_secret(), Some(&psk)).unwrap();
        assert_eq!(*dk1, *dk2);

        // A zero PSK is a different mode than no PSK
        let plain = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        assert_ne!(*dk1, *plain);
    }

    #[test]
    fn test_pack_recipient() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            true,
        )
        .unwrap();

        assert_eq!(
            recipient.identifier(),
            &[
                0x58, 0x3b, 0x24, 0x69, 0x6d, 0x15, 0x3b, 0xbe, 0x48, 0x73, 0x04, 0x17, 0x49,
                0x8b, 0x1c, 0x73, 0xde, 0x65, 0x76, 0x7e, 0xa7, 0x2d, 0x43, 0x19, 0xe5, 0x10,
                0x42, 0xef, 0x72, 0x7f, 0x92, 0xca,
            ]
        );
        assert_eq!(recipient.key().len(), RECIPIENT_KEY_SIZE);
    }

    #[test]
    fn test_pack_recipient_with_psk() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let psk = PreSharedKey::new([0u8; 32]);
        let payload_key = [0u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            Some(&psk),
            true,
        )
        .unwrap();

        assert_eq!(
            recipient.identifier(),
            &[
                0x4d, 0xd4, 0x47, 0xdd, 0xb8, 0x7c, 0x7f, 0x19, 0xa1, 0x01, 0x40, 0x8d, 0xc1,
                0x4f, 0xb6, 0x14, 0xf9, 0xde, 0xe2, 0x88, 0xd7, 0xa7, 0xc5, 0x81, 0x85, 0x0c,
                0x97, 0x49, 0x93, 0x98, 0x70, 0xec,
            ]
        );
        assert_eq!(recipient.key().len(), RECIPIENT_KEY_SIZE);
    }

    #[test]
    fn test_try_recipient_keys() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            true,
        )
        .unwrap();

        // The reader derives the same shared key from its private half
        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let unwrapped =
            try_recipient_keys(&dk, &sender_public, &[recipient], None).unwrap();
        assert_eq!(*unwrapped, payload_key);
    }

    #[test]
    fn test_try_recipient_keys_with_psk() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let psk = PreSharedKey::new([0u8; 32]);
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            Some(&psk),
            true,
        )
        .unwrap();

        let dk =
            derive_shared_key(&key1.public_key(), key2.as_secret(), Some(&psk)).unwrap();
        let unwrapped =
            try_recipient_keys(&dk, &sender_public, &[recipient], Some(&psk)).unwrap();
        assert_eq!(*unwrapped, payload_key);
    }

    #[test]
    fn test_try_recipient_keys_wrong_psk() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let psk = PreSharedKey::new([0u8; 32]);
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            Some(&psk),
            true,
        )
        .unwrap();

        // Reader without the PSK derives a foreign identifier space
        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let result = try_recipient_keys(&dk, &sender_public, &[recipient], None);
        assert!(matches!(result, Err(SealError::NoMatchingRecipient)));
    }

    #[test]
    fn test_try_recipient_keys_corrupt_mac() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            true,
        )
        .unwrap();

        let mut key = *recipient.key();
        key[RECIPIENT_KEY_SIZE - 1] ^= 0xff;
        let tampered = Recipient::new(*recipient.identifier(), key);

        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let result = try_recipient_keys(&dk, &sender_public, &[tampered], None);
        assert!(matches!(result, Err(SealError::CorruptRecipient)));
    }

    #[test]
    fn test_try_recipient_keys_corrupt_ciphertext() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            true,
        )
        .unwrap();

        let mut key = *recipient.key();
        key[SEED_SIZE] ^= 0x01;
        let tampered = Recipient::new(*recipient.identifier(), key);

        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let result = try_recipient_keys(&dk, &sender_public, &[tampered], None);
        assert!(matches!(result, Err(SealError::CorruptRecipient)));
    }

    #[test]
    fn test_try_recipient_keys_duplicate_entries() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            true,
        )
        .unwrap();

        // Duplicate public keys are benign: first valid entry wins
        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let unwrapped = try_recipient_keys(
            &dk,
            &sender_public,
            &[recipient.clone(), recipient],
            None,
        )
        .unwrap();
        assert_eq!(*unwrapped, payload_key);
    }

    #[test]
    fn test_random_seed_mode_still_unwraps() {
        let key1 = test_key_1();
        let key2 = test_key_2();
        let payload_key = [0x13u8; PAYLOAD_KEY_SIZE];
        let sender_public = key1.public_key().to_bytes();

        let recipient = pack_recipient(
            &mut OsRng,
            &payload_key,
            key1.as_secret(),
            &sender_public,
            &key2.public_key(),
            None,
            false,
        )
        .unwrap();

        let dk = derive_shared_key(&key1.public_key(), key2.as_secret(), None).unwrap();
        let unwrapped =
            try_recipient_keys(&dk, &sender_public, &[recipient], None).unwrap();
        assert_eq!(*unwrapped, payload_key);
    }
}
