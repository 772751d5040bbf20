//! The seal and unseal protocol.
//!
//! Sealing is a single-pass pipeline: generate ephemeral material,
//! encrypt the payload, wrap the payload key for every recipient, sign,
//! emit. Unsealing mirrors it: decode, derive, look up the wrapped key,
//! verify the producer signature, decrypt. There is no state between
//! invocations; a failure at any step is terminal for that container.
//!
//! Sensitive buffers (payload key, shared keys, the ephemeral scalar)
//! are scoped and wiped on every exit path, including unwinding.

use chacha20poly1305::aead::{Aead, Payload};
use chacha20poly1305::{KeyInit, XChaCha20Poly1305, XNonce};
use p384::ecdsa::signature::{Signer, Verifier};
use p384::ecdsa::Signature;
use p384::elliptic_curve::sec1::ToEncodedPoint;
use p384::SecretKey;
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::core::codec;
use crate::core::error::{SealError, SealResult};
use crate::core::kdf;
use crate::core::operations::recipient::{derive_shared_key, pack_recipient, try_recipient_keys};
use crate::core::pae::pae;
use crate::core::types::{
    Container, ContainerHeader, PreSharedKey, RecipientPublicKey, RecipientSecretKey,
    SigningPublicKey, SigningSecretKey,
};
use crate::core::{CONTENT_TYPE_BUNDLE, PAYLOAD_KEY_SIZE, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};

/// Options recognized by [`seal`].
#[derive(Debug, Clone)]
pub struct SealOptions {
    /// Optional pre-shared key mixed into every derivation.
    pub psk: Option<PreSharedKey>,
    /// When true (the default) the recipient wrap seeds are derived,
    /// keeping containers byte-reproducible given the same RNG inputs.
    /// When false the seeds are drawn from the RNG.
    pub deterministic: bool,
}

impl Default for SealOptions {
    fn default() -> Self {
        Self {
            psk: None,
            deterministic: true,
        }
    }
}

/// Options recognized by [`unseal`].
#[derive(Debug, Clone, Default)]
pub struct UnsealOptions {
    /// Optional pre-shared key; must match the one used at seal time.
    pub psk: Option<PreSharedKey>,
    /// The producer verification key, distributed out-of-band.
    pub signer_public_key: Option<SigningPublicKey>,
    /// Accept a missing verification key. Only honored when the crate is
    /// built with the `unauthenticated-unseal` feature; rejected with
    /// [`SealError::PolicyViolation`] otherwise.
    pub allow_unauthenticated: bool,
}

/// Seals `content` for the given recipients and signs the container.
///
/// The returned byte string is the self-contained wire artifact defined
/// by the codec. The recipient list order is preserved in the output.
///
/// # Errors
///
/// Returns [`SealError::NoRecipients`] for an empty recipient list and
/// [`SealError::Internal`] on RNG or primitive failure.
pub fn seal<R: CryptoRngCore>(
    rng: &mut R,
    content: &[u8],
    recipients: &[RecipientPublicKey],
    signing_key: &SigningSecretKey,
    options: &SealOptions,
) -> SealResult<Vec<u8>> {
    if recipients.is_empty() {
        return Err(SealError::NoRecipients);
    }

    // Fresh ephemeral keypair; the private half never leaves this scope
    let ephemeral = SecretKey::random(rng);
    let point = ephemeral.public_key().to_encoded_point(false);
    let mut sender_public = [0u8; PUBLIC_KEY_SIZE];
    sender_public.copy_from_slice(point.as_bytes());

    // Fresh payload key
    let mut payload_key = Zeroizing::new([0u8; PAYLOAD_KEY_SIZE]);
    rng.try_fill_bytes(payload_key.as_mut())
        .map_err(|_| SealError::Internal)?;

    // Encrypt the payload under a derived nonce, binding the header
    let headers = ContainerHeader::new(CONTENT_TYPE_BUNDLE, sender_public);
    let header_encoded = codec::header_bytes(&headers);
    let aad = pae(&[&header_encoded]);
    let nonce = kdf::payload_nonce(&payload_key)?;
    let cipher = XChaCha20Poly1305::new((&*payload_key).into());
    let raw = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: content,
                aad: &aad,
            },
        )
        .map_err(|_| SealError::Internal)?;

    // Wrap the payload key for every recipient, preserving input order
    let mut packed = Vec::with_capacity(recipients.len());
    for public in recipients {
        packed.push(pack_recipient(
            rng,
            &payload_key,
            &ephemeral,
            &sender_public,
            public,
            options.psk.as_ref(),
            options.deterministic,
        )?);
    }

    // Sign header, recipients and ciphertext (RFC 6979, deterministic)
    let message = codec::signature_message(&headers, &packed, &raw);
    let signature: Signature = signing_key
        .as_signing()
        .try_sign(&message)
        .map_err(|_| SealError::Internal)?;
    let mut signature_bytes = [0u8; SIGNATURE_SIZE];
    signature_bytes.copy_from_slice(&signature.to_bytes());

    let container = Container::new(headers, packed, raw, signature_bytes);
    Ok(codec::encode(&container))
}

/// Opens a sealed container with the recipient's private key.
///
/// # Errors
///
/// Any failure surfaces as a [`SealError`] whose Display is the uniform
/// "container cannot be opened" message; the kind remains available for
/// programmatic inspection.
pub fn unseal(
    container_bytes: &[u8],
    recipient_secret: &RecipientSecretKey,
    options: &UnsealOptions,
) -> SealResult<Vec<u8>> {
    let container = codec::decode(container_bytes)?;

    // The embedded ephemeral key must be a valid curve point
    let sender_public =
        RecipientPublicKey::from_sec1_bytes(container.headers().sender_public_key())?;

    // Locate and unwrap the payload key
    let shared_key = derive_shared_key(
        &sender_public,
        recipient_secret.as_secret(),
        options.psk.as_ref(),
    )?;
    let payload_key = try_recipient_keys(
        &shared_key,
        container.headers().sender_public_key(),
        container.recipients(),
        options.psk.as_ref(),
    )?;

    // Producer authenticity
    match &options.signer_public_key {
        Some(signer) => {
            let message = codec::signature_message(
                container.headers(),
                container.recipients(),
                container.raw(),
            );
            let signature = Signature::from_slice(container.signature())
                .map_err(|_| SealError::BadSignature)?;
            signer
                .as_verifying()
                .verify(&message, &signature)
                .map_err(|_| SealError::BadSignature)?;
        }
        None => {
            #[cfg(feature = "unauthenticated-unseal")]
            if !options.allow_unauthenticated {
                return Err(SealError::PolicyViolation);
            }
            #[cfg(not(feature = "unauthenticated-unseal"))]
            return Err(SealError::PolicyViolation);
        }
    }

    // Decrypt the payload
    let nonce = kdf::payload_nonce(&payload_key)?;
    let header_encoded = codec::header_bytes(container.headers());
    let aad = pae(&[&header_encoded]);
    let cipher = XChaCha20Poly1305::new((&*payload_key).into());
    let content = cipher
        .decrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: container.raw(),
                aad: &aad,
            },
        )
        .map_err(|_| SealError::CorruptPayload)?;

    Ok(content)
}
