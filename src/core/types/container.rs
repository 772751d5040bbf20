//! Sealed container types.
//!
//! A [`Container`] is the self-contained artifact produced by sealing:
//! header, recipient list, payload ciphertext and producer signature.
//! Containers are built in one pass by the sealer and immutable
//! afterwards; the only supported mutations are construction and
//! serialization through the codec.

use core::fmt::{self, Debug};

use crate::core::{
    ENCODING_VERSION, KEY_IDENTIFIER_SIZE, PUBLIC_KEY_SIZE, RECIPIENT_KEY_SIZE, SIGNATURE_SIZE,
};

/// Container header: format metadata plus the ephemeral sender key.
#[derive(Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    content_type: u32,
    encoding_version: u32,
    sender_public_key: [u8; PUBLIC_KEY_SIZE],
}

impl ContainerHeader {
    pub(crate) const fn new(
        content_type: u32,
        sender_public_key: [u8; PUBLIC_KEY_SIZE],
    ) -> Self {
        Self {
            content_type,
            encoding_version: ENCODING_VERSION,
            sender_public_key,
        }
    }

    pub(crate) const fn with_encoding_version(
        content_type: u32,
        encoding_version: u32,
        sender_public_key: [u8; PUBLIC_KEY_SIZE],
    ) -> Self {
        Self {
            content_type,
            encoding_version,
            sender_public_key,
        }
    }

    /// Content type tag carried for the outer toolchain.
    #[must_use]
    pub const fn content_type(&self) -> u32 {
        self.content_type
    }

    /// Encoding version of the recipient wrapping scheme.
    #[must_use]
    pub const fn encoding_version(&self) -> u32 {
        self.encoding_version
    }

    /// The ephemeral sender public key, uncompressed SEC1.
    #[must_use]
    pub const fn sender_public_key(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.sender_public_key
    }
}

impl Debug for ContainerHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHeader")
            .field("content_type", &self.content_type)
            .field("encoding_version", &self.encoding_version)
            .field("sender_public_key", &"[P-384 point]")
            .finish()
    }
}

/// One intended reader of a container: a stable identifier plus the
/// payload key wrapped for that reader.
#[derive(Clone, PartialEq, Eq)]
pub struct Recipient {
    identifier: [u8; KEY_IDENTIFIER_SIZE],
    key: [u8; RECIPIENT_KEY_SIZE],
}

impl Recipient {
    pub(crate) const fn new(
        identifier: [u8; KEY_IDENTIFIER_SIZE],
        key: [u8; RECIPIENT_KEY_SIZE],
    ) -> Self {
        Self { identifier, key }
    }

    /// The derived recipient identifier.
    #[must_use]
    pub const fn identifier(&self) -> &[u8; KEY_IDENTIFIER_SIZE] {
        &self.identifier
    }

    /// The wrapped payload key: seed || ciphertext || MAC.
    #[must_use]
    pub const fn key(&self) -> &[u8; RECIPIENT_KEY_SIZE] {
        &self.key
    }
}

impl Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipient")
            .field("identifier", &"[...]")
            .field("key", &"[WRAPPED]")
            .finish()
    }
}

/// A sealed, signed container.
#[derive(Clone, PartialEq, Eq)]
pub struct Container {
    headers: ContainerHeader,
    recipients: Vec<Recipient>,
    raw: Vec<u8>,
    signature: [u8; SIGNATURE_SIZE],
}

impl Container {
    pub(crate) fn new(
        headers: ContainerHeader,
        recipients: Vec<Recipient>,
        raw: Vec<u8>,
        signature: [u8; SIGNATURE_SIZE],
    ) -> Self {
        Self {
            headers,
            recipients,
            raw,
            signature,
        }
    }

    /// The container header.
    #[must_use]
    pub const fn headers(&self) -> &ContainerHeader {
        &self.headers
    }

    /// The recipient list, in the order the sealer received the keys.
    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// The payload ciphertext (including the AEAD tag).
    #[must_use]
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The producer signature, fixed-width r || s.
    #[must_use]
    pub const fn signature(&self) -> &[u8; SIGNATURE_SIZE] {
        &self.signature
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("headers", &self.headers)
            .field("recipients", &self.recipients.len())
            .field("raw", &format_args!("[{} bytes]", self.raw.len()))
            .field("signature", &"[...]")
            .finish()
    }
}
