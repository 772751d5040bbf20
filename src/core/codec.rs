//! Binary on-wire format for sealed containers.
//!
//! ```text
//! Container ::= Header || LE32(n_recipients) || Recipient{n}
//!            || LE64(len(raw)) || raw || LE32(len(sig)) || sig
//! Header    ::= "HARP.CONTAINER\x00\x02"
//!            || LE32(content_type) || LE32(encoding_version)
//!            || sender_public_key[97]
//! Recipient ::= LE32(32) || identifier || LE32(96) || key
//! ```
//!
//! All integers are little-endian. The codec is total: every byte string
//! either decodes to exactly one [`Container`] or fails with
//! [`SealError::MalformedContainer`]. Declared lengths are enforced
//! exactly and trailing bytes are rejected.

use crate::core::error::{SealError, SealResult};
use crate::core::pae::pae;
use crate::core::types::{Container, ContainerHeader, Recipient};
use crate::core::{
    ENCODING_VERSION, KEY_IDENTIFIER_SIZE, PUBLIC_KEY_SIZE, RECIPIENT_KEY_SIZE, SIGNATURE_SIZE,
    TAG_SIZE,
};

/// Magic prefix: format name, a NUL separator and the version byte.
pub const CONTAINER_MAGIC: [u8; 16] = *b"HARP.CONTAINER\x00\x02";

/// Minimum wire size of one recipient entry.
const RECIPIENT_WIRE_SIZE: usize = 4 + KEY_IDENTIFIER_SIZE + 4 + RECIPIENT_KEY_SIZE;

/// Returns true when the byte string starts with the container magic.
///
/// This is the cheap detection hook used by the outer toolchain to decide
/// whether an input is a sealed container before attempting to decode it.
#[must_use]
pub fn is_container(bytes: &[u8]) -> bool {
    bytes.len() >= CONTAINER_MAGIC.len() && bytes[..CONTAINER_MAGIC.len()] == CONTAINER_MAGIC
}

/// Serializes the header fields in wire order.
pub(crate) fn header_bytes(headers: &ContainerHeader) -> Vec<u8> {
    let mut out = Vec::with_capacity(CONTAINER_MAGIC.len() + 4 + 4 + PUBLIC_KEY_SIZE);
    out.extend_from_slice(&CONTAINER_MAGIC);
    out.extend_from_slice(&headers.content_type().to_le_bytes());
    out.extend_from_slice(&headers.encoding_version().to_le_bytes());
    out.extend_from_slice(headers.sender_public_key());
    out
}

/// Serializes one recipient entry in wire order.
pub(crate) fn recipient_bytes(recipient: &Recipient) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECIPIENT_WIRE_SIZE);
    out.extend_from_slice(&(KEY_IDENTIFIER_SIZE as u32).to_le_bytes());
    out.extend_from_slice(recipient.identifier());
    out.extend_from_slice(&(RECIPIENT_KEY_SIZE as u32).to_le_bytes());
    out.extend_from_slice(recipient.key());
    out
}

/// Builds the PAE message covered by the container signature:
/// the header, every recipient entry in order, and the ciphertext.
pub(crate) fn signature_message(
    headers: &ContainerHeader,
    recipients: &[Recipient],
    raw: &[u8],
) -> Vec<u8> {
    let header = header_bytes(headers);
    let encoded: Vec<Vec<u8>> = recipients.iter().map(recipient_bytes).collect();
    let mut pieces: Vec<&[u8]> = Vec::with_capacity(2 + encoded.len());
    pieces.push(&header);
    for entry in &encoded {
        pieces.push(entry);
    }
    pieces.push(raw);
    pae(&pieces)
}

/// Encodes a container into its wire representation.
#[must_use]
pub fn encode(container: &Container) -> Vec<u8> {
    let recipients = container.recipients();
    let raw = container.raw();
    let mut out = Vec::with_capacity(
        CONTAINER_MAGIC.len()
            + 8
            + PUBLIC_KEY_SIZE
            + 4
            + recipients.len() * RECIPIENT_WIRE_SIZE
            + 8
            + raw.len()
            + 4
            + SIGNATURE_SIZE,
    );
    out.extend_from_slice(&header_bytes(container.headers()));
    out.extend_from_slice(&(recipients.len() as u32).to_le_bytes());
    for recipient in recipients {
        out.extend_from_slice(&recipient_bytes(recipient));
    }
    out.extend_from_slice(&(raw.len() as u64).to_le_bytes());
    out.extend_from_slice(raw);
    out.extend_from_slice(&(SIGNATURE_SIZE as u32).to_le_bytes());
    out.extend_from_slice(container.signature());
    out
}

/// Decodes a container from its wire representation.
///
/// # Errors
///
/// Returns [`SealError::MalformedContainer`] for any structural defect:
/// wrong magic or version, inconsistent lengths, zero recipients, a
/// ciphertext shorter than the AEAD tag, or trailing bytes.
pub fn decode(bytes: &[u8]) -> SealResult<Container> {
    let mut cursor = Cursor::new(bytes);

    let magic = cursor.take(CONTAINER_MAGIC.len())?;
    if magic != CONTAINER_MAGIC {
        return Err(SealError::MalformedContainer);
    }

    let content_type = cursor.le32()?;
    let encoding_version = cursor.le32()?;
    if encoding_version != ENCODING_VERSION {
        return Err(SealError::MalformedContainer);
    }

    let mut sender_public_key = [0u8; PUBLIC_KEY_SIZE];
    sender_public_key.copy_from_slice(cursor.take(PUBLIC_KEY_SIZE)?);

    let recipient_count = cursor.le32()? as usize;
    if recipient_count == 0 || recipient_count > cursor.remaining() / RECIPIENT_WIRE_SIZE {
        return Err(SealError::MalformedContainer);
    }

    let mut recipients = Vec::with_capacity(recipient_count);
    for _ in 0..recipient_count {
        if cursor.le32()? as usize != KEY_IDENTIFIER_SIZE {
            return Err(SealError::MalformedContainer);
        }
        let mut identifier = [0u8; KEY_IDENTIFIER_SIZE];
        identifier.copy_from_slice(cursor.take(KEY_IDENTIFIER_SIZE)?);

        if cursor.le32()? as usize != RECIPIENT_KEY_SIZE {
            return Err(SealError::MalformedContainer);
        }
        let mut key = [0u8; RECIPIENT_KEY_SIZE];
        key.copy_from_slice(cursor.take(RECIPIENT_KEY_SIZE)?);

        recipients.push(Recipient::new(identifier, key));
    }

    let raw_len =
        usize::try_from(cursor.le64()?).map_err(|_| SealError::MalformedContainer)?;
    if raw_len < TAG_SIZE {
        return Err(SealError::MalformedContainer);
    }
    let raw = cursor.take(raw_len)?.to_vec();

    if cursor.le32()? as usize != SIGNATURE_SIZE {
        return Err(SealError::MalformedContainer);
    }
    let mut signature = [0u8; SIGNATURE_SIZE];
    signature.copy_from_slice(cursor.take(SIGNATURE_SIZE)?);

    cursor.finish()?;

    Ok(Container::new(
        ContainerHeader::with_encoding_version(content_type, encoding_version, sender_public_key),
        recipients,
        raw,
        signature,
    ))
}

impl Container {
    /// Serializes the container into its wire representation.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        encode(self)
    }

    /// Parses a container from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::MalformedContainer`] for any structural defect.
    pub fn from_bytes(bytes: &[u8]) -> SealResult<Self> {
        decode(bytes)
    }
}

/// Bounds-checked reader over the input buffer.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> SealResult<&'a [u8]> {
        if len > self.remaining() {
            return Err(SealError::MalformedContainer);
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn le32(&mut self) -> SealResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn le64(&mut self) -> SealResult<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    fn finish(&self) -> SealResult<()> {
        if self.remaining() != 0 {
            return Err(SealError::MalformedContainer);
        }
        Ok(())
    }
}
