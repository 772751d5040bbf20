//! Abstract payload-key transformer.
//!
//! Callers that escrow the payload key in a remote KMS implement this
//! contract above the sealing engine: the engine itself never talks to a
//! key store and gives no guarantees about transformed keys. The trait
//! is object safe so integrations can be chosen at runtime.

use crate::core::error::SealResult;

/// Wraps and unwraps a payload key through an external key service.
pub trait Transformer {
    /// Transforms a payload key into its escrowed representation.
    ///
    /// # Errors
    ///
    /// Implementations surface transport or key-service failures as
    /// [`crate::SealError::Internal`].
    fn wrap_payload_key(&self, payload_key: &[u8]) -> SealResult<Vec<u8>>;

    /// Recovers a payload key from its escrowed representation.
    ///
    /// # Errors
    ///
    /// Implementations surface transport or key-service failures as
    /// [`crate::SealError::Internal`].
    fn unwrap_payload_key(&self, wrapped: &[u8]) -> SealResult<Vec<u8>>;
}

/// Builds a [`Transformer`] on demand, e.g. one per seal invocation.
pub type TransformerFactory = Box<dyn Fn() -> SealResult<Box<dyn Transformer>> + Send + Sync>;
