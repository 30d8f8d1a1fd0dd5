//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec (coder/decoder) converts between Rust types and raw bytes. The
//! server never touches `serde_json` directly: the connection handler goes
//! through a [`Codec`], so a different wire format can be swapped in
//! without changing the hub or the game core.
//!
//! Only [`JsonCodec`] exists today, because browser clients speak JSON
//! natively and the messages are small.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: the server clones one codec into every connection
///   task, and Tokio may run those tasks on any worker thread.
/// - `'static`: the codec borrows nothing, so it can live as long as the
///   connection task that owns it.
///
/// ## Generic methods
///
/// `encode` and `decode` work for any `T` with the matching serde trait.
/// `decode` asks for `DeserializeOwned` rather than `Deserialize<'de>`
/// because the result must not borrow from the frame buffer, which is
/// dropped as soon as the intent has been decoded.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// JSON is what browser clients speak natively, and it is readable in
/// DevTools and logs, so it is the default. Field names follow the
/// camelCase the clients expect (`roomId`, `guessCode`, ...).
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use mastermind_protocol::{ClientIntent, Codec, JsonCodec, RoomCode};
///
/// let codec = JsonCodec;
/// let intent: ClientIntent = codec
///     .decode(br#"{"type":"start_game","roomId":"abcd"}"#)
///     .unwrap();
/// assert_eq!(intent.room_id(), Some(&RoomCode::new("ABCD")));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
