//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. When you see a
//! `ProtocolError`, the problem is in turning messages into bytes or back,
//! not in the socket underneath or in the game rules above.

/// Errors that can occur in the protocol layer.
///
/// The connection handler never forwards these to the client verbatim: a
/// frame that fails to decode is answered with a generic
/// "Malformed message" push, and the `Display` text below only ends up in
/// the server's logs.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    ///
    /// With the JSON codec this practically cannot happen for the message
    /// types in this crate, since every field is a string, number, bool or
    /// a map with string keys. It is still reported rather than unwrapped
    /// so that a future codec can fail honestly.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, an unknown `type` tag, a missing
    /// `roomId`, or a field with the wrong type (say, `"isReady": "yes"`).
    /// The wrapped `serde_json::Error` carries the line and column.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
