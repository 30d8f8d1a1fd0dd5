//! Unified error type for the room server.

use mastermind_core::RoomError;
use mastermind_protocol::ProtocolError;
use mastermind_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Users of this crate deal with this single error type instead of
/// importing errors from each lower crate. The `#[from]` attribute on each
/// variant auto-generates a `From` impl, so the `?` operator converts
/// transport, protocol and room errors automatically. `#[error(transparent)]`
/// forwards `Display` and `source()` to the wrapped error, so a
/// `RoomError` still prints its client-facing text.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error. Normally answered to the client as an `error`
    /// push rather than propagated.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The game hub task is gone; no further intents can be processed.
    #[error("game hub is not running")]
    HubClosed,
}
