//! Error types for the game core.
//!
//! Only conditions the requesting client should hear about are errors.
//! Stale or unauthorized intents are not: they come back as an empty
//! [`Outcome`](crate::Outcome).

use mastermind_protocol::{PlayerId, RoomCode};

/// Errors reported to the client whose intent caused them.
///
/// The `Display` text is what the client sees in its `error` push, so the
/// `#[error("...")]` strings here are part of the wire contract: clients
/// match on "Room not found" and "Room is full". Data the text leaves out,
/// like the room code in `NotFound`, is there for the logs.
///
/// Nothing here means "you are not allowed to do that". Intents from
/// non-hosts or from the wrong game state are dropped without a reply.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("Room not found")]
    NotFound(RoomCode),

    /// Every seat for the room's mode is taken.
    #[error("Room is full")]
    RoomFull(RoomCode),

    /// The player already holds a seat somewhere.
    #[error("Already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The room exists but does not accept this right now.
    #[error("{0}")]
    InvalidState(String),

    /// Empty (or whitespace-only) player name.
    #[error("Player name is required")]
    InvalidName,

    /// A settings patch outside the allowed bounds (code length 3..=6).
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A duel code that does not fit the room settings.
    #[error("Invalid code: {0}")]
    InvalidCode(#[source] CodeError),

    /// A guess that is not `codeLength` digits.
    #[error("Invalid guess: {0}")]
    InvalidGuess(#[source] CodeError),

    /// Start requested before the mode's preconditions hold.
    #[error("{0}")]
    NotReady(String),
}

/// Why a code string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodeError {
    #[error("expected {expected} digits, got {found}")]
    WrongLength { expected: usize, found: usize },

    #[error("'{0}' is not a digit")]
    NotADigit(char),

    #[error("digit '{0}' repeats")]
    RepeatedDigit(char),
}
