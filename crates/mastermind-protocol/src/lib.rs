//! Wire protocol for the Mastermind room server.
//!
//! This crate defines the "language" that clients and the server speak:
//!
//! - **Identity & settings** ([`PlayerId`], [`RoomCode`], [`GameMode`],
//!   [`Settings`]): shared vocabulary used by the game core as well.
//! - **Views** ([`RoomView`], [`PlayerView`], [`Guess`]): the per-recipient
//!   snapshots the server pushes after every mutation.
//! - **Messages** ([`ClientIntent`], [`ServerPush`]): what travels on the
//!   wire in each direction.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//!
//! # Architecture
//!
//! ```text
//! Transport (bytes) → Protocol (ClientIntent / ServerPush) → Core (rooms)
//! ```
//!
//! Clients only ever send intents. The server answers with full, already
//! redacted snapshots; there is no diffing and no client-side authority.

mod codec;
mod error;
mod message;
mod types;
mod view;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientIntent, ServerPush, SettingsPatch};
pub use types::{
    DuelKind, GameMode, GameState, PlayerId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode,
    Settings,
};
pub use view::{Guess, PlayerView, RoomView, ScoreBreakdown};
