//! # Mastermind room server
//!
//! Authoritative, real-time server for multiplayer Mastermind. Clients
//! connect over WebSocket, send JSON intents (`create_room`,
//! `submit_guess`, ...) and receive full room snapshots, redacted for
//! each recipient, after every change.
//!
//! One hub task owns every room and processes intents, departures and
//! timers one at a time; connection tasks only decode and encode.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mastermind_server::prelude::*;
//!
//! # async fn run() -> Result<(), ServerError> {
//! let server = MastermindServer::builder()
//!     .bind("127.0.0.1:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod hub;
mod server;
mod session;

pub use config::{DEFAULT_BIND_ADDR, ServerConfig};
pub use error::ServerError;
pub use server::{MastermindServer, MastermindServerBuilder};

/// Everything needed to start a server and speak its protocol.
pub mod prelude {
    pub use crate::{
        DEFAULT_BIND_ADDR, MastermindServer, MastermindServerBuilder, ServerConfig, ServerError,
    };
    pub use mastermind_core::GameTimings;
    pub use mastermind_protocol::{
        ClientIntent, Codec, DuelKind, GameMode, GameState, JsonCodec, PlayerId, RoomCode,
        RoomView, ServerPush, SettingsPatch,
    };
}
