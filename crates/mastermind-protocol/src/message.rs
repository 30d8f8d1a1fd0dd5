//! Messages exchanged between clients and the room server.
//!
//! Client → server messages are *intents*: the server decides whether and
//! how they change state. Server → client messages are *pushes*: full room
//! snapshots tailored to the recipient, or a short notice.
//!
//! Intents are internally tagged:
//!
//! ```json
//! { "type": "submit_guess", "roomId": "K7QD", "guessCode": "1234" }
//! ```
//!
//! Pushes are adjacently tagged so the payload can be a bare string:
//!
//! ```json
//! { "type": "error", "data": "Room is full" }
//! ```

use serde::{Deserialize, Serialize};

use crate::{DuelKind, GameMode, RoomCode, RoomView};

/// Partial settings update sent by the host. Absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_repeats: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duel_mode_type: Option<DuelKind>,
}

/// Client → server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientIntent {
    /// Create a room and take the host seat.
    CreateRoom { game_mode: GameMode, player_name: String },
    /// Take a seat in an existing room.
    JoinRoom { room_id: RoomCode, player_name: String },
    SetReady { room_id: RoomCode, is_ready: bool },
    /// Host only, Lobby only.
    UpdateSettings { room_id: RoomCode, settings: SettingsPatch },
    /// Host only.
    StartGame { room_id: RoomCode },
    /// PvP duel only: the code the opponent will have to crack.
    SetDuelCode { room_id: RoomCode, code: String },
    SubmitGuess { room_id: RoomCode, guess_code: String },
    /// Back to the Lobby after a game is decided. Host only.
    ResetGame { room_id: RoomCode },
    LeaveRoom { room_id: RoomCode },
}

impl ClientIntent {
    /// The room this intent targets; `None` for `create_room`.
    pub fn room_id(&self) -> Option<&RoomCode> {
        match self {
            Self::CreateRoom { .. } => None,
            Self::JoinRoom { room_id, .. }
            | Self::SetReady { room_id, .. }
            | Self::UpdateSettings { room_id, .. }
            | Self::StartGame { room_id }
            | Self::SetDuelCode { room_id, .. }
            | Self::SubmitGuess { room_id, .. }
            | Self::ResetGame { room_id }
            | Self::LeaveRoom { room_id } => Some(room_id),
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::SetReady { .. } => "set_ready",
            Self::UpdateSettings { .. } => "update_settings",
            Self::StartGame { .. } => "start_game",
            Self::SetDuelCode { .. } => "set_duel_code",
            Self::SubmitGuess { .. } => "submit_guess",
            Self::ResetGame { .. } => "reset_game",
            Self::LeaveRoom { .. } => "leave_room",
        }
    }
}

/// Server → client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerPush {
    /// Sent after any mutation of the room.
    RoomUpdate(RoomView),
    /// Sent when a game (or a battle-royale round) begins.
    GameStart(RoomView),
    /// Sent on the transition into `Won` or `Lost`.
    GameOver(RoomView),
    /// Sent to the players who remain when someone leaves.
    PlayerLeft { name: String },
    /// Sent to the requesting client only.
    Error(String),
}

impl ServerPush {
    /// The room view carried by this push, if any.
    pub fn view(&self) -> Option<&RoomView> {
        match self {
            Self::RoomUpdate(view) | Self::GameStart(view) | Self::GameOver(view) => Some(view),
            Self::PlayerLeft { .. } | Self::Error(_) => None,
        }
    }
}
