//! Identity types, game modes and room settings shared by every layer.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// Human players get the id of the connection they arrived on; CPU players
/// all share one reserved id.
/// `#[serde(transparent)]` keeps it a plain number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 4;

/// Characters a room code is drawn from. `I`, `O`, `0` and `1` are left
/// out so codes survive being read aloud.
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Short, human-shareable room code such as `"K7QD"`.
///
/// Codes are normalized to upper case when built or decoded, so a client
/// typing `k7qd` still finds the room. Decoding never fails: an invalid
/// code simply names a room that does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Builds a room code, normalizing it to upper case.
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    /// Returns `true` if the code has the expected length and alphabet.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == ROOM_CODE_LEN && self.0.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RoomCode {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> Self {
        code.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game mode & state
// ---------------------------------------------------------------------------

/// The variant a room plays. Fixed when the room is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    /// One player against a generated secret.
    Single,
    /// Two seats: either two humans setting codes for each other, or one
    /// human racing the CPU (see [`DuelKind`]).
    Duel,
    /// Up to eight players racing on one shared secret.
    Ffa,
    /// Shared-secret rounds where anyone who fails to crack the code before
    /// the panic window closes is eliminated.
    BattleRoyale,
    /// One player, a fixed time budget, as many codes as possible.
    SpeedRun,
}

impl GameMode {
    /// Maximum number of seats, CPU players included.
    pub fn capacity(self) -> usize {
        match self {
            Self::Single | Self::SpeedRun => 1,
            Self::Duel => 2,
            Self::Ffa | Self::BattleRoyale => 8,
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Single => "SINGLE",
            Self::Duel => "DUEL",
            Self::Ffa => "FFA",
            Self::BattleRoyale => "BATTLE_ROYALE",
            Self::SpeedRun => "SPEED_RUN",
        };
        f.write_str(name)
    }
}

/// Who sets the secret in a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuelKind {
    /// Each human sets the code the other one has to crack.
    #[default]
    Pvp,
    /// Human and CPU race on one generated secret.
    Cpu,
}

/// Lifecycle of a room.
///
/// ```text
/// Lobby → Playing → Won | Lost
///            ↓        ↑
///          Panic ─────┘      (FFA / battle royale only)
/// Won | Lost → Lobby         (reset)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Lobby,
    Playing,
    Panic,
    Won,
    Lost,
}

impl GameState {
    /// `true` while guesses are accepted.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Playing | Self::Panic)
    }

    /// `true` once a game has been decided and not yet reset.
    pub fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Host-editable room settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Digits per code, `3..=6`.
    pub code_length: usize,
    /// Whether a generated or duel code may repeat a digit.
    pub allow_repeats: bool,
    /// Only present for duel rooms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duel_mode_type: Option<DuelKind>,
}

impl Settings {
    pub const MIN_CODE_LENGTH: usize = 3;
    pub const MAX_CODE_LENGTH: usize = 6;
    pub const DEFAULT_CODE_LENGTH: usize = 4;

    /// Default settings for a freshly created room of the given mode.
    pub fn for_mode(mode: GameMode) -> Self {
        Self {
            code_length: Self::DEFAULT_CODE_LENGTH,
            allow_repeats: false,
            duel_mode_type: (mode == GameMode::Duel).then_some(DuelKind::Pvp),
        }
    }

    /// The duel flavor, defaulting to PvP when unset.
    pub fn duel_kind(&self) -> DuelKind {
        self.duel_mode_type.unwrap_or_default()
    }
}
