//! Snapshot types pushed to clients.
//!
//! A [`RoomView`] is always built for one recipient. Fields that would leak
//! the code being cracked are already blanked by the time a view exists;
//! nothing in this module knows the redaction rules.

use serde::{Deserialize, Serialize};

use crate::{GameMode, GameState, PlayerId, RoomCode, Settings};

/// One submitted attempt. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guess {
    /// Per-player sequence number starting at 1.
    pub id: u32,
    /// The submitted digits. Empty in views where it is redacted.
    pub code: String,
    pub hits: usize,
    pub pseudo_hits: usize,
    pub feedback_message: String,
    pub player_id: PlayerId,
    pub player_name: String,
}

/// Points awarded for one solve. `total = base + efficiency + speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub base: u32,
    pub efficiency: u32,
    pub speed: u32,
    pub total: u32,
}

impl ScoreBreakdown {
    pub fn new(base: u32, efficiency: u32, speed: u32) -> Self {
        Self {
            base,
            efficiency,
            speed,
            total: base + efficiency + speed,
        }
    }
}

/// A player as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_bot: bool,
    pub guesses: Vec<Guess>,
    /// The code this player authored for their duel opponent, when the
    /// recipient is allowed to see it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_code: Option<String>,
    /// Whether an authored code exists at all, visible or not.
    pub has_secret_code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opponent_id: Option<PlayerId>,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_breakdown: Option<ScoreBreakdown>,
    /// Codes cracked in the current game.
    pub solved: u32,
    pub eliminated: bool,
}

/// The full room state as seen by one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomView {
    pub id: RoomCode,
    /// Who this view was built for.
    pub viewer_id: PlayerId,
    pub game_mode: GameMode,
    pub game_state: GameState,
    /// The shared secret; empty when there is none or it is hidden.
    pub secret_code: String,
    pub settings: Settings,
    /// In join order.
    pub players: Vec<PlayerView>,
    /// Milliseconds since server start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panic_start_time: Option<u64>,
    /// When the panic window closes, so clients can render a countdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub panic_ends_at: Option<u64>,
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<PlayerId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_breakdown_total_is_sum() {
        let b = ScoreBreakdown::new(500, 120, 60);
        assert_eq!(b.total, 680);
    }

    #[test]
    fn test_guess_json_uses_camel_case() {
        let guess = Guess {
            id: 1,
            code: "1243".into(),
            hits: 2,
            pseudo_hits: 2,
            feedback_message: "Two in place, two misplaced.".into(),
            player_id: PlayerId(3),
            player_name: "ada".into(),
        };
        let json = serde_json::to_value(&guess).unwrap();
        assert_eq!(json["pseudoHits"], 2);
        assert_eq!(json["playerName"], "ada");
        assert_eq!(json["feedbackMessage"], "Two in place, two misplaced.");
    }
}
