//! Per-recipient redaction.
//!
//! The server never sends the canonical [`Room`] anywhere. Every push is a
//! [`RoomView`] built by [`sanitize`] for exactly one viewer.

use mastermind_protocol::{Guess, PlayerId, PlayerView, RoomView};

use crate::{Player, Room, Rules};

/// What a viewer may not see while a game is running.
struct Redaction {
    shared_secret: bool,
    others_guess_codes: bool,
}

impl Redaction {
    fn for_room(room: &Room) -> Self {
        if !room.state.is_active() {
            return Self {
                shared_secret: false,
                others_guess_codes: false,
            };
        }
        match room.rules() {
            // Each duelist cracks a different code, so nothing shared leaks.
            Rules::PvpDuel => Self {
                shared_secret: false,
                others_guess_codes: false,
            },
            Rules::Solo | Rules::CpuDuel | Rules::Ffa | Rules::BattleRoyale | Rules::SpeedRun => {
                Self {
                    shared_secret: true,
                    others_guess_codes: true,
                }
            }
        }
    }
}

fn blank_code(guess: &Guess) -> Guess {
    Guess {
        code: String::new(),
        ..guess.clone()
    }
}

fn player_view(room: &Room, player: &Player, viewer: PlayerId, redaction: &Redaction) -> PlayerView {
    let own = player.id == viewer;

    let guesses = if own || !redaction.others_guess_codes {
        player.guesses.clone()
    } else {
        player.guesses.iter().map(blank_code).collect()
    };
    // An authored duel code stays with its author until the game is over.
    let secret_code = if own || room.state.is_over() {
        player.secret_code.clone()
    } else {
        None
    };

    PlayerView {
        id: player.id,
        name: player.name.clone(),
        is_host: player.is_host,
        is_ready: player.is_ready,
        is_bot: player.is_bot,
        guesses,
        secret_code,
        has_secret_code: player.secret_code.is_some(),
        opponent_id: player.opponent_id,
        score: player.score,
        score_breakdown: player.score_breakdown,
        solved: player.solved,
        eliminated: player.eliminated,
    }
}

/// Builds the view of `room` that `viewer` is allowed to see.
///
/// While the room is Playing or Panic, shared-secret modes blank the secret
/// and the codes of everyone else's guesses (hits and messages stay). PvP
/// duels show guesses in full. Once the game is over, everything is
/// revealed. Never mutates `room`.
pub fn sanitize(room: &Room, viewer: PlayerId) -> RoomView {
    let redaction = Redaction::for_room(room);

    RoomView {
        id: room.id.clone(),
        viewer_id: viewer,
        game_mode: room.mode,
        game_state: room.state,
        secret_code: if redaction.shared_secret {
            String::new()
        } else {
            room.secret_code.clone()
        },
        settings: room.settings.clone(),
        players: room
            .players
            .iter()
            .map(|p| player_view(room, p, viewer, &redaction))
            .collect(),
        start_time: room.start_time,
        panic_start_time: room.panic_start_time,
        panic_ends_at: room.panic_ends_at,
        round: room.round,
        winner_id: room.winner_id,
    }
}
