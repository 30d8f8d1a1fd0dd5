//! Timing configuration for the game core.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Durations that drive the scheduled parts of a game.
///
/// The server owns one of these and hands it to every
/// [`Referee`](crate::Referee); tests shorten them freely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameTimings {
    /// How long the other players get after the first FFA / battle-royale
    /// solve before the round is closed.
    pub panic_window: Duration,

    /// Delay between two CPU guesses in a CPU duel.
    pub cpu_think_time: Duration,

    /// Total time budget of a speed run.
    pub speed_run_limit: Duration,
}

impl Default for GameTimings {
    fn default() -> Self {
        Self {
            panic_window: Duration::from_secs(30),
            cpu_think_time: Duration::from_secs(4),
            speed_run_limit: Duration::from_secs(120),
        }
    }
}

impl GameTimings {
    /// The panic window in the millisecond unit rooms are stamped with.
    pub fn panic_window_ms(&self) -> u64 {
        self.panic_window.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_timings_default() {
        let timings = GameTimings::default();
        assert_eq!(timings.panic_window, Duration::from_secs(30));
        assert_eq!(timings.panic_window_ms(), 30_000);
        assert_eq!(timings.cpu_think_time, Duration::from_secs(4));
        assert_eq!(timings.speed_run_limit, Duration::from_secs(120));
    }
}
