//! Score calculator for shared-secret races.
//!
//! Each solve is worth a base amount (reduced when the first guess came
//! suspiciously late), an efficiency bonus against a guess par and a speed
//! bonus against a time par. Efficiency and speed both have floors, so
//! cracking the code always pays something.

use std::time::Duration;

use mastermind_protocol::ScoreBreakdown;

const BASE_POINTS: u32 = 500;
/// A first guess later than this after the code appeared is penalized.
const STALL_THRESHOLD: Duration = Duration::from_secs(3);
/// Prorated to the millisecond, rounded down.
const STALL_PENALTY_PER_SEC: u32 = 20;
const MAX_STALL_PENALTY: u32 = 250;

/// Par is this many guesses per code symbol.
const PAR_GUESSES_PER_SYMBOL: u32 = 3;
const POINTS_PER_GUESS_UNDER_PAR: f64 = 50.0;
/// Solves faster than this only earn half the efficiency bonus.
const MIN_THINK_TIME_SECS: u64 = 10;
const EFFICIENCY_FLOOR: u32 = 30;

const PAR_TIME_SECS: u64 = 300;
const SPEED_FLOOR_SECS: u64 = 30;
const POINTS_PER_SEC_UNDER_PAR: u32 = 2;
const PANIC_SPEED_FACTOR: f64 = 0.5;

/// Everything the calculator needs to know about one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput {
    /// Guesses used, the solving guess included.
    pub guesses_taken: u32,
    /// From the code appearing to the solving guess.
    pub time_taken: Duration,
    /// Solved inside the panic window, after someone else already had.
    pub panic_solve: bool,
    /// From the code appearing to the player's first guess.
    pub initial_guess_delay: Option<Duration>,
    pub code_length: usize,
}

/// Converts a solve into a point breakdown. Pure; independent of any
/// other room or player.
pub fn calculate_score(input: ScoreInput) -> ScoreBreakdown {
    let par_guesses = input.code_length as u32 * PAR_GUESSES_PER_SYMBOL;

    let stall_penalty = input
        .initial_guess_delay
        .and_then(|delay| delay.checked_sub(STALL_THRESHOLD))
        .map_or(0, |over| {
            let points = over.as_millis() * u128::from(STALL_PENALTY_PER_SEC) / 1_000;
            points.min(u128::from(MAX_STALL_PENALTY)) as u32
        });
    let base = BASE_POINTS.saturating_sub(stall_penalty);

    let multiplier = if input.time_taken.as_secs() < MIN_THINK_TIME_SECS {
        0.5
    } else {
        1.0
    };
    let under_par = f64::from(par_guesses) - f64::from(input.guesses_taken);
    let raw_efficiency = (under_par * POINTS_PER_GUESS_UNDER_PAR * multiplier).floor();
    let efficiency = if raw_efficiency > f64::from(EFFICIENCY_FLOOR) {
        raw_efficiency as u32
    } else {
        EFFICIENCY_FLOOR
    };

    let seconds_left = PAR_TIME_SECS
        .saturating_sub(input.time_taken.as_secs())
        .max(SPEED_FLOOR_SECS) as u32;
    let mut speed = seconds_left * POINTS_PER_SEC_UNDER_PAR;
    if input.panic_solve {
        speed = (f64::from(speed) * PANIC_SPEED_FACTOR).floor() as u32;
    }

    ScoreBreakdown::new(base, efficiency, speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(guesses: u32, secs: u64) -> ScoreInput {
        ScoreInput {
            guesses_taken: guesses,
            time_taken: Duration::from_secs(secs),
            panic_solve: false,
            initial_guess_delay: Some(Duration::from_secs(1)),
            code_length: 4,
        }
    }

    #[test]
    fn test_typical_solve() {
        // par 12, 5 guesses, 60 s: efficiency 7 * 50, speed 240 * 2.
        let b = calculate_score(input(5, 60));
        assert_eq!(b, ScoreBreakdown::new(500, 350, 480));
        assert_eq!(b.total, 1330);
    }

    #[test]
    fn test_quick_solve_halves_efficiency() {
        let b = calculate_score(input(5, 9));
        assert_eq!(b.efficiency, 175);
    }

    #[test]
    fn test_efficiency_floor_over_par() {
        let b = calculate_score(input(40, 60));
        assert_eq!(b.efficiency, 30);
    }

    #[test]
    fn test_speed_floor_and_panic_factor() {
        let slow = calculate_score(input(5, 1_000));
        assert_eq!(slow.speed, 60);

        let panic = calculate_score(ScoreInput {
            panic_solve: true,
            ..input(5, 60)
        });
        assert_eq!(panic.speed, 240);
    }

    #[test]
    fn test_stall_penalty_is_capped_and_base_never_negative() {
        let late = calculate_score(ScoreInput {
            initial_guess_delay: Some(Duration::from_secs(8)),
            ..input(5, 60)
        });
        assert_eq!(late.base, 400);

        let very_late = calculate_score(ScoreInput {
            initial_guess_delay: Some(Duration::from_secs(10_000)),
            ..input(5, 60)
        });
        assert_eq!(very_late.base, 250);
    }

    #[test]
    fn test_stall_penalty_counts_fractional_seconds() {
        let base_after = |ms| {
            calculate_score(ScoreInput {
                initial_guess_delay: Some(Duration::from_millis(ms)),
                ..input(5, 60)
            })
            .base
        };
        assert_eq!(base_after(3_000), 500);
        assert_eq!(base_after(3_900), 482);
        assert_eq!(base_after(4_050), 479);
    }

    #[test]
    fn test_efficiency_non_increasing_in_guesses() {
        let mut previous = u32::MAX;
        for guesses in 1..40 {
            let e = calculate_score(input(guesses, 60)).efficiency;
            assert!(e <= previous, "guesses={guesses}");
            previous = e;
        }
    }

    #[test]
    fn test_speed_non_increasing_in_time() {
        let mut previous = u32::MAX;
        for secs in (0..600).step_by(7) {
            let s = calculate_score(input(5, secs)).speed;
            assert!(s <= previous, "secs={secs}");
            previous = s;
        }
    }

    #[test]
    fn test_par_scales_with_code_length() {
        let short = calculate_score(ScoreInput {
            code_length: 3,
            ..input(5, 60)
        });
        let long = calculate_score(ScoreInput {
            code_length: 6,
            ..input(5, 60)
        });
        assert_eq!(short.efficiency, 200);
        assert_eq!(long.efficiency, 650);
    }
}
