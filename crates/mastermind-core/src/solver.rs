//! CPU opponent: picks guesses consistent with the feedback so far.
//!
//! The full code space is walked at most once per game, on the CPU's
//! second turn. From then on every turn only filters the surviving
//! candidates against the feedback that arrived since the last turn, so
//! the work shrinks as the game goes on.

use mastermind_protocol::{Guess, Settings};
use rand::Rng;

use crate::{Feedback, generate_secret};

/// Digits of one candidate. Slots past `code_length` stay zero.
type Code = [u8; Settings::MAX_CODE_LENGTH];

/// Candidate pool for the CPU player of one room.
///
/// Lives on the [`Room`](crate::Room) next to the CPU's guesses. It is
/// rebuilt whenever the guess history it has seen is gone (a new game or a
/// reset), so it never has to be cleared by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuSolver {
    /// Codes consistent with every guess seen so far. `None` until the
    /// first feedback arrives.
    pool: Option<Vec<Code>>,
    /// How many entries of the history are already applied to `pool`.
    seen: usize,
}

impl CpuSolver {
    /// Chooses the CPU's next guess given its own guesses so far.
    ///
    /// The pick is uniformly random among the candidates still consistent
    /// with `history`. Falls back to a random code when the history is
    /// empty or nothing is consistent.
    pub fn next_guess<R: Rng + ?Sized>(
        &mut self,
        history: &[Guess],
        settings: &Settings,
        rng: &mut R,
    ) -> String {
        if history.len() < self.seen {
            *self = Self::default();
        }
        if history.is_empty() {
            return generate_secret(settings, rng);
        }

        let len = settings.code_length;
        let fresh: Vec<(Code, Feedback)> = history[self.seen..]
            .iter()
            .filter_map(|g| {
                let fb = Feedback {
                    hits: g.hits,
                    pseudo_hits: g.pseudo_hits,
                };
                Some((parse(&g.code, len)?, fb))
            })
            .collect();
        self.seen = history.len();

        let pool = match self.pool.take() {
            Some(mut pool) => {
                pool.retain(|c| consistent(c, &fresh, len));
                pool
            }
            None => build_pool(settings, &fresh),
        };

        let pick = (!pool.is_empty()).then(|| pool[rng.random_range(0..pool.len())]);
        self.pool = Some(pool);

        match pick {
            Some(code) => code[..len].iter().map(|d| char::from(b'0' + d)).collect(),
            None => generate_secret(settings, rng),
        }
    }

    /// Candidates still in play, or `None` before the first feedback.
    pub fn candidates(&self) -> Option<usize> {
        self.pool.as_ref().map(Vec::len)
    }
}

fn parse(code: &str, len: usize) -> Option<Code> {
    if code.len() != len {
        return None;
    }
    let mut out = [0u8; Settings::MAX_CODE_LENGTH];
    for (slot, b) in out.iter_mut().zip(code.bytes()) {
        if !b.is_ascii_digit() {
            return None;
        }
        *slot = b - b'0';
    }
    Some(out)
}

/// Same result as [`evaluate`](crate::evaluate), without allocating.
fn score(guess: &Code, secret: &Code, len: usize) -> Feedback {
    let mut hits = 0;
    let mut open_guess = [0u8; 10];
    let mut open_secret = [0u8; 10];
    for (&g, &s) in guess[..len].iter().zip(&secret[..len]) {
        if g == s {
            hits += 1;
        } else {
            open_guess[g as usize] += 1;
            open_secret[s as usize] += 1;
        }
    }
    let pseudo_hits = open_guess
        .iter()
        .zip(&open_secret)
        .map(|(&g, &s)| usize::from(g.min(s)))
        .sum();
    Feedback { hits, pseudo_hits }
}

fn consistent(candidate: &Code, past: &[(Code, Feedback)], len: usize) -> bool {
    past.iter().all(|(guess, fb)| score(guess, candidate, len) == *fb)
}

fn has_repeat(digits: &[u8]) -> bool {
    let mut seen = [false; 10];
    digits.iter().any(|&d| std::mem::replace(&mut seen[d as usize], true))
}

/// Walks the code space once, keeping what fits `past`.
fn build_pool(settings: &Settings, past: &[(Code, Feedback)]) -> Vec<Code> {
    let len = settings.code_length;
    let mut pool = Vec::new();
    let mut candidate = [0u8; Settings::MAX_CODE_LENGTH];

    loop {
        if (settings.allow_repeats || !has_repeat(&candidate[..len]))
            && consistent(&candidate, past, len)
        {
            pool.push(candidate);
        }

        // Odometer step; done once every slot wrapped.
        let mut slot = len;
        loop {
            if slot == 0 {
                return pool;
            }
            slot -= 1;
            if candidate[slot] < 9 {
                candidate[slot] += 1;
                break;
            }
            candidate[slot] = 0;
        }
    }
}
