//! Feedback engine: exact and partial match counts for a guess.

use mastermind_protocol::Settings;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::CodeError;

/// The symbol alphabet codes are written in.
pub const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Result of comparing a guess with a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Feedback {
    /// Right symbol, right position.
    pub hits: usize,
    /// Right symbol, wrong position, after hits are taken out.
    pub pseudo_hits: usize,
}

impl Feedback {
    /// `true` when every position of a code of `length` symbols is a hit.
    pub fn is_solved(&self, length: usize) -> bool {
        self.hits == length
    }
}

/// Compares a guess with a secret of the same length.
///
/// Positions that hit are taken out on both sides first. Each remaining
/// guess symbol then consumes at most one remaining secret symbol, so a
/// secret symbol is never counted twice.
///
/// ```rust
/// use mastermind_core::{evaluate, Feedback};
///
/// let secret: Vec<char> = "1123".chars().collect();
/// let guess: Vec<char> = "1111".chars().collect();
/// assert_eq!(evaluate(&guess, &secret), Feedback { hits: 2, pseudo_hits: 0 });
/// ```
pub fn evaluate<T: PartialEq>(guess: &[T], secret: &[T]) -> Feedback {
    let mut hits = 0;
    let mut open_guess = Vec::with_capacity(guess.len());
    let mut open_secret = Vec::with_capacity(secret.len());

    for (g, s) in guess.iter().zip(secret) {
        if g == s {
            hits += 1;
        } else {
            open_guess.push(g);
            open_secret.push(s);
        }
    }
    // Unequal lengths: the overhang can still match out of position.
    open_guess.extend(guess.iter().skip(secret.len()));
    open_secret.extend(secret.iter().skip(guess.len()));

    let mut pseudo_hits = 0;
    for g in open_guess {
        if let Some(pos) = open_secret.iter().position(|s| *s == g) {
            open_secret.swap_remove(pos);
            pseudo_hits += 1;
        }
    }

    Feedback { hits, pseudo_hits }
}

/// [`evaluate`] over two code strings, symbol per `char`.
pub fn evaluate_codes(guess: &str, secret: &str) -> Feedback {
    let guess: Vec<char> = guess.chars().collect();
    let secret: Vec<char> = secret.chars().collect();
    evaluate(&guess, &secret)
}

fn count_word(n: usize) -> String {
    const WORDS: [&str; 6] = ["zero", "one", "two", "three", "four", "five"];
    WORDS
        .get(n)
        .map_or_else(|| n.to_string(), |w| (*w).to_string())
}

fn capitalized(word: String) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => word,
    }
}

/// Renders feedback counts as a sentence for the guess log.
pub fn feedback_message(feedback: Feedback, length: usize) -> String {
    let Feedback { hits, pseudo_hits } = feedback;
    if hits == length {
        return format!("Cracked it! All {} in place.", count_word(length));
    }
    match (hits, pseudo_hits) {
        (0, 0) => "Nothing. None of those digits are in the code.".to_string(),
        (h, 0) => format!("{} in place.", capitalized(count_word(h))),
        (0, p) => format!("{} misplaced.", capitalized(count_word(p))),
        (h, p) => format!(
            "{} in place, {} misplaced.",
            capitalized(count_word(h)),
            count_word(p)
        ),
    }
}

fn check_shape(code: &str, settings: &Settings) -> Result<(), CodeError> {
    let found = code.chars().count();
    if found != settings.code_length {
        return Err(CodeError::WrongLength {
            expected: settings.code_length,
            found,
        });
    }
    match code.chars().find(|c| !c.is_ascii_digit()) {
        Some(c) => Err(CodeError::NotADigit(c)),
        None => Ok(()),
    }
}

/// Validates a submitted guess. Repeated digits are always allowed in a
/// guess, whatever the room settings say.
pub fn check_guess(code: &str, settings: &Settings) -> Result<(), CodeError> {
    check_shape(code, settings)
}

/// Validates a code a player authors for their duel opponent.
pub fn check_secret(code: &str, settings: &Settings) -> Result<(), CodeError> {
    check_shape(code, settings)?;
    if !settings.allow_repeats {
        let mut seen = [false; 10];
        for c in code.chars() {
            let d = c as usize - '0' as usize;
            if seen[d] {
                return Err(CodeError::RepeatedDigit(c));
            }
            seen[d] = true;
        }
    }
    Ok(())
}

/// Draws a fresh secret for the given settings.
pub fn generate_secret<R: Rng + ?Sized>(settings: &Settings, rng: &mut R) -> String {
    if settings.allow_repeats {
        (0..settings.code_length)
            .map(|_| DIGITS[rng.random_range(0..DIGITS.len())])
            .collect()
    } else {
        let mut digits = DIGITS;
        digits.shuffle(rng);
        digits.iter().take(settings.code_length).collect()
    }
}
