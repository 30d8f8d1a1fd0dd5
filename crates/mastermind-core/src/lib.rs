//! Authoritative game core for the Mastermind room server.
//!
//! Everything here is synchronous and owns no I/O: callers pass in the
//! current time (milliseconds since server start) and a random number
//! generator, and get back an [`Outcome`] describing what to push and
//! which timers to arm.
//!
//! # Key types
//!
//! - [`evaluate`] / [`feedback_message`]: the feedback engine
//! - [`calculate_score`]: point breakdown for a solve
//! - [`Room`] / [`Player`]: the canonical room model
//! - [`RoomRegistry`]: the process-wide store of live rooms
//! - [`Referee`]: the per-room state machine
//! - [`sanitize`]: per-recipient redaction into a [`RoomView`](mastermind_protocol::RoomView)

mod config;
mod error;
mod feedback;
mod game;
mod model;
mod registry;
mod sanitize;
mod score;
mod solver;

pub use config::GameTimings;
pub use error::{CodeError, RoomError};
pub use feedback::{
    DIGITS, Feedback, check_guess, check_secret, evaluate, evaluate_codes, feedback_message,
    generate_secret,
};
pub use game::{Notice, Outcome, Referee, Timer, TimerKind};
pub use model::{CPU_NAME, CPU_PLAYER_ID, Player, Room, Rules};
pub use registry::{Departure, MAX_NAME_LEN, RoomRegistry};
pub use sanitize::sanitize;
pub use score::{ScoreInput, calculate_score};
pub use solver::CpuSolver;
