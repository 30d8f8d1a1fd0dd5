//! The per-room state machine.
//!
//! A [`Referee`] applies one intent (or one timer) to one [`Room`] and
//! reports the result as an [`Outcome`]: which pushes the server should
//! fan out and which timers it should arm. Each call runs to completion
//! before the next one starts, so two guesses can never both be the first
//! solve.
//!
//! Intents that are stale or unauthorized are dropped: the call returns an
//! empty outcome and leaves the room untouched. Only problems the sender
//! can fix come back as [`RoomError`].

use std::time::Duration;

use mastermind_protocol::{GameMode, GameState, PlayerId, RoomCode, Settings, SettingsPatch};
use rand::Rng;

use crate::{
    CPU_PLAYER_ID, GameTimings, Player, Room, RoomError, Rules, ScoreInput, calculate_score,
    check_guess, check_secret, evaluate_codes, feedback_message, generate_secret,
};

/// A push the server should fan out after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// `room_update` to every human, one sanitized view each.
    RoomUpdate,
    /// `game_start` to every human.
    GameStart,
    /// `game_over` to every human.
    GameOver,
    /// `player_left` to the humans still seated.
    PlayerLeft(String),
}

impl Notice {
    /// `true` for the notices that carry a room view.
    pub fn carries_view(&self) -> bool {
        !matches!(self, Self::PlayerLeft(_))
    }
}

/// What a scheduled callback should do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Close the FFA / battle-royale panic window.
    PanicTimeout,
    /// End a speed run.
    SpeedRunTimeout,
    /// Let the CPU make its next guess.
    CpuTurn,
}

/// Deferred work. Carries only the room code and the round it was armed
/// in; the room is looked up again when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub room: RoomCode,
    pub round: u32,
    pub kind: TimerKind,
    pub after: Duration,
}

/// Result of one referee call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notices: Vec<Notice>,
    pub timers: Vec<Timer>,
}

impl Outcome {
    fn notice(notice: Notice) -> Self {
        Self {
            notices: vec![notice],
            timers: Vec::new(),
        }
    }

    fn extend(&mut self, other: Outcome) {
        self.notices.extend(other.notices);
        self.timers.extend(other.timers);
    }

    /// `true` when nothing changed.
    pub fn is_empty(&self) -> bool {
        self.notices.is_empty() && self.timers.is_empty()
    }
}

/// Applies game rules to a room.
///
/// Built per event with the current time (milliseconds since server
/// start) and the server's random number generator.
pub struct Referee<'a, R: ?Sized> {
    timings: &'a GameTimings,
    rng: &'a mut R,
    now: u64,
}

fn ignored(room: &Room, player: PlayerId, reason: &str) -> Outcome {
    tracing::debug!(room = %room.id, %player, state = %room.state, reason, "intent dropped");
    Outcome::default()
}

fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

impl<'a, R: Rng + ?Sized> Referee<'a, R> {
    pub fn new(timings: &'a GameTimings, rng: &'a mut R, now: u64) -> Self {
        Self { timings, rng, now }
    }

    // -----------------------------------------------------------------
    // Lobby
    // -----------------------------------------------------------------

    pub fn set_ready(&mut self, room: &mut Room, by: PlayerId, ready: bool) -> Outcome {
        if room.state != GameState::Lobby {
            return ignored(room, by, "ready outside lobby");
        }
        let Some(player) = room.player_mut(by) else {
            return ignored(room, by, "not seated");
        };
        player.is_ready = ready;
        Outcome::notice(Notice::RoomUpdate)
    }

    /// Host only, Lobby only. Switching a duel between PvP and CPU seats
    /// or removes the CPU player.
    pub fn update_settings(
        &mut self,
        room: &mut Room,
        by: PlayerId,
        patch: &SettingsPatch,
    ) -> Result<Outcome, RoomError> {
        if room.state != GameState::Lobby {
            return Ok(ignored(room, by, "settings outside lobby"));
        }
        if !room.is_host(by) {
            return Ok(ignored(room, by, "settings from non-host"));
        }

        let mut next = room.settings.clone();
        if let Some(length) = patch.code_length {
            if !(Settings::MIN_CODE_LENGTH..=Settings::MAX_CODE_LENGTH).contains(&length) {
                return Err(RoomError::InvalidSettings(format!(
                    "code length must be between {} and {}",
                    Settings::MIN_CODE_LENGTH,
                    Settings::MAX_CODE_LENGTH
                )));
            }
            next.code_length = length;
        }
        if let Some(allow) = patch.allow_repeats {
            next.allow_repeats = allow;
        }
        if room.mode == GameMode::Duel {
            if let Some(kind) = patch.duel_mode_type {
                next.duel_mode_type = Some(kind);
            }
        }

        let before = room.rules();
        let after = Rules::of(room.mode, &next);
        if before != after {
            match after {
                Rules::CpuDuel => {
                    if room.players.len() > 1 {
                        return Err(RoomError::RoomFull(room.id.clone()));
                    }
                    room.seat(Player::cpu());
                }
                Rules::PvpDuel => {
                    room.unseat(CPU_PLAYER_ID);
                }
                Rules::Solo | Rules::Ffa | Rules::BattleRoyale | Rules::SpeedRun => {}
            }
        }

        let shape_changed = next.code_length != room.settings.code_length
            || next.allow_repeats != room.settings.allow_repeats;
        if after == Rules::PvpDuel && shape_changed {
            for p in &mut room.players {
                p.secret_code = None;
            }
        }
        room.settings = next;

        tracing::debug!(room = %room.id, settings = ?room.settings, "settings updated");
        Ok(Outcome::notice(Notice::RoomUpdate))
    }

    /// PvP duel only, Lobby only: the code the opponent will crack.
    pub fn set_duel_code(
        &mut self,
        room: &mut Room,
        by: PlayerId,
        code: &str,
    ) -> Result<Outcome, RoomError> {
        if room.rules() != Rules::PvpDuel {
            return Ok(ignored(room, by, "duel code outside pvp duel"));
        }
        if room.state != GameState::Lobby {
            return Ok(ignored(room, by, "duel code outside lobby"));
        }
        if !room.contains(by) {
            return Ok(ignored(room, by, "not seated"));
        }
        check_secret(code, &room.settings).map_err(RoomError::InvalidCode)?;

        if let Some(player) = room.player_mut(by) {
            player.secret_code = Some(code.to_owned());
        }
        Ok(Outcome::notice(Notice::RoomUpdate))
    }

    fn start_blocker(room: &Room) -> Option<&'static str> {
        let seated = room.players.len();
        let all_ready = room.players.iter().all(|p| p.is_ready);
        match room.rules() {
            Rules::Solo | Rules::SpeedRun => None,
            Rules::PvpDuel => {
                if seated != 2 || !all_ready {
                    Some("Need two ready players")
                } else if room.players.iter().any(|p| p.secret_code.is_none()) {
                    Some("Both players must set a code")
                } else {
                    None
                }
            }
            Rules::CpuDuel => (seated != 2 || !all_ready).then_some("Need two ready players"),
            Rules::Ffa | Rules::BattleRoyale => {
                (seated < 2 || !all_ready).then_some("Need at least two ready players")
            }
        }
    }

    /// Host only. Lobby → Playing.
    pub fn start_game(&mut self, room: &mut Room, by: PlayerId) -> Result<Outcome, RoomError> {
        if room.state != GameState::Lobby {
            return Ok(ignored(room, by, "start outside lobby"));
        }
        if !room.is_host(by) {
            return Ok(ignored(room, by, "start from non-host"));
        }
        if let Some(reason) = Self::start_blocker(room) {
            return Err(RoomError::NotReady(reason.into()));
        }

        room.round += 1;
        room.state = GameState::Playing;
        room.start_time = Some(self.now);
        room.panic_start_time = None;
        room.panic_ends_at = None;
        room.winner_id = None;
        for p in &mut room.players {
            p.solved = 0;
            p.eliminated = false;
            p.score_breakdown = None;
        }
        self.issue_code(room);

        let mut out = Outcome::notice(Notice::GameStart);
        match room.rules() {
            Rules::SpeedRun => {
                out.timers
                    .push(self.timer(room, TimerKind::SpeedRunTimeout, self.timings.speed_run_limit));
            }
            Rules::CpuDuel => {
                out.timers
                    .push(self.timer(room, TimerKind::CpuTurn, self.timings.cpu_think_time));
            }
            Rules::Solo | Rules::PvpDuel | Rules::Ffa | Rules::BattleRoyale => {}
        }

        tracing::info!(
            room = %room.id,
            round = room.round,
            rules = ?room.rules(),
            players = room.players.len(),
            "game started"
        );
        Ok(out)
    }

    /// Draws the code everyone races on (PvP duels keep the authored
    /// codes) and wipes attempts against the previous one.
    fn issue_code(&mut self, room: &mut Room) {
        room.secret_code = if room.rules().has_shared_secret() {
            generate_secret(&room.settings, &mut *self.rng)
        } else {
            String::new()
        };
        room.code_issued_at = Some(self.now);
        for p in &mut room.players {
            p.clear_attempts();
        }
    }

    // -----------------------------------------------------------------
    // Guessing
    // -----------------------------------------------------------------

    /// Scores a guess and resolves whatever transition it causes.
    pub fn submit_guess(
        &mut self,
        room: &mut Room,
        by: PlayerId,
        code: &str,
    ) -> Result<Outcome, RoomError> {
        if !room.state.is_active() {
            return Ok(ignored(room, by, "guess outside play"));
        }
        let length = room.settings.code_length;
        let Some(player) = room.player(by) else {
            return Ok(ignored(room, by, "not seated"));
        };
        if player.eliminated {
            return Ok(ignored(room, by, "eliminated"));
        }
        if player.has_cracked(length) {
            return Ok(ignored(room, by, "already cracked"));
        }
        let Some(target) = room.target_for(player).map(str::to_owned) else {
            return Ok(ignored(room, by, "no code to crack"));
        };
        check_guess(code, &room.settings).map_err(RoomError::InvalidGuess)?;

        let feedback = evaluate_codes(code, &target);
        let message = feedback_message(feedback, length);
        let now = self.now;
        if let Some(player) = room.player_mut(by) {
            player.first_guess_at.get_or_insert(now);
            player.record_guess(code.to_owned(), feedback.hits, feedback.pseudo_hits, message);
        }

        if !feedback.is_solved(length) {
            return Ok(Outcome::notice(Notice::RoomUpdate));
        }
        Ok(self.on_crack(room, by))
    }

    fn on_crack(&mut self, room: &mut Room, by: PlayerId) -> Outcome {
        let rules = room.rules();
        if rules.awards_points() {
            self.award(room, by);
        }
        if let Some(player) = room.player_mut(by) {
            player.solved += 1;
        }
        tracing::info!(room = %room.id, player = %by, state = %room.state, "code cracked");

        match rules {
            Rules::Solo | Rules::PvpDuel => self.finish(room, GameState::Won, Some(by)),
            Rules::CpuDuel => {
                let state = if by == CPU_PLAYER_ID {
                    GameState::Lost
                } else {
                    GameState::Won
                };
                self.finish(room, state, Some(by))
            }
            Rules::Ffa | Rules::BattleRoyale => {
                let mut out = Outcome::default();
                if room.state == GameState::Playing {
                    room.state = GameState::Panic;
                    room.panic_start_time = Some(self.now);
                    room.panic_ends_at = Some(self.now + self.timings.panic_window_ms());
                    out.timers
                        .push(self.timer(room, TimerKind::PanicTimeout, self.timings.panic_window));
                    tracing::info!(room = %room.id, first = %by, "panic window opened");
                }
                if Self::everyone_cracked(room) {
                    out.extend(self.close_panic(room));
                } else {
                    out.notices.push(Notice::RoomUpdate);
                }
                out
            }
            Rules::SpeedRun => {
                self.issue_code(room);
                Outcome::notice(Notice::RoomUpdate)
            }
        }
    }

    /// Adds the solve's points to the player. Must run before the room
    /// switches to Panic so the first solver is not scored as a panic solve.
    fn award(&mut self, room: &mut Room, by: PlayerId) {
        let issued = room.code_issued_at.or(room.start_time).unwrap_or(self.now);
        let panic_solve = room.state == GameState::Panic;
        let code_length = room.settings.code_length;
        let now = self.now;
        let Some(player) = room.player_mut(by) else {
            return;
        };

        let breakdown = calculate_score(ScoreInput {
            guesses_taken: player.guesses.len() as u32,
            time_taken: millis(now.saturating_sub(issued)),
            panic_solve,
            initial_guess_delay: player.first_guess_at.map(|t| millis(t.saturating_sub(issued))),
            code_length,
        });
        player.score += breakdown.total;
        player.score_breakdown = Some(breakdown);
        tracing::debug!(player = %by, points = breakdown.total, panic_solve, "solve scored");
    }

    fn everyone_cracked(room: &Room) -> bool {
        let length = room.settings.code_length;
        room.contenders().all(|p| p.has_cracked(length))
    }

    /// Ends the panic window: FFA is decided, battle royale eliminates and
    /// either crowns a survivor or moves to the next round.
    fn close_panic(&mut self, room: &mut Room) -> Outcome {
        match room.rules() {
            Rules::BattleRoyale => self.close_royale_round(room),
            Rules::Ffa | Rules::Solo | Rules::PvpDuel | Rules::CpuDuel | Rules::SpeedRun => {
                let winner = room.top_scorer();
                self.finish(room, GameState::Won, winner)
            }
        }
    }

    fn close_royale_round(&mut self, room: &mut Room) -> Outcome {
        let length = room.settings.code_length;
        for p in room.players.iter_mut().filter(|p| !p.eliminated) {
            if !p.has_cracked(length) {
                p.eliminated = true;
                tracing::info!(room = %room.id, player = %p.id, "player eliminated");
            }
        }

        let survivors: Vec<PlayerId> = room.contenders().map(|p| p.id).collect();
        if survivors.len() <= 1 {
            let winner = survivors.first().copied().or_else(|| room.top_scorer());
            return self.finish(room, GameState::Won, winner);
        }

        room.round += 1;
        room.state = GameState::Playing;
        room.panic_start_time = None;
        room.panic_ends_at = None;
        self.issue_code(room);
        tracing::info!(
            room = %room.id,
            round = room.round,
            survivors = survivors.len(),
            "next battle royale round"
        );
        Outcome::notice(Notice::GameStart)
    }

    fn finish(&mut self, room: &mut Room, state: GameState, winner: Option<PlayerId>) -> Outcome {
        room.state = state;
        room.winner_id = winner;
        tracing::info!(room = %room.id, %state, winner = ?winner, "game over");
        Outcome::notice(Notice::GameOver)
    }

    // -----------------------------------------------------------------
    // After the game
    // -----------------------------------------------------------------

    /// Host only. Won/Lost → Lobby, keeping cumulative scores and the host.
    pub fn reset_game(&mut self, room: &mut Room, by: PlayerId) -> Outcome {
        if !room.state.is_over() {
            return ignored(room, by, "reset before game over");
        }
        if !room.is_host(by) {
            return ignored(room, by, "reset from non-host");
        }

        let pvp = room.rules() == Rules::PvpDuel;
        room.state = GameState::Lobby;
        room.secret_code.clear();
        room.start_time = None;
        room.code_issued_at = None;
        room.panic_start_time = None;
        room.panic_ends_at = None;
        room.winner_id = None;
        for p in &mut room.players {
            p.clear_attempts();
            p.score_breakdown = None;
            p.solved = 0;
            p.eliminated = false;
            if pvp {
                p.secret_code = None;
            }
            if !p.is_host && !p.is_bot {
                p.is_ready = false;
            }
        }

        tracing::info!(room = %room.id, "room reset to lobby");
        Outcome::notice(Notice::RoomUpdate)
    }

    /// Re-evaluates a room after the registry removed a player from it.
    pub fn after_departure(&mut self, room: &mut Room, name: String) -> Outcome {
        let mut out = Outcome::notice(Notice::PlayerLeft(name));

        if room.state.is_active() {
            match room.rules() {
                Rules::PvpDuel | Rules::CpuDuel => {
                    let winner = room.humans().next().map(|p| p.id);
                    out.extend(self.finish(room, GameState::Won, winner));
                }
                Rules::Ffa => {
                    if room.state == GameState::Panic && Self::everyone_cracked(room) {
                        out.extend(self.close_panic(room));
                    }
                }
                Rules::BattleRoyale => {
                    let survivors: Vec<PlayerId> = room.contenders().map(|p| p.id).collect();
                    if survivors.len() <= 1 {
                        let winner = survivors.first().copied().or_else(|| room.top_scorer());
                        out.extend(self.finish(room, GameState::Won, winner));
                    } else if room.state == GameState::Panic && Self::everyone_cracked(room) {
                        out.extend(self.close_panic(room));
                    }
                }
                Rules::Solo | Rules::SpeedRun => {}
            }
        }

        if !out.notices.iter().any(Notice::carries_view) {
            out.notices.push(Notice::RoomUpdate);
        }
        out
    }

    // -----------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------

    fn timer(&self, room: &Room, kind: TimerKind, after: Duration) -> Timer {
        Timer {
            room: room.id.clone(),
            round: room.round,
            kind,
            after,
        }
    }

    /// Runs a fired timer against the room as it is *now*. A timer from an
    /// earlier round, or one whose state already moved on, does nothing.
    pub fn on_timer(&mut self, room: &mut Room, kind: TimerKind, round: u32) -> Outcome {
        if round != room.round {
            tracing::debug!(room = %room.id, ?kind, round, current = room.round, "stale timer");
            return Outcome::default();
        }
        match (kind, room.state, room.rules()) {
            (TimerKind::PanicTimeout, GameState::Panic, _) => {
                tracing::info!(room = %room.id, "panic window elapsed");
                self.close_panic(room)
            }
            (TimerKind::SpeedRunTimeout, GameState::Playing, Rules::SpeedRun) => {
                let runner = room.players.iter().find(|p| p.solved > 0).map(|p| p.id);
                let state = if runner.is_some() {
                    GameState::Won
                } else {
                    GameState::Lost
                };
                self.finish(room, state, runner)
            }
            (TimerKind::CpuTurn, GameState::Playing, Rules::CpuDuel) => self.cpu_turn(room),
            _ => {
                tracing::debug!(room = %room.id, ?kind, state = %room.state, "timer no longer applies");
                Outcome::default()
            }
        }
    }

    fn cpu_turn(&mut self, room: &mut Room) -> Outcome {
        let Some(cpu) = room.players.iter().find(|p| p.id == CPU_PLAYER_ID) else {
            return Outcome::default();
        };
        let code = room.cpu_solver.next_guess(&cpu.guesses, &room.settings, &mut *self.rng);
        let mut out = match self.submit_guess(room, CPU_PLAYER_ID, &code) {
            Ok(out) => out,
            Err(e) => {
                tracing::warn!(room = %room.id, error = %e, "CPU produced an invalid guess");
                Outcome::default()
            }
        };
        if room.state == GameState::Playing {
            out.timers
                .push(self.timer(room, TimerKind::CpuTurn, self.timings.cpu_think_time));
        }
        out
    }
}
