//! The canonical room model.
//!
//! A [`Room`] exclusively owns its [`Player`]s and their guesses. Nothing
//! here enforces game rules; that is the [`Referee`](crate::Referee)'s job.
//! These types only keep the structural invariants: join order, one host,
//! gap-free guess numbering.

use mastermind_protocol::{
    DuelKind, GameMode, GameState, Guess, PlayerId, RoomCode, ScoreBreakdown, Settings,
};

use crate::CpuSolver;

/// The id every CPU player uses. Connection ids start at 1, and CPU
/// players are not tracked by the registry, so one reserved id is enough.
/// Must stay below 2^53: clients read ids as JSON numbers.
pub const CPU_PLAYER_ID: PlayerId = PlayerId(0);

/// Display name of the CPU player.
pub const CPU_NAME: &str = "CPU";

/// One participant within a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_host: bool,
    pub is_ready: bool,
    pub is_bot: bool,
    /// Append-only within a code; see [`Player::record_guess`].
    pub guesses: Vec<Guess>,
    /// PvP duel only: the code this player set for the opponent.
    pub secret_code: Option<String>,
    /// Duel only, set while both seats are taken.
    pub opponent_id: Option<PlayerId>,
    /// Cumulative over games; survives resets.
    pub score: u32,
    /// Breakdown of the latest solve.
    pub score_breakdown: Option<ScoreBreakdown>,
    /// Codes cracked in the current game.
    pub solved: u32,
    /// Battle royale: knocked out, may watch but not guess.
    pub eliminated: bool,
    /// When the first guess against the current code arrived (ms).
    pub first_guess_at: Option<u64>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_host: false,
            is_ready: false,
            is_bot: false,
            guesses: Vec::new(),
            secret_code: None,
            opponent_id: None,
            score: 0,
            score_breakdown: None,
            solved: 0,
            eliminated: false,
            first_guess_at: None,
        }
    }

    /// A CPU opponent. Always ready, never host.
    pub fn cpu() -> Self {
        Self {
            is_ready: true,
            is_bot: true,
            ..Self::new(CPU_PLAYER_ID, CPU_NAME)
        }
    }

    /// Appends a guess, numbering it `guesses.len() + 1`.
    pub fn record_guess(
        &mut self,
        code: String,
        hits: usize,
        pseudo_hits: usize,
        feedback_message: String,
    ) -> &Guess {
        let guess = Guess {
            id: self.guesses.len() as u32 + 1,
            code,
            hits,
            pseudo_hits,
            feedback_message,
            player_id: self.id,
            player_name: self.name.clone(),
        };
        self.guesses.push(guess);
        &self.guesses[self.guesses.len() - 1]
    }

    /// `true` if the latest guess cracked a code of `length` symbols.
    pub fn has_cracked(&self, length: usize) -> bool {
        self.guesses.last().is_some_and(|g| g.hits == length)
    }

    /// Forgets everything tied to the current code.
    pub(crate) fn clear_attempts(&mut self) {
        self.guesses.clear();
        self.first_guess_at = None;
    }
}

/// The rule set a room plays under: the game mode with the duel flavor
/// folded in. The referee and the sanitizer both match on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    Solo,
    PvpDuel,
    CpuDuel,
    Ffa,
    BattleRoyale,
    SpeedRun,
}

impl Rules {
    pub fn of(mode: GameMode, settings: &Settings) -> Self {
        match mode {
            GameMode::Single => Self::Solo,
            GameMode::Duel => match settings.duel_kind() {
                DuelKind::Pvp => Self::PvpDuel,
                DuelKind::Cpu => Self::CpuDuel,
            },
            GameMode::Ffa => Self::Ffa,
            GameMode::BattleRoyale => Self::BattleRoyale,
            GameMode::SpeedRun => Self::SpeedRun,
        }
    }

    /// Whether everyone cracks one room-wide secret.
    pub fn has_shared_secret(self) -> bool {
        match self {
            Self::PvpDuel => false,
            Self::Solo | Self::CpuDuel | Self::Ffa | Self::BattleRoyale | Self::SpeedRun => true,
        }
    }

    /// Whether solves earn points.
    pub fn awards_points(self) -> bool {
        match self {
            Self::Ffa | Self::BattleRoyale | Self::SpeedRun => true,
            Self::Solo | Self::PvpDuel | Self::CpuDuel => false,
        }
    }
}

/// One active game session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: RoomCode,
    pub mode: GameMode,
    pub state: GameState,
    pub settings: Settings,
    /// Join order; drives host succession and score tie-breaks.
    pub players: Vec<Player>,
    /// Shared secret; empty in PvP duels and outside a game.
    pub secret_code: String,
    /// When the current game began (ms).
    pub start_time: Option<u64>,
    /// When the current code appeared (ms). Differs from `start_time` in
    /// speed runs and later battle-royale rounds.
    pub code_issued_at: Option<u64>,
    pub panic_start_time: Option<u64>,
    pub panic_ends_at: Option<u64>,
    /// Bumped on every start and every battle-royale round. Timers carry
    /// the round they were armed in and are void once it moves on.
    pub round: u32,
    pub winner_id: Option<PlayerId>,
    /// Candidate pool of the CPU player, if one is seated.
    pub cpu_solver: CpuSolver,
}

impl Room {
    /// A new lobby with `host` in the host seat, ready.
    pub fn new(id: RoomCode, mode: GameMode, mut host: Player) -> Self {
        host.is_host = true;
        host.is_ready = true;
        Self {
            id,
            mode,
            state: GameState::Lobby,
            settings: Settings::for_mode(mode),
            players: vec![host],
            secret_code: String::new(),
            start_time: None,
            code_issued_at: None,
            panic_start_time: None,
            panic_ends_at: None,
            round: 0,
            winner_id: None,
            cpu_solver: CpuSolver::default(),
        }
    }

    pub fn rules(&self) -> Rules {
        Rules::of(self.mode, &self.settings)
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    pub fn is_host(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.is_host)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.mode.capacity()
    }

    /// Players with a connection behind them.
    pub fn humans(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.is_bot)
    }

    pub fn has_humans(&self) -> bool {
        self.humans().next().is_some()
    }

    /// Players still in the running: everyone but the eliminated.
    pub fn contenders(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| !p.eliminated)
    }

    /// Adds a player at the end of the join order.
    pub(crate) fn seat(&mut self, player: Player) {
        self.players.push(player);
        self.pair_duelists();
    }

    /// Removes a player, handing the host seat down the join order if
    /// needed. Returns the removed player.
    pub(crate) fn unseat(&mut self, id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == id)?;
        let removed = self.players.remove(index);
        if removed.is_host {
            if let Some(next) = self.players.iter_mut().find(|p| !p.is_bot) {
                next.is_host = true;
                next.is_ready = true;
            }
        }
        self.pair_duelists();
        Some(removed)
    }

    /// Keeps `opponent_id` in step with the seats: linked while a duel
    /// room holds exactly two players, cleared otherwise.
    fn pair_duelists(&mut self) {
        let pair = match (self.mode, self.players.as_slice()) {
            (GameMode::Duel, [a, b]) => Some((a.id, b.id)),
            _ => None,
        };
        match pair {
            Some((a, b)) => {
                self.players[0].opponent_id = Some(b);
                self.players[1].opponent_id = Some(a);
            }
            None => {
                for p in &mut self.players {
                    p.opponent_id = None;
                }
            }
        }
    }

    /// The secret `player` is trying to crack, if there is one yet.
    pub fn target_for(&self, player: &Player) -> Option<&str> {
        if self.rules().has_shared_secret() {
            return (!self.secret_code.is_empty()).then_some(self.secret_code.as_str());
        }
        let opponent = self.player(player.opponent_id?)?;
        opponent.secret_code.as_deref()
    }

    /// Highest cumulative score, earliest joiner on ties.
    pub fn top_scorer(&self) -> Option<PlayerId> {
        let mut best: Option<&Player> = None;
        for p in &self.players {
            if best.is_none_or(|b| p.score > b.score) {
                best = Some(p);
            }
        }
        best.map(|p| p.id)
    }
}
