//! The game hub: a single task that owns every room.
//!
//! Connection handlers and timers never touch rooms. They post a
//! [`HubCommand`] into the hub's channel and the hub applies commands one
//! at a time, so every mutation runs to completion before the next one
//! starts and no lock is needed around the registry.
//!
//! After each mutation the hub asks [`sanitize`] for one view per human in
//! the room and queues it on that player's outbound channel.

use mastermind_core::{
    GameTimings, Notice, Outcome, Referee, RoomError, RoomRegistry, Timer, sanitize,
};
use mastermind_protocol::{ClientIntent, GameMode, PlayerId, RoomCode, ServerPush};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::ServerError;
use crate::session::{Outbound, SessionTable};

/// Commands queued beyond this make senders wait.
const HUB_CHANNEL_SIZE: usize = 1024;

/// Everything the hub reacts to.
pub(crate) enum HubCommand {
    /// A connection was accepted; pushes for `player_id` go to `outbound`.
    Connect {
        player_id: PlayerId,
        outbound: Outbound,
    },

    /// A decoded client message.
    Intent {
        player_id: PlayerId,
        intent: ClientIntent,
    },

    /// The connection ended. Implies leaving the room.
    Disconnect { player_id: PlayerId },

    /// A timer armed by an earlier outcome came due.
    Timer(Timer),
}

/// Handle to the running hub. Cheap to clone: one per connection task.
#[derive(Clone)]
pub(crate) struct HubHandle {
    sender: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) async fn connect(
        &self,
        player_id: PlayerId,
        outbound: Outbound,
    ) -> Result<(), ServerError> {
        self.send(HubCommand::Connect {
            player_id,
            outbound,
        })
        .await
    }

    pub(crate) async fn intent(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<(), ServerError> {
        self.send(HubCommand::Intent { player_id, intent }).await
    }

    pub(crate) async fn disconnect(&self, player_id: PlayerId) -> Result<(), ServerError> {
        self.send(HubCommand::Disconnect { player_id }).await
    }

    async fn send(&self, command: HubCommand) -> Result<(), ServerError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| ServerError::HubClosed)
    }
}

/// The hub state. Lives inside the task started by [`Hub::spawn`].
pub(crate) struct Hub {
    registry: RoomRegistry,
    sessions: SessionTable,
    timings: GameTimings,
    rng: StdRng,
    /// Room timestamps are milliseconds since this instant.
    epoch: Instant,
    commands: mpsc::Receiver<HubCommand>,
    /// Timers post back through this. Weak, so the hub stops once every
    /// handle is gone even with timers still pending.
    loopback: mpsc::WeakSender<HubCommand>,
}

impl Hub {
    pub(crate) fn new(timings: GameTimings, rng: StdRng) -> (Self, HubHandle) {
        let (sender, commands) = mpsc::channel(HUB_CHANNEL_SIZE);
        let hub = Self {
            registry: RoomRegistry::new(),
            sessions: SessionTable::new(),
            timings,
            rng,
            epoch: Instant::now(),
            commands,
            loopback: sender.downgrade(),
        };
        (hub, HubHandle { sender })
    }

    /// Starts the hub task with an OS-seeded RNG.
    pub(crate) fn spawn(timings: GameTimings) -> HubHandle {
        let (hub, handle) = Self::new(timings, StdRng::from_os_rng());
        tokio::spawn(hub.run());
        handle
    }

    async fn run(mut self) {
        tracing::info!("game hub started");
        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }
        tracing::info!(rooms = self.registry.room_count(), "game hub stopped");
    }

    fn now(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn handle(&mut self, command: HubCommand) {
        match command {
            HubCommand::Connect {
                player_id,
                outbound,
            } => {
                self.sessions.register(player_id, outbound);
                tracing::info!(%player_id, connected = self.sessions.len(), "player connected");
            }
            HubCommand::Intent { player_id, intent } => {
                if !self.sessions.is_connected(player_id) {
                    tracing::warn!(%player_id, kind = intent.kind(), "intent from unknown player");
                    return;
                }
                tracing::debug!(%player_id, kind = intent.kind(), "intent received");
                if let Err(e) = self.on_intent(player_id, intent) {
                    tracing::debug!(%player_id, error = %e, "intent rejected");
                    self.sessions.send(player_id, ServerPush::Error(e.to_string()));
                }
            }
            HubCommand::Disconnect { player_id } => {
                self.depart(player_id);
                self.sessions.remove(player_id);
                tracing::info!(%player_id, connected = self.sessions.len(), "player disconnected");
            }
            HubCommand::Timer(timer) => self.on_timer(timer),
        }
    }

    // -----------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------

    fn on_intent(&mut self, player_id: PlayerId, intent: ClientIntent) -> Result<(), RoomError> {
        match intent {
            ClientIntent::CreateRoom {
                game_mode,
                player_name,
            } => self.create_room(player_id, game_mode, &player_name),
            ClientIntent::JoinRoom {
                room_id,
                player_name,
            } => self.join_room(player_id, &room_id, &player_name),
            ClientIntent::LeaveRoom { room_id } => {
                if self.registry.room_of(player_id) == Some(&room_id) {
                    self.depart(player_id);
                } else {
                    tracing::debug!(%player_id, room = %room_id, "leave for a room the player is not in");
                }
                Ok(())
            }
            other => self.room_intent(player_id, other),
        }
    }

    fn create_room(
        &mut self,
        player_id: PlayerId,
        mode: GameMode,
        name: &str,
    ) -> Result<(), RoomError> {
        let code = self
            .registry
            .create_room(player_id, name, mode, &mut self.rng)?;
        self.broadcast(&code, &[Notice::RoomUpdate]);
        Ok(())
    }

    fn join_room(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        name: &str,
    ) -> Result<(), RoomError> {
        self.registry.join_room(player_id, code, name)?;
        self.broadcast(code, &[Notice::RoomUpdate]);
        Ok(())
    }

    /// Intents that act on the room the player already sits in.
    fn room_intent(&mut self, player_id: PlayerId, intent: ClientIntent) -> Result<(), RoomError> {
        let Some(code) = intent.room_id().cloned() else {
            return Ok(());
        };
        if self.registry.room_of(player_id) != Some(&code) {
            if self.registry.room(&code).is_none() {
                return Err(RoomError::NotFound(code));
            }
            tracing::debug!(%player_id, room = %code, kind = intent.kind(), "intent for a room the player is not in");
            return Ok(());
        }

        let now = self.now();
        let room = self
            .registry
            .room_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let mut referee = Referee::new(&self.timings, &mut self.rng, now);

        let outcome = match intent {
            ClientIntent::SetReady { is_ready, .. } => referee.set_ready(room, player_id, is_ready),
            ClientIntent::UpdateSettings { settings, .. } => {
                referee.update_settings(room, player_id, &settings)?
            }
            ClientIntent::StartGame { .. } => referee.start_game(room, player_id)?,
            ClientIntent::SetDuelCode { code: secret, .. } => {
                referee.set_duel_code(room, player_id, &secret)?
            }
            ClientIntent::SubmitGuess { guess_code, .. } => {
                referee.submit_guess(room, player_id, &guess_code)?
            }
            ClientIntent::ResetGame { .. } => referee.reset_game(room, player_id),
            ClientIntent::CreateRoom { .. }
            | ClientIntent::JoinRoom { .. }
            | ClientIntent::LeaveRoom { .. } => Outcome::default(),
        };

        self.apply(&code, outcome);
        Ok(())
    }

    /// Takes a player out of their room, if any, and lets the referee
    /// react. A room left without humans is already gone.
    fn depart(&mut self, player_id: PlayerId) {
        let Some(departure) = self.registry.leave(player_id) else {
            return;
        };
        if departure.room_closed {
            return;
        }

        let now = self.now();
        let Some(room) = self.registry.room_mut(&departure.room) else {
            return;
        };
        let outcome =
            Referee::new(&self.timings, &mut self.rng, now).after_departure(room, departure.name);
        self.apply(&departure.room, outcome);
    }

    // -----------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------

    fn on_timer(&mut self, timer: Timer) {
        let now = self.now();
        let Some(room) = self.registry.room_mut(&timer.room) else {
            tracing::debug!(room = %timer.room, kind = ?timer.kind, "timer for a closed room");
            return;
        };
        tracing::debug!(room = %timer.room, kind = ?timer.kind, round = timer.round, "timer fired");
        let outcome =
            Referee::new(&self.timings, &mut self.rng, now).on_timer(room, timer.kind, timer.round);
        self.apply(&timer.room, outcome);
    }

    /// Arms a timer. The deadline is fixed now; the task only carries the
    /// room code and round back, never the room itself.
    fn schedule(&self, timer: Timer) {
        let deadline = Instant::now() + timer.after;
        let loopback = self.loopback.clone();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if let Some(sender) = loopback.upgrade() {
                let _ = sender.send(HubCommand::Timer(timer)).await;
            }
        });
    }

    // -----------------------------------------------------------------
    // Fan-out
    // -----------------------------------------------------------------

    fn apply(&self, code: &RoomCode, outcome: Outcome) {
        for timer in outcome.timers {
            self.schedule(timer);
        }
        self.broadcast(code, &outcome.notices);
    }

    /// Sends each notice to every human in the room, one sanitized view
    /// per recipient.
    fn broadcast(&self, code: &RoomCode, notices: &[Notice]) {
        let Some(room) = self.registry.room(code) else {
            return;
        };
        for notice in notices {
            for player in room.humans() {
                let push = match notice {
                    Notice::RoomUpdate => ServerPush::RoomUpdate(sanitize(room, player.id)),
                    Notice::GameStart => ServerPush::GameStart(sanitize(room, player.id)),
                    Notice::GameOver => ServerPush::GameOver(sanitize(room, player.id)),
                    Notice::PlayerLeft(name) => ServerPush::PlayerLeft { name: name.clone() },
                };
                self.sessions.send(player.id, push);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use mastermind_protocol::{DuelKind, GameState, RoomView, SettingsPatch};

    struct Client {
        id: PlayerId,
        rx: mpsc::UnboundedReceiver<ServerPush>,
    }

    impl Client {
        fn drain(&mut self) -> Vec<ServerPush> {
            let mut pushes = Vec::new();
            while let Ok(push) = self.rx.try_recv() {
                pushes.push(push);
            }
            pushes
        }

        fn last_view(&mut self) -> RoomView {
            self.drain()
                .iter()
                .rev()
                .find_map(|p| p.view().cloned())
                .expect("a view push")
        }
    }

    /// The handle must outlive the test: timers post through it.
    fn hub() -> (Hub, HubHandle) {
        Hub::new(GameTimings::default(), StdRng::seed_from_u64(77))
    }

    fn connect(hub: &mut Hub, id: u64) -> Client {
        let (outbound, rx) = mpsc::unbounded_channel();
        hub.handle(HubCommand::Connect {
            player_id: PlayerId(id),
            outbound,
        });
        Client {
            id: PlayerId(id),
            rx,
        }
    }

    fn send(hub: &mut Hub, client: &Client, intent: ClientIntent) {
        hub.handle(HubCommand::Intent {
            player_id: client.id,
            intent,
        });
    }

    fn create(hub: &mut Hub, client: &mut Client, mode: GameMode) -> RoomCode {
        send(
            hub,
            client,
            ClientIntent::CreateRoom {
                game_mode: mode,
                player_name: format!("player{}", client.id.0),
            },
        );
        client.last_view().id
    }

    fn join(hub: &mut Hub, client: &Client, code: &RoomCode) {
        send(
            hub,
            client,
            ClientIntent::JoinRoom {
                room_id: code.clone(),
                player_name: format!("player{}", client.id.0),
            },
        );
    }

    /// Two players in an FFA room that has started on secret `1234`.
    fn ffa_in_play(hub: &mut Hub) -> (Client, Client, RoomCode) {
        let mut a = connect(hub, 1);
        let mut b = connect(hub, 2);
        let code = create(hub, &mut a, GameMode::Ffa);
        join(hub, &b, &code);
        send(
            hub,
            &b,
            ClientIntent::SetReady {
                room_id: code.clone(),
                is_ready: true,
            },
        );
        send(hub, &a, ClientIntent::StartGame { room_id: code.clone() });
        hub.registry.room_mut(&code).unwrap().secret_code = "1234".into();
        a.drain();
        b.drain();
        (a, b, code)
    }

    fn guess(hub: &mut Hub, client: &Client, code: &RoomCode, digits: &str) {
        send(
            hub,
            client,
            ClientIntent::SubmitGuess {
                room_id: code.clone(),
                guess_code: digits.into(),
            },
        );
    }

    fn state(hub: &Hub, code: &RoomCode) -> GameState {
        hub.registry.room(code).unwrap().state
    }

    #[tokio::test]
    async fn test_create_room_pushes_view_to_creator() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        send(
            &mut hub,
            &a,
            ClientIntent::CreateRoom {
                game_mode: GameMode::Duel,
                player_name: "ada".into(),
            },
        );
        let pushes = a.drain();
        assert_eq!(pushes.len(), 1);
        let ServerPush::RoomUpdate(view) = &pushes[0] else {
            panic!("expected room_update, got {pushes:?}");
        };
        assert_eq!(view.viewer_id, PlayerId(1));
        assert_eq!(view.game_mode, GameMode::Duel);
        assert!(view.players[0].is_host);
        assert!(view.id.is_well_formed());
    }

    #[tokio::test]
    async fn test_errors_go_to_requester_only() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let mut b = connect(&mut hub, 2);
        let mut c = connect(&mut hub, 3);
        let code = create(&mut hub, &mut a, GameMode::Duel);
        join(&mut hub, &b, &code);
        a.drain();
        b.drain();

        join(&mut hub, &c, &code);
        assert_eq!(c.drain(), vec![ServerPush::Error("Room is full".into())]);
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());

        join(&mut hub, &c, &RoomCode::new("ZZZZ"));
        assert_eq!(c.drain(), vec![ServerPush::Error("Room not found".into())]);
    }

    #[tokio::test]
    async fn test_join_fans_out_sanitized_views() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let mut b = connect(&mut hub, 2);
        let code = create(&mut hub, &mut a, GameMode::Ffa);
        join(&mut hub, &b, &code);

        let for_a = a.last_view();
        let for_b = b.last_view();
        assert_eq!(for_a.viewer_id, PlayerId(1));
        assert_eq!(for_b.viewer_id, PlayerId(2));
        assert_eq!(for_a.players.len(), 2);
    }

    #[tokio::test]
    async fn test_intent_for_foreign_room_is_dropped() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let mut c = connect(&mut hub, 3);
        let code = create(&mut hub, &mut a, GameMode::Single);
        a.drain();

        send(&mut hub, &c, ClientIntent::StartGame { room_id: code.clone() });
        assert!(c.drain().is_empty());
        assert!(a.drain().is_empty());
        assert_eq!(state(&hub, &code), GameState::Lobby);
    }

    #[tokio::test]
    async fn test_ffa_guess_codes_hidden_from_others() {
        let (mut hub, _handle) = hub();
        let (mut a, mut b, code) = ffa_in_play(&mut hub);

        guess(&mut hub, &a, &code, "1243");
        let mine = a.last_view();
        let theirs = b.last_view();
        assert_eq!(mine.players[0].guesses[0].code, "1243");
        assert_eq!(mine.players[0].guesses[0].hits, 2);
        assert_eq!(mine.players[0].guesses[0].pseudo_hits, 2);
        assert!(theirs.players[0].guesses[0].code.is_empty());
        assert!(theirs.secret_code.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_guess_is_reported() {
        let (mut hub, _handle) = hub();
        let (mut a, mut b, code) = ffa_in_play(&mut hub);
        guess(&mut hub, &a, &code, "12");
        let pushes = a.drain();
        assert!(matches!(&pushes[..], [ServerPush::Error(msg)] if msg.starts_with("Invalid guess")));
        assert!(b.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_window_closes_after_thirty_seconds() {
        let (mut hub, _handle) = hub();
        let (mut a, mut b, code) = ffa_in_play(&mut hub);

        guess(&mut hub, &a, &code, "1234");
        assert_eq!(state(&hub, &code), GameState::Panic);
        let view = b.last_view();
        assert_eq!(view.panic_ends_at, view.panic_start_time.map(|t| t + 30_000));

        let early = tokio::time::timeout(Duration::from_millis(29_999), hub.commands.recv()).await;
        assert!(early.is_err(), "panic window closed early");
        assert_eq!(state(&hub, &code), GameState::Panic);

        let command = hub.commands.recv().await.expect("panic timer");
        hub.handle(command);
        assert_eq!(state(&hub, &code), GameState::Won);

        let last = b.drain().pop().expect("game_over push");
        let ServerPush::GameOver(view) = last else {
            panic!("expected game_over, got {last:?}");
        };
        assert_eq!(view.secret_code, "1234");
        assert_eq!(view.winner_id, Some(PlayerId(1)));
        assert!(matches!(a.drain().last(), Some(ServerPush::GameOver(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_everyone_solving_ends_without_timer() {
        let (mut hub, _handle) = hub();
        let (mut a, mut b, code) = ffa_in_play(&mut hub);
        guess(&mut hub, &a, &code, "1234");
        guess(&mut hub, &b, &code, "1234");
        assert_eq!(state(&hub, &code), GameState::Won);
        assert!(matches!(a.drain().last(), Some(ServerPush::GameOver(_))));
        assert!(matches!(b.drain().last(), Some(ServerPush::GameOver(_))));

        // The timer still fires later and changes nothing.
        let command = hub.commands.recv().await.expect("panic timer");
        hub.handle(command);
        assert_eq!(state(&hub, &code), GameState::Won);
        assert!(a.drain().is_empty());
        assert!(b.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_for_closed_room_is_absorbed() {
        let (mut hub, _handle) = hub();
        let (a, b, code) = ffa_in_play(&mut hub);
        guess(&mut hub, &a, &code, "1234");

        hub.handle(HubCommand::Disconnect { player_id: a.id });
        hub.handle(HubCommand::Disconnect { player_id: b.id });
        assert!(hub.registry.room(&code).is_none());

        let command = hub.commands.recv().await.expect("panic timer");
        hub.handle(command);
        assert_eq!(hub.registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_and_promotes_host() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let mut b = connect(&mut hub, 2);
        let code = create(&mut hub, &mut a, GameMode::Ffa);
        join(&mut hub, &b, &code);
        b.drain();

        hub.handle(HubCommand::Disconnect { player_id: a.id });
        let pushes = b.drain();
        assert_eq!(
            pushes[0],
            ServerPush::PlayerLeft {
                name: "player1".into()
            }
        );
        let ServerPush::RoomUpdate(view) = &pushes[1] else {
            panic!("expected room_update, got {pushes:?}");
        };
        assert!(view.players[0].is_host);
        assert_eq!(view.players[0].id, PlayerId(2));
        // The leaver's channel is closed.
        a.drain();
        assert!(a.rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_leave_room_removes_membership() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let code = create(&mut hub, &mut a, GameMode::Single);
        send(&mut hub, &a, ClientIntent::LeaveRoom { room_id: code.clone() });
        assert!(hub.registry.room(&code).is_none());

        // Free to create another room afterwards.
        let again = create(&mut hub, &mut a, GameMode::Single);
        assert!(hub.registry.room(&again).is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cpu_duel_plays_itself_to_a_loss() {
        let (mut hub, _handle) = hub();
        let mut a = connect(&mut hub, 1);
        let code = create(&mut hub, &mut a, GameMode::Duel);
        send(
            &mut hub,
            &a,
            ClientIntent::UpdateSettings {
                room_id: code.clone(),
                settings: SettingsPatch {
                    duel_mode_type: Some(DuelKind::Cpu),
                    ..SettingsPatch::default()
                },
            },
        );
        let view = a.last_view();
        assert_eq!(view.players.len(), 2);
        assert!(view.players[1].is_bot);

        send(&mut hub, &a, ClientIntent::StartGame { room_id: code.clone() });
        assert!(matches!(a.drain().last(), Some(ServerPush::GameStart(_))));

        for _ in 0..20 {
            if state(&hub, &code) != GameState::Playing {
                break;
            }
            let command = hub.commands.recv().await.expect("cpu turn");
            hub.handle(command);
        }
        assert_eq!(state(&hub, &code), GameState::Lost);
        let last = a.drain().pop().expect("game_over push");
        let ServerPush::GameOver(view) = last else {
            panic!("expected game_over, got {last:?}");
        };
        assert_eq!(view.game_state, GameState::Lost);
        assert!(!view.secret_code.is_empty());
    }
}
