//! Room registry: the process-wide store of live rooms.

use std::collections::HashMap;

use mastermind_protocol::{GameMode, GameState, PlayerId, ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
use rand::Rng;

use crate::{Player, Room, RoomError};

/// Longest player name kept; longer names are truncated.
pub const MAX_NAME_LEN: usize = 20;

/// What happened when a player left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room: RoomCode,
    pub name: String,
    /// The room had no human left and is gone.
    pub room_closed: bool,
}

/// Owns every live [`Room`] and tracks which room each player sits in.
///
/// A room is inserted on create and removed as soon as its last human
/// leaves. A player can be in at most one room at a time. CPU players are
/// never tracked here.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    player_rooms: HashMap<PlayerId, RoomCode>,
}

fn clean_name(name: &str) -> Result<String, RoomError> {
    let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        return Err(RoomError::InvalidName);
    }
    Ok(name)
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a room with `player_id` as its host and returns its code.
    pub fn create_room<R: Rng + ?Sized>(
        &mut self,
        player_id: PlayerId,
        player_name: &str,
        mode: GameMode,
        rng: &mut R,
    ) -> Result<RoomCode, RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
        }
        let name = clean_name(player_name)?;

        let code = self.unused_code(rng);
        let room = Room::new(code.clone(), mode, Player::new(player_id, name));
        self.rooms.insert(code.clone(), room);
        self.player_rooms.insert(player_id, code.clone());

        tracing::info!(room = %code, %mode, host = %player_id, "room created");
        Ok(code)
    }

    /// Seats a player in an existing lobby.
    pub fn join_room(
        &mut self,
        player_id: PlayerId,
        code: &RoomCode,
        player_name: &str,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, current.clone()));
        }
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        if room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }
        if room.state != GameState::Lobby {
            return Err(RoomError::InvalidState("Game already in progress".into()));
        }
        let name = clean_name(player_name)?;

        room.seat(Player::new(player_id, name));
        self.player_rooms.insert(player_id, code.clone());

        tracing::info!(
            room = %code,
            %player_id,
            players = room.players.len(),
            "player joined"
        );
        Ok(())
    }

    /// Removes a player from whatever room they are in.
    ///
    /// Hands the host seat to the next human in join order and voids a
    /// duel pairing. Destroys the room once no human is left. Returns
    /// `None` if the player was not seated anywhere.
    pub fn leave(&mut self, player_id: PlayerId) -> Option<Departure> {
        let code = self.player_rooms.remove(&player_id)?;
        let room = self.rooms.get_mut(&code)?;
        let removed = room.unseat(player_id)?;

        let room_closed = !room.has_humans();
        if room_closed {
            self.rooms.remove(&code);
            tracing::info!(room = %code, "room destroyed");
        } else {
            tracing::info!(
                room = %code,
                %player_id,
                players = room.players.len(),
                "player left"
            );
        }

        Some(Departure {
            room: code,
            name: removed.name,
            room_closed,
        })
    }

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// The room a player currently sits in, if any.
    pub fn room_of(&self, player_id: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player_id)
    }

    /// Returns the number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn unused_code<R: Rng + ?Sized>(&self, rng: &mut R) -> RoomCode {
        loop {
            let code: String = (0..ROOM_CODE_LEN)
                .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
                .collect();
            let code = RoomCode::new(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    #[test]
    fn test_create_room_returns_unique_well_formed_codes() {
        let mut reg = RoomRegistry::new();
        let mut rng = rng();
        let a = reg.create_room(PlayerId(1), "ada", GameMode::Ffa, &mut rng).unwrap();
        let b = reg.create_room(PlayerId(2), "bob", GameMode::Ffa, &mut rng).unwrap();
        assert_ne!(a, b);
        assert!(a.is_well_formed());
        assert_eq!(reg.room_count(), 2);
        assert_eq!(reg.room_of(PlayerId(1)), Some(&a));
    }

    #[test]
    fn test_create_room_rejects_player_already_seated() {
        let mut reg = RoomRegistry::new();
        let mut rng = rng();
        reg.create_room(PlayerId(1), "ada", GameMode::Ffa, &mut rng).unwrap();
        let err = reg
            .create_room(PlayerId(1), "ada", GameMode::Ffa, &mut rng)
            .unwrap_err();
        assert!(matches!(err, RoomError::AlreadyInRoom(..)));
    }

    #[test]
    fn test_names_are_trimmed_and_required() {
        let mut reg = RoomRegistry::new();
        let mut rng = rng();
        let err = reg
            .create_room(PlayerId(1), "   ", GameMode::Ffa, &mut rng)
            .unwrap_err();
        assert!(matches!(err, RoomError::InvalidName));

        let code = reg
            .create_room(PlayerId(1), "  an extremely long player name  ", GameMode::Ffa, &mut rng)
            .unwrap();
        let name = &reg.room(&code).unwrap().players[0].name;
        assert_eq!(name.chars().count(), MAX_NAME_LEN);
        assert!(name.starts_with("an extremely"));
    }

    #[test]
    fn test_join_room_not_found() {
        let mut reg = RoomRegistry::new();
        let err = reg.join_room(PlayerId(1), &RoomCode::new("ZZZZ"), "ada").unwrap_err();
        assert_eq!(err.to_string(), "Room not found");
    }

    #[test]
    fn test_join_duel_full_after_two() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "ada", GameMode::Duel, &mut rng()).unwrap();
        reg.join_room(PlayerId(2), &code, "bob").unwrap();

        let err = reg.join_room(PlayerId(3), &code, "cy").unwrap_err();
        assert_eq!(err.to_string(), "Room is full");
        assert_eq!(reg.room(&code).unwrap().players.len(), 2);
        assert_eq!(reg.room_of(PlayerId(3)), None);
    }

    #[test]
    fn test_join_ffa_caps_at_eight() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "p1", GameMode::Ffa, &mut rng()).unwrap();
        for id in 2..=8 {
            reg.join_room(PlayerId(id), &code, "p").unwrap();
        }
        let err = reg.join_room(PlayerId(9), &code, "p9").unwrap_err();
        assert!(matches!(err, RoomError::RoomFull(_)));
    }

    #[test]
    fn test_join_rejected_once_game_started() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "ada", GameMode::Ffa, &mut rng()).unwrap();
        reg.room_mut(&code).unwrap().state = GameState::Playing;
        let err = reg.join_room(PlayerId(2), &code, "bob").unwrap_err();
        assert!(matches!(err, RoomError::InvalidState(_)));
    }

    #[test]
    fn test_leave_promotes_next_host() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "a", GameMode::Ffa, &mut rng()).unwrap();
        reg.join_room(PlayerId(2), &code, "b").unwrap();
        reg.join_room(PlayerId(3), &code, "c").unwrap();

        let departure = reg.leave(PlayerId(1)).unwrap();
        assert_eq!(departure.name, "a");
        assert!(!departure.room_closed);

        let room = reg.room(&code).unwrap();
        assert_eq!(room.host().map(|p| p.id), Some(PlayerId(2)));
        assert_eq!(room.players.iter().filter(|p| p.is_host).count(), 1);
        assert_eq!(reg.room_of(PlayerId(1)), None);
    }

    #[test]
    fn test_last_player_leaving_destroys_room() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "a", GameMode::Single, &mut rng()).unwrap();

        let departure = reg.leave(PlayerId(1)).unwrap();
        assert!(departure.room_closed);
        assert!(reg.room(&code).is_none());
        assert_eq!(reg.room_count(), 0);
    }

    #[test]
    fn test_room_with_only_cpu_left_is_destroyed() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "a", GameMode::Duel, &mut rng()).unwrap();
        reg.room_mut(&code).unwrap().seat(Player::cpu());

        assert!(reg.leave(PlayerId(1)).unwrap().room_closed);
        assert!(reg.room(&code).is_none());
    }

    #[test]
    fn test_leave_duel_clears_opponent() {
        let mut reg = RoomRegistry::new();
        let code = reg.create_room(PlayerId(1), "a", GameMode::Duel, &mut rng()).unwrap();
        reg.join_room(PlayerId(2), &code, "b").unwrap();

        reg.leave(PlayerId(1));
        let room = reg.room(&code).unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].opponent_id, None);
        assert!(room.players[0].is_host);
    }

    #[test]
    fn test_leave_unknown_player_is_none() {
        let mut reg = RoomRegistry::new();
        assert!(reg.leave(PlayerId(5)).is_none());
    }
}
