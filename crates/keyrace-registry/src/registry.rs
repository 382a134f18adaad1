//! The room registry: single source of truth for all room and player
//! state.
//!
//! # Concurrency note
//!
//! `RoomRegistry` is NOT thread-safe by itself — it is a plain set of
//! maps, owned by the server and accessed through one `Mutex` at a
//! higher level. Every operation here runs to completion without
//! suspension, so callers never observe a partial update; the
//! registry's serialized execution is the concurrency control.
//!
//! Benign can't-proceed conditions (`leave` on a missing room, progress
//! outside `playing`) are no-ops or `false`, never errors. Typed errors
//! are reserved for calls the client must be told about: joining a
//! full, started, or missing room.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use keyrace_protocol::{GameConfig, PlayerId, RoomId, RoomStatus, RoomSummary};
use rand::Rng;

use crate::room::{PlayerIdentity, Room};
use crate::{charset, RegistryError};

/// Length of generated room ids.
const ROOM_ID_LEN: usize = 7;

/// Display name given to rooms created by quick-match placement.
const QUICK_MATCH_ROOM_NAME: &str = "Quick match";

/// Owns every active room. Created once at server start, torn down at
/// shutdown; no ambient global access.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
}

impl RoomRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Creates a room with the creator as its sole player. Always
    /// succeeds.
    pub fn create_room(
        &mut self,
        name: String,
        config: GameConfig,
        creator: PlayerIdentity,
    ) -> &Room {
        let room_id = self.generate_room_id();
        let room = Room::new(
            room_id.clone(),
            name,
            config,
            creator.into_player(),
            now_millis(),
        );

        tracing::info!(%room_id, name = %room.name, "room created");
        self.rooms.insert(room_id.clone(), room);
        self.rooms.get(&room_id).expect("just inserted")
    }

    /// Adds a player to a waiting room with spare capacity.
    ///
    /// # Errors
    /// - [`RegistryError::NotFound`] — no such room
    /// - [`RegistryError::AlreadyStarted`] — room is not `waiting`
    /// - [`RegistryError::RoomFull`] — no free slot
    pub fn join_room(
        &mut self,
        room_id: &RoomId,
        player: PlayerIdentity,
    ) -> Result<&Room, RegistryError> {
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RegistryError::NotFound(room_id.clone()))?;

        if room.status != RoomStatus::Waiting {
            return Err(RegistryError::AlreadyStarted(room_id.clone()));
        }
        if room.is_full() {
            return Err(RegistryError::RoomFull(room_id.clone()));
        }

        let player_id = player.id.clone();
        room.players_mut().push(player.into_player());
        tracing::info!(
            %room_id,
            %player_id,
            players = room.player_count(),
            "player joined"
        );
        Ok(&*room)
    }

    /// Removes a player unconditionally; deletes the room if it becomes
    /// empty. This is the single disposal path for rooms — there is no
    /// separate garbage collector. No-op if the room or player is absent.
    pub fn leave_room(&mut self, room_id: &RoomId, player_id: &PlayerId) {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };

        room.players_mut().retain(|p| &p.id != player_id);
        tracing::info!(%room_id, %player_id, players = room.player_count(), "player left");

        if room.is_empty() {
            self.rooms.remove(room_id);
            tracing::info!(%room_id, "room deleted (empty)");
        }
    }

    /// Quick-match placement: the first waiting room with spare
    /// capacity whose mode, duration, and case mode match exactly —
    /// first hit in registry iteration order, no ranking. Falls back to
    /// creating a fresh quick-match room with the requester as sole
    /// occupant.
    pub fn quick_match(
        &mut self,
        config: GameConfig,
        player: PlayerIdentity,
    ) -> Result<&Room, RegistryError> {
        let candidate = self
            .rooms
            .values()
            .find(|room| {
                room.status == RoomStatus::Waiting
                    && !room.is_full()
                    && room.game_config.matches(&config)
            })
            .map(|room| room.id.clone());

        match candidate {
            Some(room_id) => {
                tracing::info!(%room_id, player_id = %player.id, "quick match joined existing room");
                self.join_room(&room_id, player)
            }
            None => Ok(self.create_room(
                QUICK_MATCH_ROOM_NAME.to_string(),
                config,
                player,
            )),
        }
    }

    // -----------------------------------------------------------------
    // Readiness and rounds
    // -----------------------------------------------------------------

    /// Sets a player's ready flag. Returns `false` if the room or
    /// player is missing.
    pub fn set_player_ready(
        &mut self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_ready: bool,
    ) -> bool {
        let Some(player) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.player_mut(player_id))
        else {
            return false;
        };
        player.is_ready = is_ready;
        true
    }

    /// `true` only if the room exists, has at least one player, and
    /// every member is ready.
    pub fn all_players_ready(&self, room_id: &RoomId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(Room::all_players_ready)
    }

    /// Starts a round: generates the shared char sequence (sized at
    /// three keystrokes per configured second), stamps start/end times,
    /// bumps the round counter, and resets every player's per-round
    /// stats. No-op returning `None` if the room is absent or already
    /// `playing` — ready flags stay set for the whole round, so without
    /// this guard a redundant ready toggle mid-round would regenerate
    /// the frozen sequence and wipe everyone's progress.
    ///
    /// Deliberately does not require `waiting` status — a `finished`
    /// room re-arms directly into the next round when everyone readies
    /// up again.
    pub fn start_game(&mut self, room_id: &RoomId) -> Option<&Room> {
        let room = self.rooms.get_mut(room_id)?;
        if room.status == RoomStatus::Playing {
            return None;
        }

        let count = charset::sequence_len(room.game_config.duration);
        room.char_sequence = charset::generate_sequence(&room.game_config, count);

        let start = now_millis();
        room.status = RoomStatus::Playing;
        room.start_time = Some(start);
        room.end_time = Some(start + room.game_config.duration * 1000);
        room.round += 1;

        for player in room.players_mut() {
            player.score = 0;
            player.errors = 0;
            player.current_index = 0;
        }

        tracing::info!(
            %room_id,
            round = room.round,
            chars = room.char_sequence.len(),
            "game started"
        );
        Some(&*room)
    }

    /// Ends a round: marks the room `finished` and clears every ready
    /// flag so the next all-ready edge can loop the room. No-op
    /// returning `None` if the room is absent.
    pub fn end_game(&mut self, room_id: &RoomId) -> Option<&Room> {
        let room = self.rooms.get_mut(room_id)?;

        room.status = RoomStatus::Finished;
        for player in room.players_mut() {
            player.is_ready = false;
        }

        tracing::info!(%room_id, round = room.round, "game ended");
        Some(&*room)
    }

    /// Applies one keystroke of progress. Correct input advances score
    /// and position; incorrect input only counts an error, so positions
    /// never move backwards and never advance on a miss. Returns
    /// `false` (no state change) unless the room is `playing` and the
    /// player exists.
    pub fn update_player_progress(
        &mut self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_correct: bool,
    ) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if room.status != RoomStatus::Playing {
            return false;
        }
        let Some(player) = room.player_mut(player_id) else {
            return false;
        };

        if is_correct {
            player.score += 1;
            player.current_index += 1;
        } else {
            player.errors += 1;
        }
        true
    }

    // -----------------------------------------------------------------
    // Connection state
    // -----------------------------------------------------------------

    /// Updates a player's connected flag only — never removes them.
    pub fn set_player_connection(
        &mut self,
        room_id: &RoomId,
        player_id: &PlayerId,
        is_connected: bool,
    ) {
        if let Some(player) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.player_mut(player_id))
        {
            player.is_connected = is_connected;
        }
    }

    /// Points a player at a new transport connection after a resume.
    pub fn rebind_player_socket(
        &mut self,
        room_id: &RoomId,
        player_id: &PlayerId,
        socket_id: &str,
    ) {
        if let Some(player) = self
            .rooms
            .get_mut(room_id)
            .and_then(|room| room.player_mut(player_id))
        {
            player.socket_id = socket_id.to_string();
        }
    }

    // -----------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------

    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// The lobby projection: every `waiting` room, arbitrary order.
    pub fn waiting_rooms(&self) -> Vec<RoomSummary> {
        self.rooms
            .values()
            .filter(|room| room.status == RoomStatus::Waiting)
            .map(Room::summary)
            .collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn generate_room_id(&self) -> RoomId {
        let mut rng = rand::rng();
        loop {
            let id: String = (0..ROOM_ID_LEN)
                .map(|_| rng.sample(rand::distr::Alphanumeric) as char)
                .collect::<String>()
                .to_uppercase();
            let id = RoomId(id);
            if !self.rooms.contains_key(&id) {
                return id;
            }
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch. Clients compare the
/// broadcast `start_time` against their own clocks, so this is wall
/// time on purpose, not a monotonic instant.
fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrace_protocol::CaseMode;

    fn identity(id: &str) -> PlayerIdentity {
        PlayerIdentity {
            id: PlayerId(id.into()),
            socket_id: format!("conn-{id}"),
            name: id.into(),
            avatar: None,
        }
    }

    fn config() -> GameConfig {
        GameConfig {
            mode: keyrace_protocol::GameMode::English,
            duration: 60,
            case_mode: CaseMode::Lowercase,
            active_rows: None,
            hand_mode: None,
        }
    }

    #[test]
    fn test_create_room_generates_short_uppercase_id() {
        let mut registry = RoomRegistry::new();
        let room = registry.create_room("test".into(), config(), identity("a"));

        assert_eq!(room.id.as_str().len(), ROOM_ID_LEN);
        assert!(room
            .id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_join_missing_room_returns_not_found() {
        let mut registry = RoomRegistry::new();
        let result = registry.join_room(&RoomId("NOPE".into()), identity("a"));
        assert!(matches!(result, Err(RegistryError::NotFound(_))));
    }

    #[test]
    fn test_start_game_stamps_times_and_round() {
        let mut registry = RoomRegistry::new();
        let room_id = registry
            .create_room("test".into(), config(), identity("a"))
            .id
            .clone();

        let room = registry.start_game(&room_id).expect("room exists");

        assert_eq!(room.status, RoomStatus::Playing);
        assert_eq!(room.round, 1);
        let start = room.start_time.expect("stamped");
        let end = room.end_time.expect("stamped");
        assert_eq!(end - start, 60_000);
    }

    #[test]
    fn test_start_game_missing_room_is_noop() {
        let mut registry = RoomRegistry::new();
        assert!(registry.start_game(&RoomId("NOPE".into())).is_none());
    }

    #[test]
    fn test_end_game_missing_room_is_noop() {
        let mut registry = RoomRegistry::new();
        assert!(registry.end_game(&RoomId("NOPE".into())).is_none());
    }

    #[test]
    fn test_set_player_connection_never_removes_player() {
        let mut registry = RoomRegistry::new();
        let room_id = registry
            .create_room("test".into(), config(), identity("a"))
            .id
            .clone();

        registry.set_player_connection(&room_id, &PlayerId("a".into()), false);

        let room = registry.room(&room_id).expect("room still exists");
        assert_eq!(room.player_count(), 1);
        assert!(!room.player(&PlayerId("a".into())).unwrap().is_connected);
    }

    #[test]
    fn test_rebind_player_socket_updates_socket_id() {
        let mut registry = RoomRegistry::new();
        let room_id = registry
            .create_room("test".into(), config(), identity("a"))
            .id
            .clone();

        registry.rebind_player_socket(&room_id, &PlayerId("a".into()), "conn-99");

        let room = registry.room(&room_id).unwrap();
        assert_eq!(room.player(&PlayerId("a".into())).unwrap().socket_id, "conn-99");
    }
}
