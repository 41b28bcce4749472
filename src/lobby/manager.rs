//! Room registry: creation with short join codes, seat assignment, the
//! per-tick fan-out and the sweep that discards abandoned rooms.

use hashbrown::HashMap;
use parking_lot::RwLock;
use rand::Rng;
use thiserror::Error;
use uuid::Uuid;

use crate::game::room::{GameRoom, PlayerId, RoomSnapshot};
use crate::game::state::Side;

const CODE_LEN: usize = 4;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("room {0} not found")]
    RoomNotFound(String),
    #[error("room {0} is full")]
    RoomFull(String),
    #[error("server is at capacity")]
    AtCapacity,
}

/// All live rooms behind one lock. Ticks across rooms are independent, but
/// the registry itself is shared with the join/leave path, so a writer lock
/// guards both.
pub struct RoomManager {
    rooms: RwLock<HashMap<String, GameRoom>>,
    max_rooms: usize,
}

impl RoomManager {
    pub fn new(max_rooms: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            max_rooms,
        }
    }

    /// Create a room and seat its first player. Returns the join code.
    pub fn create_room(&self, player: PlayerId, name: &str) -> Result<String, JoinError> {
        let mut rooms = self.rooms.write();
        if rooms.len() >= self.max_rooms {
            return Err(JoinError::AtCapacity);
        }
        let code = loop {
            let candidate = random_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        let mut room = GameRoom::new(code.clone());
        room.add_player(player, name);
        rooms.insert(code.clone(), room);
        tracing::info!(room = %code, rooms = rooms.len(), "room created");
        Ok(code)
    }

    /// Seat a player in an existing room.
    pub fn join_room(&self, code: &str, player: PlayerId, name: &str) -> Result<Side, JoinError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(code)
            .ok_or_else(|| JoinError::RoomNotFound(code.to_string()))?;
        room.add_player(player, name)
            .ok_or_else(|| JoinError::RoomFull(code.to_string()))
    }

    /// Drop a disconnected player from whichever room holds them, discarding
    /// rooms that end up empty.
    pub fn remove_player(&self, player: PlayerId) {
        let mut rooms = self.rooms.write();
        let mut emptied: Vec<String> = Vec::new();
        for (code, room) in rooms.iter_mut() {
            if room.remove_player(player) && room.is_empty() {
                emptied.push(code.clone());
            }
        }
        for code in emptied {
            rooms.remove(&code);
            tracing::info!(room = %code, "empty room discarded");
        }
    }

    /// Route an aim update to the player's room.
    pub fn set_aim_pull(&self, code: &str, player: PlayerId, x: f32, y: f32) {
        let mut rooms = self.rooms.write();
        if let Some(room) = rooms.get_mut(code) {
            room.set_aim_pull(player, x, y);
        }
    }

    /// Advance every room by one step.
    pub fn tick_all(&self, dt: f32) {
        let mut rooms = self.rooms.write();
        for room in rooms.values_mut() {
            room.tick(dt);
        }
    }

    pub fn snapshot(&self, code: &str) -> Option<RoomSnapshot> {
        self.rooms.read().get(code).map(|r| r.snapshot())
    }

    /// Drain a room's outboxes, returning (sfx, damage, lines) counts for
    /// the broadcast layer's logging.
    pub fn drain_events(
        &self,
        code: &str,
    ) -> Option<(
        Vec<crate::game::state::SfxEvent>,
        Vec<crate::game::state::DamageEvent>,
        Vec<crate::game::state::LineEvent>,
    )> {
        let mut rooms = self.rooms.write();
        let room = rooms.get_mut(code)?;
        Some((
            room.consume_sfx_events(),
            room.consume_damage_events(),
            room.consume_line_events(),
        ))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }

    /// Run a closure against one room under the write lock.
    pub fn with_room<R>(&self, code: &str, f: impl FnOnce(&mut GameRoom) -> R) -> Option<R> {
        let mut rooms = self.rooms.write();
        rooms.get_mut(code).map(f)
    }
}

fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Fresh id for a connecting player
pub fn new_player_id() -> PlayerId {
    Uuid::new_v4()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = random_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_create_and_join() {
        let manager = RoomManager::new(10);
        let host = new_player_id();
        let guest = new_player_id();
        let code = manager.create_room(host, "ada").unwrap();
        assert_eq!(manager.room_count(), 1);
        assert_eq!(manager.join_room(&code, guest, "grace"), Ok(Side::Right));
    }

    #[test]
    fn test_join_missing_room() {
        let manager = RoomManager::new(10);
        let err = manager.join_room("ZZZZ", new_player_id(), "x").unwrap_err();
        assert_eq!(err, JoinError::RoomNotFound("ZZZZ".to_string()));
    }

    #[test]
    fn test_join_full_room() {
        let manager = RoomManager::new(10);
        let code = manager.create_room(new_player_id(), "a").unwrap();
        manager.join_room(&code, new_player_id(), "b").unwrap();
        let err = manager.join_room(&code, new_player_id(), "c").unwrap_err();
        assert_eq!(err, JoinError::RoomFull(code));
    }

    #[test]
    fn test_capacity_limit() {
        let manager = RoomManager::new(1);
        manager.create_room(new_player_id(), "a").unwrap();
        assert_eq!(
            manager.create_room(new_player_id(), "b").unwrap_err(),
            JoinError::AtCapacity
        );
    }

    #[test]
    fn test_disconnect_sweeps_empty_rooms() {
        let manager = RoomManager::new(10);
        let host = new_player_id();
        let code = manager.create_room(host, "a").unwrap();
        manager.remove_player(host);
        assert_eq!(manager.room_count(), 0);
        assert!(manager.snapshot(&code).is_none());
    }

    #[test]
    fn test_disconnect_keeps_occupied_rooms() {
        let manager = RoomManager::new(10);
        let host = new_player_id();
        let guest = new_player_id();
        let code = manager.create_room(host, "a").unwrap();
        manager.join_room(&code, guest, "b").unwrap();
        manager.remove_player(guest);
        assert_eq!(manager.room_count(), 1);
    }

    #[test]
    fn test_tick_all_advances_started_rooms() {
        let manager = RoomManager::new(10);
        let code = manager.create_room(new_player_id(), "a").unwrap();
        manager.join_room(&code, new_player_id(), "b").unwrap();
        manager.tick_all(1.0 / 30.0);
        let snap = manager.snapshot(&code).unwrap();
        assert!(snap.state.t > 0.0);
    }

    #[test]
    fn test_tick_all_from_async_context() {
        tokio_test::block_on(async {
            let manager = RoomManager::new(10);
            let code = manager.create_room(new_player_id(), "a").unwrap();
            manager.join_room(&code, new_player_id(), "b").unwrap();
            for _ in 0..30 {
                manager.tick_all(1.0 / 30.0);
                tokio::task::yield_now().await;
            }
            let snap = manager.snapshot(&code).unwrap();
            assert!((snap.state.t - 1.0).abs() < 1e-3);
        });
    }
}
