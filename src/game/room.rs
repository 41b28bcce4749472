//! One match: two player slots, the battle state, the outbox.
//!
//! The room owns all mutable state for a match and advances it with a
//! synchronous, bounded `tick`. Aim-pull writes may land between ticks
//! (last write wins); everything leaving the room is either a snapshot
//! clone or a drained outbox queue.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::state::{
    BattleState, DamageEvent, LineEvent, Outbox, SfxEvent, Side, SidePair,
};
use crate::game::systems::{archery, ballistics, combat, economy, minion_ai};
use crate::game::constants::world;

pub type PlayerId = Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSlot {
    pub id: PlayerId,
    pub name: String,
}

/// Static battlefield geometry included with every snapshot so the
/// presentation layer never hardcodes it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WorldInfo {
    pub width: f32,
    pub height: f32,
    pub ground_y: f32,
    pub tower_y: f32,
}

impl Default for WorldInfo {
    fn default() -> Self {
        Self {
            width: world::WIDTH,
            height: world::HEIGHT,
            ground_y: world::GROUND_Y,
            tower_y: world::TOWER_Y,
        }
    }
}

/// Immutable copy of everything a client needs to draw a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub world: WorldInfo,
    pub players: SidePair<Option<String>>,
    pub started: bool,
    pub state: BattleState,
}

#[derive(Debug)]
pub struct GameRoom {
    pub code: String,
    state: BattleState,
    outbox: Outbox,
    players: SidePair<Option<PlayerSlot>>,
    started: bool,
}

impl GameRoom {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            state: BattleState::new(),
            outbox: Outbox::default(),
            players: SidePair::new(None, None),
            started: false,
        }
    }

    /// Seat a player in the first free slot. Left fills first; the battle
    /// starts once both slots are taken.
    pub fn add_player(&mut self, id: PlayerId, name: &str) -> Option<Side> {
        let side = if self.players.left.is_none() {
            Side::Left
        } else if self.players.right.is_none() {
            Side::Right
        } else {
            return None;
        };
        *self.players.get_mut(side) = Some(PlayerSlot {
            id,
            name: name.to_string(),
        });
        if self.players.left.is_some() && self.players.right.is_some() {
            self.started = true;
        }
        tracing::info!(room = %self.code, player = %id, ?side, "player seated");
        Some(side)
    }

    /// Free the slot held by this player. Returns true if a slot changed.
    /// The battle pauses until both seats are filled again.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        let mut changed = false;
        self.players.for_each_mut(|_, slot| {
            if matches!(slot, Some(p) if p.id == id) {
                *slot = None;
                changed = true;
            }
        });
        if changed {
            self.started = false;
            tracing::info!(room = %self.code, player = %id, "player left");
        }
        changed
    }

    pub fn is_empty(&self) -> bool {
        self.players.left.is_none() && self.players.right.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.players.left.is_some() && self.players.right.is_some()
    }

    pub fn side_of(&self, id: PlayerId) -> Option<Side> {
        for side in Side::BOTH {
            if matches!(self.players.get(side), Some(p) if p.id == id) {
                return Some(side);
            }
        }
        None
    }

    /// Store a player's aim vector, clamped to their legal arc.
    /// Safe between ticks; last write wins.
    pub fn set_aim_pull(&mut self, id: PlayerId, x: f32, y: f32) {
        if let Some(side) = self.side_of(id) {
            self.state.set_aim_pull(side, x, y);
        }
    }

    pub fn game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn winner(&self) -> Option<Side> {
        self.state.winner
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    /// Direct state access for scripted matches and tests
    pub fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }

    /// Advance the battle one step. A room that has not started, or has
    /// already ended, holds still.
    pub fn tick(&mut self, dt: f32) {
        if !self.started || self.state.game_over {
            return;
        }
        let state = &mut self.state;
        state.t += dt;

        archery::tick_archery(state, dt);
        minion_ai::tick_spawning(state, dt);
        economy::tick_pickup_spawns(state);
        ballistics::tick_shot_powers(state, dt);
        ballistics::tick_arrows(state, &mut self.outbox, dt);
        minion_ai::tick_minions(state, &mut self.outbox, dt);
        combat::resolve_deaths(state, &mut self.outbox);
        economy::process_economy(state, &mut self.outbox);

        self.check_win();
    }

    fn check_win(&mut self) {
        let left = self.state.sides.left.tower_hp;
        let right = self.state.sides.right.tower_hp;
        if left > 0.0 && right > 0.0 {
            return;
        }
        self.state.game_over = true;
        self.state.winner = if left > right {
            Some(Side::Left)
        } else if right > left {
            Some(Side::Right)
        } else {
            None
        };
        tracing::info!(room = %self.code, winner = ?self.state.winner, "battle over");
    }

    /// Immutable frame for broadcast
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            code: self.code.clone(),
            world: WorldInfo::default(),
            players: SidePair::new(
                self.players.left.as_ref().map(|p| p.name.clone()),
                self.players.right.as_ref().map(|p| p.name.clone()),
            ),
            started: self.started,
            state: self.state.clone(),
        }
    }

    /// Compact wire form of the snapshot
    pub fn encode_snapshot(&self) -> Result<Vec<u8>, bincode::error::EncodeError> {
        bincode::serde::encode_to_vec(self.snapshot(), bincode::config::standard())
    }

    /// Human-readable snapshot dump for debugging
    pub fn snapshot_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    pub fn consume_sfx_events(&mut self) -> Vec<SfxEvent> {
        self.outbox.drain_sfx()
    }

    pub fn consume_damage_events(&mut self) -> Vec<DamageEvent> {
        self.outbox.drain_damage()
    }

    pub fn consume_line_events(&mut self) -> Vec<LineEvent> {
        self.outbox.drain_lines()
    }
}
