//! Battle state definitions and structures
//!
//! Contains the per-kingdom ledger, all entity records (arrows, minions,
//! pickups, upgrade cards) and the outbox queues drained by the broadcast
//! layer. Pure data plus small invariant-preserving helpers; the systems
//! modules hold the behavior.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::game::constants::{card, combo, dragon, economy, shot, unit, world};
use crate::util::vec2::Vec2;

/// Entity identifier, unique and monotonic within a room
pub type EntityId = u64;

/// One of the two kingdoms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    #[inline]
    pub fn enemy(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// +1 advancing rightward, -1 advancing leftward
    #[inline]
    pub fn forward_sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }

    /// This side's own tower x
    #[inline]
    pub fn tower_x(self) -> f32 {
        match self {
            Side::Left => world::TOWER_X_LEFT,
            Side::Right => world::TOWER_X_RIGHT,
        }
    }
}

/// A value held once per side, indexed by the [`Side`] enum.
///
/// Replaces string-keyed side lookup: both halves always exist and the
/// compiler enforces that symmetric updates touch real fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SidePair<T> {
    pub left: T,
    pub right: T,
}

impl<T> SidePair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    #[inline]
    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    /// Apply a mutation to both halves
    pub fn for_each_mut(&mut self, mut f: impl FnMut(Side, &mut T)) {
        f(Side::Left, &mut self.left);
        f(Side::Right, &mut self.right);
    }
}

/// Upgrade families offered on cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradeKind {
    Arrow,
    Unit,
    MultiShot,
    Volley,
    Spawn,
    UnitHp,
    Resource,
    Bounty,
    Explosive,
    Power,
    Dragon,
    SuperMinion,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 12] = [
        UpgradeKind::Arrow,
        UpgradeKind::Unit,
        UpgradeKind::MultiShot,
        UpgradeKind::Volley,
        UpgradeKind::Spawn,
        UpgradeKind::UnitHp,
        UpgradeKind::Resource,
        UpgradeKind::Bounty,
        UpgradeKind::Explosive,
        UpgradeKind::Power,
        UpgradeKind::Dragon,
        UpgradeKind::SuperMinion,
    ];

    /// (base, growth) of the charge-ceiling cost curve for this family
    fn cost_curve(self) -> (f32, f32) {
        match self {
            UpgradeKind::Arrow => (120.0, 45.0),
            UpgradeKind::Unit => (120.0, 45.0),
            UpgradeKind::MultiShot => (160.0, 70.0),
            UpgradeKind::Volley => (170.0, 80.0),
            UpgradeKind::Spawn => (130.0, 50.0),
            UpgradeKind::UnitHp => (120.0, 40.0),
            UpgradeKind::Resource => (110.0, 35.0),
            UpgradeKind::Bounty => (110.0, 35.0),
            UpgradeKind::Explosive => (125.0, 45.0),
            UpgradeKind::Power => (140.0, 55.0),
            UpgradeKind::Dragon => (210.0, 120.0),
            UpgradeKind::SuperMinion => (190.0, 100.0),
        }
    }

    /// Charge ceiling after this family reaches `level`
    pub fn cost_at(self, level: u32) -> f32 {
        let (base, growth) = self.cost_curve();
        base + growth * level as f32
    }
}

/// Per-side upgrade level counters. Dragon, super and volley start locked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeLevels {
    pub arrow: u32,
    pub unit: u32,
    pub multi_shot: u32,
    pub volley: u32,
    pub spawn: u32,
    pub unit_hp: u32,
    pub resource: u32,
    pub bounty: u32,
    pub explosive: u32,
    pub power: u32,
    pub dragon: u32,
    pub super_minion: u32,
}

impl Default for UpgradeLevels {
    fn default() -> Self {
        Self {
            arrow: 1,
            unit: 1,
            multi_shot: 1,
            volley: 0,
            spawn: 1,
            unit_hp: 1,
            resource: 1,
            bounty: 1,
            explosive: 1,
            power: 1,
            dragon: 0,
            super_minion: 0,
        }
    }
}

impl UpgradeLevels {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Arrow => self.arrow,
            UpgradeKind::Unit => self.unit,
            UpgradeKind::MultiShot => self.multi_shot,
            UpgradeKind::Volley => self.volley,
            UpgradeKind::Spawn => self.spawn,
            UpgradeKind::UnitHp => self.unit_hp,
            UpgradeKind::Resource => self.resource,
            UpgradeKind::Bounty => self.bounty,
            UpgradeKind::Explosive => self.explosive,
            UpgradeKind::Power => self.power,
            UpgradeKind::Dragon => self.dragon,
            UpgradeKind::SuperMinion => self.super_minion,
        }
    }

    pub fn raise(&mut self, kind: UpgradeKind) -> u32 {
        let slot = match kind {
            UpgradeKind::Arrow => &mut self.arrow,
            UpgradeKind::Unit => &mut self.unit,
            UpgradeKind::MultiShot => &mut self.multi_shot,
            UpgradeKind::Volley => &mut self.volley,
            UpgradeKind::Spawn => &mut self.spawn,
            UpgradeKind::UnitHp => &mut self.unit_hp,
            UpgradeKind::Resource => &mut self.resource,
            UpgradeKind::Bounty => &mut self.bounty,
            UpgradeKind::Explosive => &mut self.explosive,
            UpgradeKind::Power => &mut self.power,
            UpgradeKind::Dragon => &mut self.dragon,
            UpgradeKind::SuperMinion => &mut self.super_minion,
        };
        *slot += 1;
        *slot
    }
}

/// Temporary buffs granted by shot-power pickups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShotPowerKind {
    MultiShot,
    UltraShot,
    PierceShot,
    HeavyShot,
}

impl ShotPowerKind {
    pub const ALL: [ShotPowerKind; 4] = [
        ShotPowerKind::MultiShot,
        ShotPowerKind::UltraShot,
        ShotPowerKind::PierceShot,
        ShotPowerKind::HeavyShot,
    ];
}

/// Per-kingdom mutable ledger: tower, gold, levels, cooldowns, combo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideState {
    pub tower_hp: f32,
    pub gold: f32,
    pub economy_level: u32,
    pub next_eco_cost: f32,
    pub upgrades: UpgradeLevels,
    /// Debt-style progress bar; accumulates unbounded, claimed cards
    /// subtract the old ceiling so overflow carries forward
    pub upgrade_charge: f32,
    pub upgrade_charge_max: f32,
    /// Deadline after which a ready upgrade is picked at random
    pub upgrade_auto_pick_at: Option<f32>,
    /// Aim vector, unit-circle clamped and side-signed
    pub pull: Vec2,
    pub shot_cd: f32,
    pub minion_cd: f32,
    pub pending_shot_power: Option<ShotPowerKind>,
    pub pending_shot_power_shots: u32,
    pub spawn_count: u64,
    /// Main arrows only
    pub arrows_fired: u64,
    pub arrow_hits: u64,
    /// Consecutive main-arrow hits, saturating in [0, 10]
    pub combo_streak: u32,
    pub tower_damaged_once: bool,
    pub tower_hero_rescue_used: bool,
}

impl SideState {
    pub fn new(side: Side) -> Self {
        Self {
            tower_hp: economy::TOWER_HP,
            gold: 0.0,
            economy_level: 0,
            next_eco_cost: economy::ECO_COST_BASE,
            upgrades: UpgradeLevels::default(),
            upgrade_charge: 0.0,
            upgrade_charge_max: economy::CHARGE_MAX_BASE,
            upgrade_auto_pick_at: None,
            pull: Vec2::new(-0.8 * side.forward_sign(), 0.0),
            shot_cd: shot::INTERVAL,
            minion_cd: 0.0,
            pending_shot_power: None,
            pending_shot_power_shots: 0,
            spawn_count: 0,
            arrows_fired: 0,
            arrow_hits: 0,
            combo_streak: 0,
            tower_damaged_once: false,
            tower_hero_rescue_used: false,
        }
    }

    /// Combo damage tier: x1 / x2 / x3 / x4
    pub fn combo_tier(&self) -> u32 {
        if self.combo_streak >= combo::TIER4_AT {
            4
        } else if self.combo_streak >= combo::TIER3_AT {
            3
        } else if self.combo_streak >= combo::TIER2_AT {
            2
        } else {
            1
        }
    }

    pub fn combo_multiplier(&self) -> f32 {
        self.combo_tier() as f32
    }

    pub fn register_main_hit(&mut self) {
        self.arrow_hits += 1;
        self.combo_streak = (self.combo_streak + 1).min(combo::MAX_STREAK);
    }

    pub fn register_main_miss(&mut self) {
        self.combo_streak = self.combo_streak.saturating_sub(1);
    }

    pub fn stat_arrow_damage(&self) -> f32 {
        20.0 + self.upgrades.arrow as f32 * 8.0
    }

    /// Arrows per volley (before power-shot bonuses)
    pub fn stat_arrow_count(&self) -> u32 {
        1 + self.upgrades.multi_shot.saturating_sub(1) / 2 + self.upgrades.volley
    }

    pub fn stat_minion_damage(&self) -> f32 {
        unit::DMG_BASE
            + self.upgrades.unit as f32 * unit::DMG_PER_UNIT_LEVEL
            + self.economy_level as f32 * unit::DMG_PER_ECO
    }

    pub fn stat_minion_hp(&self) -> f32 {
        unit::HP_BASE
            + self.upgrades.unit_hp as f32 * unit::HP_PER_HP_LEVEL
            + self.economy_level as f32 * unit::HP_PER_ECO
    }

    pub fn stat_minion_speed(&self) -> f32 {
        unit::SPEED_BASE
            + self.upgrades.unit as f32 * unit::SPEED_PER_UNIT_LEVEL
            + self.economy_level as f32 * unit::SPEED_PER_ECO
    }

    pub fn stat_spawn_every(&self) -> f32 {
        (unit::SPAWN_BASE - self.upgrades.spawn as f32 * unit::SPAWN_PER_LEVEL)
            .max(unit::SPAWN_FLOOR)
    }

    /// Power-shot strength scaling from the power upgrade
    pub fn power_scale(&self) -> f32 {
        1.0 + self.upgrades.power.saturating_sub(1) as f32 * 0.18
    }

    pub fn upgrade_ready(&self) -> bool {
        self.upgrade_charge >= self.upgrade_charge_max
    }
}

/// Minion archetype with archetype-specific sub-state.
///
/// A tagged variant per behavior keeps adding an archetype localized to one
/// arm instead of another boolean flag on every minion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Archetype {
    Militia,
    Gunner {
        range: f32,
        dragon_mul: f32,
    },
    Rider {
        traveled: f32,
        charge_ready: bool,
    },
    Digger {
        dig_phase: f32,
    },
    Monk {
        heal_scale: f32,
        heal_cd: f32,
    },
    Hero {
        retreating: bool,
    },
    President {
        aura_radius: f32,
    },
    Dragon {
        fly_base_y: f32,
        fly_phase: f32,
    },
    Necromancer,
    Bomber {
        level: u32,
    },
}

/// Why a minion died; consumed by the deferred death-resolution pass
#[derive(Debug, Clone, Copy)]
pub struct KillCredit {
    /// Side that gets the bounty (None for uncredited deaths)
    pub by: Option<Side>,
    /// Bounty scalar (explosion/splash chains pay less)
    pub gold_scalar: f32,
    /// Set when an arrow landed the killing blow; arms bomber blasts
    pub arrow_damage: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Minion {
    pub id: EntityId,
    pub side: Side,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub dmg: f32,
    pub speed: f32,
    pub atk_cd: f32,
    pub radius: f32,
    /// Raised by a necromancer rather than trained
    pub summoned: bool,
    /// Super-scale variant of its archetype
    pub super_unit: bool,
    /// Cumulative arrow hits (hero kill gate)
    pub arrow_hits_taken: u32,
    pub archetype: Archetype,
    #[serde(skip)]
    pub kill: Option<KillCredit>,
}

impl Minion {
    #[inline]
    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn is_flying(&self) -> bool {
        matches!(self.archetype, Archetype::Dragon { .. })
    }

    pub fn is_dragon(&self) -> bool {
        matches!(self.archetype, Archetype::Dragon { .. })
    }

    /// Monks and presidents support, they never attack
    pub fn is_support(&self) -> bool {
        matches!(
            self.archetype,
            Archetype::Monk { .. } | Archetype::President { .. }
        )
    }

    /// Dragon weak point: a small off-center hitbox that amplifies arrow
    /// damage when struck directly
    pub fn heart_core(&self) -> Option<(Vec2, f32)> {
        if !self.is_dragon() {
            return None;
        }
        let dir = self.side.forward_sign();
        let center = Vec2::new(
            self.pos.x + dir * self.radius * dragon::HEART_OFFSET_X,
            self.pos.y + self.radius * dragon::HEART_OFFSET_Y,
        );
        let radius = (self.radius * dragon::HEART_RADIUS_FRACTION).max(dragon::HEART_RADIUS_MIN);
        Some((center, radius))
    }

    /// Mark this minion as killed, recording who gets the bounty.
    /// First credit wins; a corpse cannot be re-killed.
    pub fn mark_killed(&mut self, credit: KillCredit) {
        if self.kill.is_none() {
            self.kill = Some(credit);
        }
        self.hp = 0.0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arrow {
    pub id: EntityId,
    pub side: Side,
    pub pos: Vec2,
    pub vel: Vec2,
    pub gravity: f32,
    pub dmg: f32,
    pub radius: f32,
    /// Remaining pass-through charges
    pub pierce: u32,
    pub ttl: f32,
    pub power: Option<ShotPowerKind>,
    /// Center shot of the volley; the only one that counts for combo/stats
    pub main: bool,
    /// Ensures a main arrow is attributed at most once
    pub combo_counted: bool,
    /// Minions already pierced; a pass-through never rehits the same target
    #[serde(skip)]
    pub hit_ids: SmallVec<[EntityId; 4]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourcePickup {
    pub id: EntityId,
    pub pos: Vec2,
    pub radius: f32,
    pub value: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotPowerPickup {
    pub id: EntityId,
    /// Only this side's arrows can catch it
    pub side: Side,
    pub pos: Vec2,
    pub radius: f32,
    pub kind: ShotPowerKind,
    /// Falls toward the ground and despawns there
    pub fall_speed: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpgradeCard {
    pub id: EntityId,
    pub side: Side,
    pub slot: usize,
    pub kind: UpgradeKind,
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
}

impl UpgradeCard {
    /// Fixed screen position for a side's card slot
    pub fn slot_pos(side: Side, slot: usize) -> Vec2 {
        let x = card::SLOT_X[slot.min(card::SLOTS - 1)];
        let x = match side {
            Side::Left => x,
            Side::Right => world::mirrored_x(x),
        };
        Vec2::new(x, card::Y)
    }

    pub fn contains(&self, point: Vec2, pad: f32) -> bool {
        point.x >= self.pos.x - self.width / 2.0 - pad
            && point.x <= self.pos.x + self.width / 2.0 + pad
            && point.y >= self.pos.y - self.height / 2.0 - pad
            && point.y <= self.pos.y + self.height / 2.0 + pad
    }
}

/// Sfx cue kinds for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SfxKind {
    Minion,
    Dragon,
    Dragonfire,
    Gunhit,
    Resource,
    Powerup,
    Upgrade,
    Explosion,
    Heal,
    Slash,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SfxEvent {
    pub kind: SfxKind,
    pub x: f32,
    pub y: f32,
    pub side: Option<Side>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DamageEvent {
    pub amount: u32,
    pub x: f32,
    pub y: f32,
    pub side: Side,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineEvent {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub side: Side,
}

/// Append-only side-effect queues, drained by the broadcast layer after the
/// tick. Never a hidden shared buffer: the room owns it, callers take it.
#[derive(Debug, Default)]
pub struct Outbox {
    sfx: Vec<SfxEvent>,
    damage: Vec<DamageEvent>,
    lines: Vec<LineEvent>,
}

impl Outbox {
    pub fn sfx(&mut self, kind: SfxKind, x: f32, y: f32, side: Option<Side>) {
        self.sfx.push(SfxEvent { kind, x, y, side });
    }

    pub fn damage(&mut self, amount: f32, x: f32, y: f32, side: Side) {
        self.damage.push(DamageEvent {
            amount: amount.round().max(0.0) as u32,
            x,
            y,
            side,
        });
    }

    pub fn line(&mut self, text: &str, x: f32, y: f32, side: Side) {
        self.lines.push(LineEvent {
            text: text.to_string(),
            x,
            y,
            side,
        });
    }

    pub fn drain_sfx(&mut self) -> Vec<SfxEvent> {
        std::mem::take(&mut self.sfx)
    }

    pub fn drain_damage(&mut self) -> Vec<DamageEvent> {
        std::mem::take(&mut self.damage)
    }

    pub fn drain_lines(&mut self) -> Vec<LineEvent> {
        std::mem::take(&mut self.lines)
    }
}

/// Complete mutable state of one match. Owned exclusively by the room;
/// everything leaving this struct goes through a snapshot copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleState {
    pub t: f32,
    pub sides: SidePair<SideState>,
    pub arrows: Vec<Arrow>,
    pub minions: Vec<Minion>,
    pub resources: Vec<ResourcePickup>,
    pub shot_powers: Vec<ShotPowerPickup>,
    pub cards: Vec<UpgradeCard>,
    pub next_resource_at: f32,
    pub next_power_at: f32,
    pub game_over: bool,
    pub winner: Option<Side>,
    next_entity_id: EntityId,
}

impl Default for BattleState {
    fn default() -> Self {
        Self::new()
    }
}

impl BattleState {
    pub fn new() -> Self {
        use crate::game::constants::pickup;
        Self {
            t: 0.0,
            sides: SidePair::new(SideState::new(Side::Left), SideState::new(Side::Right)),
            arrows: Vec::new(),
            minions: Vec::new(),
            resources: Vec::new(),
            shot_powers: Vec::new(),
            cards: Vec::new(),
            next_resource_at: pickup::FIRST_RESOURCE_AT,
            next_power_at: pickup::FIRST_POWER_AT,
            game_over: false,
            winner: None,
            next_entity_id: 1,
        }
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Clamp an aim pull into the side's legal quarter-disc and store it.
    /// Non-finite input is defaulted, magnitude above 1 is renormalized.
    /// Safe to call at any point between ticks; last write wins.
    pub fn set_aim_pull(&mut self, side: Side, x: f32, y: f32) {
        if self.game_over {
            return;
        }
        let pull = normalize_pull(side, x, y);
        self.sides.get_mut(side).pull = pull;
    }

    pub fn cards_for_side(&self, side: Side) -> SmallVec<[&UpgradeCard; 2]> {
        self.cards.iter().filter(|c| c.side == side).collect()
    }

    pub fn has_card_in_slot(&self, side: Side, slot: usize) -> bool {
        self.cards.iter().any(|c| c.side == side && c.slot == slot)
    }

    pub fn clear_cards_for(&mut self, side: Side) {
        self.cards.retain(|c| c.side != side);
    }
}

/// Clamp a raw pull vector to the side's forward half-plane, upward arc and
/// the unit circle. Defensive: bad client values become safe ones.
pub fn normalize_pull(side: Side, x: f32, y: f32) -> Vec2 {
    let mut nx = if x.is_finite() { x } else { 0.0 };
    let mut ny = if y.is_finite() { y } else { 0.0 };

    match side {
        Side::Left => nx = nx.min(0.0),
        Side::Right => nx = nx.max(0.0),
    }
    ny = ny.min(0.0);

    let mag = (nx * nx + ny * ny).sqrt();
    if mag > 1.0 {
        nx /= mag;
        ny /= mag;
    }
    Vec2::new(nx, ny)
}
