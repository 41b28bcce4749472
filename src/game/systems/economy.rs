//! Gold, economy tiers, pickup spawning and the upgrade-card loop.
//!
//! Gold feeds two meters at once: the spendable balance that auto-buys
//! economy tiers, and the upgrade charge that surfaces claimable cards.
//! The charge accumulates unbounded; claiming subtracts the old ceiling so
//! overflow carries toward the next card, and each family's ceiling rises
//! with its level.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::game::constants::{card, economy, pickup, world};
use crate::game::state::{
    BattleState, Outbox, ResourcePickup, SfxKind, ShotPowerKind, ShotPowerPickup, Side, SideState,
    UpgradeCard, UpgradeKind,
};
use crate::game::systems::minion_ai;
use crate::util::vec2::Vec2;

/// Credit gold to a side; every coin also charges the upgrade meter.
pub fn award_gold(ledger: &mut SideState, amount: f32) {
    ledger.gold += amount;
    ledger.upgrade_charge += amount;
}

/// Bounty for a kill, scaled by the bounty level and the chain scalar.
pub fn award_kill_gold(ledger: &mut SideState, gold_scalar: f32) {
    let bounty_mul =
        1.0 + economy::BOUNTY_PER_LEVEL * ledger.upgrades.bounty.saturating_sub(1) as f32;
    let amount = (economy::KILL_GOLD_BASE * gold_scalar * bounty_mul).floor();
    award_gold(ledger, amount);
}

/// Gold for a shot-down resource pickup, scaled by the resource level.
pub fn award_resource_gold(ledger: &mut SideState, value: f32) {
    let resource_mul =
        1.0 + economy::RESOURCE_PER_LEVEL * ledger.upgrades.resource.saturating_sub(1) as f32;
    award_gold(ledger, (value * resource_mul).floor());
}

/// Per-tick economy pass: auto-buy eco tiers, keep the card slots in sync
/// with the charge meter, fire the auto-pick deadline.
pub fn process_economy(state: &mut BattleState, outbox: &mut Outbox) {
    state.sides.for_each_mut(|_, ledger| level_economy(ledger));
    sync_upgrade_cards(state);
    auto_pick(state, outbox);
}

/// Spend gold on economy tiers while the rising threshold is met.
fn level_economy(ledger: &mut SideState) {
    while ledger.gold >= ledger.next_eco_cost {
        ledger.gold -= ledger.next_eco_cost;
        ledger.economy_level += 1;
        ledger.next_eco_cost =
            (ledger.next_eco_cost * economy::ECO_GROWTH + economy::ECO_STEP).floor();
    }
}

/// Cards exist exactly while the charge is ready: fill empty slots with
/// distinct random families (arming the auto-pick deadline once), clear
/// them the moment the meter dips below the ceiling.
fn sync_upgrade_cards(state: &mut BattleState) {
    let t = state.t;
    for side in Side::BOTH {
        if state.sides.get(side).upgrade_ready() {
            if state.sides.get(side).upgrade_auto_pick_at.is_none() {
                state.sides.get_mut(side).upgrade_auto_pick_at =
                    Some(t + economy::AUTO_PICK_AFTER);
            }
            for slot in 0..card::SLOTS {
                if !state.has_card_in_slot(side, slot) {
                    deal_card(state, side, slot);
                }
            }
        } else if state.has_card_in_slot(side, 0) || state.has_card_in_slot(side, 1) {
            state.clear_cards_for(side);
            state.sides.get_mut(side).upgrade_auto_pick_at = None;
        } else {
            state.sides.get_mut(side).upgrade_auto_pick_at = None;
        }
    }
}

fn deal_card(state: &mut BattleState, side: Side, slot: usize) {
    let taken: Vec<UpgradeKind> = state
        .cards
        .iter()
        .filter(|c| c.side == side)
        .map(|c| c.kind)
        .collect();
    let pool: Vec<UpgradeKind> = UpgradeKind::ALL
        .iter()
        .copied()
        .filter(|k| !taken.contains(k))
        .collect();
    let Some(&kind) = pool.choose(&mut rand::thread_rng()) else {
        return;
    };
    let id = state.next_entity_id();
    state.cards.push(UpgradeCard {
        id,
        side,
        slot,
        kind,
        pos: UpgradeCard::slot_pos(side, slot),
        width: card::WIDTH,
        height: card::HEIGHT,
    });
}

/// Left unclaimed past the deadline, a random dealt card is taken.
fn auto_pick(state: &mut BattleState, outbox: &mut Outbox) {
    for side in Side::BOTH {
        let ledger = state.sides.get(side);
        let due = matches!(ledger.upgrade_auto_pick_at, Some(at) if state.t >= at);
        if !due || !ledger.upgrade_ready() {
            continue;
        }
        let kinds: Vec<UpgradeKind> = state
            .cards
            .iter()
            .filter(|c| c.side == side)
            .map(|c| c.kind)
            .collect();
        if let Some(&kind) = kinds.choose(&mut rand::thread_rng()) {
            claim_upgrade(state, side, kind, outbox);
        }
    }
}

/// Claim an upgrade for a side: raise the level, carry charge overflow,
/// raise the ceiling to the family's next cost and fire the activation
/// effect (instant summon or an immediate shot/spawn window).
pub fn claim_upgrade(state: &mut BattleState, side: Side, kind: UpgradeKind, outbox: &mut Outbox) {
    let ledger = state.sides.get_mut(side);
    if !ledger.upgrade_ready() {
        return;
    }

    let old_max = ledger.upgrade_charge_max;
    ledger.upgrade_charge -= old_max;
    let new_level = ledger.upgrades.raise(kind);
    ledger.upgrade_charge_max = kind.cost_at(new_level);
    ledger.upgrade_auto_pick_at = None;

    match kind {
        UpgradeKind::Dragon => {
            ledger.minion_cd = 0.1;
            minion_ai::spawn_dragon(state, side);
        }
        UpgradeKind::SuperMinion => {
            ledger.minion_cd = 0.1;
            minion_ai::spawn_super(state, side);
        }
        UpgradeKind::Spawn => {
            ledger.minion_cd = 0.1;
        }
        UpgradeKind::Arrow | UpgradeKind::MultiShot | UpgradeKind::Volley | UpgradeKind::Power => {
            // the shot cooldown is lockstep, the shave has to land on both sides
            state.sides.for_each_mut(|_, s| s.shot_cd = 0.1);
        }
        _ => {}
    }

    state.clear_cards_for(side);
    let pos = UpgradeCard::slot_pos(side, 0);
    outbox.sfx(SfxKind::Upgrade, pos.x, pos.y, Some(side));
}

/// Spawn mirrored pickup pairs on their independent escalating timers.
pub fn tick_pickup_spawns(state: &mut BattleState) {
    let t = state.t;
    let mut rng = rand::thread_rng();

    if t >= state.next_resource_at {
        let x = pickup::SPAWN_X_MIN + rng.gen::<f32>() * pickup::SPAWN_X_SPAN;
        let y = pickup::RESOURCE_Y_MIN + rng.gen::<f32>() * pickup::RESOURCE_Y_SPAN;
        let value = pickup::RESOURCE_VALUE_BASE
            + pickup::RESOURCE_VALUE_STEP * (t / pickup::RESOURCE_VALUE_RAMP).floor();
        spawn_resource_pair(state, x, y, value);
        state.next_resource_at = t
            + (pickup::RESOURCE_INTERVAL_CEIL - t / pickup::RESOURCE_INTERVAL_SCALE)
                .max(pickup::RESOURCE_INTERVAL_FLOOR);
    }

    if t >= state.next_power_at {
        let x = pickup::SPAWN_X_MIN + rng.gen::<f32>() * pickup::SPAWN_X_SPAN;
        let fall = pickup::POWER_FALL_MIN + rng.gen::<f32>() * pickup::POWER_FALL_SPAN;
        let kind = *ShotPowerKind::ALL.choose(&mut rng).unwrap_or(&ShotPowerKind::MultiShot);
        spawn_power_pair(state, x, fall, kind);
        state.next_power_at = t
            + (pickup::POWER_INTERVAL_CEIL - t / pickup::POWER_INTERVAL_SCALE)
                .max(pickup::POWER_INTERVAL_FLOOR);
    }
}

/// Twin resources at mirrored x, identical value
pub fn spawn_resource_pair(state: &mut BattleState, x: f32, y: f32, value: f32) {
    for px in [x, world::mirrored_x(x)] {
        let id = state.next_entity_id();
        state.resources.push(ResourcePickup {
            id,
            pos: Vec2::new(px, y),
            radius: pickup::RESOURCE_RADIUS,
            value,
        });
    }
}

/// Twin shot powers at mirrored x, identical kind and fall speed; the left
/// twin answers only to left arrows and vice versa
pub fn spawn_power_pair(state: &mut BattleState, x: f32, fall_speed: f32, kind: ShotPowerKind) {
    for (side, px) in [(Side::Left, x), (Side::Right, world::mirrored_x(x))] {
        let id = state.next_entity_id();
        state.shot_powers.push(ShotPowerPickup {
            id,
            side,
            pos: Vec2::new(px, pickup::POWER_SPAWN_Y),
            radius: pickup::POWER_RADIUS,
            kind,
            fall_speed,
        });
    }
}
