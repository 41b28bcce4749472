//! Arrow flight, expiry and impact resolution.
//!
//! Arrows integrate under per-arrow gravity and die on timeout, out of
//! bounds or sticking into the ground. While alive they test targets in a
//! fixed priority: own shot-power pickups, then enemy minions (with the
//! dragon heart-core amplification), then neutral resources, then the
//! side's own ready upgrade cards. A main arrow that ends its life without
//! touching an enemy minion decays the shooter's combo streak.

use crate::game::constants::{combo, dragon, shot, world};
use crate::game::state::{Arrow, BattleState, Outbox, SfxKind};
use crate::game::systems::combat::{self, DamageSource};
use crate::game::systems::economy;

pub fn tick_arrows(state: &mut BattleState, outbox: &mut Outbox, dt: f32) {
    let mut i = 0;
    while i < state.arrows.len() {
        {
            let arrow = &mut state.arrows[i];
            arrow.vel.y += arrow.gravity * dt;
            arrow.pos += arrow.vel * dt;
            arrow.ttl -= dt;
        }

        if expired(&state.arrows[i]) {
            discard_arrow(state, i);
            continue;
        }

        if resolve_impacts(state, i, outbox) {
            discard_arrow(state, i);
            continue;
        }

        i += 1;
    }
}

/// Falling shot-power pickups; gone once they reach the ground.
pub fn tick_shot_powers(state: &mut BattleState, dt: f32) {
    for pickup in &mut state.shot_powers {
        pickup.pos.y += pickup.fall_speed * dt;
    }
    state.shot_powers.retain(|p| p.pos.y < world::GROUND_Y);
}

fn expired(arrow: &Arrow) -> bool {
    arrow.ttl <= 0.0
        || arrow.pos.x < -world::OUT_OF_BOUNDS_MARGIN
        || arrow.pos.x > world::WIDTH + world::OUT_OF_BOUNDS_MARGIN
        || (arrow.vel.y > 0.0 && arrow.pos.y >= world::GROUND_Y + shot::GROUND_SINK)
}

/// Remove the arrow, charging a combo miss if its main hit never landed
fn discard_arrow(state: &mut BattleState, idx: usize) {
    let arrow = state.arrows.swap_remove(idx);
    if arrow.main && !arrow.combo_counted {
        state.sides.get_mut(arrow.side).register_main_miss();
    }
}

/// Test the arrow against every interactable in priority order.
/// Returns true when the arrow is consumed.
fn resolve_impacts(state: &mut BattleState, idx: usize, outbox: &mut Outbox) -> bool {
    let (side, pos, radius) = {
        let a = &state.arrows[idx];
        (a.side, a.pos, a.radius)
    };

    // own falling shot powers
    if let Some(p) = state
        .shot_powers
        .iter()
        .position(|p| p.side == side && p.pos.distance_to(pos) <= p.radius + radius)
    {
        let pickup = state.shot_powers.swap_remove(p);
        let ledger = state.sides.get_mut(side);
        ledger.pending_shot_power = Some(pickup.kind);
        ledger.pending_shot_power_shots = shot::POWER_SHOTS;
        outbox.sfx(SfxKind::Powerup, pickup.pos.x, pickup.pos.y, Some(side));
        return true;
    }

    // enemy minions
    if let Some(m) = state.minions.iter().position(|m| {
        m.side != side
            && !m.is_dead()
            && !state.arrows[idx].hit_ids.contains(&m.id)
            && m.pos.distance_to(pos) <= m.radius + radius
    }) {
        return strike_minion(state, idx, m, outbox);
    }

    // neutral resources
    if let Some(r) = state
        .resources
        .iter()
        .position(|r| r.pos.distance_to(pos) <= r.radius + radius)
    {
        let pickup = state.resources.swap_remove(r);
        economy::award_resource_gold(state.sides.get_mut(side), pickup.value);
        outbox.sfx(SfxKind::Resource, pickup.pos.x, pickup.pos.y, Some(side));
        let arrow = &mut state.arrows[idx];
        if arrow.pierce > 0 {
            arrow.pierce -= 1;
            return false;
        }
        return true;
    }

    // own ready upgrade cards
    if state.sides.get(side).upgrade_ready() {
        if let Some(c) = state
            .cards
            .iter()
            .position(|c| c.side == side && c.contains(pos, radius))
        {
            let kind = state.cards[c].kind;
            economy::claim_upgrade(state, side, kind, outbox);
            return true;
        }
    }

    false
}

/// Land an arrow on an enemy minion: heart-core amplification, combo
/// accounting on main arrows, max-combo splash, pierce bookkeeping.
fn strike_minion(
    state: &mut BattleState,
    arrow_idx: usize,
    minion_idx: usize,
    outbox: &mut Outbox,
) -> bool {
    let (side, pos, radius, base_dmg, main, combo_counted) = {
        let a = &state.arrows[arrow_idx];
        (a.side, a.pos, a.radius, a.dmg, a.main, a.combo_counted)
    };
    let minion_id = state.minions[minion_idx].id;
    let impact = state.minions[minion_idx].pos;

    let mut dmg = base_dmg;
    if let Some((core, core_radius)) = state.minions[minion_idx].heart_core() {
        if core.distance_to(pos) <= core_radius + radius {
            dmg *= dragon::HEART_MUL;
        }
    }

    // tier taken before this hit extends the streak
    let at_max_combo = state.sides.get(side).combo_streak >= combo::MAX_STREAK;

    combat::deal_minion_damage(
        state,
        minion_idx,
        dmg,
        DamageSource::Arrow,
        side,
        pos,
        1.0,
        outbox,
    );

    if main && !combo_counted {
        if at_max_combo {
            combat::splash(
                state,
                side,
                impact,
                combo::MAX_SPLASH_RADIUS,
                base_dmg * combo::MAX_SPLASH_FRACTION,
                DamageSource::Explosion,
                Some(minion_id),
                outbox,
            );
        }
        let ledger = state.sides.get_mut(side);
        ledger.register_main_hit();
        state.arrows[arrow_idx].combo_counted = true;
    }

    let arrow = &mut state.arrows[arrow_idx];
    if arrow.pierce > 0 {
        arrow.pierce -= 1;
        arrow.hit_ids.push(minion_id);
        false
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::{
        Archetype, Minion, ResourcePickup, ShotPowerKind, ShotPowerPickup, Side, UpgradeCard,
        UpgradeKind,
    };
    use crate::util::vec2::Vec2;

    const DT: f32 = 1.0 / 30.0;

    fn arrow(side: Side, pos: Vec2, vel: Vec2) -> Arrow {
        Arrow {
            id: 999,
            side,
            pos,
            vel,
            gravity: 760.0,
            dmg: 30.0,
            radius: 4.0,
            pierce: 0,
            ttl: 3.5,
            power: None,
            main: true,
            combo_counted: false,
            hit_ids: Default::default(),
        }
    }

    fn militia(id: u64, side: Side, pos: Vec2, hp: f32) -> Minion {
        Minion {
            id,
            side,
            pos,
            hp,
            max_hp: hp,
            dmg: 12.0,
            speed: 54.0,
            atk_cd: 0.0,
            radius: 16.0,
            summoned: false,
            super_unit: false,
            arrow_hits_taken: 0,
            archetype: Archetype::Militia,
            kill: None,
        }
    }

    #[test]
    fn test_gravity_bends_flight() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(200.0, 300.0), Vec2::new(500.0, -200.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        let a = &state.arrows[0];
        assert!(a.pos.x > 200.0);
        assert!(a.vel.y > -200.0);
    }

    #[test]
    fn test_arrow_expires_on_ttl_and_counts_miss() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state.sides.left.combo_streak = 5;
        let mut a = arrow(Side::Left, Vec2::new(400.0, 300.0), Vec2::new(10.0, -500.0));
        a.ttl = 0.01;
        state.arrows.push(a);
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.arrows.is_empty());
        assert_eq!(state.sides.left.combo_streak, 4);
    }

    #[test]
    fn test_arrow_sticks_into_ground() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(400.0, world::GROUND_Y + 11.0), Vec2::new(10.0, 300.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.arrows.is_empty());
    }

    #[test]
    fn test_minion_hit_extends_combo_and_consumes_arrow() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .minions
            .push(militia(1, Side::Right, Vec2::new(500.0, 400.0), 10.0));
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(495.0, 400.0), Vec2::new(100.0, 0.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.arrows.is_empty());
        assert_eq!(state.sides.left.combo_streak, 1);
        assert_eq!(state.sides.left.arrow_hits, 1);
        assert!(state.minions[0].is_dead());
    }

    #[test]
    fn test_friendly_minions_are_ignored() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .minions
            .push(militia(1, Side::Left, Vec2::new(500.0, 400.0), 100.0));
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(495.0, 400.0), Vec2::new(100.0, 0.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        assert_eq!(state.arrows.len(), 1);
        assert_eq!(state.minions[0].hp, 100.0);
    }

    #[test]
    fn test_pierce_arrow_passes_through_resource() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut a = arrow(Side::Left, Vec2::new(700.0, 400.0), Vec2::new(100.0, 0.0));
        a.pierce = 1;
        a.gravity = 0.0;
        state.arrows.push(a);
        state.resources.push(ResourcePickup {
            id: 1,
            pos: Vec2::new(705.0, 400.0),
            radius: 14.0,
            value: 26.0,
        });
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.resources.is_empty());
        assert_eq!(state.sides.left.gold, 26.0);
        // the arrow keeps flying, one charge spent
        assert_eq!(state.arrows.len(), 1);
        assert_eq!(state.arrows[0].pierce, 0);
    }

    #[test]
    fn test_max_combo_splash() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state.sides.left.combo_streak = combo::MAX_STREAK;
        state
            .minions
            .push(militia(1, Side::Right, Vec2::new(500.0, 400.0), 1000.0));
        state
            .minions
            .push(militia(2, Side::Right, Vec2::new(540.0, 400.0), 1000.0));
        state
            .minions
            .push(militia(3, Side::Right, Vec2::new(900.0, 400.0), 1000.0));
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(495.0, 400.0), Vec2::new(100.0, 0.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        // direct target takes x4 tier damage
        assert!((state.minions[0].hp - (1000.0 - 30.0 * 4.0)).abs() < 1e-3);
        // neighbor takes the 34% splash
        assert!((state.minions[1].hp - (1000.0 - 30.0 * 0.34)).abs() < 1e-2);
        // distant minion untouched
        assert_eq!(state.minions[2].hp, 1000.0);
        // streak stays saturated after the hit
        assert_eq!(state.sides.left.combo_streak, combo::MAX_STREAK);
    }

    #[test]
    fn test_pierce_passes_through() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .minions
            .push(militia(1, Side::Right, Vec2::new(500.0, 400.0), 1000.0));
        let mut a = arrow(Side::Left, Vec2::new(495.0, 400.0), Vec2::new(100.0, 0.0));
        a.pierce = 2;
        a.gravity = 0.0;
        state.arrows.push(a);
        tick_arrows(&mut state, &mut outbox, DT);
        assert_eq!(state.arrows.len(), 1);
        assert_eq!(state.arrows[0].pierce, 1);
        // overlapping next tick must not rehit the same minion
        let hp_after_first = state.minions[0].hp;
        tick_arrows(&mut state, &mut outbox, DT);
        assert_eq!(state.minions[0].hp, hp_after_first);
    }

    #[test]
    fn test_heart_core_amplifies() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut target = militia(1, Side::Right, Vec2::new(500.0, 400.0), 10_000.0);
        target.radius = 30.0;
        target.archetype = Archetype::Dragon {
            fly_base_y: 400.0,
            fly_phase: 0.0,
        };
        let (core, _) = target.heart_core().unwrap();
        state.minions.push(target);
        let mut a = arrow(Side::Left, core - Vec2::new(3.0, 0.0), Vec2::new(10.0, 0.0));
        a.gravity = 0.0;
        state.arrows.push(a);
        tick_arrows(&mut state, &mut outbox, DT);
        let dealt = 10_000.0 - state.minions[0].hp;
        assert!((dealt - 30.0 * dragon::HEART_MUL).abs() < 1e-2);
    }

    #[test]
    fn test_resource_catch_awards_gold() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state.resources.push(ResourcePickup {
            id: 7,
            pos: Vec2::new(700.0, 400.0),
            radius: 14.0,
            value: 30.0,
        });
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(690.0, 400.0), Vec2::new(100.0, 0.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.resources.is_empty());
        assert!(state.arrows.is_empty());
        assert!((state.sides.left.gold - 30.0).abs() < 1e-4);
        // a pickup catch is not a minion hit
        assert_eq!(state.sides.left.combo_streak, 0);
    }

    #[test]
    fn test_shot_power_catch_is_side_gated() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state.shot_powers.push(ShotPowerPickup {
            id: 9,
            side: Side::Right,
            pos: Vec2::new(700.0, 300.0),
            radius: 16.0,
            kind: ShotPowerKind::UltraShot,
            fall_speed: 130.0,
        });
        state
            .arrows
            .push(arrow(Side::Left, Vec2::new(695.0, 300.0), Vec2::new(50.0, 0.0)));
        tick_arrows(&mut state, &mut outbox, DT);
        // wrong side: pickup survives
        assert_eq!(state.shot_powers.len(), 1);

        let mut a = arrow(Side::Right, Vec2::new(705.0, 300.0), Vec2::new(-50.0, 0.0));
        a.gravity = 0.0;
        state.arrows.push(a);
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.shot_powers.is_empty());
        assert_eq!(
            state.sides.right.pending_shot_power,
            Some(ShotPowerKind::UltraShot)
        );
        assert_eq!(state.sides.right.pending_shot_power_shots, 3);
    }

    #[test]
    fn test_card_catch_requires_full_charge() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let pos = UpgradeCard::slot_pos(Side::Left, 0);
        state.cards.push(UpgradeCard {
            id: 3,
            side: Side::Left,
            slot: 0,
            kind: UpgradeKind::Arrow,
            pos,
            width: 88.0,
            height: 56.0,
        });
        let mut a = arrow(Side::Left, pos, Vec2::new(1.0, 0.0));
        a.gravity = 0.0;
        state.arrows.push(a);
        tick_arrows(&mut state, &mut outbox, DT);
        // charge not ready: card ignored, arrow flies on
        assert_eq!(state.cards.len(), 1);
        assert_eq!(state.arrows.len(), 1);

        state.sides.left.upgrade_charge = state.sides.left.upgrade_charge_max;
        tick_arrows(&mut state, &mut outbox, DT);
        assert!(state.cards.is_empty());
        assert!(state.arrows.is_empty());
        assert_eq!(state.sides.left.upgrades.arrow, 2);
    }

    #[test]
    fn test_shot_powers_fall_and_despawn() {
        let mut state = BattleState::new();
        state.shot_powers.push(ShotPowerPickup {
            id: 1,
            side: Side::Left,
            pos: Vec2::new(700.0, world::GROUND_Y - 1.0),
            radius: 16.0,
            kind: ShotPowerKind::HeavyShot,
            fall_speed: 140.0,
        });
        tick_shot_powers(&mut state, DT);
        assert!(state.shot_powers.is_empty());
    }
}
