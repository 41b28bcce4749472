//! Damage pipeline and deferred death resolution.
//!
//! All minion damage flows through one function so combo tiers, president
//! auras, matchup multipliers and the hero kill gate are applied uniformly.
//! Deaths only tombstone the target (hp to zero plus a kill credit); the
//! corpse sweep at the end of the tick compacts the list, pays bounties and
//! triggers death effects, looping until blast chains settle.

use crate::game::constants::{bomber, dragon, matchup, necro, president, unit};
use crate::game::state::{
    Archetype, BattleState, KillCredit, Minion, Outbox, SfxKind, Side,
};
use crate::game::systems::economy;
use crate::util::vec2::Vec2;

/// What produced a packet of damage; selects the multipliers that apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Arrow,
    Melee,
    Charge,
    Slash,
    DragonBreath,
    GunnerShot,
    Explosion,
}

impl DamageSource {
    fn is_melee(self) -> bool {
        matches!(self, DamageSource::Melee | DamageSource::Charge | DamageSource::Slash)
    }
}

/// Deal damage to `state.minions[target_idx]`.
///
/// `attacker_pos` locates the source for aura lookups; `gold_scalar` is the
/// bounty fraction paid if this packet kills. Returns the damage actually
/// applied after multipliers.
pub fn deal_minion_damage(
    state: &mut BattleState,
    target_idx: usize,
    base_dmg: f32,
    source: DamageSource,
    attacker_side: Side,
    attacker_pos: Vec2,
    gold_scalar: f32,
    outbox: &mut Outbox,
) -> f32 {
    let mut dmg = base_dmg;

    if source == DamageSource::Arrow {
        dmg *= state.sides.get(attacker_side).combo_multiplier();
    } else {
        dmg *= aura_multiplier(state, attacker_side, attacker_pos);
    }

    {
        let target = &state.minions[target_idx];
        if source.is_melee() && target.is_flying() {
            dmg *= matchup::MELEE_VS_FLYING;
        }
        if source == DamageSource::DragonBreath && target.summoned {
            dmg *= matchup::DRAGONFIRE_VS_SUMMONED;
        }
    }

    let target = &mut state.minions[target_idx];
    if target.is_dead() {
        return 0.0;
    }

    let credit = KillCredit {
        by: Some(attacker_side),
        gold_scalar,
        arrow_damage: (source == DamageSource::Arrow).then_some(dmg),
    };

    if let Archetype::Hero { .. } = target.archetype {
        // heroes fall only to the third arrow; everything else just wounds
        if source == DamageSource::Arrow {
            target.arrow_hits_taken += 1;
            if target.arrow_hits_taken >= crate::game::constants::hero::ARROW_HITS_TO_KILL {
                target.mark_killed(credit);
            } else {
                target.hp = (target.hp - dmg).max(1.0);
            }
        } else {
            target.hp = (target.hp - dmg).max(1.0);
        }
    } else {
        target.hp -= dmg;
        if target.hp <= 0.0 {
            target.mark_killed(credit);
        }
    }

    let (x, y, side) = (target.pos.x, target.pos.y, target.side);
    outbox.damage(dmg, x, y, side);
    dmg
}

/// Damage boost from a friendly president standing near the attacker
pub fn aura_multiplier(state: &BattleState, attacker_side: Side, attacker_pos: Vec2) -> f32 {
    let boosted = state.minions.iter().any(|m| {
        m.side == attacker_side
            && !m.is_dead()
            && matches!(m.archetype, Archetype::President { aura_radius }
                if m.pos.distance_to(attacker_pos) <= aura_radius)
    });
    if boosted {
        president::AURA_MUL
    } else {
        1.0
    }
}

/// Sweep tombstoned minions: pay bounties, fire death effects, compact.
/// Blasts can tombstone more minions, so the sweep loops until stable.
pub fn resolve_deaths(state: &mut BattleState, outbox: &mut Outbox) {
    loop {
        let Some(idx) = state.minions.iter().position(|m| m.is_dead()) else {
            break;
        };
        let corpse = state.minions.swap_remove(idx);

        let credit = corpse.kill.unwrap_or(KillCredit {
            by: None,
            gold_scalar: 1.0,
            arrow_damage: None,
        });

        if let Some(killer) = credit.by {
            if killer != corpse.side {
                economy::award_kill_gold(state.sides.get_mut(killer), credit.gold_scalar);
            }
        }

        let sfx = if corpse.is_dragon() {
            SfxKind::Dragon
        } else {
            SfxKind::Minion
        };
        outbox.sfx(sfx, corpse.pos.x, corpse.pos.y, credit.by);

        match corpse.archetype {
            Archetype::Bomber { level } => {
                if let Some(blast_dmg) = credit.arrow_damage {
                    explode(state, &corpse, level, blast_dmg, credit.by, outbox);
                }
            }
            Archetype::Necromancer => {
                raise_servants(state, &corpse);
            }
            _ => {}
        }
    }
}

/// Arrow-triggered bomber blast: hits everything else in range on either
/// side, chain kills paying a reduced bounty to the shooter.
fn explode(
    state: &mut BattleState,
    corpse: &Minion,
    level: u32,
    blast_dmg: f32,
    killer: Option<Side>,
    outbox: &mut Outbox,
) {
    let radius = bomber::BLAST_RADIUS_BASE
        + bomber::BLAST_RADIUS_PER_LEVEL * level.saturating_sub(1) as f32;
    outbox.sfx(SfxKind::Explosion, corpse.pos.x, corpse.pos.y, killer);

    let Some(killer) = killer else { return };

    let targets: Vec<usize> = state
        .minions
        .iter()
        .enumerate()
        .filter(|(_, m)| !m.is_dead() && m.pos.distance_to(corpse.pos) <= radius)
        .map(|(i, _)| i)
        .collect();

    for i in targets {
        deal_minion_damage(
            state,
            i,
            blast_dmg,
            DamageSource::Explosion,
            killer,
            corpse.pos,
            bomber::CHAIN_GOLD_SCALAR,
            outbox,
        );
    }
}

/// A slain necromancer leaves a ring of lesser servants behind.
fn raise_servants(state: &mut BattleState, corpse: &Minion) {
    let count = if corpse.super_unit {
        necro::SERVANTS_SUPER
    } else {
        necro::SERVANTS
    };
    let ring = corpse.radius + necro::RING_PAD;

    for i in 0..count {
        let angle = std::f32::consts::TAU * i as f32 / count as f32;
        let pos = corpse.pos + Vec2::from_angle(angle) * ring;
        let id = state.next_entity_id();
        state.minions.push(Minion {
            id,
            side: corpse.side,
            pos,
            hp: (corpse.max_hp * necro::SERVANT_HP_FRACTION).max(necro::SERVANT_HP_MIN),
            max_hp: (corpse.max_hp * necro::SERVANT_HP_FRACTION).max(necro::SERVANT_HP_MIN),
            dmg: (corpse.dmg * necro::SERVANT_DMG_FRACTION).max(necro::SERVANT_DMG_MIN),
            speed: (corpse.speed * necro::SERVANT_SPEED_FRACTION).max(necro::SERVANT_SPEED_MIN),
            atk_cd: 0.0,
            radius: (corpse.radius * necro::SERVANT_RADIUS_FRACTION)
                .max(necro::SERVANT_RADIUS_MIN),
            summoned: true,
            super_unit: false,
            arrow_hits_taken: 0,
            archetype: Archetype::Militia,
            kill: None,
        });
    }
}

/// Damage every enemy near a center point. Used by max-combo arrows,
/// dragon breath, gunner shots and the hero's arc slash.
pub fn splash(
    state: &mut BattleState,
    attacker_side: Side,
    center: Vec2,
    radius: f32,
    dmg: f32,
    source: DamageSource,
    exclude_id: Option<u64>,
    outbox: &mut Outbox,
) {
    let targets: Vec<usize> = state
        .minions
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            m.side != attacker_side
                && !m.is_dead()
                && Some(m.id) != exclude_id
                && m.pos.distance_to(center) <= radius + m.radius
        })
        .map(|(i, _)| i)
        .collect();

    for i in targets {
        deal_minion_damage(state, i, dmg, source, attacker_side, center, 1.0, outbox);
    }
}

/// Reach of a minion attacking the enemy tower face
pub fn tower_reach(minion: &Minion) -> f32 {
    let mut reach = minion.radius + unit::TOWER_REACH_PAD;
    if minion.is_flying() {
        reach += unit::TOWER_REACH_FLYING;
    }
    if minion.is_dragon() {
        reach += unit::TOWER_REACH_DRAGON;
    }
    if let Archetype::Gunner { range, .. } = minion.archetype {
        reach += (range - 40.0).max(0.0);
    }
    reach
}

/// Per-archetype tower damage multiplier and cooldown
pub fn tower_strike(minion: &Minion) -> (f32, f32) {
    match minion.archetype {
        Archetype::Dragon { .. } => (dragon::TOWER_MUL, dragon::TOWER_CD),
        Archetype::Gunner { .. } => (
            crate::game::constants::gunner::TOWER_MUL,
            crate::game::constants::gunner::TOWER_CD,
        ),
        _ => (1.0, unit::TOWER_CD),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::constants::hero;

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
    fn test_plain_damage_and_tombstone() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state
            .minions
            .push(militia(1, Side::Right, Vec2::new(700.0, 600.0), 30.0));
        let applied = deal_minion_damage(
            &mut state,
            0,
            40.0,
            DamageSource::Arrow,
            Side::Left,
            Vec2::new(690.0, 590.0),
            1.0,
            &mut outbox,
        );
        assert!((applied - 40.0).abs() < 1e-4);
        assert!(state.minions[0].is_dead());
        assert_eq!(state.minions[0].kill.unwrap().by, Some(Side::Left));
        assert_eq!(outbox.drain_damage().len(), 1);
    }

    #[test]
    fn test_combo_multiplier_applies_to_arrows() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        state.sides.left.combo_streak = 10;
        state
            .minions
            .push(militia(1, Side::Right, Vec2::new(700.0, 600.0), 1000.0));
        let applied = deal_minion_damage(
            &mut state,
            0,
            25.0,
            DamageSource::Arrow,
            Side::Left,
            Vec2::ZERO,
            1.0,
            &mut outbox,
        );
        assert!((applied - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_melee_vs_flying_penalty() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut target = militia(1, Side::Right, Vec2::new(700.0, 500.0), 1000.0);
        target.archetype = Archetype::Dragon {
            fly_base_y: 500.0,
            fly_phase: 0.0,
        };
        state.minions.push(target);
        let applied = deal_minion_damage(
            &mut state,
            0,
            100.0,
            DamageSource::Melee,
            Side::Left,
            Vec2::new(700.0, 520.0),
            1.0,
            &mut outbox,
        );
        assert!((applied - 72.0).abs() < 1e-3);
    }

    #[test]
    fn test_dragonfire_vs_summoned_bonus() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut target = militia(1, Side::Right, Vec2::new(700.0, 600.0), 1000.0);
        target.summoned = true;
        state.minions.push(target);
        let applied = deal_minion_damage(
            &mut state,
            0,
            100.0,
            DamageSource::DragonBreath,
            Side::Left,
            Vec2::new(650.0, 500.0),
            1.0,
            &mut outbox,
        );
        assert!((applied - 122.0).abs() < 1e-3);
    }

    #[test]
    fn test_president_aura_boosts_minion_damage() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut pres = militia(1, Side::Left, Vec2::new(400.0, 600.0), 500.0);
        pres.archetype = Archetype::President {
            aura_radius: president::AURA_RADIUS,
        };
        state.minions.push(pres);
        state
            .minions
            .push(militia(2, Side::Right, Vec2::new(450.0, 600.0), 1000.0));
        let applied = deal_minion_damage(
            &mut state,
            1,
            100.0,
            DamageSource::Melee,
            Side::Left,
            Vec2::new(430.0, 600.0),
            1.0,
            &mut outbox,
        );
        assert!((applied - 128.0).abs() < 1e-3);
    }

    #[test]
    fn test_hero_arrow_kill_gate() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut hero_minion = militia(1, Side::Right, Vec2::new(700.0, 600.0), 400.0);
        hero_minion.archetype = Archetype::Hero { retreating: false };
        state.minions.push(hero_minion);

        for _ in 0..hero::ARROW_HITS_TO_KILL - 1 {
            deal_minion_damage(
                &mut state,
                0,
                10_000.0,
                DamageSource::Arrow,
                Side::Left,
                Vec2::ZERO,
                1.0,
                &mut outbox,
            );
            assert!(!state.minions[0].is_dead());
            assert_eq!(state.minions[0].hp, 1.0);
        }
        deal_minion_damage(
            &mut state,
            0,
            1.0,
            DamageSource::Arrow,
            Side::Left,
            Vec2::ZERO,
            1.0,
            &mut outbox,
        );
        assert!(state.minions[0].is_dead());
    }

    #[test]
    fn test_hero_survives_non_arrow_damage() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut hero_minion = militia(1, Side::Right, Vec2::new(700.0, 600.0), 50.0);
        hero_minion.archetype = Archetype::Hero { retreating: false };
        state.minions.push(hero_minion);
        deal_minion_damage(
            &mut state,
            0,
            10_000.0,
            DamageSource::Melee,
            Side::Left,
            Vec2::ZERO,
            1.0,
            &mut outbox,
        );
        assert!(!state.minions[0].is_dead());
        assert_eq!(state.minions[0].hp, 1.0);
    }

    #[test]
    fn test_resolve_deaths_pays_bounty() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut corpse = militia(1, Side::Right, Vec2::new(700.0, 600.0), 10.0);
        corpse.mark_killed(KillCredit {
            by: Some(Side::Left),
            gold_scalar: 1.0,
            arrow_damage: None,
        });
        state.minions.push(corpse);
        resolve_deaths(&mut state, &mut outbox);
        assert!(state.minions.is_empty());
        // floor(8 * 1.0 * (1 + 0.2 * 0)) = 8
        assert!((state.sides.left.gold - 8.0).abs() < 1e-4);
        assert_eq!(outbox.drain_sfx().len(), 1);
    }

    #[test]
    fn test_bomber_blast_chains() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut bomber_minion = militia(1, Side::Right, Vec2::new(700.0, 600.0), 10.0);
        bomber_minion.archetype = Archetype::Bomber { level: 1 };
        bomber_minion.mark_killed(KillCredit {
            by: Some(Side::Left),
            gold_scalar: 1.0,
            arrow_damage: Some(500.0),
        });
        state.minions.push(bomber_minion);
        // comrade inside the blast, enemy of the shooter
        state
            .minions
            .push(militia(2, Side::Right, Vec2::new(740.0, 600.0), 50.0));
        // too far away
        state
            .minions
            .push(militia(3, Side::Right, Vec2::new(900.0, 600.0), 50.0));
        resolve_deaths(&mut state, &mut outbox);
        assert_eq!(state.minions.len(), 1);
        assert_eq!(state.minions[0].id, 3);
        // 8 for the bomber + floor(8 * 0.75) = 6 for the chained comrade
        assert!((state.sides.left.gold - 14.0).abs() < 1e-4);
    }

    #[test]
    fn test_bomber_blast_hits_both_sides() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut bomber_minion = militia(1, Side::Right, Vec2::new(700.0, 600.0), 10.0);
        bomber_minion.archetype = Archetype::Bomber { level: 1 };
        bomber_minion.mark_killed(KillCredit {
            by: Some(Side::Left),
            gold_scalar: 1.0,
            arrow_damage: Some(40.0),
        });
        state.minions.push(bomber_minion);
        // the shooter's own soldier standing too close
        state
            .minions
            .push(militia(2, Side::Left, Vec2::new(730.0, 600.0), 1000.0));
        resolve_deaths(&mut state, &mut outbox);
        assert_eq!(state.minions.len(), 1);
        assert!((state.minions[0].hp - 960.0).abs() < 1e-3);
        // only the bomber itself pays a bounty
        assert!((state.sides.left.gold - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_necromancer_raises_servants() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut necro_minion = militia(1, Side::Right, Vec2::new(700.0, 600.0), 10.0);
        necro_minion.max_hp = 200.0;
        necro_minion.dmg = 20.0;
        necro_minion.speed = 50.0;
        necro_minion.radius = 20.0;
        necro_minion.archetype = Archetype::Necromancer;
        necro_minion.mark_killed(KillCredit {
            by: Some(Side::Left),
            gold_scalar: 1.0,
            arrow_damage: None,
        });
        state.minions.push(necro_minion);
        resolve_deaths(&mut state, &mut outbox);
        assert_eq!(state.minions.len(), necro::SERVANTS as usize);
        for servant in &state.minions {
            assert!(servant.summoned);
            assert_eq!(servant.side, Side::Right);
            assert!((servant.max_hp - 200.0 * 0.38).abs() < 1e-3);
            assert!((servant.dmg - 20.0 * 0.42).abs() < 1e-3);
            assert!((servant.speed - 56.0).abs() < 1e-3);
        }
    }

    #[test]
    fn test_no_gold_for_friendly_kill() {
        let mut state = BattleState::new();
        let mut outbox = Outbox::default();
        let mut corpse = militia(1, Side::Left, Vec2::ZERO, 5.0);
        corpse.mark_killed(KillCredit {
            by: Some(Side::Left),
            gold_scalar: 1.0,
            arrow_damage: None,
        });
        state.minions.push(corpse);
        resolve_deaths(&mut state, &mut outbox);
        assert_eq!(state.sides.left.gold, 0.0);
    }
}
