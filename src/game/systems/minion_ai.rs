//! Minion training and battlefield behavior.
//!
//! Training runs on per-side spawn cooldowns; each trained unit picks its
//! archetype from interleaved modulo schedules that tighten as upgrade
//! levels rise. On the field every minion advances toward the enemy tower,
//! fighting whatever crosses its reach; specials (breath, gunshots, charge
//! strikes, heals, auras, retreats) hang off the archetype variant.

use rand::Rng;

use crate::game::constants::{
    digger, dragon, gunner, hero, monk, president, rider, unit, world,
};
use crate::game::state::{
    Archetype, BattleState, Minion, Outbox, SfxKind, Side, SideState,
};
use crate::game::systems::combat::{self, DamageSource};
use crate::util::vec2::Vec2;

/// Archetype selector used at training time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrainKind {
    Militia,
    Gunner,
    Rider,
    Digger,
    Monk,
    Hero,
    President,
    Dragon,
    Necromancer,
    Bomber,
}

/// Advance spawn cooldowns and train units as they elapse.
pub fn tick_spawning(state: &mut BattleState, dt: f32) {
    for side in Side::BOTH {
        let ledger = state.sides.get_mut(side);
        ledger.minion_cd -= dt;
        if ledger.minion_cd <= 0.0 {
            let interval = ledger.stat_spawn_every();
            ledger.minion_cd = interval;
            train_minion(state, side);
        }
    }
}

/// Train the next unit for a side, archetype picked by the spawn counter.
pub fn train_minion(state: &mut BattleState, side: Side) {
    let ledger = state.sides.get_mut(side);
    ledger.spawn_count += 1;
    let n = ledger.spawn_count;
    let (kind, super_unit) = choose_archetype(ledger, n);
    let minion = build_minion(state, side, kind, super_unit);
    state.minions.push(minion);
}

/// Instant dragon summon from a claimed dragon upgrade
pub fn spawn_dragon(state: &mut BattleState, side: Side) {
    let minion = build_minion(state, side, TrainKind::Dragon, false);
    state.minions.push(minion);
}

/// Instant super unit from a claimed super upgrade
pub fn spawn_super(state: &mut BattleState, side: Side) {
    let minion = build_minion(state, side, TrainKind::Militia, true);
    state.minions.push(minion);
}

/// Interleaved modulo schedules, rarest archetype wins ties.
fn choose_archetype(ledger: &SideState, n: u64) -> (TrainKind, bool) {
    let up = &ledger.upgrades;
    let eco = ledger.economy_level;

    let gunner_every =
        (13 - ((up.unit + up.arrow + eco) / 6) as i64).max(9) as u64;
    let rider_every = (12 - ((up.unit + up.spawn + eco) / 5) as i64).max(7) as u64;
    let digger_every = (16 - ((up.unit_hp + up.spawn + eco) / 6) as i64).max(9) as u64;
    let monk_every = (19 - ((up.unit_hp + up.power + up.resource) / 7) as i64).max(11) as u64;
    let hero_every = (24 - ((up.unit + up.power + eco) / 7) as i64).max(15) as u64;
    let president_every = (27 - ((eco + up.resource + up.power) / 6) as i64).max(17) as u64;
    let bomber_every = (6 - up.explosive.saturating_sub(1) as i64).max(3) as u64;
    let dragon_every = (28 - 3 * up.dragon as i64).max(12) as u64;
    let super_every = (11 - 2 * up.super_minion as i64).max(3) as u64;

    let kind = if up.dragon >= 1 && n % dragon_every == 0 {
        TrainKind::Dragon
    } else if n % 8 == 0 {
        TrainKind::Necromancer
    } else if n % gunner_every == 0 {
        TrainKind::Gunner
    } else if n % rider_every == 0 {
        TrainKind::Rider
    } else if n % digger_every == 0 {
        TrainKind::Digger
    } else if n % monk_every == 0 {
        TrainKind::Monk
    } else if n % hero_every == 0 {
        TrainKind::Hero
    } else if n % president_every == 0 {
        TrainKind::President
    } else if n % bomber_every == 0 {
        TrainKind::Bomber
    } else {
        TrainKind::Militia
    };

    // dragons and gunners never take the super overlay
    let super_unit = up.super_minion >= 1
        && n % super_every == 0
        && !matches!(kind, TrainKind::Dragon | TrainKind::Gunner);
    (kind, super_unit)
}

fn build_minion(state: &mut BattleState, side: Side, kind: TrainKind, super_unit: bool) -> Minion {
    let ledger = state.sides.get(side);
    let up = &ledger.upgrades;

    let mut hp = ledger.stat_minion_hp();
    let mut dmg = ledger.stat_minion_damage();
    let mut speed = ledger.stat_minion_speed();
    let mut radius = unit::RADIUS;

    let mut rng = rand::thread_rng();
    let jitter = rng.gen_range(-unit::SPAWN_JITTER_Y..unit::SPAWN_JITTER_Y);
    let mut pos = Vec2::new(
        side.tower_x() + side.forward_sign() * unit::SPAWN_OFFSET_X,
        world::TOWER_Y + jitter,
    );

    let archetype = match kind {
        TrainKind::Militia => Archetype::Militia,
        TrainKind::Necromancer => {
            hp *= 1.26;
            dmg *= 0.92;
            speed *= 0.9;
            radius = radius.max(20.0);
            Archetype::Necromancer
        }
        TrainKind::Gunner => {
            let gun_scale = 1.0 + 0.08 * up.arrow.saturating_sub(1) as f32;
            hp *= 0.82;
            dmg *= 1.22 * gun_scale;
            Archetype::Gunner {
                range: gunner::RANGE_BASE
                    + gunner::RANGE_PER_ARROW_LEVEL * up.arrow as f32
                    + gunner::RANGE_PER_UNIT_LEVEL * up.unit as f32,
                dragon_mul: gunner::DRAGON_MUL_BASE
                    + gunner::DRAGON_MUL_PER_ARROW_LEVEL * up.arrow as f32,
            }
        }
        TrainKind::Rider => {
            hp *= 0.92;
            dmg *= 1.18;
            speed *= 1.45;
            Archetype::Rider {
                traveled: 0.0,
                charge_ready: false,
            }
        }
        TrainKind::Digger => {
            hp *= 1.34;
            speed *= 0.88;
            Archetype::Digger {
                dig_phase: rng.gen_range(0.0..std::f32::consts::TAU),
            }
        }
        TrainKind::Monk => Archetype::Monk {
            heal_scale: 1.0,
            heal_cd: 0.0,
        },
        TrainKind::Hero => {
            hp *= 1.6;
            dmg *= 1.5;
            Archetype::Hero { retreating: false }
        }
        TrainKind::President => Archetype::President {
            aura_radius: president::AURA_RADIUS,
        },
        TrainKind::Bomber => {
            dmg *= 0.8;
            Archetype::Bomber {
                level: up.explosive,
            }
        }
        TrainKind::Dragon => {
            let lvl = up.dragon.max(1) as f32;
            hp *= 1.9 + 0.32 * lvl;
            dmg *= 1.45 + 0.16 * lvl;
            speed *= 1.18 + (0.04 * lvl).min(0.22);
            radius = radius.max(26.0);
            let fly_y = world::TOWER_Y - 124.0 + rng.gen_range(-35.0..35.0);
            pos.y = fly_y;
            Archetype::Dragon {
                fly_base_y: fly_y,
                fly_phase: rng.gen_range(0.0..std::f32::consts::TAU),
            }
        }
    };

    if super_unit {
        let lvl = up.super_minion.max(1) as f32;
        hp *= 2.2 + 0.28 * lvl;
        dmg *= 2.0 + 0.24 * lvl;
        speed *= 0.84 + (0.02 * lvl).min(0.12);
        radius = 32.0;
    }

    Minion {
        id: state.next_entity_id(),
        side,
        pos,
        hp,
        max_hp: hp,
        dmg,
        speed,
        atk_cd: 0.0,
        radius,
        summoned: false,
        super_unit,
        arrow_hits_taken: 0,
        archetype,
        kill: None,
    }
}

/// One behavior pass over every living minion, then the rescue-hero check.
pub fn tick_minions(state: &mut BattleState, outbox: &mut Outbox, dt: f32) {
    for i in 0..state.minions.len() {
        if state.minions[i].is_dead() {
            continue;
        }
        advance_archetype_state(state, i, outbox, dt);
        act(state, i, outbox, dt);
    }
    rescue_heroes(state, outbox);
}

/// Per-tick archetype upkeep: cooldowns, flight and dig bobs, monk heals,
/// hero retreat hysteresis.
fn advance_archetype_state(state: &mut BattleState, i: usize, outbox: &mut Outbox, dt: f32) {
    state.minions[i].atk_cd -= dt;

    // heals scan the whole list, so they run before the exclusive borrow
    let monk_ready = matches!(
        state.minions[i].archetype,
        Archetype::Monk { heal_cd, .. } if heal_cd <= 0.0
    );
    if monk_ready {
        try_heal(state, i, outbox);
    }

    let m = &mut state.minions[i];
    let (radius, speed, hp, max_hp) = (m.radius, m.speed, m.hp, m.max_hp);
    match &mut m.archetype {
        Archetype::Dragon {
            fly_base_y,
            fly_phase,
        } => {
            let rate = dragon::FLY_RATE_BASE + (speed / 130.0).min(dragon::FLY_RATE_SPEED_CAP);
            *fly_phase += rate * dt;
            let cruise = world::TOWER_Y - dragon::CRUISE_ABOVE_TOWER;
            *fly_base_y += (cruise - *fly_base_y) * (dragon::CRUISE_LERP * dt).min(1.0);
            let amp = dragon::FLY_AMP_BASE + dragon::FLY_AMP_PER_RADIUS * radius;
            m.pos.y = *fly_base_y + fly_phase.sin() * amp;
        }
        Archetype::Digger { dig_phase } => {
            *dig_phase += digger::BOB_RATE * dt;
            m.pos.y = world::TOWER_Y + dig_phase.sin() * digger::BOB_AMP;
        }
        Archetype::Monk { heal_cd, .. } => {
            *heal_cd -= dt;
        }
        Archetype::Hero { retreating } => {
            let frac = hp / max_hp;
            *retreating = if *retreating {
                frac < hero::RESUME_ABOVE
            } else {
                frac < hero::RETREAT_BELOW
            };
        }
        _ => {}
    }
}

/// Heal the nearest wounded ally in range, output decaying with each cast.
fn try_heal(state: &mut BattleState, i: usize, outbox: &mut Outbox) {
    let (side, pos, scale) = {
        let m = &state.minions[i];
        let Archetype::Monk { heal_scale, .. } = m.archetype else {
            return;
        };
        (m.side, m.pos, heal_scale)
    };

    let target = state
        .minions
        .iter()
        .enumerate()
        .filter(|(j, m)| {
            *j != i
                && m.side == side
                && !m.is_dead()
                && m.pos.distance_to(pos) <= monk::HEAL_RANGE
                && (m.max_hp - m.hp) / m.max_hp >= monk::WOUND_THRESHOLD
        })
        .min_by(|(_, a), (_, b)| {
            let da = a.pos.distance_sq_to(pos);
            let db = b.pos.distance_sq_to(pos);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(j, _)| j);

    let Some(j) = target else { return };

    let ally = &mut state.minions[j];
    ally.hp = (ally.hp + monk::HEAL_AMOUNT * scale).min(ally.max_hp);
    let (hx, hy) = (ally.pos.x, ally.pos.y);
    outbox.sfx(SfxKind::Heal, hx, hy, Some(side));

    if let Archetype::Monk {
        ref mut heal_scale,
        ref mut heal_cd,
    } = state.minions[i].archetype
    {
        *heal_scale = (*heal_scale * monk::SCALE_DECAY).max(monk::SCALE_FLOOR);
        *heal_cd = monk::HEAL_CD;
    }
}

/// Fight, siege or march.
fn act(state: &mut BattleState, i: usize, outbox: &mut Outbox, dt: f32) {
    let (side, pos, radius) = {
        let m = &state.minions[i];
        (m.side, m.pos, m.radius)
    };

    if state.minions[i].is_support() {
        march(state, i, dt);
        return;
    }

    if let Archetype::Hero { retreating: true } = state.minions[i].archetype {
        retreat(state, i, dt);
        return;
    }

    // nearest living enemy within this archetype's reach
    let target = {
        let m = &state.minions[i];
        let candidate = state
            .minions
            .iter()
            .enumerate()
            .filter(|(j, e)| *j != i && e.side != side && !e.is_dead())
            .min_by(|(_, a), (_, b)| {
                let da = a.pos.distance_sq_to(pos);
                let db = b.pos.distance_sq_to(pos);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            });
        candidate.and_then(|(j, e)| {
            let dist = e.pos.distance_to(pos);
            let in_reach = match m.archetype {
                Archetype::Gunner { range, .. } => dist <= range + e.radius,
                Archetype::Dragon { .. } => dist <= dragon::RANGE + e.radius,
                Archetype::Hero { .. } => {
                    dist <= radius + e.radius + hero::SLASH_REACH_PAD
                }
                _ => dist <= radius + e.radius + unit::MELEE_REACH_PAD,
            };
            in_reach.then_some(j)
        })
    };

    if let Some(j) = target {
        if state.minions[i].atk_cd <= 0.0 {
            attack_minion(state, i, j, outbox);
        }
        return;
    }

    // enemy tower face
    let enemy = side.enemy();
    let face_x = enemy.tower_x() - side.forward_sign() * unit::TOWER_FACE_OFFSET;
    let reach = combat::tower_reach(&state.minions[i]);
    if (pos.x - face_x).abs() < reach {
        if state.minions[i].atk_cd <= 0.0 {
            attack_tower(state, i, outbox);
        }
        return;
    }

    march(state, i, dt);
}

fn march(state: &mut BattleState, i: usize, dt: f32) {
    let m = &mut state.minions[i];
    let step = m.speed * dt;
    m.pos.x += m.side.forward_sign() * step;

    if let Archetype::Rider {
        ref mut traveled,
        ref mut charge_ready,
    } = m.archetype
    {
        if !*charge_ready {
            *traveled += step;
            if *traveled >= rider::CHARGE_DISTANCE {
                *charge_ready = true;
            }
        }
    }
}

/// Wounded heroes fall back toward their own tower.
fn retreat(state: &mut BattleState, i: usize, dt: f32) {
    let m = &mut state.minions[i];
    let home_x = m.side.tower_x() + m.side.forward_sign() * unit::SPAWN_OFFSET_X;
    let step = m.speed * dt;
    match m.side {
        Side::Left => m.pos.x = (m.pos.x - step).max(home_x),
        Side::Right => m.pos.x = (m.pos.x + step).min(home_x),
    }
}

fn attack_minion(state: &mut BattleState, i: usize, j: usize, outbox: &mut Outbox) {
    let (side, pos, dmg) = {
        let m = &state.minions[i];
        (m.side, m.pos, m.dmg)
    };
    let target_pos = state.minions[j].pos;
    let target_is_dragon = state.minions[j].is_dragon();
    let target_id = state.minions[j].id;

    match state.minions[i].archetype.clone() {
        Archetype::Dragon { .. } => {
            let breath = dmg * dragon::BREATH_MUL;
            combat::deal_minion_damage(
                state,
                j,
                breath,
                DamageSource::DragonBreath,
                side,
                pos,
                1.0,
                outbox,
            );
            combat::splash(
                state,
                side,
                target_pos,
                dragon::BREATH_SPLASH_RADIUS,
                breath * dragon::BREATH_SPLASH_FRACTION,
                DamageSource::DragonBreath,
                Some(target_id),
                outbox,
            );
            outbox.sfx(SfxKind::Dragonfire, target_pos.x, target_pos.y, Some(side));
            state.minions[i].atk_cd = dragon::BREATH_CD;
        }
        Archetype::Gunner { dragon_mul, .. } => {
            let mut shot = dmg * gunner::SHOT_MUL;
            if target_is_dragon {
                shot = dmg * dragon_mul;
            }
            combat::deal_minion_damage(
                state,
                j,
                shot,
                DamageSource::GunnerShot,
                side,
                pos,
                1.0,
                outbox,
            );
            combat::splash(
                state,
                side,
                target_pos,
                gunner::SPLASH_RADIUS,
                shot * gunner::SPLASH_FRACTION,
                DamageSource::GunnerShot,
                Some(target_id),
                outbox,
            );
            outbox.sfx(SfxKind::Gunhit, target_pos.x, target_pos.y, Some(side));
            state.minions[i].atk_cd = gunner::SHOT_CD;
        }
        Archetype::Rider {
            charge_ready: true, ..
        } => {
            combat::deal_minion_damage(
                state,
                j,
                dmg * rider::CHARGE_MUL,
                DamageSource::Charge,
                side,
                pos,
                1.0,
                outbox,
            );
            state.minions[i].archetype = Archetype::Rider {
                traveled: 0.0,
                charge_ready: false,
            };
            state.minions[i].atk_cd = unit::MELEE_CD;
        }
        Archetype::Hero { .. } => {
            // the slash is an arc: every enemy in reach takes the full hit
            let reach = state.minions[i].radius + hero::SLASH_REACH_PAD;
            combat::splash(
                state,
                side,
                pos,
                reach,
                dmg,
                DamageSource::Slash,
                None,
                outbox,
            );
            outbox.sfx(SfxKind::Slash, target_pos.x, target_pos.y, Some(side));
            let mut rng = rand::thread_rng();
            if rng.gen::<f32>() < 0.3 {
                let cry = hero::BATTLE_CRIES[rng.gen_range(0..hero::BATTLE_CRIES.len())];
                outbox.line(cry, pos.x, pos.y - 30.0, side);
            }
            state.minions[i].atk_cd = hero::SLASH_CD;
        }
        _ => {
            combat::deal_minion_damage(
                state,
                j,
                dmg,
                DamageSource::Melee,
                side,
                pos,
                1.0,
                outbox,
            );
            state.minions[i].atk_cd = unit::MELEE_CD;
        }
    }
}

fn attack_tower(state: &mut BattleState, i: usize, outbox: &mut Outbox) {
    let (side, pos, dmg) = {
        let m = &state.minions[i];
        (m.side, m.pos, m.dmg)
    };
    let (mul, cd) = combat::tower_strike(&state.minions[i]);
    let aura = combat::aura_multiplier(state, side, pos);
    let enemy = side.enemy();
    let strike = dmg * mul * aura;

    let ledger = state.sides.get_mut(enemy);
    ledger.tower_hp = (ledger.tower_hp - strike).max(0.0);
    ledger.tower_damaged_once = true;
    outbox.damage(strike, enemy.tower_x(), world::TOWER_Y - 80.0, enemy);
    state.minions[i].atk_cd = cd;
}

/// A kingdom under siege for the first time fields its champion, once.
fn rescue_heroes(state: &mut BattleState, outbox: &mut Outbox) {
    for side in Side::BOTH {
        let ledger = state.sides.get(side);
        if !ledger.tower_damaged_once || ledger.tower_hero_rescue_used {
            continue;
        }
        state.sides.get_mut(side).tower_hero_rescue_used = true;
        let minion = build_minion(state, side, TrainKind::Hero, false);
        let pos = minion.pos;
        state.minions.push(minion);
        let mut rng = rand::thread_rng();
        let cry = hero::BATTLE_CRIES[rng.gen_range(0..hero::BATTLE_CRIES.len())];
        outbox.line(cry, pos.x, pos.y - 30.0, side);
    }
}
