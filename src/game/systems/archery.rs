//! Lockstep archer volleys.
//!
//! Both towers share one shot cooldown and always loose together. The stored
//! aim pull is converted into a launch angle and strength, then a fan of
//! arrows is built around the center shot. Only the center (main) arrow
//! feeds combo and accuracy accounting.

use crate::game::constants::{shot, world};
use crate::game::state::{Arrow, BattleState, ShotPowerKind, Side};
use crate::util::vec2::Vec2;

// Power-shot flight modifiers
const ULTRA_SPEED_MUL: f32 = 1.15;
const ULTRA_GRAVITY_MUL: f32 = 0.85;
const ULTRA_RADIUS: f32 = 6.0;
const PIERCE_SPEED_MUL: f32 = 1.1;
const HEAVY_SPEED_MUL: f32 = 0.82;
const HEAVY_GRAVITY_MUL: f32 = 1.18;
const HEAVY_RADIUS_MIN: f32 = 7.0;

/// Advance the shared shot cooldown and fire both volleys when it elapses.
pub fn tick_archery(state: &mut BattleState, dt: f32) {
    state.sides.for_each_mut(|_, side| side.shot_cd -= dt);

    if state.sides.left.shot_cd <= 0.0 && state.sides.right.shot_cd <= 0.0 {
        fire_volley(state, Side::Left);
        fire_volley(state, Side::Right);
        state.sides.left.shot_cd = shot::INTERVAL;
        state.sides.right.shot_cd = shot::INTERVAL;
    }
}

/// Launch parameters derived from a clamped pull vector
#[derive(Debug, Clone, Copy)]
pub struct Launch {
    pub angle: f32,
    pub strength: f32,
    pub speed: f32,
    pub gravity: f32,
    pub charge_mul: f32,
}

/// Solve the launch from the side's current pull. Strength is clamped so a
/// slack pad still lobs something; angle stays within the upward quadrant.
pub fn solve_launch(pull: Vec2) -> Launch {
    let strength = pull.length().clamp(shot::MIN_STRENGTH, 1.0);
    let angle = (-pull.y)
        .max(0.0)
        .atan2(pull.x.abs().max(1e-6))
        .clamp(0.0, std::f32::consts::FRAC_PI_2);
    Launch {
        angle,
        strength,
        speed: (shot::SPEED_BASE + shot::SPEED_SCALE * strength) * shot::SPEED_BOOST,
        gravity: shot::GRAVITY_BASE - shot::GRAVITY_RELIEF * strength,
        charge_mul: shot::CHARGE_FLOOR + shot::CHARGE_SCALE * strength,
    }
}

fn fire_volley(state: &mut BattleState, side: Side) {
    let ledger = state.sides.get(side);
    let launch = solve_launch(ledger.pull);
    let power_scale = ledger.power_scale();

    let power = if ledger.pending_shot_power_shots > 0 {
        ledger.pending_shot_power
    } else {
        None
    };

    let mut count = ledger.stat_arrow_count();
    let mut dmg = ledger.stat_arrow_damage() * launch.charge_mul;
    let mut speed = launch.speed;
    let mut gravity = launch.gravity;
    let mut radius = shot::RADIUS;
    let mut pierce = 0;
    let mut spread = shot::VOLLEY_SPREAD;

    match power {
        Some(ShotPowerKind::MultiShot) => {
            count += 2 + (2.0 * power_scale) as u32;
            spread = shot::MULTI_SPREAD;
        }
        Some(ShotPowerKind::UltraShot) => {
            dmg *= 2.2 + 0.8 * power_scale;
            speed *= ULTRA_SPEED_MUL;
            gravity *= ULTRA_GRAVITY_MUL;
            radius = radius.max(ULTRA_RADIUS);
        }
        Some(ShotPowerKind::PierceShot) => {
            pierce = 2 + (2.0 * power_scale) as u32;
            speed *= PIERCE_SPEED_MUL;
        }
        Some(ShotPowerKind::HeavyShot) => {
            dmg *= 1.6 + 0.5 * power_scale;
            speed *= HEAVY_SPEED_MUL;
            gravity *= HEAVY_GRAVITY_MUL;
            radius = radius.max(HEAVY_RADIUS_MIN);
        }
        None => {}
    }

    let origin = Vec2::new(
        side.tower_x() + side.forward_sign() * shot::LAUNCH_OFFSET_X,
        world::ARCHER_ORIGIN_Y,
    );
    let main_index = (count as usize - 1) / 2;

    for i in 0..count as usize {
        let offset = i as f32 - (count as f32 - 1.0) / 2.0;
        let a = launch.angle + offset * spread;
        let vel = Vec2::new(
            a.cos() * speed * side.forward_sign(),
            -a.sin() * speed,
        );
        let id = state.next_entity_id();
        state.arrows.push(Arrow {
            id,
            side,
            pos: origin,
            vel,
            gravity,
            dmg,
            radius,
            pierce,
            ttl: shot::TTL,
            power,
            main: i == main_index,
            combo_counted: false,
            hit_ids: Default::default(),
        });
    }

    let ledger = state.sides.get_mut(side);
    ledger.arrows_fired += 1;
    if ledger.pending_shot_power_shots > 0 {
        ledger.pending_shot_power_shots -= 1;
        if ledger.pending_shot_power_shots == 0 {
            ledger.pending_shot_power = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::normalize_pull;

    #[test]
    fn test_solve_launch_full_pull() {
        let pull = normalize_pull(Side::Left, -1.0, 0.0);
        let launch = solve_launch(pull);
        assert!((launch.strength - 1.0).abs() < 1e-5);
        assert!(launch.angle.abs() < 1e-5);
        assert!((launch.speed - (230.0 + 380.0) * 1.5).abs() < 1e-3);
        assert!((launch.gravity - 760.0).abs() < 1e-3);
        assert!((launch.charge_mul - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_solve_launch_slack_pull() {
        let launch = solve_launch(Vec2::ZERO);
        assert!((launch.strength - shot::MIN_STRENGTH).abs() < 1e-6);
    }

    #[test]
    fn test_solve_launch_straight_up() {
        let launch = solve_launch(Vec2::new(0.0, -1.0));
        assert!((launch.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn test_lockstep_volleys() {
        let mut state = BattleState::new();
        let dt = 1.0 / 30.0;
        let mut ticks = 0;
        while state.arrows.is_empty() {
            tick_archery(&mut state, dt);
            ticks += 1;
            assert!(ticks < 60, "volley never fired");
        }
        // both sides fired exactly one arrow each at base levels
        assert_eq!(state.arrows.len(), 2);
        assert!(state.arrows.iter().any(|a| a.side == Side::Left));
        assert!(state.arrows.iter().any(|a| a.side == Side::Right));
        assert!(state.arrows.iter().all(|a| a.main));
        assert_eq!(state.sides.left.arrows_fired, 1);
        assert_eq!(state.sides.right.arrows_fired, 1);
        assert!(state.sides.left.shot_cd > 0.0);
    }

    #[test]
    fn test_volley_directions_mirrored() {
        let mut state = BattleState::new();
        for _ in 0..40 {
            tick_archery(&mut state, 1.0 / 30.0);
        }
        let left = state.arrows.iter().find(|a| a.side == Side::Left).unwrap();
        let right = state.arrows.iter().find(|a| a.side == Side::Right).unwrap();
        assert!(left.vel.x > 0.0);
        assert!(right.vel.x < 0.0);
        assert!((left.vel.x + right.vel.x).abs() < 1e-3);
    }

    #[test]
    fn test_multi_shot_power_adds_arrows() {
        let mut state = BattleState::new();
        state.sides.left.pending_shot_power = Some(ShotPowerKind::MultiShot);
        state.sides.left.pending_shot_power_shots = 3;
        for _ in 0..40 {
            tick_archery(&mut state, 1.0 / 30.0);
        }
        let left_count = state.arrows.iter().filter(|a| a.side == Side::Left).count();
        let right_count = state.arrows.iter().filter(|a| a.side == Side::Right).count();
        assert_eq!(right_count, 1);
        // base 1 + 2 + floor(2 * 1.0) with power level 1
        assert_eq!(left_count, 5);
        assert_eq!(
            state.arrows.iter().filter(|a| a.side == Side::Left && a.main).count(),
            1
        );
        assert_eq!(state.sides.left.pending_shot_power_shots, 2);
    }

    #[test]
    fn test_power_expires_after_three_shots() {
        let mut state = BattleState::new();
        state.sides.left.pending_shot_power = Some(ShotPowerKind::PierceShot);
        state.sides.left.pending_shot_power_shots = 3;
        for _ in 0..200 {
            tick_archery(&mut state, 1.0 / 30.0);
        }
        assert!(state.sides.left.pending_shot_power.is_none());
        assert_eq!(state.sides.left.pending_shot_power_shots, 0);
        let pierced = state
            .arrows
            .iter()
            .filter(|a| a.side == Side::Left && a.pierce > 0)
            .count();
        assert_eq!(pierced, 3);
    }

    #[test]
    fn test_volley_count_from_levels() {
        let mut state = BattleState::new();
        state.sides.left.upgrades.multi_shot = 5;
        state.sides.left.upgrades.volley = 1;
        for _ in 0..40 {
            tick_archery(&mut state, 1.0 / 30.0);
        }
        // 1 + floor((5-1)/2) + 1 = 4
        let left_count = state.arrows.iter().filter(|a| a.side == Side::Left).count();
        assert_eq!(left_count, 4);
    }
}
