//! Simulation constants, grouped by concern.
//!
//! The battlefield is a fixed-size side view: towers at both ends, a shared
//! ground line, pickups falling down the middle. All distances are in world
//! pixels, all times in seconds.

/// World geometry
pub mod world {
    /// Battlefield width
    pub const WIDTH: f32 = 1470.0;
    /// Battlefield height
    pub const HEIGHT: f32 = 760.0;
    /// Ground line
    pub const GROUND_Y: f32 = 690.0;
    /// Tower base height
    pub const TOWER_Y: f32 = 600.0;
    /// Left tower x
    pub const TOWER_X_LEFT: f32 = 110.0;
    /// Right tower x
    pub const TOWER_X_RIGHT: f32 = WIDTH - TOWER_X_LEFT;
    /// Archers stand this far above the tower base
    pub const ARCHER_ORIGIN_Y: f32 = TOWER_Y - 56.0;
    /// Margin outside the world bounds before an arrow despawns
    pub const OUT_OF_BOUNDS_MARGIN: f32 = 50.0;

    /// Mirror an x-coordinate across the battlefield center
    #[inline]
    pub fn mirrored_x(x: f32) -> f32 {
        WIDTH - x
    }
}

/// Tick cadence
pub mod timing {
    /// Server tick rate in Hz
    pub const TICK_RATE: u32 = 30;
    /// Delta time per tick in seconds
    pub const DT: f32 = 1.0 / TICK_RATE as f32;
}

/// Archer shot parameters
pub mod shot {
    /// Both sides fire in lockstep on this interval
    pub const INTERVAL: f32 = 1.0;
    /// Arrow time-to-live in seconds
    pub const TTL: f32 = 3.5;
    /// Default arrow radius
    pub const RADIUS: f32 = 4.0;
    /// Minimum pull strength (a slack pad still lobs something)
    pub const MIN_STRENGTH: f32 = 0.05;
    /// Speed = (BASE + strength * SCALE) * BOOST
    pub const SPEED_BASE: f32 = 230.0;
    pub const SPEED_SCALE: f32 = 380.0;
    pub const SPEED_BOOST: f32 = 1.5;
    /// Gravity = BASE - strength * RELIEF
    pub const GRAVITY_BASE: f32 = 980.0;
    pub const GRAVITY_RELIEF: f32 = 220.0;
    /// Damage multiplier = CHARGE_FLOOR + strength * CHARGE_SCALE
    pub const CHARGE_FLOOR: f32 = 0.55;
    pub const CHARGE_SCALE: f32 = 0.95;
    /// Angular spread between volley arrows
    pub const VOLLEY_SPREAD: f32 = 0.09;
    /// Spread while a multi-shot power is active
    pub const MULTI_SPREAD: f32 = 0.14;
    /// Arrows stick into the ground slightly below the ground line
    pub const GROUND_SINK: f32 = 12.0;
    /// Horizontal offset of the launch point from the tower center
    pub const LAUNCH_OFFSET_X: f32 = 35.0;
    /// Shots granted per caught shot-power pickup
    pub const POWER_SHOTS: u32 = 3;
}

/// Combo streak (main-arrow hit accounting)
pub mod combo {
    /// Streak saturates here
    pub const MAX_STREAK: u32 = 10;
    /// Streak thresholds for damage tiers x2 / x3 / x4
    pub const TIER2_AT: u32 = 4;
    pub const TIER3_AT: u32 = 7;
    pub const TIER4_AT: u32 = MAX_STREAK;
    /// At max streak every main-arrow hit splashes nearby enemies
    pub const MAX_SPLASH_RADIUS: f32 = 76.0;
    /// Splash deals this fraction of the arrow's base damage
    pub const MAX_SPLASH_FRACTION: f32 = 0.34;
}

/// Unit baseline stats
pub mod unit {
    /// Base hp = HP_BASE + HP_PER_HP_LEVEL * unitHpLevel + HP_PER_ECO * ecoLevel
    pub const HP_BASE: f32 = 75.0;
    pub const HP_PER_HP_LEVEL: f32 = 30.0;
    pub const HP_PER_ECO: f32 = 18.0;
    /// Base dmg = DMG_BASE + DMG_PER_UNIT_LEVEL * unitLevel + DMG_PER_ECO * ecoLevel
    pub const DMG_BASE: f32 = 12.0;
    pub const DMG_PER_UNIT_LEVEL: f32 = 6.0;
    pub const DMG_PER_ECO: f32 = 3.0;
    pub const SPEED_BASE: f32 = 54.0;
    pub const SPEED_PER_UNIT_LEVEL: f32 = 1.5;
    pub const SPEED_PER_ECO: f32 = 0.6;
    pub const RADIUS: f32 = 16.0;
    /// Spawn interval = max(SPAWN_FLOOR, SPAWN_BASE - SPAWN_PER_LEVEL * spawnLevel)
    pub const SPAWN_FLOOR: f32 = 0.65;
    pub const SPAWN_BASE: f32 = 2.2;
    pub const SPAWN_PER_LEVEL: f32 = 0.09;
    /// Units emerge this far in front of their tower
    pub const SPAWN_OFFSET_X: f32 = 56.0;
    /// Vertical spawn jitter around the tower line
    pub const SPAWN_JITTER_Y: f32 = 55.0;
    /// Melee reach beyond combined radii
    pub const MELEE_REACH_PAD: f32 = 24.0;
    /// Tower strike zone sits this far in front of the enemy tower
    pub const TOWER_FACE_OFFSET: f32 = 46.0;
    pub const TOWER_REACH_PAD: f32 = 20.0;
    pub const TOWER_REACH_FLYING: f32 = 34.0;
    pub const TOWER_REACH_DRAGON: f32 = 50.0;
    pub const MELEE_CD: f32 = 0.8;
    pub const TOWER_CD: f32 = 0.65;
}

/// Dragon tuning
pub mod dragon {
    pub const RANGE: f32 = 170.0;
    pub const BREATH_CD: f32 = 1.05;
    pub const BREATH_MUL: f32 = 1.22;
    pub const BREATH_SPLASH_FRACTION: f32 = 0.44;
    pub const BREATH_SPLASH_RADIUS: f32 = 72.0;
    pub const TOWER_MUL: f32 = 1.24;
    pub const TOWER_CD: f32 = 0.92;
    /// Heart core: small weak point, arrows striking it are amplified
    pub const HEART_MUL: f32 = 2.85;
    pub const HEART_OFFSET_X: f32 = 0.34;
    pub const HEART_OFFSET_Y: f32 = -0.14;
    pub const HEART_RADIUS_FRACTION: f32 = 0.3;
    pub const HEART_RADIUS_MIN: f32 = 7.0;
    /// Flight bob
    pub const FLY_AMP_BASE: f32 = 12.0;
    pub const FLY_AMP_PER_RADIUS: f32 = 0.22;
    pub const FLY_RATE_BASE: f32 = 1.45;
    pub const FLY_RATE_SPEED_CAP: f32 = 1.1;
    /// Flyers settle toward this height above the tower line while advancing
    pub const CRUISE_ABOVE_TOWER: f32 = 120.0;
    pub const CRUISE_LERP: f32 = 2.2;
}

/// Gunner tuning
pub mod gunner {
    pub const SHOT_CD: f32 = 0.66;
    pub const SHOT_MUL: f32 = 1.06;
    pub const SPLASH_FRACTION: f32 = 0.2;
    pub const SPLASH_RADIUS: f32 = 42.0;
    pub const TOWER_MUL: f32 = 0.72;
    pub const TOWER_CD: f32 = 0.72;
    pub const RANGE_BASE: f32 = 198.0;
    pub const RANGE_PER_ARROW_LEVEL: f32 = 10.0;
    pub const RANGE_PER_UNIT_LEVEL: f32 = 6.0;
    pub const DRAGON_MUL_BASE: f32 = 1.95;
    pub const DRAGON_MUL_PER_ARROW_LEVEL: f32 = 0.05;
}

/// Rider tuning
pub mod rider {
    /// Walking distance that arms the charge strike
    pub const CHARGE_DISTANCE: f32 = 140.0;
    pub const CHARGE_MUL: f32 = 2.3;
}

/// Digger tuning
pub mod digger {
    pub const BOB_AMP: f32 = 6.0;
    pub const BOB_RATE: f32 = 6.2;
}

/// Monk tuning
pub mod monk {
    pub const HEAL_RANGE: f32 = 150.0;
    pub const HEAL_AMOUNT: f32 = 34.0;
    pub const HEAL_CD: f32 = 1.6;
    /// Allies must be missing at least this fraction of max hp
    pub const WOUND_THRESHOLD: f32 = 0.25;
    /// Each heal decays the monk's output
    pub const SCALE_DECAY: f32 = 0.93;
    pub const SCALE_FLOOR: f32 = 0.35;
}

/// Hero tuning
pub mod hero {
    /// Arrow hits required before a hero can die
    pub const ARROW_HITS_TO_KILL: u32 = 3;
    pub const SLASH_REACH_PAD: f32 = 46.0;
    pub const SLASH_CD: f32 = 1.1;
    /// Retreat below this hp fraction, resume above the other
    pub const RETREAT_BELOW: f32 = 0.28;
    pub const RESUME_ABOVE: f32 = 0.45;
    pub const BATTLE_CRIES: [&str; 4] = [
        "For the kingdom!",
        "Stand fast!",
        "None shall pass!",
        "To me, brothers!",
    ];
}

/// President tuning
pub mod president {
    pub const AURA_RADIUS: f32 = 180.0;
    pub const AURA_MUL: f32 = 1.28;
}

/// Bomber tuning
pub mod bomber {
    pub const BLAST_RADIUS_BASE: f32 = 78.0;
    pub const BLAST_RADIUS_PER_LEVEL: f32 = 9.0;
    /// Gold scalar for kills caused by the blast
    pub const CHAIN_GOLD_SCALAR: f32 = 0.75;
}

/// Necromancer tuning
pub mod necro {
    pub const SERVANTS: u32 = 4;
    pub const SERVANTS_SUPER: u32 = 6;
    pub const SERVANT_HP_FRACTION: f32 = 0.38;
    pub const SERVANT_HP_MIN: f32 = 30.0;
    pub const SERVANT_DMG_FRACTION: f32 = 0.42;
    pub const SERVANT_DMG_MIN: f32 = 7.0;
    pub const SERVANT_SPEED_FRACTION: f32 = 1.14;
    pub const SERVANT_SPEED_MIN: f32 = 56.0;
    pub const SERVANT_RADIUS_FRACTION: f32 = 0.52;
    pub const SERVANT_RADIUS_MIN: f32 = 10.0;
    /// Servants appear in a ring this far beyond the corpse radius
    pub const RING_PAD: f32 = 22.0;
}

/// Matchup multipliers (source kind vs target trait)
pub mod matchup {
    /// Ground melee struggles against flyers
    pub const MELEE_VS_FLYING: f32 = 0.72;
    /// Dragonfire burns through summoned servants
    pub const DRAGONFIRE_VS_SUMMONED: f32 = 1.22;
}

/// Economy
pub mod economy {
    pub const TOWER_HP: f32 = 6000.0;
    /// First eco threshold; next = floor(prev * ECO_GROWTH + ECO_STEP)
    pub const ECO_COST_BASE: f32 = 120.0;
    pub const ECO_GROWTH: f32 = 1.24;
    pub const ECO_STEP: f32 = 18.0;
    /// Kill bounty before bounty-level scaling
    pub const KILL_GOLD_BASE: f32 = 8.0;
    pub const BOUNTY_PER_LEVEL: f32 = 0.2;
    pub const RESOURCE_PER_LEVEL: f32 = 0.22;
    /// Initial upgrade-charge ceiling
    pub const CHARGE_MAX_BASE: f32 = 140.0;
    /// A ready upgrade is auto-picked after this grace period
    pub const AUTO_PICK_AFTER: f32 = 20.0;
}

/// Pickup spawning (always mirrored pairs)
pub mod pickup {
    pub const FIRST_RESOURCE_AT: f32 = 5.0;
    pub const FIRST_POWER_AT: f32 = 7.0;
    /// Resource interval = max(floor, ceiling - t / scale)
    pub const RESOURCE_INTERVAL_FLOOR: f32 = 3.2;
    pub const RESOURCE_INTERVAL_CEIL: f32 = 6.0;
    pub const RESOURCE_INTERVAL_SCALE: f32 = 200.0;
    pub const POWER_INTERVAL_FLOOR: f32 = 5.2;
    pub const POWER_INTERVAL_CEIL: f32 = 8.8;
    pub const POWER_INTERVAL_SCALE: f32 = 260.0;
    /// Left-half spawn band; the twin lands at the mirrored x
    pub const SPAWN_X_MIN: f32 = 680.0;
    pub const SPAWN_X_SPAN: f32 = 110.0;
    pub const RESOURCE_Y_MIN: f32 = 270.0;
    pub const RESOURCE_Y_SPAN: f32 = 340.0;
    pub const RESOURCE_RADIUS: f32 = 14.0;
    /// Resource value = BASE + STEP * floor(t / RAMP)
    pub const RESOURCE_VALUE_BASE: f32 = 26.0;
    pub const RESOURCE_VALUE_STEP: f32 = 2.0;
    pub const RESOURCE_VALUE_RAMP: f32 = 35.0;
    pub const POWER_SPAWN_Y: f32 = 40.0;
    pub const POWER_RADIUS: f32 = 16.0;
    pub const POWER_FALL_MIN: f32 = 120.0;
    pub const POWER_FALL_SPAN: f32 = 40.0;
}

/// Upgrade card geometry
pub mod card {
    pub const Y: f32 = 90.0;
    pub const WIDTH: f32 = 88.0;
    pub const HEIGHT: f32 = 56.0;
    /// Slot x positions on the left half; mirrored for the right side
    pub const SLOT_X: [f32; 2] = [220.0, 320.0];
    pub const SLOTS: usize = 2;
}
