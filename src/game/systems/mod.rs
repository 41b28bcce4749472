//! Per-tick simulation systems, run in a fixed order by the room:
//! archery (lockstep volleys), ballistics (arrow flight and impact),
//! minion AI (train, move, fight), combat resolution (deaths, blasts,
//! servants) and the economy (gold, pickups, upgrade cards).

pub mod archery;
pub mod ballistics;
pub mod combat;
pub mod economy;
pub mod minion_ai;
