//! Twin Keeps Server Library
//!
//! Authoritative simulation for a two-sided real-time siege battle: two
//! kingdoms, one archer tower each, autonomous minion streams, shared
//! pickups and an escalating upgrade meta-game, all resolved by a
//! fixed-timestep server tick.

pub mod config;
pub mod util;
pub mod game;
pub mod lobby;
