//! Core battle simulation: state, constants, room orchestration and the
//! per-tick systems.

pub mod constants;
pub mod room;
pub mod state;
pub mod systems;
