//! Room lifecycle: codes, join/leave, the tick fan-out.

pub mod manager;

pub use manager::{JoinError, RoomManager};
