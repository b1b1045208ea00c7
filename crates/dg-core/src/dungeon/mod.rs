//! Dungeon floors and progression state

mod floor;

pub use floor::{FloorState, cancel_respawns_if_wiped, is_floor_cleared};
