//! Objects on the dungeon floor

mod loot;

pub use loot::{LootDrop, LootId, LootRoll, roll_drops, roll_gold};
