//! Player system
//!
//! The replicated player entity, its stat block and the per-player state
//! that never leaves the server (inventory, skills, cooldowns).

mod inventory;
pub mod progression;

pub use inventory::{Inventory, ItemStack};
pub use progression::{derive_stats, fresh_stats, grant_xp, xp_to_next};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::Vec3;

/// Unique identifier for a player, stable across sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Animation tag replicated to clients
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnimTag {
    #[default]
    Idle,
    Run,
    Attack,
    Dead,
}

/// Levelable stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
    pub hp: i32,
    pub max_hp: i32,
    pub mana: i32,
    pub max_mana: i32,

    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,

    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub vitality: i32,
    pub armor: i32,

    pub skill_points: u32,
}

impl Stats {
    /// Change hp by `delta`, clamped to `[0, max_hp]`. Returns the applied
    /// change.
    pub fn adjust_hp(&mut self, delta: i32) -> i32 {
        let before = self.hp;
        self.hp = (self.hp.saturating_add(delta)).clamp(0, self.max_hp);
        self.hp - before
    }

    /// Change mana by `delta`, clamped to `[0, max_mana]`. Returns the
    /// applied change.
    pub fn adjust_mana(&mut self, delta: i32) -> i32 {
        let before = self.mana;
        self.mana = (self.mana.saturating_add(delta)).clamp(0, self.max_mana);
        self.mana - before
    }
}

/// Replicated player state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntity {
    pub id: PlayerId,
    pub name: String,
    pub class_id: String,
    pub position: Vec3,
    /// Facing angle in radians; 0 faces +Z
    pub facing: f32,
    pub anim: AnimTag,
    /// Sequence number of the last applied input, -1 before any
    pub last_input_seq: i64,
    pub stats: Stats,
}

impl PlayerEntity {
    pub fn new(id: PlayerId, name: &str, class_id: &str, stats: Stats, position: Vec3) -> Self {
        Self {
            id,
            name: name.to_string(),
            class_id: class_id.to_string(),
            position,
            facing: 0.0,
            anim: AnimTag::Idle,
            last_input_seq: -1,
            stats,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.stats.hp > 0
    }
}
