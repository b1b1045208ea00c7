//! Character class definitions

use serde::{Deserialize, Serialize};

/// Core stat increments applied on each level-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatGrowth {
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub dexterity: i32,
    #[serde(default)]
    pub intelligence: i32,
    #[serde(default)]
    pub vitality: i32,
}

/// A playable class: starting stats and per-level growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDef {
    pub id: String,
    pub name: String,

    /// Hit points before vitality and level bonuses
    pub base_hp: i32,
    /// Mana before intelligence and level bonuses
    pub base_mana: i32,
    pub hp_per_level: i32,
    pub mana_per_level: i32,
    pub base_armor: i32,

    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub vitality: i32,

    #[serde(default)]
    pub growth: StatGrowth,
}
