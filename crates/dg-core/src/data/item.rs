//! Items, rarity tiers and loot tables

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Ordinal item quality, lowest first
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum Rarity {
    #[default]
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Epic = 3,
    Legendary = 4,
}

impl Rarity {
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Rarity for an ordinal, saturating at the highest tier.
    pub const fn from_ordinal(ordinal: u8) -> Self {
        match ordinal {
            0 => Rarity::Common,
            1 => Rarity::Uncommon,
            2 => Rarity::Rare,
            3 => Rarity::Epic,
            _ => Rarity::Legendary,
        }
    }
}

/// Effect of drinking or using a consumable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consumable {
    #[serde(default)]
    pub heal: i32,
    #[serde(default)]
    pub mana: i32,
    /// Shared cooldown for this consumable (seconds)
    pub cooldown: f64,
}

/// An item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
    #[serde(default)]
    pub consumable: Option<Consumable>,
}

fn default_max_stack() -> u32 {
    1
}

/// One weighted row of a loot table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: String,
    pub weight: u32,
    #[serde(default)]
    pub min_rarity: Rarity,
    #[serde(default)]
    pub max_rarity: Rarity,
}

/// Drops rolled when a monster using this table dies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootTable {
    pub id: String,
    /// Drops that always happen
    pub guaranteed: u32,
    /// Up to this many extra drops, uniformly
    pub max_extra: u32,
    pub entries: Vec<LootEntry>,
}

impl LootTable {
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|e| e.weight).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_rarity_ordinals_round_trip() {
        for r in Rarity::iter() {
            assert_eq!(Rarity::from_ordinal(r.ordinal()), r);
        }
        assert_eq!(Rarity::from_ordinal(200), Rarity::Legendary);
    }

    #[test]
    fn test_rarity_names() {
        assert_eq!(Rarity::Uncommon.to_string(), "uncommon");
        assert_eq!(Rarity::from_str("epic").unwrap(), Rarity::Epic);
        assert!(Rarity::Common < Rarity::Rare);
    }
}
