//! Items and loot tables

use dg_core::data::{Consumable, ItemDef, LootEntry, LootTable, Rarity};

fn item(id: &str, name: &str, max_stack: u32, consumable: Option<Consumable>) -> ItemDef {
    ItemDef {
        id: id.to_string(),
        name: name.to_string(),
        max_stack,
        consumable,
    }
}

fn entry(item: &str, weight: u32, min_rarity: Rarity, max_rarity: Rarity) -> LootEntry {
    LootEntry {
        item: item.to_string(),
        weight,
        min_rarity,
        max_rarity,
    }
}

pub fn items() -> Vec<ItemDef> {
    vec![
        item(
            "health_potion",
            "Health Potion",
            10,
            Some(Consumable {
                heal: 60,
                mana: 0,
                cooldown: 8.0,
            }),
        ),
        item(
            "mana_potion",
            "Mana Potion",
            10,
            Some(Consumable {
                heal: 0,
                mana: 40,
                cooldown: 8.0,
            }),
        ),
        item("bone_fragment", "Bone Fragment", 50, None),
        item("rusty_sword", "Rusty Sword", 1, None),
        item("leather_cap", "Leather Cap", 1, None),
        item("chain_vest", "Chain Vest", 1, None),
        item("cultist_ring", "Cultist Ring", 1, None),
        item("crown_of_bone", "Crown of Bone", 1, None),
    ]
}

pub fn loot_tables() -> Vec<LootTable> {
    vec![
        LootTable {
            id: "trash".to_string(),
            guaranteed: 0,
            max_extra: 2,
            entries: vec![
                entry("bone_fragment", 50, Rarity::Common, Rarity::Common),
                entry("health_potion", 20, Rarity::Common, Rarity::Common),
                entry("mana_potion", 10, Rarity::Common, Rarity::Common),
                entry("rusty_sword", 10, Rarity::Common, Rarity::Uncommon),
                entry("leather_cap", 10, Rarity::Common, Rarity::Rare),
            ],
        },
        LootTable {
            id: "elite".to_string(),
            guaranteed: 1,
            max_extra: 2,
            entries: vec![
                entry("health_potion", 25, Rarity::Common, Rarity::Common),
                entry("chain_vest", 25, Rarity::Uncommon, Rarity::Rare),
                entry("cultist_ring", 15, Rarity::Uncommon, Rarity::Epic),
                entry("rusty_sword", 35, Rarity::Common, Rarity::Rare),
            ],
        },
        LootTable {
            id: "boss".to_string(),
            guaranteed: 3,
            max_extra: 2,
            entries: vec![
                entry("crown_of_bone", 10, Rarity::Epic, Rarity::Legendary),
                entry("cultist_ring", 30, Rarity::Rare, Rarity::Epic),
                entry("chain_vest", 30, Rarity::Rare, Rarity::Legendary),
                entry("health_potion", 30, Rarity::Common, Rarity::Common),
            ],
        },
    ]
}
