//! Playable classes

use dg_core::data::{ClassDef, StatGrowth};

fn class(
    id: &str,
    name: &str,
    (base_hp, base_mana): (i32, i32),
    (hp_per_level, mana_per_level): (i32, i32),
    base_armor: i32,
    [strength, dexterity, intelligence, vitality]: [i32; 4],
    growth: StatGrowth,
) -> ClassDef {
    ClassDef {
        id: id.to_string(),
        name: name.to_string(),
        base_hp,
        base_mana,
        hp_per_level,
        mana_per_level,
        base_armor,
        strength,
        dexterity,
        intelligence,
        vitality,
        growth,
    }
}

/// Warrior, ranger and mage
pub fn classes() -> Vec<ClassDef> {
    vec![
        class(
            "warrior",
            "Warrior",
            (100, 30),
            (12, 3),
            5,
            [14, 6, 4, 10],
            StatGrowth {
                strength: 2,
                dexterity: 1,
                intelligence: 0,
                vitality: 2,
            },
        ),
        class(
            "ranger",
            "Ranger",
            (80, 40),
            (9, 4),
            3,
            [9, 14, 6, 7],
            StatGrowth {
                strength: 1,
                dexterity: 2,
                intelligence: 1,
                vitality: 1,
            },
        ),
        class(
            "mage",
            "Mage",
            (60, 80),
            (6, 8),
            1,
            [5, 8, 15, 5],
            StatGrowth {
                strength: 0,
                dexterity: 1,
                intelligence: 3,
                vitality: 1,
            },
        ),
    ]
}
