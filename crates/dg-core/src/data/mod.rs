//! Static definitions: classes, skills, items, loot tables, monsters, dungeons
//!
//! Definitions are immutable once built and shared between instances behind
//! an `Arc`. They are authored as a [`DefinitionPack`] (plain lists, easy to
//! write as JSON) and indexed into [`Definitions`] after validation.

mod class;
mod dungeon;
mod item;
mod monster;
mod skill;

pub use class::{ClassDef, StatGrowth};
pub use dungeon::{DungeonDef, FloorDef, SpawnDef};
pub use item::{Consumable, ItemDef, LootEntry, LootTable, Rarity};
pub use monster::{AbilityDef, AbilityKind, EffectDef, MonsterDef, PhaseDef};
pub use skill::{SkillEffect, SkillNode, SkillRequirement};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::world::DefinitionError;

/// Authoring form of the definition tables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionPack {
    #[serde(default)]
    pub classes: Vec<ClassDef>,
    #[serde(default)]
    pub skills: Vec<SkillNode>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub loot_tables: Vec<LootTable>,
    #[serde(default)]
    pub monsters: Vec<MonsterDef>,
    #[serde(default)]
    pub dungeons: Vec<DungeonDef>,
}

/// Validated, indexed definition tables
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    classes: HashMap<String, ClassDef>,
    skills: HashMap<String, SkillNode>,
    items: HashMap<String, ItemDef>,
    loot_tables: HashMap<String, LootTable>,
    monsters: HashMap<String, MonsterDef>,
    dungeons: HashMap<String, DungeonDef>,
}

impl Definitions {
    /// Index and validate a pack.
    pub fn from_pack(pack: DefinitionPack) -> Result<Self, DefinitionError> {
        let defs = Self {
            classes: index(pack.classes, |c| &c.id, "class")?,
            skills: index(pack.skills, |s| &s.id, "skill")?,
            items: index(pack.items, |i| &i.id, "item")?,
            loot_tables: index(pack.loot_tables, |t| &t.id, "loot table")?,
            monsters: index(pack.monsters, |m| &m.id, "monster")?,
            dungeons: index(pack.dungeons, |d| &d.id, "dungeon")?,
        };
        defs.validate()?;
        Ok(defs)
    }

    /// Parse a JSON pack and validate it.
    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let pack: DefinitionPack =
            serde_json::from_str(json).map_err(|e| DefinitionError::Parse(e.to_string()))?;
        Self::from_pack(pack)
    }

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id)
    }

    pub fn skill(&self, id: &str) -> Option<&SkillNode> {
        self.skills.get(id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn loot_table(&self, id: &str) -> Option<&LootTable> {
        self.loot_tables.get(id)
    }

    pub fn monster(&self, id: &str) -> Option<&MonsterDef> {
        self.monsters.get(id)
    }

    pub fn dungeon(&self, id: &str) -> Option<&DungeonDef> {
        self.dungeons.get(id)
    }

    pub fn skills(&self) -> impl Iterator<Item = &SkillNode> {
        self.skills.values()
    }

    pub fn dungeons(&self) -> impl Iterator<Item = &DungeonDef> {
        self.dungeons.values()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    fn validate(&self) -> Result<(), DefinitionError> {
        for skill in self.skills.values() {
            if let Some(req) = &skill.requires {
                if !self.skills.contains_key(&req.skill) {
                    return Err(DefinitionError::missing("skill", &req.skill, &skill.id));
                }
            }
            if let Some(class_id) = &skill.class_id {
                if !self.classes.contains_key(class_id) {
                    return Err(DefinitionError::missing("class", class_id, &skill.id));
                }
            }
            if skill.max_rank == 0 {
                return Err(DefinitionError::Invalid {
                    owner: skill.id.clone(),
                    reason: "max_rank must be at least 1".to_string(),
                });
            }
        }

        for table in self.loot_tables.values() {
            for entry in &table.entries {
                if !self.items.contains_key(&entry.item) {
                    return Err(DefinitionError::missing("item", &entry.item, &table.id));
                }
                if entry.min_rarity > entry.max_rarity {
                    return Err(DefinitionError::Invalid {
                        owner: table.id.clone(),
                        reason: format!("rarity range of {} is inverted", entry.item),
                    });
                }
            }
            if !table.entries.is_empty() && table.total_weight() == 0 {
                return Err(DefinitionError::Invalid {
                    owner: table.id.clone(),
                    reason: "entries have zero total weight".to_string(),
                });
            }
        }

        for monster in self.monsters.values() {
            self.validate_monster(monster)?;
        }

        for dungeon in self.dungeons.values() {
            if dungeon.floors.is_empty() {
                return Err(DefinitionError::Invalid {
                    owner: dungeon.id.clone(),
                    reason: "dungeon has no floors".to_string(),
                });
            }
            for floor in &dungeon.floors {
                for spawn in &floor.monsters {
                    if !self.monsters.contains_key(&spawn.monster) {
                        return Err(DefinitionError::missing("monster", &spawn.monster, &dungeon.id));
                    }
                }
            }
        }

        Ok(())
    }

    fn validate_monster(&self, monster: &MonsterDef) -> Result<(), DefinitionError> {
        if let Some(table) = &monster.loot_table {
            if !self.loot_tables.contains_key(table) {
                return Err(DefinitionError::missing("loot table", table, &monster.id));
            }
        }

        for ability in &monster.abilities {
            if let AbilityKind::Summon { monster: summoned, .. } = &ability.kind {
                if !self.monsters.contains_key(summoned) {
                    return Err(DefinitionError::missing("monster", summoned, &monster.id));
                }
            }
        }

        let thresholds_descending = monster
            .phases
            .windows(2)
            .all(|w| w[0].hp_ratio > w[1].hp_ratio);
        if !thresholds_descending {
            return Err(DefinitionError::Invalid {
                owner: monster.id.clone(),
                reason: "phase thresholds must be strictly descending".to_string(),
            });
        }
        for phase in &monster.phases {
            for ability in &phase.abilities {
                if monster.ability(ability).is_none() {
                    return Err(DefinitionError::missing("ability", ability, &monster.id));
                }
            }
        }

        Ok(())
    }
}

fn index<T>(
    items: Vec<T>,
    key: impl Fn(&T) -> &String,
    kind: &'static str,
) -> Result<HashMap<String, T>, DefinitionError> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        let id = key(&item).clone();
        if map.insert(id.clone(), item).is_some() {
            return Err(DefinitionError::Duplicate { kind, id });
        }
    }
    Ok(map)
}
