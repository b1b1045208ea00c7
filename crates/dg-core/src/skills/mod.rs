//! Skill tree allocation, hotbar and skill preconditions
//!
//! Execution itself lives in the instance since it touches monsters; this
//! module holds the per-player bookkeeping and the ordered checks that gate
//! allocation and use.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::data::{Definitions, SkillNode};
use crate::player::Stats;
use crate::world::{AllocateError, HotbarError, SkillError};
use crate::{HOTBAR_SLOTS, SKILL_RANK_BONUS};

/// A player's allocated skill points and hotbar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillBook {
    pub allocations: BTreeMap<String, u32>,
    pub hotbar: Vec<Option<String>>,
}

impl Default for SkillBook {
    fn default() -> Self {
        Self {
            allocations: BTreeMap::new(),
            hotbar: vec![None; HOTBAR_SLOTS],
        }
    }
}

impl SkillBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored allocations and hotbar, dropping anything the
    /// current definitions no longer know about.
    pub fn restore(
        defs: &Definitions,
        allocations: BTreeMap<String, u32>,
        hotbar: Vec<Option<String>>,
    ) -> Self {
        let allocations: BTreeMap<String, u32> = allocations
            .into_iter()
            .filter_map(|(id, points)| {
                let node = defs.skill(&id)?;
                (points > 0).then(|| (id, points.min(node.max_rank)))
            })
            .collect();
        let mut book = Self {
            allocations,
            ..Self::default()
        };
        for (slot, skill) in hotbar.into_iter().take(HOTBAR_SLOTS).enumerate() {
            book.hotbar[slot] = skill.filter(|id| book.allocations.contains_key(id));
        }
        book
    }

    pub fn points(&self, skill_id: &str) -> u32 {
        self.allocations.get(skill_id).copied().unwrap_or(0)
    }

    /// Spend one skill point on `node_id`.
    ///
    /// Checks run in order: node exists, class matches, level, prerequisite,
    /// max rank, available points. Nothing changes on failure. Returns the
    /// new rank.
    pub fn allocate(
        &mut self,
        defs: &Definitions,
        node_id: &str,
        class_id: &str,
        stats: &mut Stats,
    ) -> Result<u32, AllocateError> {
        let node = defs
            .skill(node_id)
            .ok_or_else(|| AllocateError::UnknownSkill(node_id.to_string()))?;

        if node.class_id.as_deref().is_some_and(|c| c != class_id) {
            return Err(AllocateError::WrongClass);
        }
        if stats.level < node.required_level {
            return Err(AllocateError::LevelTooLow {
                required: node.required_level,
            });
        }
        if let Some(req) = &node.requires {
            if self.points(&req.skill) < req.points {
                return Err(AllocateError::MissingPrerequisite {
                    skill: req.skill.clone(),
                    points: req.points,
                });
            }
        }
        let current = self.points(node_id);
        if current >= node.max_rank {
            return Err(AllocateError::MaxRank);
        }
        if stats.skill_points == 0 {
            return Err(AllocateError::NoSkillPoints);
        }

        stats.skill_points -= 1;
        self.allocations.insert(node_id.to_string(), current + 1);
        Ok(current + 1)
    }

    /// Assign or clear a hotbar slot.
    pub fn set_hotbar(&mut self, slot: usize, skill_id: Option<String>) -> Result<(), HotbarError> {
        if slot >= self.hotbar.len() {
            return Err(HotbarError::InvalidSlot(slot));
        }
        if let Some(id) = &skill_id {
            if self.points(id) == 0 {
                return Err(HotbarError::NotLearned(id.clone()));
            }
        }
        self.hotbar[slot] = skill_id;
        Ok(())
    }

    pub fn hotbar_skill(&self, slot: usize) -> Option<&str> {
        self.hotbar.get(slot)?.as_deref()
    }
}

/// Damage multiplier for a skill at the given rank.
pub fn rank_multiplier(node: &SkillNode, points: u32) -> f32 {
    node.base_value + SKILL_RANK_BONUS * points.saturating_sub(1) as f32
}

/// Cooldown expiry timestamps keyed by skill or item id
#[derive(Debug, Clone, Default)]
pub struct Cooldowns {
    expiry: HashMap<String, f64>,
}

impl Cooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds left, or `None` when ready.
    pub fn remaining(&self, id: &str, now: f64) -> Option<f64> {
        self.expiry
            .get(id)
            .map(|until| until - now)
            .filter(|left| *left > 0.0)
    }

    pub fn arm(&mut self, id: &str, until: f64) {
        self.expiry.insert(id.to_string(), until);
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }
}

/// Ordered precondition checks for using a skill that exists.
///
/// The player must have learned it, it must be off cooldown and the player
/// must have the mana.
pub fn check_use(
    node: &SkillNode,
    book: &SkillBook,
    stats: &Stats,
    cooldowns: &Cooldowns,
    now: f64,
) -> Result<(), SkillError> {
    if book.points(&node.id) == 0 {
        return Err(SkillError::NotLearned(node.id.clone()));
    }
    if let Some(remaining) = cooldowns.remaining(&node.id, now) {
        return Err(SkillError::OnCooldown { remaining });
    }
    if stats.mana < node.mana_cost {
        return Err(SkillError::InsufficientMana {
            needed: node.mana_cost,
            available: stats.mana,
        });
    }
    Ok(())
}
