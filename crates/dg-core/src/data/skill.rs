//! Skill tree nodes

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// What a skill does when executed.
///
/// Each variant has a dedicated resolver in the instance; adding a skill
/// means adding a variant here and the compiler points at every match that
/// must handle it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SkillEffect {
    /// Single hit on the nearest monster in range
    PowerStrike,
    /// Independent hit on every monster around the caster
    Whirlwind,
    /// Dash forward, then stun and hit the nearest monster
    Charge,
}

/// Points another node must have before this one can be learned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRequirement {
    pub skill: String,
    pub points: u32,
}

/// A node in the skill tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillNode {
    pub id: String,
    pub name: String,
    pub effect: SkillEffect,

    /// Restrict the node to one class; `None` means any class
    #[serde(default)]
    pub class_id: Option<String>,

    pub max_rank: u32,
    #[serde(default = "default_required_level")]
    pub required_level: u32,
    #[serde(default)]
    pub requires: Option<SkillRequirement>,

    pub mana_cost: i32,
    /// Seconds before the skill can be used again
    pub cooldown: f64,

    /// Damage multiplier at rank 1
    pub base_value: f32,
    /// Hit range (Power Strike), area radius (Whirlwind) or stun search
    /// range after the dash (Charge)
    pub range: f32,
}

fn default_required_level() -> u32 {
    1
}
