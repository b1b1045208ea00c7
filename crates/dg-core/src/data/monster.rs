//! Monster definitions, abilities and boss phases
//!
//! Bosses are ordinary monsters whose definition carries `is_boss`, a phase
//! table and phase-gated abilities. AI branches on these fields rather than
//! on a separate type.

use serde::{Deserialize, Serialize};

use crate::RANGED_ATTACK_THRESHOLD;
use crate::combat::StatusKind;

/// A damage-over-time (or control) effect an ability attaches
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectDef {
    pub kind: StatusKind,
    #[serde(default)]
    pub damage_per_tick: i32,
    pub tick_interval: f32,
    pub duration: f32,
}

/// How an ability is delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AbilityKind {
    /// Fires a projectile at the target
    Projectile {
        speed: f32,
        radius: f32,
        lifetime: f32,
    },
    /// Direct hit on the target, carrying the ability's effect
    Strike,
    /// Hits every player within `radius` of the monster
    Nova { radius: f32 },
    /// Warns players, then hits everyone inside `radius` after `delay`
    Telegraph { radius: f32, delay: f64 },
    /// Applies the ability's effect to the nearest player
    Root,
    /// Calls additional monsters that never respawn
    Summon {
        monster: String,
        count: u32,
        max_alive: u32,
        spread: f32,
    },
}

/// A monster ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    pub id: String,
    pub cooldown: f32,
    /// Target must be within this distance for the ability to fire
    pub range: f32,
    #[serde(default)]
    pub damage: i32,
    #[serde(default)]
    pub effect: Option<EffectDef>,
    #[serde(flatten)]
    pub kind: AbilityKind,
}

/// One boss phase
///
/// A phase applies while `hp / max_hp <= hp_ratio`. Phases are listed from
/// the highest threshold down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseDef {
    pub hp_ratio: f32,
    #[serde(default = "one")]
    pub damage_mult: f32,
    #[serde(default = "one")]
    pub speed_mult: f32,
    /// Ability ids usable during this phase
    #[serde(default)]
    pub abilities: Vec<String>,
}

fn one() -> f32 {
    1.0
}

/// A monster definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterDef {
    pub id: String,
    pub name: String,

    pub max_hp: i32,
    /// Raw melee damage before phase scaling and mitigation
    pub damage: i32,
    #[serde(default)]
    pub armor: i32,

    pub speed: f32,
    pub aggro_range: f32,
    pub attack_range: f32,
    /// Seconds between basic attacks
    pub attack_cooldown: f32,

    pub xp: u32,
    #[serde(default)]
    pub loot_table: Option<String>,
    /// Seconds before a dead monster returns; 0 means never
    #[serde(default)]
    pub respawn_secs: f32,

    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub phases: Vec<PhaseDef>,
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,
}

impl MonsterDef {
    /// Long attack range makes a monster ranged, which enables kiting.
    pub fn is_ranged(&self) -> bool {
        self.attack_range >= RANGED_ATTACK_THRESHOLD
    }

    /// Farthest distance at which anything about this monster reacts to a
    /// player.
    pub fn max_reach(&self) -> f32 {
        self.abilities
            .iter()
            .map(|a| a.range)
            .fold(self.aggro_range.max(self.attack_range), f32::max)
    }

    pub fn ability(&self, id: &str) -> Option<&AbilityDef> {
        self.abilities.iter().find(|a| a.id == id)
    }
}
