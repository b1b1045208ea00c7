//! Error types for the dungeon simulation
//!
//! Gameplay precondition failures (cooldowns, mana, missing items) are
//! ordinary values reported back to the requesting client; nothing here is
//! fatal to an instance.

use thiserror::Error;

/// Problems found while loading definition tables
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DefinitionError {
    #[error("could not parse definitions: {0}")]
    Parse(String),

    #[error("duplicate {kind} id '{id}'")]
    Duplicate { kind: &'static str, id: String },

    #[error("{owner} references unknown {kind} '{id}'")]
    MissingReference {
        kind: &'static str,
        id: String,
        owner: String,
    },

    #[error("{owner}: {reason}")]
    Invalid { owner: String, reason: String },
}

impl DefinitionError {
    pub(crate) fn missing(kind: &'static str, id: &str, owner: &str) -> Self {
        DefinitionError::MissingReference {
            kind,
            id: id.to_string(),
            owner: owner.to_string(),
        }
    }
}

/// Why a skill could not be executed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkillError {
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),

    #[error("player is not in this instance")]
    UnknownPlayer,

    #[error("dead players cannot use skills")]
    PlayerDead,

    #[error("skill '{0}' has not been learned")]
    NotLearned(String),

    #[error("skill is on cooldown for {remaining:.1}s")]
    OnCooldown { remaining: f64 },

    #[error("not enough mana: need {needed}, have {available}")]
    InsufficientMana { needed: i32, available: i32 },

    #[error("hotbar slot {0} is empty")]
    EmptySlot(usize),
}

/// Why a skill point could not be allocated
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AllocateError {
    #[error("unknown skill '{0}'")]
    UnknownSkill(String),

    #[error("skill belongs to another class")]
    WrongClass,

    #[error("requires level {required}")]
    LevelTooLow { required: u32 },

    #[error("requires {points} point(s) in '{skill}'")]
    MissingPrerequisite { skill: String, points: u32 },

    #[error("skill is already at max rank")]
    MaxRank,

    #[error("no skill points available")]
    NoSkillPoints,
}

/// Why a hotbar assignment was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HotbarError {
    #[error("hotbar slot {0} does not exist")]
    InvalidSlot(usize),

    #[error("skill '{0}' has not been learned")]
    NotLearned(String),
}

/// Why a consumable could not be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ItemUseError {
    #[error("player is not in this instance")]
    UnknownPlayer,

    #[error("dead players cannot use items")]
    PlayerDead,

    #[error("no '{0}' in inventory")]
    NotInInventory(String),

    #[error("'{0}' cannot be used")]
    NotConsumable(String),

    #[error("item is on cooldown for {remaining:.1}s")]
    OnCooldown { remaining: f64 },
}

/// Errors from the persistence collaborator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("persistence backend unavailable: {0}")]
    Unavailable(String),

    #[error("persistence backend error: {0}")]
    Backend(String),
}

/// Errors creating an instance or admitting players
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InstanceError {
    #[error("unknown dungeon '{0}'")]
    UnknownDungeon(String),

    #[error("unknown class '{0}'")]
    UnknownClass(String),

    #[error("player {0} is already in this instance")]
    AlreadyJoined(u32),

    #[error("could not load player record: {0}")]
    Persistence(#[from] PersistError),

    #[error("could not start the save writer: {0}")]
    SaveWriter(String),
}

/// Errors loading an instance configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
