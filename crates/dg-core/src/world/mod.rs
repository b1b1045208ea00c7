//! Replicated instance state and the plumbing around it
//!
//! [`InstanceState`] is what the replication layer diffs and sends to
//! clients. Everything simulation-only lives on the instance itself.

mod errors;
mod events;
mod options;
mod schedule;

pub use errors::{
    AllocateError, ConfigError, DefinitionError, HotbarError, InstanceError, ItemUseError,
    PersistError, SkillError,
};
pub use events::{ClientMessage, Envelope, Outbox, Recipient, ServerEvent};
pub use options::InstanceConfig;
pub use schedule::{EventSchedule, ScheduledEvent, ScheduledKind};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dungeon::FloorState;
use crate::monster::{MonsterEntity, MonsterId};
use crate::object::{LootDrop, LootId};
use crate::player::{PlayerEntity, PlayerId};

/// The replicated aggregate for one instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceState {
    pub players: BTreeMap<PlayerId, PlayerEntity>,
    pub monsters: BTreeMap<MonsterId, MonsterEntity>,
    pub loot: BTreeMap<LootId, LootDrop>,
    pub floor: FloorState,
}

impl InstanceState {
    pub fn new(floor: FloorState) -> Self {
        Self {
            players: BTreeMap::new(),
            monsters: BTreeMap::new(),
            loot: BTreeMap::new(),
            floor,
        }
    }

    pub fn living_monsters(&self) -> impl Iterator<Item = &MonsterEntity> {
        self.monsters.values().filter(|m| m.is_alive())
    }

    pub fn living_players(&self) -> impl Iterator<Item = &PlayerEntity> {
        self.players.values().filter(|p| p.is_alive())
    }
}
