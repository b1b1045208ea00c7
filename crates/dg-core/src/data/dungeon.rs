//! Dungeon layouts: floors, spawn points and monster placements

use serde::{Deserialize, Serialize};

use crate::Vec3;

/// A monster placed on a floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnDef {
    pub monster: String,
    pub position: Vec3,
    /// Overrides the monster's own respawn delay on this floor
    #[serde(default)]
    pub respawn_secs: Option<f32>,
}

/// One floor of a dungeon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDef {
    pub spawn_point: Vec3,
    pub monsters: Vec<SpawnDef>,
}

/// A dungeon: an ordered list of floors, the last being the boss floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DungeonDef {
    pub id: String,
    pub name: String,
    pub floors: Vec<FloorDef>,
}

impl DungeonDef {
    pub fn floor(&self, index: usize) -> Option<&FloorDef> {
        self.floors.get(index)
    }

    pub fn is_boss_floor(&self, index: usize) -> bool {
        !self.floors.is_empty() && index + 1 == self.floors.len()
    }
}
