//! dg-save: File-backed persistence for the dungeon simulation
//!
//! [`JsonStore`] implements [`PersistenceGateway`] over a directory:
//!
//! ```text
//! <root>/players/<id>.json   one record per player
//! <root>/progress.json       the dungeon_progress table
//! ```
//!
//! Every file carries a header with the format version. Writes go to a
//! temporary file that is renamed over the target, so a crash never leaves
//! a half-written record. One store is shared by all instances in a
//! process; a mutex serializes read-modify-write cycles.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use dg_core::persist::{
    InventoryRecord, PersistenceGateway, PlayerRecord, SkillRecord, StatsRecord,
};
use dg_core::player::PlayerId;
use dg_core::world::PersistError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::debug;

/// Current save file format version
pub const SAVE_VERSION: u32 = 1;

const MAGIC: &str = "DGSV";

/// Save/restore errors
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid save file header")]
    InvalidHeader,

    #[error("Incompatible save version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("Save store lock poisoned")]
    Poisoned,
}

impl From<SaveError> for PersistError {
    fn from(e: SaveError) -> Self {
        match e {
            SaveError::Io(_) | SaveError::Poisoned => PersistError::Unavailable(e.to_string()),
            _ => PersistError::Backend(e.to_string()),
        }
    }
}

/// Versioned wrapper around every stored document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SaveFile<T> {
    magic: String,
    version: u32,
    data: T,
}

impl<T> SaveFile<T> {
    fn new(data: T) -> Self {
        Self {
            magic: MAGIC.to_string(),
            version: SAVE_VERSION,
            data,
        }
    }

    fn validate(self) -> Result<T, SaveError> {
        if self.magic != MAGIC {
            return Err(SaveError::InvalidHeader);
        }
        if self.version != SAVE_VERSION {
            return Err(SaveError::IncompatibleVersion {
                expected: SAVE_VERSION,
                found: self.version,
            });
        }
        Ok(self.data)
    }
}

/// One row of the dungeon_progress table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonProgress {
    pub player: PlayerId,
    pub dungeon_id: String,
    pub clears: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProgressTable {
    dungeon_progress: Vec<DungeonProgress>,
}

/// Directory-backed store for player records and dungeon progress
#[derive(Debug)]
pub struct JsonStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, SaveError> {
        let root = root.into();
        fs::create_dir_all(root.join("players"))?;
        debug!(root = %root.display(), "opened save store");
        Ok(Self {
            root,
            lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn player_path(&self, player: PlayerId) -> PathBuf {
        self.root.join("players").join(format!("{}.json", player.0))
    }

    fn progress_path(&self) -> PathBuf {
        self.root.join("progress.json")
    }

    /// Stored record for a player, or an empty one if none exists.
    pub fn load(&self, player: PlayerId) -> Result<PlayerRecord, SaveError> {
        let _guard = self.lock.lock().map_err(|_| SaveError::Poisoned)?;
        Ok(read_json(&self.player_path(player))?.unwrap_or_default())
    }

    /// Every row of the dungeon_progress table.
    pub fn progress(&self) -> Result<Vec<DungeonProgress>, SaveError> {
        let _guard = self.lock.lock().map_err(|_| SaveError::Poisoned)?;
        let table: ProgressTable = read_json(&self.progress_path())?.unwrap_or_default();
        Ok(table.dungeon_progress)
    }

    /// Read a player record, change it and write it back under the lock.
    fn update(
        &self,
        player: PlayerId,
        f: impl FnOnce(&mut PlayerRecord),
    ) -> Result<(), SaveError> {
        let _guard = self.lock.lock().map_err(|_| SaveError::Poisoned)?;
        let path = self.player_path(player);
        let mut record: PlayerRecord = read_json(&path)?.unwrap_or_default();
        f(&mut record);
        write_json(&path, &record)?;
        debug!(%player, "player record written");
        Ok(())
    }

    fn increment_clears(&self, player: PlayerId, dungeon_id: &str) -> Result<u32, SaveError> {
        let _guard = self.lock.lock().map_err(|_| SaveError::Poisoned)?;
        let path = self.progress_path();
        let mut table: ProgressTable = read_json(&path)?.unwrap_or_default();
        let clears = match table
            .dungeon_progress
            .iter_mut()
            .find(|row| row.player == player && row.dungeon_id == dungeon_id)
        {
            Some(row) => {
                row.clears += 1;
                row.clears
            }
            None => {
                table.dungeon_progress.push(DungeonProgress {
                    player,
                    dungeon_id: dungeon_id.to_string(),
                    clears: 1,
                });
                1
            }
        };
        write_json(&path, &table)?;
        debug!(%player, dungeon = dungeon_id, clears, "dungeon progress written");
        Ok(clears)
    }
}

impl PersistenceGateway for JsonStore {
    fn load_player(&self, player: PlayerId) -> Result<PlayerRecord, PersistError> {
        Ok(self.load(player)?)
    }

    fn save_stats(&self, player: PlayerId, stats: &StatsRecord) -> Result<(), PersistError> {
        Ok(self.update(player, |r| r.stats = Some(stats.clone()))?)
    }

    fn save_inventory(
        &self,
        player: PlayerId,
        inventory: &InventoryRecord,
    ) -> Result<(), PersistError> {
        Ok(self.update(player, |r| r.inventory = Some(inventory.clone()))?)
    }

    fn save_skills(&self, player: PlayerId, skills: &SkillRecord) -> Result<(), PersistError> {
        Ok(self.update(player, |r| r.skills = Some(skills.clone()))?)
    }

    fn record_dungeon_clear(
        &self,
        player: PlayerId,
        dungeon_id: &str,
    ) -> Result<u32, PersistError> {
        Ok(self.increment_clears(player, dungeon_id)?)
    }
}

/// Read a versioned document; a missing file is `None`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SaveError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let save: SaveFile<T> = serde_json::from_reader(BufReader::new(file))?;
    save.validate().map(Some)
}

/// Write a versioned document through a temporary file and rename.
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<(), SaveError> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, &SaveFile::new(data))?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Default save directory under the platform's local data dir
pub fn default_save_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dungeon-sim");
    path.push("saves");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_validation() {
        let good = SaveFile::new(3u32);
        assert_eq!(good.clone().validate().unwrap(), 3);

        let mut bad = good.clone();
        bad.magic = "XXXX".to_string();
        assert!(matches!(bad.validate(), Err(SaveError::InvalidHeader)));

        let mut old = good;
        old.version = 999;
        assert!(matches!(
            old.validate(),
            Err(SaveError::IncompatibleVersion { found: 999, .. })
        ));
    }

    #[test]
    fn test_error_mapping() {
        let io = SaveError::Io(std::io::Error::other("disk gone"));
        assert!(matches!(PersistError::from(io), PersistError::Unavailable(_)));
        assert!(matches!(
            PersistError::from(SaveError::InvalidHeader),
            PersistError::Backend(_)
        ));
    }

    #[test]
    fn test_default_save_dir_is_namespaced() {
        assert!(default_save_dir().ends_with("dungeon-sim/saves"));
    }
}
