//! dg-data: Static game data for the dungeon simulation
//!
//! The built-in content (classes, the warrior skill tree, items, loot
//! tables, the monster roster and the crypt dungeon) plus loading of
//! alternative definition packs from JSON files.

pub mod classes;
pub mod dungeons;
pub mod items;
pub mod monsters;
pub mod skills;

use std::path::Path;
use std::sync::Arc;

use dg_core::data::{DefinitionPack, Definitions};
use dg_core::world::DefinitionError;
use thiserror::Error;

pub use classes::classes;
pub use dungeons::dungeons;
pub use items::{items, loot_tables};
pub use monsters::monsters;
pub use skills::skills;

/// Dungeon the built-in content starts players in
pub const DEFAULT_DUNGEON: &str = "forgotten_crypt";

/// Errors loading a definition pack
#[derive(Debug, Error)]
pub enum DataError {
    #[error("could not read definitions: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Invalid(#[from] DefinitionError),
}

/// The built-in content in authoring form
pub fn builtin() -> DefinitionPack {
    DefinitionPack {
        classes: classes(),
        skills: skills(),
        items: items(),
        loot_tables: loot_tables(),
        monsters: monsters(),
        dungeons: dungeons(),
    }
}

/// The built-in content, validated and ready to share between instances
pub fn builtin_definitions() -> Result<Arc<Definitions>, DataError> {
    Ok(Arc::new(Definitions::from_pack(builtin())?))
}

/// Load and validate a JSON definition pack.
pub fn load_pack(path: impl AsRef<Path>) -> Result<Arc<Definitions>, DataError> {
    let json = std::fs::read_to_string(path)?;
    Ok(Arc::new(Definitions::from_json(&json)?))
}
