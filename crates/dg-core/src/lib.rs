//! dg-core: Authoritative simulation for one dungeon instance
//!
//! This crate owns every gameplay decision for a room: input validation and
//! movement, monster AI (including multi-phase bosses), skills, projectiles,
//! status effects, loot, experience and floor progression. Clients only ever
//! render what it produces.
//!
//! It performs no I/O of its own. Persistence goes through the
//! [`persist::PersistenceGateway`] trait and outbound traffic is queued as
//! [`world::Envelope`]s for the host to deliver.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`action`] | Inbound input packets and movement integration |
//! | [`combat`] | Damage resolution, status effects, projectiles |
//! | [`data`] | Static definitions (classes, skills, items, monsters, dungeons) |
//! | [`dungeon`] | Floor state and floor-clear rules |
//! | [`instance`] | The per-instance orchestrator and its tick loop |
//! | [`monster`] | Monster entities, runtime records, AI and boss phases |
//! | [`object`] | Loot drops and the item and gold rolls behind them |
//! | [`persist`] | Persistence records, gateway trait, save queue and writer thread |
//! | [`player`] | Player entities, stats, leveling and inventories |
//! | [`skills`] | Skill allocation, hotbar and precondition checks |
//! | [`world`] | Replicated state, events, schedule, errors, configuration |

pub mod action;
pub mod combat;
pub mod data;
pub mod dungeon;
pub mod instance;
pub mod monster;
pub mod object;
pub mod persist;
pub mod player;
pub mod skills;
pub mod world;

mod consts;
mod geom;
mod rng;

pub use consts::*;
pub use geom::{Vec3, facing_towards};
pub use instance::DungeonInstance;
pub use rng::{GameRng, RollSource};
