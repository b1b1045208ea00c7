//! Floor spawning, clearing and advancement

use std::sync::Arc;

use tracing::{debug, error, info};

use super::DungeonInstance;
use crate::dungeon::{cancel_respawns_if_wiped, is_floor_cleared};
use crate::monster::{MonsterEntity, MonsterId, MonsterRuntime};
use crate::persist::PersistOp;
use crate::player::PlayerId;
use crate::world::ServerEvent;
use crate::{PLAYER_SPAWN_SPREAD, Vec3};

impl DungeonInstance {
    /// Tear down the current floor and populate floor `index`.
    ///
    /// Monsters, loot, monster effects, projectiles and pending telegraphs
    /// from the previous floor are discarded and every player is moved to
    /// the new spawn point.
    pub(super) fn start_floor(&mut self, index: usize) {
        let defs = Arc::clone(&self.defs);
        let Some(dungeon) = defs.dungeon(&self.state.floor.dungeon_id) else {
            error!(instance = %self.id, dungeon = %self.state.floor.dungeon_id, "dungeon definition missing");
            return;
        };
        let Some(floor) = dungeon.floor(index) else {
            error!(instance = %self.id, floor = index, "floor index out of range");
            return;
        };

        self.state.monsters.clear();
        self.runtimes.clear();
        self.state.loot.clear();
        self.effects.clear_monsters();
        self.projectiles.clear();
        self.schedule.cancel_telegraphs();

        self.state.floor.floor_index = index;
        self.state.floor.floor_cleared = false;
        let boss_floor = dungeon.is_boss_floor(index);

        for spawn in &floor.monsters {
            let respawn = if boss_floor {
                0.0
            } else {
                spawn.respawn_secs.unwrap_or_else(|| {
                    defs.monster(&spawn.monster).map_or(0.0, |m| m.respawn_secs)
                })
            };
            self.spawn_monster(&spawn.monster, spawn.position, respawn, None);
        }

        let players: Vec<PlayerId> = self.state.players.keys().copied().collect();
        for player in players {
            let position = floor.spawn_point.offset_xz(
                self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
                self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
            );
            if let Some(entity) = self.state.players.get_mut(&player) {
                entity.position = position;
            }
        }

        info!(
            instance = %self.id,
            floor = index,
            monsters = floor.monsters.len(),
            boss_floor,
            "floor started"
        );
        self.outbox.broadcast(ServerEvent::FloorStarted {
            floor_index: index,
            floor_count: self.state.floor.floor_count,
            is_boss_floor: boss_floor,
        });
    }

    /// Add a monster to the current floor.
    pub(super) fn spawn_monster(
        &mut self,
        def_id: &str,
        position: Vec3,
        respawn_secs: f32,
        summoned_by: Option<MonsterId>,
    ) -> Option<MonsterId> {
        let defs = Arc::clone(&self.defs);
        let Some(def) = defs.monster(def_id) else {
            error!(instance = %self.id, monster = def_id, "unknown monster definition");
            return None;
        };
        self.next_monster_id += 1;
        let id = MonsterId(self.next_monster_id);
        let mut rt = MonsterRuntime::new(def, position, respawn_secs);
        rt.summoned_by = summoned_by;
        self.state
            .monsters
            .insert(id, MonsterEntity::new(id, def, position));
        self.runtimes.insert(id, rt);
        Some(id)
    }

    pub(super) fn floor_spawn_point(&self) -> Vec3 {
        self.defs
            .dungeon(&self.state.floor.dungeon_id)
            .and_then(|d| d.floor(self.state.floor.floor_index))
            .map_or(Vec3::ZERO, |f| f.spawn_point)
    }

    /// Mark the floor cleared once every monster on it is down for good.
    /// Killing the last living monster while others wait to respawn keeps
    /// them all down.
    ///
    /// Clearing the boss floor completes the dungeon and queues a clear
    /// record for every player present before completion is announced.
    pub(super) fn check_floor_clear(&mut self) {
        let floor = &self.state.floor;
        if floor.floor_cleared || floor.dungeon_complete {
            return;
        }
        if let Some(cancelled) = cancel_respawns_if_wiped(self.runtimes.values_mut()) {
            if cancelled > 0 {
                debug!(instance = %self.id, cancelled, "floor wiped, respawns cancelled");
            }
        }
        if !is_floor_cleared(self.runtimes.values()) {
            return;
        }

        self.state.floor.floor_cleared = true;
        self.stats.floors_cleared += 1;
        let index = self.state.floor.floor_index;
        info!(instance = %self.id, floor = index, "floor cleared");
        self.outbox
            .broadcast(ServerEvent::FloorCleared { floor_index: index });

        if !self.state.floor.is_boss_floor() {
            return;
        }
        self.state.floor.dungeon_complete = true;
        let dungeon_id = self.state.floor.dungeon_id.clone();
        let players: Vec<PlayerId> = self.state.players.keys().copied().collect();
        for player in players {
            self.persist.push(PersistOp::DungeonClear {
                player,
                dungeon_id: dungeon_id.clone(),
            });
            self.queue_snapshot(player);
        }
        info!(instance = %self.id, dungeon = %dungeon_id, "dungeon complete");
        self.outbox
            .broadcast(ServerEvent::DungeonComplete { dungeon_id });
    }

    /// Advance to the next floor if the current one is cleared. Otherwise,
    /// or once the dungeon is complete, nothing happens.
    pub(super) fn request_next_floor(&mut self, player: PlayerId) {
        if !self.state.floor.can_advance() {
            debug!(
                instance = %self.id,
                %player,
                cleared = self.state.floor.floor_cleared,
                complete = self.state.floor.dungeon_complete,
                "next floor ignored"
            );
            return;
        }
        let next = self.state.floor.floor_index + 1;
        info!(instance = %self.id, %player, floor = next, "advancing floor");
        self.start_floor(next);
    }

    pub(super) fn expire_loot(&mut self) {
        let now = self.now;
        self.state.loot.retain(|_, drop| drop.despawn_at > now);
    }
}
