//! Damage, deaths and everything monsters do to players
//!
//! All damage funnels through [`resolve_damage`] except status-effect ticks,
//! which apply their per-tick amount directly. A monster's kill is resolved
//! exactly once no matter which path brought it to zero.

use std::sync::Arc;

use tracing::{debug, info};

use super::DungeonInstance;
use crate::combat::{DamageResult, ProjectileOutcome, TargetId, resolve_damage};
use crate::data::{EffectDef, MonsterDef};
use crate::monster::ai::{self, AiContext, MonsterAction, PlayerView};
use crate::monster::{AiState, MonsterId};
use crate::object::{LootDrop, LootId, roll_drops, roll_gold};
use crate::player::{self, AnimTag, PlayerId};
use crate::world::{ScheduledKind, ServerEvent};
use crate::{PLAYER_SPAWN_SPREAD, Vec3};

impl DungeonInstance {
    /// Raw damage from a player (or nothing) to a monster through the
    /// normal mitigation path. Monsters have no dexterity, so they never
    /// dodge.
    pub fn damage_monster(
        &mut self,
        attacker: Option<PlayerId>,
        monster: MonsterId,
        raw: i32,
        attacker_dex: i32,
    ) -> Option<DamageResult> {
        let entity = self.state.monsters.get(&monster)?;
        if !entity.is_alive() {
            return None;
        }
        let armor = self.defs.monster(&entity.def_id).map_or(0, |d| d.armor);
        let result = resolve_damage(
            &self.config.combat,
            raw,
            attacker_dex,
            armor,
            None,
            &mut self.rng,
        );

        let entity = self.state.monsters.get_mut(&monster)?;
        let killed = entity.apply_damage(result.amount);
        self.outbox.broadcast(ServerEvent::hit(
            TargetId::Monster(monster),
            attacker.map(TargetId::Player),
            result.amount,
            result.is_crit,
            result.is_dodge,
        ));
        if killed {
            self.resolve_kill(monster, attacker);
        }
        Some(result)
    }

    /// Attach a status effect and announce it.
    pub fn apply_status_effect(
        &mut self,
        target: TargetId,
        effect: &EffectDef,
        source: Option<TargetId>,
    ) {
        let alive = match target {
            TargetId::Player(id) => self.state.players.get(&id).is_some_and(|p| p.is_alive()),
            TargetId::Monster(id) => self.state.monsters.get(&id).is_some_and(|m| m.is_alive()),
        };
        if !alive {
            return;
        }
        self.effects.apply(target, effect, source);
        self.outbox.broadcast(ServerEvent::StatusEffect {
            target_id: target,
            kind: effect.kind,
            duration: effect.duration,
        });
    }

    /// Basic melee swing on the nearest monster in range.
    pub(super) fn basic_attack(&mut self, player: PlayerId) {
        let Some(entity) = self.state.players.get(&player) else {
            return;
        };
        let Some(session) = self.sessions.get(&player) else {
            return;
        };
        if session.next_basic_attack > self.now {
            return;
        }
        let origin = entity.position;
        let raw = self.config.basic_attack_base + entity.stats.strength;
        let dex = entity.stats.dexterity;
        let Some(target) = self.nearest_monster(&origin, self.config.basic_attack_range) else {
            return;
        };
        if let Some(session) = self.sessions.get_mut(&player) {
            session.next_basic_attack = self.now + self.config.basic_attack_cooldown;
        }
        self.damage_monster(Some(player), target, raw, dex);
    }

    pub(super) fn nearest_monster(&self, origin: &Vec3, range: f32) -> Option<MonsterId> {
        self.state
            .living_monsters()
            .map(|m| (m.id, origin.distance_xz(&m.position)))
            .filter(|(_, d)| *d <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Kill bookkeeping for a monster that just reached zero hp.
    pub(super) fn resolve_kill(&mut self, monster: MonsterId, killer: Option<PlayerId>) {
        let Some(rt) = self.runtimes.get_mut(&monster) else {
            return;
        };
        if rt.dead {
            return;
        }
        rt.mark_dead();
        let respawns = rt.has_pending_respawn();

        let Some(entity) = self.state.monsters.get_mut(&monster) else {
            return;
        };
        entity.hp = 0;
        entity.state = AiState::Dead;
        entity.target = None;
        let position = entity.position;
        let def_id = entity.def_id.clone();

        self.effects.clear_target(TargetId::Monster(monster));
        self.stats.kills += 1;

        let defs = Arc::clone(&self.defs);
        let Some(def) = defs.monster(&def_id) else {
            return;
        };
        debug!(instance = %self.id, monster = monster.0, def = %def.id, killer = ?killer, respawns, "monster killed");

        if let Some(player) = killer {
            self.grant_experience(player, def.xp);
            self.grant_gold(player, def.xp);
        }
        self.drop_loot(def, position);
        self.check_floor_clear();
    }

    fn grant_experience(&mut self, player: PlayerId, amount: u32) {
        let Some(entity) = self.state.players.get_mut(&player) else {
            return;
        };
        let Some(class) = self.defs.class(&entity.class_id) else {
            return;
        };
        let levels = player::grant_xp(&mut entity.stats, class, amount);
        if levels == 0 {
            return;
        }
        let level = entity.stats.level;
        let skill_points = entity.stats.skill_points;
        info!(instance = %self.id, %player, level, "level up");
        self.outbox.broadcast(ServerEvent::LevelUp {
            player_id: player,
            level,
            skill_points,
        });
        self.queue_stats(player);
    }

    fn grant_gold(&mut self, player: PlayerId, monster_xp: u32) {
        let amount = roll_gold(monster_xp, &mut self.rng);
        let Some(session) = self.sessions.get_mut(&player) else {
            return;
        };
        session.inventory.add_gold(amount as u64);
        let total = session.inventory.gold;
        self.outbox.send(
            player,
            ServerEvent::GoldGained {
                player_id: player,
                amount,
                total,
            },
        );
        self.queue_inventory(player);
    }

    fn drop_loot(&mut self, def: &MonsterDef, origin: Vec3) {
        let Some(table) = def.loot_table.as_deref().and_then(|t| self.defs.loot_table(t)) else {
            return;
        };
        let rolls = roll_drops(table, origin, self.config.loot_scatter, &mut self.rng);
        let despawn_at = self.now + self.config.loot_despawn_secs;
        for roll in rolls {
            self.next_loot_id += 1;
            let id = LootId(self.next_loot_id);
            self.state.loot.insert(
                id,
                LootDrop {
                    id,
                    item: roll.item,
                    rarity: roll.rarity,
                    position: roll.position,
                    despawn_at,
                },
            );
        }
    }

    /// Mitigated damage from a monster to a player. The player's dexterity
    /// gives the dodge chance; monsters never crit.
    pub(super) fn damage_player(
        &mut self,
        player: PlayerId,
        source: Option<TargetId>,
        raw: i32,
    ) -> Option<DamageResult> {
        let entity = self.state.players.get_mut(&player)?;
        if !entity.is_alive() {
            return None;
        }
        let result = resolve_damage(
            &self.config.combat,
            raw,
            0,
            entity.stats.armor,
            Some(entity.stats.dexterity),
            &mut self.rng,
        );
        entity.stats.adjust_hp(-result.amount);
        let died = !entity.is_alive();
        self.outbox.broadcast(ServerEvent::hit(
            TargetId::Player(player),
            source,
            result.amount,
            result.is_crit,
            result.is_dodge,
        ));
        if died {
            self.kill_player(player, source);
        }
        Some(result)
    }

    /// Damage then effect; a dodge avoids both.
    fn hit_player(
        &mut self,
        player: PlayerId,
        source: MonsterId,
        raw: i32,
        effect: Option<EffectDef>,
    ) {
        let source = Some(TargetId::Monster(source));
        if raw > 0 {
            match self.damage_player(player, source, raw) {
                Some(result) if !result.is_dodge => {}
                _ => return,
            }
        }
        if let Some(effect) = effect {
            self.apply_status_effect(TargetId::Player(player), &effect, source);
        }
    }

    pub(super) fn kill_player(&mut self, player: PlayerId, killer: Option<TargetId>) {
        let Some(entity) = self.state.players.get_mut(&player) else {
            return;
        };
        entity.stats.hp = 0;
        entity.anim = AnimTag::Dead;
        self.effects.clear_target(TargetId::Player(player));
        self.stats.player_deaths += 1;
        info!(instance = %self.id, %player, killer = ?killer, "player died");
        self.outbox.broadcast(ServerEvent::PlayerDied {
            player_id: player,
            killer_id: killer,
        });
        self.schedule.schedule(
            self.now + self.config.player_respawn_secs,
            ScheduledKind::PlayerRespawn(player),
        );
    }

    pub(super) fn respawn_player(&mut self, player: PlayerId) {
        let base = self.floor_spawn_point();
        let offset = (
            self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
            self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
        );
        let Some(entity) = self.state.players.get_mut(&player) else {
            return;
        };
        if entity.is_alive() {
            return;
        }
        entity.stats.hp = entity.stats.max_hp;
        entity.stats.mana = entity.stats.max_mana;
        entity.anim = AnimTag::Idle;
        entity.position = base.offset_xz(offset.0, offset.1);
        debug!(instance = %self.id, %player, "player respawned");
    }

    /// Run every monster's AI for one tick and apply what it asks for.
    pub(super) fn tick_monsters(&mut self, dt: f32) {
        let defs = Arc::clone(&self.defs);
        let players: Vec<PlayerView> = self
            .state
            .living_players()
            .map(|p| PlayerView {
                id: p.id,
                position: p.position,
            })
            .collect();
        let ids: Vec<MonsterId> = self.state.monsters.keys().copied().collect();

        for id in ids {
            let alive_summons = self.alive_summons(id);
            let Some(entity) = self.state.monsters.get_mut(&id) else {
                continue;
            };
            let Some(rt) = self.runtimes.get_mut(&id) else {
                continue;
            };
            let Some(def) = defs.monster(&entity.def_id) else {
                continue;
            };
            let ctx = AiContext {
                def,
                players: &players,
                alive_summons,
                now: self.now,
                dt,
            };
            let actions = ai::step(entity, rt, &ctx);
            for action in actions {
                self.apply_monster_action(id, def, action);
            }
        }
    }

    fn alive_summons(&self, summoner: MonsterId) -> u32 {
        self.runtimes
            .values()
            .filter(|rt| rt.summoned_by == Some(summoner) && !rt.dead)
            .count() as u32
    }

    fn apply_monster_action(&mut self, id: MonsterId, def: &MonsterDef, action: MonsterAction) {
        let Some(position) = self.state.monsters.get(&id).map(|m| m.position) else {
            return;
        };
        match action {
            MonsterAction::Respawned => {
                debug!(instance = %self.id, monster = id.0, "monster respawned");
            }
            MonsterAction::PhaseChanged { phase } => {
                info!(instance = %self.id, monster = id.0, boss = %def.id, phase, "boss phase");
                self.outbox.broadcast(ServerEvent::BossPhase {
                    monster_id: id,
                    phase,
                });
            }
            MonsterAction::Attack { target, raw } => {
                self.damage_player(target, Some(TargetId::Monster(id)), raw);
            }
            MonsterAction::Strike {
                target,
                raw,
                effect,
            }
            | MonsterAction::Root {
                target,
                raw,
                effect,
            } => self.hit_player(target, id, raw, effect),
            MonsterAction::Nova {
                raw,
                radius,
                effect,
            } => {
                for target in self.players_within(&position, radius) {
                    self.hit_player(target, id, raw, effect);
                }
            }
            MonsterAction::Projectile {
                target_pos,
                raw,
                speed,
                radius,
                lifetime,
                effect,
            } => {
                let projectile = self.projectiles.spawn(
                    id, position, target_pos, speed, radius, lifetime, raw, effect,
                );
                let event = ServerEvent::ProjectileSpawn {
                    projectile_id: projectile.id,
                    source_id: id,
                    position: projectile.position,
                    velocity: projectile.velocity,
                    radius: projectile.radius,
                };
                self.outbox.broadcast(event);
            }
            MonsterAction::Telegraph {
                ability_id,
                x,
                z,
                radius,
                delay,
                raw,
                effect,
            } => {
                self.outbox.broadcast(ServerEvent::BossTelegraph {
                    monster_id: id,
                    kind: ability_id,
                    x,
                    z,
                    radius,
                    duration: delay,
                });
                self.schedule.schedule(
                    self.now + delay,
                    ScheduledKind::TelegraphImpact {
                        source: id,
                        x,
                        z,
                        radius,
                        raw,
                        effect,
                    },
                );
            }
            MonsterAction::Summon {
                monster,
                count,
                max_alive,
                spread,
            } => {
                let room = max_alive.saturating_sub(self.alive_summons(id));
                for _ in 0..count.min(room) {
                    let at = position.offset_xz(
                        self.rng.range_f32(-spread, spread),
                        self.rng.range_f32(-spread, spread),
                    );
                    self.spawn_monster(&monster, at, 0.0, Some(id));
                }
            }
        }
    }

    /// Living players within `radius` of a point, in id order.
    pub(super) fn players_within(&self, center: &Vec3, radius: f32) -> Vec<PlayerId> {
        self.state
            .living_players()
            .filter(|p| p.position.distance_xz(center) <= radius)
            .map(|p| p.id)
            .collect()
    }

    pub(super) fn tick_projectiles(&mut self, dt: f32) {
        if self.projectiles.is_empty() {
            return;
        }
        let targets: Vec<(PlayerId, Vec3)> = self
            .state
            .living_players()
            .map(|p| (p.id, p.position))
            .collect();
        for outcome in self.projectiles.tick(dt, &targets) {
            match outcome {
                ProjectileOutcome::Hit { projectile, target } => {
                    self.outbox.broadcast(ServerEvent::ProjectileDestroy {
                        projectile_id: projectile.id,
                        hit_id: Some(target),
                    });
                    self.hit_player(target, projectile.source, projectile.damage, projectile.effect);
                }
                ProjectileOutcome::Expired(id) => {
                    self.outbox.broadcast(ServerEvent::ProjectileDestroy {
                        projectile_id: id,
                        hit_id: None,
                    });
                }
            }
        }
    }

    pub(super) fn tick_effects(&mut self, dt: f32) {
        for tick in self.effects.tick(dt) {
            match tick.target {
                TargetId::Monster(id) => {
                    let Some(entity) = self.state.monsters.get_mut(&id) else {
                        continue;
                    };
                    if !entity.is_alive() {
                        continue;
                    }
                    let killed = entity.apply_damage(tick.amount);
                    self.outbox.broadcast(ServerEvent::Damage {
                        target_id: tick.target,
                        source_id: tick.source,
                        amount: tick.amount,
                        is_crit: false,
                        is_dodge: false,
                        dot_type: Some(tick.kind),
                        is_heal: false,
                    });
                    if killed {
                        let killer = match tick.source {
                            Some(TargetId::Player(p)) => Some(p),
                            _ => None,
                        };
                        self.resolve_kill(id, killer);
                    }
                }
                TargetId::Player(id) => {
                    let Some(entity) = self.state.players.get_mut(&id) else {
                        continue;
                    };
                    if !entity.is_alive() {
                        continue;
                    }
                    entity.stats.adjust_hp(-tick.amount);
                    let died = !entity.is_alive();
                    self.outbox.broadcast(ServerEvent::Damage {
                        target_id: tick.target,
                        source_id: tick.source,
                        amount: tick.amount,
                        is_crit: false,
                        is_dodge: false,
                        dot_type: Some(tick.kind),
                        is_heal: false,
                    });
                    if died {
                        self.kill_player(id, tick.source);
                    }
                }
            }
        }
    }

    /// Fire every scheduled event that has come due.
    pub(super) fn run_schedule(&mut self) {
        for event in self.schedule.drain_due(self.now) {
            match event.kind {
                ScheduledKind::TelegraphImpact {
                    source,
                    x,
                    z,
                    radius,
                    raw,
                    effect,
                } => {
                    let source_alive = self
                        .state
                        .monsters
                        .get(&source)
                        .is_some_and(|m| m.is_alive());
                    if !source_alive {
                        debug!(instance = %self.id, monster = source.0, "telegraph dropped, source gone");
                        continue;
                    }
                    let center = Vec3::new(x, 0.0, z);
                    for target in self.players_within(&center, radius) {
                        self.hit_player(target, source, raw, effect);
                    }
                }
                ScheduledKind::PlayerRespawn(player) => self.respawn_player(player),
            }
        }
    }
}
