//! The dungeon instance
//!
//! [`DungeonInstance`] owns the replicated [`InstanceState`] plus every
//! simulation-only collection (monster runtimes, status effects,
//! projectiles, cooldowns, the event schedule and the save queue). Inbound
//! messages are handled to completion one at a time and [`DungeonInstance::tick`]
//! advances the fixed-rate simulation. Nothing is shared with other
//! instances except the definitions and the persistence gateway.

mod combat;
mod floor;
mod items;
mod skills;

use std::sync::Arc;
use std::time::{Duration, Instant};

use hashbrown::HashMap;
use tracing::{debug, info, warn};

use crate::action::{InputPacket, apply_input, validate_input};
use crate::combat::{ProjectileSimulator, StatusEffectEngine, StatusKind, TargetId};
use crate::data::{ClassDef, Definitions};
use crate::dungeon::FloorState;
use crate::monster::{MonsterId, MonsterRuntime};
use crate::persist::{
    FlushReport, InventoryRecord, PersistOp, PersistQueue, PersistenceGateway, PlayerRecord,
    SaveWriter, SkillRecord, StatsRecord,
};
use crate::player::{self, Inventory, PlayerEntity, PlayerId, Stats};
use crate::skills::{Cooldowns, SkillBook};
use crate::world::{
    ClientMessage, Envelope, EventSchedule, InstanceConfig, InstanceError, InstanceState, Outbox,
    ServerEvent, SkillError,
};
use crate::{GameRng, PLAYER_SPAWN_SPREAD, Vec3};

/// Per-player state that is never replicated
#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub inventory: Inventory,
    pub skills: SkillBook,
    pub skill_cooldowns: Cooldowns,
    pub item_cooldowns: Cooldowns,
    /// Simulation time at which the next basic attack is allowed
    pub next_basic_attack: f64,
    mana_regen: f32,
}

impl PlayerSession {
    fn new(inventory: Inventory, skills: SkillBook) -> Self {
        Self {
            inventory,
            skills,
            skill_cooldowns: Cooldowns::new(),
            item_cooldowns: Cooldowns::new(),
            next_basic_attack: 0.0,
            mana_regen: 0.0,
        }
    }
}

/// Running totals for hosts and logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceStats {
    pub kills: u64,
    pub player_deaths: u64,
    pub floors_cleared: u32,
    pub ticks: u64,
}

/// One dungeon run
pub struct DungeonInstance {
    id: String,
    defs: Arc<Definitions>,
    config: InstanceConfig,
    gateway: Arc<dyn PersistenceGateway>,
    rng: GameRng,
    now: f64,

    state: InstanceState,
    runtimes: HashMap<MonsterId, MonsterRuntime>,
    sessions: HashMap<PlayerId, PlayerSession>,
    effects: StatusEffectEngine,
    projectiles: ProjectileSimulator,
    schedule: EventSchedule,

    outbox: Outbox,
    persist: PersistQueue,
    writer: SaveWriter,

    next_monster_id: u32,
    next_loot_id: u32,
    stats: InstanceStats,
}

impl std::fmt::Debug for DungeonInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DungeonInstance")
            .field("id", &self.id)
            .field("now", &self.now)
            .field("floor", &self.state.floor)
            .field("players", &self.state.players.len())
            .field("monsters", &self.state.monsters.len())
            .finish_non_exhaustive()
    }
}

impl DungeonInstance {
    /// Create an instance of `dungeon_id` and spawn its first floor.
    pub fn new(
        id: impl Into<String>,
        dungeon_id: &str,
        defs: Arc<Definitions>,
        config: InstanceConfig,
        gateway: Arc<dyn PersistenceGateway>,
        seed: u64,
    ) -> Result<Self, InstanceError> {
        let dungeon = defs
            .dungeon(dungeon_id)
            .ok_or_else(|| InstanceError::UnknownDungeon(dungeon_id.to_string()))?;
        let floor = FloorState::new(&dungeon.id, dungeon.floors.len());
        let id = id.into();
        let writer = SaveWriter::spawn(&id, Arc::clone(&gateway))
            .map_err(|e| InstanceError::SaveWriter(e.to_string()))?;

        let mut instance = Self {
            id,
            defs,
            config,
            gateway,
            rng: GameRng::new(seed),
            now: 0.0,
            state: InstanceState::new(floor),
            runtimes: HashMap::new(),
            sessions: HashMap::new(),
            effects: StatusEffectEngine::new(),
            projectiles: ProjectileSimulator::new(),
            schedule: EventSchedule::new(),
            outbox: Outbox::new(),
            persist: PersistQueue::new(),
            writer,
            next_monster_id: 0,
            next_loot_id: 0,
            stats: InstanceStats::default(),
        };
        info!(instance = %instance.id, dungeon = dungeon_id, seed, "instance created");
        instance.start_floor(0);
        Ok(instance)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Simulation clock in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    pub fn state(&self) -> &InstanceState {
        &self.state
    }

    /// Mutable access to the replicated state, for hosts and tests that
    /// stage scenarios.
    pub fn state_mut(&mut self) -> &mut InstanceState {
        &mut self.state
    }

    pub fn stats(&self) -> InstanceStats {
        self.stats
    }

    pub fn session(&self, player: PlayerId) -> Option<&PlayerSession> {
        self.sessions.get(&player)
    }

    pub fn runtime(&self, monster: MonsterId) -> Option<&MonsterRuntime> {
        self.runtimes.get(&monster)
    }

    pub fn effects(&self) -> &StatusEffectEngine {
        &self.effects
    }

    pub fn projectiles(&self) -> &ProjectileSimulator {
        &self.projectiles
    }

    pub fn schedule(&self) -> &EventSchedule {
        &self.schedule
    }

    /// Saves queued or being written.
    pub fn pending_saves(&self) -> usize {
        self.persist.len() + self.writer.in_flight()
    }

    /// Events queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<Envelope> {
        self.outbox.drain()
    }

    /// Admit a player, hydrating them from the gateway.
    pub fn join(
        &mut self,
        player: PlayerId,
        name: &str,
        class_id: &str,
    ) -> Result<(), InstanceError> {
        if self.state.players.contains_key(&player) {
            return Err(InstanceError::AlreadyJoined(player.0));
        }
        let defs = Arc::clone(&self.defs);
        let class = defs
            .class(class_id)
            .ok_or_else(|| InstanceError::UnknownClass(class_id.to_string()))?;

        let record = self.gateway.load_player(player)?;
        let PlayerRecord {
            stats: stored_stats,
            inventory: stored_inventory,
            skills: stored_skills,
        } = record;

        let stats = match stored_stats {
            Some(rec) => hydrate_stats(&rec, class),
            None => player::fresh_stats(class),
        };

        let mut inventory = Inventory::new(self.config.inventory_slots);
        if let Some(rec) = stored_inventory {
            inventory.stacks = rec.items;
            inventory.gold = rec.gold;
        }

        let skills = match stored_skills {
            Some(rec) => SkillBook::restore(&defs, rec.allocations, rec.hotbar),
            None => SkillBook::new(),
        };

        let position = self.spawn_position();
        let entity = PlayerEntity::new(player, name, class_id, stats, position);
        self.state.players.insert(player, entity);
        self.sessions.insert(player, PlayerSession::new(inventory, skills));

        info!(instance = %self.id, %player, name, class = class_id, level = stats.level, "player joined");
        if let Some(event) = self.skills_event(player, true) {
            self.outbox.send(player, event);
        }
        if let Some(event) = self.inventory_event(player) {
            self.outbox.send(player, event);
        }
        self.outbox.send(
            player,
            ServerEvent::FloorStarted {
                floor_index: self.state.floor.floor_index,
                floor_count: self.state.floor.floor_count,
                is_boss_floor: self.state.floor.is_boss_floor(),
            },
        );
        Ok(())
    }

    /// Queue a final save and remove a player along with every per-player
    /// collection. The save is written in the background like any other.
    ///
    /// Telegraphs already in flight are left alone; they simply find no one
    /// to hit.
    pub fn leave(&mut self, player: PlayerId) {
        if !self.state.players.contains_key(&player) {
            return;
        }
        self.queue_snapshot(player);
        self.dispatch_saves();

        self.state.players.remove(&player);
        self.sessions.remove(&player);
        self.effects.clear_target(TargetId::Player(player));
        self.schedule.cancel_player(player);
        info!(instance = %self.id, %player, "player left");
    }

    /// Handle one inbound message from a connected player.
    ///
    /// Messages from unknown players and malformed input are dropped.
    pub fn handle_message(&mut self, player: PlayerId, message: ClientMessage) {
        if !self.state.players.contains_key(&player) {
            debug!(instance = %self.id, %player, "message from unknown player dropped");
            return;
        }
        match message {
            ClientMessage::Input(packet) => self.handle_input(player, &packet),
            ClientMessage::Pickup { loot_id } => self.pickup(player, loot_id),
            ClientMessage::RequestInventory => {
                if let Some(event) = self.inventory_event(player) {
                    self.outbox.send(player, event);
                }
            }
            ClientMessage::AllocateSkill { node_id } => self.allocate_skill(player, &node_id),
            ClientMessage::SetHotbar { slot, skill_id } => self.set_hotbar(player, slot, skill_id),
            ClientMessage::RequestSkills => {
                if let Some(event) = self.skills_event(player, true) {
                    self.outbox.send(player, event);
                }
            }
            ClientMessage::UseSkill { skill_id } => {
                if let Err(e) = self.try_execute(player, &skill_id) {
                    self.skill_failed(player, Some(skill_id), &e);
                }
            }
            ClientMessage::UseHotbar { slot } => {
                let skill_id = self
                    .sessions
                    .get(&player)
                    .and_then(|s| s.skills.hotbar_skill(slot))
                    .map(str::to_string);
                match skill_id {
                    Some(id) => {
                        if let Err(e) = self.try_execute(player, &id) {
                            self.skill_failed(player, Some(id), &e);
                        }
                    }
                    None => self.skill_failed(player, None, &SkillError::EmptySlot(slot)),
                }
            }
            ClientMessage::UseItem { def_id } => {
                if let Err(e) = self.use_item(player, &def_id) {
                    debug!(instance = %self.id, %player, item = %def_id, "item use refused: {e}");
                    self.outbox.send(
                        player,
                        ServerEvent::UseItemFail {
                            def_id,
                            reason: e.to_string(),
                        },
                    );
                }
            }
            ClientMessage::NextFloor => self.request_next_floor(player),
            ClientMessage::ExitDungeon => {
                self.queue_snapshot(player);
                self.outbox
                    .send(player, ServerEvent::ReturnToHub { player_id: player });
            }
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        self.now += dt as f64;
        self.stats.ticks += 1;

        self.regenerate(dt);
        self.tick_monsters(dt);
        self.tick_projectiles(dt);
        self.tick_effects(dt);
        self.run_schedule();
        self.expire_loot();
        self.check_floor_clear();
        self.pump_saves();
    }

    /// Run fixed-period ticks covering `seconds` of simulated time.
    pub fn run_for(&mut self, seconds: f64) {
        let dt = self.config.tick_dt();
        let steps = (seconds / dt as f64).round() as u64;
        for _ in 0..steps {
            self.tick(dt);
        }
    }

    /// Block until every queued save is written or dropped, or `timeout`
    /// passes. Returns whether the queue drained.
    ///
    /// Failing saves are retried back to back here rather than once per
    /// tick.
    pub fn wait_for_saves(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.dispatch_saves();
            if !self.writer.is_busy() {
                return self.persist.is_empty();
            }
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() {
                return false;
            }
            if let Some(outcomes) = self.writer.wait(left) {
                let report = self
                    .persist
                    .settle(outcomes, self.config.persist_max_attempts);
                self.report_saves(report);
            }
        }
    }

    /// Tear the instance down: save every player once and release all
    /// timers. Every pending save gets one attempt within
    /// `persist_shutdown_secs`; the rest are dropped, so this always
    /// returns.
    pub fn shutdown(&mut self) -> FlushReport {
        let players: Vec<PlayerId> = self.state.players.keys().copied().collect();
        for player in players {
            self.queue_snapshot(player);
        }
        let wait = Duration::try_from_secs_f64(self.config.persist_shutdown_secs)
            .unwrap_or(Duration::ZERO);
        let deadline = Instant::now() + wait;
        let mut report = FlushReport::default();

        // Let the batch in flight land, then give everything left one attempt.
        if self.settle_in_flight(deadline, &mut report) {
            let rest = self.persist.take_all();
            if !rest.is_empty() {
                match self.writer.submit(rest) {
                    Some(refused) => report.merge(self.persist.settle(refused, 1)),
                    None => {
                        self.settle_in_flight(deadline, &mut report);
                    }
                }
            }
        }

        if !report.dropped.is_empty() {
            warn!(instance = %self.id, dropped = report.dropped.len(), "saves lost at shutdown");
        }
        self.schedule.clear();
        self.projectiles.clear();
        self.effects.clear();
        info!(instance = %self.id, written = report.written, "instance shut down");
        report
    }

    fn handle_input(&mut self, player: PlayerId, packet: &InputPacket) {
        if !validate_input(packet, self.config.max_input_dt) {
            debug!(instance = %self.id, %player, seq = packet.seq, "invalid input dropped");
            return;
        }
        let rooted = self
            .effects
            .has(TargetId::Player(player), StatusKind::Root);
        let Some(entity) = self.state.players.get_mut(&player) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        apply_input(entity, packet, self.config.move_speed, rooted);
        if packet.attack {
            self.basic_attack(player);
        }
    }

    fn regenerate(&mut self, dt: f32) {
        let rate = self.config.mana_regen_per_sec;
        if rate <= 0.0 {
            return;
        }
        for (id, entity) in self.state.players.iter_mut() {
            let Some(session) = self.sessions.get_mut(id) else {
                continue;
            };
            if !entity.is_alive() || entity.stats.mana >= entity.stats.max_mana {
                session.mana_regen = 0.0;
                continue;
            }
            session.mana_regen += rate * dt;
            let whole = session.mana_regen.floor();
            if whole >= 1.0 {
                entity.stats.adjust_mana(whole as i32);
                session.mana_regen -= whole;
            }
        }
    }

    fn spawn_position(&mut self) -> Vec3 {
        let base = self
            .defs
            .dungeon(&self.state.floor.dungeon_id)
            .and_then(|d| d.floor(self.state.floor.floor_index))
            .map_or(Vec3::ZERO, |f| f.spawn_point);
        base.offset_xz(
            self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
            self.rng.range_f32(-PLAYER_SPAWN_SPREAD, PLAYER_SPAWN_SPREAD),
        )
    }

    fn skill_failed(&mut self, player: PlayerId, skill_id: Option<String>, error: &SkillError) {
        debug!(instance = %self.id, %player, skill = ?skill_id, "skill refused: {error}");
        self.outbox.send(
            player,
            ServerEvent::SkillFail {
                skill_id,
                reason: error.to_string(),
            },
        );
    }

    fn inventory_event(&self, player: PlayerId) -> Option<ServerEvent> {
        let session = self.sessions.get(&player)?;
        Some(ServerEvent::Inventory {
            items: session.inventory.stacks.clone(),
            gold: session.inventory.gold,
            capacity: session.inventory.capacity,
        })
    }

    fn skills_event(&self, player: PlayerId, full: bool) -> Option<ServerEvent> {
        let session = self.sessions.get(&player)?;
        let entity = self.state.players.get(&player)?;
        let allocations = session.skills.allocations.clone();
        let hotbar = session.skills.hotbar.clone();
        let skill_points = entity.stats.skill_points;
        Some(if full {
            ServerEvent::SkillsFull {
                allocations,
                hotbar,
                skill_points,
            }
        } else {
            ServerEvent::SkillsUpdated {
                allocations,
                hotbar,
                skill_points,
            }
        })
    }

    fn queue_stats(&mut self, player: PlayerId) {
        if let Some(entity) = self.state.players.get(&player) {
            self.persist
                .push(PersistOp::Stats(player, StatsRecord::from(&entity.stats)));
        }
    }

    fn queue_inventory(&mut self, player: PlayerId) {
        if let Some(session) = self.sessions.get(&player) {
            self.persist.push(PersistOp::Inventory(
                player,
                InventoryRecord {
                    items: session.inventory.stacks.clone(),
                    gold: session.inventory.gold,
                },
            ));
        }
    }

    fn queue_skills(&mut self, player: PlayerId) {
        if let Some(session) = self.sessions.get(&player) {
            self.persist.push(PersistOp::Skills(
                player,
                SkillRecord {
                    allocations: session.skills.allocations.clone(),
                    hotbar: session.skills.hotbar.clone(),
                },
            ));
        }
    }

    fn queue_snapshot(&mut self, player: PlayerId) {
        self.queue_stats(player);
        self.queue_inventory(player);
        self.queue_skills(player);
    }

    /// Wait for the batch in flight until `deadline`, settling it with a
    /// single attempt. On timeout the writer is abandoned and everything
    /// still queued is dropped with it.
    fn settle_in_flight(&mut self, deadline: Instant, report: &mut FlushReport) -> bool {
        if !self.writer.is_busy() {
            return true;
        }
        let left = deadline.saturating_duration_since(Instant::now());
        if let Some(outcomes) = self.writer.wait(left) {
            report.merge(self.persist.settle(outcomes, 1));
            return true;
        }
        warn!(instance = %self.id, "save writer missed the shutdown deadline");
        let lost = self.writer.abandon();
        report.merge(self.persist.settle(lost, 1));
        let rest = self.persist.take_all();
        if let Some(refused) = self.writer.submit(rest) {
            report.merge(self.persist.settle(refused, 1));
        }
        false
    }

    /// Collect a finished batch, if any, and hand over the next one.
    fn pump_saves(&mut self) {
        if let Some(outcomes) = self.writer.poll() {
            let report = self
                .persist
                .settle(outcomes, self.config.persist_max_attempts);
            self.report_saves(report);
        }
        self.dispatch_saves();
    }

    fn dispatch_saves(&mut self) {
        if self.writer.is_busy() || self.persist.is_empty() {
            return;
        }
        let batch = self.persist.take_batch(self.config.persist_flush_budget);
        if let Some(refused) = self.writer.submit(batch) {
            let report = self
                .persist
                .settle(refused, self.config.persist_max_attempts);
            self.report_saves(report);
        }
    }

    fn report_saves(&mut self, report: FlushReport) {
        for (player, dungeon, total) in &report.clears {
            info!(instance = %self.id, %player, dungeon = %dungeon, total, "dungeon clear recorded");
        }
        for dropped in report.dropped {
            if self.state.players.contains_key(&dropped.player) {
                self.outbox.send(
                    dropped.player,
                    ServerEvent::PersistWarning {
                        message: format!("could not save {}: {}", dropped.kind, dropped.error),
                    },
                );
            }
        }
    }
}

/// Stats for a returning player: stored progression, derived maxima, full
/// hp and mana.
fn hydrate_stats(rec: &StatsRecord, class: &ClassDef) -> Stats {
    let level = rec.level.max(1);
    let mut stats = Stats {
        level,
        xp: rec.xp,
        xp_to_next: player::xp_to_next(level),
        strength: rec.strength,
        dexterity: rec.dexterity,
        intelligence: rec.intelligence,
        vitality: rec.vitality,
        skill_points: rec.skill_points,
        ..Default::default()
    };
    player::derive_stats(&mut stats, class);
    stats.hp = stats.max_hp;
    stats.mana = stats.max_mana;
    stats
}
