//! Persistence records, the gateway trait and the save queue
//!
//! The instance never blocks a tick on storage. Saves are queued as
//! [`PersistOp`]s; a newer snapshot of the same record replaces one that
//! has not been written yet. At the end of each tick a budgeted batch goes
//! to the instance's [`SaveWriter`] thread; its outcomes are settled on a
//! later tick, where failing operations are retried and dropped after a
//! bounded number of attempts.

mod writer;

pub use writer::SaveWriter;

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum::Display;
use tracing::{debug, error, warn};

use crate::player::{ItemStack, PlayerId, Stats};
use crate::world::PersistError;

/// Level, experience and core stats
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub level: u32,
    pub xp: u32,
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub vitality: i32,
    pub skill_points: u32,
}

impl From<&Stats> for StatsRecord {
    fn from(stats: &Stats) -> Self {
        Self {
            level: stats.level,
            xp: stats.xp,
            strength: stats.strength,
            dexterity: stats.dexterity,
            intelligence: stats.intelligence,
            vitality: stats.vitality,
            skill_points: stats.skill_points,
        }
    }
}

/// Items and gold
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub items: Vec<ItemStack>,
    pub gold: u64,
}

/// Skill allocations and hotbar
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillRecord {
    pub allocations: BTreeMap<String, u32>,
    pub hotbar: Vec<Option<String>>,
}

/// Everything stored for one player; missing parts start fresh
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub stats: Option<StatsRecord>,
    #[serde(default)]
    pub inventory: Option<InventoryRecord>,
    #[serde(default)]
    pub skills: Option<SkillRecord>,
}

/// Key-value storage for player records and dungeon progress.
///
/// Shared by every instance in the process, so implementations must be safe
/// for concurrent use.
pub trait PersistenceGateway: Send + Sync {
    /// Load a player's record; an unknown player yields an empty record.
    fn load_player(&self, player: PlayerId) -> Result<PlayerRecord, PersistError>;

    fn save_stats(&self, player: PlayerId, stats: &StatsRecord) -> Result<(), PersistError>;

    fn save_inventory(
        &self,
        player: PlayerId,
        inventory: &InventoryRecord,
    ) -> Result<(), PersistError>;

    fn save_skills(&self, player: PlayerId, skills: &SkillRecord) -> Result<(), PersistError>;

    /// Count one more clear of `dungeon_id` by `player`, returning the new
    /// total. The first clear creates the record.
    fn record_dungeon_clear(&self, player: PlayerId, dungeon_id: &str)
    -> Result<u32, PersistError>;
}

#[derive(Debug, Default)]
struct MemoryStore {
    players: HashMap<PlayerId, PlayerRecord>,
    progress: HashMap<(PlayerId, String), u32>,
}

/// In-process gateway, used by tests and as a fallback store.
///
/// It can be switched into an unavailable mode to exercise retry paths.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    store: Mutex<MemoryStore>,
    unavailable: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Stored record for a player, if any part has been saved.
    pub fn record(&self, player: PlayerId) -> Option<PlayerRecord> {
        let store = self.store.lock().ok()?;
        store.players.get(&player).cloned()
    }

    pub fn clears(&self, player: PlayerId, dungeon_id: &str) -> u32 {
        self.store
            .lock()
            .ok()
            .and_then(|s| s.progress.get(&(player, dungeon_id.to_string())).copied())
            .unwrap_or(0)
    }

    fn with_store<T>(&self, f: impl FnOnce(&mut MemoryStore) -> T) -> Result<T, PersistError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory store offline".into()));
        }
        let mut store = self
            .store
            .lock()
            .map_err(|_| PersistError::Backend("memory store lock poisoned".into()))?;
        Ok(f(&mut store))
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load_player(&self, player: PlayerId) -> Result<PlayerRecord, PersistError> {
        self.with_store(|s| s.players.get(&player).cloned().unwrap_or_default())
    }

    fn save_stats(&self, player: PlayerId, stats: &StatsRecord) -> Result<(), PersistError> {
        self.with_store(|s| s.players.entry(player).or_default().stats = Some(stats.clone()))
    }

    fn save_inventory(
        &self,
        player: PlayerId,
        inventory: &InventoryRecord,
    ) -> Result<(), PersistError> {
        self.with_store(|s| s.players.entry(player).or_default().inventory = Some(inventory.clone()))
    }

    fn save_skills(&self, player: PlayerId, skills: &SkillRecord) -> Result<(), PersistError> {
        self.with_store(|s| s.players.entry(player).or_default().skills = Some(skills.clone()))
    }

    fn record_dungeon_clear(
        &self,
        player: PlayerId,
        dungeon_id: &str,
    ) -> Result<u32, PersistError> {
        self.with_store(|s| {
            let count = s.progress.entry((player, dungeon_id.to_string())).or_insert(0);
            *count += 1;
            *count
        })
    }
}

/// Which record an operation writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum PersistKind {
    Stats,
    Inventory,
    Skills,
    DungeonClear,
}

/// A queued write
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOp {
    Stats(PlayerId, StatsRecord),
    Inventory(PlayerId, InventoryRecord),
    Skills(PlayerId, SkillRecord),
    DungeonClear { player: PlayerId, dungeon_id: String },
}

impl PersistOp {
    pub fn player(&self) -> PlayerId {
        match self {
            PersistOp::Stats(p, _) | PersistOp::Inventory(p, _) | PersistOp::Skills(p, _) => *p,
            PersistOp::DungeonClear { player, .. } => *player,
        }
    }

    pub fn kind(&self) -> PersistKind {
        match self {
            PersistOp::Stats(..) => PersistKind::Stats,
            PersistOp::Inventory(..) => PersistKind::Inventory,
            PersistOp::Skills(..) => PersistKind::Skills,
            PersistOp::DungeonClear { .. } => PersistKind::DungeonClear,
        }
    }

    /// Snapshots replace each other; clears are counted, so each one stays.
    fn supersedes(&self, other: &PersistOp) -> bool {
        self.kind() != PersistKind::DungeonClear
            && self.kind() == other.kind()
            && self.player() == other.player()
    }

    fn apply(&self, gateway: &dyn PersistenceGateway) -> Result<Option<u32>, PersistError> {
        match self {
            PersistOp::Stats(p, r) => gateway.save_stats(*p, r).map(|_| None),
            PersistOp::Inventory(p, r) => gateway.save_inventory(*p, r).map(|_| None),
            PersistOp::Skills(p, r) => gateway.save_skills(*p, r).map(|_| None),
            PersistOp::DungeonClear { player, dungeon_id } => {
                gateway.record_dungeon_clear(*player, dungeon_id).map(Some)
            }
        }
    }
}

/// A queued write and how often it has failed
#[derive(Debug, Clone)]
pub(crate) struct Pending {
    pub(crate) op: PersistOp,
    pub(crate) attempts: u32,
}

/// What the writer made of one operation
#[derive(Debug)]
pub(crate) struct WriteOutcome {
    pub(crate) pending: Pending,
    pub(crate) result: Result<Option<u32>, PersistError>,
}

/// Run a batch against the gateway, oldest first.
pub(crate) fn write_batch(
    gateway: &dyn PersistenceGateway,
    batch: Vec<Pending>,
) -> Vec<WriteOutcome> {
    batch
        .into_iter()
        .map(|pending| {
            let result = pending.op.apply(gateway);
            WriteOutcome { pending, result }
        })
        .collect()
}

/// An operation given up on
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedOp {
    pub player: PlayerId,
    pub kind: PersistKind,
    pub error: PersistError,
}

/// Outcome of the writes settled so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlushReport {
    pub written: usize,
    /// `(player, dungeon, total clears)` for each recorded clear
    pub clears: Vec<(PlayerId, String, u32)>,
    pub dropped: Vec<DroppedOp>,
}

impl FlushReport {
    fn record(&mut self, op: &PersistOp, result: Option<u32>) {
        self.written += 1;
        if let (PersistOp::DungeonClear { player, dungeon_id }, Some(total)) = (op, result) {
            self.clears.push((*player, dungeon_id.clone(), total));
        }
    }

    pub fn merge(&mut self, other: FlushReport) {
        self.written += other.written;
        self.clears.extend(other.clears);
        self.dropped.extend(other.dropped);
    }
}

/// Pending writes for one instance
///
/// The queue itself never touches the gateway: batches are taken out,
/// written elsewhere and their outcomes settled back in.
#[derive(Debug, Clone, Default)]
pub struct PersistQueue {
    pending: VecDeque<Pending>,
}

impl PersistQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a write, replacing an unwritten snapshot of the same record.
    pub fn push(&mut self, op: PersistOp) {
        if let Some(existing) = self.pending.iter_mut().find(|p| op.supersedes(&p.op)) {
            existing.op = op;
            existing.attempts = 0;
            return;
        }
        self.pending.push_back(Pending { op, attempts: 0 });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove up to `budget` operations, oldest first.
    pub(crate) fn take_batch(&mut self, budget: usize) -> Vec<Pending> {
        let take = budget.min(self.pending.len());
        self.pending.drain(..take).collect()
    }

    pub(crate) fn take_all(&mut self) -> Vec<Pending> {
        self.pending.drain(..).collect()
    }

    /// Fold a written batch back in.
    ///
    /// A failed operation goes back to the front of the queue until it has
    /// failed `max_attempts` times, then it is dropped and reported. A
    /// failed snapshot that a newer queued one already replaces is let go.
    pub(crate) fn settle(
        &mut self,
        outcomes: Vec<WriteOutcome>,
        max_attempts: u32,
    ) -> FlushReport {
        let mut report = FlushReport::default();
        let mut retry = Vec::new();

        for WriteOutcome {
            mut pending,
            result,
        } in outcomes
        {
            let e = match result {
                Ok(result) => {
                    report.record(&pending.op, result);
                    continue;
                }
                Err(e) => e,
            };
            pending.attempts += 1;
            if self.pending.iter().any(|p| p.op.supersedes(&pending.op)) {
                debug!(
                    player = %pending.op.player(),
                    kind = %pending.op.kind(),
                    "failed save already replaced by a newer one"
                );
            } else if pending.attempts >= max_attempts {
                error!(
                    player = %pending.op.player(),
                    kind = %pending.op.kind(),
                    attempts = pending.attempts,
                    "dropping save after repeated failures: {e}"
                );
                report.dropped.push(DroppedOp {
                    player: pending.op.player(),
                    kind: pending.op.kind(),
                    error: e,
                });
            } else {
                warn!(
                    player = %pending.op.player(),
                    kind = %pending.op.kind(),
                    attempts = pending.attempts,
                    "save failed, will retry: {e}"
                );
                retry.push(pending);
            }
        }

        for pending in retry.into_iter().rev() {
            self.pending.push_front(pending);
        }
        if report.written > 0 {
            debug!(written = report.written, left = self.pending.len(), "settled saves");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(level: u32) -> StatsRecord {
        StatsRecord {
            level,
            xp: 0,
            strength: 1,
            dexterity: 1,
            intelligence: 1,
            vitality: 1,
            skill_points: 0,
        }
    }

    /// One synchronous write-and-settle round.
    fn flush(
        q: &mut PersistQueue,
        gw: &dyn PersistenceGateway,
        budget: usize,
        max_attempts: u32,
    ) -> FlushReport {
        let batch = q.take_batch(budget);
        q.settle(write_batch(gw, batch), max_attempts)
    }

    #[test]
    fn test_newer_snapshot_supersedes() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(2)));
        q.push(PersistOp::Stats(PlayerId(1), stats(3)));
        q.push(PersistOp::Stats(PlayerId(2), stats(1)));
        assert_eq!(q.len(), 2);

        let gw = MemoryGateway::new();
        let report = flush(&mut q, &gw, 10, 3);
        assert_eq!(report.written, 2);
        assert_eq!(gw.record(PlayerId(1)).unwrap().stats.unwrap().level, 3);
    }

    #[test]
    fn test_clears_are_never_merged() {
        let mut q = PersistQueue::new();
        for _ in 0..2 {
            q.push(PersistOp::DungeonClear {
                player: PlayerId(1),
                dungeon_id: "crypt".into(),
            });
        }
        assert_eq!(q.len(), 2);
        let gw = MemoryGateway::new();
        let report = flush(&mut q, &gw, 10, 3);
        assert_eq!(
            report.clears,
            vec![
                (PlayerId(1), "crypt".to_string(), 1),
                (PlayerId(1), "crypt".to_string(), 2)
            ]
        );
        assert_eq!(gw.clears(PlayerId(1), "crypt"), 2);
    }

    #[test]
    fn test_budget_limits_each_batch() {
        let mut q = PersistQueue::new();
        for id in 0..5 {
            q.push(PersistOp::Stats(PlayerId(id), stats(1)));
        }
        assert_eq!(q.take_batch(2).len(), 2);
        assert_eq!(q.len(), 3);
    }

    #[test]
    fn test_retry_then_drop() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(1)));
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);

        assert!(flush(&mut q, &gw, 10, 3).dropped.is_empty());
        assert!(flush(&mut q, &gw, 10, 3).dropped.is_empty());
        let report = flush(&mut q, &gw, 10, 3);
        assert_eq!(report.dropped.len(), 1);
        assert_eq!(report.dropped[0].kind, PersistKind::Stats);
        assert!(q.is_empty());
    }

    #[test]
    fn test_recovers_before_limit() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(4)));
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);
        flush(&mut q, &gw, 10, 3);
        gw.set_unavailable(false);
        let report = flush(&mut q, &gw, 10, 3);
        assert_eq!(report.written, 1);
        assert_eq!(gw.record(PlayerId(1)).unwrap().stats.unwrap().level, 4);
    }

    #[test]
    fn test_failed_snapshot_yields_to_newer_one() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(2)));
        let batch = q.take_batch(10);
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);
        let outcomes = write_batch(&gw, batch);

        // A newer snapshot arrives while the old one is being written.
        q.push(PersistOp::Stats(PlayerId(1), stats(5)));
        let report = q.settle(outcomes, 3);
        assert!(report.dropped.is_empty());
        assert_eq!(q.len(), 1);

        gw.set_unavailable(false);
        flush(&mut q, &gw, 10, 3);
        assert_eq!(gw.record(PlayerId(1)).unwrap().stats.unwrap().level, 5);
    }

    #[test]
    fn test_superseded_failure_on_last_attempt_is_not_lost() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(2)));
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);
        let outcomes = write_batch(&gw, q.take_all());

        q.push(PersistOp::Stats(PlayerId(1), stats(3)));
        let report = q.settle(outcomes, 1);
        assert!(report.dropped.is_empty());
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn test_take_all_empties_the_queue() {
        let mut q = PersistQueue::new();
        q.push(PersistOp::Stats(PlayerId(1), stats(1)));
        q.push(PersistOp::Inventory(PlayerId(1), InventoryRecord::default()));
        let gw = MemoryGateway::new();
        gw.set_unavailable(true);
        let batch = q.take_all();
        assert!(q.is_empty());
        let report = q.settle(write_batch(&gw, batch), 1);
        assert_eq!(report.dropped.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn test_merge_reports() {
        let mut a = FlushReport {
            written: 1,
            ..Default::default()
        };
        a.merge(FlushReport {
            written: 2,
            clears: vec![(PlayerId(1), "crypt".into(), 1)],
            dropped: Vec::new(),
        });
        assert_eq!(a.written, 3);
        assert_eq!(a.clears.len(), 1);
    }
}
