//! Scheduled events on the instance clock
//!
//! Delayed work (telegraph impacts, player respawns) is queued here with an
//! absolute due time and consumed by the tick loop, so advancing simulated
//! time is all a test needs to make them fire.

use crate::data::EffectDef;
use crate::monster::MonsterId;
use crate::player::PlayerId;

/// What happens when a scheduled event comes due
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledKind {
    /// Resolve a telegraphed area attack against whoever stands in it now
    TelegraphImpact {
        source: MonsterId,
        x: f32,
        z: f32,
        radius: f32,
        raw: i32,
        effect: Option<EffectDef>,
    },
    PlayerRespawn(PlayerId),
}

/// A queued event
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub due: f64,
    pub kind: ScheduledKind,
}

/// Events ordered by due time; ties keep insertion order
#[derive(Debug, Clone, Default)]
pub struct EventSchedule {
    events: Vec<ScheduledEvent>,
}

impl EventSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: f64, kind: ScheduledKind) {
        let pos = self
            .events
            .iter()
            .position(|e| e.due > due)
            .unwrap_or(self.events.len());
        self.events.insert(pos, ScheduledEvent { due, kind });
    }

    /// Remove and return every event due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let split = self
            .events
            .iter()
            .position(|e| e.due > now)
            .unwrap_or(self.events.len());
        self.events.drain(..split).collect()
    }

    /// Drop every pending telegraph impact.
    pub fn cancel_telegraphs(&mut self) {
        self.events
            .retain(|e| !matches!(e.kind, ScheduledKind::TelegraphImpact { .. }));
    }

    /// Drop events tied to a player who left.
    pub fn cancel_player(&mut self, player: PlayerId) {
        self.events
            .retain(|e| e.kind != ScheduledKind::PlayerRespawn(player));
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
