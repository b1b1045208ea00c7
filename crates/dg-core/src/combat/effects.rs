//! Timed status effects (damage over time and roots)
//!
//! A target carries at most one effect of each kind. Reapplying a kind
//! refreshes it to full duration and restarts its tick timer.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use super::TargetId;
use crate::data::EffectDef;

/// Tolerance for float accumulation when comparing against tick intervals.
const TICK_EPSILON: f32 = 1e-4;

/// Status effect kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    Poison,
    Burn,
    Bleed,
    /// Prevents movement while active
    Root,
}

/// A live effect attached to one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveStatusEffect {
    pub kind: StatusKind,
    /// Who applied it; resolved by id when credit is needed
    pub source: Option<TargetId>,
    pub damage_per_tick: i32,
    pub tick_interval: f32,
    pub duration: f32,
    pub remaining: f32,
    /// Time accumulated toward the next tick
    pub since_tick: f32,
}

impl ActiveStatusEffect {
    pub fn new(def: &EffectDef, source: Option<TargetId>) -> Self {
        Self {
            kind: def.kind,
            source,
            damage_per_tick: def.damage_per_tick,
            tick_interval: def.tick_interval,
            duration: def.duration,
            remaining: def.duration,
            since_tick: 0.0,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// One damage application produced by a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DotTick {
    pub target: TargetId,
    pub source: Option<TargetId>,
    pub kind: StatusKind,
    pub amount: i32,
}

/// All status effects in an instance, keyed by target
#[derive(Debug, Clone, Default)]
pub struct StatusEffectEngine {
    effects: HashMap<TargetId, Vec<ActiveStatusEffect>>,
}

impl StatusEffectEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply an effect, refreshing an existing one of the same kind.
    ///
    /// Returns true when an existing effect was refreshed.
    pub fn apply(&mut self, target: TargetId, def: &EffectDef, source: Option<TargetId>) -> bool {
        let list = self.effects.entry(target).or_default();
        let fresh = ActiveStatusEffect::new(def, source);
        if let Some(existing) = list.iter_mut().find(|e| e.kind == def.kind) {
            *existing = fresh;
            true
        } else {
            list.push(fresh);
            false
        }
    }

    pub fn has(&self, target: TargetId, kind: StatusKind) -> bool {
        self.get(target, kind).is_some()
    }

    pub fn get(&self, target: TargetId, kind: StatusKind) -> Option<&ActiveStatusEffect> {
        self.effects
            .get(&target)?
            .iter()
            .find(|e| e.kind == kind && !e.is_expired())
    }

    /// Number of active effects on a target
    pub fn count(&self, target: TargetId) -> usize {
        self.effects.get(&target).map_or(0, Vec::len)
    }

    /// Drop every effect on a target (death, leaving the instance).
    pub fn clear_target(&mut self, target: TargetId) {
        self.effects.remove(&target);
    }

    /// Drop every effect carried by monsters (floor teardown).
    pub fn clear_monsters(&mut self) {
        self.effects
            .retain(|target, _| matches!(target, TargetId::Player(_)));
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Advance every effect by `dt` seconds.
    ///
    /// Returns the damage ticks that came due, in target order. The tick
    /// accumulator keeps its remainder so ticks do not drift, and an effect
    /// can tick at most for the time it had left.
    pub fn tick(&mut self, dt: f32) -> Vec<DotTick> {
        let mut ticks = Vec::new();
        for (target, list) in self.effects.iter_mut() {
            for effect in list.iter_mut() {
                let active = dt.min(effect.remaining.max(0.0));
                effect.remaining -= dt;
                effect.since_tick += active;
                if effect.tick_interval <= 0.0 {
                    continue;
                }
                while effect.since_tick + TICK_EPSILON >= effect.tick_interval {
                    effect.since_tick -= effect.tick_interval;
                    if effect.damage_per_tick > 0 {
                        ticks.push(DotTick {
                            target: *target,
                            source: effect.source,
                            kind: effect.kind,
                            amount: effect.damage_per_tick,
                        });
                    }
                }
            }
            list.retain(|e| !e.is_expired());
        }
        self.effects.retain(|_, list| !list.is_empty());
        ticks.sort_by_key(|t| t.target);
        ticks
    }
}
