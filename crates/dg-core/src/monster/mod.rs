//! Monster system
//!
//! A monster is split in two: [`MonsterEntity`] is the replicated part
//! clients see, [`MonsterRuntime`] holds the simulation-only timers. Both
//! are keyed by the same [`MonsterId`] and owned by the instance.

pub mod ai;
pub mod boss;

pub use ai::{AiContext, MonsterAction, PlayerView};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::Vec3;
use crate::data::MonsterDef;
use crate::player::PlayerId;

/// Unique identifier for a monster within an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonsterId(pub u32);

/// AI state tag
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AiState {
    #[default]
    Idle,
    Chase,
    Attack,
    Return,
    Dead,
}

/// Replicated monster state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterEntity {
    pub id: MonsterId,
    pub def_id: String,
    pub position: Vec3,
    pub facing: f32,
    pub hp: i32,
    pub max_hp: i32,
    pub state: AiState,
    /// Current target, resolved by lookup each tick
    pub target: Option<PlayerId>,
    /// Boss phase index (0 for ordinary monsters)
    pub phase: usize,
}

impl MonsterEntity {
    pub fn new(id: MonsterId, def: &MonsterDef, position: Vec3) -> Self {
        Self {
            id,
            def_id: def.id.clone(),
            position,
            facing: 0.0,
            hp: def.max_hp,
            max_hp: def.max_hp,
            state: AiState::Idle,
            target: None,
            phase: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0 && self.state != AiState::Dead
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32
    }

    /// Subtract damage, keeping hp within `[0, max_hp]`.
    ///
    /// Returns true if this hit brought the monster to zero.
    pub fn apply_damage(&mut self, amount: i32) -> bool {
        let was_alive = self.hp > 0;
        self.hp = (self.hp - amount.max(0)).clamp(0, self.max_hp);
        was_alive && self.hp == 0
    }

    /// Put the monster back to full health at `position`.
    pub fn reset(&mut self, position: Vec3) {
        self.position = position;
        self.hp = self.max_hp;
        self.state = AiState::Idle;
        self.target = None;
        self.facing = 0.0;
    }
}

/// Simulation-only monster state
#[derive(Debug, Clone, PartialEq)]
pub struct MonsterRuntime {
    pub spawn_pos: Vec3,
    /// Seconds until the next basic attack is allowed
    pub attack_timer: f32,
    /// Seconds until a dead monster returns
    pub respawn_timer: f32,
    /// Configured respawn delay; 0 means never
    pub respawn_duration: f32,
    pub dead: bool,
    /// Highest phase reached; never decreases
    pub phase: usize,
    /// Simulation time until which the monster cannot act
    pub stunned_until: f64,
    /// Seconds until each ability (by index into the definition) is ready
    pub ability_timers: Vec<f32>,
    /// Boss that summoned this monster
    pub summoned_by: Option<MonsterId>,
}

impl MonsterRuntime {
    pub fn new(def: &MonsterDef, spawn_pos: Vec3, respawn_duration: f32) -> Self {
        Self {
            spawn_pos,
            attack_timer: 0.0,
            respawn_timer: 0.0,
            respawn_duration: respawn_duration.max(0.0),
            dead: false,
            phase: 0,
            stunned_until: 0.0,
            ability_timers: vec![0.0; def.abilities.len()],
            summoned_by: None,
        }
    }

    /// Mark dead and arm the respawn timer if this monster comes back.
    pub fn mark_dead(&mut self) {
        self.dead = true;
        self.respawn_timer = self.respawn_duration;
    }

    /// Dead with a respawn still to come.
    pub fn has_pending_respawn(&self) -> bool {
        self.dead && self.respawn_duration > 0.0
    }

    /// Keep a dead monster down for good. Returns whether a respawn was
    /// called off.
    pub fn cancel_respawn(&mut self) -> bool {
        let pending = self.has_pending_respawn();
        self.respawn_duration = 0.0;
        self.respawn_timer = 0.0;
        pending
    }

    pub fn is_stunned(&self, now: f64) -> bool {
        self.stunned_until > now
    }

    pub fn stun_until(&mut self, until: f64) {
        self.stunned_until = self.stunned_until.max(until);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(respawn: f32) -> MonsterDef {
        MonsterDef {
            id: "rat".into(),
            name: "Rat".into(),
            max_hp: 10,
            damage: 2,
            armor: 0,
            speed: 3.0,
            aggro_range: 6.0,
            attack_range: 1.5,
            attack_cooldown: 1.0,
            xp: 5,
            loot_table: None,
            respawn_secs: respawn,
            is_boss: false,
            phases: Vec::new(),
            abilities: Vec::new(),
        }
    }

    #[test]
    fn test_damage_clamps_and_reports_kill_once() {
        let mut m = MonsterEntity::new(MonsterId(1), &def(0.0), Vec3::ZERO);
        assert!(!m.apply_damage(4));
        assert!(m.apply_damage(100));
        assert_eq!(m.hp, 0);
        assert!(!m.apply_damage(5));
        assert_eq!(m.hp, 0);
    }

    #[test]
    fn test_negative_damage_does_not_overheal() {
        let mut m = MonsterEntity::new(MonsterId(1), &def(0.0), Vec3::ZERO);
        m.apply_damage(-50);
        assert_eq!(m.hp, m.max_hp);
    }

    #[test]
    fn test_pending_respawn() {
        let d = def(5.0);
        let mut rt = MonsterRuntime::new(&d, Vec3::ZERO, d.respawn_secs);
        assert!(!rt.has_pending_respawn());
        rt.mark_dead();
        assert!(rt.has_pending_respawn());
        assert_eq!(rt.respawn_timer, 5.0);

        let mut never = MonsterRuntime::new(&d, Vec3::ZERO, 0.0);
        never.mark_dead();
        assert!(!never.has_pending_respawn());

        assert!(rt.cancel_respawn());
        assert!(!rt.has_pending_respawn());
        assert!(!never.cancel_respawn());
    }

    #[test]
    fn test_stun_only_extends() {
        let d = def(0.0);
        let mut rt = MonsterRuntime::new(&d, Vec3::ZERO, 0.0);
        rt.stun_until(3.0);
        rt.stun_until(2.0);
        assert!(rt.is_stunned(2.5));
        assert!(!rt.is_stunned(3.0));
    }
}
