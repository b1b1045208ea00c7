//! Skill execution, allocation and hotbar handling

use std::sync::Arc;

use tracing::debug;

use super::DungeonInstance;
use crate::data::SkillEffect;
use crate::geom::forward_xz;
use crate::player::PlayerId;
use crate::skills::{check_use, rank_multiplier};
use crate::world::{ServerEvent, SkillError};
use crate::{CHARGE_DAMAGE_FACTOR, CHARGE_DISTANCE, CHARGE_STUN_SECS, GROUND_Y};

impl DungeonInstance {
    /// Validate and run a skill for a player.
    ///
    /// Preconditions, in order: the skill exists, the player has learned it,
    /// it is off cooldown and the player has the mana. On success mana is
    /// spent, the cooldown armed and `skill_used` broadcast before the
    /// effect resolves; any kill it causes is resolved before this returns.
    /// Failures change nothing.
    pub fn try_execute(&mut self, player: PlayerId, skill_id: &str) -> Result<(), SkillError> {
        let defs = Arc::clone(&self.defs);
        let node = defs
            .skill(skill_id)
            .ok_or_else(|| SkillError::UnknownSkill(skill_id.to_string()))?;
        let entity = self
            .state
            .players
            .get_mut(&player)
            .ok_or(SkillError::UnknownPlayer)?;
        let session = self
            .sessions
            .get_mut(&player)
            .ok_or(SkillError::UnknownPlayer)?;
        if !entity.is_alive() {
            return Err(SkillError::PlayerDead);
        }
        check_use(
            node,
            &session.skills,
            &entity.stats,
            &session.skill_cooldowns,
            self.now,
        )?;

        let points = session.skills.points(&node.id);
        entity.stats.adjust_mana(-node.mana_cost);
        session
            .skill_cooldowns
            .arm(&node.id, self.now + node.cooldown);

        let multiplier = rank_multiplier(node, points);
        let raw = ((self.config.basic_attack_base + entity.stats.strength) as f32 * multiplier)
            .round() as i32;
        let dex = entity.stats.dexterity;

        if node.effect == SkillEffect::Charge {
            let (fx, fz) = forward_xz(entity.facing);
            entity.position = entity
                .position
                .offset_xz(fx * CHARGE_DISTANCE, fz * CHARGE_DISTANCE);
            entity.position.y = GROUND_Y;
        }
        let origin = entity.position;

        self.outbox.broadcast(ServerEvent::SkillUsed {
            player_id: player,
            skill_id: node.id.clone(),
            effect: node.effect,
            position: origin,
            facing: entity.facing,
        });
        debug!(instance = %self.id, %player, skill = %node.id, rank = points, "skill used");

        match node.effect {
            SkillEffect::PowerStrike => {
                if let Some(target) = self.nearest_monster(&origin, node.range) {
                    self.damage_monster(Some(player), target, raw, dex);
                }
            }
            SkillEffect::Whirlwind => {
                let targets: Vec<_> = self
                    .state
                    .living_monsters()
                    .filter(|m| m.position.distance_xz(&origin) <= node.range)
                    .map(|m| m.id)
                    .collect();
                for target in targets {
                    self.damage_monster(Some(player), target, raw, dex);
                }
            }
            SkillEffect::Charge => {
                if let Some(target) = self.nearest_monster(&origin, node.range) {
                    if let Some(rt) = self.runtimes.get_mut(&target) {
                        rt.stun_until(self.now + CHARGE_STUN_SECS);
                    }
                    let reduced = (raw as f32 * CHARGE_DAMAGE_FACTOR).round() as i32;
                    self.damage_monster(Some(player), target, reduced, dex);
                }
            }
        }
        Ok(())
    }

    pub(super) fn allocate_skill(&mut self, player: PlayerId, node_id: &str) {
        let defs = Arc::clone(&self.defs);
        let (Some(entity), Some(session)) = (
            self.state.players.get_mut(&player),
            self.sessions.get_mut(&player),
        ) else {
            return;
        };
        match session
            .skills
            .allocate(&defs, node_id, &entity.class_id, &mut entity.stats)
        {
            Ok(rank) => {
                debug!(instance = %self.id, %player, skill = node_id, rank, "skill point allocated");
                if let Some(event) = self.skills_event(player, false) {
                    self.outbox.send(player, event);
                }
                self.queue_skills(player);
                self.queue_stats(player);
            }
            Err(e) => {
                debug!(instance = %self.id, %player, skill = node_id, "allocation refused: {e}");
                self.outbox.send(
                    player,
                    ServerEvent::SkillFail {
                        skill_id: Some(node_id.to_string()),
                        reason: e.to_string(),
                    },
                );
            }
        }
    }

    pub(super) fn set_hotbar(&mut self, player: PlayerId, slot: usize, skill_id: Option<String>) {
        let Some(session) = self.sessions.get_mut(&player) else {
            return;
        };
        match session.skills.set_hotbar(slot, skill_id.clone()) {
            Ok(()) => {
                if let Some(event) = self.skills_event(player, false) {
                    self.outbox.send(player, event);
                }
                self.queue_skills(player);
            }
            Err(e) => {
                self.outbox.send(
                    player,
                    ServerEvent::SkillFail {
                        skill_id,
                        reason: e.to_string(),
                    },
                );
            }
        }
    }
}
