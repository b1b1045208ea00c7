//! Scripted players
//!
//! A bot looks at the replicated state the way a client would and answers
//! with the messages a client would send: walk to the nearest monster, swing
//! at it, spend skill points, use skills and potions, collect loot and ask
//! for the next floor.

use std::sync::Arc;

use dg_core::action::InputPacket;
use dg_core::data::{Definitions, SkillEffect, SkillNode};
use dg_core::monster::MonsterEntity;
use dg_core::player::{PlayerEntity, PlayerId};
use dg_core::world::ClientMessage;
use dg_core::{DungeonInstance, Vec3, facing_towards};

const SKILL_PRIORITY: [&str; 3] = ["power_strike", "whirlwind", "charge"];
const POTION: &str = "health_potion";
const POTION_HP_RATIO: f32 = 0.35;
const LOOT_SEARCH_RADIUS: f32 = 15.0;
const CHARGE_MIN_DISTANCE: f32 = 5.0;
const CHARGE_MAX_DISTANCE: f32 = 9.0;

pub struct Bot {
    pub id: PlayerId,
    pub name: String,
    defs: Arc<Definitions>,
    seq: i64,
    pub exited: bool,
}

impl Bot {
    pub fn new(id: PlayerId, name: String, defs: Arc<Definitions>) -> Self {
        Self {
            id,
            name,
            defs,
            seq: 0,
            exited: false,
        }
    }

    /// Messages this bot sends before the next tick.
    pub fn decide(&mut self, inst: &DungeonInstance, dt: f32) -> Vec<ClientMessage> {
        let mut out = Vec::new();
        if self.exited {
            return out;
        }
        let Some(me) = inst.state().players.get(&self.id) else {
            return out;
        };
        if !me.is_alive() {
            return out;
        }

        let floor = &inst.state().floor;
        if floor.dungeon_complete {
            self.exited = true;
            out.push(ClientMessage::ExitDungeon);
            return out;
        }

        if me.stats.skill_points > 0 {
            if let Some(node) = self.next_allocation(inst, me) {
                out.push(ClientMessage::AllocateSkill {
                    node_id: node.id.clone(),
                });
            }
        }
        if let Some(msg) = self.maybe_drink(inst, me) {
            out.push(msg);
        }
        if let Some(loot_id) = inst
            .state()
            .loot
            .values()
            .find(|l| l.position.distance_xz(&me.position) <= inst.config().pickup_range)
            .map(|l| l.id)
        {
            out.push(ClientMessage::Pickup { loot_id });
        }

        let target = inst
            .state()
            .living_monsters()
            .min_by(|a, b| {
                a.position
                    .distance_xz(&me.position)
                    .total_cmp(&b.position.distance_xz(&me.position))
            });
        match target {
            Some(monster) => self.fight(inst, me, monster, dt, &mut out),
            None => {
                let loot = inst
                    .state()
                    .loot
                    .values()
                    .map(|l| l.position)
                    .filter(|p| p.distance_xz(&me.position) <= LOOT_SEARCH_RADIUS)
                    .min_by(|a, b| {
                        a.distance_xz(&me.position)
                            .total_cmp(&b.distance_xz(&me.position))
                    });
                match loot {
                    Some(at) => out.push(self.walk(me, &at, dt, false)),
                    None if floor.floor_cleared => out.push(ClientMessage::NextFloor),
                    None => {}
                }
            }
        }
        out
    }

    fn fight(
        &mut self,
        inst: &DungeonInstance,
        me: &PlayerEntity,
        monster: &MonsterEntity,
        dt: f32,
        out: &mut Vec<ClientMessage>,
    ) {
        let dist = monster.position.distance_xz(&me.position);
        let in_reach = dist <= inst.config().basic_attack_range * 0.9;

        let nearby = inst
            .state()
            .living_monsters()
            .filter(|m| m.position.distance_xz(&me.position) <= 4.0)
            .count();
        let wanted = if nearby >= 2 {
            Some(SkillEffect::Whirlwind)
        } else if in_reach {
            Some(SkillEffect::PowerStrike)
        } else if (CHARGE_MIN_DISTANCE..=CHARGE_MAX_DISTANCE).contains(&dist) {
            Some(SkillEffect::Charge)
        } else {
            None
        };
        let skill_id = wanted
            .and_then(|effect| self.usable(inst, me, effect))
            .map(|node| node.id.clone());
        if let Some(skill_id) = skill_id {
            // Face the target first so a charge dashes toward it.
            out.push(self.walk(me, &monster.position, dt, false));
            out.push(ClientMessage::UseSkill { skill_id });
            return;
        }

        out.push(self.walk(me, &monster.position, dt, in_reach));
    }

    /// An input facing `at`, moving toward it unless attacking.
    fn walk(&mut self, me: &PlayerEntity, at: &Vec3, dt: f32, attack: bool) -> ClientMessage {
        let packet = InputPacket {
            seq: self.seq,
            dt,
            rotation: facing_towards(&me.position, at),
            forward: !attack && me.position.distance_xz(at) > 0.5,
            attack,
            ..Default::default()
        };
        self.seq += 1;
        ClientMessage::Input(packet)
    }

    fn usable(
        &self,
        inst: &DungeonInstance,
        me: &PlayerEntity,
        effect: SkillEffect,
    ) -> Option<&SkillNode> {
        let session = inst.session(self.id)?;
        let node = self.defs.skills().find(|s| s.effect == effect)?;
        let ready = session.skills.points(&node.id) > 0
            && session
                .skill_cooldowns
                .remaining(&node.id, inst.now())
                .is_none()
            && me.stats.mana >= node.mana_cost;
        ready.then_some(node)
    }

    fn next_allocation(&self, inst: &DungeonInstance, me: &PlayerEntity) -> Option<&SkillNode> {
        let session = inst.session(self.id)?;
        SKILL_PRIORITY
            .iter()
            .filter_map(|id| self.defs.skill(id))
            .find(|node| {
                let class_ok = node.class_id.as_ref().is_none_or(|c| *c == me.class_id);
                let prereq_ok = node
                    .requires
                    .as_ref()
                    .is_none_or(|r| session.skills.points(&r.skill) >= r.points);
                class_ok
                    && prereq_ok
                    && me.stats.level >= node.required_level
                    && session.skills.points(&node.id) < node.max_rank
            })
    }

    fn maybe_drink(&self, inst: &DungeonInstance, me: &PlayerEntity) -> Option<ClientMessage> {
        let session = inst.session(self.id)?;
        let hurt = (me.stats.hp as f32) < me.stats.max_hp as f32 * POTION_HP_RATIO;
        let ready = session.inventory.count(POTION) > 0
            && session
                .item_cooldowns
                .remaining(POTION, inst.now())
                .is_none();
        (hurt && ready).then(|| ClientMessage::UseItem {
            def_id: POTION.to_string(),
        })
    }
}
