//! Inbound client messages and outbound server events
//!
//! Both directions are serde enums tagged by `type`. Outbound events are
//! queued as [`Envelope`]s and drained by whatever host owns the transport.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Vec3;
use crate::action::InputPacket;
use crate::combat::{ProjectileId, StatusKind, TargetId};
use crate::data::{Rarity, SkillEffect};
use crate::monster::MonsterId;
use crate::object::LootId;
use crate::player::{ItemStack, PlayerId};

/// A message from one client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    Input(InputPacket),
    Pickup { loot_id: LootId },
    RequestInventory,
    AllocateSkill { node_id: String },
    SetHotbar {
        slot: usize,
        #[serde(default)]
        skill_id: Option<String>,
    },
    RequestSkills,
    UseSkill { skill_id: String },
    UseHotbar { slot: usize },
    UseItem { def_id: String },
    NextFloor,
    ExitDungeon,
}

/// A message to one or all clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    InventoryFull {
        loot_id: LootId,
    },
    Inventory {
        items: Vec<ItemStack>,
        gold: u64,
        capacity: usize,
    },
    SkillsFull {
        allocations: BTreeMap<String, u32>,
        hotbar: Vec<Option<String>>,
        skill_points: u32,
    },
    SkillsUpdated {
        allocations: BTreeMap<String, u32>,
        hotbar: Vec<Option<String>>,
        skill_points: u32,
    },
    SkillUsed {
        player_id: PlayerId,
        skill_id: String,
        effect: SkillEffect,
        position: Vec3,
        facing: f32,
    },
    SkillFail {
        skill_id: Option<String>,
        reason: String,
    },
    LootAcquired {
        player_id: PlayerId,
        loot_id: LootId,
        item: String,
        rarity: Rarity,
    },
    GoldGained {
        player_id: PlayerId,
        amount: u32,
        total: u64,
    },
    Damage {
        target_id: TargetId,
        source_id: Option<TargetId>,
        amount: i32,
        is_crit: bool,
        is_dodge: bool,
        dot_type: Option<StatusKind>,
        is_heal: bool,
    },
    LevelUp {
        player_id: PlayerId,
        level: u32,
        skill_points: u32,
    },
    PlayerDied {
        player_id: PlayerId,
        killer_id: Option<TargetId>,
    },
    FloorStarted {
        floor_index: usize,
        floor_count: usize,
        is_boss_floor: bool,
    },
    FloorCleared {
        floor_index: usize,
    },
    DungeonComplete {
        dungeon_id: String,
    },
    BossPhase {
        monster_id: MonsterId,
        phase: usize,
    },
    BossTelegraph {
        monster_id: MonsterId,
        #[serde(rename = "type")]
        kind: String,
        x: f32,
        z: f32,
        radius: f32,
        duration: f64,
    },
    StatusEffect {
        target_id: TargetId,
        #[serde(rename = "type")]
        kind: StatusKind,
        duration: f32,
    },
    ProjectileSpawn {
        projectile_id: ProjectileId,
        source_id: MonsterId,
        position: Vec3,
        velocity: Vec3,
        radius: f32,
    },
    ProjectileDestroy {
        projectile_id: ProjectileId,
        hit_id: Option<PlayerId>,
    },
    ReturnToHub {
        player_id: PlayerId,
    },
    UseItemFail {
        def_id: String,
        reason: String,
    },
    PersistWarning {
        message: String,
    },
}

impl ServerEvent {
    /// A plain (non-DOT, non-heal) damage event.
    pub fn hit(
        target_id: TargetId,
        source_id: Option<TargetId>,
        amount: i32,
        is_crit: bool,
        is_dodge: bool,
    ) -> Self {
        ServerEvent::Damage {
            target_id,
            source_id,
            amount,
            is_crit,
            is_dodge,
            dot_type: None,
            is_heal: false,
        }
    }
}

/// Who receives an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recipient {
    All,
    Player(PlayerId),
}

/// An addressed outbound event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub recipient: Recipient,
    pub event: ServerEvent,
}

/// Outbound events in emission order
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    queue: Vec<Envelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, event: ServerEvent) {
        self.queue.push(Envelope {
            recipient: Recipient::All,
            event,
        });
    }

    pub fn send(&mut self, player: PlayerId, event: ServerEvent) {
        self.queue.push(Envelope {
            recipient: Recipient::Player(player),
            event,
        });
    }

    pub fn drain(&mut self) -> Vec<Envelope> {
        std::mem::take(&mut self.queue)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_names() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{ "type": "pickup", "lootId": 4 }"#).unwrap();
        assert_eq!(msg, ClientMessage::Pickup { loot_id: LootId(4) });

        let msg: ClientMessage = serde_json::from_str(
            r#"{ "type": "input", "seq": 3, "dt": 0.05, "rotation": 1.0, "forward": true }"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Input(p) => {
                assert_eq!(p.seq, 3);
                assert!(p.forward);
                assert!(!p.attack);
            }
            other => panic!("unexpected {other:?}"),
        }

        let msg: ClientMessage = serde_json::from_str(r#"{ "type": "next_floor" }"#).unwrap();
        assert_eq!(msg, ClientMessage::NextFloor);
    }

    #[test]
    fn test_telegraph_keeps_type_field() {
        let event = ServerEvent::BossTelegraph {
            monster_id: MonsterId(9),
            kind: "slam".into(),
            x: 1.0,
            z: 2.0,
            radius: 3.0,
            duration: 1.5,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "boss_telegraph");
        assert_eq!(json["data"]["type"], "slam");
        assert_eq!(json["data"]["radius"], 3.0);
    }

    #[test]
    fn test_outbox_preserves_order() {
        let mut out = Outbox::new();
        out.broadcast(ServerEvent::FloorCleared { floor_index: 0 });
        out.send(
            PlayerId(2),
            ServerEvent::PersistWarning {
                message: "x".into(),
            },
        );
        let drained = out.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].recipient, Recipient::All);
        assert_eq!(drained[1].recipient, Recipient::Player(PlayerId(2)));
        assert!(out.is_empty());
    }
}
