//! Shared fixtures for instance-level tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dg_core::combat::StatusKind;
use dg_core::data::{
    AbilityDef, AbilityKind, ClassDef, Consumable, DefinitionPack, Definitions, DungeonDef,
    EffectDef, FloorDef, ItemDef, LootEntry, LootTable, MonsterDef, PhaseDef, Rarity, SkillEffect,
    SkillNode, SkillRequirement, SpawnDef, StatGrowth,
};
use dg_core::monster::MonsterId;
use dg_core::persist::{
    InventoryRecord, MemoryGateway, PersistenceGateway, PlayerRecord, SkillRecord, StatsRecord,
};
use dg_core::player::PlayerId;
use dg_core::world::{Envelope, InstanceConfig, PersistError, Recipient, ServerEvent};
use dg_core::{DungeonInstance, Vec3};

pub const DUNGEON: &str = "test_crypt";
pub const TRAINING_YARD: &str = "training_yard";
pub const SUMMONER_DEN: &str = "summoner_den";
pub const ARCHERY_RANGE: &str = "archery_range";
pub const RESPAWN_PIT: &str = "respawn_pit";

/// Where the respawning dummy in the respawn pit stands
pub const RESPAWN_POINT: Vec3 = Vec3 {
    x: 5.0,
    y: 0.0,
    z: 5.0,
};
/// Ring of dummies in the training yard
pub const RING_SIZE: usize = 12;
pub const RING_RADIUS: f32 = 3.0;
pub const HERO: PlayerId = PlayerId(1);
pub const DT: f32 = 0.05;

fn warrior() -> ClassDef {
    ClassDef {
        id: "warrior".into(),
        name: "Warrior".into(),
        base_hp: 100,
        base_mana: 30,
        hp_per_level: 10,
        mana_per_level: 5,
        base_armor: 0,
        strength: 12,
        dexterity: 0,
        intelligence: 2,
        vitality: 5,
        growth: StatGrowth {
            strength: 2,
            dexterity: 0,
            intelligence: 0,
            vitality: 1,
        },
    }
}

fn skill(id: &str, effect: SkillEffect, mana: i32, cooldown: f64, range: f32) -> SkillNode {
    SkillNode {
        id: id.into(),
        name: id.into(),
        effect,
        class_id: Some("warrior".into()),
        max_rank: 3,
        required_level: 1,
        requires: None,
        mana_cost: mana,
        cooldown,
        base_value: 2.0,
        range,
    }
}

fn monster(id: &str, max_hp: i32, damage: i32, armor: i32) -> MonsterDef {
    MonsterDef {
        id: id.into(),
        name: id.into(),
        max_hp,
        damage,
        armor,
        speed: 0.0,
        aggro_range: 0.0,
        attack_range: 0.0,
        attack_cooldown: 1.0,
        xp: 30,
        loot_table: None,
        respawn_secs: 0.0,
        is_boss: false,
        phases: Vec::new(),
        abilities: Vec::new(),
    }
}

fn spawn(monster: &str, position: Vec3, respawn_secs: Option<f32>) -> SpawnDef {
    SpawnDef {
        monster: monster.into(),
        position,
        respawn_secs,
    }
}

fn floor(monsters: Vec<SpawnDef>) -> FloorDef {
    FloorDef {
        spawn_point: Vec3::ZERO,
        monsters,
    }
}

/// A stationary caster that raises dummies, at most two at a time.
fn necromancer() -> MonsterDef {
    let mut necro = monster("necromancer", 1000, 0, 0);
    necro.aggro_range = 20.0;
    necro.abilities = vec![AbilityDef {
        id: "raise_dead".into(),
        cooldown: 1.0,
        range: 20.0,
        damage: 0,
        effect: None,
        kind: AbilityKind::Summon {
            monster: "dummy".into(),
            count: 3,
            max_alive: 2,
            spread: 1.0,
        },
    }];
    necro
}

/// Fires one poisoned arrow every ten seconds and otherwise stands still.
fn archer() -> MonsterDef {
    let mut archer = monster("archer", 100, 0, 0);
    archer.abilities = vec![AbilityDef {
        id: "poison_arrow".into(),
        cooldown: 10.0,
        range: 15.0,
        damage: 20,
        effect: Some(poison(2)),
        kind: AbilityKind::Projectile {
            speed: 20.0,
            radius: 0.5,
            lifetime: 2.0,
        },
    }];
    archer
}

/// Single-purpose dungeons for the scenario tests.
fn arenas() -> Vec<DungeonDef> {
    let ring = (0..RING_SIZE)
        .map(|i| {
            let angle = i as f32 * std::f32::consts::TAU / RING_SIZE as f32;
            let at = Vec3::new(RING_RADIUS * angle.sin(), 0.0, RING_RADIUS * angle.cos());
            spawn("dummy", at, None)
        })
        .chain([spawn("dummy", Vec3::new(0.0, 0.0, 8.0), None)])
        .collect();

    vec![
        DungeonDef {
            id: TRAINING_YARD.into(),
            name: "Training Yard".into(),
            floors: vec![floor(ring)],
        },
        DungeonDef {
            id: SUMMONER_DEN.into(),
            name: "Summoner's Den".into(),
            floors: vec![floor(vec![spawn(
                "necromancer",
                Vec3::new(0.0, 0.0, 10.0),
                None,
            )])],
        },
        DungeonDef {
            id: ARCHERY_RANGE.into(),
            name: "Archery Range".into(),
            floors: vec![floor(vec![spawn(
                "archer",
                Vec3::new(0.0, 0.0, 10.0),
                None,
            )])],
        },
        DungeonDef {
            id: RESPAWN_PIT.into(),
            name: "Respawn Pit".into(),
            floors: vec![
                floor(vec![
                    spawn("dummy", RESPAWN_POINT, Some(3.0)),
                    spawn("dummy", Vec3::new(-5.0, 0.0, -5.0), None),
                ]),
                floor(vec![spawn("dummy", Vec3::ZERO, None)]),
            ],
        },
    ]
}

/// Two floors: two passive dummies, then a stationary boss whose middle and
/// last phases unlock a telegraphed slam. The other dungeons each stage one
/// scenario on a single floor.
pub fn pack() -> DefinitionPack {
    let mut whirlwind = skill("whirlwind", SkillEffect::Whirlwind, 15, 5.0, 4.0);
    whirlwind.required_level = 2;
    whirlwind.requires = Some(SkillRequirement {
        skill: "power_strike".into(),
        points: 1,
    });

    let mut dummy = monster("dummy", 40, 0, 5);
    dummy.loot_table = Some("bones".into());

    let mut boss = monster("bone_king", 1000, 10, 0);
    boss.is_boss = true;
    boss.aggro_range = 20.0;
    boss.attack_range = 3.0;
    boss.xp = 500;
    boss.phases = vec![
        PhaseDef {
            hp_ratio: 1.0,
            damage_mult: 1.0,
            speed_mult: 1.0,
            abilities: Vec::new(),
        },
        PhaseDef {
            hp_ratio: 0.6,
            damage_mult: 1.0,
            speed_mult: 1.0,
            abilities: vec!["slam".into()],
        },
        PhaseDef {
            hp_ratio: 0.3,
            damage_mult: 2.0,
            speed_mult: 1.0,
            abilities: vec!["slam".into()],
        },
    ];
    boss.abilities = vec![AbilityDef {
        id: "slam".into(),
        cooldown: 5.0,
        range: 20.0,
        damage: 40,
        effect: None,
        kind: AbilityKind::Telegraph {
            radius: 3.0,
            delay: 1.0,
        },
    }];

    DefinitionPack {
        classes: vec![warrior()],
        skills: vec![
            skill("power_strike", SkillEffect::PowerStrike, 10, 2.0, 3.0),
            whirlwind,
            skill("charge", SkillEffect::Charge, 10, 8.0, 4.0),
        ],
        items: vec![
            ItemDef {
                id: "health_potion".into(),
                name: "Health Potion".into(),
                max_stack: 5,
                consumable: Some(Consumable {
                    heal: 50,
                    mana: 0,
                    cooldown: 10.0,
                }),
            },
            ItemDef {
                id: "bone".into(),
                name: "Bone".into(),
                max_stack: 10,
                consumable: None,
            },
        ],
        loot_tables: vec![LootTable {
            id: "bones".into(),
            guaranteed: 1,
            max_extra: 0,
            entries: vec![LootEntry {
                item: "bone".into(),
                weight: 1,
                min_rarity: Rarity::Common,
                max_rarity: Rarity::Rare,
            }],
        }],
        monsters: vec![dummy, boss, necromancer(), archer()],
        dungeons: vec![DungeonDef {
            id: DUNGEON.into(),
            name: "Test Crypt".into(),
            floors: vec![
                FloorDef {
                    spawn_point: Vec3::ZERO,
                    monsters: vec![
                        SpawnDef {
                            monster: "dummy".into(),
                            position: Vec3::new(0.0, 0.0, 2.0),
                            respawn_secs: None,
                        },
                        SpawnDef {
                            monster: "dummy".into(),
                            position: Vec3::new(0.0, 0.0, -2.0),
                            respawn_secs: None,
                        },
                    ],
                },
                FloorDef {
                    spawn_point: Vec3::ZERO,
                    monsters: vec![SpawnDef {
                        monster: "bone_king".into(),
                        position: Vec3::new(0.0, 0.0, 10.0),
                        respawn_secs: None,
                    }],
                },
            ],
        }]
        .into_iter()
        .chain(arenas())
        .collect(),
    }
}

pub fn definitions() -> Arc<Definitions> {
    Arc::new(Definitions::from_pack(pack()).expect("fixture pack is valid"))
}

pub fn poison(damage_per_tick: i32) -> EffectDef {
    EffectDef {
        kind: StatusKind::Poison,
        damage_per_tick,
        tick_interval: 0.5,
        duration: 5.0,
    }
}

/// An instance with one warrior joined and the join events drained.
pub fn instance_with_hero(gateway: Arc<MemoryGateway>) -> DungeonInstance {
    instance_with_config(gateway, InstanceConfig::default())
}

pub fn instance_with_config(gateway: Arc<MemoryGateway>, config: InstanceConfig) -> DungeonInstance {
    instance_with_gateway(gateway, config)
}

pub fn instance_with_gateway(
    gateway: Arc<dyn PersistenceGateway>,
    config: InstanceConfig,
) -> DungeonInstance {
    hero_in(DUNGEON, gateway, config)
}

/// One warrior in `dungeon`, standing at the origin.
pub fn instance_in(dungeon: &str) -> DungeonInstance {
    let mut inst = hero_in(dungeon, Arc::new(MemoryGateway::new()), InstanceConfig::default());
    place(&mut inst, HERO, Vec3::ZERO);
    inst
}

fn hero_in(
    dungeon: &str,
    gateway: Arc<dyn PersistenceGateway>,
    config: InstanceConfig,
) -> DungeonInstance {
    let mut inst = DungeonInstance::new("test-1", dungeon, definitions(), config, gateway, 7)
        .expect("instance builds");
    inst.join(HERO, "hero", "warrior").expect("join succeeds");
    inst.drain_events();
    inst
}

/// A store that takes `delay` over every write.
#[derive(Debug, Default)]
pub struct SlowGateway {
    pub inner: MemoryGateway,
    pub delay: Duration,
}

impl SlowGateway {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryGateway::new(),
            delay,
        }
    }
}

impl PersistenceGateway for SlowGateway {
    fn load_player(&self, player: PlayerId) -> Result<PlayerRecord, PersistError> {
        self.inner.load_player(player)
    }

    fn save_stats(&self, player: PlayerId, stats: &StatsRecord) -> Result<(), PersistError> {
        thread::sleep(self.delay);
        self.inner.save_stats(player, stats)
    }

    fn save_inventory(
        &self,
        player: PlayerId,
        inventory: &InventoryRecord,
    ) -> Result<(), PersistError> {
        thread::sleep(self.delay);
        self.inner.save_inventory(player, inventory)
    }

    fn save_skills(&self, player: PlayerId, skills: &SkillRecord) -> Result<(), PersistError> {
        thread::sleep(self.delay);
        self.inner.save_skills(player, skills)
    }

    fn record_dungeon_clear(
        &self,
        player: PlayerId,
        dungeon_id: &str,
    ) -> Result<u32, PersistError> {
        thread::sleep(self.delay);
        self.inner.record_dungeon_clear(player, dungeon_id)
    }
}

pub fn place(inst: &mut DungeonInstance, player: PlayerId, position: Vec3) {
    if let Some(p) = inst.state_mut().players.get_mut(&player) {
        p.position = position;
    }
}

pub fn monster_ids(inst: &DungeonInstance) -> Vec<MonsterId> {
    inst.state().monsters.keys().copied().collect()
}

/// Kill every monster on the current floor through the damage path.
pub fn kill_all(inst: &mut DungeonInstance, player: PlayerId) {
    for id in monster_ids(inst) {
        inst.damage_monster(Some(player), id, 100_000, 0);
    }
}

/// Clear floor 0 and step onto the boss floor.
pub fn enter_boss_floor(inst: &mut DungeonInstance) -> MonsterId {
    kill_all(inst, HERO);
    inst.tick(DT);
    inst.handle_message(HERO, dg_core::world::ClientMessage::NextFloor);
    inst.drain_events();
    monster_ids(inst)[0]
}

pub fn events_for(envelopes: &[Envelope], player: PlayerId) -> Vec<&ServerEvent> {
    envelopes
        .iter()
        .filter(|e| match e.recipient {
            Recipient::All => true,
            Recipient::Player(p) => p == player,
        })
        .map(|e| &e.event)
        .collect()
}
