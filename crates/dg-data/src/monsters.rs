//! Monster roster, including the crypt boss
//!
//! Regular monsters are built from a plain stat line and then given
//! abilities. The boss carries a phase table: each phase unlocks abilities
//! and scales damage and speed.

use dg_core::combat::StatusKind;
use dg_core::data::{AbilityDef, AbilityKind, EffectDef, MonsterDef, PhaseDef};

struct Stats {
    hp: i32,
    damage: i32,
    armor: i32,
    speed: f32,
    aggro: f32,
    range: f32,
    cooldown: f32,
    xp: u32,
}

fn monster(id: &str, name: &str, s: Stats, loot: &str, respawn_secs: f32) -> MonsterDef {
    MonsterDef {
        id: id.to_string(),
        name: name.to_string(),
        max_hp: s.hp,
        damage: s.damage,
        armor: s.armor,
        speed: s.speed,
        aggro_range: s.aggro,
        attack_range: s.range,
        attack_cooldown: s.cooldown,
        xp: s.xp,
        loot_table: Some(loot.to_string()),
        respawn_secs,
        is_boss: false,
        phases: Vec::new(),
        abilities: Vec::new(),
    }
}

fn dot(kind: StatusKind, damage_per_tick: i32, duration: f32) -> EffectDef {
    EffectDef {
        kind,
        damage_per_tick,
        tick_interval: 1.0,
        duration,
    }
}

fn phase(hp_ratio: f32, damage_mult: f32, speed_mult: f32, abilities: &[&str]) -> PhaseDef {
    PhaseDef {
        hp_ratio,
        damage_mult,
        speed_mult,
        abilities: abilities.iter().map(|a| a.to_string()).collect(),
    }
}

pub fn monsters() -> Vec<MonsterDef> {
    let skeleton = monster(
        "skeleton",
        "Skeleton",
        Stats {
            hp: 40,
            damage: 8,
            armor: 2,
            speed: 3.0,
            aggro: 10.0,
            range: 2.0,
            cooldown: 1.2,
            xp: 15,
        },
        "trash",
        20.0,
    );

    let mut zombie = monster(
        "zombie",
        "Rotting Zombie",
        Stats {
            hp: 70,
            damage: 10,
            armor: 3,
            speed: 2.0,
            aggro: 8.0,
            range: 2.0,
            cooldown: 1.6,
            xp: 25,
        },
        "trash",
        25.0,
    );
    zombie.abilities.push(AbilityDef {
        id: "festering_bite".to_string(),
        cooldown: 7.0,
        range: 2.0,
        damage: 6,
        effect: Some(dot(StatusKind::Poison, 3, 5.0)),
        kind: AbilityKind::Strike,
    });

    let mut archer = monster(
        "skeleton_archer",
        "Skeleton Archer",
        Stats {
            hp: 30,
            damage: 6,
            armor: 1,
            speed: 3.0,
            aggro: 14.0,
            range: 10.0,
            cooldown: 2.0,
            xp: 20,
        },
        "trash",
        20.0,
    );
    archer.abilities.push(AbilityDef {
        id: "bone_arrow".to_string(),
        cooldown: 2.5,
        range: 12.0,
        damage: 9,
        effect: Some(dot(StatusKind::Bleed, 2, 4.0)),
        kind: AbilityKind::Projectile {
            speed: 14.0,
            radius: 0.5,
            lifetime: 1.5,
        },
    });

    let mut cultist = monster(
        "cultist",
        "Ashen Cultist",
        Stats {
            hp: 55,
            damage: 7,
            armor: 1,
            speed: 2.5,
            aggro: 12.0,
            range: 2.5,
            cooldown: 1.5,
            xp: 35,
        },
        "elite",
        30.0,
    );
    cultist.abilities.push(AbilityDef {
        id: "ember_nova".to_string(),
        cooldown: 9.0,
        range: 4.0,
        damage: 12,
        effect: Some(dot(StatusKind::Burn, 4, 3.0)),
        kind: AbilityKind::Nova { radius: 4.0 },
    });

    let mut bone_lord = monster(
        "bone_lord",
        "The Bone Lord",
        Stats {
            hp: 900,
            damage: 18,
            armor: 6,
            speed: 2.2,
            aggro: 18.0,
            range: 3.0,
            cooldown: 1.8,
            xp: 400,
        },
        "boss",
        0.0,
    );
    bone_lord.is_boss = true;
    bone_lord.phases = vec![
        phase(1.0, 1.0, 1.0, &["grave_slam"]),
        phase(0.6, 1.25, 1.1, &["grave_slam", "grasping_bones"]),
        phase(0.3, 1.5, 1.3, &["grave_slam", "grasping_bones", "raise_dead"]),
    ];
    bone_lord.abilities = vec![
        AbilityDef {
            id: "grave_slam".to_string(),
            cooldown: 8.0,
            range: 14.0,
            damage: 45,
            effect: None,
            kind: AbilityKind::Telegraph {
                radius: 3.5,
                delay: 1.5,
            },
        },
        AbilityDef {
            id: "grasping_bones".to_string(),
            cooldown: 12.0,
            range: 10.0,
            damage: 0,
            effect: Some(EffectDef {
                kind: StatusKind::Root,
                damage_per_tick: 0,
                tick_interval: 0.0,
                duration: 2.0,
            }),
            kind: AbilityKind::Root,
        },
        AbilityDef {
            id: "raise_dead".to_string(),
            cooldown: 15.0,
            range: 18.0,
            damage: 0,
            effect: None,
            kind: AbilityKind::Summon {
                monster: "skeleton".to_string(),
                count: 2,
                max_alive: 4,
                spread: 3.0,
            },
        },
    ];

    vec![skeleton, zombie, archer, cultist, bone_lord]
}
