//! Dungeon layouts

use dg_core::Vec3;
use dg_core::data::{DungeonDef, FloorDef, SpawnDef};

fn spawn(monster: &str, x: f32, z: f32) -> SpawnDef {
    SpawnDef {
        monster: monster.to_string(),
        position: Vec3::new(x, 0.0, z),
        // The crypt is a single pass; its monsters stay down once killed.
        respawn_secs: Some(0.0),
    }
}

pub fn dungeons() -> Vec<DungeonDef> {
    vec![DungeonDef {
        id: "forgotten_crypt".to_string(),
        name: "The Forgotten Crypt".to_string(),
        floors: vec![
            FloorDef {
                spawn_point: Vec3::ZERO,
                monsters: vec![
                    spawn("skeleton", 6.0, 6.0),
                    spawn("skeleton", -6.0, 6.0),
                    spawn("zombie", 0.0, 10.0),
                    spawn("skeleton_archer", 4.0, 14.0),
                ],
            },
            FloorDef {
                spawn_point: Vec3::ZERO,
                monsters: vec![
                    spawn("zombie", 5.0, 8.0),
                    spawn("zombie", -5.0, 8.0),
                    spawn("cultist", 0.0, 12.0),
                    spawn("skeleton_archer", 8.0, 14.0),
                    spawn("skeleton_archer", -8.0, 14.0),
                ],
            },
            FloorDef {
                spawn_point: Vec3::ZERO,
                monsters: vec![spawn("bone_lord", 0.0, 12.0)],
            },
        ],
    }]
}
