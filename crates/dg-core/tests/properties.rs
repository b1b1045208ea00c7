//! Property tests for the combat and progression rules

mod common;

use dg_core::combat::{CombatTuning, StatusEffectEngine, TargetId, resolve_damage};
use dg_core::data::{LootEntry, LootTable, Rarity};
use dg_core::dungeon::is_floor_cleared;
use dg_core::monster::{MonsterEntity, MonsterId, MonsterRuntime};
use dg_core::object::roll_drops;
use dg_core::{GameRng, Vec3};
use proptest::prelude::*;

fn dummy_def() -> dg_core::data::MonsterDef {
    common::pack()
        .monsters
        .into_iter()
        .find(|m| m.id == "dummy")
        .expect("fixture has a dummy")
}

proptest! {
    #[test]
    fn damage_is_never_negative(
        raw in -50i32..500,
        attacker_dex in 0i32..200,
        armor in 0i32..100,
        defender_dex in proptest::option::of(0i32..200),
        seed in any::<u64>(),
    ) {
        let mut rng = GameRng::new(seed);
        let result = resolve_damage(
            &CombatTuning::default(),
            raw,
            attacker_dex,
            armor,
            defender_dex,
            &mut rng,
        );
        if result.is_dodge {
            prop_assert_eq!(result.amount, 0);
            prop_assert!(!result.is_crit);
        } else {
            prop_assert!(result.amount >= 1);
        }
    }

    #[test]
    fn monster_hp_stays_in_bounds(hits in proptest::collection::vec(-30i32..60, 1..40)) {
        let def = dummy_def();
        let mut m = MonsterEntity::new(MonsterId(1), &def, Vec3::ZERO);
        let mut kills = 0;
        for hit in hits {
            if m.apply_damage(hit) {
                kills += 1;
            }
            prop_assert!(m.hp >= 0 && m.hp <= m.max_hp);
        }
        prop_assert!(kills <= 1);
        prop_assert_eq!(kills == 1, m.hp == 0);
    }

    #[test]
    fn floor_clears_only_after_last_kill(
        order in Just((0..6usize).collect::<Vec<_>>()).prop_shuffle(),
    ) {
        let def = dummy_def();
        let mut runtimes: Vec<MonsterRuntime> = (0..6)
            .map(|_| MonsterRuntime::new(&def, Vec3::ZERO, 0.0))
            .collect();
        for (n, index) in order.iter().enumerate() {
            prop_assert!(!is_floor_cleared(runtimes.iter()));
            runtimes[*index].mark_dead();
            prop_assert_eq!(is_floor_cleared(runtimes.iter()), n == order.len() - 1);
        }
    }

    #[test]
    fn reapplying_an_effect_keeps_one_instance(
        gaps in proptest::collection::vec(0.0f32..3.0, 1..10),
    ) {
        let target = TargetId::Monster(MonsterId(1));
        let effect = common::poison(2);
        let mut engine = StatusEffectEngine::new();
        for gap in gaps {
            engine.apply(target, &effect, None);
            prop_assert_eq!(engine.count(target), 1);
            let active = engine.get(target, effect.kind).expect("just applied");
            prop_assert_eq!(active.remaining, effect.duration);
            engine.tick(gap);
        }
    }

    #[test]
    fn loot_rarity_stays_in_range(seed in any::<u64>()) {
        let table = LootTable {
            id: "t".into(),
            guaranteed: 1,
            max_extra: 3,
            entries: vec![
                LootEntry {
                    item: "a".into(),
                    weight: 3,
                    min_rarity: Rarity::Uncommon,
                    max_rarity: Rarity::Epic,
                },
                LootEntry {
                    item: "b".into(),
                    weight: 1,
                    min_rarity: Rarity::Common,
                    max_rarity: Rarity::Common,
                },
            ],
        };
        let mut rng = GameRng::new(seed);
        let drops = roll_drops(&table, Vec3::ZERO, 1.0, &mut rng);
        prop_assert!((1..=4).contains(&drops.len()));
        for drop in drops {
            match drop.item.as_str() {
                "a" => prop_assert!(drop.rarity >= Rarity::Uncommon && drop.rarity <= Rarity::Epic),
                _ => prop_assert_eq!(drop.rarity, Rarity::Common),
            }
            prop_assert!(drop.position.distance_xz(&Vec3::ZERO) <= 1.5);
        }
    }
}
