//! Loot generation
//!
//! A kill rolls `guaranteed + rand(0..=max_extra)` drops. Each drop picks a
//! table entry by cumulative weight and then a rarity uniformly from the
//! entry's inclusive ordinal range.

use serde::{Deserialize, Serialize};

use crate::data::{LootTable, Rarity};
use crate::{GOLD_TIERS, GameRng, Vec3};

/// Unique identifier for a loot drop within an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LootId(pub u32);

/// An item lying on the floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootDrop {
    pub id: LootId,
    pub item: String,
    pub rarity: Rarity,
    pub position: Vec3,
    /// Simulation time at which the drop disappears
    pub despawn_at: f64,
}

/// One rolled drop before it is placed in the world
#[derive(Debug, Clone, PartialEq)]
pub struct LootRoll {
    pub item: String,
    pub rarity: Rarity,
    pub position: Vec3,
}

/// Roll the drops for one kill at `origin`.
///
/// Positions are scattered up to `scatter` on each axis around the origin.
pub fn roll_drops(table: &LootTable, origin: Vec3, scatter: f32, rng: &mut GameRng) -> Vec<LootRoll> {
    let total = table.total_weight();
    if total == 0 {
        return Vec::new();
    }

    let count = table.guaranteed + rng.range_inclusive(0, table.max_extra);
    let mut drops = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut roll = rng.rn2(total);
        let Some(entry) = table.entries.iter().find(|e| {
            if roll < e.weight {
                true
            } else {
                roll -= e.weight;
                false
            }
        }) else {
            continue;
        };

        let rarity = Rarity::from_ordinal(
            rng.range_inclusive(
                entry.min_rarity.ordinal() as u32,
                entry.max_rarity.ordinal() as u32,
            ) as u8,
        );
        let position = origin.offset_xz(
            rng.range_f32(-scatter, scatter),
            rng.range_f32(-scatter, scatter),
        );
        drops.push(LootRoll {
            item: entry.item.clone(),
            rarity,
            position,
        });
    }
    drops
}

/// Gold for a kill, from the tier matching the monster's experience value.
pub fn roll_gold(xp: u32, rng: &mut GameRng) -> u32 {
    let (_, lo, hi) = GOLD_TIERS
        .iter()
        .copied()
        .find(|(below, _, _)| xp < *below)
        .unwrap_or(GOLD_TIERS[GOLD_TIERS.len() - 1]);
    rng.range_inclusive(lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::LootEntry;

    fn table(entries: Vec<LootEntry>, guaranteed: u32, max_extra: u32) -> LootTable {
        LootTable {
            id: "t".into(),
            guaranteed,
            max_extra,
            entries,
        }
    }

    fn entry(item: &str, weight: u32, min: Rarity, max: Rarity) -> LootEntry {
        LootEntry {
            item: item.into(),
            weight,
            min_rarity: min,
            max_rarity: max,
        }
    }

    #[test]
    fn test_drop_count_bounds() {
        let t = table(vec![entry("a", 1, Rarity::Common, Rarity::Common)], 2, 3);
        let mut rng = GameRng::new(11);
        for _ in 0..200 {
            let n = roll_drops(&t, Vec3::ZERO, 1.0, &mut rng).len();
            assert!((2..=5).contains(&n));
        }
    }

    #[test]
    fn test_zero_weight_entry_never_drops() {
        let t = table(
            vec![
                entry("never", 0, Rarity::Common, Rarity::Common),
                entry("always", 5, Rarity::Common, Rarity::Common),
            ],
            3,
            0,
        );
        let mut rng = GameRng::new(3);
        for _ in 0..100 {
            for d in roll_drops(&t, Vec3::ZERO, 1.0, &mut rng) {
                assert_eq!(d.item, "always");
            }
        }
    }

    #[test]
    fn test_rarity_stays_in_range_and_covers_it() {
        let t = table(vec![entry("gem", 1, Rarity::Common, Rarity::Rare)], 1, 0);
        let mut rng = GameRng::new(5);
        let mut seen = [false; 5];
        for _ in 0..500 {
            for d in roll_drops(&t, Vec3::ZERO, 1.0, &mut rng) {
                assert!(d.rarity <= Rarity::Rare);
                seen[d.rarity.ordinal() as usize] = true;
            }
        }
        assert_eq!(seen, [true, true, true, false, false]);
    }

    #[test]
    fn test_drops_scatter_around_origin() {
        let t = table(vec![entry("a", 1, Rarity::Common, Rarity::Common)], 4, 0);
        let mut rng = GameRng::new(9);
        let origin = Vec3::new(10.0, 0.0, -4.0);
        for d in roll_drops(&t, origin, 1.5, &mut rng) {
            assert!((d.position.x - origin.x).abs() <= 1.5);
            assert!((d.position.z - origin.z).abs() <= 1.5);
        }
    }

    #[test]
    fn test_gold_tiers() {
        let mut rng = GameRng::new(1);
        for _ in 0..100 {
            assert!((1..=5).contains(&roll_gold(10, &mut rng)));
            assert!((5..=15).contains(&roll_gold(20, &mut rng)));
            assert!((40..=100).contains(&roll_gold(1_000, &mut rng)));
        }
    }
}
