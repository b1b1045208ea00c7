//! Combat math, status effects and projectiles
//!
//! [`resolve_damage`] is the single mitigation path used by basic attacks,
//! skills, monster attacks, projectiles and telegraphed abilities. It is pure
//! apart from the rolls it draws.

mod effects;
mod projectile;

pub use effects::{ActiveStatusEffect, DotTick, StatusEffectEngine, StatusKind};
pub use projectile::{Projectile, ProjectileId, ProjectileOutcome, ProjectileSimulator};

use serde::{Deserialize, Serialize};

use crate::RollSource;
use crate::monster::MonsterId;
use crate::player::PlayerId;

/// Anything that can take damage or carry a status effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetId {
    Player(PlayerId),
    Monster(MonsterId),
}

/// Crit and dodge tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    pub base_crit: f32,
    pub crit_per_dex: f32,
    pub max_crit: f32,
    pub crit_multiplier: f32,
    pub base_dodge: f32,
    pub dodge_per_dex: f32,
    pub max_dodge: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            base_crit: 0.0,
            crit_per_dex: 0.005,
            max_crit: 0.5,
            crit_multiplier: 1.5,
            base_dodge: 0.0,
            dodge_per_dex: 0.003,
            max_dodge: 0.3,
        }
    }
}

impl CombatTuning {
    pub fn crit_chance(&self, attacker_dex: i32) -> f32 {
        (self.base_crit + attacker_dex.max(0) as f32 * self.crit_per_dex).min(self.max_crit)
    }

    pub fn dodge_chance(&self, defender_dex: i32) -> f32 {
        (self.base_dodge + defender_dex.max(0) as f32 * self.dodge_per_dex).min(self.max_dodge)
    }
}

/// Outcome of one damage resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    pub amount: i32,
    pub is_crit: bool,
    pub is_dodge: bool,
}

impl DamageResult {
    pub const DODGED: DamageResult = DamageResult {
        amount: 0,
        is_crit: false,
        is_dodge: true,
    };
}

/// Resolve raw damage into final damage.
///
/// Order matters: the dodge roll (only when the defender has dexterity) comes
/// first and a dodge ends resolution with zero damage and no crit. Otherwise
/// the crit roll may multiply and floor the damage, then armor is subtracted
/// flat with a floor of 1. A chance of zero consumes no roll.
pub fn resolve_damage<R: RollSource>(
    tuning: &CombatTuning,
    raw: i32,
    attacker_dex: i32,
    defender_armor: i32,
    defender_dex: Option<i32>,
    rolls: &mut R,
) -> DamageResult {
    if let Some(dex) = defender_dex {
        let dodge = tuning.dodge_chance(dex);
        if dodge > 0.0 && rolls.roll() < dodge {
            return DamageResult::DODGED;
        }
    }

    let mut damage = raw.max(0);
    let crit = tuning.crit_chance(attacker_dex);
    let is_crit = crit > 0.0 && rolls.roll() < crit;
    if is_crit {
        damage = (damage as f32 * tuning.crit_multiplier).floor() as i32;
    }

    DamageResult {
        amount: (damage - defender_armor.max(0)).max(1),
        is_crit,
        is_dodge: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Replays a fixed sequence of rolls, repeating the last one.
    struct Rolls(Vec<f32>, usize);

    impl Rolls {
        fn new(rolls: &[f32]) -> Self {
            Self(rolls.to_vec(), 0)
        }
    }

    impl RollSource for Rolls {
        fn roll(&mut self) -> f32 {
            let v = self.0[self.1.min(self.0.len() - 1)];
            self.1 += 1;
            v
        }
    }

    #[test]
    fn test_zero_dex_against_armor_is_exact() {
        let t = CombatTuning::default();
        let mut rolls = Rolls::new(&[0.0]);
        let r = resolve_damage(&t, 20, 0, 5, None, &mut rolls);
        assert_eq!(
            r,
            DamageResult {
                amount: 15,
                is_crit: false,
                is_dodge: false
            }
        );
        assert_eq!(rolls.1, 0, "no rolls should be drawn at zero chances");
    }

    #[test]
    fn test_dodge_negates_crit() {
        let t = CombatTuning::default();
        // First roll dodges; a crit would also have succeeded on 0.0.
        let mut rolls = Rolls::new(&[0.0, 0.0]);
        let r = resolve_damage(&t, 50, 100, 0, Some(100), &mut rolls);
        assert!(r.is_dodge);
        assert!(!r.is_crit);
        assert_eq!(r.amount, 0);
        assert_eq!(rolls.1, 1);
    }

    #[test]
    fn test_crit_multiplies_and_floors_before_armor() {
        let t = CombatTuning::default();
        let mut rolls = Rolls::new(&[0.0]);
        // 15 * 1.5 = 22.5 -> 22, minus 2 armor.
        let r = resolve_damage(&t, 15, 40, 2, None, &mut rolls);
        assert!(r.is_crit);
        assert_eq!(r.amount, 20);
    }

    #[test]
    fn test_armor_never_reduces_below_one() {
        let t = CombatTuning::default();
        let mut rolls = Rolls::new(&[0.99]);
        let r = resolve_damage(&t, 3, 0, 50, None, &mut rolls);
        assert_eq!(r.amount, 1);
    }

    #[test]
    fn test_failed_dodge_still_allows_crit() {
        let t = CombatTuning::default();
        let mut rolls = Rolls::new(&[0.99, 0.0]);
        let r = resolve_damage(&t, 10, 20, 0, Some(20), &mut rolls);
        assert!(!r.is_dodge);
        assert!(r.is_crit);
        assert_eq!(r.amount, 15);
    }

    #[test]
    fn test_chances_are_capped() {
        let t = CombatTuning::default();
        assert_eq!(t.crit_chance(10_000), t.max_crit);
        assert_eq!(t.dodge_chance(10_000), t.max_dodge);
        assert_eq!(t.crit_chance(-5), 0.0);
    }
}
