//! Boss phases and ability eligibility
//!
//! Phases come from the monster definition. A boss only ever moves forward
//! through its phase list; healing never returns it to an earlier phase.

use crate::data::{AbilityDef, AbilityKind, MonsterDef, PhaseDef};

/// Phase index for an hp ratio.
///
/// Thresholds are scanned from the highest down and the last one whose bound
/// the ratio satisfies wins, so a ratio that has fallen through several
/// thresholds lands directly on the deepest one.
pub fn phase_for_ratio(phases: &[PhaseDef], ratio: f32) -> usize {
    let mut phase = 0;
    for (index, def) in phases.iter().enumerate() {
        if ratio <= def.hp_ratio {
            phase = index;
        }
    }
    phase
}

/// Move `current` forward to the phase the ratio calls for.
///
/// Returns the new phase only when it advanced.
pub fn advance_phase(def: &MonsterDef, current: usize, ratio: f32) -> Option<usize> {
    if !def.is_boss || def.phases.is_empty() {
        return None;
    }
    let target = phase_for_ratio(&def.phases, ratio);
    (target > current).then_some(target)
}

/// Damage and speed multipliers for a phase (1.0 when there is none).
pub fn phase_multipliers(def: &MonsterDef, phase: usize) -> (f32, f32) {
    def.phases
        .get(phase)
        .map_or((1.0, 1.0), |p| (p.damage_mult, p.speed_mult))
}

/// Whether the definition allows this ability in the given phase.
///
/// Bosses with a phase table may only use abilities listed by the current
/// phase; every other monster may use all of its abilities.
pub fn ability_allowed(def: &MonsterDef, phase: usize, ability: &AbilityDef) -> bool {
    if !def.is_boss || def.phases.is_empty() {
        return true;
    }
    def.phases
        .get(phase)
        .is_some_and(|p| p.abilities.iter().any(|id| *id == ability.id))
}

/// Whether an ability could fire now, given the distance to the nearest
/// player and how many of this monster's summons are alive.
pub fn ability_ready(
    ability: &AbilityDef,
    timer: f32,
    nearest_dist: Option<f32>,
    alive_summons: u32,
) -> bool {
    if timer > 0.0 {
        return false;
    }
    let in_range = nearest_dist.is_some_and(|d| d <= ability.range);
    match &ability.kind {
        AbilityKind::Summon { max_alive, .. } => in_range && alive_summons < *max_alive,
        _ => in_range,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(ratio: f32, abilities: &[&str]) -> PhaseDef {
        PhaseDef {
            hp_ratio: ratio,
            damage_mult: 1.0 + (1.0 - ratio),
            speed_mult: 1.0,
            abilities: abilities.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn boss() -> MonsterDef {
        MonsterDef {
            id: "lord".into(),
            name: "Lord".into(),
            max_hp: 1000,
            damage: 20,
            armor: 5,
            speed: 2.5,
            aggro_range: 15.0,
            attack_range: 2.5,
            attack_cooldown: 1.5,
            xp: 500,
            loot_table: None,
            respawn_secs: 0.0,
            is_boss: true,
            phases: vec![
                phase(1.0, &["slam"]),
                phase(0.6, &["slam", "snare"]),
                phase(0.3, &["slam", "snare", "raise"]),
            ],
            abilities: vec![AbilityDef {
                id: "snare".into(),
                cooldown: 5.0,
                range: 10.0,
                damage: 0,
                effect: None,
                kind: AbilityKind::Root,
            }],
        }
    }

    #[test]
    fn test_phase_for_ratio() {
        let b = boss();
        assert_eq!(phase_for_ratio(&b.phases, 1.0), 0);
        assert_eq!(phase_for_ratio(&b.phases, 0.61), 0);
        assert_eq!(phase_for_ratio(&b.phases, 0.6), 1);
        assert_eq!(phase_for_ratio(&b.phases, 0.45), 1);
        assert_eq!(phase_for_ratio(&b.phases, 0.1), 2);
    }

    #[test]
    fn test_jump_skips_intermediate_phase() {
        let b = boss();
        assert_eq!(advance_phase(&b, 0, 0.2), Some(2));
    }

    #[test]
    fn test_phase_is_monotonic() {
        let b = boss();
        assert_eq!(advance_phase(&b, 2, 1.0), None);
        assert_eq!(advance_phase(&b, 1, 0.5), None);
    }

    #[test]
    fn test_phase_gates_abilities() {
        let b = boss();
        let snare = &b.abilities[0];
        assert!(!ability_allowed(&b, 0, snare));
        assert!(ability_allowed(&b, 1, snare));
    }

    #[test]
    fn test_summon_respects_max_alive() {
        let raise = AbilityDef {
            id: "raise".into(),
            cooldown: 10.0,
            range: 12.0,
            damage: 0,
            effect: None,
            kind: AbilityKind::Summon {
                monster: "skeleton".into(),
                count: 2,
                max_alive: 4,
                spread: 2.0,
            },
        };
        assert!(ability_ready(&raise, 0.0, Some(5.0), 3));
        assert!(!ability_ready(&raise, 0.0, Some(5.0), 4));
        assert!(!ability_ready(&raise, 0.0, None, 0));
        assert!(!ability_ready(&raise, 1.0, Some(5.0), 0));
    }
}
