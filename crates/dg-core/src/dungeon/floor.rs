//! Floor progression state
//!
//! `spawn -> fight -> cleared -> advance | complete`. The orchestration of
//! each step lives on the instance; this is the replicated record and the
//! clear rule.

use serde::{Deserialize, Serialize};

use crate::monster::MonsterRuntime;

/// Replicated floor metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorState {
    pub dungeon_id: String,
    pub floor_index: usize,
    pub floor_count: usize,
    pub floor_cleared: bool,
    pub dungeon_complete: bool,
}

impl FloorState {
    pub fn new(dungeon_id: &str, floor_count: usize) -> Self {
        Self {
            dungeon_id: dungeon_id.to_string(),
            floor_index: 0,
            floor_count,
            floor_cleared: false,
            dungeon_complete: false,
        }
    }

    pub fn is_boss_floor(&self) -> bool {
        self.floor_count > 0 && self.floor_index + 1 == self.floor_count
    }

    /// Whether `next_floor` would do anything right now.
    pub fn can_advance(&self) -> bool {
        self.floor_cleared && !self.dungeon_complete && !self.is_boss_floor()
    }
}

/// A floor is cleared when every monster on it is dead and none of them is
/// waiting to respawn. Call [`cancel_respawns_if_wiped`] first so that a
/// floor with respawning monsters can clear at all.
pub fn is_floor_cleared<'a>(runtimes: impl IntoIterator<Item = &'a MonsterRuntime>) -> bool {
    runtimes
        .into_iter()
        .all(|rt| rt.dead && !rt.has_pending_respawn())
}

/// If every monster is dead at the same moment, call off their pending
/// respawns and return how many were cancelled. A floor with a living
/// monster is left untouched and yields `None`.
pub fn cancel_respawns_if_wiped<'a>(
    runtimes: impl IntoIterator<Item = &'a mut MonsterRuntime>,
) -> Option<usize> {
    let runtimes: Vec<&mut MonsterRuntime> = runtimes.into_iter().collect();
    if !runtimes.iter().all(|rt| rt.dead) {
        return None;
    }
    let cancelled = runtimes
        .into_iter()
        .map(MonsterRuntime::cancel_respawn)
        .filter(|c| *c)
        .count();
    Some(cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Vec3;
    use crate::data::MonsterDef;

    fn def() -> MonsterDef {
        MonsterDef {
            id: "bat".into(),
            name: "Bat".into(),
            max_hp: 5,
            damage: 1,
            armor: 0,
            speed: 5.0,
            aggro_range: 8.0,
            attack_range: 1.0,
            attack_cooldown: 1.0,
            xp: 2,
            loot_table: None,
            respawn_secs: 0.0,
            is_boss: false,
            phases: Vec::new(),
            abilities: Vec::new(),
        }
    }

    #[test]
    fn test_cleared_only_when_all_dead() {
        let d = def();
        let mut a = MonsterRuntime::new(&d, Vec3::ZERO, 0.0);
        let mut b = MonsterRuntime::new(&d, Vec3::ZERO, 0.0);
        assert!(!is_floor_cleared([&a, &b]));
        b.mark_dead();
        assert!(!is_floor_cleared([&a, &b]));
        a.mark_dead();
        assert!(is_floor_cleared([&a, &b]));
    }

    #[test]
    fn test_respawning_monster_blocks_clear() {
        let d = def();
        let mut a = MonsterRuntime::new(&d, Vec3::ZERO, 10.0);
        a.mark_dead();
        assert!(!is_floor_cleared([&a]));
    }

    #[test]
    fn test_wipe_cancels_pending_respawns() {
        let d = def();
        let mut a = MonsterRuntime::new(&d, Vec3::ZERO, 10.0);
        let mut b = MonsterRuntime::new(&d, Vec3::ZERO, 0.0);
        a.mark_dead();
        assert_eq!(cancel_respawns_if_wiped([&mut a, &mut b]), None);
        assert!(a.has_pending_respawn());

        b.mark_dead();
        assert_eq!(cancel_respawns_if_wiped([&mut a, &mut b]), Some(1));
        assert!(is_floor_cleared([&a, &b]));
    }

    #[test]
    fn test_can_advance() {
        let mut f = FloorState::new("crypt", 3);
        assert!(!f.can_advance());
        f.floor_cleared = true;
        assert!(f.can_advance());
        f.floor_index = 2;
        assert!(!f.can_advance());
    }
}
