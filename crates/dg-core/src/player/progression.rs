//! Experience, leveling and derived stats

use crate::data::ClassDef;
use crate::{
    HP_PER_VITALITY, MANA_PER_INTELLIGENCE, SKILL_POINTS_PER_LEVEL, VITALITY_PER_ARMOR, XP_BASE,
    XP_GROWTH,
};

use super::Stats;

/// Experience required to advance from `level` to the next one.
pub fn xp_to_next(level: u32) -> u32 {
    let exp = level.saturating_sub(1) as i32;
    (XP_BASE as f32 * XP_GROWTH.powi(exp)).round() as u32
}

/// Recompute max hp, max mana and armor from core stats and level.
///
/// Current hp and mana are clamped to the new maxima.
pub fn derive_stats(stats: &mut Stats, class: &ClassDef) {
    let levels = stats.level.saturating_sub(1) as i32;
    stats.max_hp =
        (class.base_hp + stats.vitality * HP_PER_VITALITY + levels * class.hp_per_level).max(1);
    stats.max_mana =
        (class.base_mana + stats.intelligence * MANA_PER_INTELLIGENCE + levels * class.mana_per_level)
            .max(0);
    stats.armor = class.base_armor + stats.vitality.max(0) / VITALITY_PER_ARMOR;
    stats.hp = stats.hp.clamp(0, stats.max_hp);
    stats.mana = stats.mana.clamp(0, stats.max_mana);
}

/// Level 1 stats for a new character of `class`, at full hp and mana.
pub fn fresh_stats(class: &ClassDef) -> Stats {
    let mut stats = Stats {
        level: 1,
        xp: 0,
        xp_to_next: xp_to_next(1),
        strength: class.strength,
        dexterity: class.dexterity,
        intelligence: class.intelligence,
        vitality: class.vitality,
        ..Default::default()
    };
    derive_stats(&mut stats, class);
    stats.hp = stats.max_hp;
    stats.mana = stats.max_mana;
    stats
}

/// Add experience, applying every level-up it pays for.
///
/// Each level applies the class growth, grants skill points and refills hp
/// and mana. Returns the number of levels gained.
pub fn grant_xp(stats: &mut Stats, class: &ClassDef, amount: u32) -> u32 {
    stats.xp = stats.xp.saturating_add(amount);
    let mut gained = 0;
    while stats.xp_to_next > 0 && stats.xp >= stats.xp_to_next {
        stats.xp -= stats.xp_to_next;
        stats.level += 1;
        stats.xp_to_next = xp_to_next(stats.level);
        stats.strength += class.growth.strength;
        stats.dexterity += class.growth.dexterity;
        stats.intelligence += class.growth.intelligence;
        stats.vitality += class.growth.vitality;
        stats.skill_points += SKILL_POINTS_PER_LEVEL;
        derive_stats(stats, class);
        stats.hp = stats.max_hp;
        stats.mana = stats.max_mana;
        gained += 1;
    }
    gained
}
