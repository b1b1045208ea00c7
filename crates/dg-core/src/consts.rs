//! Fixed gameplay constants.
//!
//! Values players are expected to tune live in
//! [`world::InstanceConfig`](crate::world::InstanceConfig); these are the
//! rules that hold for every instance.

/// Height of the walkable ground plane.
pub const GROUND_Y: f32 = 0.0;

/// Number of hotbar slots per player.
pub const HOTBAR_SLOTS: usize = 6;

/// Extra damage multiplier granted per skill point beyond the first.
pub const SKILL_RANK_BONUS: f32 = 0.10;

/// Distance the caster is displaced forward by Charge.
pub const CHARGE_DISTANCE: f32 = 6.0;

/// Stun applied to the monster hit by Charge (seconds).
pub const CHARGE_STUN_SECS: f64 = 1.5;

/// Charge deals a reduced share of its scaled damage.
pub const CHARGE_DAMAGE_FACTOR: f32 = 0.5;

/// Attack range at or above which a monster counts as ranged and kites.
pub const RANGED_ATTACK_THRESHOLD: f32 = 6.0;

/// Ranged monsters back away when the target is closer than this share of
/// their attack range.
pub const KITE_DISTANCE_RATIO: f32 = 0.4;

/// Chasing monsters stop once this share of their attack range away.
pub const CHASE_STOP_RATIO: f32 = 0.8;

/// A returning monster snaps back to its spawn point within this distance.
pub const RETURN_SNAP_DISTANCE: f32 = 0.5;

/// Experience needed to go from level 1 to level 2.
pub const XP_BASE: u32 = 100;

/// Growth factor of the experience curve per level.
pub const XP_GROWTH: f32 = 1.5;

/// Hit points granted per point of vitality.
pub const HP_PER_VITALITY: i32 = 10;

/// Mana granted per point of intelligence.
pub const MANA_PER_INTELLIGENCE: i32 = 5;

/// Vitality per point of bonus armor.
pub const VITALITY_PER_ARMOR: i32 = 5;

/// Skill points granted on each level-up.
pub const SKILL_POINTS_PER_LEVEL: u32 = 1;

/// Spread of player spawn positions around a floor's spawn point.
pub const PLAYER_SPAWN_SPREAD: f32 = 1.5;

/// Gold ranges keyed by the experience value of the slain monster.
///
/// Each entry is `(xp_below, min_gold, max_gold)`; the last entry catches
/// everything above.
pub const GOLD_TIERS: [(u32, u32, u32); 4] = [
    (20, 1, 5),
    (50, 5, 15),
    (150, 15, 40),
    (u32::MAX, 40, 100),
];
