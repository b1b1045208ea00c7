//! Instance configuration
//!
//! Every gameplay tunable an operator may want to change without a rebuild.
//! Loaded from JSON; missing fields take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::combat::CombatTuning;

/// Tunables for one dungeon instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Simulation ticks per second
    pub tick_rate_hz: u32,
    /// Player movement speed (units per second)
    pub move_speed: f32,
    /// Largest accepted input `dt` (seconds)
    pub max_input_dt: f32,

    pub basic_attack_range: f32,
    /// Basic attack raw damage before strength
    pub basic_attack_base: i32,
    pub basic_attack_cooldown: f64,

    pub pickup_range: f32,
    /// Seconds a drop stays on the floor
    pub loot_despawn_secs: f64,
    /// Maximum offset of a drop from the kill position on each axis
    pub loot_scatter: f32,
    pub inventory_slots: usize,

    pub player_respawn_secs: f64,
    pub mana_regen_per_sec: f32,

    /// Flushes a failing save is retried for before it is dropped
    pub persist_max_attempts: u32,
    /// Operations handed to the save writer per batch
    pub persist_flush_budget: usize,
    /// Longest `shutdown` waits on the save writer (seconds)
    pub persist_shutdown_secs: f64,

    pub combat: CombatTuning,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            move_speed: 6.0,
            max_input_dt: 0.2,
            basic_attack_range: 2.5,
            basic_attack_base: 8,
            basic_attack_cooldown: 0.6,
            pickup_range: 2.0,
            loot_despawn_secs: 60.0,
            loot_scatter: 1.0,
            inventory_slots: 20,
            player_respawn_secs: 5.0,
            mana_regen_per_sec: 2.0,
            persist_max_attempts: 3,
            persist_flush_budget: 16,
            persist_shutdown_secs: 5.0,
            combat: CombatTuning::default(),
        }
    }
}

impl InstanceConfig {
    /// Load a configuration file, filling unspecified fields with defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate a JSON configuration.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: InstanceConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate_hz == 0 {
            return Err(ConfigError::Invalid("tick_rate_hz must be positive".into()));
        }
        if self.max_input_dt.is_nan() || self.max_input_dt <= 0.0 {
            return Err(ConfigError::Invalid("max_input_dt must be positive".into()));
        }
        if self.persist_max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "persist_max_attempts must be at least 1".into(),
            ));
        }
        if self.persist_flush_budget == 0 {
            return Err(ConfigError::Invalid(
                "persist_flush_budget must be at least 1".into(),
            ));
        }
        if !(self.persist_shutdown_secs >= 0.0) || !self.persist_shutdown_secs.is_finite() {
            return Err(ConfigError::Invalid(
                "persist_shutdown_secs must be a finite, non-negative number".into(),
            ));
        }
        Ok(())
    }

    /// Fixed tick period in seconds.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate_hz.max(1) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = InstanceConfig::parse(r#"{ "tick_rate_hz": 30, "combat": { "max_crit": 0.25 } }"#)
            .unwrap();
        assert_eq!(config.tick_rate_hz, 30);
        assert_eq!(config.combat.max_crit, 0.25);
        assert_eq!(config.combat.crit_multiplier, 1.5);
        assert_eq!(config.inventory_slots, 20);
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        assert!(matches!(
            InstanceConfig::parse(r#"{ "tick_rate_hz": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_negative_shutdown_wait() {
        assert!(matches!(
            InstanceConfig::parse(r#"{ "persist_shutdown_secs": -1.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_tick_dt() {
        let config = InstanceConfig::default();
        assert!((config.tick_dt() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = InstanceConfig::load_from_file(Path::new("/nonexistent/dg-config.json"));
        assert!(matches!(err, Err(ConfigError::Io(_))));
    }
}
