//! SimulationConfig: все tunables симуляции в одном serde дереве
//!
//! Любое поле можно опустить: `#[serde(default)]` подставит значения игры.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::EnemyConfig;
use crate::pickups::PickupsConfig;
use crate::pool::PoolsConfig;
use crate::session::{CoinConfig, LivesConfig};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Частота FixedUpdate (Hz)
    pub fixed_hz: f64,
    pub seed: u64,
    pub probed_enemy: EnemyConfig,
    #[serde(default = "EnemyConfig::routed_patroller")]
    pub routed_enemy: EnemyConfig,
    pub pools: PoolsConfig,
    pub pickups: PickupsConfig,
    pub lives: LivesConfig,
    pub coins: CoinConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fixed_hz: 60.0,
            seed: 42,
            probed_enemy: EnemyConfig::probed_patroller(),
            routed_enemy: EnemyConfig::routed_patroller(),
            pools: PoolsConfig::default(),
            pickups: PickupsConfig::default(),
            lives: LivesConfig::default(),
            coins: CoinConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Parse + validate
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fixed_hz.is_finite() && self.fixed_hz > 0.0) {
            return Err(invalid("fixed_hz", "must be a positive number"));
        }

        validate_enemy("probed_enemy", &self.probed_enemy)?;
        validate_enemy("routed_enemy", &self.routed_enemy)?;

        non_negative("pickups.pickup_radius", self.pickups.pickup_radius)?;
        non_negative("pickups.sensor_radius", self.pickups.sensor_radius)?;
        non_negative("pickups.explosive.duration", self.pickups.explosive.duration)?;
        non_negative("lives.respawn_delay", self.lives.respawn_delay)?;

        if self.lives.starting_lives == 0 {
            return Err(invalid("lives.starting_lives", "must be at least 1"));
        }

        for sound in &self.pools.sounds {
            if let Some(length) = sound.clip_length {
                non_negative(&format!("pools.sounds[{}].clip_length", sound.key), length)?;
            }
        }

        Ok(())
    }
}

fn validate_enemy(prefix: &str, enemy: &EnemyConfig) -> Result<(), ConfigError> {
    let fields = [
        ("detection_range", enemy.detection_range),
        ("stop_chase_distance", enemy.stop_chase_distance),
        ("patrol_speed", enemy.patrol_speed),
        ("chase_speed", enemy.chase_speed),
        ("arrival_threshold", enemy.arrival_threshold),
        ("dwell_time", enemy.dwell_time),
        ("return_to_patrol_delay", enemy.return_to_patrol_delay),
        ("retarget_interval", enemy.retarget_interval),
        ("death_duration", enemy.death_duration),
        ("freeze_duration", enemy.freeze_duration),
        ("stomp.height_margin", enemy.stomp.height_margin),
        ("stomp.falling_threshold", enemy.stomp.falling_threshold),
    ];

    for (name, value) in fields {
        non_negative(&format!("{}.{}", prefix, name), value)?;
    }
    Ok(())
}

fn non_negative(field: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, "must be a finite non-negative number"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{LocomotionMode, PostKillPolicy};

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = SimulationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.routed_enemy.post_kill, PostKillPolicy::FreezeThenReset);
        assert_eq!(config.probed_enemy.post_kill, PostKillPolicy::ResumePatrol);
    }

    #[test]
    fn test_partial_override() {
        let json = r#"{
            "seed": 7,
            "probed_enemy": { "chase_speed": 6.0 },
            "pickups": { "explosive": { "duration": 3.0 } }
        }"#;
        let config = SimulationConfig::from_json_str(json).unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(config.probed_enemy.chase_speed, 6.0);
        assert_eq!(config.probed_enemy.detection_range, 8.0);
        assert_eq!(config.routed_enemy.locomotion, LocomotionMode::Routed);
        assert_eq!(config.pickups.explosive.duration, 3.0);
        assert_eq!(config.pickups.explosive.explosion_effect, "coinExplosion");
    }

    #[test]
    fn test_rejects_negative_range() {
        let json = r#"{ "probed_enemy": { "detection_range": -1.0 } }"#;
        let err = SimulationConfig::from_json_str(json).unwrap_err();

        match err {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "probed_enemy.detection_range"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        let err = SimulationConfig::from_json_str(r#"{ "fixed_hz": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "fixed_hz"));
    }

    #[test]
    fn test_parse_error() {
        let err = SimulationConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_json_roundtrip_keeps_presets() {
        let config = SimulationConfig::default();
        let json = config.to_json_string().unwrap();
        let parsed = SimulationConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
