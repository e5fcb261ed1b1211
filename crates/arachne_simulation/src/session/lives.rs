//! Lives ledger: получатель death notification'ов.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivesConfig {
    pub starting_lives: u32,
    /// Пауза между смертью цели и респавном (секунды)
    pub respawn_delay: f32,
}

impl Default for LivesConfig {
    fn default() -> Self {
        Self {
            starting_lives: 3,
            respawn_delay: 2.0,
        }
    }
}

/// Итог потери жизни
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeLoss {
    /// Жизни остались: цель респавнится
    Respawn,
    GameOver,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct Lives {
    current: u32,
    starting: u32,
    pub respawn_delay: f32,
}

impl Lives {
    pub fn new(starting: u32) -> Self {
        Self::from_config(&LivesConfig {
            starting_lives: starting,
            ..Default::default()
        })
    }

    pub fn from_config(config: &LivesConfig) -> Self {
        Self {
            current: config.starting_lives,
            starting: config.starting_lives,
            respawn_delay: config.respawn_delay,
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn lose(&mut self, amount: u32) -> LifeLoss {
        self.current = self.current.saturating_sub(amount);
        if self.current > 0 {
            LifeLoss::Respawn
        } else {
            LifeLoss::GameOver
        }
    }

    pub fn gain(&mut self, amount: u32) {
        self.current = self.current.saturating_add(amount);
    }

    pub fn reset(&mut self) {
        self.current = self.starting;
    }
}

impl Default for Lives {
    fn default() -> Self {
        Self::from_config(&LivesConfig::default())
    }
}

/// Цель ждёт респавна
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Respawning {
    pub remaining: f32,
}
