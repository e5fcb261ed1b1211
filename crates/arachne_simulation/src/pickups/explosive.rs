//! ExplosiveItem: таймерная ловушка
//!
//! Взводится внешним proximity sensor'ом (враг рядом), тикает пока взведена,
//! на нуле разряжается. Контакт с целью во взведённом состоянии → взрыв.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosiveConfig {
    /// Сколько секунд предмет остаётся взведённым
    pub duration: f32,
    /// Particle ключ взрыва
    pub explosion_effect: String,
}

impl Default for ExplosiveConfig {
    fn default() -> Self {
        Self {
            duration: 5.0,
            explosion_effect: "coinExplosion".into(),
        }
    }
}

/// Визуальное состояние (материал выбирает хост)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Appearance {
    Normal,
    Explosive,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct ExplosiveItem {
    pub config: ExplosiveConfig,
    armed: bool,
    /// Имеет смысл только пока `armed`
    remaining: f32,
}

impl ExplosiveItem {
    pub fn new(config: ExplosiveConfig) -> Self {
        Self {
            config,
            armed: false,
            remaining: 0.0,
        }
    }

    /// Взвести. Повторный вызов на взведённом предмете ничего не делает
    /// (таймер не перезапускается). Возвращает true если взвели сейчас.
    pub fn arm(&mut self) -> bool {
        if self.armed {
            return false;
        }
        self.armed = true;
        self.remaining = self.config.duration;
        true
    }

    /// Возвращает true если предмет разрядился в этот tick
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.armed {
            return false;
        }
        self.remaining -= delta;
        if self.remaining <= 0.0 {
            self.armed = false;
            self.remaining = 0.0;
            return true;
        }
        false
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn remaining(&self) -> Option<f32> {
        self.armed.then_some(self.remaining)
    }

    pub fn appearance(&self) -> Appearance {
        if self.armed {
            Appearance::Explosive
        } else {
            Appearance::Normal
        }
    }
}

impl Default for ExplosiveItem {
    fn default() -> Self {
        Self::new(ExplosiveConfig::default())
    }
}
