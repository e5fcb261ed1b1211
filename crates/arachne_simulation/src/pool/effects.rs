//! Pooled эффекты: частицы и звук
//!
//! Сами эффекты не симулируются (рендер и микширование: забота хоста).
//! Здесь только данные, которые нужны pool'у: позиция, длительность, "ещё играет?".

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::object_pool::{Lifetime, Poolable};

/// Запас после окончания эмиссии, чтобы последние частицы успели погаснуть
pub const PARTICLE_RETURN_MARGIN: f32 = 0.05;

/// Как часто pool спрашивает у звука "ещё играет?"
pub const AUDIO_POLL_INTERVAL: f32 = 0.1;

/// Шаблон particle эффекта (prefab)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleTemplate {
    /// Длительность эмиссии (секунды)
    pub duration: f32,
    /// Максимальный start lifetime частицы (секунды)
    pub start_lifetime_max: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEffect {
    pub template: ParticleTemplate,
    pub position: Vec3,
    pub rotation: Quat,
    pub playing: bool,
    pub elapsed: f32,
    /// Trail history: очищается при возврате в pool
    pub trail: Vec<Vec3>,
}

impl ParticleEffect {
    pub fn new(template: ParticleTemplate) -> Self {
        Self {
            template,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            playing: false,
            elapsed: 0.0,
            trail: Vec::new(),
        }
    }

    /// Полное время жизни: эмиссия + самая долгая частица + запас
    pub fn total_lifetime(&self) -> f32 {
        self.template.duration + self.template.start_lifetime_max + PARTICLE_RETURN_MARGIN
    }
}

impl Poolable for ParticleEffect {
    fn activate(&mut self, position: Vec3, rotation: Quat) {
        self.position = position;
        self.rotation = rotation;
        self.playing = true;
        self.elapsed = 0.0;
        self.trail.push(position);
    }

    fn deactivate(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
        self.trail.clear();
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Timed(self.total_lifetime())
    }

    fn advance(&mut self, delta: f32) {
        if self.playing {
            self.elapsed += delta;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Rolloff {
    #[default]
    Logarithmic,
    Linear,
}

/// 3D настройки источника звука
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// 0..1
    pub volume: f32,
    /// 0 = 2D, 1 = 3D
    pub spatial_blend: f32,
    pub rolloff: Rolloff,
    pub min_distance: f32,
    pub max_distance: f32,
    /// 0..5
    pub doppler_level: f32,
    /// 0..180 градусов
    pub spread: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            spatial_blend: 1.0,
            rolloff: Rolloff::Logarithmic,
            min_distance: 1.0,
            max_distance: 20.0,
            doppler_level: 0.5,
            spread: 0.0,
        }
    }
}

impl AudioSettings {
    /// Загнать значения в допустимые диапазоны
    pub fn clamped(self) -> Self {
        let min_distance = self.min_distance.max(0.0);
        Self {
            volume: self.volume.clamp(0.0, 1.0),
            spatial_blend: self.spatial_blend.clamp(0.0, 1.0),
            rolloff: self.rolloff,
            min_distance,
            max_distance: self.max_distance.max(min_distance),
            doppler_level: self.doppler_level.clamp(0.0, 5.0),
            spread: self.spread.clamp(0.0, 180.0),
        }
    }
}

/// Источник звука из pool'а с назначенным клипом
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEmitter {
    pub clip: String,
    /// Длина клипа (секунды)
    pub clip_length: f32,
    pub settings: AudioSettings,
    pub position: Vec3,
    pub playing: bool,
    pub elapsed: f32,
}

impl AudioEmitter {
    pub fn new(clip: impl Into<String>, clip_length: f32, settings: AudioSettings) -> Self {
        Self {
            clip: clip.into(),
            clip_length: clip_length.max(0.0),
            settings: settings.clamped(),
            position: Vec3::ZERO,
            playing: false,
            elapsed: 0.0,
        }
    }
}

impl Poolable for AudioEmitter {
    fn activate(&mut self, position: Vec3, _rotation: Quat) {
        self.position = position;
        self.playing = true;
        self.elapsed = 0.0;
    }

    fn deactivate(&mut self) {
        self.playing = false;
        self.elapsed = 0.0;
    }

    fn lifetime(&self) -> Lifetime {
        Lifetime::Polled {
            interval: AUDIO_POLL_INTERVAL,
        }
    }

    fn advance(&mut self, delta: f32) {
        if !self.playing {
            return;
        }
        self.elapsed += delta;
        if self.elapsed >= self.clip_length {
            self.playing = false;
        }
    }

    fn is_alive(&self) -> bool {
        self.playing
    }
}
