//! Effect pools (частицы + звук)
//!
//! - `ObjectPool<T>`: generic pool с handle'ами и защитой от двойного release
//! - `PoolRegistry<T>`: несколько pool'ов под строковыми ключами + авто-возврат
//! - `EffectPools` resource: registry частиц и registry звуков, собранные из `PoolsConfig`
//!
//! Спавнеры не трогают pool напрямую: пишут `PlayEffect` / `PlaySound` события.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::SimulationSet;

pub mod effects;
pub mod object_pool;
pub mod registry;
pub mod systems;

#[cfg(test)]
mod object_pool_tests;

pub use effects::{AudioEmitter, AudioSettings, ParticleEffect, ParticleTemplate, Rolloff};
pub use object_pool::{Lifetime, ObjectPool, PoolError, PoolHandle, Poolable};
pub use registry::{EffectHandle, PoolEntry, PoolRegistry};

/// Запрос: проиграть particle эффект из pool'а
#[derive(Event, Debug, Clone)]
pub struct PlayEffect {
    pub key: String,
    pub position: Vec3,
    pub rotation: Quat,
}

impl PlayEffect {
    pub fn at(key: impl Into<String>, position: Vec3) -> Self {
        Self {
            key: key.into(),
            position,
            rotation: Quat::IDENTITY,
        }
    }
}

/// Запрос: проиграть звук из pool'а
#[derive(Event, Debug, Clone)]
pub struct PlaySound {
    pub key: String,
    pub position: Vec3,
}

/// Scene teardown: вернуть все экземпляры во всех pool'ах
#[derive(Event, Debug, Clone, Default)]
pub struct ClearEffectPools;

/// Particle запись конфига. С `template: None` запись битая и будет пропущена.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEntryConfig {
    pub key: String,
    pub template: Option<ParticleTemplate>,
    #[serde(default = "default_particle_pool_size")]
    pub pool_size: usize,
}

/// Sound запись конфига
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundEntryConfig {
    pub key: String,
    /// Длина клипа (секунды); `None`: клип не назначен
    pub clip_length: Option<f32>,
    #[serde(default)]
    pub settings: AudioSettings,
    #[serde(default = "default_sound_pool_size")]
    pub pool_size: usize,
}

fn default_particle_pool_size() -> usize {
    5
}

fn default_sound_pool_size() -> usize {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolsConfig {
    /// Расширять pool при исчерпании (иначе запрос отбрасывается)
    pub expandable: bool,
    pub particles: Vec<ParticleEntryConfig>,
    pub sounds: Vec<SoundEntryConfig>,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            expandable: true,
            particles: vec![
                ParticleEntryConfig {
                    key: "coin".into(),
                    template: Some(ParticleTemplate {
                        duration: 0.5,
                        start_lifetime_max: 0.5,
                    }),
                    pool_size: 10,
                },
                ParticleEntryConfig {
                    key: "coinExplosion".into(),
                    template: Some(ParticleTemplate {
                        duration: 1.0,
                        start_lifetime_max: 1.0,
                    }),
                    pool_size: 5,
                },
            ],
            sounds: vec![SoundEntryConfig {
                key: "spiderAttack".into(),
                clip_length: Some(0.8),
                settings: AudioSettings::default(),
                pool_size: 10,
            }],
        }
    }
}

/// Resource: все effect pools сцены
#[derive(Resource, Debug)]
pub struct EffectPools {
    pub particles: PoolRegistry<ParticleEffect>,
    pub sounds: PoolRegistry<AudioEmitter>,
}

impl EffectPools {
    pub fn from_config(config: &PoolsConfig) -> Self {
        let particles = config.particles.iter().map(|entry| PoolEntry {
            key: entry.key.clone(),
            prefab: entry.template.map(ParticleEffect::new),
            size: entry.pool_size,
        });

        let sounds = config.sounds.iter().map(|entry| PoolEntry {
            key: entry.key.clone(),
            prefab: entry
                .clip_length
                .map(|length| AudioEmitter::new(entry.key.clone(), length, entry.settings)),
            size: entry.pool_size,
        });

        Self {
            particles: PoolRegistry::from_entries(particles, config.expandable),
            sounds: PoolRegistry::from_entries(sounds, config.expandable),
        }
    }

    pub fn clear_all(&mut self) -> usize {
        self.particles.clear_all() + self.sounds.clear_all()
    }
}

impl Default for EffectPools {
    fn default() -> Self {
        Self::from_config(&PoolsConfig::default())
    }
}

/// Effects Plugin
///
/// Порядок в FixedUpdate:
/// 1. play_requested_effects: PlayEffect/PlaySound → pool
/// 2. tick_effect_pools: авто-возврат отработавших экземпляров
/// 3. clear_effect_pools_on_request: teardown
pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<PlayEffect>()
            .add_event::<PlaySound>()
            .add_event::<ClearEffectPools>()
            .init_resource::<EffectPools>();

        app.add_systems(
            FixedUpdate,
            (
                systems::play_requested_effects,
                systems::tick_effect_pools,
                systems::clear_effect_pools_on_request,
            )
                .chain()
                .in_set(SimulationSet::Effects),
        );
    }
}
