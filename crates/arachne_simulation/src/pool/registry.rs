//! Keyed pool registry: несколько pool'ов одного типа под строковыми ключами
//!
//! `play_at` берёт экземпляр, активирует его и ставит на автоматический возврат
//! (таймер или опрос `is_alive`). `tick` вызывается раз в fixed step.

use bevy::prelude::*;
use std::collections::HashMap;

use super::object_pool::{Lifetime, ObjectPool, PoolError, PoolHandle, Poolable};

/// Запись для регистрации pool'а
#[derive(Debug, Clone)]
pub struct PoolEntry<T> {
    pub key: String,
    pub prefab: Option<T>,
    pub size: usize,
}

/// Handle проигрываемого эффекта
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EffectHandle {
    pub key: String,
    pub handle: PoolHandle,
}

#[derive(Debug)]
enum ReturnSchedule {
    Countdown { remaining: f32 },
    Poll { interval: f32, timer: f32 },
    Manual,
}

#[derive(Debug)]
struct ActiveEffect {
    effect: EffectHandle,
    schedule: ReturnSchedule,
}

#[derive(Debug)]
pub struct PoolRegistry<T> {
    pools: HashMap<String, ObjectPool<T>>,
    active: Vec<ActiveEffect>,
    expandable: bool,
}

impl<T: Poolable + Clone> PoolRegistry<T> {
    pub fn new(expandable: bool) -> Self {
        Self {
            pools: HashMap::new(),
            active: Vec::new(),
            expandable,
        }
    }

    /// Регистрирует все валидные записи; битые (пустой ключ, нет prefab, дубликат)
    /// пропускаются с warning, registry остаётся рабочим для остальных.
    pub fn from_entries(entries: impl IntoIterator<Item = PoolEntry<T>>, expandable: bool) -> Self {
        let mut registry = Self::new(expandable);
        for entry in entries {
            if let Err(err) = registry.register(entry) {
                crate::logger::log_warning(&format!("PoolRegistry: skipping entry: {}", err));
            }
        }
        registry
    }

    pub fn register(&mut self, entry: PoolEntry<T>) -> Result<(), PoolError> {
        if self.pools.contains_key(&entry.key) {
            return Err(PoolError::DuplicateKey { key: entry.key });
        }

        let pool = ObjectPool::initialize(entry.key.clone(), entry.prefab, entry.size, self.expandable)?;
        crate::logger::log(&format!(
            "PoolRegistry: {} ready ({} instances)",
            pool.container(),
            pool.total_count()
        ));
        self.pools.insert(entry.key, pool);
        Ok(())
    }

    /// Взять экземпляр, поставить в позицию, запустить и запланировать возврат.
    ///
    /// `None` = soft failure (нет такого ключа или pool исчерпан), эффект просто не проигрывается.
    pub fn play_at(&mut self, key: &str, position: Vec3, rotation: Quat) -> Option<EffectHandle> {
        let Some(pool) = self.pools.get_mut(key) else {
            crate::logger::log_warning(&format!(
                "PoolRegistry: {}",
                PoolError::UnknownKey { key: key.to_owned() }
            ));
            return None;
        };

        let handle = pool.acquire()?;
        let instance = pool.get_mut(handle)?;
        instance.activate(position, rotation);

        let schedule = match instance.lifetime() {
            Lifetime::Timed(seconds) => ReturnSchedule::Countdown { remaining: seconds },
            Lifetime::Polled { interval } => ReturnSchedule::Poll { interval, timer: 0.0 },
            Lifetime::Manual => ReturnSchedule::Manual,
        };

        let effect = EffectHandle {
            key: key.to_owned(),
            handle,
        };
        self.active.push(ActiveEffect {
            effect: effect.clone(),
            schedule,
        });
        Some(effect)
    }

    /// Продвинуть все активные экземпляры и вернуть отработавшие. Возвращает число возвращённых.
    pub fn tick(&mut self, delta: f32) -> usize {
        let pools = &mut self.pools;
        let mut released = 0;

        self.active.retain_mut(|active| {
            let Some(pool) = pools.get_mut(&active.effect.key) else {
                return false;
            };
            let Some(instance) = pool.get_mut(active.effect.handle) else {
                // Уже возвращён вручную
                return false;
            };
            instance.advance(delta);

            let finished = match &mut active.schedule {
                ReturnSchedule::Countdown { remaining } => {
                    *remaining -= delta;
                    *remaining <= 0.0
                }
                ReturnSchedule::Poll { interval, timer } => {
                    *timer += delta;
                    if *timer >= *interval {
                        *timer = 0.0;
                        !instance.is_alive()
                    } else {
                        false
                    }
                }
                ReturnSchedule::Manual => false,
            };

            if finished && pool.release(active.effect.handle).is_ok() {
                released += 1;
            }
            !finished
        });

        released
    }

    pub fn release(&mut self, effect: &EffectHandle) -> Result<(), PoolError> {
        let Some(pool) = self.pools.get_mut(&effect.key) else {
            return Err(PoolError::UnknownKey {
                key: effect.key.clone(),
            });
        };
        pool.release(effect.handle)?;
        self.active.retain(|a| a.effect != *effect);
        Ok(())
    }

    /// Вернуть все checked out экземпляры во всех pool'ах
    pub fn clear_all(&mut self) -> usize {
        self.active.clear();
        self.pools.values_mut().map(|pool| pool.clear_all()).sum()
    }
}

impl<T> PoolRegistry<T> {
    pub fn pool(&self, key: &str) -> Option<&ObjectPool<T>> {
        self.pools.get(key)
    }

    pub fn get(&self, effect: &EffectHandle) -> Option<&T> {
        self.pools.get(&effect.key)?.get(effect.handle)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pools.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.pools.keys().map(String::as_str)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::effects::{AudioEmitter, AudioSettings, ParticleEffect, ParticleTemplate};

    fn coin_template() -> ParticleEffect {
        ParticleEffect::new(ParticleTemplate {
            duration: 0.5,
            start_lifetime_max: 0.45,
        })
    }

    fn particle_registry(expandable: bool) -> PoolRegistry<ParticleEffect> {
        PoolRegistry::from_entries(
            vec![
                PoolEntry {
                    key: "coin".into(),
                    prefab: Some(coin_template()),
                    size: 2,
                },
                PoolEntry {
                    key: "broken".into(),
                    prefab: None,
                    size: 2,
                },
                PoolEntry {
                    key: "coin".into(),
                    prefab: Some(coin_template()),
                    size: 9,
                },
                PoolEntry {
                    key: "".into(),
                    prefab: Some(coin_template()),
                    size: 1,
                },
            ],
            expandable,
        )
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let registry = particle_registry(true);

        assert!(registry.contains_key("coin"));
        assert!(!registry.contains_key("broken"));
        assert_eq!(registry.keys().count(), 1);
        // Дубликат не перезаписал первую запись
        assert_eq!(registry.pool("coin").map(|p| p.total_count()), Some(2));
    }

    #[test]
    fn test_play_unknown_key_is_soft_failure() {
        let mut registry = particle_registry(true);
        assert!(registry.play_at("explosion", Vec3::ZERO, Quat::IDENTITY).is_none());
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_timed_effect_returns_after_lifetime() {
        let mut registry = particle_registry(false);
        let effect = registry.play_at("coin", Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let Some(effect) = effect else {
            panic!("expected effect");
        };

        assert_eq!(registry.get(&effect).map(|p| p.position), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(registry.pool("coin").map(|p| p.in_use_count()), Some(1));

        // 0.5 + 0.45 + 0.05 ≈ 1.0 sec
        assert_eq!(registry.tick(0.5), 0);
        assert_eq!(registry.tick(0.25), 0);
        assert_eq!(registry.tick(0.3), 1);

        assert_eq!(registry.pool("coin").map(|p| p.available_count()), Some(2));
        assert!(registry.get(&effect).is_none());
    }

    #[test]
    fn test_exhausted_fixed_pool_drops_request() {
        let mut registry = particle_registry(false);
        assert!(registry.play_at("coin", Vec3::ZERO, Quat::IDENTITY).is_some());
        assert!(registry.play_at("coin", Vec3::ZERO, Quat::IDENTITY).is_some());
        assert!(registry.play_at("coin", Vec3::ZERO, Quat::IDENTITY).is_none());
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_polled_effect_returns_when_not_alive() {
        let mut registry = PoolRegistry::from_entries(
            vec![PoolEntry {
                key: "spiderAttack".into(),
                prefab: Some(AudioEmitter::new("spiderAttack", 0.25, AudioSettings::default())),
                size: 1,
            }],
            false,
        );
        assert!(registry.play_at("spiderAttack", Vec3::ZERO, Quat::IDENTITY).is_some());

        // Опрос раз в 0.1 сек: клип закончится на 0.25, вернётся на ближайшем опросе
        let mut released_at = None;
        for step in 1..=10 {
            if registry.tick(0.05) > 0 {
                released_at = Some(step);
                break;
            }
        }
        assert_eq!(released_at, Some(6));
    }

    #[test]
    fn test_manual_release_then_tick_is_consistent() {
        let mut registry = particle_registry(false);
        let Some(effect) = registry.play_at("coin", Vec3::ZERO, Quat::IDENTITY) else {
            panic!("expected effect");
        };

        assert!(registry.release(&effect).is_ok());
        assert!(registry.release(&effect).is_err());
        assert_eq!(registry.tick(5.0), 0);
        assert_eq!(registry.pool("coin").map(|p| p.available_count()), Some(2));
    }

    #[test]
    fn test_clear_all() {
        let mut registry = particle_registry(true);
        for _ in 0..4 {
            assert!(registry.play_at("coin", Vec3::ZERO, Quat::IDENTITY).is_some());
        }
        assert_eq!(registry.clear_all(), 4);
        assert_eq!(registry.active_count(), 0);
        assert_eq!(registry.pool("coin").map(|p| p.in_use_count()), Some(0));
    }
}
