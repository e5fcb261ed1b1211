//! Generic object pool
//!
//! Экземпляры хранятся в slab (`Vec<Slot<T>>`), свободные индексы: в FIFO очереди.
//! Handle = (slot, generation): после release generation увеличивается,
//! поэтому повторный release по старому handle отклоняется, даже если
//! несколько call sites держат копию одного handle.
//!
//! Инвариант: каждый экземпляр либо в `available`, либо checked out, никогда оба.

use bevy::prelude::*;
use std::collections::VecDeque;
use thiserror::Error;

/// Как pool узнаёт что экземпляр отработал и его можно вернуть
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifetime {
    /// Фиксированная длительность (секунды) с момента `play_at`
    Timed(f32),
    /// Периодически опрашиваем `Poolable::is_alive` (интервал в секундах)
    Polled { interval: f32 },
    /// Возвращается только явным release
    Manual,
}

/// Экземпляр, который можно переиспользовать через pool
pub trait Poolable {
    /// Позиционирование + старт (emission, playback)
    fn activate(&mut self, position: Vec3, rotation: Quat);

    /// Стоп + очистка transient state (trail history и т.п.)
    fn deactivate(&mut self);

    fn lifetime(&self) -> Lifetime;

    /// Продвинуть внутреннее время экземпляра
    fn advance(&mut self, _delta: f32) {}

    /// "Ещё играет?": используется для `Lifetime::Polled`
    fn is_alive(&self) -> bool {
        true
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool key is empty")]
    EmptyKey,
    #[error("pool '{key}' has no prefab assigned")]
    MissingPrefab { key: String },
    #[error("pool '{key}' is already registered")]
    DuplicateKey { key: String },
    #[error("no pool registered under '{key}'")]
    UnknownKey { key: String },
    #[error("instance is not checked out of pool '{key}'")]
    NotCheckedOut { key: String },
    #[error("pool '{key}' is exhausted and not expandable")]
    Exhausted { key: String },
}

/// Ссылка на checked out экземпляр
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    slot: usize,
    generation: u32,
}

#[derive(Debug)]
struct Slot<T> {
    instance: T,
    generation: u32,
    checked_out: bool,
}

#[derive(Debug)]
pub struct ObjectPool<T> {
    key: String,
    container: String,
    prefab: T,
    slots: Vec<Slot<T>>,
    available: VecDeque<usize>,
    in_use: usize,
    expandable: bool,
}

impl<T: Poolable + Clone> ObjectPool<T> {
    /// Preallocate `size` неактивных экземпляров.
    ///
    /// Без prefab pool не создаётся (ошибка логируется вызывающим).
    pub fn initialize(
        key: impl Into<String>,
        prefab: Option<T>,
        size: usize,
        expandable: bool,
    ) -> Result<Self, PoolError> {
        let key = key.into();
        if key.is_empty() {
            return Err(PoolError::EmptyKey);
        }
        let Some(prefab) = prefab else {
            return Err(PoolError::MissingPrefab { key });
        };

        let mut pool = Self {
            container: format!("[Pool_{}]", key),
            key,
            prefab,
            slots: Vec::with_capacity(size),
            available: VecDeque::with_capacity(size),
            in_use: 0,
            expandable,
        };

        for _ in 0..size {
            let slot = pool.create_instance();
            pool.available.push_back(slot);
        }

        Ok(pool)
    }

    fn create_instance(&mut self) -> usize {
        let mut instance = self.prefab.clone();
        instance.deactivate();
        self.slots.push(Slot {
            instance,
            generation: 0,
            checked_out: false,
        });
        self.slots.len() - 1
    }

    /// O(1) amortized. `Err(Exhausted)` если свободных нет и расширение запрещено.
    pub fn try_acquire(&mut self) -> Result<PoolHandle, PoolError> {
        let slot = match self.available.pop_front() {
            Some(slot) => slot,
            None if self.expandable => self.create_instance(),
            None => {
                return Err(PoolError::Exhausted {
                    key: self.key.clone(),
                })
            }
        };

        let Some(entry) = self.slots.get_mut(slot) else {
            return Err(PoolError::Exhausted {
                key: self.key.clone(),
            });
        };
        entry.checked_out = true;
        self.in_use += 1;

        Ok(PoolHandle {
            slot,
            generation: entry.generation,
        })
    }

    /// Как `try_acquire`, но exhaustion только логируется (soft failure)
    pub fn acquire(&mut self) -> Option<PoolHandle> {
        match self.try_acquire() {
            Ok(handle) => Some(handle),
            Err(err) => {
                crate::logger::log_warning(&format!("ObjectPool: {}", err));
                None
            }
        }
    }

    /// O(1). Отклоняет handle, который сейчас не checked out (счётчики не меняются).
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let Some(entry) = self.slot_mut(handle) else {
            let err = PoolError::NotCheckedOut {
                key: self.key.clone(),
            };
            crate::logger::log_warning(&format!("ObjectPool: {}", err));
            return Err(err);
        };

        entry.instance.deactivate();
        entry.checked_out = false;
        entry.generation = entry.generation.wrapping_add(1);
        self.in_use -= 1;
        self.available.push_back(handle.slot);
        Ok(())
    }

    /// Принудительно вернуть все checked out экземпляры (scene teardown)
    pub fn clear_all(&mut self) -> usize {
        let handles: Vec<PoolHandle> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.checked_out)
            .map(|(slot, s)| PoolHandle {
                slot,
                generation: s.generation,
            })
            .collect();

        let mut released = 0;
        for handle in handles {
            if self.release(handle).is_ok() {
                released += 1;
            }
        }
        released
    }
}

impl<T> ObjectPool<T> {
    fn slot_mut(&mut self, handle: PoolHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.slot)
            .filter(|s| s.checked_out && s.generation == handle.generation)
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.slot)
            .filter(|s| s.checked_out && s.generation == handle.generation)
            .map(|s| &s.instance)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slot_mut(handle).map(|s| &mut s.instance)
    }

    pub fn is_checked_out(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Имя контейнера, под которым живут экземпляры (`[Pool_<key>]`)
    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn is_expandable(&self) -> bool {
        self.expandable
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }
}
