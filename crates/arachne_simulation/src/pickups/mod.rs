//! Pickups: монеты и взрывчатка
//!
//! Монета со взрывчаткой: один предмет с двумя исходами:
//! - не взведена → обычный сбор (эффект `coin`, +1 в счётчик)
//! - взведена (рядом был враг) → взрыв (эффект `coinExplosion`, цель убита, монета не засчитана)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod explosive;
pub mod systems;

pub use explosive::{Appearance, ExplosiveConfig, ExplosiveItem};

use crate::SimulationSet;

/// Монета
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Coin {
    /// Particle ключ эффекта сбора
    pub effect_key: String,
    /// Без эффекта (сразу удалить)
    pub skip_effect: bool,
}

impl Default for Coin {
    fn default() -> Self {
        Self {
            effect_key: "coin".into(),
            skip_effect: false,
        }
    }
}

/// Trigger volume предмета: цель ближе `radius` = контакт
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pickup {
    pub radius: f32,
}

/// Датчик врагов вокруг взрывчатки
///
/// Срабатывает только на ВХОД врага в радиус: стоящий рядом враг
/// не перевзводит предмет после того как таймер истёк.
#[derive(Component, Debug, Clone, Default)]
pub struct ProximitySensor {
    pub radius: f32,
    occupants: HashSet<Entity>,
}

impl ProximitySensor {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            occupants: HashSet::new(),
        }
    }

    /// Обновить набор врагов внутри; возвращает число вошедших в этот tick
    pub fn update(&mut self, inside: HashSet<Entity>) -> usize {
        let entered = inside.difference(&self.occupants).count();
        self.occupants = inside;
        entered
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.len()
    }
}

/// Монета собрана
#[derive(Event, Debug, Clone)]
pub struct CoinCollected {
    pub coin: Entity,
    pub collector: Entity,
    pub position: Vec3,
}

/// Взрывчатка взведена / разряжена (хост меняет материал)
#[derive(Event, Debug, Clone)]
pub struct ExplosiveAppearanceChanged {
    pub item: Entity,
    pub appearance: Appearance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickupsConfig {
    pub pickup_radius: f32,
    /// Радиус датчика врагов вокруг взрывчатки
    pub sensor_radius: f32,
    pub coin_effect: String,
    pub explosive: ExplosiveConfig,
}

impl Default for PickupsConfig {
    fn default() -> Self {
        Self {
            pickup_radius: 0.8,
            sensor_radius: 3.0,
            coin_effect: "coin".into(),
            explosive: ExplosiveConfig::default(),
        }
    }
}

/// Pickups Plugin
///
/// Порядок в FixedUpdate:
/// 1. arm_explosives_near_enemies: датчик → arm()
/// 2. tick_explosives: countdown, разряд
/// 3. resolve_pickup_contacts: цель в trigger volume → сбор или взрыв
pub struct PickupsPlugin;

impl Plugin for PickupsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<CoinCollected>()
            .add_event::<ExplosiveAppearanceChanged>();

        app.add_systems(
            FixedUpdate,
            (
                systems::arm_explosives_near_enemies,
                systems::tick_explosives,
                systems::resolve_pickup_contacts,
            )
                .chain()
                .in_set(SimulationSet::Pickups),
        );
    }
}

/// Спавн монеты; с `explosive: true` монета получает взрывчатку и датчик врагов
pub fn spawn_coin(world: &mut World, config: &PickupsConfig, position: Vec3, explosive: bool) -> Entity {
    let mut entity = world.spawn((
        Transform::from_translation(position),
        Coin {
            effect_key: config.coin_effect.clone(),
            skip_effect: false,
        },
        Pickup {
            radius: config.pickup_radius,
        },
    ));

    if explosive {
        entity.insert((
            ExplosiveItem::new(config.explosive.clone()),
            ProximitySensor::new(config.sensor_radius),
        ));
    }

    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensor_counts_only_entries() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut sensor = ProximitySensor::new(3.0);

        assert_eq!(sensor.update(HashSet::from([a])), 1);
        // Тот же враг остаётся внутри: не вход
        assert_eq!(sensor.update(HashSet::from([a])), 0);
        assert_eq!(sensor.update(HashSet::from([a, b])), 1);
        assert_eq!(sensor.update(HashSet::new()), 0);
        // Вышел и снова вошёл
        assert_eq!(sensor.update(HashSet::from([a])), 1);
        assert_eq!(sensor.occupant_count(), 1);
    }
}
