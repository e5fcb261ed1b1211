//! Pickup systems.

use bevy::prelude::*;
use std::collections::HashSet;

use super::{Coin, CoinCollected, ExplosiveAppearanceChanged, ExplosiveItem, Pickup, ProximitySensor};
use crate::ai::{EnemyBrain, KillKind, TargetBody, TargetKilled};
use crate::pool::PlayEffect;

/// Система: враг вошёл в радиус датчика → взвести взрывчатку
///
/// Мёртвые враги (без коллизий) датчик не видят.
pub fn arm_explosives_near_enemies(
    mut sensors: Query<(Entity, &Transform, &mut ProximitySensor, &mut ExplosiveItem)>,
    enemies: Query<(Entity, &Transform, &EnemyBrain)>,
    mut appearance_events: EventWriter<ExplosiveAppearanceChanged>,
) {
    for (item_entity, sensor_transform, mut sensor, mut item) in sensors.iter_mut() {
        let radius_sq = sensor.radius * sensor.radius;
        let inside: HashSet<Entity> = enemies
            .iter()
            .filter(|(_, transform, brain)| {
                brain.is_collidable()
                    && transform.translation.distance_squared(sensor_transform.translation) <= radius_sq
            })
            .map(|(entity, _, _)| entity)
            .collect();

        if sensor.update(inside) == 0 {
            continue;
        }

        if item.arm() {
            crate::log(&format!(
                "💣 Explosive {:?} armed for {:.1}s (enemy nearby)",
                item_entity, item.config.duration
            ));
            appearance_events.write(ExplosiveAppearanceChanged {
                item: item_entity,
                appearance: item.appearance(),
            });
        }
    }
}

/// Система: countdown взведённой взрывчатки
pub fn tick_explosives(
    mut items: Query<(Entity, &mut ExplosiveItem)>,
    time: Res<Time<Fixed>>,
    mut appearance_events: EventWriter<ExplosiveAppearanceChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut item) in items.iter_mut() {
        if item.tick(delta) {
            crate::log(&format!("Explosive {:?} disarmed", entity));
            appearance_events.write(ExplosiveAppearanceChanged {
                item: entity,
                appearance: item.appearance(),
            });
        }
    }
}

/// Система: цель в trigger volume предмета
///
/// Взведённая взрывчатка → эффект взрыва + TargetKilled(Explosion) + удаление.
/// Иначе монета → CoinCollected + эффект сбора + удаление.
/// Неживая цель (умирает / респавн) предметы не трогает.
pub fn resolve_pickup_contacts(
    mut commands: Commands,
    pickups: Query<(Entity, &Transform, &Pickup, Option<&Coin>, Option<&ExplosiveItem>)>,
    targets: Query<(Entity, &Transform, &TargetBody)>,
    mut killed_events: EventWriter<TargetKilled>,
    mut coin_events: EventWriter<CoinCollected>,
    mut effect_events: EventWriter<PlayEffect>,
) {
    let mut consumed: HashSet<Entity> = HashSet::new();

    for (target, target_transform, body) in targets.iter() {
        if !body.alive {
            continue;
        }

        for (pickup, transform, trigger, coin, explosive) in pickups.iter() {
            if consumed.contains(&pickup) {
                continue;
            }
            let radius_sq = trigger.radius * trigger.radius;
            if transform.translation.distance_squared(target_transform.translation) > radius_sq {
                continue;
            }

            let position = transform.translation;

            if let Some(item) = explosive.filter(|item| item.is_armed()) {
                crate::log(&format!("💥 Explosive {:?} detonated on {:?}", pickup, target));
                effect_events.write(PlayEffect::at(item.config.explosion_effect.clone(), position));
                killed_events.write(TargetKilled {
                    target,
                    killer: pickup,
                    killer_position: position,
                    kind: KillKind::Explosion,
                });
            } else if let Some(coin) = coin {
                coin_events.write(CoinCollected {
                    coin: pickup,
                    collector: target,
                    position,
                });
                if !coin.skip_effect {
                    effect_events.write(PlayEffect::at(coin.effect_key.clone(), position));
                }
            } else {
                // Разряженная взрывчатка без монеты: ничего не происходит
                continue;
            }

            consumed.insert(pickup);
            commands.entity(pickup).despawn();
        }
    }
}
