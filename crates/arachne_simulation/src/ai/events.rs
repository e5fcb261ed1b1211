//! AI Events
//!
//! Хост (физика) → `ContactReport` → AI
//! AI → `TargetKilled` / `EnemyStomped` / `EnemyStateChanged` → session, эффекты, UI

use bevy::prelude::*;

use super::brain::EnemyState;
use super::capabilities::KillKind;

/// Контакт враг ↔ цель от физики хоста
///
/// Позиция и собственная скорость цели берутся из ECS (`Transform`, `TargetBody`).
#[derive(Event, Debug, Clone)]
pub struct ContactReport {
    pub enemy: Entity,
    pub target: Entity,
    /// World-space точки контакта
    pub contact_points: Vec<Vec3>,
    /// Скорость цели относительно врага
    pub relative_velocity: Vec3,
}

/// Цель убита (death-notification)
#[derive(Event, Debug, Clone)]
pub struct TargetKilled {
    pub target: Entity,
    /// Кто убил (враг или взрывчатка)
    pub killer: Entity,
    pub killer_position: Vec3,
    pub kind: KillKind,
}

/// Враг раздавлен сверху
#[derive(Event, Debug, Clone)]
pub struct EnemyStomped {
    pub enemy: Entity,
    pub attacker: Entity,
}

/// FSM враг сменил состояние
#[derive(Event, Debug, Clone)]
pub struct EnemyStateChanged {
    pub enemy: Entity,
    pub state: EnemyState,
}
