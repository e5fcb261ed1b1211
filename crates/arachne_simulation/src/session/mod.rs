//! Session state: жизни и монеты
//!
//! Владельцы: `Lives` и `CoinCounter` resources (никаких глобальных singleton'ов).
//! Источники: `TargetKilled` (ai, pickups) и `CoinCollected` (pickups).

use bevy::prelude::*;

pub mod coins;
pub mod lives;
pub mod systems;

pub use coins::{CoinConfig, CoinCounter};
pub use lives::{LifeLoss, Lives, LivesConfig, Respawning};

use crate::SimulationSet;

/// Жизни изменились (UI)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivesChanged {
    pub lives: u32,
}

/// Жизни кончились
#[derive(Event, Debug, Clone, Copy)]
pub struct GameOver {
    pub target: Entity,
}

/// Цель снова жива после паузы респавна
#[derive(Event, Debug, Clone, Copy)]
pub struct TargetRespawned {
    pub target: Entity,
}

/// Счётчик монет изменился (UI)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinsChanged {
    pub count: u32,
}

/// Порог монет достигнут (один раз до reset)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecretUnlocked {
    pub count: u32,
}

/// Session Plugin
///
/// Порядок в FixedUpdate:
/// 1. apply_target_kills: TargetKilled → жизнь, респавн / game over
/// 2. tick_respawns: countdown респавна
/// 3. count_collected_coins: CoinCollected → счётчик
#[derive(Default)]
pub struct SessionPlugin {
    pub lives: LivesConfig,
    pub coins: CoinConfig,
}

impl Plugin for SessionPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Lives::from_config(&self.lives))
            .insert_resource(CoinCounter::new(self.coins.secret_threshold))
            .add_event::<LivesChanged>()
            .add_event::<GameOver>()
            .add_event::<TargetRespawned>()
            .add_event::<CoinsChanged>()
            .add_event::<SecretUnlocked>();

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_target_kills,
                systems::tick_respawns,
                systems::count_collected_coins,
            )
                .chain()
                .in_set(SimulationSet::Session),
        );
    }
}
