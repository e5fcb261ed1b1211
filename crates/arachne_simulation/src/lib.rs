//! Arachne Simulation Core
//!
//! ECS-симуляция врагов платформера на Bevy 0.16 (headless).
//!
//! Разделение ответственности:
//! - ECS = решения (AI state machine, stomp, взрывчатка, жизни, effect pools)
//! - Хост = физика, рендер, pathfinding, аудио; подключается через
//!   capability resources (`NavigationBackend`, `GroundProbeBackend`) и события

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod ai;
pub mod config;
pub mod logger;
pub mod pickups;
pub mod pool;
pub mod session;

// Re-export основных типов
pub use ai::{spawn_enemy, spawn_target, AIPlugin, EnemyBrain, EnemyConfig, EnemyState, PatrolPath};
pub use config::{ConfigError, SimulationConfig};
pub use logger::{
    init_logger, log, log_error, log_info, log_warning, log_warning_once, log_with_level, set_log_level,
    set_logger, LogLevel, LogPrinter,
};
pub use pickups::{spawn_coin, PickupsPlugin};
pub use pool::{EffectPools, EffectsPlugin, ObjectPool};
pub use session::{CoinCounter, Lives, SessionPlugin};

/// Порядок подсистем внутри одного fixed tick'а
///
/// Pickups → Ai → Session → Effects: kill/coin события, записанные в tick'е,
/// обрабатываются session в том же tick'е, эффекты проигрываются последними.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    Pickups,
    Ai,
    Session,
    Effects,
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: SimulationConfig,
}

impl SimulationPlugin {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;

        app
            // Fixed timestep для simulation tick (60Hz по умолчанию)
            .insert_resource(Time::<Fixed>::from_hz(config.fixed_hz))
            // Детерминистичный RNG (stagger фаз retarget)
            .insert_resource(DeterministicRng::new(config.seed))
            .insert_resource(EffectPools::from_config(&config.pools))
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Pickups,
                    SimulationSet::Ai,
                    SimulationSet::Session,
                    SimulationSet::Effects,
                )
                    .chain(),
            )
            .add_plugins((
                PickupsPlugin,
                AIPlugin,
                SessionPlugin {
                    lives: config.lives.clone(),
                    coins: config.coins.clone(),
                },
                EffectsPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции со всеми подсистемами
pub fn create_headless_app(seed: u64) -> App {
    create_headless_app_with_config(SimulationConfig {
        seed,
        ..Default::default()
    })
}

pub fn create_headless_app_with_config(config: SimulationConfig) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .add_plugins(SimulationPlugin::new(config));

    app
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    // Сериализуем в байты через Debug (простейший способ)
    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
