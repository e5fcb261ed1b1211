//! Тесты детерминизма
//!
//! Симуляция с одинаковым seed даёт идентичные результаты:
//! stagger фаз retarget (ChaCha8), патруль, погоня, routed navigation.

use std::time::Duration;

use arachne_simulation::ai::{GroundProbeBackend, NavigationBackend, Platform, PlatformLayout};
use arachne_simulation::*;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

/// Компонент-снимок врага (Debug → байты для world_snapshot)
#[derive(Component, Debug)]
struct EnemyTrace {
    state: &'static str,
    x: f32,
    z: f32,
    chase_destination: Option<Vec3>,
}

/// Система: brain → trace (после всей симуляции tick'а)
fn trace_enemies(mut query: Query<(&EnemyBrain, &mut EnemyTrace)>) {
    for (brain, mut trace) in query.iter_mut() {
        trace.state = brain.state().name();
        trace.x = brain.pose.position.x;
        trace.z = brain.pose.position.z;
        trace.chase_destination = brain.chase_destination();
    }
}

/// Система: цель ходит туда-сюда вдоль платформы
fn sweep_target(mut query: Query<&mut Transform, With<ai::TargetBody>>, time: Res<Time<Fixed>>) {
    let t = time.elapsed_secs();
    for mut transform in query.iter_mut() {
        transform.translation.x = 8.0 * (t * 0.5).sin();
    }
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;
    const ENEMY_COUNT: usize = 12;
    const TICK_COUNT: usize = 600;

    // Первый прогон
    let snapshot1 = run_simulation(SEED, ENEMY_COUNT, TICK_COUNT);

    // Второй прогон с тем же seed
    let snapshot2 = run_simulation(SEED, ENEMY_COUNT, TICK_COUNT);

    assert_eq!(
        snapshot1, snapshot2,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    const SEED: u64 = 42;
    const ENEMY_COUNT: usize = 12;
    const TICK_COUNT: usize = 600;

    // Запускаем 3 раза: все должны быть идентичны
    let snapshots: Vec<_> = (0..3)
        .map(|_| run_simulation(SEED, ENEMY_COUNT, TICK_COUNT))
        .collect();

    for (i, snapshot) in snapshots.iter().enumerate().skip(1) {
        assert_eq!(
            snapshots[0], *snapshot,
            "Прогон {} дал результат отличный от прогона 0",
            i
        );
    }
}

/// Запускает симуляцию и возвращает snapshot врагов
fn run_simulation(seed: u64, enemy_count: usize, tick_count: usize) -> Vec<u8> {
    let config = SimulationConfig {
        seed,
        ..Default::default()
    };
    let mut app = create_headless_app_with_config(config.clone());
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(1.0 / 60.0)));

    let layout = PlatformLayout::new(vec![Platform {
        min: Vec2::new(-12.0, -6.0),
        max: Vec2::new(12.0, 6.0),
        height: 0.0,
    }]);
    app.insert_resource(NavigationBackend::new(layout.clone()))
        .insert_resource(GroundProbeBackend::new(layout));

    app.add_systems(
        FixedUpdate,
        (
            sweep_target.before(SimulationSet::Pickups),
            trace_enemies.after(SimulationSet::Effects),
        ),
    );

    let world = app.world_mut();
    spawn_target(world, Vec3::ZERO);

    for i in 0..enemy_count {
        let z = -5.0 + i as f32 * (10.0 / enemy_count as f32);
        let preset = if i % 2 == 0 {
            config.routed_enemy.clone()
        } else {
            config.probed_enemy.clone()
        };
        let Ok(path) = PatrolPath::new(
            vec![Vec3::new(-10.0, 0.0, z), Vec3::new(10.0, 0.0, z)],
            Default::default(),
        ) else {
            panic!("valid patrol path");
        };

        let enemy = spawn_enemy(world, preset, Some(path), Vec3::new(-10.0, 0.0, z));
        world.entity_mut(enemy).insert(EnemyTrace {
            state: "Patrol",
            x: 0.0,
            z,
            chase_destination: None,
        });
    }

    for _ in 0..tick_count {
        app.update();
    }

    world_snapshot::<EnemyTrace>(app.world_mut())
}
