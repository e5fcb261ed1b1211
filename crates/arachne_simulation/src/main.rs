//! Headless симуляция Arachne
//!
//! Один уровень: цель стоит у края патруля, два паука (probed и routed),
//! обычная монета и монета со взрывчаткой. Печатает состояния раз в секунду.

use std::time::Duration;

use arachne_simulation::ai::{GroundProbeBackend, NavigationBackend, Platform, PlatformLayout};
use arachne_simulation::pickups::spawn_coin;
use arachne_simulation::{
    create_headless_app, log_info, spawn_enemy, spawn_target, EnemyBrain, Lives, PatrolPath, SimulationConfig,
};
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

fn main() {
    let seed = 42;
    let config = SimulationConfig {
        seed,
        ..Default::default()
    };
    let mut app = create_headless_app(seed);
    log_info(&format!("Starting Arachne headless simulation (seed: {})", seed));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        1.0 / config.fixed_hz,
    )));

    let layout = PlatformLayout::new(vec![Platform {
        min: Vec2::new(-10.0, -3.0),
        max: Vec2::new(10.0, 3.0),
        height: 0.0,
    }]);
    app.insert_resource(NavigationBackend::new(layout.clone()))
        .insert_resource(GroundProbeBackend::new(layout));

    let world = app.world_mut();
    spawn_target(world, Vec3::new(9.0, 0.0, 0.0));

    let waypoints = vec![Vec3::new(-8.0, 0.0, 0.0), Vec3::new(-2.0, 0.0, 0.0)];
    match PatrolPath::new(waypoints.clone(), Default::default()) {
        Ok(path) => {
            spawn_enemy(world, config.probed_enemy.clone(), Some(path), Vec3::new(-8.0, 0.0, 0.0));
        }
        Err(err) => log_info(&format!("probed enemy skipped: {}", err)),
    }
    match PatrolPath::new(waypoints, Default::default()) {
        Ok(path) => {
            spawn_enemy(world, config.routed_enemy.clone(), Some(path), Vec3::new(-2.0, 0.0, 2.0));
        }
        Err(err) => log_info(&format!("routed enemy skipped: {}", err)),
    }

    spawn_coin(world, &config.pickups, Vec3::new(5.0, 0.0, 0.0), false);
    spawn_coin(world, &config.pickups, Vec3::new(0.0, 0.0, 1.0), true);

    // 20 секунд симуляции
    let ticks = (config.fixed_hz * 20.0) as usize;
    for tick in 0..=ticks {
        app.update();

        if tick % config.fixed_hz as usize == 0 {
            let world = app.world_mut();
            let mut enemies = world.query::<(Entity, &EnemyBrain)>();
            let states: Vec<String> = enemies
                .iter(world)
                .map(|(entity, brain)| format!("{:?}={}", entity, brain.state().name()))
                .collect();
            let lives = world.resource::<Lives>().current();
            log_info(&format!("Tick {}: lives {}, enemies [{}]", tick, lives, states.join(", ")));
        }
    }

    log_info("Simulation complete!");
}
