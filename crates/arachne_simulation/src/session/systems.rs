//! Session systems.

use bevy::prelude::*;

use super::{
    CoinCounter, CoinsChanged, GameOver, LifeLoss, Lives, LivesChanged, Respawning, SecretUnlocked,
    TargetRespawned,
};
use crate::ai::{TargetBody, TargetKilled};
use crate::pickups::CoinCollected;

/// Система: TargetKilled → минус жизнь
///
/// Цель, которая уже умирает (alive == false), повторно не считается:
/// два врага в одном tick'е отнимают одну жизнь.
pub fn apply_target_kills(
    mut commands: Commands,
    mut kills: EventReader<TargetKilled>,
    mut targets: Query<&mut TargetBody>,
    mut lives: ResMut<Lives>,
    mut lives_events: EventWriter<LivesChanged>,
    mut game_over_events: EventWriter<GameOver>,
) {
    for kill in kills.read() {
        let Ok(mut body) = targets.get_mut(kill.target) else {
            continue;
        };
        if !body.alive {
            continue;
        }

        body.alive = false;
        body.velocity = Vec3::ZERO;

        let outcome = lives.lose(1);
        crate::log_info(&format!(
            "☠️ Target {:?} killed by {:?} ({:?}), lives left: {}",
            kill.target,
            kill.killer,
            kill.kind,
            lives.current()
        ));
        lives_events.write(LivesChanged {
            lives: lives.current(),
        });

        match outcome {
            LifeLoss::Respawn => {
                commands.entity(kill.target).insert(Respawning {
                    remaining: lives.respawn_delay,
                });
            }
            LifeLoss::GameOver => {
                crate::log_info("GAME OVER");
                game_over_events.write(GameOver { target: kill.target });
            }
        }
    }
}

/// Система: countdown респавна → цель снова жива
pub fn tick_respawns(
    mut commands: Commands,
    mut respawning: Query<(Entity, &mut Respawning, &mut TargetBody)>,
    time: Res<Time<Fixed>>,
    mut respawned_events: EventWriter<TargetRespawned>,
) {
    let delta = time.delta_secs();

    for (entity, mut respawn, mut body) in respawning.iter_mut() {
        respawn.remaining -= delta;
        if respawn.remaining > 0.0 {
            continue;
        }

        body.alive = true;
        body.velocity = Vec3::ZERO;
        commands.entity(entity).remove::<Respawning>();
        crate::log(&format!("Target {:?} respawned", entity));
        respawned_events.write(TargetRespawned { target: entity });
    }
}

/// Система: CoinCollected → счётчик монет
pub fn count_collected_coins(
    mut collected: EventReader<CoinCollected>,
    mut counter: ResMut<CoinCounter>,
    mut coins_events: EventWriter<CoinsChanged>,
    mut secret_events: EventWriter<SecretUnlocked>,
) {
    for _ in collected.read() {
        let unlocked = counter.add();
        coins_events.write(CoinsChanged {
            count: counter.count(),
        });

        if unlocked {
            crate::log_info(&format!("🔓 Secret unlocked ({} coins)", counter.count()));
            secret_events.write(SecretUnlocked {
                count: counter.count(),
            });
        }
    }
}
