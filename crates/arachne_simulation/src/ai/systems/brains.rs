//! EnemyBrain tick system.

use bevy::prelude::*;
use std::collections::HashSet;

use crate::ai::brain::{EnemyBrain, TargetSnapshot};
use crate::ai::capabilities::{AnimationSink, GroundProbe, Navigation, NullAnimator, OpenGround};
use crate::ai::components::{AnimatorParams, GroundProbeBackend, NavigationBackend, TargetBody};
use crate::ai::events::{EnemyStateChanged, TargetKilled};
use crate::ai::locomotion::{with_locomotion, LocomotionMode};

/// Система: tick FSM всех врагов + синхронизация позы в Transform
///
/// Цель: первая entity с `TargetBody` (одна цель на сцену).
/// Цель, убитая в этом tick'е (TargetKilled от контакта или взрыва), уже не цель,
/// даже если session ещё не снял `alive`.
/// Нет capability resource → open ground fallback (warning один раз).
/// Death delay истёк → despawn.
pub fn tick_enemy_brains(
    mut commands: Commands,
    mut enemies: Query<(Entity, &mut EnemyBrain, &mut Transform, Option<&mut AnimatorParams>)>,
    targets: Query<(Entity, &Transform, &TargetBody), Without<EnemyBrain>>,
    mut kills: EventReader<TargetKilled>,
    navigation: Option<Res<NavigationBackend>>,
    ground_probe: Option<Res<GroundProbeBackend>>,
    time: Res<Time<Fixed>>,
    mut state_events: EventWriter<EnemyStateChanged>,
) {
    let delta = time.delta_secs();

    let killed: HashSet<Entity> = kills.read().map(|kill| kill.target).collect();

    let target = targets.iter().next().map(|(target, transform, body)| TargetSnapshot {
        position: transform.translation,
        velocity: body.velocity,
        alive: body.alive && !killed.contains(&target),
    });

    for (entity, mut brain, mut transform, mut animator) in enemies.iter_mut() {
        let mode = brain.config.locomotion;
        let probe = resolve_probe(ground_probe.as_deref(), mode);
        let nav = resolve_navigation(navigation.as_deref(), mode);

        let mut null_animator = NullAnimator;
        let animator: &mut dyn AnimationSink = match animator.as_deref_mut() {
            Some(params) => params,
            None => {
                crate::log_warning_once(
                    "animator",
                    &format!("Enemy {:?}: no AnimatorParams, animation disabled for such enemies", entity),
                );
                &mut null_animator
            }
        };

        let report = with_locomotion(mode, probe, nav, |locomotion| {
            brain.tick(target.as_ref(), locomotion, animator, delta)
        });

        transform.translation = brain.pose.position;
        transform.rotation = brain.pose.rotation;

        if let Some(state) = report.transition {
            crate::log(&format!("AI: {:?} → {}", entity, state.name()));
            state_events.write(EnemyStateChanged { enemy: entity, state });
        }

        if report.despawn {
            crate::log(&format!("AI: {:?} death delay over, despawning", entity));
            commands.entity(entity).despawn();
        }
    }
}

fn resolve_probe(backend: Option<&GroundProbeBackend>, mode: LocomotionMode) -> &dyn GroundProbe {
    match backend {
        Some(backend) => backend.0.as_ref(),
        None => {
            if matches!(mode, LocomotionMode::Probed(_)) {
                crate::log_warning_once(
                    "ground_probe",
                    "AI: no GroundProbeBackend resource, probed enemies assume open ground",
                );
            }
            &OpenGround
        }
    }
}

fn resolve_navigation(backend: Option<&NavigationBackend>, mode: LocomotionMode) -> &dyn Navigation {
    match backend {
        Some(backend) => backend.0.as_ref(),
        None => {
            if matches!(mode, LocomotionMode::Routed) {
                crate::log_warning_once(
                    "navigation",
                    "AI: no NavigationBackend resource, routed enemies assume open ground",
                );
            }
            &OpenGround
        }
    }
}
