//! Contact resolution: stomp или убийство цели.

use bevy::prelude::*;

use crate::ai::brain::{ContactOutcome, EnemyBrain, TargetSnapshot};
use crate::ai::capabilities::{AnimationSink, KillCause, NullAnimator};
use crate::ai::components::{AnimatorParams, TargetBody};
use crate::ai::events::{ContactReport, EnemyStomped, TargetKilled};
use crate::ai::stomp::Contact;
use crate::pool::PlaySound;

/// Система: ContactReport → stomp / kill
///
/// Stomp: враг → Dead, атакующему добавляется bounce к скорости.
/// Иначе: TargetKilled + звук атаки (если настроен) + post-kill policy врага.
pub fn resolve_enemy_contacts(
    mut contacts: EventReader<ContactReport>,
    mut enemies: Query<(&mut EnemyBrain, Option<&mut AnimatorParams>)>,
    mut targets: Query<(&Transform, &mut TargetBody), Without<EnemyBrain>>,
    mut stomped_events: EventWriter<EnemyStomped>,
    mut killed_events: EventWriter<TargetKilled>,
    mut sound_events: EventWriter<PlaySound>,
) {
    for report in contacts.read() {
        let Ok((mut brain, mut animator)) = enemies.get_mut(report.enemy) else {
            continue; // уже despawned
        };
        let Ok((target_transform, mut body)) = targets.get_mut(report.target) else {
            continue;
        };

        let contact = Contact {
            target_position: target_transform.translation,
            contact_points: report.contact_points.clone(),
            target_velocity: body.velocity,
            relative_velocity: report.relative_velocity,
        };
        let snapshot = TargetSnapshot {
            position: target_transform.translation,
            velocity: body.velocity,
            alive: body.alive,
        };

        let mut null_animator = NullAnimator;
        let animator: &mut dyn AnimationSink = match animator.as_deref_mut() {
            Some(params) => params,
            None => &mut null_animator,
        };
        let mut deaths: Vec<KillCause> = Vec::new();

        match brain.resolve_contact(&contact, &snapshot, animator, &mut deaths) {
            ContactOutcome::Stomped { bounce } => {
                body.velocity += bounce;
                crate::log(&format!(
                    "💀 Enemy {:?} stomped by {:?} (bounce {:.1})",
                    report.enemy, report.target, bounce.y
                ));
                stomped_events.write(EnemyStomped {
                    enemy: report.enemy,
                    attacker: report.target,
                });
            }
            ContactOutcome::TargetKilled { attack_sound } => {
                for cause in deaths {
                    crate::log(&format!(
                        "⚔️ Enemy {:?} killed target {:?} ({:?})",
                        report.enemy, report.target, brain.config.post_kill
                    ));
                    killed_events.write(TargetKilled {
                        target: report.target,
                        killer: report.enemy,
                        killer_position: cause.killer_position,
                        kind: cause.kind,
                    });
                }
                if let Some(key) = attack_sound {
                    sound_events.write(PlaySound {
                        key,
                        position: brain.pose.position,
                    });
                }
            }
            ContactOutcome::Ignored => {}
        }
    }
}
