//! Enemy AI module
//!
//! Один state machine (`EnemyBrain`: Patrol / Chase / Waiting / Dead / Frozen)
//! с подключаемой locomotion стратегией:
//! - Probed: прямое движение + edge raycast (не падаем с платформ)
//! - Routed: движение по пути от navigation capability хоста
//!
//! Stomp detection и post-kill поведение: общие для обеих стратегий.

use bevy::prelude::*;
use rand::Rng;

pub mod brain;
pub mod capabilities;
pub mod components;
pub mod events;
pub mod locomotion;
pub mod patrol;
pub mod stomp;
pub mod systems;


// Re-export основных типов
pub use brain::{
    ContactOutcome, EnemyBrain, EnemyConfig, EnemyState, PostKillPolicy, SpawnSnapshot, TargetSnapshot,
    TickReport,
};
pub use capabilities::{
    AnimationSink, DeathNotifier, GroundProbe, KillCause, KillKind, NavPath, Navigation, NullAnimator,
    OpenGround, PathStatus, Platform, PlatformLayout, ANIM_DEATH, ANIM_IS_CHASE,
};
pub use components::{AnimatorParams, GroundProbeBackend, NavigationBackend, TargetBody};
pub use events::{ContactReport, EnemyStateChanged, EnemyStomped, TargetKilled};
pub use locomotion::{EdgeProbeSettings, Locomotion, LocomotionMode, Pose, StepOutcome};
pub use patrol::{PatrolPath, PatrolPathError, TraversalPolicy};
pub use stomp::{Contact, StompPolicy};

use crate::{DeterministicRng, SimulationSet};

/// AI Plugin
///
/// Регистрирует AI системы в FixedUpdate для детерминизма.
/// Порядок выполнения:
/// 1. resolve_enemy_contacts: ContactReport → stomp / kill
/// 2. tick_enemy_brains: FSM tick, движение, despawn мёртвых
pub struct AIPlugin;

impl Plugin for AIPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ContactReport>()
            .add_event::<TargetKilled>()
            .add_event::<EnemyStomped>()
            .add_event::<EnemyStateChanged>();

        app.add_systems(
            FixedUpdate,
            (systems::resolve_enemy_contacts, systems::tick_enemy_brains)
                .chain() // Последовательное выполнение для детерминизма
                .in_set(SimulationSet::Ai),
        );
    }
}

/// Спавн врага: brain + Transform + параметры аниматора
///
/// Фаза retarget'а сдвигается через `DeterministicRng` (если есть),
/// чтобы враги одной волны не пересчитывали путь в один tick.
pub fn spawn_enemy(
    world: &mut World,
    config: EnemyConfig,
    path: Option<PatrolPath>,
    position: Vec3,
) -> Entity {
    if path.is_none() {
        crate::log_warning(&format!(
            "spawn_enemy at {:?}: no valid patrol path (need 2+ waypoints), enemy will stand still",
            position
        ));
    }

    let mut brain = EnemyBrain::new(config, path, Pose::new(position, Quat::IDENTITY));

    let interval = brain.config.retarget_interval;
    if interval > 0.0 {
        if let Some(mut rng) = world.get_resource_mut::<DeterministicRng>() {
            let phase = rng.rng.gen_range(0.0..interval);
            brain.stagger_retarget(phase);
        }
    }

    let transform = Transform::from_translation(brain.pose.position).with_rotation(brain.pose.rotation);
    world
        .spawn((
            brain,
            transform,
            AnimatorParams::with_parameters(&[ANIM_IS_CHASE, ANIM_DEATH]),
        ))
        .id()
}

/// Спавн цели врагов (игрока)
pub fn spawn_target(world: &mut World, position: Vec3) -> Entity {
    world
        .spawn((Transform::from_translation(position), TargetBody::default()))
        .id()
}
