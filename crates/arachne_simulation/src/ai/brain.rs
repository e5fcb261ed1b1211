//! EnemyBrain: state machine врага (Patrol / Chase / Waiting / Dead / Frozen)
//!
//! Чистая логика без ECS: `tick()` раз в fixed step, `resolve_contact()` на контакт с целью.
//! Движение делегируется `Locomotion` стратегии (probed или routed),
//! анимация через `AnimationSink`, смерть цели через `DeathNotifier`.
//!
//! Все ожидания (dwell, grace delay, death delay, freeze): countdown'ы в состоянии.
//! Countdown истёк, когда остаток <= `TIMER_TOLERANCE`: сумма f32 шагов 1/60
//! не должна съедать лишний tick.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::capabilities::{AnimationSink, DeathNotifier, KillCause, KillKind, ANIM_DEATH, ANIM_IS_CHASE};
use super::locomotion::{EdgeProbeSettings, Locomotion, LocomotionMode, Pose, StepOutcome};
use super::patrol::{has_arrived, planar_direction, PatrolPath};
use super::stomp::{Contact, StompPolicy};

/// Допуск округления для countdown'ов
const TIMER_TOLERANCE: f32 = 1e-4;

fn expired(remaining: f32) -> bool {
    remaining <= TIMER_TOLERANCE
}

/// Что делает враг после того как убил цель
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PostKillPolicy {
    /// Сразу вернуться к патрулю с ближайшего waypoint
    #[default]
    ResumePatrol,
    /// Замереть, затем полный сброс к spawn позе
    FreezeThenReset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    pub detection_range: f32,
    /// Ближе этого враг не подходит к цели (0: вплотную)
    pub stop_chase_distance: f32,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    /// Planar порог прибытия на waypoint
    pub arrival_threshold: f32,
    /// Пауза на waypoint (0: без паузы)
    pub dwell_time: f32,
    /// Grace delay перед возвратом Chase → Patrol
    pub return_to_patrol_delay: f32,
    /// Как часто пересчитывать путь к цели в Chase
    pub retarget_interval: f32,
    pub death_duration: f32,
    pub freeze_duration: f32,
    pub stomp: StompPolicy,
    pub locomotion: LocomotionMode,
    pub post_kill: PostKillPolicy,
    /// Ключ звука атаки в audio pool'е
    pub attack_sound: Option<String>,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self::probed_patroller()
    }
}

impl EnemyConfig {
    /// Паук с raycast edge probe
    pub fn probed_patroller() -> Self {
        Self {
            detection_range: 8.0,
            stop_chase_distance: 0.0,
            patrol_speed: 2.0,
            chase_speed: 3.0,
            arrival_threshold: 0.2,
            dwell_time: 0.0,
            return_to_patrol_delay: 0.0,
            retarget_interval: 0.0,
            death_duration: 1.0,
            freeze_duration: 2.0,
            stomp: StompPolicy::default(),
            locomotion: LocomotionMode::Probed(EdgeProbeSettings::default()),
            post_kill: PostKillPolicy::ResumePatrol,
            attack_sound: None,
        }
    }

    /// Паук на navigation capability
    pub fn routed_patroller() -> Self {
        Self {
            detection_range: 8.0,
            stop_chase_distance: 1.5,
            patrol_speed: 2.0,
            chase_speed: 4.0,
            arrival_threshold: 0.5,
            dwell_time: 0.0,
            return_to_patrol_delay: 2.0,
            retarget_interval: 0.1,
            death_duration: 1.0,
            freeze_duration: 2.0,
            stomp: StompPolicy::default(),
            locomotion: LocomotionMode::Routed,
            post_kill: PostKillPolicy::FreezeThenReset,
            attack_sound: Some("spiderAttack".into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum EnemyState {
    #[default]
    Patrol,
    Chase {
        /// Сколько ещё ждать возвращения цели, прежде чем уйти в патруль
        grace_remaining: f32,
    },
    Waiting {
        remaining: f32,
    },
    /// Терминальное: после таймера entity удаляется
    Dead {
        remaining: f32,
    },
    /// Убили цель: стоим, затем сброс к spawn
    Frozen {
        remaining: f32,
    },
}

impl EnemyState {
    pub fn name(&self) -> &'static str {
        match self {
            EnemyState::Patrol => "Patrol",
            EnemyState::Chase { .. } => "Chase",
            EnemyState::Waiting { .. } => "Waiting",
            EnemyState::Dead { .. } => "Dead",
            EnemyState::Frozen { .. } => "Frozen",
        }
    }

    pub fn is_patrol(&self) -> bool {
        matches!(self, EnemyState::Patrol)
    }

    pub fn is_chase(&self) -> bool {
        matches!(self, EnemyState::Chase { .. })
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, EnemyState::Dead { .. })
    }

    pub fn is_frozen(&self) -> bool {
        matches!(self, EnemyState::Frozen { .. })
    }
}

/// Что враг знает о цели в этот tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub position: Vec3,
    pub velocity: Vec3,
    /// false пока цель умирает / респавнится
    pub alive: bool,
}

impl TargetSnapshot {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            alive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickReport {
    /// Новое состояние, если сменилось в этот tick
    pub transition: Option<EnemyState>,
    /// Death delay истёк: entity нужно удалить
    pub despawn: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContactOutcome {
    /// Враг раздавлен, атакующему добавить `bounce` к скорости
    Stomped { bounce: Vec3 },
    /// Враг убил цель
    TargetKilled { attack_sound: Option<String> },
    /// Контакт не обрабатывается (враг мёртв/заморожен, цель уже умирает)
    Ignored,
}

/// Spawn снимок для полного сброса
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSnapshot {
    pub pose: Pose,
    pub patrol_index: usize,
}

#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    pub config: EnemyConfig,
    pub pose: Pose,
    state: EnemyState,
    path: Option<PatrolPath>,
    spawn: SpawnSnapshot,
    detection_range_sq: f32,
    stop_chase_distance_sq: f32,
    retarget_timer: f32,
    retarget_phase: f32,
    target_unreachable: bool,
    chase_destination: Option<Vec3>,
    collidable: bool,
    last_is_chase: Option<bool>,
    /// Индексы патрульных waypoint'ов, уже пропущенных как недостижимые
    unreachable_waypoints: Vec<usize>,
}

impl EnemyBrain {
    /// Без валидного патруля враг стоит на месте, но преследует цель
    pub fn new(config: EnemyConfig, path: Option<PatrolPath>, pose: Pose) -> Self {
        let mut pose = pose;
        let mut path = path;
        let mut patrol_index = 0;

        if let Some(path) = path.as_mut() {
            patrol_index = path.reanchor(pose.position);
            if let Some(direction) = planar_direction(pose.position, path.current_waypoint()) {
                pose.face(direction);
            }
        }

        Self {
            detection_range_sq: config.detection_range * config.detection_range,
            stop_chase_distance_sq: config.stop_chase_distance * config.stop_chase_distance,
            config,
            pose,
            state: EnemyState::Patrol,
            path,
            spawn: SpawnSnapshot { pose, patrol_index },
            retarget_timer: 0.0,
            retarget_phase: 0.0,
            target_unreachable: false,
            chase_destination: None,
            collidable: true,
            last_is_chase: None,
            unreachable_waypoints: Vec::new(),
        }
    }

    /// Сдвиг фазы retarget'а, чтобы одновременно заспавненные враги
    /// не пересчитывали путь в один и тот же tick
    pub fn stagger_retarget(&mut self, phase: f32) {
        self.retarget_phase = phase.clamp(0.0, self.config.retarget_interval.max(0.0));
        self.retarget_timer = self.retarget_phase;
    }

    pub fn tick(
        &mut self,
        target: Option<&TargetSnapshot>,
        locomotion: &mut dyn Locomotion,
        animator: &mut dyn AnimationSink,
        delta: f32,
    ) -> TickReport {
        let mut report = TickReport::default();

        match &mut self.state {
            EnemyState::Dead { remaining } => {
                *remaining -= delta;
                report.despawn = expired(*remaining);
                return report;
            }
            EnemyState::Frozen { remaining } => {
                *remaining -= delta;
                if expired(*remaining) {
                    self.reset_to_spawn(animator);
                    report.transition = Some(self.state);
                }
                return report;
            }
            _ => {}
        }

        let before = std::mem::discriminant(&self.state);
        self.retarget_timer += delta;

        let live_target = target.filter(|t| t.alive);
        match live_target {
            Some(target) => self.update_detection(target.position, locomotion, delta),
            None => {
                if self.state.is_chase() {
                    self.enter_patrol();
                }
            }
        }

        match self.state {
            EnemyState::Patrol => self.patrol_step(locomotion, delta),
            EnemyState::Chase { .. } => {
                if let Some(target) = live_target {
                    self.chase_step(target.position, locomotion, delta);
                }
            }
            EnemyState::Waiting { .. } => self.waiting_step(delta),
            EnemyState::Dead { .. } | EnemyState::Frozen { .. } => {}
        }

        self.update_animation(animator);

        if std::mem::discriminant(&self.state) != before {
            report.transition = Some(self.state);
        }
        report
    }

    /// Контакт с целью: stomp или убийство цели
    pub fn resolve_contact(
        &mut self,
        contact: &Contact,
        target: &TargetSnapshot,
        animator: &mut dyn AnimationSink,
        deaths: &mut dyn DeathNotifier,
    ) -> ContactOutcome {
        if !self.collidable || self.state.is_dead() || self.state.is_frozen() || !target.alive {
            return ContactOutcome::Ignored;
        }

        if self.config.stomp.classify(self.pose.position, contact) {
            self.die(animator);
            return ContactOutcome::Stomped {
                bounce: self.config.stomp.bounce_impulse(),
            };
        }

        deaths.notify(KillCause {
            killer_position: self.pose.position,
            kind: KillKind::EnemyContact,
        });

        match self.config.post_kill {
            PostKillPolicy::ResumePatrol => self.enter_patrol(),
            PostKillPolicy::FreezeThenReset => {
                self.state = EnemyState::Frozen {
                    remaining: self.config.freeze_duration,
                };
                self.pose.halt();
                self.chase_destination = None;
                self.set_is_chase(animator, false);
            }
        }

        ContactOutcome::TargetKilled {
            attack_sound: self.config.attack_sound.clone(),
        }
    }

    /// Полный сброс к spawn снимку (поза, курсор, направление, таймеры)
    pub fn reset_to_spawn(&mut self, animator: &mut dyn AnimationSink) {
        self.pose = self.spawn.pose;
        if let Some(path) = self.path.as_mut() {
            path.reset(self.spawn.patrol_index);
        }
        self.state = EnemyState::Patrol;
        self.retarget_timer = self.retarget_phase;
        self.target_unreachable = false;
        self.chase_destination = None;
        self.collidable = true;

        animator.reset_trigger(ANIM_DEATH);
        self.set_is_chase(animator, false);
    }

    pub fn state(&self) -> EnemyState {
        self.state
    }

    pub fn path(&self) -> Option<&PatrolPath> {
        self.path.as_ref()
    }

    pub fn spawn(&self) -> &SpawnSnapshot {
        &self.spawn
    }

    pub fn is_collidable(&self) -> bool {
        self.collidable
    }

    pub fn target_unreachable(&self) -> bool {
        self.target_unreachable
    }

    pub fn chase_destination(&self) -> Option<Vec3> {
        self.chase_destination
    }

    /// Waypoint'ы, которые патруль пропускает (каждый логируется один раз)
    pub fn unreachable_waypoints(&self) -> &[usize] {
        &self.unreachable_waypoints
    }

    /// Patrol → Chase: цель в радиусе И достижима для locomotion.
    ///
    /// Проверка достижимости здесь строже, чем просто радиус: без неё враг
    /// у края острова входит в Chase на цель с другого острова, тут же
    /// получает Unreachable и через grace delay возвращается в патруль,
    /// и так по кругу.
    ///
    /// Chase → Patrol: цель вне радиуса или недостижима дольше
    /// `return_to_patrol_delay` (countdown сбрасывается, когда цель вернулась).
    fn update_detection(&mut self, target: Vec3, locomotion: &mut dyn Locomotion, delta: f32) {
        let in_range = self.pose.position.distance_squared(target) <= self.detection_range_sq;
        let grace = self.config.return_to_patrol_delay;

        match &mut self.state {
            EnemyState::Patrol => {
                if in_range && locomotion.is_reachable(self.pose.position, target) {
                    self.enter_chase(target);
                }
            }
            EnemyState::Chase { grace_remaining } => {
                if in_range && !self.target_unreachable {
                    *grace_remaining = grace;
                    return;
                }
                *grace_remaining -= delta;
                if expired(*grace_remaining) {
                    self.enter_patrol();
                }
            }
            _ => {}
        }
    }

    fn enter_chase(&mut self, target: Vec3) {
        self.state = EnemyState::Chase {
            grace_remaining: self.config.return_to_patrol_delay,
        };
        self.chase_destination = Some(target);
        self.target_unreachable = false;
    }

    /// Возврат к патрулю всегда с ближайшего waypoint
    fn enter_patrol(&mut self) {
        self.state = EnemyState::Patrol;
        self.chase_destination = None;
        self.target_unreachable = false;
        if let Some(path) = self.path.as_mut() {
            path.reanchor(self.pose.position);
        }
    }

    fn patrol_step(&mut self, locomotion: &mut dyn Locomotion, delta: f32) {
        let Some(path) = self.path.as_mut() else {
            self.pose.halt();
            return;
        };

        let waypoint = path.current_waypoint();
        let arrived = has_arrived(self.pose.position, waypoint, self.config.arrival_threshold)
            || planar_direction(self.pose.position, waypoint).is_none();

        if arrived {
            self.pose.halt();
            if self.config.dwell_time > 0.0 {
                self.state = EnemyState::Waiting {
                    remaining: self.config.dwell_time,
                };
            } else {
                path.advance();
            }
            return;
        }

        match locomotion.step_toward(&mut self.pose, waypoint, self.config.patrol_speed, delta) {
            StepOutcome::Moved | StepOutcome::Blocked => {}
            StepOutcome::Degenerate => {
                path.advance();
            }
            StepOutcome::Unreachable => {
                let skipped = path.current_index();
                let next = path.advance();
                if !self.unreachable_waypoints.contains(&skipped) {
                    self.unreachable_waypoints.push(skipped);
                    crate::log_warning(&format!(
                        "EnemyBrain: patrol waypoint {} not reachable, skipping to {}",
                        skipped, next
                    ));
                }
            }
        }
    }

    fn chase_step(&mut self, target: Vec3, locomotion: &mut dyn Locomotion, delta: f32) {
        if self.retarget_timer >= self.config.retarget_interval {
            self.retarget_timer = 0.0;
            if locomotion.is_reachable(self.pose.position, target) {
                self.chase_destination = Some(target);
                self.target_unreachable = false;
            } else {
                // Старый destination остаётся: идём к последней достижимой точке
                self.target_unreachable = true;
            }
        }

        if self.pose.position.distance_squared(target) <= self.stop_chase_distance_sq {
            self.pose.halt();
            if let Some(direction) = planar_direction(self.pose.position, target) {
                self.pose.turn_toward(direction, delta);
            }
            return;
        }

        let Some(destination) = self.chase_destination else {
            self.pose.halt();
            return;
        };

        match locomotion.step_toward(&mut self.pose, destination, self.config.chase_speed, delta) {
            StepOutcome::Moved | StepOutcome::Degenerate => {}
            StepOutcome::Blocked | StepOutcome::Unreachable => {
                self.target_unreachable = true;
            }
        }
    }

    fn waiting_step(&mut self, delta: f32) {
        self.pose.halt();
        let EnemyState::Waiting { remaining } = &mut self.state else {
            return;
        };

        *remaining -= delta;
        if expired(*remaining) {
            if let Some(path) = self.path.as_mut() {
                path.advance();
            }
            self.state = EnemyState::Patrol;
        }
    }

    fn die(&mut self, animator: &mut dyn AnimationSink) {
        self.state = EnemyState::Dead {
            remaining: self.config.death_duration,
        };
        self.collidable = false;
        self.chase_destination = None;
        self.pose.halt();
        animator.set_trigger(ANIM_DEATH);
    }

    fn update_animation(&mut self, animator: &mut dyn AnimationSink) {
        let moving_state = self.state.is_patrol() || self.state.is_chase();
        self.set_is_chase(animator, moving_state && self.pose.is_moving());
    }

    /// IsChase отправляется только при изменении
    fn set_is_chase(&mut self, animator: &mut dyn AnimationSink, value: bool) {
        if self.last_is_chase != Some(value) {
            animator.set_bool(ANIM_IS_CHASE, value);
            self.last_is_chase = Some(value);
        }
    }
}
