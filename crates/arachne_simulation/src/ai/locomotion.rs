//! Locomotion strategies: как враг физически идёт к точке
//!
//! Один state machine (`EnemyBrain`), две стратегии передвижения:
//! - `ProbedLocomotion`: прямое движение + raycast "есть ли пол впереди"
//! - `RoutedLocomotion`: движение по пути от `Navigation` capability
//!
//! Стратегия не знает про состояния AI: только "шагни к точке" и "достижима ли точка".

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::capabilities::{GroundProbe, Navigation};
use super::patrol::{planar_direction, planar_distance_sq};

/// Скорость поворота (slerp factor в секунду)
pub const TURN_RATE: f32 = 10.0;

/// Поза врага: position + rotation + текущая скорость.
///
/// Forward = -Z (конвенция Bevy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            velocity: Vec3::ZERO,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Плавный поворот к планарному направлению
    pub fn turn_toward(&mut self, direction: Vec3, delta: f32) {
        if let Some(target) = facing(direction) {
            self.rotation = self.rotation.slerp(target, (TURN_RATE * delta).min(1.0));
        }
    }

    /// Мгновенный поворот (spawn)
    pub fn face(&mut self, direction: Vec3) {
        if let Some(target) = facing(direction) {
            self.rotation = target;
        }
    }

    pub fn halt(&mut self) {
        self.velocity = Vec3::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        self.velocity.length_squared() > 0.01
    }

    fn translate(&mut self, displacement: Vec3, delta: f32) {
        self.position += displacement;
        self.velocity = if delta > 0.0 {
            displacement / delta
        } else {
            Vec3::ZERO
        };
    }
}

fn facing(direction: Vec3) -> Option<Quat> {
    let planar = Vec3::new(direction.x, 0.0, direction.z);
    if planar.length_squared() <= f32::EPSILON {
        return None;
    }
    Some(Quat::from_rotation_y(f32::atan2(-planar.x, -planar.z)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Сдвинулись к цели
    Moved,
    /// Цель совпадает с позицией в плоскости
    Degenerate,
    /// Нет пола впереди: не двигаемся, но поворачиваемся
    Blocked,
    /// Нет полного пути до цели
    Unreachable,
}

pub trait Locomotion {
    fn step_toward(&mut self, pose: &mut Pose, target: Vec3, speed: f32, delta: f32) -> StepOutcome;

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool;
}

/// Настройки edge probe (raycast перед врагом)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeProbeSettings {
    /// Насколько впереди проверяем пол
    pub check_distance: f32,
    /// Высота старта луча над врагом
    pub ray_height: f32,
    /// Длина луча вниз
    pub ray_depth: f32,
}

impl Default for EdgeProbeSettings {
    fn default() -> Self {
        Self {
            check_distance: 0.6,
            ray_height: 0.5,
            ray_depth: 1.2,
        }
    }
}

pub struct ProbedLocomotion<'a> {
    pub probe: &'a dyn GroundProbe,
    pub settings: EdgeProbeSettings,
}

impl ProbedLocomotion<'_> {
    fn ground_ahead(&self, position: Vec3, direction: Vec3) -> bool {
        let origin = position
            + direction * self.settings.check_distance
            + Vec3::Y * self.settings.ray_height;
        self.probe
            .is_surface_below(origin, Vec3::NEG_Y, self.settings.ray_depth)
    }
}

impl Locomotion for ProbedLocomotion<'_> {
    fn step_toward(&mut self, pose: &mut Pose, target: Vec3, speed: f32, delta: f32) -> StepOutcome {
        let Some(direction) = planar_direction(pose.position, target) else {
            pose.halt();
            return StepOutcome::Degenerate;
        };

        if !self.ground_ahead(pose.position, direction) {
            pose.halt();
            pose.turn_toward(direction, delta);
            return StepOutcome::Blocked;
        }

        // Не перескакиваем цель
        let remaining = planar_distance_sq(pose.position, target).sqrt();
        let step = (speed * delta).min(remaining);
        pose.translate(direction * step, delta);
        pose.turn_toward(direction, delta);
        StepOutcome::Moved
    }

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool {
        match planar_direction(from, to) {
            Some(direction) => self.ground_ahead(from, direction),
            None => true,
        }
    }
}

pub struct RoutedLocomotion<'a> {
    pub navigation: &'a dyn Navigation,
}

impl Locomotion for RoutedLocomotion<'_> {
    fn step_toward(&mut self, pose: &mut Pose, target: Vec3, speed: f32, delta: f32) -> StepOutcome {
        let path = self.navigation.find_path(pose.position, target);
        if !path.is_complete() {
            pose.halt();
            return StepOutcome::Unreachable;
        }

        let next = self
            .navigation
            .move_along(pose.position, &path, (speed * delta).max(0.0));
        let Some(direction) = planar_direction(pose.position, next) else {
            pose.halt();
            return StepOutcome::Degenerate;
        };

        let displacement = next - pose.position;
        pose.translate(displacement, delta);
        pose.turn_toward(direction, delta);
        StepOutcome::Moved
    }

    fn is_reachable(&self, from: Vec3, to: Vec3) -> bool {
        self.navigation.find_path(from, to).is_complete()
    }
}

/// Какую стратегию использует враг
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LocomotionMode {
    Probed(EdgeProbeSettings),
    Routed,
}

impl Default for LocomotionMode {
    fn default() -> Self {
        LocomotionMode::Probed(EdgeProbeSettings::default())
    }
}

/// Собрать стратегию поверх capabilities хоста на время одного вызова
pub fn with_locomotion<R>(
    mode: LocomotionMode,
    probe: &dyn GroundProbe,
    navigation: &dyn Navigation,
    f: impl FnOnce(&mut dyn Locomotion) -> R,
) -> R {
    match mode {
        LocomotionMode::Probed(settings) => f(&mut ProbedLocomotion { probe, settings }),
        LocomotionMode::Routed => f(&mut RoutedLocomotion { navigation }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::capabilities::{OpenGround, Platform, PlatformLayout};
    use approx::assert_relative_eq;

    fn island() -> PlatformLayout {
        PlatformLayout::new(vec![Platform {
            min: Vec2::new(-5.0, -5.0),
            max: Vec2::new(5.0, 5.0),
            height: 0.0,
        }])
    }

    #[test]
    fn test_face_points_forward_at_direction() {
        let mut pose = Pose::default();
        pose.face(Vec3::X);
        let forward = pose.forward();

        assert_relative_eq!(forward.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(forward.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_probed_step_clamped_to_target() {
        let mut locomotion = ProbedLocomotion {
            probe: &OpenGround,
            settings: EdgeProbeSettings::default(),
        };
        let mut pose = Pose::default();

        let outcome = locomotion.step_toward(&mut pose, Vec3::new(1.0, 0.0, 0.0), 2.0, 1.0);
        assert_eq!(outcome, StepOutcome::Moved);
        assert_eq!(pose.position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_probed_halts_at_ledge_but_turns() {
        let layout = island();
        let mut locomotion = ProbedLocomotion {
            probe: &layout,
            settings: EdgeProbeSettings::default(),
        };
        // Стоим у края, смотрим в -Z, цель за краем по +X
        let mut pose = Pose::new(Vec3::new(4.8, 0.0, 0.0), Quat::IDENTITY);
        pose.velocity = Vec3::X;

        let outcome = locomotion.step_toward(&mut pose, Vec3::new(9.0, 0.0, 0.0), 2.0, 0.1);

        assert_eq!(outcome, StepOutcome::Blocked);
        assert_eq!(pose.position, Vec3::new(4.8, 0.0, 0.0));
        assert_eq!(pose.velocity, Vec3::ZERO);
        assert!(pose.rotation != Quat::IDENTITY);
        assert!(pose.forward().x > 0.0);
    }

    #[test]
    fn test_probed_degenerate_direction() {
        let mut locomotion = ProbedLocomotion {
            probe: &OpenGround,
            settings: EdgeProbeSettings::default(),
        };
        let mut pose = Pose::new(Vec3::new(1.0, 0.0, 1.0), Quat::IDENTITY);

        let outcome = locomotion.step_toward(&mut pose, Vec3::new(1.0, 3.0, 1.0), 2.0, 0.1);
        assert_eq!(outcome, StepOutcome::Degenerate);
    }

    #[test]
    fn test_routed_unreachable_target() {
        let layout = island();
        let mut locomotion = RoutedLocomotion { navigation: &layout };
        let mut pose = Pose::default();

        assert!(!locomotion.is_reachable(Vec3::ZERO, Vec3::new(9.0, 0.0, 0.0)));
        assert_eq!(
            locomotion.step_toward(&mut pose, Vec3::new(9.0, 0.0, 0.0), 2.0, 0.1),
            StepOutcome::Unreachable
        );
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn test_routed_moves_along_path() {
        let layout = island();
        let mut locomotion = RoutedLocomotion { navigation: &layout };
        let mut pose = Pose::default();

        let outcome = locomotion.step_toward(&mut pose, Vec3::new(0.0, 0.0, 4.0), 2.0, 0.5);
        assert_eq!(outcome, StepOutcome::Moved);
        assert_relative_eq!(pose.position.z, 1.0, epsilon = 1e-5);
        assert!(pose.is_moving());
    }

    #[test]
    fn test_with_locomotion_dispatches_mode() {
        let layout = island();
        let far = Vec3::new(9.0, 0.0, 0.0);

        let routed = with_locomotion(LocomotionMode::Routed, &OpenGround, &layout, |l| {
            l.is_reachable(Vec3::ZERO, far)
        });
        let probed = with_locomotion(LocomotionMode::default(), &OpenGround, &layout, |l| {
            l.is_reachable(Vec3::ZERO, far)
        });

        assert!(!routed);
        assert!(probed);
    }
}
