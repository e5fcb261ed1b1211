//! Capabilities хоста, которые AI потребляет, но не реализует
//!
//! - `Navigation`: поиск пути (NavMesh или аналог), статус Complete/Partial/Invalid
//! - `GroundProbe`: "есть ли пол под точкой" (raycast)
//! - `AnimationSink`: fire-and-forget параметры аниматора
//! - `DeathNotifier`: сообщить что цель убита (жизни и респавн не наша забота)
//!
//! `OpenGround` и `PlatformLayout`: простые реализации для headless симуляции и тестов.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Bool параметр: враг в движении (patrol или chase)
pub const ANIM_IS_CHASE: &str = "IsChase";
/// Trigger: смерть врага
pub const ANIM_DEATH: &str = "Death";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    /// Путь доходит до цели
    Complete,
    /// Путь обрывается до цели (цель вне walkable area)
    Partial,
    /// Старт вне walkable area
    Invalid,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavPath {
    pub status: PathStatus,
    pub corners: Vec<Vec3>,
}

impl NavPath {
    pub fn invalid() -> Self {
        Self {
            status: PathStatus::Invalid,
            corners: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == PathStatus::Complete
    }
}

pub trait Navigation: Send + Sync {
    /// Не блокирует: ответ сразу
    fn find_path(&self, from: Vec3, to: Vec3) -> NavPath;

    /// Пройти по углам пути не больше `max_distance` от `from`
    fn move_along(&self, from: Vec3, path: &NavPath, max_distance: f32) -> Vec3 {
        let mut position = from;
        let mut budget = max_distance.max(0.0);

        for corner in &path.corners {
            let segment = *corner - position;
            let length = segment.length();
            if length <= f32::EPSILON {
                continue;
            }
            if length >= budget {
                return position + segment / length * budget;
            }
            position = *corner;
            budget -= length;
        }

        position
    }
}

pub trait GroundProbe: Send + Sync {
    fn is_surface_below(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool;
}

/// Отсутствующий параметр аниматора молча игнорируется реализацией
pub trait AnimationSink {
    fn set_bool(&mut self, name: &str, value: bool);
    fn set_trigger(&mut self, name: &str);
    fn reset_trigger(&mut self, _name: &str) {}
}

/// Аниматор не назначен
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAnimator;

impl AnimationSink for NullAnimator {
    fn set_bool(&mut self, _name: &str, _value: bool) {}
    fn set_trigger(&mut self, _name: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KillKind {
    EnemyContact,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KillCause {
    pub killer_position: Vec3,
    pub kind: KillKind,
}

pub trait DeathNotifier {
    fn notify(&mut self, cause: KillCause);
}

/// Сбор уведомлений для последующей отправки событиями
impl DeathNotifier for Vec<KillCause> {
    fn notify(&mut self, cause: KillCause) {
        self.push(cause);
    }
}

/// Бесконечная плоскость: пол везде, любой путь прямой и полный
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenGround;

impl Navigation for OpenGround {
    fn find_path(&self, from: Vec3, to: Vec3) -> NavPath {
        NavPath {
            status: PathStatus::Complete,
            corners: vec![from, to],
        }
    }
}

impl GroundProbe for OpenGround {
    fn is_surface_below(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> bool {
        true
    }
}

/// Прямоугольная платформа (XZ) на заданной высоте
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
}

impl Platform {
    pub fn contains(&self, position: Vec3) -> bool {
        position.x >= self.min.x
            && position.x <= self.max.x
            && position.z >= self.min.y
            && position.z <= self.max.y
    }

    /// Ближайшая точка платформы к `position` (на высоте платформы)
    pub fn clamp(&self, position: Vec3) -> Vec3 {
        Vec3::new(
            position.x.clamp(self.min.x, self.max.x),
            self.height,
            position.z.clamp(self.min.y, self.max.y),
        )
    }
}

/// Набор изолированных платформ: ходить можно только в пределах одной
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformLayout {
    pub platforms: Vec<Platform>,
}

impl PlatformLayout {
    pub fn new(platforms: Vec<Platform>) -> Self {
        Self { platforms }
    }

    /// Платформа под точкой; при перекрытии: ближайшая по высоте
    pub fn platform_at(&self, position: Vec3) -> Option<(usize, &Platform)> {
        self.platforms
            .iter()
            .enumerate()
            .filter(|(_, platform)| platform.contains(position))
            .min_by(|(_, a), (_, b)| {
                let da = (a.height - position.y).abs();
                let db = (b.height - position.y).abs();
                da.total_cmp(&db)
            })
    }
}

impl Navigation for PlatformLayout {
    fn find_path(&self, from: Vec3, to: Vec3) -> NavPath {
        let Some((start_index, start)) = self.platform_at(from) else {
            return NavPath::invalid();
        };

        match self.platform_at(to) {
            Some((index, _)) if index == start_index => NavPath {
                status: PathStatus::Complete,
                corners: vec![from, to],
            },
            _ => NavPath {
                status: PathStatus::Partial,
                corners: vec![from, start.clamp(to)],
            },
        }
    }
}

impl GroundProbe for PlatformLayout {
    /// Только вертикальные лучи: пол есть, если платформа под `origin`
    /// попадает в отрезок луча по высоте.
    fn is_surface_below(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> bool {
        let end = origin + direction.normalize_or_zero() * max_distance;
        let low = origin.y.min(end.y);
        let high = origin.y.max(end.y);

        self.platforms
            .iter()
            .any(|platform| platform.contains(origin) && platform.height >= low && platform.height <= high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_islands() -> PlatformLayout {
        PlatformLayout::new(vec![
            Platform {
                min: Vec2::new(-5.0, -5.0),
                max: Vec2::new(5.0, 5.0),
                height: 0.0,
            },
            Platform {
                min: Vec2::new(10.0, -5.0),
                max: Vec2::new(20.0, 5.0),
                height: 0.0,
            },
        ])
    }

    #[test]
    fn test_path_status_on_islands() {
        let layout = two_islands();

        let same = layout.find_path(Vec3::ZERO, Vec3::new(4.0, 0.0, 4.0));
        assert_eq!(same.status, PathStatus::Complete);

        let across = layout.find_path(Vec3::ZERO, Vec3::new(15.0, 0.0, 0.0));
        assert_eq!(across.status, PathStatus::Partial);
        assert_eq!(across.corners.last(), Some(&Vec3::new(5.0, 0.0, 0.0)));

        let outside = layout.find_path(Vec3::new(7.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(outside.status, PathStatus::Invalid);
    }

    #[test]
    fn test_probe_finds_edge() {
        let layout = two_islands();

        assert!(layout.is_surface_below(Vec3::new(4.5, 0.5, 0.0), Vec3::NEG_Y, 1.2));
        assert!(!layout.is_surface_below(Vec3::new(5.5, 0.5, 0.0), Vec3::NEG_Y, 1.2));
        // Луч слишком короткий, пол ниже
        assert!(!layout.is_surface_below(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 1.2));
    }

    #[test]
    fn test_move_along_walks_corners() {
        let path = NavPath {
            status: PathStatus::Complete,
            corners: vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 2.0)],
        };

        let moved = OpenGround.move_along(Vec3::ZERO, &path, 3.0);
        assert!((moved - Vec3::new(2.0, 0.0, 1.0)).length() < 1e-5);

        let overshoot = OpenGround.move_along(Vec3::ZERO, &path, 100.0);
        assert_eq!(overshoot, Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_death_notifier_collects() {
        let mut causes: Vec<KillCause> = Vec::new();
        causes.notify(KillCause {
            killer_position: Vec3::ONE,
            kind: KillKind::EnemyContact,
        });
        assert_eq!(causes.len(), 1);
    }
}
