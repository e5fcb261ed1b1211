//! Patrol path: упорядоченные waypoints + курсор
//!
//! Все расстояния: в плоскости земли (XZ). Высота игнорируется,
//! чтобы рампы и ступеньки под waypoint'ами не ломали логику прибытия.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Минимум waypoints для валидного патруля
pub const MIN_WAYPOINTS: usize = 2;

/// Направления короче этого (в квадрате) считаются вырожденными
const DEGENERATE_DIRECTION_SQ: f32 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TraversalPolicy {
    /// 0 → 1 → … → n-1 → 0
    #[default]
    Loop,
    /// 0 → 1 → … → n-1 → n-2 → … → 0 → 1
    PingPong,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatrolPathError {
    #[error("patrol path needs at least 2 waypoints, got {found}")]
    TooFewWaypoints { found: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatrolPath {
    waypoints: Vec<Vec3>,
    current: usize,
    /// +1 / -1, используется только в PingPong
    direction: i32,
    policy: TraversalPolicy,
}

impl PatrolPath {
    pub fn new(waypoints: Vec<Vec3>, policy: TraversalPolicy) -> Result<Self, PatrolPathError> {
        if waypoints.len() < MIN_WAYPOINTS {
            return Err(PatrolPathError::TooFewWaypoints {
                found: waypoints.len(),
            });
        }

        Ok(Self {
            waypoints,
            current: 0,
            direction: 1,
            policy,
        })
    }

    /// O(n) поиск ближайшего waypoint (planar squared distance)
    pub fn nearest_index_to(&self, position: Vec3) -> usize {
        let mut best_index = 0;
        let mut best_sq = f32::MAX;

        for (index, waypoint) in self.waypoints.iter().enumerate() {
            let sq = planar_distance_sq(position, *waypoint);
            if sq < best_sq {
                best_sq = sq;
                best_index = index;
            }
        }

        best_index
    }

    /// Следующий waypoint по политике обхода.
    ///
    /// PingPong разворачивается ровно на индексах 0 и n-1.
    pub fn advance(&mut self) -> usize {
        let last = self.waypoints.len() - 1;

        match self.policy {
            TraversalPolicy::Loop => {
                self.current = (self.current + 1) % self.waypoints.len();
            }
            TraversalPolicy::PingPong => {
                if self.current >= last {
                    self.direction = -1;
                } else if self.current == 0 {
                    self.direction = 1;
                }
                self.current = if self.direction > 0 {
                    (self.current + 1).min(last)
                } else {
                    self.current.saturating_sub(1)
                };
            }
        }

        self.current
    }

    /// Переякорить курсор на ближайший waypoint (направление не трогаем)
    pub fn reanchor(&mut self, position: Vec3) -> usize {
        self.current = self.nearest_index_to(position);
        self.current
    }

    /// Полный сброс: курсор на `index`, направление вперёд
    pub fn reset(&mut self, index: usize) {
        self.current = index.min(self.waypoints.len() - 1);
        self.direction = 1;
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_waypoint(&self) -> Vec3 {
        self.waypoints
            .get(self.current)
            .copied()
            .unwrap_or(Vec3::ZERO)
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn policy(&self) -> TraversalPolicy {
        self.policy
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Squared distance в плоскости XZ
pub fn planar_distance_sq(a: Vec3, b: Vec3) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx * dx + dz * dz
}

/// Нормализованное направление `from → to` в плоскости XZ.
///
/// `None` если точки совпадают в плоскости (вырожденное направление).
pub fn planar_direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    let delta = Vec3::new(to.x - from.x, 0.0, to.z - from.z);
    if delta.length_squared() < DEGENERATE_DIRECTION_SQ {
        return None;
    }
    Some(delta.normalize())
}

/// Planar тест прибытия с фиксированным порогом
pub fn has_arrived(position: Vec3, waypoint: Vec3, threshold: f32) -> bool {
    planar_distance_sq(position, waypoint) <= threshold * threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc(policy: TraversalPolicy) -> PatrolPath {
        let path = PatrolPath::new(
            vec![Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)],
            policy,
        );
        match path {
            Ok(path) => path,
            Err(err) => panic!("{}", err),
        }
    }

    #[test]
    fn test_too_few_waypoints() {
        assert_eq!(
            PatrolPath::new(vec![Vec3::ZERO], TraversalPolicy::Loop),
            Err(PatrolPathError::TooFewWaypoints { found: 1 })
        );
    }

    #[test]
    fn test_loop_returns_to_start_after_len_advances() {
        let mut path = abc(TraversalPolicy::Loop);
        path.reset(1);
        let start = path.current_index();

        for _ in 0..path.len() {
            path.advance();
        }
        assert_eq!(path.current_index(), start);
    }

    #[test]
    fn test_ping_pong_sequence() {
        let mut path = abc(TraversalPolicy::PingPong);
        let sequence: Vec<usize> = (0..8).map(|_| path.advance()).collect();

        // старт с 0: 0→1→2→1→0→1→2→1→0
        assert_eq!(sequence, vec![1, 2, 1, 0, 1, 2, 1, 0]);
    }

    #[test]
    fn test_ping_pong_direction_flips_exactly_at_endpoints() {
        let mut path = abc(TraversalPolicy::PingPong);
        assert_eq!(path.direction(), 1);

        path.advance(); // 1
        assert_eq!(path.direction(), 1);
        path.advance(); // 2
        assert_eq!(path.direction(), 1);
        path.advance(); // разворот на 2 → 1
        assert_eq!(path.direction(), -1);
        path.advance(); // 0
        assert_eq!(path.direction(), -1);
        path.advance(); // разворот на 0 → 1
        assert_eq!(path.direction(), 1);
    }

    #[test]
    fn test_nearest_ignores_height() {
        let path = abc(TraversalPolicy::Loop);

        // Сильно выше второго waypoint, но по XZ ближе всего к нему
        assert_eq!(path.nearest_index_to(Vec3::new(5.4, 30.0, 0.2)), 1);
        assert_eq!(path.nearest_index_to(Vec3::new(9.0, -4.0, 0.0)), 2);
    }

    #[test]
    fn test_reset_restores_forward_direction() {
        let mut path = abc(TraversalPolicy::PingPong);
        path.reset(2);
        path.advance();
        assert_eq!(path.direction(), -1);

        path.reset(0);
        assert_eq!(path.current_index(), 0);
        assert_eq!(path.direction(), 1);
    }

    #[test]
    fn test_planar_helpers() {
        assert!(has_arrived(Vec3::new(0.1, 5.0, 0.1), Vec3::ZERO, 0.2));
        assert!(!has_arrived(Vec3::new(0.3, 0.0, 0.0), Vec3::ZERO, 0.2));
        assert_eq!(planar_direction(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)), None);
        assert_eq!(
            planar_direction(Vec3::ZERO, Vec3::new(0.0, 7.0, 4.0)),
            Some(Vec3::Z)
        );
    }
}
