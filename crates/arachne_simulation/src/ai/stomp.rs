//! Stomp detection
//!
//! Контакт враг ↔ цель считается stomp'ом только если выполнены ВСЕ три условия:
//! 1. центр цели выше центра врага больше чем на `height_margin`
//! 2. хотя бы одна точка контакта выше центра врага больше чем на `height_margin`
//! 3. вертикальная скорость цели (своя ИЛИ относительная) < -`falling_threshold`

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StompPolicy {
    /// Минимальное превышение по Y (метры)
    pub height_margin: f32,
    /// Минимальная скорость падения (м/с, положительное число)
    pub falling_threshold: f32,
    /// Вертикальная скорость, которую получает атакующий после stomp'а (м/с)
    pub bounce: f32,
}

impl Default for StompPolicy {
    fn default() -> Self {
        Self {
            height_margin: 0.3,
            falling_threshold: 0.3,
            bounce: 5.0,
        }
    }
}

/// Геометрия одного контакта (снимок от физики хоста)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contact {
    pub target_position: Vec3,
    pub contact_points: Vec<Vec3>,
    /// Собственная скорость цели
    pub target_velocity: Vec3,
    /// Скорость цели относительно врага
    pub relative_velocity: Vec3,
}

impl StompPolicy {
    pub fn center_above(&self, enemy_position: Vec3, contact: &Contact) -> bool {
        contact.target_position.y > enemy_position.y + self.height_margin
    }

    pub fn contact_above(&self, enemy_position: Vec3, contact: &Contact) -> bool {
        contact
            .contact_points
            .iter()
            .any(|point| point.y > enemy_position.y + self.height_margin)
    }

    pub fn falling(&self, contact: &Contact) -> bool {
        contact.target_velocity.y < -self.falling_threshold
            || contact.relative_velocity.y < -self.falling_threshold
    }

    pub fn classify(&self, enemy_position: Vec3, contact: &Contact) -> bool {
        self.center_above(enemy_position, contact)
            && self.contact_above(enemy_position, contact)
            && self.falling(contact)
    }

    /// Изменение скорости атакующего (VelocityChange, только Y)
    pub fn bounce_impulse(&self) -> Vec3 {
        Vec3::Y * self.bounce
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stomp_contact() -> Contact {
        Contact {
            target_position: Vec3::new(0.0, 1.0, 0.0),
            contact_points: vec![Vec3::new(0.1, 0.05, 0.0), Vec3::new(0.0, 0.5, 0.0)],
            target_velocity: Vec3::new(0.0, -3.0, 0.0),
            relative_velocity: Vec3::new(0.0, -3.0, 0.0),
        }
    }

    #[test]
    fn test_all_conditions_is_stomp() {
        let policy = StompPolicy::default();
        assert!(policy.classify(Vec3::ZERO, &stomp_contact()));
    }

    #[rstest]
    #[case::center_level(|c: &mut Contact| c.target_position.y = 0.3)]
    #[case::contacts_low(|c: &mut Contact| c.contact_points = vec![Vec3::new(0.0, 0.2, 0.0)])]
    #[case::no_contacts(|c: &mut Contact| c.contact_points.clear())]
    #[case::not_falling(|c: &mut Contact| {
        c.target_velocity.y = -0.1;
        c.relative_velocity.y = 0.0;
    })]
    #[case::rising(|c: &mut Contact| {
        c.target_velocity.y = 2.0;
        c.relative_velocity.y = 2.0;
    })]
    fn test_single_failed_condition_is_not_stomp(#[case] break_condition: fn(&mut Contact)) {
        let policy = StompPolicy::default();
        let mut contact = stomp_contact();
        break_condition(&mut contact);

        assert!(!policy.classify(Vec3::ZERO, &contact));
    }

    #[rstest]
    #[case(-3.0, 0.0)]
    #[case(0.0, -3.0)]
    fn test_own_or_relative_velocity_counts(#[case] own: f32, #[case] relative: f32) {
        let policy = StompPolicy::default();
        let mut contact = stomp_contact();
        contact.target_velocity.y = own;
        contact.relative_velocity.y = relative;

        assert!(policy.classify(Vec3::ZERO, &contact));
    }

    #[test]
    fn test_margin_is_relative_to_enemy_height() {
        let policy = StompPolicy::default();
        let contact = stomp_contact();

        // Враг на той же высоте что и цель: условие центра не выполнено
        assert!(!policy.classify(Vec3::new(0.0, 1.0, 0.0), &contact));
    }

    #[test]
    fn test_bounce_adds_vertical_velocity() {
        let policy = StompPolicy::default();
        let velocity = Vec3::new(1.0, -3.0, 0.0) + policy.bounce_impulse();
        assert_eq!(velocity, Vec3::new(1.0, 2.0, 0.0));
    }
}
