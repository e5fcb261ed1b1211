//! AI components и capability resources

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use super::capabilities::{AnimationSink, GroundProbe, Navigation};

/// Цель врагов (игрок): скорость от физики хоста + "жив ли"
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct TargetBody {
    pub velocity: Vec3,
    /// false пока цель умирает / ждёт респавна
    pub alive: bool,
}

impl Default for TargetBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            alive: true,
        }
    }
}

/// Параметры аниматора, которые хост читает каждый кадр
///
/// Если задан набор `declared`: неизвестные параметры молча игнорируются.
#[derive(Component, Debug, Clone, Default)]
pub struct AnimatorParams {
    pub bools: HashMap<String, bool>,
    /// Взведённые триггеры (хост сбрасывает после проигрывания)
    pub triggers: HashSet<String>,
    declared: Option<HashSet<String>>,
}

impl AnimatorParams {
    pub fn with_parameters(names: &[&str]) -> Self {
        Self {
            declared: Some(names.iter().map(|name| (*name).to_owned()).collect()),
            ..Default::default()
        }
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn is_triggered(&self, name: &str) -> bool {
        self.triggers.contains(name)
    }

    fn accepts(&self, name: &str) -> bool {
        self.declared
            .as_ref()
            .map_or(true, |declared| declared.contains(name))
    }
}

impl AnimationSink for AnimatorParams {
    fn set_bool(&mut self, name: &str, value: bool) {
        if self.accepts(name) {
            self.bools.insert(name.to_owned(), value);
        }
    }

    fn set_trigger(&mut self, name: &str) {
        if self.accepts(name) {
            self.triggers.insert(name.to_owned());
        }
    }

    fn reset_trigger(&mut self, name: &str) {
        self.triggers.remove(name);
    }
}

/// Navigation capability хоста (NavMesh или аналог)
#[derive(Resource)]
pub struct NavigationBackend(pub Box<dyn Navigation>);

impl NavigationBackend {
    pub fn new(navigation: impl Navigation + 'static) -> Self {
        Self(Box::new(navigation))
    }
}

/// Ground probe capability хоста (raycast по слою земли)
#[derive(Resource)]
pub struct GroundProbeBackend(pub Box<dyn GroundProbe>);

impl GroundProbeBackend {
    pub fn new(probe: impl GroundProbe + 'static) -> Self {
        Self(Box::new(probe))
    }
}
