//! Счётчик монет + одноразовый "secret unlocked".

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    /// Сколько монет открывает секретный уровень
    pub secret_threshold: u32,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self { secret_threshold: 20 }
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CoinCounter {
    count: u32,
    threshold: u32,
    unlocked: bool,
}

impl CoinCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
            unlocked: false,
        }
    }

    /// +1 монета. Возвращает true ровно один раз: когда порог достигнут впервые
    pub fn add(&mut self) -> bool {
        self.count += 1;
        if !self.unlocked && self.count >= self.threshold {
            self.unlocked = true;
            return true;
        }
        false
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.unlocked = false;
    }
}

impl Default for CoinCounter {
    fn default() -> Self {
        Self::new(CoinConfig::default().secret_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_fires_once() {
        let mut counter = CoinCounter::new(3);

        assert!(!counter.add());
        assert!(!counter.add());
        assert!(counter.add());
        assert!(!counter.add());
        assert_eq!(counter.count(), 4);
        assert!(counter.is_unlocked());
    }

    #[test]
    fn test_reset_rearms_unlock() {
        let mut counter = CoinCounter::new(1);
        assert!(counter.add());

        counter.reset();
        assert_eq!(counter.count(), 0);
        assert!(!counter.is_unlocked());
        assert!(counter.add());
    }
}
