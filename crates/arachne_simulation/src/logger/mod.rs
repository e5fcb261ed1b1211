//! Глобальный logger симуляции
//!
//! Printer подключается хостом (консоль, движок, тесты) через `set_logger`.
//! Пока printer не установлен: сообщения молча отбрасываются.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Mutex;

static LOGGER: Lazy<Mutex<Option<Box<dyn LogPrinter>>>> = Lazy::new(|| Mutex::new(None));

static LOGGER_LEVEL: Lazy<Mutex<LogLevel>> = Lazy::new(|| Mutex::new(LogLevel::Debug));

/// Ключи уже напечатанных `log_warning_once` сообщений
static WARNED_ONCE: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

pub trait LogPrinter: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);
}

pub fn set_logger(logger: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = LOGGER.lock() {
        *slot = Some(logger);
    }
}

pub fn set_logger_if_needed(logger: Box<dyn LogPrinter>) {
    if let Ok(mut slot) = LOGGER.lock() {
        if slot.is_none() {
            *slot = Some(logger);
        }
    }
}

pub fn set_log_level(level: LogLevel) {
    if let Ok(mut current) = LOGGER_LEVEL.lock() {
        *current = level;
    }
}

fn level_enabled(level: LogLevel) -> bool {
    LOGGER_LEVEL
        .lock()
        .map(|min| level >= *min)
        .unwrap_or(true)
}

pub fn log(message: &str) {
    log_with_level(LogLevel::Debug, message);
}

pub fn log_info(message: &str) {
    log_with_level(LogLevel::Info, message);
}

pub fn log_warning(message: &str) {
    log_with_level(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    log_with_level(LogLevel::Error, message);
}

/// Warning, который печатается один раз на ключ за весь процесс.
///
/// Для "missing reference" ситуаций: нет аниматора, нет navigation backend и т.п.
/// Фича деградирует молча, в лог попадает только первое обращение.
pub fn log_warning_once(key: &str, message: &str) {
    let first_time = WARNED_ONCE
        .lock()
        .map(|mut seen| seen.insert(key.to_owned()))
        .unwrap_or(false);

    if first_time {
        log_warning(message);
    }
}

/// Снимок ключей `log_warning_once` (для тестов)
#[cfg(test)]
pub(crate) fn warned_once_keys() -> Vec<String> {
    WARNED_ONCE
        .lock()
        .map(|seen| seen.iter().cloned().collect())
        .unwrap_or_default()
}

pub fn log_with_level(level: LogLevel, message: &str) {
    if !level_enabled(level) {
        return;
    }

    // timestamp добавляем здесь, printer получает готовую строку
    if let Ok(slot) = LOGGER.lock() {
        if let Some(logger) = slot.as_ref() {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            logger.log(level, &format!("[{}] {}", timestamp, message));
        }
    }
}

pub struct ConsoleLogger;

impl LogPrinter for ConsoleLogger {
    fn log(&self, level: LogLevel, message: &str) {
        println!("[{}] {}", level.as_str(), message);
    }
}

pub fn init_logger() {
    set_logger_if_needed(Box::new(ConsoleLogger));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
        assert_eq!(LogLevel::Warning.as_str(), "WARNING");
    }

    #[test]
    fn test_warning_once_tracks_keys() {
        log_warning_once("logger-test-key", "first");
        log_warning_once("logger-test-key", "second");

        let seen = WARNED_ONCE.lock().map(|s| s.contains("logger-test-key"));
        assert_eq!(seen.ok(), Some(true));
    }
}
