use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// User-facing feedback for a finished call (a toast, a status line).
pub trait Notifier: Send + Sync {
    fn notify(&self, level: Level, message: &str);
}

/// Routes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, level: Level, message: &str) {
        match level {
            Level::Success => log::info!("{}", message),
            Level::Error => log::error!("{}", message),
        }
    }
}

/// Keeps every notification, for callers that render them later.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingNotifier {
    pub fn entries(&self) -> Vec<(Level, String)> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries().iter().filter(|(l, _)| *l == level).count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, level: Level, message: &str) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push((level, message.to_string())),
            Err(poisoned) => poisoned.into_inner().push((level, message.to_string())),
        }
    }
}
