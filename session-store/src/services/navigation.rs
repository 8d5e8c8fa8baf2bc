use std::sync::Mutex;

/// Host hook for full-page navigations (not in-app route changes).
pub trait Navigator: Send + Sync {
    fn hard_navigate(&self, path: &str);
}

/// Navigator for hosts without a page to reload; records the intent in the log.
#[derive(Debug, Default)]
pub struct LoggingNavigator;

impl Navigator for LoggingNavigator {
    fn hard_navigate(&self, path: &str) {
        tracing::info!(path = %path, "Hard navigation requested");
    }
}

/// Keeps every requested navigation, in order.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.visited().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn hard_navigate(&self, path: &str) {
        self.visited
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(path.to_string());
    }
}
