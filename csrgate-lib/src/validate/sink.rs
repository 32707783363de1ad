//! Operational warnings raised while checks run.

use std::sync::Mutex;

/// Receives warnings that do not reject a request but likely point at a
/// misconfigured policy.
pub trait WarningSink: Send + Sync {
    fn warn(&self, check: &'static str, message: &str);
}

/// Forwards warnings to `tracing` at WARN level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl WarningSink for TracingSink {
    fn warn(&self, check: &'static str, message: &str) {
        tracing::warn!(check, "{}", message);
    }
}

/// Keeps warnings in memory, in the order they were raised.
#[derive(Debug, Default)]
pub struct RecordingSink {
    warnings: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the `(check, message)` pairs recorded so far.
    pub fn warnings(&self) -> Vec<(&'static str, String)> {
        match self.warnings.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl WarningSink for RecordingSink {
    fn warn(&self, check: &'static str, message: &str) {
        let mut guard = match self.warnings.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((check, message.to_string()));
    }
}
