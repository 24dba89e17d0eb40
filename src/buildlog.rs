//! User-facing build output.
//!
//! Staging narrates what it does ("Installing dotnet-sdk 2.1.505") on
//! stdout, where the platform captures it as the staging log. That stream is
//! a stable surface: CI pipelines and platform tooling grep it, so the lines
//! come from one place and keep their exact wording. Operator diagnostics go
//! through `tracing` to stderr instead and are free to change.

use std::sync::Mutex;

/// Sink for the user-visible staging log.
pub trait BuildLog: Send + Sync {
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Writes the staging log to stdout in the classic buildpack format.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLog;

impl BuildLog for ConsoleLog {
    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn warning(&self, message: &str) {
        println!("**WARNING** {}", message);
    }

    fn error(&self, message: &str) {
        println!("**ERROR** {}", message);
    }
}

/// Discards all build output.
///
/// Used where a plan is computed without a user watching, for example when
/// the launcher re-derives the start command of an already staged app.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpLog;

impl BuildLog for NoOpLog {
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Collects the staging log in memory.
///
/// Machine-readable plan output must own stdout, so the `plan` command
/// stages against this sink and forwards the lines to diagnostics instead.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: String) {
        self.lines
            .lock()
            .expect("build log mutex poisoned")
            .push(line);
    }

    /// Everything logged so far, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .expect("build log mutex poisoned")
            .clone()
    }

    /// Whether any logged line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl BuildLog for MemoryLog {
    fn info(&self, message: &str) {
        self.push(message.to_string());
    }

    fn warning(&self, message: &str) {
        self.push(format!("**WARNING** {}", message));
    }

    fn error(&self, message: &str) {
        self.push(format!("**ERROR** {}", message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_keeps_order() {
        let log = MemoryLog::new();
        log.info("first");
        log.warning("second");
        log.error("third");

        assert_eq!(
            log.lines(),
            vec![
                "first".to_string(),
                "**WARNING** second".to_string(),
                "**ERROR** third".to_string(),
            ]
        );
    }

    #[test]
    fn test_memory_log_contains_matches_substrings() {
        let log = MemoryLog::new();
        log.info("Installing dotnet-sdk 2.1.505");

        assert!(log.contains("dotnet-sdk 2.1.505"));
        assert!(!log.contains("dotnet-runtime"));
    }
}
