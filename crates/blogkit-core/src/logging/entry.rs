//! Captured log entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One tracing event as recorded by [`CaptureLayer`](super::CaptureLayer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 timestamp (e.g., "2026-01-21T14:30:45.123Z")
    pub ts: String,

    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Module path / target (e.g., "blogkit_core::features::theme")
    pub target: String,

    /// Human-readable message
    pub msg: String,

    /// Structured fields recorded alongside the message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Value>,
}

impl LogEntry {
    /// Create a new entry stamped with the current time.
    pub fn new(level: impl Into<String>, target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            level: level.into(),
            target: target.into(),
            msg: msg.into(),
            fields: None,
        }
    }

    pub fn with_fields(mut self, fields: Value) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn is_warning_or_worse(&self) -> bool {
        matches!(self.level.as_str(), "warn" | "error")
    }

    /// Serialize to a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_serialization_skips_empty_fields() {
        let entry = LogEntry::new("info", "blogkit_core", "hello");
        let line = entry.to_json_line().unwrap();
        assert!(line.contains("\"msg\":\"hello\""));
        assert!(!line.contains("fields"));
    }

    #[test]
    fn test_warning_classification() {
        assert!(LogEntry::new("warn", "t", "m").is_warning_or_worse());
        assert!(LogEntry::new("error", "t", "m").is_warning_or_worse());
        assert!(!LogEntry::new("debug", "t", "m").is_warning_or_worse());
    }
}
