//! Leveled operator logs for batch runs.
//!
//! Batch progress is reported as structured [`LogEntry`] values so the CLI
//! can render them and run artifacts can embed them. Entries are written to
//! stderr, keeping stdout free for JSON output.

use serde::{Deserialize, Serialize};

/// Log level for operator display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    #[serde(default)]
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    fn emit(&self) {
        let prefix = match self.level {
            LogLevel::Info => "·",
            LogLevel::Success => "✓",
            LogLevel::Warning => "⚠",
            LogLevel::Error => "✗",
        };
        let pad = "  ".repeat(self.indent as usize);
        eprintln!("{}{} {}", pad, prefix, self.message);
    }
}

/// Log an informational message.
pub fn log_info(message: impl Into<String>) {
    LogEntry::info(message).emit();
}

/// Log a success message.
pub fn log_success(message: impl Into<String>) {
    LogEntry::success(message).emit();
}

/// Log a warning.
pub fn log_warning(message: impl Into<String>) {
    LogEntry::warning(message).emit();
}

/// Log an error.
pub fn log_error(message: impl Into<String>) {
    LogEntry::error(message).emit();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let e = LogEntry::warning("careful").with_indent(2);
        assert_eq!(e.level, LogLevel::Warning);
        assert_eq!(e.indent, 2);
        assert_eq!(e.message, "careful");
    }

    #[test]
    fn test_level_serialization() {
        let e = LogEntry::success("done");
        let json = serde_json::to_string(&e).unwrap();
        assert!(json.contains("\"success\""));
    }
}
