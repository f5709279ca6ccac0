//! Built-in [`Filter`] and [`Formatter`] implementations.

use std::borrow::Cow;

use chrono::Local;

use crate::pipeline::{Filter, Formatter, LogEntry};

/// Accepts or rejects entries by target prefix.
///
/// A deny filter rejects entries whose target starts with any listed prefix;
/// an allow filter rejects everything else.
#[derive(Debug, Clone)]
pub struct TargetFilter {
    prefixes: Vec<String>,
    allow: bool,
}

impl TargetFilter {
    /// Rejects entries under any of `prefixes`.
    pub fn deny<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            allow: false,
        }
    }

    /// Accepts only entries under one of `prefixes`.
    pub fn allow<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            allow: true,
        }
    }

    fn matches(&self, target: &str) -> bool {
        self.prefixes.iter().any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl Filter for TargetFilter {
    fn name(&self) -> Cow<'_, str> {
        let kind = if self.allow { "allow" } else { "deny" };
        Cow::Owned(format!("TargetFilter({kind}:{})", self.prefixes.join(",")))
    }

    fn should_log(&self, entry: &LogEntry) -> bool {
        self.matches(&entry.target) == self.allow
    }
}

/// Prefixes the message with level and origin:
/// `[LEVEL] file:line function - message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataFormatter;

impl Formatter for MetadataFormatter {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("MetadataFormatter")
    }

    fn format(&self, entry: &mut LogEntry) {
        let location = &entry.location;
        entry.message = format!(
            "[{}] {}:{} {} - {}",
            entry.level,
            location.file_name(),
            location.line,
            location.function,
            entry.message
        );
    }
}

/// Prefixes the message with the local time.
#[derive(Debug, Clone)]
pub struct TimestampFormatter {
    format: String,
}

impl TimestampFormatter {
    /// `format` is a chrono strftime string.
    pub fn new(format: impl Into<String>) -> Self {
        Self { format: format.into() }
    }
}

impl Default for TimestampFormatter {
    fn default() -> Self {
        Self::new("%Y-%m-%d %H:%M:%S%.3f")
    }
}

impl Formatter for TimestampFormatter {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("TimestampFormatter")
    }

    fn format(&self, entry: &mut LogEntry) {
        entry.message = format!("{} {}", Local::now().format(&self.format), entry.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_deny_filter() {
        let filter = TargetFilter::deny(["noisy"]);
        assert!(!filter.should_log(&LogEntry::new(Level::Info, "noisy::db", "x")));
        assert!(filter.should_log(&LogEntry::new(Level::Info, "app", "x")));
    }

    #[test]
    fn test_allow_filter() {
        let filter = TargetFilter::allow(["app", "net"]);
        assert!(filter.should_log(&LogEntry::new(Level::Info, "net::http", "x")));
        assert!(!filter.should_log(&LogEntry::new(Level::Info, "db", "x")));
    }

    #[test]
    fn test_metadata_formatter() {
        let mut entry = LogEntry::new(Level::Warn, "app", "low disk")
            .with_location("src/storage/disk.rs", "app::storage", 42);
        MetadataFormatter.format(&mut entry);
        assert_eq!(entry.message, "[WARN] disk.rs:42 app::storage - low disk");
    }

    #[test]
    fn test_timestamp_formatter_keeps_message() {
        let mut entry = LogEntry::new(Level::Info, "app", "hello");
        TimestampFormatter::new("%Y").format(&mut entry);
        assert!(entry.message.ends_with(" hello"));
        assert!(entry.message.starts_with(&Local::now().format("%Y").to_string()));
    }
}
