//! Destinations a [`Logger`](crate::Logger) can write to.

mod console;
mod crash_reporter;
mod file;

use std::borrow::Cow;

use log::Level;

use crate::pipeline::{Filter, LogEntry};

pub use console::{ConsoleOutput, ConsoleStream};
pub use crash_reporter::{
    CrashReporter, CrashReporterMode, CrashReporterOutput, NonFatalReport, MESSAGE_KEY,
    NON_FATAL_CODE,
};
pub use file::FileOutput;

/// A sink for fully formatted log entries.
pub trait Output: Send + Sync {
    /// Identity of the output
    fn name(&self) -> Cow<'_, str>;

    /// Whether entries of `level` are written at all.
    fn should_log(&self, level: Level) -> bool;

    /// Writes `final_message`, the entry's message after all formatters ran.
    fn write(&self, entry: &LogEntry, final_message: &str);

    /// Pushes out anything buffered.
    fn flush(&self) {}

    /// Filters a [`Destination`](crate::Destination) installs for this output
    /// before any user filter.
    fn default_filters(&self) -> Vec<Box<dyn Filter>> {
        Vec::new()
    }
}
