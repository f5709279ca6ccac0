use std::borrow::Cow;
use std::io::Write;

use log::{Level, LevelFilter};

use crate::output::Output;
use crate::pipeline::LogEntry;

/// Which standard stream a [`ConsoleOutput`] writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleStream {
    /// Plain program output
    Stdout,
    /// Diagnostic stream, picked up by system log collectors
    Stderr,
}

/// Writes one line per entry to stdout or stderr.
#[derive(Debug, Clone)]
pub struct ConsoleOutput {
    max_level: LevelFilter,
    stream: ConsoleStream,
}

impl ConsoleOutput {
    /// Console output on the given stream.
    pub fn new(max_level: LevelFilter, stream: ConsoleStream) -> Self {
        Self { max_level, stream }
    }

    /// Console output on stdout.
    pub fn stdout(max_level: LevelFilter) -> Self {
        Self::new(max_level, ConsoleStream::Stdout)
    }

    /// Console output on stderr.
    pub fn stderr(max_level: LevelFilter) -> Self {
        Self::new(max_level, ConsoleStream::Stderr)
    }
}

impl Output for ConsoleOutput {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("ConsoleOutput")
    }

    fn should_log(&self, level: Level) -> bool {
        level <= self.max_level
    }

    fn write(&self, _entry: &LogEntry, final_message: &str) {
        // A broken console must not take the application down.
        let _ = match self.stream {
            ConsoleStream::Stdout => writeln!(std::io::stdout().lock(), "{final_message}"),
            ConsoleStream::Stderr => writeln!(std::io::stderr().lock(), "{final_message}"),
        };
    }

    fn flush(&self) {
        let _ = match self.stream {
            ConsoleStream::Stdout => std::io::stdout().flush(),
            ConsoleStream::Stderr => std::io::stderr().flush(),
        };
    }
}
