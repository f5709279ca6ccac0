//! Routing of log entries through filters and formatters to outputs.
//!
//! A [`Logger`] owns a list of [`Destination`]s. Each destination pairs one
//! [`Output`] with its own filters and formatters, so the same entry can be
//! rendered differently for the console and for the log file.

use std::borrow::Cow;

use log::{Level, Log, Metadata, Record};
use parking_lot::RwLock;

use crate::error::Result;
use crate::output::Output;

/// Where in the source code an entry was produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Source file path
    pub file: String,
    /// Enclosing function or module path
    pub function: String,
    /// Line number
    pub line: u32,
}

impl SourceLocation {
    /// Last component of `file`.
    pub fn file_name(&self) -> &str {
        self.file.rsplit(['/', '\\']).next().unwrap_or(&self.file)
    }
}

/// A single log entry as it travels through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity
    pub level: Level,
    /// Rendered message; formatters rewrite it in place
    pub message: String,
    /// Category the entry was logged under
    pub target: String,
    /// Origin of the entry
    pub location: SourceLocation,
}

impl LogEntry {
    /// Creates an entry with no source location.
    pub fn new(level: Level, target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            target: target.into(),
            location: SourceLocation::default(),
        }
    }

    /// Attaches a source location.
    pub fn with_location(
        mut self,
        file: impl Into<String>,
        function: impl Into<String>,
        line: u32,
    ) -> Self {
        self.location = SourceLocation {
            file: file.into(),
            function: function.into(),
            line,
        };
        self
    }

    /// Converts a `log` crate record.
    pub fn from_record(record: &Record<'_>) -> Self {
        Self {
            level: record.level(),
            message: record.args().to_string(),
            target: record.target().to_string(),
            location: SourceLocation {
                file: record.file().unwrap_or_default().to_string(),
                function: record.module_path().unwrap_or_default().to_string(),
                line: record.line().unwrap_or_default(),
            },
        }
    }
}

/// Decides whether an entry reaches an output at all.
pub trait Filter: Send + Sync {
    /// Identity used to deduplicate and remove filters
    fn name(&self) -> Cow<'_, str>;

    /// `false` suppresses the entry for the owning destination.
    fn should_log(&self, entry: &LogEntry) -> bool;
}

/// Rewrites an entry before it is written.
pub trait Formatter: Send + Sync {
    /// Identity used to deduplicate and remove formatters
    fn name(&self) -> Cow<'_, str>;

    /// Transforms `entry` in place, usually its message.
    fn format(&self, entry: &mut LogEntry);
}

/// One output together with the filters and formatters applied to it.
pub struct Destination {
    output: Box<dyn Output>,
    filters: Vec<Box<dyn Filter>>,
    formatters: Vec<Box<dyn Formatter>>,
}

impl Destination {
    /// Wraps `output`, seeding it with the output's default filters.
    pub fn new(output: impl Output + 'static) -> Self {
        let filters = output.default_filters();
        Self {
            output: Box::new(output),
            filters,
            formatters: Vec::new(),
        }
    }

    /// Builder-style [`add_filter`](Self::add_filter).
    pub fn filter(mut self, filter: impl Filter + 'static) -> Self {
        self.add_filter(filter);
        self
    }

    /// Builder-style [`add_formatter`](Self::add_formatter).
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.add_formatter(formatter);
        self
    }

    /// Adds `filter` unless one with the same name is present.
    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        if self.filters.iter().any(|f| f.name() == filter.name()) {
            return;
        }
        self.filters.push(Box::new(filter));
    }

    /// Removes every filter named `name`.
    pub fn remove_filter(&mut self, name: &str) {
        self.filters.retain(|f| f.name() != name);
    }

    /// Adds `formatter` unless one with the same name is present.
    pub fn add_formatter(&mut self, formatter: impl Formatter + 'static) {
        if self.formatters.iter().any(|f| f.name() == formatter.name()) {
            return;
        }
        self.formatters.push(Box::new(formatter));
    }

    /// Removes every formatter named `name`.
    pub fn remove_formatter(&mut self, name: &str) {
        self.formatters.retain(|f| f.name() != name);
    }

    /// Names of the registered filters, in order.
    pub fn filter_names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().into_owned()).collect()
    }

    /// Names of the registered formatters, in order.
    pub fn formatter_names(&self) -> Vec<String> {
        self.formatters.iter().map(|f| f.name().into_owned()).collect()
    }

    /// The wrapped output.
    pub fn output(&self) -> &dyn Output {
        self.output.as_ref()
    }

    /// Filters, then level check, then formatters on a copy, then write.
    pub fn log(&self, entry: &LogEntry) {
        if !self.filters.iter().all(|f| f.should_log(entry)) {
            return;
        }
        if !self.output.should_log(entry.level) {
            return;
        }

        let mut entry = entry.clone();
        for formatter in &self.formatters {
            formatter.format(&mut entry);
        }
        self.output.write(&entry, &entry.message);
    }
}

/// Fans entries out to every registered destination.
///
/// `Logger` implements [`log::Log`], so it can be installed as the global
/// logger with [`install`](Self::install) and fed by the `log` macros.
///
/// # Examples
///
/// ```
/// # use rolling_logger::{Logger, Destination, ConsoleOutput, LogEntry, MetadataFormatter};
/// # use log::{Level, LevelFilter};
/// let console = ConsoleOutput::stderr(LevelFilter::Info);
/// let logger = Logger::new().destination(Destination::new(console).formatter(MetadataFormatter));
/// logger.log_entry(&LogEntry::new(Level::Warn, "app", "disk almost full"));
/// ```
#[derive(Default)]
pub struct Logger {
    destinations: RwLock<Vec<Destination>>,
}

impl Logger {
    /// Logger with no destinations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`add_destination`](Self::add_destination).
    pub fn destination(self, destination: Destination) -> Self {
        self.add_destination(destination);
        self
    }

    /// Adds a destination. Entries logged afterwards reach it.
    pub fn add_destination(&self, destination: Destination) {
        self.destinations.write().push(destination);
    }

    /// Removes every destination whose output is named `name`.
    pub fn remove_destination(&self, name: &str) {
        self.destinations.write().retain(|d| d.output.name() != name);
    }

    /// Number of destinations.
    pub fn destination_count(&self) -> usize {
        self.destinations.read().len()
    }

    /// Sends `entry` to every destination.
    ///
    /// An output may log through this same logger from inside `write`, even
    /// while another thread waits to add or remove a destination. Changing
    /// the destinations from inside `write` deadlocks.
    pub fn log_entry(&self, entry: &LogEntry) {
        for destination in self.destinations.read_recursive().iter() {
            destination.log(entry);
        }
    }

    /// Flushes every output.
    pub fn flush_outputs(&self) {
        for destination in self.destinations.read_recursive().iter() {
            destination.output.flush();
        }
    }

    /// Registers this logger as the global `log` logger.
    ///
    /// `max_level` becomes `log`'s static filter; outputs still apply their
    /// own levels.
    pub fn install(self, max_level: log::LevelFilter) -> Result<()> {
        log::set_boxed_logger(Box::new(self))?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.log_entry(&LogEntry::from_record(record));
    }

    fn flush(&self) {
        self.flush_outputs();
    }
}
