use std::borrow::Cow;
use std::collections::BTreeMap;

use log::Level;

use crate::output::Output;
use crate::pipeline::LogEntry;

/// Error code attached to every non-fatal report.
pub const NON_FATAL_CODE: i64 = -1001;

/// User-info key holding the log message in a non-fatal report.
pub const MESSAGE_KEY: &str = "Log message";

/// A non-fatal error as handed to a crash reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonFatalReport {
    /// `"<file name> <function> <line>"` of the entry's origin
    pub domain: String,
    /// Always [`NON_FATAL_CODE`]
    pub code: i64,
    /// Extra key/value pairs; carries the message under [`MESSAGE_KEY`]
    pub user_info: BTreeMap<String, String>,
}

/// Bridge to a third-party crash-reporting SDK, implemented by the host.
///
/// Anything passed here may leave the device, so entries must not carry
/// personal data.
pub trait CrashReporter: Send + Sync {
    /// Attaches a breadcrumb line to the next crash report.
    fn log(&self, message: &str);

    /// Records a non-fatal error.
    fn record_non_fatal(&self, report: NonFatalReport);
}

/// What a [`CrashReporterOutput`] forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrashReporterMode {
    /// Only entries at `non_fatal_from` or more severe, as non-fatals.
    OnlyNonFatals {
        /// Least severe level reported as a non-fatal
        non_fatal_from: Level,
    },
    /// Breadcrumbs from `log_from`, non-fatals from `non_fatal_from`.
    NonFatalsWithLog {
        /// Least severe level sent as a breadcrumb
        log_from: Level,
        /// Least severe level reported as a non-fatal
        non_fatal_from: Level,
    },
}

impl CrashReporterMode {
    fn non_fatal_from(&self) -> Level {
        match *self {
            CrashReporterMode::OnlyNonFatals { non_fatal_from }
            | CrashReporterMode::NonFatalsWithLog { non_fatal_from, .. } => non_fatal_from,
        }
    }
}

/// Forwards entries to a [`CrashReporter`].
pub struct CrashReporterOutput<R> {
    mode: CrashReporterMode,
    reporter: R,
}

impl<R: CrashReporter> CrashReporterOutput<R> {
    /// Output forwarding to `reporter` according to `mode`.
    pub fn new(mode: CrashReporterMode, reporter: R) -> Self {
        Self { mode, reporter }
    }

    /// The wrapped reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }
}

impl<R: CrashReporter> Output for CrashReporterOutput<R> {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("CrashReporterOutput")
    }

    // Level selection depends on the mode and happens in `write`.
    fn should_log(&self, _level: Level) -> bool {
        true
    }

    fn write(&self, entry: &LogEntry, final_message: &str) {
        if let CrashReporterMode::NonFatalsWithLog { log_from, .. } = self.mode {
            if entry.level <= log_from {
                self.reporter.log(final_message);
            }
        }

        if entry.level > self.mode.non_fatal_from() {
            return;
        }

        let location = &entry.location;
        let domain = format!("{} {} {}", location.file_name(), location.function, location.line);
        let user_info = BTreeMap::from([(MESSAGE_KEY.to_string(), final_message.to_string())]);

        self.reporter.record_non_fatal(NonFatalReport {
            domain,
            code: NON_FATAL_CODE,
            user_info,
        });
    }
}
