//! # Rolling Logger
//!
//! A client-side logging library that routes log entries through filters and
//! formatters to one or more outputs, with a durable, size-rotated log file
//! writer at its core.
//!
//! ## Key Features
//!
//! * Strictly ordered file writes from any number of threads, without locks
//!   on the write path
//! * Size-based rotation that never loses or duplicates an entry
//! * Bounded retention of historical files
//! * Failures (disk full, permissions, vanished files) are reported on a
//!   side channel and never crash the host
//!
//! ## Main Components
//!
//! * `SerialTaskQueue`: single-worker FIFO queue owning worker-confined state
//! * `RotatingFileWriter`: appends, rotates and prunes log files through its queue
//! * `WriterSettings`: immutable writer configuration
//! * `Logger` / `Destination`: the filter → formatter → output pipeline
//! * `ConsoleOutput`, `FileOutput`, `CrashReporterOutput`: outputs
//!
//! ## Quick Start
//!
//! ```no_run
//! use rolling_logger::{
//!     ConsoleOutput, Destination, FileOutput, Logger, MetadataFormatter, WriterSettings,
//! };
//! use log::LevelFilter;
//!
//! let file = FileOutput::new(LevelFilter::Debug, WriterSettings::default()).unwrap();
//!
//! Logger::new()
//!     .destination(Destination::new(ConsoleOutput::stdout(LevelFilter::Info)))
//!     .destination(Destination::new(file).formatter(MetadataFormatter))
//!     .install(LevelFilter::Debug)
//!     .unwrap();
//!
//! log::info!("application started");
//! ```

pub mod diagnostics;
pub mod error;
pub mod file_writer;
pub mod filters;
pub mod output;
pub mod pipeline;
pub mod serial_queue;
pub mod settings;

pub use diagnostics::DIAGNOSTICS_TARGET;
pub use error::{Error, Result};
pub use file_writer::{list_log_files, RotatingFileWriter};
pub use filters::{MetadataFormatter, TargetFilter, TimestampFormatter};
pub use output::{
    ConsoleOutput, ConsoleStream, CrashReporter, CrashReporterMode, CrashReporterOutput, FileOutput,
    NonFatalReport, Output,
};
pub use pipeline::{Destination, Filter, Formatter, LogEntry, Logger, SourceLocation};
pub use serial_queue::SerialTaskQueue;
pub use settings::{WriterSettings, WriterSettingsBuilder};
