use std::borrow::Cow;
use std::path::PathBuf;

use log::{Level, LevelFilter};

use crate::diagnostics::DIAGNOSTICS_TARGET;
use crate::error::Result;
use crate::file_writer::RotatingFileWriter;
use crate::filters::TargetFilter;
use crate::output::Output;
use crate::pipeline::{Filter, LogEntry};
use crate::settings::WriterSettings;

/// Sends entries to a [`RotatingFileWriter`].
///
/// Its default filter drops entries logged under
/// [`DIAGNOSTICS_TARGET`], since those describe the writer's own failures and
/// writing them back into it could loop forever.
pub struct FileOutput {
    max_level: LevelFilter,
    writer: RotatingFileWriter,
}

impl FileOutput {
    /// Starts a writer with `settings`.
    pub fn new(max_level: LevelFilter, settings: WriterSettings) -> Result<Self> {
        Ok(Self::with_writer(max_level, RotatingFileWriter::new(settings)?))
    }

    /// Uses an already built writer.
    pub fn with_writer(max_level: LevelFilter, writer: RotatingFileWriter) -> Self {
        Self { max_level, writer }
    }

    /// Log files on disk, oldest first.
    pub fn log_files(&self) -> Vec<PathBuf> {
        self.writer.list_files()
    }

    /// The underlying writer.
    pub fn writer(&self) -> &RotatingFileWriter {
        &self.writer
    }
}

impl Output for FileOutput {
    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed("FileOutput")
    }

    fn should_log(&self, level: Level) -> bool {
        level <= self.max_level
    }

    fn write(&self, _entry: &LogEntry, final_message: &str) {
        self.writer.append(final_message);
    }

    fn flush(&self) {
        // Failures were already reported on the diagnostics channel.
        let _ = self.writer.flush();
    }

    fn default_filters(&self) -> Vec<Box<dyn Filter>> {
        vec![Box::new(TargetFilter::deny([DIAGNOSTICS_TARGET]))]
    }
}
