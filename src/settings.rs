use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;

use crate::error::{Error, Result};

/// Configuration of a [`RotatingFileWriter`](crate::RotatingFileWriter).
///
/// Settings are fixed once the writer is built and shared read-only between
/// the caller and the worker thread.
///
/// # Examples
///
/// ```
/// # use rolling_logger::WriterSettings;
/// let settings = WriterSettings::builder()
///     .folder_name("Diagnostics")
///     .max_file_size(64 * 1024)
///     .file_size_to_open(32 * 1024)
///     .max_file_count(3)
///     .build()
///     .unwrap();
/// assert_eq!(settings.file_extension, "log");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterSettings {
    /// Name of the storage folder, created under `root_directory`
    pub folder_name: String,
    /// chrono format used to name new files
    pub file_name_date_format: String,
    /// Extension of log files, without the dot
    pub file_extension: String,
    /// chrono format of the timestamp written after the session separator
    pub date_format: String,
    /// Written after every entry
    pub entry_separator: String,
    /// Written once each time a file is opened by a writer
    pub session_separator: String,
    /// A file at or above this many bytes triggers rotation
    pub max_file_size: u64,
    /// The most recent file is reused when it is below this many bytes
    pub file_size_to_open: u64,
    /// Number of historical files kept besides the newest one
    pub max_file_count: usize,
    /// Parent of the storage folder; the user's document directory when `None`
    pub root_directory: Option<PathBuf>,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            folder_name: "Log".to_string(),
            file_name_date_format: "%Y_%m_%d_%H_%M_%S".to_string(),
            file_extension: "log".to_string(),
            date_format: "%Y.%m.%d %H:%M:%S %z".to_string(),
            entry_separator: "\n\n".to_string(),
            session_separator: "\nSession started -".to_string(),
            max_file_size: 1_048_576,
            file_size_to_open: 948_576,
            max_file_count: 5,
            root_directory: None,
        }
    }
}

impl WriterSettings {
    /// Starts a builder seeded with the default settings.
    pub fn builder() -> WriterSettingsBuilder {
        WriterSettingsBuilder::default()
    }

    /// Checks the invariants the writer relies on.
    pub fn validate(&self) -> Result<()> {
        if self.folder_name.is_empty() {
            return Err(Error::InvalidSettings("folder name is empty".into()));
        }
        if self.file_extension.is_empty() || self.file_extension.contains('.') {
            return Err(Error::InvalidSettings(format!(
                "file extension {:?} must be non-empty and contain no dot",
                self.file_extension
            )));
        }
        if self.max_file_size == 0 {
            return Err(Error::InvalidSettings("max file size must be positive".into()));
        }
        if self.file_size_to_open > self.max_file_size {
            return Err(Error::InvalidSettings(format!(
                "file size to open ({}) exceeds max file size ({})",
                self.file_size_to_open, self.max_file_size
            )));
        }
        check_date_format("file name date format", &self.file_name_date_format)?;
        check_file_name_format(&self.file_name_date_format)?;
        check_date_format("date format", &self.date_format)?;
        Ok(())
    }

    /// Directory holding the log files.
    pub fn log_directory(&self) -> Result<PathBuf> {
        let root = match &self.root_directory {
            Some(root) => root.clone(),
            None => dirs::document_dir().ok_or(Error::DocumentDirUnavailable)?,
        };
        Ok(root.join(&self.folder_name))
    }
}

// chrono panics when an invalid format is rendered, so reject it up front.
fn check_date_format(what: &str, format: &str) -> Result<()> {
    if format.is_empty() {
        return Err(Error::InvalidSettings(format!("{what} is empty")));
    }
    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(Error::InvalidSettings(format!(
            "{what} {format:?} is not a valid strftime format"
        )));
    }
    Ok(())
}

// File names must stay inside the log directory.
fn check_file_name_format(format: &str) -> Result<()> {
    let rendered = Local::now().format(format).to_string();
    if rendered.contains(['/', '\\']) {
        return Err(Error::InvalidSettings(format!(
            "file name date format {format:?} renders a path separator ({rendered:?})"
        )));
    }
    Ok(())
}

/// Builder for [`WriterSettings`].
#[derive(Debug, Clone, Default)]
pub struct WriterSettingsBuilder {
    settings: WriterSettings,
}

impl WriterSettingsBuilder {
    /// Storage folder name
    pub fn folder_name(mut self, name: impl Into<String>) -> Self {
        self.settings.folder_name = name.into();
        self
    }

    /// Format used to name new files
    pub fn file_name_date_format(mut self, format: impl Into<String>) -> Self {
        self.settings.file_name_date_format = format.into();
        self
    }

    /// Log file extension, without the dot
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.settings.file_extension = extension.into();
        self
    }

    /// Format of the session timestamp
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.settings.date_format = format.into();
        self
    }

    /// Separator written after every entry
    pub fn entry_separator(mut self, separator: impl Into<String>) -> Self {
        self.settings.entry_separator = separator.into();
        self
    }

    /// Separator opening every session
    pub fn session_separator(mut self, separator: impl Into<String>) -> Self {
        self.settings.session_separator = separator.into();
        self
    }

    /// Rotation threshold in bytes
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.settings.max_file_size = bytes;
        self
    }

    /// Reopen threshold in bytes
    pub fn file_size_to_open(mut self, bytes: u64) -> Self {
        self.settings.file_size_to_open = bytes;
        self
    }

    /// Retained historical file count
    pub fn max_file_count(mut self, count: usize) -> Self {
        self.settings.max_file_count = count;
        self
    }

    /// Parent directory of the storage folder
    pub fn root_directory(mut self, root: impl Into<PathBuf>) -> Self {
        self.settings.root_directory = Some(root.into());
        self
    }

    /// Validates and returns the settings.
    pub fn build(self) -> Result<WriterSettings> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}
