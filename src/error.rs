//! Error types for the rolling file logger.

use std::io;
use std::path::PathBuf;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while setting up or running the logger.
///
/// None of these are fatal to the host process. Failures inside the file
/// writer's worker are reported through the diagnostics side channel and
/// never reach the caller of `append`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The storage directory could not be created
    #[error("Can't create log directory at {path}: {source}")]
    DirectoryCreationFailed {
        /// Directory that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// A new log file could not be created
    #[error("Can't create log file at {path}: {source}")]
    FileCreationFailed {
        /// File that failed to be created
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// An existing log file could not be opened for appending
    #[error("Can't open log file at {path}: {source}")]
    FileOpenFailed {
        /// File that failed to open
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Appending bytes to the active file failed
    #[error("Can't write to log file at {path}: {source}")]
    WriteFailed {
        /// Active file at the time of the failure
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Flushing or releasing the active file failed
    #[error("Error while closing log file at {path}: {source}")]
    CloseFailed {
        /// File being closed
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// An explicit sync of the active file failed
    #[error("Can't sync log file at {path}: {source}")]
    SyncFailed {
        /// Active file at the time of the failure
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// A retained file could not be deleted during cleanup
    #[error("Can't delete log file at {path}: {source}")]
    DeletionFailed {
        /// File that survived the cleanup pass
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// The platform has no per-user document directory
    #[error("No document directory available on this platform")]
    DocumentDirUnavailable,

    /// Settings violate an invariant
    #[error("Invalid writer settings: {0}")]
    InvalidSettings(String),

    /// The task queue no longer accepts work
    #[error("Task queue is closed")]
    QueueClosed,

    /// A unit panicked before producing its result
    #[error("Queued unit panicked: {0}")]
    UnitPanicked(String),

    /// The worker thread could not be started
    #[error("Can't spawn queue worker: {0}")]
    WorkerSpawn(#[source] io::Error),

    /// A global `log` logger was already installed
    #[error("Can't install logger: {0}")]
    LoggerInstall(#[from] log::SetLoggerError),
}

impl Error {
    /// Path of the file or directory involved, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Error::DirectoryCreationFailed { path, .. }
            | Error::FileCreationFailed { path, .. }
            | Error::FileOpenFailed { path, .. }
            | Error::WriteFailed { path, .. }
            | Error::CloseFailed { path, .. }
            | Error::SyncFailed { path, .. }
            | Error::DeletionFailed { path, .. } => Some(path),
            _ => None,
        }
    }
}
