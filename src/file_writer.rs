use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::Local;

use crate::diagnostics::{self, ErrorHandler, DIAGNOSTICS_TARGET};
use crate::error::{Error, Result};
use crate::serial_queue::SerialTaskQueue;
use crate::settings::WriterSettings;

/// Upper bound on `_NNN` suffixes tried when a file name is already taken.
const MAX_NAME_SUFFIX: u32 = 999;

/// A size-rotated, retention-bounded log file writer.
///
/// Every file-system mutation runs on the writer's own [`SerialTaskQueue`],
/// so appends, rotations and cleanups are totally ordered no matter how many
/// threads call [`append`](Self::append). The open file handle lives on the
/// queue's worker and is never visible to callers.
///
/// # On-disk layout
///
/// Files live in [`WriterSettings::log_directory`] and are named
/// `<timestamp>.<extension>`. Each time a writer opens a file it writes
/// `session_separator + " " + timestamp + "\n"`, then every entry is followed
/// by `entry_separator`.
///
/// # Failures
///
/// `append` never reports errors to its caller. Anything that goes wrong on
/// the worker is emitted under [`DIAGNOSTICS_TARGET`] and passed to the
/// optional error handler; the entry being written is dropped.
///
/// # Examples
///
/// ```no_run
/// # use rolling_logger::{RotatingFileWriter, WriterSettings};
/// let writer = RotatingFileWriter::new(WriterSettings::default()).unwrap();
/// writer.append("application started");
/// writer.flush().unwrap();
/// for file in writer.list_files() {
///     println!("{}", file.display());
/// }
/// ```
pub struct RotatingFileWriter {
    settings: Arc<WriterSettings>,
    directory: PathBuf,
    queue: SerialTaskQueue<FileState>,
}

impl RotatingFileWriter {
    /// Validates `settings`, starts the worker and schedules setup.
    pub fn new(settings: WriterSettings) -> Result<Self> {
        Self::build(settings, None)
    }

    /// Same as [`new`](Self::new), additionally calling `handler` on the
    /// worker thread for every failure the writer reports.
    pub fn with_error_handler<F>(settings: WriterSettings, handler: F) -> Result<Self>
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        Self::build(settings, Some(Arc::new(handler)))
    }

    fn build(settings: WriterSettings, on_error: Option<ErrorHandler>) -> Result<Self> {
        settings.validate()?;
        let directory = settings.log_directory()?;
        let settings = Arc::new(settings);

        let state = FileState {
            settings: Arc::clone(&settings),
            directory: directory.clone(),
            active: None,
            on_error,
        };
        let queue = SerialTaskQueue::new("log-file-writer", state)?;
        queue.enqueue(|state| {
            if let Err(e) = state.rotate() {
                state.report(&e);
            }
        });

        Ok(Self {
            settings,
            directory,
            queue,
        })
    }

    /// Schedules `line` to be appended and returns immediately.
    pub fn append(&self, line: impl Into<String>) {
        let line = line.into();
        self.queue.enqueue(move |state| state.append_or_report(&line));
    }

    /// Sorted paths of the log files, oldest first.
    ///
    /// Reads the directory directly instead of going through the queue, so it
    /// may be called from any thread at any time.
    pub fn list_files(&self) -> Vec<PathBuf> {
        list_log_files(&self.directory, &self.settings.file_extension)
    }

    /// Waits for every entry appended so far, then syncs the active file.
    pub fn flush(&self) -> Result<()> {
        self.queue.enqueue_and_try_wait(|state| state.sync())
    }

    /// Path of the file currently being written, once every earlier unit ran.
    pub fn current_file(&self) -> Result<Option<PathBuf>> {
        self.queue
            .enqueue_and_wait(|state| state.active.as_ref().map(|active| active.path.clone()))
    }

    /// Directory the writer stores its files in.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Settings the writer was built with.
    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Drains pending entries, closes the active file and stops the worker.
    ///
    /// Unlike dropping the writer, this blocks until everything is on disk
    /// and returns the close failure, if any.
    pub fn close(self) -> Result<()> {
        let closed = self.queue.enqueue_and_try_wait(|state| state.close_active());
        self.queue.shutdown()?;
        closed
    }
}

struct ActiveFile {
    path: PathBuf,
    handle: File,
}

/// Writer state confined to the queue's worker thread.
struct FileState {
    settings: Arc<WriterSettings>,
    directory: PathBuf,
    active: Option<ActiveFile>,
    on_error: Option<ErrorHandler>,
}

impl FileState {
    fn report(&self, error: &Error) {
        diagnostics::report(error, self.on_error.as_ref());
    }

    /// Body of an `append` unit: a failure drops the entry and is reported.
    fn append_or_report(&mut self, line: &str) {
        if let Err(e) = self.append(line) {
            self.report(&e);
        }
    }

    fn append(&mut self, line: &str) -> Result<()> {
        if self.should_rotate() {
            self.rotate()?;
        }
        let entry = format!("{line}{}", self.settings.entry_separator);
        self.write_bytes(entry.as_bytes())
    }

    /// True when nothing is open or the active file reached the size limit.
    fn should_rotate(&self) -> bool {
        match &self.active {
            None => true,
            Some(active) => match fs::metadata(&active.path) {
                Ok(meta) => meta.len() >= self.settings.max_file_size,
                // Deleted or unreadable underneath us.
                Err(_) => true,
            },
        }
    }

    fn rotate(&mut self) -> Result<()> {
        if let Err(e) = self.close_active() {
            self.report(&e);
        }
        self.ensure_directory()?;

        let active = self.reopen_or_create(self.reusable_file())?;
        self.active = Some(active);

        let header = format!(
            "{} {}\n",
            self.settings.session_separator,
            Local::now().format(&self.settings.date_format)
        );
        if let Err(e) = self.write_bytes(header.as_bytes()) {
            self.active = None;
            return Err(e);
        }

        self.cleanup();
        Ok(())
    }

    fn ensure_directory(&self) -> Result<()> {
        if self.directory.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.directory).map_err(|source| Error::DirectoryCreationFailed {
            path: self.directory.clone(),
            source,
        })
    }

    /// The most recent file, if it is still small enough to keep using.
    fn reusable_file(&self) -> Option<PathBuf> {
        let latest = list_log_files(&self.directory, &self.settings.file_extension).pop()?;
        let size = fs::metadata(&latest).ok()?.len();
        (size < self.settings.file_size_to_open).then_some(latest)
    }

    /// Opens `candidate` for appending, or creates a new file when there is
    /// no candidate or it cannot be opened. The open failure is reported.
    fn reopen_or_create(&self, candidate: Option<PathBuf>) -> Result<ActiveFile> {
        if let Some(path) = candidate {
            match OpenOptions::new().append(true).open(&path) {
                Ok(handle) => {
                    tracing::debug!(
                        target: DIAGNOSTICS_TARGET,
                        path = %path.display(),
                        "reopened log file"
                    );
                    return Ok(ActiveFile { path, handle });
                }
                Err(source) => self.report(&Error::FileOpenFailed { path, source }),
            }
        }
        self.create_file()
    }

    fn create_file(&self) -> Result<ActiveFile> {
        let stem = Local::now().format(&self.settings.file_name_date_format).to_string();
        let extension = &self.settings.file_extension;

        let mut suffix = 0;
        loop {
            let name = match suffix {
                0 => format!("{stem}.{extension}"),
                n => format!("{stem}_{n:03}.{extension}"),
            };
            let path = self.directory.join(name);

            match OpenOptions::new().append(true).create_new(true).open(&path) {
                Ok(handle) => {
                    tracing::debug!(
                        target: DIAGNOSTICS_TARGET,
                        path = %path.display(),
                        "created log file"
                    );
                    return Ok(ActiveFile { path, handle });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists && suffix < MAX_NAME_SUFFIX => {
                    suffix += 1;
                }
                Err(source) => return Err(Error::FileCreationFailed { path, source }),
            }
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(active) = self.active.as_mut() else {
            return Err(Error::WriteFailed {
                path: self.directory.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no active log file"),
            });
        };
        active.handle.write_all(bytes).map_err(|source| Error::WriteFailed {
            path: active.path.clone(),
            source,
        })
    }

    /// Deletes the oldest files beyond `max_file_count + 1`.
    fn cleanup(&self) {
        let files = list_log_files(&self.directory, &self.settings.file_extension);
        let keep = self.settings.max_file_count + 1;
        if files.len() <= keep {
            return;
        }

        let excess = files.len() - keep;
        self.delete_files(&files[..excess]);
    }

    /// Removes each file in turn; a failure is reported and does not stop
    /// the remaining deletions.
    fn delete_files(&self, files: &[PathBuf]) {
        for path in files {
            match fs::remove_file(path) {
                Ok(()) => {
                    tracing::debug!(
                        target: DIAGNOSTICS_TARGET,
                        path = %path.display(),
                        "deleted old log file"
                    );
                }
                Err(source) => self.report(&Error::DeletionFailed { path: path.clone(), source }),
            }
        }
    }

    fn sync(&mut self) -> Result<()> {
        match &self.active {
            Some(active) => active.handle.sync_data().map_err(|source| Error::SyncFailed {
                path: active.path.clone(),
                source,
            }),
            None => Ok(()),
        }
    }

    /// Syncs and releases the active file. The handle is gone either way.
    fn close_active(&mut self) -> Result<()> {
        let Some(mut active) = self.active.take() else {
            return Ok(());
        };
        active
            .handle
            .flush()
            .and_then(|()| active.handle.sync_all())
            .map_err(|source| Error::CloseFailed { path: active.path, source })
    }
}

impl Drop for FileState {
    fn drop(&mut self) {
        if let Err(e) = self.close_active() {
            self.report(&e);
        }
    }
}

/// Log files in `directory` with the given extension, oldest first.
///
/// Only regular files are listed; directories and other entries that happen
/// to carry the extension are skipped.
///
/// Files are ordered by creation time where the platform records it,
/// modification time otherwise, with the file name breaking ties. A missing
/// directory yields an empty list.
pub fn list_log_files(directory: &Path, extension: &str) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(directory) else {
        return Vec::new();
    };

    let mut files: Vec<(Option<SystemTime>, PathBuf)> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .map(|path| (creation_time(&path), path))
        .collect();

    files.sort();
    files.into_iter().map(|(_, path)| path).collect()
}

fn creation_time(path: &Path) -> Option<SystemTime> {
    let meta = fs::metadata(path).ok()?;
    meta.created().or_else(|_| meta.modified()).ok()
}
