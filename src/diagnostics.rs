//! Side channel for the logger's own failures.
//!
//! The file writer cannot report its problems through itself without risking
//! infinite recursion, so every internal failure is emitted as a `tracing`
//! event under [`DIAGNOSTICS_TARGET`] and optionally handed to a
//! user-supplied [`ErrorHandler`]. `FileOutput` rejects entries with this
//! target by default.

use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use crate::error::Error;

/// Target of every diagnostic event emitted by this crate.
pub const DIAGNOSTICS_TARGET: &str = "rolling_logger::diagnostics";

/// Callback invoked on the writer's worker thread for every reported failure.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Emits `error` on the side channel, then forwards it to `handler`.
pub(crate) fn report(error: &Error, handler: Option<&ErrorHandler>) {
    tracing::error!(target: DIAGNOSTICS_TARGET, path = ?error.path(), "{}", error);
    if let Some(handler) = handler {
        handler(error);
    }
}

/// Installs a `tracing-subscriber` fmt subscriber for the diagnostics.
///
/// `RUST_LOG` takes precedence; otherwise `default_directive` (for example
/// `"rolling_logger=warn"`) is used. Events are stamped with RFC 3339 UTC
/// times. Returns an error instead of panicking if a global subscriber is
/// already set.
pub fn init_subscriber(
    default_directive: &str,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;
    tracing::subscriber::set_global_default(subscriber(filter, std::io::stderr))?;
    Ok(())
}

fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(true)
        .with_ansi(false)
        .with_writer(writer)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use parking_lot::Mutex;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_reaches_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let handler: ErrorHandler = Arc::new(move |e: &Error| {
            assert!(matches!(e, Error::DeletionFailed { .. }));
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let error = Error::DeletionFailed {
            path: PathBuf::from("/tmp/old.log"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        report(&error, Some(&handler));
        report(&error, None);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_events_carry_rfc3339_timestamp() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let make_writer = move || SharedBuffer(Arc::clone(&sink));

        let error = Error::QueueClosed;
        let filter = EnvFilter::new("rolling_logger=error");
        tracing::subscriber::with_default(subscriber(filter, make_writer), || {
            report(&error, None);
        });

        let output = String::from_utf8(buffer.lock().clone()).unwrap();
        let stamp = output.split_whitespace().next().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "Bad timestamp in {output:?}");
        assert!(output.contains(DIAGNOSTICS_TARGET));
        assert!(output.contains(&error.to_string()));
    }

    #[test]
    fn test_second_subscriber_install_fails() {
        let _ = init_subscriber("rolling_logger=debug");
        assert!(init_subscriber("rolling_logger=debug").is_err());
    }
}
