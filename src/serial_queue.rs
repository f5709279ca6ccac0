use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use crate::diagnostics::DIAGNOSTICS_TARGET;
use crate::error::{Error, Result};

/// A boxed unit of work. It receives the worker-confined state.
type Unit<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// A multi-producer, single-consumer queue that runs units strictly in
/// submission order on one dedicated worker thread.
///
/// The queue owns a value of type `S` that lives on the worker thread for the
/// queue's whole lifetime. Every unit gets `&mut S`, so state that must only
/// ever be touched by one thread (an open file, for instance) needs no lock.
///
/// # Ordering
///
/// A unit never starts before every unit submitted ahead of it has returned,
/// however long those units block. Units never run concurrently.
///
/// # Deadlock hazard
///
/// Calling [`enqueue_and_wait`](Self::enqueue_and_wait) from inside a unit
/// running on the same queue blocks forever: the waiting unit occupies the
/// only worker that could run the unit it is waiting for. This is not
/// detected.
///
/// # Teardown
///
/// Dropping the queue closes it. Units already enqueued keep running on the
/// detached worker, but nothing waits for them; if the process exits first
/// they are lost. Use [`shutdown`](Self::shutdown) to drain synchronously.
///
/// # Examples
///
/// ```
/// # use rolling_logger::SerialTaskQueue;
/// let queue = SerialTaskQueue::new("counter", 0u32).unwrap();
/// for _ in 0..10 {
///     queue.enqueue(|count| *count += 1);
/// }
/// let total = queue.enqueue_and_wait(|count| *count).unwrap();
/// assert_eq!(total, 10);
/// ```
pub struct SerialTaskQueue<S: Send + 'static> {
    name: String,
    sender: Option<Sender<Unit<S>>>,
    worker: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> SerialTaskQueue<S> {
    /// Starts the worker thread, handing it ownership of `state`.
    pub fn new(name: &str, state: S) -> Result<Self> {
        let (sender, receiver) = unbounded::<Unit<S>>();
        let worker_name = name.to_string();

        let worker = thread::Builder::new()
            .name(format!("{name}-queue"))
            .spawn(move || Self::worker_loop(&worker_name, receiver, state))
            .map_err(Error::WorkerSpawn)?;

        Ok(Self {
            name: name.to_string(),
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Name given at construction; also names the worker thread.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schedules `unit` and returns immediately.
    pub fn enqueue<F>(&self, unit: F)
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        if self.submit(Box::new(unit)).is_err() {
            tracing::warn!(
                target: DIAGNOSTICS_TARGET,
                queue = %self.name,
                "dropping unit, queue is closed"
            );
        }
    }

    /// Schedules `unit` and blocks until it has run, returning its value.
    ///
    /// Fails with [`Error::UnitPanicked`] if the unit panics, and with
    /// [`Error::QueueClosed`] if the worker is gone. Must not be called from a
    /// unit running on this same queue.
    pub fn enqueue_and_wait<T, F>(&self, unit: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        let (reply_tx, reply_rx) = bounded::<std::result::Result<T, String>>(1);

        self.submit(Box::new(move |state: &mut S| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| unit(state)))
                .map_err(|payload| panic_message(payload.as_ref()));
            // The caller may have gone away; nobody is left to tell.
            let _ = reply_tx.send(outcome);
        }))?;

        match reply_rx.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(message)) => Err(Error::UnitPanicked(message)),
            Err(_) => Err(Error::QueueClosed),
        }
    }

    /// Like [`enqueue_and_wait`](Self::enqueue_and_wait) for units that can
    /// fail, flattening the unit's error into the returned `Result`.
    pub fn enqueue_and_try_wait<T, E, F>(&self, unit: F) -> std::result::Result<T, E>
    where
        T: Send + 'static,
        E: From<Error> + Send + 'static,
        F: FnOnce(&mut S) -> std::result::Result<T, E> + Send + 'static,
    {
        self.enqueue_and_wait(unit)?
    }

    /// Closes the queue, waits for every pending unit, then drops the state.
    pub fn shutdown(mut self) -> Result<()> {
        self.sender.take();
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|payload| Error::UnitPanicked(panic_message(payload.as_ref()))),
            None => Ok(()),
        }
    }

    fn submit(&self, unit: Unit<S>) -> Result<()> {
        let sender = self.sender.as_ref().ok_or(Error::QueueClosed)?;
        sender.send(unit).map_err(|_| Error::QueueClosed)
    }

    fn worker_loop(name: &str, receiver: Receiver<Unit<S>>, mut state: S) {
        tracing::debug!(target: DIAGNOSTICS_TARGET, queue = %name, "queue worker started");

        // Ends once every sender is gone and the backlog is empty.
        for unit in receiver.iter() {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| unit(&mut state))) {
                tracing::error!(
                    target: DIAGNOSTICS_TARGET,
                    queue = %name,
                    "queued unit panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }

        tracing::debug!(target: DIAGNOSTICS_TARGET, queue = %name, "queue worker stopped");
    }
}

impl<S: Send + 'static> Drop for SerialTaskQueue<S> {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain and exit on its own.
        self.sender.take();
        self.worker.take();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
