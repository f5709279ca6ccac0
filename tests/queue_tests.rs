use parking_lot::Mutex;
use rolling_logger::{Error, SerialTaskQueue};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_units_run_in_submission_order_across_threads() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 200;

    let queue = Arc::new(SerialTaskQueue::new("fifo", Vec::new()).unwrap());
    // Serializes "take a ticket + enqueue" so the ticket is the submission order.
    let ticket = Arc::new(Mutex::new(0usize));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let ticket = Arc::clone(&ticket);
            thread::spawn(move || {
                for _ in 0..PER_THREAD {
                    let mut next = ticket.lock();
                    let seq = *next;
                    *next += 1;
                    queue.enqueue(move |seen: &mut Vec<usize>| seen.push(seq));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let seen = queue.enqueue_and_wait(|seen| seen.clone()).unwrap();
    let expected: Vec<usize> = (0..THREADS * PER_THREAD).collect();
    assert_eq!(seen, expected, "Execution order should equal submission order");
}

#[test]
fn test_next_unit_waits_for_blocking_unit() {
    let queue = SerialTaskQueue::new("blocking", (false, Vec::new())).unwrap();

    queue.enqueue(|(done, _)| {
        thread::sleep(Duration::from_millis(100));
        *done = true;
    });
    queue.enqueue(|(done, observed)| observed.push(*done));
    queue.enqueue(|(done, observed)| observed.push(*done));

    let observed = queue.enqueue_and_wait(|(_, observed)| observed.clone()).unwrap();
    assert_eq!(observed, vec![true, true], "Later units must start after the slow unit finished");
}

#[test]
fn test_units_never_overlap() {
    let active = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let queue = Arc::new(SerialTaskQueue::new("overlap", ()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            let active = Arc::clone(&active);
            let overlaps = Arc::clone(&overlaps);
            thread::spawn(move || {
                for _ in 0..25 {
                    let active = Arc::clone(&active);
                    let overlaps = Arc::clone(&overlaps);
                    queue.enqueue(move |_| {
                        if active.fetch_add(1, Ordering::SeqCst) != 0 {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        thread::sleep(Duration::from_micros(200));
                        active.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    queue.enqueue_and_wait(|_| ()).unwrap();
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
}

#[test]
fn test_enqueue_and_wait_returns_value() {
    let queue = SerialTaskQueue::new("value", 41u32).unwrap();
    let value = queue
        .enqueue_and_wait(|n| {
            *n += 1;
            *n
        })
        .unwrap();
    assert_eq!(value, 42);
}

#[test]
fn test_enqueue_and_try_wait_propagates_failure() {
    let queue = SerialTaskQueue::new("failing", ()).unwrap();
    let result: Result<(), Error> =
        queue.enqueue_and_try_wait(|_| Err(Error::InvalidSettings("nope".into())));
    assert!(matches!(result, Err(Error::InvalidSettings(msg)) if msg == "nope"));
}

#[test]
fn test_panicking_unit_does_not_kill_worker() {
    let queue = SerialTaskQueue::new("panicky", 0u32).unwrap();

    queue.enqueue(|_| panic!("fire and forget"));
    let result = queue.enqueue_and_wait(|_| -> u32 { panic!("boom") });
    assert!(matches!(result, Err(Error::UnitPanicked(msg)) if msg == "boom"));

    queue.enqueue(|n| *n += 1);
    assert_eq!(queue.enqueue_and_wait(|n| *n).unwrap(), 1);
}

#[test]
fn test_shutdown_drains_pending_units() {
    let done = Arc::new(AtomicUsize::new(0));
    let queue = SerialTaskQueue::new("drain", ()).unwrap();

    for _ in 0..50 {
        let done = Arc::clone(&done);
        queue.enqueue(move |_| {
            thread::sleep(Duration::from_micros(500));
            done.fetch_add(1, Ordering::SeqCst);
        });
    }
    queue.shutdown().unwrap();

    assert_eq!(done.load(Ordering::SeqCst), 50);
}

#[test]
fn test_drop_keeps_draining_in_background() {
    let done = Arc::new(AtomicUsize::new(0));
    {
        let queue = SerialTaskQueue::new("detached", ()).unwrap();
        for _ in 0..20 {
            let done = Arc::clone(&done);
            queue.enqueue(move |_| {
                thread::sleep(Duration::from_millis(1));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    while done.load(Ordering::SeqCst) < 20 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(done.load(Ordering::SeqCst), 20);
}

#[test]
fn test_state_dropped_on_worker_after_shutdown() {
    struct Tracker(Arc<AtomicUsize>);
    impl Drop for Tracker {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let drops = Arc::new(AtomicUsize::new(0));
    let queue = SerialTaskQueue::new("tracked", Tracker(Arc::clone(&drops))).unwrap();
    assert_eq!(queue.name(), "tracked");
    queue.shutdown().unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}
