//! Single-shot deadline scheduling
//!
//! The credential slot arms one deadline per activation. Schedulers hand back a
//! [`DeadlineHandle`]; cancelling or dropping the handle guarantees the task will not run
//! (short of a task that already started).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use parking_lot::Mutex;
use tracing::trace;

/// Work run when a deadline expires
pub type DeadlineTask = Box<dyn FnOnce() + Send + 'static>;

/// Scheduler for single-shot deadlines against a monotonic clock
pub trait DeadlineScheduler: Send + Sync + fmt::Debug {
    /// Monotonic time elapsed since the scheduler's epoch
    fn now(&self) -> Duration;

    /// Run `task` once after `delay`, unless the returned handle is cancelled first
    fn schedule(&self, delay: Duration, task: DeadlineTask) -> DeadlineHandle;
}

/// Cancellation handle for a scheduled deadline
///
/// Dropping the handle cancels the deadline.
pub struct DeadlineHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl DeadlineHandle {
    /// Create a handle that runs `cancel` when cancelled or dropped
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the deadline
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for DeadlineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadlineHandle")
            .field("pending", &self.cancel.is_some())
            .finish()
    }
}

impl Drop for DeadlineHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

/// Scheduler backed by one short-lived thread per deadline
///
/// The thread parks on a cancellation channel with a timeout; a disconnect from the handle side
/// means the deadline was superseded.
#[derive(Debug, Clone)]
pub struct ThreadScheduler {
    epoch: Instant,
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl ThreadScheduler {
    /// Create a new thread scheduler with its epoch at the current instant
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeadlineScheduler for ThreadScheduler {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn schedule(&self, delay: Duration, task: DeadlineTask) -> DeadlineHandle {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);

        thread::spawn(move || match cancel_rx.recv_timeout(delay) {
            Err(RecvTimeoutError::Timeout) => {
                trace!(?delay, "Deadline expired");
                task();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                trace!("Deadline cancelled");
            }
        });

        DeadlineHandle::new(move || drop(cancel_tx))
    }
}

struct PendingDeadline {
    due: Duration,
    task: DeadlineTask,
}

#[derive(Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<u64, PendingDeadline>,
}

/// Scheduler driven by virtual time
///
/// Nothing runs until [`ManualScheduler::advance`] moves the clock past a deadline, which makes
/// expiry deterministic in tests and simulations.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ManualScheduler")
            .field("now", &state.now)
            .field("pending", &state.pending.len())
            .finish()
    }
}

impl ManualScheduler {
    /// Create a new scheduler at virtual time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deadlines still scheduled
    pub fn pending(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Move virtual time forward, running every deadline that falls due in order
    ///
    /// Tasks run without the scheduler lock held, so they may schedule or cancel deadlines.
    pub fn advance(&self, by: Duration) {
        let target = self.state.lock().now + by;

        loop {
            let next = {
                let mut state = self.state.lock();
                let due = state
                    .pending
                    .iter()
                    .filter(|(_, p)| p.due <= target)
                    .min_by_key(|(id, p)| (p.due, **id))
                    .map(|(id, _)| *id);

                due.and_then(|id| state.pending.remove(&id)).map(|p| {
                    state.now = p.due;
                    p.task
                })
            };

            match next {
                Some(task) => task(),
                None => break,
            }
        }

        self.state.lock().now = target;
    }
}

impl DeadlineScheduler for ManualScheduler {
    fn now(&self) -> Duration {
        self.state.lock().now
    }

    fn schedule(&self, delay: Duration, task: DeadlineTask) -> DeadlineHandle {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        let due = state.now + delay;
        state.pending.insert(id, PendingDeadline { due, task });

        let weak: Weak<Mutex<ManualState>> = Arc::downgrade(&self.state);
        DeadlineHandle::new(move || {
            if let Some(state) = weak.upgrade() {
                state.lock().pending.remove(&id);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter_task(counter: &Arc<AtomicUsize>) -> DeadlineTask {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_manual_runs_when_due() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let _handle = scheduler.schedule(Duration::from_secs(30), counter_task(&fired));

        scheduler.advance(Duration::from_secs(29));
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        scheduler.advance(Duration::from_secs(1));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.now(), Duration::from_secs(30));
    }

    #[test]
    fn test_manual_cancel_and_drop() {
        let scheduler = ManualScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_secs(1), counter_task(&fired));
        handle.cancel();
        drop(scheduler.schedule(Duration::from_secs(1), counter_task(&fired)));
        assert_eq!(scheduler.pending(), 0);

        scheduler.advance(Duration::from_secs(5));
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_manual_runs_in_due_order() {
        let scheduler = ManualScheduler::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, secs) in [("late", 20u64), ("early", 10)] {
            let order = Arc::clone(&order);
            handles.push(scheduler.schedule(
                Duration::from_secs(secs),
                Box::new(move || order.lock().push(label)),
            ));
        }

        scheduler.advance(Duration::from_secs(60));
        assert_eq!(*order.lock(), vec!["early", "late"]);
    }

    #[test]
    fn test_thread_scheduler_fires() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = crossbeam_channel::bounded(1);
        let _handle = scheduler.schedule(
            Duration::from_millis(10),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_thread_scheduler_cancel() {
        let scheduler = ThreadScheduler::new();
        let (tx, rx) = crossbeam_channel::bounded::<()>(1);
        let handle = scheduler.schedule(
            Duration::from_millis(50),
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        handle.cancel();
        // The task is dropped with its sender once the thread observes the cancellation.
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(5)),
            Err(RecvTimeoutError::Disconnected)
        );
    }
}
