//! Single-shot retriggerable delay timer.
//!
//! Provides the [`DebounceTimer`] trait and [`ThreadTimer`], a
//! `std`-backed implementation that parks a dedicated worker thread on a
//! monotonic deadline.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::warn;

/// A single-shot delayed callback with cancel-and-rearm semantics.
pub trait DebounceTimer {
    /// Schedules the callback `delay` from now.
    ///
    /// Replaces any pending, not yet fired, schedule. Returns `true` if a
    /// pending schedule was replaced. After [`cancel_and_join`] this does
    /// nothing and returns `false`. A delay whose deadline cannot be
    /// represented is rejected the same way and leaves the schedule as is.
    ///
    /// Must not block on a running callback: it is called from the
    /// interrupt path.
    ///
    /// [`cancel_and_join`]: DebounceTimer::cancel_and_join
    fn arm(&self, delay: Duration) -> bool;

    /// Cancels the timer for good.
    ///
    /// When this returns the callback is not running and will never run
    /// again. Blocks until an in-flight callback completes.
    fn cancel_and_join(&self);
}

#[derive(Debug, Default)]
struct TimerState {
    deadline: Option<Instant>,
    shutdown: bool,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// [`DebounceTimer`] driven by a dedicated worker thread.
///
/// The worker sleeps until the current deadline; re-arming moves the
/// deadline and wakes it to recompute. The callback runs without the timer
/// lock held, so arming while a callback is executing schedules the next
/// firing instead of waiting.
///
/// At most one callback is pending or running at any instant. A panicking
/// callback is logged and the worker keeps serving later arms.
#[derive(Debug)]
pub struct ThreadTimer {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadTimer {
    /// Spawns the worker thread. The timer starts disarmed.
    pub fn spawn<F>(name: &str, mut callback: F) -> io::Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let shared = Arc::new(Shared::default());
        let worker_shared = Arc::clone(&shared);

        let worker = thread::Builder::new()
            .name(name.into())
            .spawn(move || run(&worker_shared, &mut callback))?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Returns `true` if a firing is scheduled and has not started yet.
    pub fn is_pending(&self) -> bool {
        self.shared.lock().deadline.is_some()
    }
}

fn run(shared: &Shared, callback: &mut dyn FnMut()) {
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            return;
        }
        match state.deadline {
            None => {
                state = shared
                    .wake
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    state.deadline = None;
                    drop(state);
                    if panic::catch_unwind(AssertUnwindSafe(&mut *callback)).is_err() {
                        warn!("debounce timer callback panicked; waiting for the next arm");
                    }
                    state = shared.lock();
                } else {
                    state = shared
                        .wake
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }
}

impl DebounceTimer for ThreadTimer {
    fn arm(&self, delay: Duration) -> bool {
        let mut state = self.shared.lock();
        if state.shutdown {
            return false;
        }
        let Some(deadline) = Instant::now().checked_add(delay) else {
            return false;
        };
        let replaced = state.deadline.replace(deadline).is_some();
        drop(state);
        self.shared.wake.notify_one();
        replaced
    }

    fn cancel_and_join(&self) {
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.deadline = None;
        }
        self.shared.wake.notify_one();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            // Joining from inside the callback would wait on ourselves; the
            // worker exits on its own once the callback returns.
            if worker.thread().id() == thread::current().id() {
                return;
            }
            if worker.join().is_err() {
                warn!("debounce timer callback panicked before shutdown");
            }
        }
    }
}

impl Drop for ThreadTimer {
    fn drop(&mut self) {
        self.cancel_and_join();
    }
}
