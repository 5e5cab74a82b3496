//! Shared status cell guarded by one lock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::machine::DebounceMachine;
use crate::status::{Level, Status};

/// The debounce machine behind the guard shared by the re-sample callback
/// and readers.
///
/// The last settled level and the status are only ever touched together,
/// under one acquisition of the guard.
#[derive(Debug)]
pub struct StatusStore {
    guard: Mutex<DebounceMachine>,
}

impl StatusStore {
    /// Creates a store primed with the level read at setup.
    pub fn new(initial: Level) -> Self {
        Self {
            guard: Mutex::new(DebounceMachine::new(initial)),
        }
    }

    /// Runs one state machine evaluation.
    ///
    /// `read` samples the pin and is called with the guard held. A failed
    /// read counts as "no change" for this window.
    pub fn resample_with<E, F>(&self, read: F) -> Status
    where
        E: core::fmt::Debug,
        F: FnOnce() -> Result<Level, E>,
    {
        let mut machine = self.lock();
        let previous = machine.last_level();
        match read() {
            Ok(current) => {
                let status = machine.resample(current);
                if status.is_event() {
                    debug!("button settled {:?} -> {:?}: {:?}", previous, current, status);
                }
                status
            }
            Err(e) => {
                warn!("pin sample failed, keeping {:?}: {:?}", previous, e);
                machine.skip()
            }
        }
    }

    /// Copies the status out and resets it to `Unchanged` in one step.
    pub fn take(&self) -> Status {
        self.lock().take()
    }

    /// Snapshot of the machine, for diagnostics.
    pub fn snapshot(&self) -> DebounceMachine {
        *self.lock()
    }

    // A poisoned guard still holds a consistent pair: no code path panics
    // between the two field writes.
    fn lock(&self) -> MutexGuard<'_, DebounceMachine> {
        self.guard.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
