//! Debounce state machine.
//!
//! Provides [`DebounceMachine`], the pure transition logic evaluated once per
//! settled debounce window. It compares the previous settled level against
//! the level sampled after the window and derives the reportable [`Status`].
//!
//! The button is wired active low: a falling settled level is a press, a
//! rising one a release.
//!
//! ```text
//!  last   current   status
//!  High   Low       Pressed
//!  Low    High      Released
//!  High   High      Unchanged
//!  Low    Low       Unchanged
//! ```
//!
//! Bounces inside a window never reach the machine individually. Only the
//! final sample is compared, so an even number of flips that returns the
//! line to its old level is indistinguishable from no edge at all.

use crate::status::{Level, Status};

/// Last settled level paired with the current reportable status.
///
/// Both fields always change together; callers sharing a machine between
/// contexts must keep it behind a single lock (see `StatusStore`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DebounceMachine {
    last_level: Level,
    status: Status,
}

impl DebounceMachine {
    /// Creates a machine primed with the level read at setup.
    pub const fn new(initial: Level) -> Self {
        Self {
            last_level: initial,
            status: Status::Unchanged,
        }
    }

    /// Applies one post-window sample and returns the resulting status.
    pub fn resample(&mut self, current: Level) -> Status {
        self.status = match (self.last_level, current) {
            (Level::High, Level::Low) => Status::Pressed,
            (Level::Low, Level::High) => Status::Released,
            _ => Status::Unchanged,
        };
        self.last_level = current;
        self.status
    }

    /// Records a window whose sample could not be taken.
    ///
    /// Treated as "no change": the status becomes `Unchanged` and the last
    /// settled level is kept.
    pub fn skip(&mut self) -> Status {
        self.status = Status::Unchanged;
        self.status
    }

    /// Returns the current status and resets it to `Unchanged`.
    pub fn take(&mut self) -> Status {
        core::mem::take(&mut self.status)
    }

    /// Current status without consuming it.
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Last settled pin level.
    #[inline]
    pub fn last_level(&self) -> Level {
        self.last_level
    }
}
