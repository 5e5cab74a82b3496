//! In-memory GPIO bank implementing [`Platform`].
//!
//! Drives the driver on a host without hardware: set the line level, and
//! the registered interrupt handler runs on the calling thread whenever the
//! edge matches the attached trigger. Every collaborator call can be made
//! to fail, and edges and pin samples are timestamped so tests can check
//! timing against what actually happened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use crate::platform::{ButtonPin, Edge, GpioNum, IrqHandler, IrqNum, IrqReturn, Platform, Trigger};
use crate::status::Level;

/// Errors produced by the simulated bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Resource already claimed.
    Busy,
    /// Resource released without being claimed.
    NotClaimed,
    /// Failure injected through [`SimFaults`], naming the operation.
    Injected(&'static str),
}

impl core::fmt::Display for SimError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SimError::Busy => write!(f, "resource busy"),
            SimError::NotClaimed => write!(f, "resource not claimed"),
            SimError::Injected(op) => write!(f, "injected {} failure", op),
        }
    }
}

impl std::error::Error for SimError {}

/// Operations to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SimFaults {
    pub request_pin: bool,
    pub read_level: bool,
    pub request_irq: bool,
    pub free_irq: bool,
    pub release_pin: bool,
}

/// Resource operations that succeeded, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    PinRequested(GpioNum),
    PinReleased(GpioNum),
    IrqRequested(IrqNum, Trigger),
    IrqFreed(IrqNum),
}

struct Attached {
    irq: IrqNum,
    trigger: Trigger,
    handler: IrqHandler,
}

struct Bank {
    level: Level,
    described_trigger: Trigger,
    claimed: Option<GpioNum>,
    attached: Option<Attached>,
    faults: SimFaults,
    events: Vec<SimEvent>,
    edges: Vec<(Instant, Edge)>,
    samples: Vec<(Instant, Level)>,
}

struct SimBank {
    // Held for the whole of a handler dispatch, so detaching waits for a
    // running handler. Always taken before `state`.
    dispatch: Mutex<()>,
    state: Mutex<Bank>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated GPIO controller with one button line.
///
/// Clones share the same bank, so a test can keep a handle after moving
/// one into the driver.
#[derive(Clone)]
pub struct SimPlatform {
    bank: Arc<SimBank>,
}

impl SimPlatform {
    /// Creates a bank whose line rests at `initial`, with no trigger
    /// described for its interrupt.
    pub fn new(initial: Level) -> Self {
        Self {
            bank: Arc::new(SimBank {
                dispatch: Mutex::new(()),
                state: Mutex::new(Bank {
                    level: initial,
                    described_trigger: Trigger::None,
                    claimed: None,
                    attached: None,
                    faults: SimFaults::default(),
                    events: Vec::new(),
                    edges: Vec::new(),
                    samples: Vec::new(),
                }),
            }),
        }
    }

    /// Sets the trigger mode the hardware description gives the line.
    pub fn with_trigger(self, trigger: Trigger) -> Self {
        lock(&self.bank.state).described_trigger = trigger;
        self
    }

    /// Replaces the injected faults.
    pub fn set_faults(&self, faults: SimFaults) {
        lock(&self.bank.state).faults = faults;
    }

    /// Drives the line to `level`.
    ///
    /// On a level change the edge is recorded and, if it matches the
    /// attached trigger, the handler runs before this returns. Returns the
    /// handler's answer, or `None` if no handler ran.
    pub fn set_level(&self, level: Level) -> Option<IrqReturn> {
        let _dispatch = lock(&self.bank.dispatch);
        let handler = {
            let mut bank = lock(&self.bank.state);
            let edge = Edge::between(bank.level, level)?;
            bank.level = level;
            bank.edges.push((Instant::now(), edge));
            bank.attached
                .as_ref()
                .filter(|attached| attached.trigger.matches(edge))
                .map(|attached| Arc::clone(&attached.handler))?
        };
        Some(handler())
    }

    /// Drives the line through `levels`, pausing `gap` between steps.
    pub fn bounce(&self, levels: &[Level], gap: Duration) {
        for (i, &level) in levels.iter().enumerate() {
            if i > 0 && !gap.is_zero() {
                thread::sleep(gap);
            }
            self.set_level(level);
        }
    }

    /// Current line level.
    pub fn level(&self) -> Level {
        lock(&self.bank.state).level
    }

    /// Successful resource operations so far.
    pub fn events(&self) -> Vec<SimEvent> {
        lock(&self.bank.state).events.clone()
    }

    /// Timestamped edges seen on the line.
    pub fn edges(&self) -> Vec<(Instant, Edge)> {
        lock(&self.bank.state).edges.clone()
    }

    /// Timestamped pin reads, including the one taken at setup.
    pub fn samples(&self) -> Vec<(Instant, Level)> {
        lock(&self.bank.state).samples.clone()
    }

    /// Returns `true` while the pin is claimed.
    pub fn pin_claimed(&self) -> bool {
        lock(&self.bank.state).claimed.is_some()
    }

    /// Trigger the handler is attached with, if any.
    pub fn attached_trigger(&self) -> Option<Trigger> {
        lock(&self.bank.state).attached.as_ref().map(|a| a.trigger)
    }
}

impl core::fmt::Debug for SimPlatform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let bank = lock(&self.bank.state);
        f.debug_struct("SimPlatform")
            .field("level", &bank.level)
            .field("claimed", &bank.claimed)
            .field("attached", &bank.attached.as_ref().map(|a| (a.irq, a.trigger)))
            .finish()
    }
}

/// Pin handed out by [`SimPlatform`].
pub struct SimPin {
    bank: Arc<SimBank>,
}

impl ButtonPin for SimPin {
    type Error = SimError;

    fn level(&self) -> Result<Level, Self::Error> {
        let mut bank = lock(&self.bank.state);
        if bank.faults.read_level {
            return Err(SimError::Injected("read_level"));
        }
        let level = bank.level;
        bank.samples.push((Instant::now(), level));
        Ok(level)
    }
}

impl Platform for SimPlatform {
    type Error = SimError;
    type Pin = SimPin;

    fn request_pin(&mut self, gpio: GpioNum, _label: &str) -> Result<SimPin, SimError> {
        let mut bank = lock(&self.bank.state);
        if bank.faults.request_pin {
            return Err(SimError::Injected("request_pin"));
        }
        if bank.claimed.is_some() {
            return Err(SimError::Busy);
        }
        bank.claimed = Some(gpio);
        bank.events.push(SimEvent::PinRequested(gpio));
        Ok(SimPin {
            bank: Arc::clone(&self.bank),
        })
    }

    fn release_pin(&mut self, gpio: GpioNum) -> Result<(), SimError> {
        let mut bank = lock(&self.bank.state);
        if bank.faults.release_pin {
            return Err(SimError::Injected("release_pin"));
        }
        if bank.claimed != Some(gpio) {
            return Err(SimError::NotClaimed);
        }
        bank.claimed = None;
        bank.events.push(SimEvent::PinReleased(gpio));
        Ok(())
    }

    fn trigger_type(&self, _irq: IrqNum) -> Trigger {
        lock(&self.bank.state).described_trigger
    }

    fn request_irq(
        &mut self,
        irq: IrqNum,
        trigger: Trigger,
        _label: &str,
        handler: IrqHandler,
    ) -> Result<(), SimError> {
        let mut bank = lock(&self.bank.state);
        if bank.faults.request_irq {
            return Err(SimError::Injected("request_irq"));
        }
        if bank.attached.is_some() {
            return Err(SimError::Busy);
        }
        bank.attached = Some(Attached {
            irq,
            trigger,
            handler,
        });
        bank.events.push(SimEvent::IrqRequested(irq, trigger));
        Ok(())
    }

    fn free_irq(&mut self, irq: IrqNum) -> Result<(), SimError> {
        let _dispatch = lock(&self.bank.dispatch);
        let mut bank = lock(&self.bank.state);
        if bank.faults.free_irq {
            return Err(SimError::Injected("free_irq"));
        }
        match bank.attached.take() {
            Some(attached) if attached.irq == irq => {
                bank.events.push(SimEvent::IrqFreed(irq));
                Ok(())
            }
            other => {
                bank.attached = other;
                Err(SimError::NotClaimed)
            }
        }
    }
}
