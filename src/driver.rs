//! Button driver lifecycle and reader interface.
//!
//! Provides [`ButtonDriver`], which owns the claimed pin, the interrupt
//! registration and the debounce timer for one button, and exposes the
//! debounced status through a read-and-reset [`read`](ButtonDriver::read).
//!
//! # Data flow
//!
//! ```text
//! edge -> irq handler -> timer.arm(debounce)
//!                          | quiet for the full window
//!                          v
//!               store.resample_with(pin.level) -> status
//!                                                   |
//!                                      read() <-----+ (take and reset)
//! ```
//!
//! The interrupt handler only re-arms the timer. It never takes the status
//! guard, so it cannot be held up by a reader or by a running re-sample.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::config::ButtonConfig;
use crate::descriptor::{DescriptorError, DeviceNode};
use crate::platform::{ButtonPin, GpioNum, IrqHandler, IrqNum, IrqReturn, Platform, Trigger};
use crate::status::{STATUS_RECORD_LEN, Status};
use crate::store::StatusStore;
use crate::timer::{DebounceTimer, ThreadTimer};

/// Name given to the debounce timer thread.
pub const TIMER_THREAD_NAME: &str = "key-debounce";

/// Errors that abort [`ButtonDriver::setup`].
///
/// Whatever was acquired before the failing step has been released again
/// by the time the error is returned.
#[derive(Debug)]
pub enum SetupError<E> {
    /// The node does not describe a usable button.
    Descriptor(DescriptorError),
    /// Claiming the pin failed.
    PinRequest(E),
    /// Reading the initial pin level failed.
    InitialLevel(E),
    /// The debounce timer thread could not be started.
    TimerSpawn(io::ErrorKind),
    /// Attaching the interrupt handler failed.
    IrqRequest(E),
}

impl<E: core::fmt::Display> core::fmt::Display for SetupError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SetupError::Descriptor(e) => write!(f, "invalid button node: {}", e),
            SetupError::PinRequest(e) => write!(f, "failed to request button gpio: {}", e),
            SetupError::InitialLevel(e) => write!(f, "failed to read initial button level: {}", e),
            SetupError::TimerSpawn(kind) => {
                write!(f, "failed to start debounce timer: {}", kind)
            }
            SetupError::IrqRequest(e) => write!(f, "failed to request button irq: {}", e),
        }
    }
}

impl<E: core::fmt::Debug + core::fmt::Display> std::error::Error for SetupError<E> {}

impl<E> From<DescriptorError> for SetupError<E> {
    fn from(e: DescriptorError) -> Self {
        SetupError::Descriptor(e)
    }
}

/// Errors returned by [`ButtonDriver::read_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// The destination cannot hold one status record.
    BufferTooSmall {
        /// Bytes a record needs.
        needed: usize,
        /// Bytes offered.
        got: usize,
    },
}

impl core::fmt::Display for ReadError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ReadError::BufferTooSmall { needed, got } => {
                write!(f, "read buffer too small: need {} bytes, got {}", needed, got)
            }
        }
    }
}

impl std::error::Error for ReadError {}

/// Driver for one debounced push-button.
///
/// Created by [`setup`](Self::setup) and released by
/// [`teardown`](Self::teardown), or on drop. `read` is safe to call from
/// any number of threads while edges are being handled.
///
/// # Type Parameters
/// * `P` - Platform owning the pin and interrupt line
pub struct ButtonDriver<P: Platform> {
    platform: P,
    gpio: GpioNum,
    irq: IrqNum,
    trigger: Trigger,
    debounce: Duration,
    store: Arc<StatusStore>,
    timer: Arc<ThreadTimer>,
    released: bool,
}

impl<P: Platform> ButtonDriver<P> {
    /// Binds the button described by `node` and starts handling edges.
    ///
    /// Acquisition order is: pin, initial level, debounce timer, interrupt.
    /// A failing step releases everything acquired before it, in reverse
    /// order, before the error is returned.
    pub fn setup(
        mut platform: P,
        node: &DeviceNode<'_>,
        config: &ButtonConfig,
    ) -> Result<Self, SetupError<P::Error>> {
        let resources = node.resolve(config.compatible())?;
        let (gpio, irq) = (resources.gpio, resources.irq);

        let pin = platform
            .request_pin(gpio, config.pin_label())
            .map_err(SetupError::PinRequest)?;

        let initial = match pin.level() {
            Ok(level) => level,
            Err(e) => {
                drop(pin);
                release_pin(&mut platform, gpio);
                return Err(SetupError::InitialLevel(e));
            }
        };

        let store = Arc::new(StatusStore::new(initial));
        let pin = Arc::new(pin);

        let timer = {
            let store = Arc::clone(&store);
            let pin = Arc::clone(&pin);
            ThreadTimer::spawn(TIMER_THREAD_NAME, move || {
                store.resample_with(|| pin.level());
            })
        };
        let timer = match timer {
            Ok(timer) => Arc::new(timer),
            Err(e) => {
                drop(pin);
                release_pin(&mut platform, gpio);
                return Err(SetupError::TimerSpawn(e.kind()));
            }
        };

        let trigger = config
            .trigger()
            .unwrap_or_else(|| platform.trigger_type(irq))
            .or_both();

        let handler: IrqHandler = {
            let timer = Arc::clone(&timer);
            let debounce = config.debounce();
            Arc::new(move || {
                timer.arm(debounce);
                IrqReturn::Handled
            })
        };

        if let Err(e) = platform.request_irq(irq, trigger, config.irq_label(), handler) {
            timer.cancel_and_join();
            drop(pin);
            release_pin(&mut platform, gpio);
            return Err(SetupError::IrqRequest(e));
        }

        info!(
            "button on {} ({}) ready: level {:?}, trigger {:?}, debounce {:?}",
            gpio,
            irq,
            initial,
            trigger,
            config.debounce()
        );

        Ok(Self {
            platform,
            gpio,
            irq,
            trigger,
            debounce: config.debounce(),
            store,
            timer,
            released: false,
        })
    }

    /// Returns the settled status and resets it to [`Status::Unchanged`].
    ///
    /// Never blocks on the interrupt path. Each `Pressed` or `Released` is
    /// returned to exactly one caller.
    pub fn read(&self) -> Status {
        self.store.take()
    }

    /// Reads the status into `buf` as one native-endian `i32` record.
    ///
    /// Returns the number of bytes written. The status is only consumed
    /// when it fits.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize, ReadError> {
        let got = buf.len();
        let record = buf
            .get_mut(..STATUS_RECORD_LEN)
            .ok_or(ReadError::BufferTooSmall {
                needed: STATUS_RECORD_LEN,
                got,
            })?;
        record.copy_from_slice(&self.read().to_ne_bytes());
        Ok(STATUS_RECORD_LEN)
    }

    /// Releases the timer, the interrupt and the pin, in that order.
    ///
    /// Once the timer is cancelled no re-sample runs again, even if an edge
    /// arrives before the interrupt is detached. Release failures are
    /// logged and do not stop the remaining steps.
    pub fn teardown(mut self) {
        self.release();
    }

    /// The claimed GPIO.
    pub fn gpio(&self) -> GpioNum {
        self.gpio
    }

    /// The attached interrupt line.
    pub fn irq(&self) -> IrqNum {
        self.irq
    }

    /// Trigger mode the interrupt was attached with.
    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// Debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.timer.cancel_and_join();
        if let Err(e) = self.platform.free_irq(self.irq) {
            warn!("failed to free {}: {}", self.irq, e);
        }
        release_pin(&mut self.platform, self.gpio);

        info!("button on {} released", self.gpio);
    }
}

impl<P: Platform> Drop for ButtonDriver<P> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<P: Platform> core::fmt::Debug for ButtonDriver<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ButtonDriver")
            .field("gpio", &self.gpio)
            .field("irq", &self.irq)
            .field("trigger", &self.trigger)
            .field("debounce", &self.debounce)
            .field("state", &self.store.snapshot())
            .finish()
    }
}

fn release_pin<P: Platform>(platform: &mut P, gpio: GpioNum) {
    if let Err(e) = platform.release_pin(gpio) {
        warn!("failed to release {}: {}", gpio, e);
    }
}
