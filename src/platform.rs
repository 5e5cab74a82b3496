//! Hardware abstraction traits for the pin and interrupt line.
//!
//! Implement [`Platform`] for your GPIO controller to let the driver claim
//! the button pin, sample it, and attach an edge interrupt to it.

#[cfg(feature = "std")]
use std::sync::Arc;

use crate::status::Level;

/// GPIO number of the button pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioNum(pub u32);

/// Interrupt line the button pin is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqNum(pub u32);

impl core::fmt::Display for GpioNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "gpio{}", self.0)
    }
}

impl core::fmt::Display for IrqNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "irq{}", self.0)
    }
}

/// Direction of a single electrical transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low to high.
    Rising,
    /// High to low.
    Falling,
}

impl Edge {
    /// Edge taking the line from `from` to `to`, if the level changed.
    pub fn between(from: Level, to: Level) -> Option<Self> {
        match (from, to) {
            (Level::Low, Level::High) => Some(Edge::Rising),
            (Level::High, Level::Low) => Some(Edge::Falling),
            _ => None,
        }
    }
}

/// Interrupt trigger mode of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Trigger {
    /// No trigger configured.
    #[default]
    None,
    /// Rising edges only.
    Rising,
    /// Falling edges only.
    Falling,
    /// Both edges.
    Both,
}

impl Trigger {
    /// Returns `true` if an edge of this kind raises the interrupt.
    pub fn matches(self, edge: Edge) -> bool {
        matches!(
            (self, edge),
            (Trigger::Both, _) | (Trigger::Rising, Edge::Rising) | (Trigger::Falling, Edge::Falling)
        )
    }

    /// Falls back to both edges when nothing is configured, so press and
    /// release are both observed.
    pub fn or_both(self) -> Self {
        match self {
            Trigger::None => Trigger::Both,
            other => other,
        }
    }
}

/// Value returned by an interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IrqReturn {
    /// The interrupt was ours and has been dealt with.
    Handled,
    /// The interrupt was not raised by this device.
    ///
    /// Only meaningful on a line shared between devices; the button handler
    /// owns its line and always answers `Handled`.
    NotMine,
}

/// Handler attached to an interrupt line.
///
/// Called from interrupt context: it must return quickly and never block.
#[cfg(feature = "std")]
pub type IrqHandler = Arc<dyn Fn() -> IrqReturn + Send + Sync>;

/// A claimed input pin that can be sampled.
pub trait ButtonPin: Send + Sync + 'static {
    /// Error returned when the level cannot be read.
    type Error: core::fmt::Debug;

    /// Samples the current raw level.
    fn level(&self) -> Result<Level, Self::Error>;
}

/// GPIO and interrupt controller owning the button resources.
///
/// Every resource handed out by `request_*` is given back exactly once
/// through the matching release call.
#[cfg(feature = "std")]
pub trait Platform {
    /// Error type shared by all platform operations.
    type Error: core::fmt::Debug + core::fmt::Display;

    /// Claimed pin type.
    type Pin: ButtonPin<Error = Self::Error>;

    /// Claims `gpio` and configures it as an input.
    fn request_pin(&mut self, gpio: GpioNum, label: &str) -> Result<Self::Pin, Self::Error>;

    /// Releases a pin claimed with [`Platform::request_pin`].
    fn release_pin(&mut self, gpio: GpioNum) -> Result<(), Self::Error>;

    /// Trigger mode described for `irq`, or [`Trigger::None`] if unset.
    fn trigger_type(&self, irq: IrqNum) -> Trigger;

    /// Attaches `handler` to `irq` with the given trigger mode.
    fn request_irq(
        &mut self,
        irq: IrqNum,
        trigger: Trigger,
        label: &str,
        handler: IrqHandler,
    ) -> Result<(), Self::Error>;

    /// Detaches the handler from `irq`. No handler invocation is running or
    /// starts after this returns.
    fn free_irq(&mut self, irq: IrqNum) -> Result<(), Self::Error>;
}
