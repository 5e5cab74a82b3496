#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Status`**: What a reader gets: `Pressed`, `Released` or the idle `Unchanged`
//! - **`Level`**: Raw electrical level of the button pin
//! - **`DebounceMachine`**: Transition table applied once per settled debounce window
//! - **`StatusStore`**: The machine behind the single guard shared by re-samples and readers
//! - **`DebounceTimer`**: Single-shot delay where re-arming replaces the pending firing
//! - **`ThreadTimer`**: `DebounceTimer` backed by a dedicated worker thread
//! - **`Platform`** / **`ButtonPin`**: Traits to implement for your GPIO and interrupt controller
//! - **`DeviceNode`**: Hardware description of the button, resolved into a pin and an interrupt line
//! - **`ButtonConfig`**: Debounce window, labels and trigger override
//! - **`ButtonDriver`**: Owns the resources of one button and exposes `read()`
//!
//! The pure parts (`status`, `machine`, `descriptor`, `config`, `platform`
//! traits) build without `std`. The store, timer, driver and simulated
//! platform need the `std` feature, enabled by default.

pub mod config;
pub mod descriptor;
pub mod machine;
pub mod platform;
pub mod status;

#[cfg(feature = "std")]
pub mod driver;
#[cfg(feature = "std")]
pub mod sim;
#[cfg(feature = "std")]
pub mod store;
#[cfg(feature = "std")]
pub mod timer;

pub use config::{ButtonConfig, ButtonConfigBuilder, ConfigError, DEBOUNCE_DELAY, MAX_DEBOUNCE};
pub use descriptor::{DescriptorError, DeviceNode, Resources};
pub use machine::DebounceMachine;
pub use platform::{ButtonPin, Edge, GpioNum, IrqNum, IrqReturn, Trigger};
pub use status::{InvalidCode, Level, STATUS_RECORD_LEN, Status};

#[cfg(feature = "std")]
pub use driver::{ButtonDriver, ReadError, SetupError};
#[cfg(feature = "std")]
pub use platform::{IrqHandler, Platform};
#[cfg(feature = "std")]
pub use store::StatusStore;
#[cfg(feature = "std")]
pub use timer::{DebounceTimer, ThreadTimer};
