//! Driver configuration and its builder.

use core::time::Duration;

use heapless::String;

use crate::platform::Trigger;

/// Quiet time the line must hold before it is re-sampled.
pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(15);

/// Longest accepted debounce window.
pub const MAX_DEBOUNCE: Duration = Duration::from_secs(1);

/// Maximum length of a compatible string or resource label.
pub const LABEL_CAPACITY: usize = 32;

/// Bounded label string.
pub type Label = String<LABEL_CAPACITY>;

/// Default compatible string of the button node.
pub const DEFAULT_COMPATIBLE: &str = "alientek,key";

/// Default label used when claiming the pin.
pub const DEFAULT_PIN_LABEL: &str = "Key Gpio";

/// Default label used when attaching the interrupt.
pub const DEFAULT_IRQ_LABEL: &str = "PS Key0 IRQ";

/// Configuration validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A zero debounce delay would re-sample inside the bounce.
    ZeroDebounce,

    /// Debounce window longer than [`MAX_DEBOUNCE`].
    DebounceTooLong,

    /// Label longer than [`LABEL_CAPACITY`].
    LabelTooLong,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConfigError::ZeroDebounce => write!(f, "debounce delay must be non-zero"),
            ConfigError::DebounceTooLong => {
                write!(f, "debounce delay exceeds {:?}", MAX_DEBOUNCE)
            }
            ConfigError::LabelTooLong => {
                write!(f, "label exceeds {} bytes", LABEL_CAPACITY)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

/// Settings the driver is set up with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonConfig {
    debounce: Duration,
    compatible: Label,
    pin_label: Label,
    irq_label: Label,
    trigger: Option<Trigger>,
}

impl ButtonConfig {
    /// Creates a builder starting from the defaults.
    pub fn builder() -> ButtonConfigBuilder {
        ButtonConfigBuilder::new()
    }

    /// Debounce window.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Compatible string the node must carry.
    pub fn compatible(&self) -> &str {
        self.compatible.as_str()
    }

    /// Label for the claimed pin.
    pub fn pin_label(&self) -> &str {
        self.pin_label.as_str()
    }

    /// Label for the attached interrupt.
    pub fn irq_label(&self) -> &str {
        self.irq_label.as_str()
    }

    /// Explicit trigger mode, if one overrides the platform's.
    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            debounce: DEBOUNCE_DELAY,
            compatible: label(DEFAULT_COMPATIBLE),
            pin_label: label(DEFAULT_PIN_LABEL),
            irq_label: label(DEFAULT_IRQ_LABEL),
            trigger: None,
        }
    }
}

// Only for the compile-time defaults above, all shorter than the capacity.
fn label(s: &str) -> Label {
    let mut out = Label::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

fn try_label(s: &str) -> Result<Label, ConfigError> {
    let mut out = Label::new();
    out.push_str(s).map_err(|_| ConfigError::LabelTooLong)?;
    Ok(out)
}

/// Builder for [`ButtonConfig`].
///
/// Validates each value as it is set and the whole on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct ButtonConfigBuilder {
    config: ButtonConfig,
}

impl ButtonConfigBuilder {
    /// Creates a builder holding the defaults.
    pub fn new() -> Self {
        Self {
            config: ButtonConfig::default(),
        }
    }

    /// Sets the debounce window.
    pub fn debounce(mut self, delay: Duration) -> Self {
        self.config.debounce = delay;
        self
    }

    /// Sets the debounce window in milliseconds.
    pub fn debounce_ms(self, millis: u64) -> Self {
        self.debounce(Duration::from_millis(millis))
    }

    /// Sets the compatible string the node must carry.
    ///
    /// # Errors
    /// `LabelTooLong` if the string exceeds [`LABEL_CAPACITY`].
    pub fn compatible(mut self, compatible: &str) -> Result<Self, ConfigError> {
        self.config.compatible = try_label(compatible)?;
        Ok(self)
    }

    /// Sets the pin label.
    ///
    /// # Errors
    /// `LabelTooLong` if the label exceeds [`LABEL_CAPACITY`].
    pub fn pin_label(mut self, pin_label: &str) -> Result<Self, ConfigError> {
        self.config.pin_label = try_label(pin_label)?;
        Ok(self)
    }

    /// Sets the interrupt label.
    ///
    /// # Errors
    /// `LabelTooLong` if the label exceeds [`LABEL_CAPACITY`].
    pub fn irq_label(mut self, irq_label: &str) -> Result<Self, ConfigError> {
        self.config.irq_label = try_label(irq_label)?;
        Ok(self)
    }

    /// Forces a trigger mode instead of asking the platform.
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.config.trigger = Some(trigger);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    /// `ZeroDebounce` if the debounce window is zero, `DebounceTooLong` if
    /// it exceeds [`MAX_DEBOUNCE`].
    pub fn build(self) -> Result<ButtonConfig, ConfigError> {
        if self.config.debounce.is_zero() {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.config.debounce > MAX_DEBOUNCE {
            return Err(ConfigError::DebounceTooLong);
        }
        Ok(self.config)
    }
}

impl Default for ButtonConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
