//! Hardware description of the button node.

use crate::platform::{GpioNum, IrqNum};

/// Status value that marks a node as enabled.
pub const STATUS_OKAY: &str = "okay";

/// A button node as found in the hardware description.
///
/// Fields mirror the node properties: absent properties are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeviceNode<'a> {
    /// Node path, used in diagnostics.
    pub path: &'a str,
    /// `status` property. Absent means enabled.
    pub status: Option<&'a str>,
    /// `compatible` property.
    pub compatible: Option<&'a str>,
    /// GPIO the button is wired to.
    pub gpio: Option<u32>,
    /// Mapped interrupt line. `0` means the mapping failed.
    pub interrupt: Option<u32>,
}

/// Resources resolved from a [`DeviceNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Resources {
    pub gpio: GpioNum,
    pub irq: IrqNum,
}

/// Reasons a node cannot be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// Node status is present and not `"okay"`.
    Disabled,
    /// Node has no `compatible` property.
    MissingCompatible,
    /// Node is compatible with a different device.
    Incompatible,
    /// Node names no usable GPIO.
    MissingGpio,
    /// Node names no mapped interrupt.
    MissingInterrupt,
}

impl core::fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DescriptorError::Disabled => write!(f, "button node is disabled"),
            DescriptorError::MissingCompatible => write!(f, "button node has no compatible string"),
            DescriptorError::Incompatible => write!(f, "button node compatible string does not match"),
            DescriptorError::MissingGpio => write!(f, "failed to get button gpio"),
            DescriptorError::MissingInterrupt => write!(f, "failed to map button interrupt"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DescriptorError {}

impl DeviceNode<'_> {
    /// Validates the node and extracts the pin and interrupt line.
    pub fn resolve(&self, expected_compatible: &str) -> Result<Resources, DescriptorError> {
        if let Some(status) = self.status {
            if status != STATUS_OKAY {
                return Err(DescriptorError::Disabled);
            }
        }

        match self.compatible {
            None => return Err(DescriptorError::MissingCompatible),
            Some(compatible) if compatible != expected_compatible => {
                return Err(DescriptorError::Incompatible);
            }
            Some(_) => {}
        }

        let gpio = self.gpio.map(GpioNum).ok_or(DescriptorError::MissingGpio)?;
        let irq = self
            .interrupt
            .filter(|&irq| irq != 0)
            .map(IrqNum)
            .ok_or(DescriptorError::MissingInterrupt)?;

        Ok(Resources { gpio, irq })
    }
}
