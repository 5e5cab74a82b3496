//! Pin levels and the debounced status reported to readers.

/// Raw electrical level of the button pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Pin driven low. With active-low wiring this is the pressed position.
    Low,
    /// Pin pulled high.
    High,
}

impl Level {
    /// Returns `true` if the level is low.
    #[inline]
    pub fn is_low(self) -> bool {
        self == Level::Low
    }

    /// Returns `true` if the level is high.
    #[inline]
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Level::High } else { Level::Low }
    }
}

/// Debounced button status as seen by a reader.
///
/// `Unchanged` is the idle value: it is what a reader gets when nothing
/// settled since its previous read, and what the store holds after a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Button went from released to pressed.
    Pressed,
    /// Button went from pressed to released.
    Released,
    /// No settled transition since the last read.
    #[default]
    Unchanged,
}

/// Size in bytes of one encoded status record.
pub const STATUS_RECORD_LEN: usize = core::mem::size_of::<i32>();

impl Status {
    /// Fixed-width integer code used on the read interface.
    ///
    /// `0` is a press, `1` a release and `2` the idle value.
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            Status::Pressed => 0,
            Status::Released => 1,
            Status::Unchanged => 2,
        }
    }

    /// Native-endian record handed to readers of the device.
    #[inline]
    pub const fn to_ne_bytes(self) -> [u8; STATUS_RECORD_LEN] {
        self.code().to_ne_bytes()
    }

    /// Returns `true` for `Pressed` and `Released`.
    #[inline]
    pub fn is_event(self) -> bool {
        self != Status::Unchanged
    }
}

/// A status code outside the known range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidCode(pub i32);

impl core::fmt::Display for InvalidCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "invalid status code {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidCode {}

impl TryFrom<i32> for Status {
    type Error = InvalidCode;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::Pressed),
            1 => Ok(Status::Released),
            2 => Ok(Status::Unchanged),
            other => Err(InvalidCode(other)),
        }
    }
}
