use core::fmt;

use crate::config::PinRole;

/// Errors raised while setting up or driving a matrix.
///
/// `E` is the error type of the GPIO backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error<E> {
    /// A pin-mode change or pin write failed.
    Gpio(E),
    /// The pin configuration has no number for this role.
    MissingPin(PinRole),
    /// The segment list is full.
    SegmentCapacity,
    /// A segment rectangle does not fit inside the panel.
    SegmentBounds,
    /// A segment references a font index outside the font list.
    UnknownFont(usize),
    /// The segment id does not name a segment of this matrix.
    UnknownSegment,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Gpio(err)
    }
}

impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Gpio(err) => write!(f, "gpio error: {err:?}"),
            Error::MissingPin(role) => write!(f, "no pin configured for role '{}'", role.name()),
            Error::SegmentCapacity => f.write_str("segment list is full"),
            Error::SegmentBounds => f.write_str("segment does not fit inside the panel"),
            Error::UnknownFont(index) => write!(f, "font index {index} is not in the font list"),
            Error::UnknownSegment => f.write_str("unknown segment id"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for Error<E> {}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for Error<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Gpio(err) => defmt::write!(f, "gpio error: {}", err),
            Error::MissingPin(role) => defmt::write!(f, "no pin configured for role {}", role),
            Error::SegmentCapacity => defmt::write!(f, "segment list is full"),
            Error::SegmentBounds => defmt::write!(f, "segment does not fit inside the panel"),
            Error::UnknownFont(index) => {
                defmt::write!(f, "font index {} is not in the font list", index);
            }
            Error::UnknownSegment => defmt::write!(f, "unknown segment id"),
        }
    }
}
