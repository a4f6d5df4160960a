//! Numbered-pin GPIO capability used by the scan driver.
//!
//! [`Gpio`] mirrors the three calls a wiring-style GPIO library offers: set a
//! pin's mode, write a level, and shift a byte out over a data/clock pair.
//! [`HalGpio`] implements it on top of a bank of `embedded-hal`
//! [`OutputPin`]s, with the pin number used as the index into the bank.
//! [`NullGpio`] accepts every call and does nothing, for hosts without GPIO.

use core::convert::Infallible;

pub use embedded_hal::digital::PinState;
use embedded_hal::digital::OutputPin;

/// Direction of a GPIO pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinMode {
    /// High-impedance input
    Input,
    /// Push-pull output
    Output,
}

/// Order in which [`Gpio::shift_out`] emits the bits of a byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitOrder {
    /// Bit 7 first
    MsbFirst,
    /// Bit 0 first
    LsbFirst,
}

/// Write-only access to numbered GPIO pins.
///
/// Writes are fire-and-forget; nothing is read back.
pub trait Gpio {
    /// Backend error type.
    type Error: core::fmt::Debug;

    /// Configure the direction of `pin`.
    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error>;

    /// Drive `pin` to `level`.
    fn digital_write(&mut self, pin: u8, level: PinState) -> Result<(), Self::Error>;

    /// Clock the eight bits of `byte` out on `data_pin`.
    ///
    /// For every bit the data line is set first, then `clock_pin` is pulsed
    /// high and back low, so the receiving shift register samples on the
    /// rising edge.
    fn shift_out(
        &mut self,
        data_pin: u8,
        clock_pin: u8,
        order: BitOrder,
        byte: u8,
    ) -> Result<(), Self::Error> {
        for i in 0..8 {
            let bit = match order {
                BitOrder::MsbFirst => byte & (0x80 >> i),
                BitOrder::LsbFirst => byte & (1 << i),
            };
            self.digital_write(data_pin, PinState::from(bit != 0))?;
            self.digital_write(clock_pin, PinState::High)?;
            self.digital_write(clock_pin, PinState::Low)?;
        }
        Ok(())
    }
}

/// Errors from [`HalGpio`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalGpioError<E> {
    /// The underlying pin reported an error.
    Pin(E),
    /// The pin number is outside the bank.
    NoSuchPin(u8),
    /// The bank only holds outputs.
    InputUnsupported(u8),
}

/// [`Gpio`] over a bank of `embedded-hal` output pins.
///
/// Pin `n` is `pins[n]`. The pins are already outputs by construction, so
/// [`Gpio::set_pin_mode`] only validates the request.
///
/// # Example
/// ```rust,ignore
/// // any type-erased output pin works, e.g. esp-hal's `Output<'static>`
/// let gpio = HalGpio::new([a, b, c, d, oe, r1, stb, clk]);
/// let pins = PinConfig::with_pins(0, 1, 2, 3, 4, 5, 6, 7);
/// ```
#[derive(Debug)]
pub struct HalGpio<P, const N: usize> {
    pins: [P; N],
}

impl<P: OutputPin, const N: usize> HalGpio<P, N> {
    /// Take ownership of a pin bank.
    pub const fn new(pins: [P; N]) -> Self {
        Self { pins }
    }

    /// Give the pins back.
    pub fn release(self) -> [P; N] {
        self.pins
    }

    fn pin(&mut self, pin: u8) -> Result<&mut P, HalGpioError<P::Error>> {
        self.pins
            .get_mut(pin as usize)
            .ok_or(HalGpioError::NoSuchPin(pin))
    }
}

impl<P: OutputPin, const N: usize> Gpio for HalGpio<P, N> {
    type Error = HalGpioError<P::Error>;

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error> {
        self.pin(pin)?;
        match mode {
            PinMode::Output => Ok(()),
            PinMode::Input => Err(HalGpioError::InputUnsupported(pin)),
        }
    }

    fn digital_write(&mut self, pin: u8, level: PinState) -> Result<(), Self::Error> {
        self.pin(pin)?.set_state(level).map_err(HalGpioError::Pin)
    }
}

/// [`Gpio`] that ignores every call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullGpio;

impl Gpio for NullGpio {
    type Error = Infallible;

    fn set_pin_mode(&mut self, _pin: u8, _mode: PinMode) -> Result<(), Self::Error> {
        Ok(())
    }

    fn digital_write(&mut self, _pin: u8, _level: PinState) -> Result<(), Self::Error> {
        Ok(())
    }
}
