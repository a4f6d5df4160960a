//! Row-scan output for shift-register panels.
//!
//! A panel is refreshed one row at a time. For each row the driver:
//!
//! 1. shifts the row's pixel bytes into the column shift registers,
//!    last byte first, each byte most significant bit first
//! 2. raises OE to blank the panel
//! 3. drives the A-D address lines
//! 4. pulses STB low, high, low to latch the shifted data
//! 5. lowers OE to light the new row
//!
//! Shifting happens while the previous row is still lit, so the panel is only
//! dark for the address change and latch pulse.
//!
//! Panels of this family address rows bottom-up: framebuffer row `r` of an
//! `H`-row panel is selected by address `H - 1 - r`. See
//! [`RowAddress::for_scan_row`].

use bitfield::bitfield;
use embedded_hal::delay::DelayNs;

use crate::config::{PinConfig, PinRole};
use crate::gpio::{BitOrder, Gpio, PinMode, PinState};
use crate::Error;

bitfield! {
    /// 4-bit row address driven onto the A-D lines.
    ///
    /// The bit layout is as follows:
    /// - Bit 3: D
    /// - Bit 2: C
    /// - Bit 1: B
    /// - Bit 0: A
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct RowAddress(u8);
    impl Debug;
    pub a, set_a: 0;
    pub b, set_b: 1;
    pub c, set_c: 2;
    pub d, set_d: 3;
    pub addr, set_addr: 3, 0;
}

impl RowAddress {
    /// Address selecting framebuffer row `scan_row` on a panel with `height`
    /// rows.
    #[must_use]
    pub const fn for_scan_row(scan_row: usize, height: usize) -> Self {
        debug_assert!(scan_row < height);
        Self(((height - 1 - scan_row) & 0x0F) as u8)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for RowAddress {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "RowAddress({=u8})", self.addr());
    }
}

/// Hardware side of a matrix: something that can latch one row of pixels.
pub trait PanelDriver {
    /// Error type of the output path.
    type Error: core::fmt::Debug;

    /// Put the output pins into their initial state.
    ///
    /// # Errors
    /// Returns the backend error if a pin cannot be configured.
    fn init(&mut self) -> Result<(), Self::Error>;

    /// Shift `row` out with every byte XORed with `mask`, then latch it at
    /// `address`.
    ///
    /// # Errors
    /// Returns the backend error if a pin write fails.
    fn write_row(&mut self, row: &[u8], address: RowAddress, mask: u8)
        -> Result<(), Self::Error>;

    /// Blank the panel.
    ///
    /// # Errors
    /// Returns the backend error if a pin write fails.
    fn blank(&mut self) -> Result<(), Self::Error>;

    /// Keep the current row lit for `us` microseconds.
    fn hold(&mut self, _us: u32) {}
}

/// Resolved pin numbers for every role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    /// Address bit 0
    pub a: u8,
    /// Address bit 1
    pub b: u8,
    /// Address bit 2
    pub c: u8,
    /// Address bit 3
    pub d: u8,
    /// Output enable
    pub oe: u8,
    /// Serial data
    pub r1: u8,
    /// Latch strobe
    pub stb: u8,
    /// Shift clock
    pub clk: u8,
}

impl PinMap {
    /// Look up every role in `config`.
    ///
    /// # Errors
    /// Returns [`Error::MissingPin`] for the first role without a number.
    pub fn resolve<E>(config: &PinConfig) -> Result<Self, Error<E>> {
        let pin = |role: PinRole| -> Result<u8, Error<E>> {
            config.get_pin(role).ok_or(Error::MissingPin(role))
        };
        Ok(Self {
            a: pin(PinRole::A)?,
            b: pin(PinRole::B)?,
            c: pin(PinRole::C)?,
            d: pin(PinRole::D)?,
            oe: pin(PinRole::OutputEnable)?,
            r1: pin(PinRole::Data)?,
            stb: pin(PinRole::Strobe)?,
            clk: pin(PinRole::Clock)?,
        })
    }

    const fn in_init_order(&self) -> [u8; 8] {
        [
            self.a, self.b, self.c, self.d, self.oe, self.r1, self.clk, self.stb,
        ]
    }
}

/// [`PanelDriver`] that bit-bangs a single-colour shift-register panel through
/// a [`Gpio`] backend.
///
/// `D` provides the per-row hold time used for scan modulation.
#[derive(Debug)]
pub struct ShiftRegisterDriver<G, D> {
    gpio: G,
    delay: D,
    pins: PinMap,
}

impl<G: Gpio, D: DelayNs> ShiftRegisterDriver<G, D> {
    /// Create a driver for the pins named in `config`.
    ///
    /// # Errors
    /// Returns [`Error::MissingPin`] if a role has no pin number.
    pub fn new(gpio: G, delay: D, config: &PinConfig) -> Result<Self, Error<G::Error>> {
        let pins = PinMap::resolve::<G::Error>(config)?;
        Ok(Self { gpio, delay, pins })
    }

    /// The resolved pin numbers.
    pub const fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// The GPIO backend.
    pub const fn gpio(&self) -> &G {
        &self.gpio
    }

    /// The GPIO backend, mutably.
    pub fn gpio_mut(&mut self) -> &mut G {
        &mut self.gpio
    }

    /// Give back the GPIO backend and the delay.
    pub fn release(self) -> (G, D) {
        (self.gpio, self.delay)
    }
}

impl<G: Gpio, D: DelayNs> PanelDriver for ShiftRegisterDriver<G, D> {
    type Error = G::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        for pin in self.pins.in_init_order() {
            self.gpio.set_pin_mode(pin, PinMode::Output)?;
        }
        self.gpio.digital_write(self.pins.oe, PinState::High)?;
        self.gpio.digital_write(self.pins.stb, PinState::Low)?;
        self.gpio.digital_write(self.pins.clk, PinState::Low)?;
        debug!("shift-register driver pins configured");
        Ok(())
    }

    fn write_row(
        &mut self,
        row: &[u8],
        address: RowAddress,
        mask: u8,
    ) -> Result<(), Self::Error> {
        let pins = self.pins;

        for &byte in row.iter().rev() {
            self.gpio
                .shift_out(pins.r1, pins.clk, BitOrder::MsbFirst, byte ^ mask)?;
        }

        self.gpio.digital_write(pins.oe, PinState::High)?;

        self.gpio.digital_write(pins.a, PinState::from(address.a()))?;
        self.gpio.digital_write(pins.b, PinState::from(address.b()))?;
        self.gpio.digital_write(pins.c, PinState::from(address.c()))?;
        self.gpio.digital_write(pins.d, PinState::from(address.d()))?;

        self.gpio.digital_write(pins.stb, PinState::Low)?;
        self.gpio.digital_write(pins.stb, PinState::High)?;
        self.gpio.digital_write(pins.stb, PinState::Low)?;

        self.gpio.digital_write(pins.oe, PinState::Low)
    }

    fn blank(&mut self) -> Result<(), Self::Error> {
        self.gpio.digital_write(self.pins.oe, PinState::High)
    }

    fn hold(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}
