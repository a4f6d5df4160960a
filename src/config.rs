//! Pin assignment and matrix configuration.
//!
//! The panel is wired with eight control lines, each identified by a
//! single-character role name:
//!
//! | Role | Name | Signal |
//! |------|------|--------|
//! | [`PinRole::A`] .. [`PinRole::D`] | `a` `b` `c` `d` | row address bits 0..3 |
//! | [`PinRole::OutputEnable`] | `o` | output enable (active low, high blanks the panel) |
//! | [`PinRole::Data`] | `r` | serial data (R1) |
//! | [`PinRole::Strobe`] | `s` | latch / strobe |
//! | [`PinRole::Clock`] | `x` | shift clock |

use heapless::LinearMap;

use crate::DEFAULT_TICK_PERIOD_US;

/// Function of a control line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinRole {
    /// Row address bit 0
    A,
    /// Row address bit 1
    B,
    /// Row address bit 2
    C,
    /// Row address bit 3
    D,
    /// Output enable, drive high to blank
    OutputEnable,
    /// Serial pixel data
    Data,
    /// Latch strobe
    Strobe,
    /// Shift clock
    Clock,
}

impl PinRole {
    /// Every role, in the order pins are initialised.
    pub const ALL: [PinRole; 8] = [
        PinRole::A,
        PinRole::B,
        PinRole::C,
        PinRole::D,
        PinRole::OutputEnable,
        PinRole::Data,
        PinRole::Clock,
        PinRole::Strobe,
    ];

    /// Single-character role name.
    #[must_use]
    pub const fn name(self) -> char {
        match self {
            PinRole::A => 'a',
            PinRole::B => 'b',
            PinRole::C => 'c',
            PinRole::D => 'd',
            PinRole::OutputEnable => 'o',
            PinRole::Data => 'r',
            PinRole::Strobe => 's',
            PinRole::Clock => 'x',
        }
    }

    /// Parse a single-character role name.
    #[must_use]
    pub const fn from_name(name: char) -> Option<Self> {
        match name {
            'a' => Some(PinRole::A),
            'b' => Some(PinRole::B),
            'c' => Some(PinRole::C),
            'd' => Some(PinRole::D),
            'o' => Some(PinRole::OutputEnable),
            'r' => Some(PinRole::Data),
            's' => Some(PinRole::Strobe),
            'x' => Some(PinRole::Clock),
            _ => None,
        }
    }
}

/// Maps pin roles to GPIO pin numbers.
#[derive(Clone, Debug, Default)]
pub struct PinConfig {
    pins: LinearMap<PinRole, u8, 8>,
}

impl PinConfig {
    /// Create an empty pin map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pins: LinearMap::new(),
        }
    }

    /// Create a complete pin map in one call.
    #[allow(clippy::too_many_arguments)]
    #[allow(clippy::many_single_char_names)]
    #[must_use]
    pub fn with_pins(a: u8, b: u8, c: u8, d: u8, oe: u8, r1: u8, stb: u8, clk: u8) -> Self {
        let mut config = Self::new();
        config.set_pin(PinRole::A, a);
        config.set_pin(PinRole::B, b);
        config.set_pin(PinRole::C, c);
        config.set_pin(PinRole::D, d);
        config.set_pin(PinRole::OutputEnable, oe);
        config.set_pin(PinRole::Data, r1);
        config.set_pin(PinRole::Strobe, stb);
        config.set_pin(PinRole::Clock, clk);
        config
    }

    /// Assign `number` to `role`, replacing any previous assignment.
    pub fn set_pin(&mut self, role: PinRole, number: u8) {
        // one slot per role, so the map can never be full
        let _ = self.pins.insert(role, number);
    }

    /// Pin number assigned to `role`.
    #[must_use]
    pub fn get_pin(&self, role: PinRole) -> Option<u8> {
        self.pins.get(&role).copied()
    }

    /// Assign `number` to the role called `name`. Returns `false` for an
    /// unknown role name.
    pub fn set_pin_by_name(&mut self, name: char, number: u8) -> bool {
        match PinRole::from_name(name) {
            Some(role) => {
                self.set_pin(role, number);
                true
            }
            None => false,
        }
    }

    /// Pin number assigned to the role called `name`.
    #[must_use]
    pub fn get_pin_by_name(&self, name: char) -> Option<u8> {
        PinRole::from_name(name).and_then(|role| self.get_pin(role))
    }

    /// First role without a pin number, if any.
    #[must_use]
    pub fn missing(&self) -> Option<PinRole> {
        PinRole::ALL
            .into_iter()
            .find(|role| !self.pins.contains_key(role))
    }
}

/// Runtime settings for a [`crate::Matrix`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MatrixConfig {
    /// Keep separate working and displayed buffers. When `false` the scan
    /// reads the buffer being drawn, which is only tear-free if scan and tick
    /// never interleave mid-frame.
    pub double_buffered: bool,
    /// Minimum time between animation ticks, in microseconds.
    pub tick_period_us: u64,
    /// Extra per-row hold time after each scanned row, in microseconds. Longer
    /// holds dim the panel and lower the refresh rate.
    pub scan_modulation_us: u32,
    /// XOR mask applied to every byte as it is shifted out.
    pub scan_mask: u8,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            double_buffered: true,
            tick_period_us: DEFAULT_TICK_PERIOD_US,
            scan_modulation_us: 0,
            scan_mask: 0,
        }
    }
}
