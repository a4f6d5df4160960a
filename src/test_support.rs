//! Fixtures shared by the unit tests.

extern crate std;

use std::vec::Vec;

use embedded_hal::delay::DelayNs;

use crate::gpio::{Gpio, PinMode, PinState};
use crate::sprite::{BitmapFont, BitmapGlyph};

// 5x7 "H", 3x7 "I" and an 8x8 solid block on '#'
const H_RASTER: [u8; 7] = [
    0b1000_1000,
    0b1000_1000,
    0b1000_1000,
    0b1111_1000,
    0b1000_1000,
    0b1000_1000,
    0b1000_1000,
];
const I_RASTER: [u8; 7] = [
    0b1110_0000,
    0b0100_0000,
    0b0100_0000,
    0b0100_0000,
    0b0100_0000,
    0b0100_0000,
    0b1110_0000,
];
const BLOCK_RASTER: [u8; 8] = [0xFF; 8];

static TEST_GLYPHS: [(char, BitmapGlyph<'static>); 3] = [
    ('H', BitmapGlyph::new(5, 7, &H_RASTER)),
    ('I', BitmapGlyph::new(3, 7, &I_RASTER)),
    ('#', BitmapGlyph::new(8, 8, &BLOCK_RASTER)),
];

/// Font list with the test font at index 0.
pub(crate) static TEST_FONTS: [BitmapFont<'static>; 1] = [BitmapFont::new(&TEST_GLYPHS)];

pub(crate) fn test_font() -> &'static BitmapFont<'static> {
    &TEST_FONTS[0]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum GpioEvent {
    Mode(u8, PinMode),
    Write(u8, PinState),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct GpioFault(pub u8);

/// Records every call; fails mode changes on `fail_pin`.
#[derive(Debug, Default)]
pub(crate) struct RecordingGpio {
    pub events: Vec<GpioEvent>,
    pub fail_pin: Option<u8>,
}

impl RecordingGpio {
    pub fn failing_on(pin: u8) -> Self {
        Self {
            events: Vec::new(),
            fail_pin: Some(pin),
        }
    }

    /// Last level written to `pin`.
    pub fn level(&self, pin: u8) -> Option<PinState> {
        self.events.iter().rev().find_map(|event| match *event {
            GpioEvent::Write(p, level) if p == pin => Some(level),
            _ => None,
        })
    }

    pub fn writes_to(&self, pin: u8) -> Vec<PinState> {
        self.events
            .iter()
            .filter_map(|event| match *event {
                GpioEvent::Write(p, level) if p == pin => Some(level),
                _ => None,
            })
            .collect()
    }
}

impl Gpio for RecordingGpio {
    type Error = GpioFault;

    fn set_pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<(), Self::Error> {
        if self.fail_pin == Some(pin) {
            return Err(GpioFault(pin));
        }
        self.events.push(GpioEvent::Mode(pin, mode));
        Ok(())
    }

    fn digital_write(&mut self, pin: u8, level: PinState) -> Result<(), Self::Error> {
        self.events.push(GpioEvent::Write(pin, level));
        Ok(())
    }
}

/// Delay that returns immediately and sums the requested time.
#[derive(Debug, Default)]
pub(crate) struct TallyDelay {
    pub total_ns: u64,
}

impl DelayNs for TallyDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}
