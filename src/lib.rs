//! Framebuffer, scrolling text and row-scan driver for single-colour LED
//! dot-matrix panels.
//!
//! ## How Shift-Register LED Matrices Work
//!
//! Single-colour dot-matrix panels (the common 32 x 16 red "P10" style boards
//! and their relatives) are scanned, time-multiplexed displays. Only one row is
//! lit at any instant; the panel looks solid because every row is refreshed
//! faster than the eye can follow.
//!
//! ### Signal names
//! - **R1** - Serial pixel data for the row being loaded
//! - **CLK** - Shift-register clock; every rising edge moves the chain one pixel along
//! - **STB / LAT** - Strobe; copies the shift-register contents to the column drivers
//! - **OE** - Output enable (active low): LEDs are lit while OE is low and blanked while it is high
//! - **A B C D** - Row-address select lines, binary-coded
//!
//! ### Row scanning workflow
//! 1. While row N - 1 is still lit, the controller shifts the pixel bits for row N into the column chain.
//! 2. It raises OE to blank the panel.
//! 3. It drives A-D with the address of row N, then pulses STB to latch the new column data.
//! 4. It lowers OE again, lighting row N.
//! 5. Steps 1-4 repeat for every row, at least 60 full refreshes per second to avoid flicker.
//!
//! Brightness can be lowered by holding each row for a fixed extra delay after
//! it is lit, trading refresh rate for duty cycle.
//!
//! ## Crate Layout
//!
//! - [`buffer::PixelBuffer`]: packed 1-bit framebuffer, also an `embedded-graphics` draw target
//! - [`sprite`]: glyph sources and the clipped sprite blitter every text pixel goes through
//! - [`segment::Segment`]: an independently scrolling text region with its own font
//! - [`matrix::Matrix`]: double-buffered orchestration of segments and the scan loop
//! - [`driver`]: the row-scan protocol, bit-banged through a [`gpio::Gpio`] backend
//! - [`config`]: pin assignment and runtime settings
//! - [`dump`]: text dumps of a buffer for debugging
//!
//! ## Bit Order
//!
//! Pixel `(x, y)` is bit `x % 8` of byte `STRIDE * y + x / 8`, so bit 0 is the
//! leftmost pixel of each 8-pixel group, and a set bit is a lit LED. Rows are
//! shifted out last byte first, each byte most significant bit first.
//!
//! ## Available Feature Flags
//!
//! ### `defmt` Feature
//! Implements `defmt::Format` for the public types and routes the crate's
//! internal log statements to `defmt`.
//!
//! ### `log` Feature
//! Routes the crate's internal log statements to the `log` facade. Ignored when
//! `defmt` is also enabled.
//!
//! ```toml
//! [dependencies]
//! scan-matrix = { version = "0.1.0", features = ["log"] }
//! ```
#![no_std]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

#[macro_use]
mod fmt;

pub mod buffer;
pub mod config;
pub mod driver;
pub mod dump;
mod error;
pub mod gpio;
pub mod matrix;
pub mod segment;
pub mod sprite;

#[cfg(test)]
mod test_support;

pub use buffer::PixelBuffer;
pub use config::{MatrixConfig, PinConfig, PinRole};
pub use driver::{PanelDriver, RowAddress, ShiftRegisterDriver};
pub use error::Error;
pub use gpio::{Gpio, HalGpio, NullGpio};
pub use matrix::{Matrix, SegmentId};
pub use segment::Segment;
pub use sprite::{render_sprite, BitmapFont, BitmapGlyph, ClipRect, GlyphSource, Sprite};

/// Maximum number of code points a segment keeps. Longer text is truncated.
pub const TEXT_CAPACITY: usize = 64;

/// Blank columns between consecutive glyphs.
pub const CHARACTER_SPACING: i32 = 1;

/// Default minimum time between animation ticks, in microseconds.
pub const DEFAULT_TICK_PERIOD_US: u64 = 100_000;

/// Computes the number of bytes per buffer row for a panel `width` pixels wide
///
/// # Arguments
///
/// * `width` - Number of pixel columns
///
/// # Returns
///
/// `ceil(width / 8)`
#[must_use]
pub const fn compute_stride(width: usize) -> usize {
    width.div_ceil(8)
}

/// Computes the total size in bytes of a `width` x `height` buffer
#[must_use]
pub const fn compute_buffer_len(width: usize, height: usize) -> usize {
    compute_stride(width) * height
}
