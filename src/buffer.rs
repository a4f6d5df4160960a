//! Packed 1-bit-per-pixel framebuffer.
//!
//! # Memory Layout
//! The buffer is row-major with byte-aligned rows. Each row occupies
//! `STRIDE = ceil(WIDTH / 8)` bytes, so the pixel `(x, y)` lives in byte
//! `STRIDE * y + x / 8`.
//!
//! Within a byte, pixel `x` maps to bit `x % 8`: bit 0 is the leftmost pixel
//! of the 8-pixel group and bit 7 the rightmost. A set bit (`1`) is a lit LED.
//! The scan driver shifts each row out in reverse byte order, MSB first, so
//! the serial stream runs from the rightmost pixel to the leftmost and the
//! last bit clocked into the daisy chain lands on physical column 0.
//!
//! # Preconditions
//! The per-pixel and region operations do not clip. Callers must keep every
//! coordinate inside `[0, WIDTH) x [0, HEIGHT)`; violations trip a
//! `debug_assert!` in debug builds and an index panic otherwise. Clipped
//! drawing goes through [`crate::sprite::render_sprite`] or the
//! `embedded-graphics` [`DrawTarget`] impl, both of which discard
//! out-of-range pixels.
//!
//! # Example
//! ```rust
//! use embedded_graphics::pixelcolor::BinaryColor;
//! use embedded_graphics::prelude::*;
//! use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
//! use scan_matrix::{compute_stride, PixelBuffer};
//!
//! const WIDTH: usize = 32;
//! const HEIGHT: usize = 16;
//! const STRIDE: usize = compute_stride(WIDTH);
//!
//! let mut buffer = PixelBuffer::<WIDTH, HEIGHT, STRIDE>::new();
//! buffer.set_pixel(3, 4);
//! assert!(buffer.is_pixel_set(3, 4));
//!
//! Rectangle::new(Point::new(10, 2), Size::new(4, 4))
//!     .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
//!     .draw(&mut buffer)
//!     .unwrap();
//! assert_eq!(buffer.lit_pixels(), 17);
//! ```

use core::convert::Infallible;

use embedded_dma::ReadBuffer;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::{OriginDimensions, Size};
use embedded_graphics::Pixel;

use crate::compute_stride;

/// Packed monochrome framebuffer for a `WIDTH` x `HEIGHT` panel.
///
/// # Type Parameters
/// - `WIDTH`: Number of pixel columns
/// - `HEIGHT`: Number of pixel rows
/// - `STRIDE`: Bytes per row, must equal [`compute_stride`]`(WIDTH)`
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(C)]
pub struct PixelBuffer<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> {
    rows: [[u8; STRIDE]; HEIGHT],
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> Default
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>
    PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    /// Create a zeroed (all pixels off) buffer.
    ///
    /// # Panics
    /// Panics (at compile time when used in a const context) if `STRIDE` is
    /// not `ceil(WIDTH / 8)`.
    #[must_use]
    pub const fn new() -> Self {
        assert!(
            STRIDE == compute_stride(WIDTH),
            "STRIDE must be compute_stride(WIDTH)"
        );
        Self {
            rows: [[0; STRIDE]; HEIGHT],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> usize {
        WIDTH
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> usize {
        HEIGHT
    }

    /// Bytes per row.
    #[must_use]
    pub const fn stride(&self) -> usize {
        STRIDE
    }

    #[inline(always)]
    fn locate(x: usize, y: usize) -> (usize, usize, u8) {
        debug_assert!(x < WIDTH, "x out of range");
        debug_assert!(y < HEIGHT, "y out of range");
        (y, x / 8, 1 << (x % 8))
    }

    /// Switch the pixel at `(x, y)` on.
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let (row, byte, bit) = Self::locate(x, y);
        self.rows[row][byte] |= bit;
    }

    /// Switch the pixel at `(x, y)` off.
    #[inline]
    pub fn clear_pixel(&mut self, x: usize, y: usize) {
        let (row, byte, bit) = Self::locate(x, y);
        self.rows[row][byte] &= !bit;
    }

    /// Set the pixel at `(x, y)` to `on`.
    #[inline]
    pub fn write_pixel(&mut self, x: usize, y: usize, on: bool) {
        if on {
            self.set_pixel(x, y);
        } else {
            self.clear_pixel(x, y);
        }
    }

    /// XOR the pixel at `(x, y)` with `apply`.
    ///
    /// `mask_pixel(x, y, false)` is a no-op and applying `true` twice restores
    /// the original value.
    #[inline]
    pub fn mask_pixel(&mut self, x: usize, y: usize, apply: bool) {
        let (row, byte, bit) = Self::locate(x, y);
        if apply {
            self.rows[row][byte] ^= bit;
        }
    }

    /// Query the pixel at `(x, y)`.
    #[inline]
    #[must_use]
    pub fn is_pixel_set(&self, x: usize, y: usize) -> bool {
        let (row, byte, bit) = Self::locate(x, y);
        self.rows[row][byte] & bit != 0
    }

    /// Switch off every pixel in the `w` x `h` rectangle at `(x, y)`.
    pub fn clear_region(&mut self, x: usize, y: usize, w: usize, h: usize) {
        for py in y..y + h {
            for px in x..x + w {
                self.clear_pixel(px, py);
            }
        }
    }

    /// XOR every pixel in the `w` x `h` rectangle at `(x, y)` with `apply`.
    pub fn mask_region(&mut self, x: usize, y: usize, w: usize, h: usize, apply: bool) {
        if !apply {
            return;
        }
        for py in y..y + h {
            for px in x..x + w {
                self.mask_pixel(px, py, true);
            }
        }
    }

    /// Switch off every pixel.
    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(0);
        }
    }

    /// Overwrite this buffer with the contents of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.rows = other.rows;
    }

    /// The packed bytes of row `y`.
    #[must_use]
    pub fn row(&self, y: usize) -> &[u8; STRIDE] {
        &self.rows[y]
    }

    /// All packed bytes, row after row.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.rows.as_flattened()
    }

    /// Number of lit pixels.
    #[must_use]
    pub fn lit_pixels(&self) -> usize {
        self.as_bytes()
            .iter()
            .map(|byte| byte.count_ones() as usize)
            .sum()
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> OriginDimensions
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    fn size(&self) -> Size {
        Size::new(WIDTH as u32, HEIGHT as u32)
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> DrawTarget
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    type Color = BinaryColor;

    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as usize, point.y as usize);
            if x >= WIDTH || y >= HEIGHT {
                continue;
            }
            self.write_pixel(x, y, color.is_on());
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        if !color.is_on() {
            self.clear();
            return Ok(());
        }
        // padding bits past WIDTH stay dark
        for row in &mut self.rows {
            for (i, byte) in row.iter_mut().enumerate() {
                let columns = WIDTH.saturating_sub(i * 8).min(8);
                *byte = ((1u16 << columns) - 1) as u8;
            }
        }
        Ok(())
    }
}

unsafe impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> ReadBuffer
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    type Word = u8;

    unsafe fn read_buffer(&self) -> (*const u8, usize) {
        let ptr = &self.rows as *const _ as *const u8;
        let len = core::mem::size_of_val(&self.rows);
        (ptr, len)
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> core::fmt::Debug
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("stride", &STRIDE)
            .field("size", &core::mem::size_of_val(&self.rows))
            .field("lit_pixels", &self.lit_pixels())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> defmt::Format
    for PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "PixelBuffer<{}, {}, {}>", WIDTH, HEIGHT, STRIDE);
        defmt::write!(f, " size: {}", core::mem::size_of_val(&self.rows));
        defmt::write!(f, " lit_pixels: {}", self.lit_pixels());
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;

    use super::*;
    use embedded_graphics::prelude::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    const TEST_WIDTH: usize = 32;
    const TEST_HEIGHT: usize = 16;
    const TEST_STRIDE: usize = compute_stride(TEST_WIDTH);

    type TestBuffer = PixelBuffer<TEST_WIDTH, TEST_HEIGHT, TEST_STRIDE>;

    #[test]
    fn test_new_is_blank() {
        let buffer = TestBuffer::new();
        assert_eq!(buffer.as_bytes().len(), TEST_STRIDE * TEST_HEIGHT);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_dimensions() {
        let buffer = TestBuffer::new();
        assert_eq!(buffer.width(), 32);
        assert_eq!(buffer.height(), 16);
        assert_eq!(buffer.stride(), 4);
        assert_eq!(buffer.size(), Size::new(32, 16));
    }

    #[test]
    fn test_set_and_clear_every_pixel() {
        let mut buffer = TestBuffer::new();
        for y in 0..TEST_HEIGHT {
            for x in 0..TEST_WIDTH {
                buffer.set_pixel(x, y);
                assert!(buffer.is_pixel_set(x, y));
                buffer.clear_pixel(x, y);
                assert!(!buffer.is_pixel_set(x, y));
            }
        }
        assert_eq!(buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_bit_mapping_leftmost_pixel_is_bit_zero() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(0, 0);
        buffer.set_pixel(7, 0);
        buffer.set_pixel(8, 0);
        buffer.set_pixel(31, 1);

        assert_eq!(buffer.row(0)[0], 0b1000_0001);
        assert_eq!(buffer.row(0)[1], 0b0000_0001);
        assert_eq!(buffer.row(1)[3], 0b1000_0000);
        // byte offset is stride * y + x / 8
        assert_eq!(buffer.as_bytes()[TEST_STRIDE + 3], 0b1000_0000);
    }

    #[test]
    fn test_set_pixel_does_not_touch_neighbours() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(12, 5);
        assert_eq!(buffer.lit_pixels(), 1);
        assert!(!buffer.is_pixel_set(11, 5));
        assert!(!buffer.is_pixel_set(13, 5));
        assert!(!buffer.is_pixel_set(12, 4));
        assert!(!buffer.is_pixel_set(12, 6));
    }

    #[test]
    fn test_write_pixel() {
        let mut buffer = TestBuffer::new();
        buffer.write_pixel(3, 3, true);
        assert!(buffer.is_pixel_set(3, 3));
        buffer.write_pixel(3, 3, false);
        assert!(!buffer.is_pixel_set(3, 3));
    }

    #[test]
    fn test_mask_pixel_is_self_inverse() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(4, 4);

        for (x, y) in [(4, 4), (5, 4), (31, 15)] {
            let original = buffer.is_pixel_set(x, y);
            buffer.mask_pixel(x, y, true);
            assert_ne!(buffer.is_pixel_set(x, y), original);
            buffer.mask_pixel(x, y, true);
            assert_eq!(buffer.is_pixel_set(x, y), original);
        }
    }

    #[test]
    fn test_mask_pixel_false_is_noop() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(1, 1);
        let before = buffer;
        buffer.mask_pixel(1, 1, false);
        buffer.mask_pixel(2, 1, false);
        assert_eq!(buffer, before);
    }

    #[test]
    fn test_clear_region() {
        let mut buffer = TestBuffer::new();
        DrawTarget::clear(&mut buffer, BinaryColor::On).unwrap();
        buffer.clear_region(4, 2, 8, 3);

        for y in 0..TEST_HEIGHT {
            for x in 0..TEST_WIDTH {
                let inside = (4..12).contains(&x) && (2..5).contains(&y);
                assert_eq!(buffer.is_pixel_set(x, y), !inside, "({x}, {y})");
            }
        }
    }

    #[test]
    fn test_mask_region_inverts_only_region() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(5, 5);
        buffer.mask_region(4, 4, 3, 3, true);

        assert!(!buffer.is_pixel_set(5, 5));
        assert!(buffer.is_pixel_set(4, 4));
        assert!(buffer.is_pixel_set(6, 6));
        assert!(!buffer.is_pixel_set(7, 7));
        assert_eq!(buffer.lit_pixels(), 8);

        buffer.mask_region(4, 4, 3, 3, true);
        assert_eq!(buffer.lit_pixels(), 1);
        assert!(buffer.is_pixel_set(5, 5));
    }

    #[test]
    fn test_clear() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(0, 0);
        buffer.set_pixel(31, 15);
        buffer.clear();
        assert_eq!(buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_copy_from() {
        let mut source = TestBuffer::new();
        source.set_pixel(9, 9);
        let mut target = TestBuffer::new();
        target.set_pixel(1, 1);
        target.copy_from(&source);
        assert_eq!(target, source);
    }

    #[test]
    fn test_draw_target_clips() {
        let mut buffer = TestBuffer::new();
        let pixels = [
            Pixel(Point::new(-1, 0), BinaryColor::On),
            Pixel(Point::new(0, -1), BinaryColor::On),
            Pixel(Point::new(32, 0), BinaryColor::On),
            Pixel(Point::new(0, 16), BinaryColor::On),
            Pixel(Point::new(2, 2), BinaryColor::On),
        ];
        buffer.draw_iter(pixels).unwrap();
        assert_eq!(buffer.lit_pixels(), 1);
        assert!(buffer.is_pixel_set(2, 2));

        buffer
            .draw_iter([Pixel(Point::new(2, 2), BinaryColor::Off)])
            .unwrap();
        assert_eq!(buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_embedded_graphics_integration() {
        let mut buffer = TestBuffer::new();
        Rectangle::new(Point::new(-2, -2), Size::new(4, 4))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut buffer)
            .unwrap();
        assert_eq!(buffer.lit_pixels(), 4);
    }

    #[test]
    fn test_read_buffer_implementation() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(0, 0);
        unsafe {
            let (ptr, len) = buffer.read_buffer();
            assert!(!ptr.is_null());
            assert_eq!(len, TEST_STRIDE * TEST_HEIGHT);
            assert_eq!(*ptr, 0b0000_0001);
        }
    }

    #[test]
    fn test_non_multiple_of_eight_width() {
        let mut buffer = PixelBuffer::<12, 2, { compute_stride(12) }>::new();
        assert_eq!(buffer.stride(), 2);
        buffer.set_pixel(11, 1);
        assert_eq!(buffer.row(1)[1], 0b0000_1000);
    }

    #[test]
    fn test_fill_leaves_padding_dark() {
        let mut buffer = PixelBuffer::<12, 3, { compute_stride(12) }>::new();
        DrawTarget::clear(&mut buffer, BinaryColor::On).unwrap();
        assert_eq!(buffer.lit_pixels(), 12 * 3);
        for y in 0..3 {
            assert_eq!(buffer.row(y), &[0xFF, 0x0F]);
        }

        DrawTarget::clear(&mut buffer, BinaryColor::Off).unwrap();
        assert_eq!(buffer.lit_pixels(), 0);

        let mut full = TestBuffer::new();
        DrawTarget::clear(&mut full, BinaryColor::On).unwrap();
        assert_eq!(full.lit_pixels(), TEST_WIDTH * TEST_HEIGHT);
    }

    #[test]
    fn test_debug_formatting() {
        let buffer = TestBuffer::new();
        let debug_string = format!("{:?}", buffer);
        assert!(debug_string.contains("PixelBuffer"));
        assert!(debug_string.contains("stride: 4"));
        assert!(debug_string.contains("lit_pixels: 0"));
    }
}
