//! Text dump of a pixel buffer for debugging.
//!
//! The dump has two parts: the raw bytes in hex, one buffer row per line,
//! followed by a grid with `#` for lit and `.` for dark pixels.
//!
//! ```rust
//! use scan_matrix::{compute_stride, PixelBuffer};
//!
//! let mut buffer = PixelBuffer::<8, 2, { compute_stride(8) }>::new();
//! buffer.set_pixel(0, 0);
//! buffer.set_pixel(7, 1);
//!
//! let text = format!("{}", buffer.dump());
//! assert_eq!(text, "01\n80\n\n# . . . . . . . \n. . . . . . . # \n");
//! ```

use core::fmt;

use crate::buffer::PixelBuffer;

/// Displays a buffer as a hex dump followed by a pixel grid.
#[derive(Clone, Copy)]
pub struct BufferDump<'a, const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> {
    buffer: &'a PixelBuffer<WIDTH, HEIGHT, STRIDE>,
}

impl<'a, const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>
    BufferDump<'a, WIDTH, HEIGHT, STRIDE>
{
    /// Wrap `buffer`.
    #[must_use]
    pub const fn new(buffer: &'a PixelBuffer<WIDTH, HEIGHT, STRIDE>) -> Self {
        Self { buffer }
    }

    /// Write only the hex bytes.
    ///
    /// # Errors
    /// Returns the writer's error.
    pub fn write_hex<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for y in 0..HEIGHT {
            for (i, byte) in self.buffer.row(y).iter().enumerate() {
                if i > 0 {
                    out.write_char(' ')?;
                }
                write!(out, "{byte:02x}")?;
            }
            out.write_char('\n')?;
        }
        Ok(())
    }

    /// Write only the pixel grid.
    ///
    /// # Errors
    /// Returns the writer's error.
    pub fn write_grid<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                out.write_str(if self.buffer.is_pixel_set(x, y) { "# " } else { ". " })?;
            }
            out.write_char('\n')?;
        }
        Ok(())
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> fmt::Display
    for BufferDump<'_, WIDTH, HEIGHT, STRIDE>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_hex(f)?;
        f.write_str("\n")?;
        self.write_grid(f)
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize> fmt::Debug
    for BufferDump<'_, WIDTH, HEIGHT, STRIDE>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>
    PixelBuffer<WIDTH, HEIGHT, STRIDE>
{
    /// Text dump of this buffer, see [`BufferDump`].
    #[must_use]
    pub const fn dump(&self) -> BufferDump<'_, WIDTH, HEIGHT, STRIDE> {
        BufferDump::new(self)
    }
}
