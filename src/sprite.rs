//! Glyph sources and the clipped sprite renderer.
//!
//! All text reaches the framebuffer through [`render_sprite`], which clips
//! every write to a half-open rectangle. Fonts are external: anything that
//! can hand out a [`Sprite`] for a `char` implements [`GlyphSource`]. Two
//! sources ship with the crate:
//!
//! - [`BitmapFont`], a static table of packed [`BitmapGlyph`]s
//! - `embedded-graphics` [`MonoFont`]s such as `FONT_6X10`

use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::image::{GetPixel, ImageRaw};
use embedded_graphics::mono_font::mapping::GlyphMapping;
use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::primitives::Rectangle;

use crate::buffer::PixelBuffer;

/// A monochrome bitmap that can be blitted with [`render_sprite`].
pub trait Sprite {
    /// Width in pixels.
    fn width(&self) -> u16;

    /// Height in pixels.
    fn height(&self) -> u16;

    /// Whether the sprite pixel at `(x, y)` is lit. Only called with
    /// `x < width()` and `y < height()`.
    fn is_set(&self, x: u16, y: u16) -> bool;
}

/// Looks up the glyph for a code point.
pub trait GlyphSource {
    /// Glyph type handed out by this source.
    type Glyph<'a>: Sprite
    where
        Self: 'a;

    /// Return the glyph for `c`, or `None` if the font has no glyph for it.
    fn glyph(&self, c: char) -> Option<Self::Glyph<'_>>;
}

/// Bytes per row of a packed glyph raster.
#[must_use]
pub const fn glyph_stride(width: u16) -> usize {
    (width as usize).div_ceil(8)
}

/// Packed glyph bitmap.
///
/// Rows are stored top to bottom, each [`glyph_stride`]`(width)` bytes long.
/// Within a row the most significant bit of the first byte is the leftmost
/// pixel, the layout used by GNU Unifont `.hex` files and most hand-written
/// font tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitmapGlyph<'a> {
    width: u16,
    height: u16,
    raster: &'a [u8],
}

impl<'a> BitmapGlyph<'a> {
    /// Wrap a packed raster.
    ///
    /// # Panics
    /// Panics if `raster` is shorter than `glyph_stride(width) * height`.
    #[must_use]
    pub const fn new(width: u16, height: u16, raster: &'a [u8]) -> Self {
        assert!(
            raster.len() >= glyph_stride(width) * height as usize,
            "glyph raster too short"
        );
        Self {
            width,
            height,
            raster,
        }
    }

    /// The packed raster.
    #[must_use]
    pub const fn raster(&self) -> &'a [u8] {
        self.raster
    }
}

impl Sprite for BitmapGlyph<'_> {
    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn is_set(&self, x: u16, y: u16) -> bool {
        let byte = self.raster[glyph_stride(self.width) * y as usize + x as usize / 8];
        byte & (0x80 >> (x % 8)) != 0
    }
}

/// Font backed by a static `(char, glyph)` table.
#[derive(Clone, Copy, Debug)]
pub struct BitmapFont<'a> {
    glyphs: &'a [(char, BitmapGlyph<'a>)],
}

impl<'a> BitmapFont<'a> {
    /// Create a font from a glyph table. Lookup is linear; the first entry
    /// for a code point wins.
    #[must_use]
    pub const fn new(glyphs: &'a [(char, BitmapGlyph<'a>)]) -> Self {
        Self { glyphs }
    }

    /// Number of glyphs in the table.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl GlyphSource for BitmapFont<'_> {
    type Glyph<'g>
        = BitmapGlyph<'g>
    where
        Self: 'g;

    fn glyph(&self, c: char) -> Option<BitmapGlyph<'_>> {
        self.glyphs
            .iter()
            .find(|(code, _)| *code == c)
            .map(|(_, glyph)| *glyph)
    }
}

/// One glyph cell of an `embedded-graphics` [`MonoFont`] atlas.
#[derive(Clone, Copy, Debug)]
pub struct MonoGlyph<'a> {
    image: &'a ImageRaw<'a, BinaryColor>,
    origin: Point,
    size: Size,
}

impl Sprite for MonoGlyph<'_> {
    fn width(&self) -> u16 {
        self.size.width as u16
    }

    fn height(&self) -> u16 {
        self.size.height as u16
    }

    fn is_set(&self, x: u16, y: u16) -> bool {
        let p = self.origin + Point::new(i32::from(x), i32::from(y));
        self.image.pixel(p).is_some_and(|color| color == BinaryColor::On)
    }
}

impl GlyphSource for MonoFont<'_> {
    type Glyph<'g>
        = MonoGlyph<'g>
    where
        Self: 'g;

    /// Mono fonts map unknown characters to their replacement glyph, so this
    /// never returns `None`.
    fn glyph(&self, c: char) -> Option<MonoGlyph<'_>> {
        let size = self.character_size;
        if size.width == 0 || size.height == 0 {
            return None;
        }
        let per_row = (self.image.size().width / size.width).max(1);
        let index = self.glyph_mapping.index(c) as u32;
        let origin = Point::new(
            ((index % per_row) * size.width) as i32,
            ((index / per_row) * size.height) as i32,
        );
        Some(MonoGlyph {
            image: &self.image,
            origin,
            size,
        })
    }
}

/// Half-open clip rectangle `[x0, x1) x [y0, y1)` in panel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClipRect {
    /// Leftmost column included.
    pub x0: i32,
    /// Topmost row included.
    pub y0: i32,
    /// First column excluded.
    pub x1: i32,
    /// First row excluded.
    pub y1: i32,
}

impl ClipRect {
    /// Construct from corner coordinates.
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whether no pixel can pass this clip.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Overlap of two clip rectangles.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Whether `(x, y)` passes the clip.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

impl From<Rectangle> for ClipRect {
    fn from(rect: Rectangle) -> Self {
        Self {
            x0: rect.top_left.x,
            y0: rect.top_left.y,
            x1: rect.top_left.x + rect.size.width as i32,
            y1: rect.top_left.y + rect.size.height as i32,
        }
    }
}

/// Blit `sprite` with its top-left corner at `(x, y)`.
///
/// Every sprite pixel whose destination falls inside `clip` overwrites the
/// buffer: lit sprite pixels are set, dark ones cleared. Destinations outside
/// `clip`, or outside the buffer itself, are skipped.
pub fn render_sprite<S, const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>(
    buffer: &mut PixelBuffer<WIDTH, HEIGHT, STRIDE>,
    sprite: &S,
    x: i32,
    y: i32,
    clip: ClipRect,
) where
    S: Sprite + ?Sized,
{
    let clip = clip.intersect(&ClipRect::new(0, 0, WIDTH as i32, HEIGHT as i32));
    if clip.is_empty() {
        return;
    }

    // visible window in sprite coordinates
    let bx0 = clip.x0.saturating_sub(x).max(0);
    let by0 = clip.y0.saturating_sub(y).max(0);
    let bx1 = clip.x1.saturating_sub(x).min(i32::from(sprite.width()));
    let by1 = clip.y1.saturating_sub(y).min(i32::from(sprite.height()));

    for by in by0..by1 {
        let dy = (y + by) as usize;
        for bx in bx0..bx1 {
            let dx = (x + bx) as usize;
            buffer.write_pixel(dx, dy, sprite.is_set(bx as u16, by as u16));
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::compute_stride;
    use embedded_graphics::mono_font::ascii::FONT_6X10;

    const TEST_WIDTH: usize = 32;
    const TEST_HEIGHT: usize = 16;
    const TEST_STRIDE: usize = compute_stride(TEST_WIDTH);

    type TestBuffer = PixelBuffer<TEST_WIDTH, TEST_HEIGHT, TEST_STRIDE>;

    // 5x7 "H" and 3x7 "I"
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
    const FULL_RASTER: [u8; 8 * 2] = [0xFF; 16];

    static GLYPHS: [(char, BitmapGlyph<'static>); 2] = [
        ('H', BitmapGlyph::new(5, 7, &H_RASTER)),
        ('I', BitmapGlyph::new(3, 7, &I_RASTER)),
    ];

    fn lit_outside(buffer: &TestBuffer, clip: &ClipRect) -> usize {
        let mut count = 0;
        for y in 0..TEST_HEIGHT {
            for x in 0..TEST_WIDTH {
                if buffer.is_pixel_set(x, y) && !clip.contains(x as i32, y as i32) {
                    count += 1;
                }
            }
        }
        count
    }

    #[test]
    fn test_glyph_stride() {
        assert_eq!(glyph_stride(0), 0);
        assert_eq!(glyph_stride(1), 1);
        assert_eq!(glyph_stride(8), 1);
        assert_eq!(glyph_stride(9), 2);
        assert_eq!(glyph_stride(16), 2);
    }

    #[test]
    fn test_bitmap_glyph_pixels() {
        let h = BitmapGlyph::new(5, 7, &H_RASTER);
        assert_eq!(h.width(), 5);
        assert_eq!(h.height(), 7);
        assert!(h.is_set(0, 0));
        assert!(!h.is_set(1, 0));
        assert!(h.is_set(4, 0));
        assert!(h.is_set(2, 3));
    }

    #[test]
    fn test_wide_glyph_uses_two_bytes_per_row() {
        let raster = [0b0000_0000, 0b1000_0000, 0b1000_0000, 0b0000_0000];
        let glyph = BitmapGlyph::new(9, 2, &raster);
        assert!(glyph.is_set(8, 0));
        assert!(!glyph.is_set(7, 0));
        assert!(glyph.is_set(0, 1));
    }

    #[test]
    #[should_panic(expected = "glyph raster too short")]
    fn test_short_raster_panics() {
        let _ = BitmapGlyph::new(8, 4, &[0u8; 3]);
    }

    #[test]
    fn test_bitmap_font_lookup() {
        let font = BitmapFont::new(&GLYPHS);
        assert_eq!(font.len(), 2);
        assert!(!font.is_empty());
        assert_eq!(font.glyph('H').map(|g| g.width()), Some(5));
        assert_eq!(font.glyph('I').map(|g| g.width()), Some(3));
        assert!(font.glyph('?').is_none());
    }

    #[test]
    fn test_mono_font_glyph() {
        let glyph = FONT_6X10.glyph('A').unwrap();
        assert_eq!(glyph.width(), 6);
        assert_eq!(glyph.height(), 10);

        let lit = (0..10)
            .flat_map(|y| (0..6).map(move |x| (x, y)))
            .filter(|&(x, y)| glyph.is_set(x, y))
            .count();
        assert!(lit > 0);

        let space = FONT_6X10.glyph(' ').unwrap();
        let lit = (0..10)
            .flat_map(|y| (0..6).map(move |x| (x, y)))
            .filter(|&(x, y)| space.is_set(x, y))
            .count();
        assert_eq!(lit, 0);
    }

    #[test]
    fn test_clip_rect_from_rectangle() {
        let clip = ClipRect::from(Rectangle::new(Point::new(2, 3), Size::new(4, 5)));
        assert_eq!(clip, ClipRect::new(2, 3, 6, 8));
        assert!(clip.contains(2, 3));
        assert!(!clip.contains(6, 3));
        assert!(!clip.contains(2, 8));
    }

    #[test]
    fn test_clip_rect_intersect() {
        let a = ClipRect::new(0, 0, 10, 10);
        let b = ClipRect::new(5, -5, 20, 5);
        assert_eq!(a.intersect(&b), ClipRect::new(5, 0, 10, 5));
        assert!(ClipRect::new(3, 0, 3, 10).is_empty());
    }

    #[test]
    fn test_render_sprite_unclipped() {
        let mut buffer = TestBuffer::new();
        let h = BitmapGlyph::new(5, 7, &H_RASTER);
        render_sprite(&mut buffer, &h, 1, 2, ClipRect::new(0, 0, 32, 16));

        assert!(buffer.is_pixel_set(1, 2));
        assert!(!buffer.is_pixel_set(2, 2));
        assert!(buffer.is_pixel_set(5, 2));
        assert!(buffer.is_pixel_set(3, 5));
        assert_eq!(buffer.lit_pixels(), 7 * 2 + 3);
    }

    #[test]
    fn test_render_sprite_clears_dark_pixels() {
        let mut buffer = TestBuffer::new();
        buffer.set_pixel(2, 2);
        let h = BitmapGlyph::new(5, 7, &H_RASTER);
        render_sprite(&mut buffer, &h, 1, 2, ClipRect::new(0, 0, 32, 16));
        assert!(!buffer.is_pixel_set(2, 2));
    }

    #[test]
    fn test_render_sprite_containment() {
        let full = BitmapGlyph::new(16, 8, &FULL_RASTER);
        let clip = ClipRect::new(8, 4, 20, 10);

        for (x, y) in [
            (-100, -100),
            (100, 100),
            (-12, 4),
            (0, 0),
            (6, 2),
            (14, 8),
            (19, 9),
            (40, 0),
        ] {
            let mut buffer = TestBuffer::new();
            render_sprite(&mut buffer, &full, x, y, clip);
            assert_eq!(lit_outside(&buffer, &clip), 0, "sprite at ({x}, {y})");
        }
    }

    #[test]
    fn test_render_sprite_partial_clip() {
        let mut buffer = TestBuffer::new();
        let full = BitmapGlyph::new(16, 8, &FULL_RASTER);
        let clip = ClipRect::new(8, 4, 20, 10);
        render_sprite(&mut buffer, &full, 6, 2, clip);
        // x 8..20 (12 columns), y 4..10 (6 rows)
        assert_eq!(buffer.lit_pixels(), 12 * 6);
    }

    #[test]
    fn test_render_sprite_clip_beyond_buffer() {
        let mut buffer = TestBuffer::new();
        let full = BitmapGlyph::new(16, 8, &FULL_RASTER);
        render_sprite(&mut buffer, &full, 24, 12, ClipRect::new(0, 0, 100, 100));
        assert_eq!(buffer.lit_pixels(), 8 * 4);
    }

    #[test]
    fn test_render_sprite_empty_clip() {
        let mut buffer = TestBuffer::new();
        let full = BitmapGlyph::new(16, 8, &FULL_RASTER);
        render_sprite(&mut buffer, &full, 0, 0, ClipRect::new(5, 5, 5, 5));
        assert_eq!(buffer.lit_pixels(), 0);
    }

    #[test]
    fn test_render_sprite_extreme_origin() {
        let mut buffer = TestBuffer::new();
        let full = BitmapGlyph::new(16, 8, &FULL_RASTER);
        let clip = ClipRect::new(0, 0, TEST_WIDTH as i32, TEST_HEIGHT as i32);
        for (x, y) in [(i32::MIN, 0), (i32::MAX, 0), (0, i32::MIN), (0, i32::MAX)] {
            render_sprite(&mut buffer, &full, x, y, clip);
        }
        assert_eq!(buffer.lit_pixels(), 0);
    }
}
