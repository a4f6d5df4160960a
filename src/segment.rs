//! Independently animated text regions.
//!
//! A [`Segment`] owns a rectangle of the panel, a line of text and the state
//! needed to scroll it. It holds no reference to its matrix or font: both are
//! passed in by the caller on every call that needs them, and the segment
//! stores only the index of its font in the matrix's font list.
//!
//! # Scrolling
//!
//! The text origin is kept as a fractional offset from the segment's top-left
//! corner and advanced by the signed speed on every [`Segment::tick`]. Once the
//! text has scrolled fully out on one side it re-enters from the other: with
//! `P` the text width and `W` the segment width, the horizontal offset stays in
//! `[-P, W]` and a speed of one pixel per tick repeats every `W + P` ticks.
//! Vertical scrolling does the same with the text and segment heights.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::primitives::Rectangle;
use heapless::Vec;

use crate::buffer::PixelBuffer;
use crate::sprite::{render_sprite, ClipRect, GlyphSource, Sprite};
use crate::{CHARACTER_SPACING, TEXT_CAPACITY};

/// One rectangular text region of the display.
#[derive(Clone, Debug)]
pub struct Segment {
    x: u16,
    y: u16,
    width: u16,
    height: u16,
    font_index: usize,
    text: Vec<char, TEXT_CAPACITY>,
    text_pixel_width: u16,
    text_pixel_height: u16,
    hspeed: f32,
    vspeed: f32,
    hpos: f32,
    vpos: f32,
    visible: bool,
    paused: bool,
    reverse: bool,
    dirty: bool,
}

impl Segment {
    /// Create a visible, stopped segment with no text.
    #[must_use]
    pub const fn new(x: u16, y: u16, width: u16, height: u16, font_index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            font_index,
            text: Vec::new(),
            text_pixel_width: 0,
            text_pixel_height: 0,
            hspeed: 0.0,
            vspeed: 0.0,
            hpos: 0.0,
            vpos: 0.0,
            visible: true,
            paused: true,
            reverse: false,
            dirty: true,
        }
    }

    /// Segment covering a whole `width` x `height` panel.
    #[must_use]
    pub const fn full_screen(width: u16, height: u16, font_index: usize) -> Self {
        Self::new(0, 0, width, height, font_index)
    }

    /// Left edge in panel pixels.
    #[must_use]
    pub const fn x(&self) -> u16 {
        self.x
    }

    /// Top edge in panel pixels.
    #[must_use]
    pub const fn y(&self) -> u16 {
        self.y
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.height
    }

    /// The segment rectangle.
    #[must_use]
    pub fn bounds(&self) -> Rectangle {
        Rectangle::new(
            Point::new(i32::from(self.x), i32::from(self.y)),
            Size::new(u32::from(self.width), u32::from(self.height)),
        )
    }

    /// Index of this segment's font in the matrix font list.
    #[must_use]
    pub const fn font_index(&self) -> usize {
        self.font_index
    }

    /// The stored text, after truncation.
    #[must_use]
    pub fn text(&self) -> &[char] {
        &self.text
    }

    /// Rendered width of the text, including inter-character spacing.
    #[must_use]
    pub const fn text_pixel_width(&self) -> u16 {
        self.text_pixel_width
    }

    /// Height of the tallest glyph in the text.
    #[must_use]
    pub const fn text_pixel_height(&self) -> u16 {
        self.text_pixel_height
    }

    /// Horizontal and vertical scroll speed, in pixels per tick.
    #[must_use]
    pub const fn text_speed(&self) -> (f32, f32) {
        (self.hspeed, self.vspeed)
    }

    /// Text origin relative to the segment's top-left corner.
    #[must_use]
    pub const fn text_position(&self) -> (f32, f32) {
        (self.hpos, self.vpos)
    }

    /// Whether the segment is drawn.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether scrolling is stopped.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether the segment is shown in reverse video.
    #[must_use]
    pub const fn is_reversed(&self) -> bool {
        self.reverse
    }

    /// Whether the rendered pixels are stale.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the text moves on every tick.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        !self.paused && (self.hspeed != 0.0 || self.vspeed != 0.0)
    }

    /// Make the segment visible.
    pub fn show(&mut self) {
        self.visible = true;
        self.dirty = true;
    }

    /// Hide the segment. Its rectangle is cleared on the next tick.
    pub fn hide(&mut self) {
        self.visible = false;
        self.dirty = true;
    }

    /// Resume scrolling.
    pub fn start(&mut self) {
        self.paused = false;
        self.dirty = true;
    }

    /// Freeze the text at its current position.
    pub fn stop(&mut self) {
        self.paused = true;
        self.dirty = true;
    }

    /// Force a redraw on the next tick.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Toggle reverse video. Takes effect on the next tick.
    pub fn reverse(&mut self) {
        self.reverse = !self.reverse;
        self.dirty = true;
    }

    /// Replace the text, keeping at most [`TEXT_CAPACITY`] code points, and
    /// measure it with `font`.
    ///
    /// Returns the number of code points kept.
    pub fn set_text<F: GlyphSource + ?Sized>(&mut self, text: &str, font: &F) -> usize {
        self.text.clear();
        self.text.extend(text.chars().take(TEXT_CAPACITY));
        if self.text.len() == TEXT_CAPACITY && text.chars().nth(TEXT_CAPACITY).is_some() {
            debug!("segment text truncated to {} code points", TEXT_CAPACITY);
        }
        self.measure(font);
        self.dirty = true;
        self.text.len()
    }

    /// Drop the text and reset speed and position.
    pub fn clear_text(&mut self) {
        self.text.clear();
        self.text_pixel_width = 0;
        self.text_pixel_height = 0;
        self.hspeed = 0.0;
        self.vspeed = 0.0;
        self.hpos = 0.0;
        self.vpos = 0.0;
        self.dirty = true;
    }

    /// Set the scroll speed in pixels per tick. Negative horizontal speeds
    /// scroll left, negative vertical speeds scroll up.
    ///
    /// Non-finite speeds are ignored.
    pub fn set_text_speed(&mut self, hspeed: f32, vspeed: f32) {
        if !(hspeed.is_finite() && vspeed.is_finite()) {
            warn!("ignoring non-finite text speed");
            return;
        }
        self.hspeed = hspeed;
        self.vspeed = vspeed;
        self.dirty = true;
    }

    /// Move the text origin, relative to the segment's top-left corner.
    ///
    /// Non-finite positions are ignored.
    pub fn set_text_position(&mut self, hpos: f32, vpos: f32) {
        if !(hpos.is_finite() && vpos.is_finite()) {
            warn!("ignoring non-finite text position");
            return;
        }
        self.hpos = hpos;
        self.vpos = vpos;
        self.dirty = true;
    }

    /// Position that centres the text in the segment.
    ///
    /// Uses whole-pixel halves, so odd leftovers put the extra pixel on the
    /// right or bottom.
    #[must_use]
    pub fn query_center_text(&self) -> (f32, f32) {
        let centre = |outer: u16, inner: u16| f32::from(outer / 2) - f32::from(inner / 2);
        (
            centre(self.width, self.text_pixel_width),
            centre(self.height, self.text_pixel_height),
        )
    }

    /// Centre the text horizontally and/or vertically.
    pub fn center_text(&mut self, horizontal: bool, vertical: bool) {
        let (hpos, vpos) = self.query_center_text();
        if horizontal {
            self.hpos = hpos;
        }
        if vertical {
            self.vpos = vpos;
        }
        self.dirty = true;
    }

    /// Turn off every pixel of the segment rectangle.
    pub fn clear<const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>(
        &self,
        buffer: &mut PixelBuffer<WIDTH, HEIGHT, STRIDE>,
    ) {
        if let Some((x, y, w, h)) = self.region(WIDTH, HEIGHT) {
            buffer.clear_region(x, y, w, h);
        }
    }

    /// Advance the animation by one step and redraw into `buffer` if needed.
    ///
    /// Returns `true` if the segment rectangle was redrawn.
    pub fn tick<F, const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>(
        &mut self,
        buffer: &mut PixelBuffer<WIDTH, HEIGHT, STRIDE>,
        font: &F,
    ) -> bool
    where
        F: GlyphSource + ?Sized,
    {
        if !self.visible {
            if self.dirty {
                self.clear(buffer);
                self.dirty = false;
                return true;
            }
            return false;
        }

        let scrolling = self.is_scrolling();
        if scrolling {
            if self.hspeed != 0.0 {
                self.hpos = wrap(self.hpos + self.hspeed, self.text_pixel_width, self.width);
            }
            if self.vspeed != 0.0 {
                self.vpos = wrap(self.vpos + self.vspeed, self.text_pixel_height, self.height);
            }
        }

        if self.dirty || scrolling {
            self.render_text(buffer, font);
            self.dirty = false;
            return true;
        }
        false
    }

    /// Redraw the segment: clear its rectangle, draw every glyph at the
    /// current position clipped to the rectangle, then invert the rectangle
    /// when reverse video is on.
    ///
    /// Characters the font has no glyph for are skipped.
    pub fn render_text<F, const WIDTH: usize, const HEIGHT: usize, const STRIDE: usize>(
        &self,
        buffer: &mut PixelBuffer<WIDTH, HEIGHT, STRIDE>,
        font: &F,
    ) where
        F: GlyphSource + ?Sized,
    {
        let Some((rx, ry, rw, rh)) = self.region(WIDTH, HEIGHT) else {
            return;
        };
        buffer.clear_region(rx, ry, rw, rh);

        let clip = ClipRect::from(self.bounds());
        let origin_x =
            i32::from(self.x) + offscreen_clamp(self.hpos, self.text_pixel_width, self.width);
        let origin_y =
            i32::from(self.y) + offscreen_clamp(self.vpos, self.text_pixel_height, self.height);

        let mut advance = 0;
        for &c in &self.text {
            let Some(glyph) = font.glyph(c) else {
                continue;
            };
            let gx = origin_x.saturating_add(advance);
            if gx < clip.x1 {
                render_sprite(buffer, &glyph, gx, origin_y, clip);
            }
            advance = advance.saturating_add(i32::from(glyph.width()) + CHARACTER_SPACING);
        }

        buffer.mask_region(rx, ry, rw, rh, self.reverse);
    }

    fn measure<F: GlyphSource + ?Sized>(&mut self, font: &F) {
        let mut width: u32 = 0;
        let mut height: u16 = 0;
        for &c in &self.text {
            if let Some(glyph) = font.glyph(c) {
                width += u32::from(glyph.width()) + CHARACTER_SPACING as u32;
                height = height.max(glyph.height());
            }
        }
        self.text_pixel_width = u16::try_from(width).unwrap_or(u16::MAX);
        self.text_pixel_height = height;
    }

    // segment rectangle clipped to the buffer
    fn region(&self, width: usize, height: usize) -> Option<(usize, usize, usize, usize)> {
        let x = usize::from(self.x);
        let y = usize::from(self.y);
        let w = usize::from(self.width).min(width.saturating_sub(x));
        let h = usize::from(self.height).min(height.saturating_sub(y));
        (w > 0 && h > 0).then_some((x, y, w, h))
    }
}

fn wrap(pos: f32, text_extent: u16, segment_extent: u16) -> f32 {
    let low = -f32::from(text_extent);
    let high = f32::from(segment_extent);
    let period = high - low;
    if !pos.is_finite() {
        return 0.0;
    }
    if period <= 0.0 || (low..=high).contains(&pos) {
        return pos;
    }
    let r = (pos - low) % period;
    low + if r < 0.0 { r + period } else { r }
}

// nothing is drawn past these limits
fn offscreen_clamp(pos: f32, text_extent: u16, segment_extent: u16) -> i32 {
    let low = -f32::from(text_extent) - 1.0;
    let high = f32::from(segment_extent) + 1.0;
    pos.clamp(low, high) as i32
}
