//! Display orchestration.
//!
//! [`Matrix`] ties together the two pixel buffers, the segment list, the font
//! list and a [`PanelDriver`]. It runs two independent loops:
//!
//! - the animation loop, [`Matrix::tick`], advances every segment and draws
//!   into the working buffer, then makes it the displayed buffer
//! - the scan loop, [`Matrix::scan`], pushes one row of the displayed buffer
//!   to the panel per call
//!
//! Both take `&mut self`, so a frame can never be scanned while it is being
//! drawn. To run the scan loop from a timer interrupt, keep the matrix behind a
//! `critical_section::Mutex<RefCell<_>>` or an equivalent lock.
//!
//! # Double buffering
//!
//! With double buffering on, every tick starts by copying the displayed frame
//! into the working buffer. Segments that have not changed leave their pixels
//! alone and segments that have changed redraw their own rectangle, so the
//! finished working buffer is a complete frame. Making it visible is an index
//! flip.
//!
//! With double buffering off, ticks draw straight into the displayed buffer.
//!
//! # Example
//!
//! ```rust
//! use scan_matrix::{
//!     compute_stride, BitmapFont, BitmapGlyph, Matrix, MatrixConfig, NullGpio, PinConfig,
//!     ShiftRegisterDriver,
//! };
//! # struct NoDelay;
//! # impl embedded_hal::delay::DelayNs for NoDelay {
//! #     fn delay_ns(&mut self, _ns: u32) {}
//! # }
//!
//! const WIDTH: usize = 32;
//! const HEIGHT: usize = 16;
//! const STRIDE: usize = compute_stride(WIDTH);
//!
//! static BAR: [u8; 8] = [0x80; 8];
//! static GLYPHS: [(char, BitmapGlyph<'static>); 1] = [('|', BitmapGlyph::new(1, 8, &BAR))];
//! static FONT: BitmapFont<'static> = BitmapFont::new(&GLYPHS);
//!
//! let pins = PinConfig::with_pins(0, 1, 2, 3, 4, 5, 6, 7);
//! let driver = ShiftRegisterDriver::new(NullGpio, NoDelay, &pins).unwrap();
//! let mut matrix: Matrix<'_, _, _, WIDTH, HEIGHT, STRIDE, 4> =
//!     Matrix::new(driver, &MatrixConfig::default());
//!
//! matrix.simple_init(&FONT).unwrap();
//! matrix.simple_set_text("||").unwrap();
//! matrix.force_tick();
//! matrix.scan_frame().unwrap();
//!
//! assert!(matrix.displayed_buffer().is_pixel_set(0, 0));
//! assert!(matrix.displayed_buffer().is_pixel_set(2, 7));
//! ```

use heapless::Vec;

use crate::buffer::PixelBuffer;
use crate::config::MatrixConfig;
use crate::driver::{PanelDriver, RowAddress};
use crate::dump::BufferDump;
use crate::segment::Segment;
use crate::sprite::GlyphSource;
use crate::Error;

/// Handle to a segment of a [`Matrix`].
///
/// Handles are positions in the segment list: removing a segment shifts the
/// handles of every segment added after it down by one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SegmentId(usize);

impl SegmentId {
    /// Position in the segment list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A scanned single-colour LED matrix.
///
/// # Type Parameters
/// - `F`: font type; every font in the list has the same type
/// - `P`: the panel driver
/// - `WIDTH`, `HEIGHT`: panel size in pixels, at most 16 rows
/// - `STRIDE`: bytes per row, [`crate::compute_stride`]`(WIDTH)`
/// - `SEGMENTS`: maximum number of segments
pub struct Matrix<
    'a,
    F,
    P,
    const WIDTH: usize,
    const HEIGHT: usize,
    const STRIDE: usize,
    const SEGMENTS: usize,
> {
    buffers: [PixelBuffer<WIDTH, HEIGHT, STRIDE>; 2],
    displayed: usize,
    double_buffered: bool,
    fonts: &'a [F],
    segments: Vec<Segment, SEGMENTS>,
    driver: P,
    on: bool,
    scan_row: usize,
    scan_modulation_us: u32,
    scan_mask: u8,
    tick_period_us: u64,
    last_tick_us: Option<u64>,
}

impl<
        'a,
        F: GlyphSource,
        P: PanelDriver,
        const WIDTH: usize,
        const HEIGHT: usize,
        const STRIDE: usize,
        const SEGMENTS: usize,
    > Matrix<'a, F, P, WIDTH, HEIGHT, STRIDE, SEGMENTS>
{
    /// Create a matrix with blank buffers, no fonts and no segments.
    ///
    /// The display starts switched on, scanning from row 0. Call
    /// [`Matrix::init`] or [`Matrix::simple_init`] before ticking.
    ///
    /// # Panics
    /// Panics if `HEIGHT` is 0 or more than 16, or `STRIDE` does not match
    /// `WIDTH`.
    #[must_use]
    pub fn new(driver: P, config: &MatrixConfig) -> Self {
        assert!(HEIGHT > 0 && HEIGHT <= 16, "row address is 4 bits");
        Self {
            buffers: [PixelBuffer::new(), PixelBuffer::new()],
            displayed: 0,
            double_buffered: config.double_buffered,
            fonts: &[],
            segments: Vec::new(),
            driver,
            on: true,
            scan_row: 0,
            scan_modulation_us: config.scan_modulation_us,
            scan_mask: config.scan_mask,
            tick_period_us: config.tick_period_us,
            last_tick_us: None,
        }
    }

    /// Attach the fonts and segments, set up the output pins and clear both
    /// buffers.
    ///
    /// Segments are validated before the driver is touched. On any error the
    /// fonts, segments and buffers are left as they were.
    ///
    /// # Errors
    /// - [`Error::SegmentBounds`], [`Error::UnknownFont`] or
    ///   [`Error::SegmentCapacity`] if a segment is rejected
    /// - [`Error::Gpio`] if the driver cannot configure its pins; the matrix
    ///   must not be used in that case
    pub fn init<I>(&mut self, fonts: &'a [F], segments: I) -> Result<(), Error<P::Error>>
    where
        I: IntoIterator<Item = Segment>,
    {
        let mut staged = Vec::new();
        for segment in segments {
            Self::check_segment(&segment, fonts.len())?;
            if staged.push(segment).is_err() {
                return Err(Error::SegmentCapacity);
            }
        }

        if let Err(err) = self.driver.init() {
            warn!("panel driver init failed");
            return Err(Error::Gpio(err));
        }

        self.fonts = fonts;
        self.segments = staged;
        self.clear_buffers();
        self.scan_row = 0;
        self.last_tick_us = None;
        info!(
            "matrix {}x{} ready with {} segments",
            WIDTH,
            HEIGHT,
            self.segments.len()
        );
        Ok(())
    }

    /// Initialise with `font` and one full-screen segment using it.
    ///
    /// # Errors
    /// See [`Matrix::init`].
    pub fn simple_init(&mut self, font: &'a F) -> Result<(), Error<P::Error>> {
        let segment = Segment::full_screen(WIDTH as u16, HEIGHT as u16, 0);
        self.init(core::slice::from_ref(font), [segment])
    }

    /// Append a segment. Later segments draw over earlier ones where they
    /// overlap.
    ///
    /// # Errors
    /// - [`Error::SegmentBounds`] if the rectangle is not inside the panel
    /// - [`Error::UnknownFont`] if the font index is not in the font list
    /// - [`Error::SegmentCapacity`] if `SEGMENTS` segments already exist
    pub fn add_segment(&mut self, segment: Segment) -> Result<SegmentId, Error<P::Error>> {
        Self::check_segment(&segment, self.fonts.len())?;
        let id = SegmentId(self.segments.len());
        if self.segments.push(segment).is_err() {
            return Err(Error::SegmentCapacity);
        }
        debug!("added segment {}", id.0);
        Ok(id)
    }

    fn check_segment(segment: &Segment, font_count: usize) -> Result<(), Error<P::Error>> {
        let right = usize::from(segment.x()) + usize::from(segment.width());
        let bottom = usize::from(segment.y()) + usize::from(segment.height());
        if right > WIDTH || bottom > HEIGHT {
            return Err(Error::SegmentBounds);
        }
        if segment.font_index() >= font_count {
            return Err(Error::UnknownFont(segment.font_index()));
        }
        Ok(())
    }

    /// Remove a segment and blank its rectangle.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if `id` is not a segment.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<Segment, Error<P::Error>> {
        if id.0 >= self.segments.len() {
            return Err(Error::UnknownSegment);
        }
        let segment = self.segments.remove(id.0);
        for buffer in &mut self.buffers {
            segment.clear(buffer);
        }
        Ok(segment)
    }

    /// All segments, in drawing order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The segment behind `id`.
    #[must_use]
    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.0)
    }

    /// The segment behind `id`, mutably.
    pub fn segment_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.segments.get_mut(id.0)
    }

    /// Set the text of a segment, measuring it with the segment's font.
    ///
    /// Returns the number of code points kept.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if `id` is not a segment.
    pub fn set_text(&mut self, id: SegmentId, text: &str) -> Result<usize, Error<P::Error>> {
        let Some(segment) = self.segments.get_mut(id.0) else {
            return Err(Error::UnknownSegment);
        };
        let Some(font) = self.fonts.get(segment.font_index()) else {
            return Err(Error::UnknownFont(segment.font_index()));
        };
        Ok(segment.set_text(text, font))
    }

    fn first_segment(&mut self) -> Result<&mut Segment, Error<P::Error>> {
        self.segments.first_mut().ok_or(Error::UnknownSegment)
    }

    /// Set the text of the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_set_text(&mut self, text: &str) -> Result<usize, Error<P::Error>> {
        self.set_text(SegmentId(0), text)
    }

    /// Set the scroll speed of the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_set_text_speed(
        &mut self,
        hspeed: f32,
        vspeed: f32,
    ) -> Result<(), Error<P::Error>> {
        self.first_segment()?.set_text_speed(hspeed, vspeed);
        Ok(())
    }

    /// Set the text position of the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_set_text_position(
        &mut self,
        hpos: f32,
        vpos: f32,
    ) -> Result<(), Error<P::Error>> {
        self.first_segment()?.set_text_position(hpos, vpos);
        Ok(())
    }

    /// Start scrolling the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_start(&mut self) -> Result<(), Error<P::Error>> {
        self.first_segment()?.start();
        Ok(())
    }

    /// Stop scrolling the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_stop(&mut self) -> Result<(), Error<P::Error>> {
        self.first_segment()?.stop();
        Ok(())
    }

    /// Toggle reverse video on the first segment.
    ///
    /// # Errors
    /// Returns [`Error::UnknownSegment`] if there are no segments.
    pub fn simple_reverse(&mut self) -> Result<(), Error<P::Error>> {
        self.first_segment()?.reverse();
        Ok(())
    }

    /// Run one animation step if at least the tick period has passed since
    /// the last one.
    ///
    /// `now_us` is a monotonic timestamp in microseconds. The first call
    /// always ticks. Returns `true` if a tick ran.
    pub fn tick(&mut self, now_us: u64) -> bool {
        if let Some(last) = self.last_tick_us {
            if now_us.saturating_sub(last) < self.tick_period_us {
                return false;
            }
        }
        self.last_tick_us = Some(now_us);
        self.force_tick();
        true
    }

    /// Run one animation step now and display the result.
    pub fn force_tick(&mut self) {
        let working = self.working_index();
        if working != self.displayed {
            let [first, second] = &mut self.buffers;
            if working == 0 {
                first.copy_from(second);
            } else {
                second.copy_from(first);
            }
        }

        let buffer = &mut self.buffers[working];
        for segment in &mut self.segments {
            if let Some(font) = self.fonts.get(segment.font_index()) {
                segment.tick(buffer, font);
            }
        }

        self.displayed = working;
    }

    /// Minimum time between ticks in microseconds.
    pub fn set_tick_period(&mut self, period_us: u64) {
        self.tick_period_us = period_us;
    }

    /// Blank both buffers and redraw every segment on the next tick.
    pub fn clear(&mut self) {
        self.clear_buffers();
        for segment in &mut self.segments {
            segment.invalidate();
        }
    }

    /// Drop the text of every segment.
    pub fn clear_text(&mut self) {
        for segment in &mut self.segments {
            segment.clear_text();
        }
    }

    /// Toggle reverse video on every segment.
    pub fn reverse(&mut self) {
        for segment in &mut self.segments {
            segment.reverse();
        }
    }

    /// Switch the display on. Scanning resumes with the next [`Matrix::scan`].
    pub fn on(&mut self) {
        self.on = true;
        debug!("display on");
    }

    /// Switch the display off and blank the panel. Buffer contents are kept.
    ///
    /// # Errors
    /// Returns [`Error::Gpio`] if the panel cannot be blanked.
    pub fn off(&mut self) -> Result<(), Error<P::Error>> {
        self.on = false;
        self.driver.blank()?;
        debug!("display off");
        Ok(())
    }

    /// Whether the display is switched on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Extra hold time per scanned row in microseconds. Zero disables it.
    pub fn set_scan_modulation(&mut self, us: u32) {
        self.scan_modulation_us = us;
    }

    /// XOR mask applied to every byte shifted out. `0xFF` inverts the panel.
    pub fn set_scan_mask(&mut self, mask: u8) {
        self.scan_mask = mask;
    }

    /// Push the next row of the displayed buffer to the panel.
    ///
    /// Does nothing while the display is off.
    ///
    /// # Errors
    /// Returns [`Error::Gpio`] if a pin write fails.
    pub fn scan(&mut self) -> Result<(), Error<P::Error>> {
        if !self.on {
            return Ok(());
        }
        let row = self.scan_row;
        let address = RowAddress::for_scan_row(row, HEIGHT);
        trace!("scan row {} address {}", row, address.addr());
        let buffer = &self.buffers[self.displayed];
        self.driver.write_row(buffer.row(row), address, self.scan_mask)?;
        if self.scan_modulation_us > 0 {
            self.driver.hold(self.scan_modulation_us);
        }
        self.scan_row = (row + 1) % HEIGHT;
        Ok(())
    }

    /// Scan every row once.
    ///
    /// # Errors
    /// Returns [`Error::Gpio`] if a pin write fails.
    pub fn scan_frame(&mut self) -> Result<(), Error<P::Error>> {
        for _ in 0..HEIGHT {
            self.scan()?;
        }
        Ok(())
    }

    /// Row the next [`Matrix::scan`] will output.
    #[must_use]
    pub const fn scan_row(&self) -> usize {
        self.scan_row
    }

    /// The buffer being scanned.
    #[must_use]
    pub fn displayed_buffer(&self) -> &PixelBuffer<WIDTH, HEIGHT, STRIDE> {
        &self.buffers[self.displayed]
    }

    /// The buffer the next tick draws into.
    #[must_use]
    pub fn working_buffer(&self) -> &PixelBuffer<WIDTH, HEIGHT, STRIDE> {
        &self.buffers[self.working_index()]
    }

    /// The buffer the next tick draws into, for direct drawing. With double
    /// buffering on, the next tick overwrites it with the displayed frame
    /// first.
    pub fn working_buffer_mut(&mut self) -> &mut PixelBuffer<WIDTH, HEIGHT, STRIDE> {
        let working = self.working_index();
        &mut self.buffers[working]
    }

    /// Whether ticks draw into a separate buffer.
    #[must_use]
    pub const fn is_double_buffered(&self) -> bool {
        self.double_buffered
    }

    /// Text dump of the displayed buffer.
    #[must_use]
    pub fn dump(&self) -> BufferDump<'_, WIDTH, HEIGHT, STRIDE> {
        self.displayed_buffer().dump()
    }

    /// The panel driver.
    pub const fn driver(&self) -> &P {
        &self.driver
    }

    /// The panel driver, mutably.
    pub fn driver_mut(&mut self) -> &mut P {
        &mut self.driver
    }

    /// Tear down the matrix and give back the driver.
    pub fn release(self) -> P {
        self.driver
    }

    const fn working_index(&self) -> usize {
        if self.double_buffered {
            self.displayed ^ 1
        } else {
            self.displayed
        }
    }

    fn clear_buffers(&mut self) {
        for buffer in &mut self.buffers {
            buffer.clear();
        }
    }
}

impl<
        F,
        P,
        const WIDTH: usize,
        const HEIGHT: usize,
        const STRIDE: usize,
        const SEGMENTS: usize,
    > core::fmt::Debug for Matrix<'_, F, P, WIDTH, HEIGHT, STRIDE, SEGMENTS>
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Matrix")
            .field("width", &WIDTH)
            .field("height", &HEIGHT)
            .field("segments", &self.segments.len())
            .field("fonts", &self.fonts.len())
            .field("double_buffered", &self.double_buffered)
            .field("on", &self.on)
            .field("scan_row", &self.scan_row)
            .finish_non_exhaustive()
    }
}
