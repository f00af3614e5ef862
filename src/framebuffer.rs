//! In-memory RGB565 canvas.
//!
//! One `u16` per pixel, row-major, no padding. Used as the off-screen canvas
//! for the idle backdrop and as the shadow buffer the panel flushes from.

use core::convert::Infallible;
use core::ops::Range;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::surface::WriteSurface;

pub struct FrameBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u16>,
    dirty: Option<Rectangle>,
    clipped: usize,
}

impl FrameBuffer {
    /// A black canvas of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            dirty: None,
            clipped: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB565 samples, suitable as a compositor colour buffer.
    pub fn as_raw(&self) -> &[u16] {
        &self.pixels
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.index(x, y)
            .map(|i| Rgb565::from(RawU16::new(self.pixels[i])))
    }

    /// Contiguous samples for whole rows `rows.start..rows.end`.
    pub fn rows(&self, rows: Range<u32>) -> &[u16] {
        let end = rows.end.min(self.height) as usize * self.width as usize;
        let start = (rows.start as usize * self.width as usize).min(end);
        &self.pixels[start..end]
    }

    /// Area touched since the last call, if any.
    pub fn take_dirty(&mut self) -> Option<Rectangle> {
        self.dirty.take()
    }

    /// Writes dropped because they fell outside the canvas.
    pub fn clipped_writes(&self) -> usize {
        self.clipped
    }

    pub fn fill(&mut self, color: Rgb565) {
        self.pixels.fill(color.into_storage());
        self.mark_dirty(self.bounding_box());
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn mark_dirty(&mut self, area: Rectangle) {
        self.dirty = Some(match self.dirty {
            None => area,
            Some(current) => envelope(&current, &area),
        });
    }

    fn set(&mut self, x: i32, y: i32, color: Rgb565) -> bool {
        match self.index(x, y) {
            Some(i) => {
                self.pixels[i] = color.into_storage();
                self.mark_dirty(Rectangle::new(Point::new(x, y), Size::new(1, 1)));
                true
            }
            None => {
                self.clipped += 1;
                false
            }
        }
    }
}

/// Smallest rectangle containing both.
fn envelope(a: &Rectangle, b: &Rectangle) -> Rectangle {
    let (Some(a_end), Some(b_end)) = (a.bottom_right(), b.bottom_right()) else {
        return if a.is_zero_sized() { *b } else { *a };
    };
    let top_left = Point::new(a.top_left.x.min(b.top_left.x), a.top_left.y.min(b.top_left.y));
    let bottom_right = Point::new(a_end.x.max(b_end.x), a_end.y.max(b_end.y));
    Rectangle::with_corners(top_left, bottom_right)
}

impl WriteSurface for FrameBuffer {
    fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        self.set(x, y, color);
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.set(point.x, point.y, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let area = area.intersection(&self.bounding_box());
        let Some(bottom_right) = area.bottom_right() else {
            return Ok(());
        };
        let raw = color.into_storage();
        let width = self.width as usize;
        for y in area.top_left.y..=bottom_right.y {
            let row = y as usize * width;
            self.pixels[row + area.top_left.x as usize..=row + bottom_right.x as usize].fill(raw);
        }
        self.mark_dirty(area);
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
