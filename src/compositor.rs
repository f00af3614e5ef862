//! Masked RGB565 bitmap compositor.
//!
//! Overlays a 16-bit colour image onto a [`WriteSurface`] using a packed
//! 1-bit-per-pixel mask. Mask rows are padded to a whole byte and bits are read
//! most significant first, so bit 7 of byte `row * stride + col / 8` belongs to
//! column `col`. A set bit draws the pixel, a clear bit leaves the destination
//! untouched. Without a mask every pixel is drawn.
//!
//! Buffer lengths are checked once when the [`MaskedBitmap`] view is built;
//! [`compose`] itself cannot fail and never clips, out-of-range coordinates are
//! the surface's business.

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::error::CompositeError;
use crate::surface::{WriteSurface, WriteTransaction};

/// Bytes per mask scanline for a bitmap `width` pixels wide.
pub const fn mask_stride(width: u32) -> usize {
    width.div_ceil(8) as usize
}

/// Validated, borrowed view over a colour buffer and an optional mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskedBitmap<'a> {
    width: u32,
    height: u32,
    colors: &'a [u16],
    mask: Option<&'a [u8]>,
}

impl<'a> MaskedBitmap<'a> {
    /// Checks that `colors` holds exactly `width * height` samples and that
    /// `mask`, when given, holds exactly `height * ceil(width / 8)` bytes.
    pub fn new(
        colors: &'a [u16],
        mask: Option<&'a [u8]>,
        width: u32,
        height: u32,
    ) -> Result<Self, CompositeError> {
        let overflow = CompositeError::Overflow { width, height };
        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or(overflow.clone())?;
        if colors.len() != pixels {
            return Err(CompositeError::ColorLength {
                width,
                height,
                expected: pixels,
                actual: colors.len(),
            });
        }

        if let Some(mask) = mask {
            let expected = mask_stride(width)
                .checked_mul(height as usize)
                .ok_or(overflow)?;
            if mask.len() != expected {
                return Err(CompositeError::MaskLength {
                    width,
                    height,
                    expected,
                    actual: mask.len(),
                });
            }
        }

        Ok(Self {
            width,
            height,
            colors,
            mask,
        })
    }

    /// A bitmap drawn in full, without masking.
    pub fn opaque(colors: &'a [u16], width: u32, height: u32) -> Result<Self, CompositeError> {
        Self::new(colors, None, width, height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_masked(&self) -> bool {
        self.mask.is_some()
    }

    /// Whether the source pixel at (`x`, `y`) gets drawn. Out of range is `false`.
    pub fn is_opaque(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        match self.mask {
            None => true,
            Some(mask) => {
                let byte = mask[y as usize * mask_stride(self.width) + x as usize / 8];
                (byte >> (7 - x % 8)) & 1 != 0
            }
        }
    }

    /// Opaque pixels in source coordinates, row by row, left to right.
    pub fn pixels(&self) -> impl Iterator<Item = Pixel<Rgb565>> + 'a {
        let width = self.width as usize;
        let stride = mask_stride(self.width);
        let all_colors = self.colors;
        let mask = self.mask;

        // a zero-width bitmap has rows but nothing in them
        let rows = if width == 0 { 0 } else { self.height as usize };

        (0..rows).flat_map(move |j| {
            let colors = &all_colors[j * width..(j + 1) * width];
            let mask_row = mask.map(|m| &m[j * stride..(j + 1) * stride]);

            colors.iter().enumerate().filter_map(move |(i, &raw)| {
                let opaque = match mask_row {
                    None => true,
                    Some(row) => (row[i / 8] >> (7 - i % 8)) & 1 != 0,
                };
                opaque.then(|| Pixel(Point::new(i as i32, j as i32), Rgb565::from(RawU16::new(raw))))
            })
        })
    }

    /// Pins the bitmap to a position so it can be drawn onto any `DrawTarget`.
    pub fn at(self, origin: Point) -> PositionedBitmap<'a> {
        PositionedBitmap {
            bitmap: self,
            origin,
        }
    }
}

/// Write every opaque pixel of `bitmap` to `surface` at `origin + (i, j)`.
///
/// Pixels are written once each in row-major order inside a single write
/// transaction. Transparent pixels are skipped. A zero-area bitmap opens no
/// transaction and performs no writes.
pub fn compose<S: WriteSurface + ?Sized>(surface: &mut S, origin: Point, bitmap: &MaskedBitmap<'_>) {
    if bitmap.width == 0 || bitmap.height == 0 {
        return;
    }

    log::debug!(
        "composing {}x{} bitmap at ({}, {}), masked: {}",
        bitmap.width,
        bitmap.height,
        origin.x,
        origin.y,
        bitmap.is_masked()
    );

    let mut tx = WriteTransaction::begin(surface);
    for Pixel(point, color) in bitmap.pixels() {
        let at = offset(origin, point);
        tx.write_pixel(at.x, at.y, color);
    }
}

/// Off-surface coordinates saturate at the `i32` range and are left to the surface to clip.
fn offset(origin: Point, point: Point) -> Point {
    Point::new(origin.x.saturating_add(point.x), origin.y.saturating_add(point.y))
}

/// A [`MaskedBitmap`] placed at a fixed origin.
#[derive(Debug, Clone, Copy)]
pub struct PositionedBitmap<'a> {
    bitmap: MaskedBitmap<'a>,
    origin: Point,
}

impl Drawable for PositionedBitmap<'_> {
    type Color = Rgb565;
    type Output = ();

    fn draw<D>(&self, target: &mut D) -> Result<Self::Output, D::Error>
    where
        D: DrawTarget<Color = Self::Color>,
    {
        let origin = self.origin;
        target.draw_iter(
            self.bitmap
                .pixels()
                .map(|Pixel(point, color)| Pixel(offset(origin, point), color)),
        )
    }
}
