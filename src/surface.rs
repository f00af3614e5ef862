//! Destination surfaces for the compositor.
//!
//! A surface accepts single-pixel writes in device coordinates. Writes are
//! bracketed by [`WriteSurface::start_write`] / [`WriteSurface::end_write`] so an
//! implementation can keep a bus selected or postpone a flush until the whole
//! batch is in. Use [`WriteTransaction`] to get the pairing for free.

use core::ops::{Deref, DerefMut};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

/// Sink for individual pixel writes.
///
/// `write_pixel` is infallible at this layer. Implementations that can fail
/// should latch the error and expose it once the batch is over.
pub trait WriteSurface {
    /// A batch of `write_pixel` calls follows.
    fn start_write(&mut self) {}

    /// Write one pixel. Coordinates outside the surface must be ignored.
    fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565);

    /// The batch started by `start_write` is complete.
    fn end_write(&mut self) {}
}

impl<S: WriteSurface + ?Sized> WriteSurface for &mut S {
    fn start_write(&mut self) {
        (**self).start_write();
    }

    fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        (**self).write_pixel(x, y, color);
    }

    fn end_write(&mut self) {
        (**self).end_write();
    }
}

/// Scoped write transaction. `end_write` runs when the guard is dropped, on every
/// path out of the scope.
pub struct WriteTransaction<'s, S: WriteSurface + ?Sized> {
    surface: &'s mut S,
}

impl<'s, S: WriteSurface + ?Sized> WriteTransaction<'s, S> {
    pub fn begin(surface: &'s mut S) -> Self {
        surface.start_write();
        Self { surface }
    }
}

impl<S: WriteSurface + ?Sized> Deref for WriteTransaction<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: WriteSurface + ?Sized> DerefMut for WriteTransaction<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: WriteSurface + ?Sized> Drop for WriteTransaction<'_, S> {
    fn drop(&mut self) {
        self.surface.end_write();
    }
}

/// Adapts any embedded-graphics [`DrawTarget`] into a [`WriteSurface`].
///
/// The first draw error is kept and every later write is dropped until
/// [`DrawTargetSurface::take_error`] clears it.
pub struct DrawTargetSurface<D: DrawTarget<Color = Rgb565>> {
    target: D,
    error: Option<D::Error>,
}

impl<D: DrawTarget<Color = Rgb565>> DrawTargetSurface<D> {
    pub fn new(target: D) -> Self {
        Self {
            target,
            error: None,
        }
    }

    /// Returns the latched error, if any, and resumes forwarding writes.
    pub fn take_error(&mut self) -> Option<D::Error> {
        self.error.take()
    }

    pub fn target(&self) -> &D {
        &self.target
    }
}

impl<D: DrawTarget<Color = Rgb565>> WriteSurface for DrawTargetSurface<D> {
    fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self
            .target
            .draw_iter(core::iter::once(Pixel(Point::new(x, y), color)))
        {
            log::warn!("surface write at ({}, {}) failed, dropping the rest of the batch", x, y);
            self.error = Some(e);
        }
    }
}
