//! Boot splash converted from `splash.png` by the build script.
//!
//! Building without the PNG yields a 0x0 splash, which draws nothing.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::compositor::{compose, MaskedBitmap};
use crate::error::CompositeError;
use crate::render;
use crate::surface::WriteSurface;

include!(concat!(env!("OUT_DIR"), "/splash.rs"));

static SPLASH_COLORS: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/splash.rgb565"));
static SPLASH_MASK: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/splash.mask"));

/// Shown under the splash while the device comes up.
pub const BOOT_MESSAGE: &str = "Initializing Goober System...";

/// The embedded bytes are not guaranteed to be u16 aligned, so they are copied out.
pub fn splash_colors() -> Vec<u16> {
    SPLASH_COLORS
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Validated view of the splash over `colors` from [`splash_colors`].
pub fn splash(colors: &[u16]) -> Result<MaskedBitmap<'_>, CompositeError> {
    MaskedBitmap::new(colors, Some(SPLASH_MASK), SPLASH_WIDTH, SPLASH_HEIGHT)
}

/// Top-left corner that centres a `width` x `height` image on `screen`.
pub fn centered(screen: Size, width: u32, height: u32) -> Point {
    Point::new(
        (screen.width.saturating_sub(width) / 2) as i32,
        (screen.height.saturating_sub(height) / 2) as i32,
    )
}

/// Colour wheel, the splash centred on top and the boot message.
pub fn boot_screen<S>(surface: &mut S) -> Result<(), S::Error>
where
    S: WriteSurface + DrawTarget<Color = Rgb565> + OriginDimensions,
{
    render::color_wheel(surface)?;

    let colors = splash_colors();
    match splash(&colors) {
        Ok(bitmap) => {
            let origin = centered(surface.size(), bitmap.width(), bitmap.height());
            compose(surface, origin, &bitmap);
        }
        Err(e) => log::warn!("Splash skipped: {}", e),
    }

    render::boot_message(surface, BOOT_MESSAGE)
}
