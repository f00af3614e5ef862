//! Everything drawn besides the composited payload: text overlays, the loading
//! banner, the idle backdrop and the boot colour wheel.

use embedded_graphics::mono_font::{iso_8859_15::FONT_10X20, MonoTextStyle};
use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use rand::Rng;

use crate::payload::Goober;
use crate::session::SessionStatus;

/// Where the goober name and stats start.
pub const OVERLAY_ORIGIN: Point = Point::new(0, 20);

/// Where "Loading ..." sits while a payload downloads.
pub const BANNER_ORIGIN: Point = Point::new(75, 240);

/// Side of the square drawn under a touch.
pub const TOUCH_MARKER_SIZE: u32 = 5;

/// Side of one random-colour tile of the idle backdrop.
pub const BACKDROP_TILE: u32 = 4;

const BACKDROP_LETTERS: &[char] = &['G', 'O', 'O', 'B', 'E', 'R'];
const BACKDROP_FIRST_LETTER: Point = Point::new(15, 85);
const BACKDROP_LETTER_STEP: Point = Point::new(75, 75);

fn black_text() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyle::new(&FONT_10X20, Rgb565::BLACK)
}

/// Wipe the screen and say what is being loaded.
pub fn loading_banner<D>(target: &mut D, status: SessionStatus) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    target.clear(Rgb565::WHITE)?;
    if let Some(text) = status.loading_text() {
        Text::new(text, BANNER_ORIGIN, black_text()).draw(target)?;
    }
    Ok(())
}

/// Lines of the goober overlay: the name, then one line per stat.
pub fn overlay_lines(goober: &Goober) -> Vec<String> {
    core::iter::once(format!("Name: {}", goober.name))
        .chain(goober.stats.iter().map(|stat| stat.to_string()))
        .collect()
}

/// Name and stats in the top-left corner.
pub fn goober_overlay<D>(target: &mut D, goober: &Goober) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let text = overlay_lines(goober).join("\n");
    Text::new(&text, OVERLAY_ORIGIN, black_text()).draw(target)?;
    Ok(())
}

/// Tile `canvas` with random colours and spell GOOBER down the diagonal.
pub fn idle_backdrop<D, R>(canvas: &mut D, rng: &mut R) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
    R: Rng,
{
    let area = canvas.bounding_box();
    let tile = Size::new(BACKDROP_TILE, BACKDROP_TILE);

    for y in (0..area.size.height).step_by(BACKDROP_TILE as usize) {
        for x in (0..area.size.width).step_by(BACKDROP_TILE as usize) {
            let color: u16 = rng.gen_range(0..0xFFFF);
            let rect = Rectangle::new(area.top_left + Point::new(x as i32, y as i32), tile);
            canvas.fill_solid(&rect, Rgb565::from(RawU16::new(color)))?;
        }
    }

    let mut cursor = BACKDROP_FIRST_LETTER;
    let mut buf = [0u8; 4];
    for letter in BACKDROP_LETTERS {
        Text::new(letter.encode_utf8(&mut buf), cursor, black_text()).draw(canvas)?;
        cursor += BACKDROP_LETTER_STEP;
    }
    Ok(())
}

/// Hue wheel used as the boot background. Computed at half resolution and
/// drawn as 2x2 blocks.
pub fn color_wheel<D>(target: &mut D) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    let size = target.bounding_box().size;
    let half_width = (size.width / 2) as i32;
    let half_height = (size.height / 2) as i32;

    for y in 0..half_height {
        for x in 0..half_width {
            let color = wheel_color(x - half_width / 2, y - half_height / 2);
            let block = Rectangle::new(Point::new(x * 2, y * 2), Size::new(2, 2));
            target.fill_solid(&block, color)?;
        }
    }
    Ok(())
}

fn wheel_color(dx: i32, dy: i32) -> Rgb565 {
    let angle = (dy as f32).atan2(dx as f32);
    let r = (127.5 * (angle.cos() + 1.0)) as u8;
    let g = (127.5 * (angle.sin() + 1.0)) as u8;
    let b = (255 - (u16::from(r) + u16::from(g)) / 2) as u8;
    Rgb565::new(r >> 3, g >> 2, b >> 3)
}

/// White status text in the top-left corner, used during boot.
pub fn boot_message<D>(target: &mut D, text: &str) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Text::new(text, OVERLAY_ORIGIN, MonoTextStyle::new(&FONT_10X20, Rgb565::WHITE)).draw(target)?;
    Ok(())
}

/// Small white square where the screen was touched.
pub fn touch_marker<D>(target: &mut D, at: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Rgb565>,
{
    Rectangle::new(at, Size::new(TOUCH_MARKER_SIZE, TOUCH_MARKER_SIZE))
        .into_styled(PrimitiveStyle::with_fill(Rgb565::WHITE))
        .draw(target)
}
