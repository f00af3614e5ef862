//! The display's main loop body.
//!
//! [`App::cycle`] is one pass: ask the backend what to show, redraw whatever
//! changed, then handle touch and the buttons.

use anyhow::{anyhow, Context, Result};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_hal::i2c::I2c;
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::backend::{BackendClient, Transport};
use crate::compositor::{compose, MaskedBitmap};
use crate::config::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::framebuffer::FrameBuffer;
use crate::input::{InputEvent, InputManager};
use crate::render;
use crate::session::{DisplayState, SessionStatus, SessionUpdate, ENROLLMENT_ORIGIN, GOOBER_ORIGIN};
use crate::surface::WriteSurface;

/// What a call to [`App::cycle`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The screen shows `status` now and input was handled.
    Drew(SessionStatus),
    /// The payload could not be decoded; nothing was remembered and the next
    /// cycle starts over.
    Skipped,
}

pub struct App<T, S, I> {
    backend: BackendClient<T>,
    surface: S,
    canvas: FrameBuffer,
    rng: StdRng,
    input: InputManager<I>,
    state: DisplayState,
}

impl<T, S, I> App<T, S, I>
where
    T: Transport,
    S: WriteSurface + DrawTarget<Color = Rgb565>,
    S::Error: core::fmt::Debug,
    I: I2c,
{
    pub fn new(backend: BackendClient<T>, surface: S, input: InputManager<I>, seed: u64) -> Self {
        Self {
            backend,
            surface,
            canvas: FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            rng: StdRng::seed_from_u64(seed),
            input,
            state: DisplayState::default(),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// One pass of the main loop. Transport failures are returned; a payload
    /// that does not decode only skips this pass.
    pub fn cycle(&mut self) -> Result<CycleOutcome> {
        let response = self.backend.poll_session().context("Failed to poll session")?;
        let status = SessionStatus::from_http(response.status);
        let status_changed = self.state.status_changed(status);
        if status_changed {
            info!("Session status {} -> {:?}", response.status, status);
        }

        if status != SessionStatus::Idle && status_changed {
            render::loading_banner(&mut self.surface, status).map_err(draw_error)?;
        }

        let update = match SessionUpdate::from_response(status, &response.body) {
            Ok(update) => update,
            Err(e) => {
                warn!("Dropping session payload: {}", e);
                return Ok(CycleOutcome::Skipped);
            }
        };

        if status != SessionStatus::Idle && status_changed {
            self.surface.clear(Rgb565::WHITE).map_err(draw_error)?;
        }

        match update {
            SessionUpdate::Goober { goober, image } => {
                if self.state.goober_changed(&goober.name) {
                    info!("Showing goober {}", goober.name);
                    self.surface.clear(Rgb565::WHITE).map_err(draw_error)?;
                }
                render::goober_overlay(&mut self.surface, &goober).map_err(draw_error)?;
                compose(&mut self.surface, GOOBER_ORIGIN, &image.bitmap()?);
                self.state.remember_goober(&goober.name);
            }
            SessionUpdate::Enrollment { image } => {
                compose(&mut self.surface, ENROLLMENT_ORIGIN, &image.bitmap()?);
            }
            SessionUpdate::Idle => self.idle()?,
        }

        self.handle_input()?;
        self.state.complete(status);
        Ok(CycleOutcome::Drew(status))
    }

    fn idle(&mut self) -> Result<()> {
        render::idle_backdrop(&mut self.canvas, &mut self.rng).map_err(draw_error)?;
        let canvas = &self.canvas;
        let backdrop = MaskedBitmap::opaque(canvas.as_raw(), canvas.width(), canvas.height())?;
        compose(&mut self.surface, Point::zero(), &backdrop);
        Ok(())
    }

    fn handle_input(&mut self) -> Result<()> {
        let events = match self.input.check_events() {
            Ok(events) => events,
            Err(e) => {
                warn!("Input poll failed: {}", e);
                return Ok(());
            }
        };

        for event in events {
            match event {
                InputEvent::Touch(point) => {
                    render::touch_marker(&mut self.surface, point).map_err(draw_error)?;
                }
                InputEvent::Button(button) => {
                    if let Some(backlight) = button.backlight() {
                        if let Err(e) = self.input.set_backlight(backlight) {
                            warn!("Backlight switch failed: {}", e);
                        }
                    } else {
                        debug!("Ignoring {}", button);
                    }
                }
            }
        }
        Ok(())
    }
}

fn draw_error<E: core::fmt::Debug>(e: E) -> anyhow::Error {
    anyhow!("Drawing failed: {:?}", e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::tests::{Request, ScriptedTransport};
    use crate::config::expander_pins;
    use crate::config::i2c::{EXPANDER_ADDR, TOUCH_ADDR};
    use crate::expander::tests::MockBus;
    use crate::expander::Expander;
    use crate::payload::tests::payload_json;
    use crate::surface::tests::{Op, RecordingSurface};

    const REG_INPUT: u8 = 0x00;
    const REG_OUTPUT: u8 = 0x01;

    /// Frame buffer that also logs the write brackets so tests can count blits.
    struct Screen {
        fb: FrameBuffer,
        log: RecordingSurface,
    }

    impl Screen {
        fn new() -> Self {
            Self {
                fb: FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
                log: RecordingSurface::default(),
            }
        }

        fn transactions(&self) -> usize {
            self.log.ops.iter().filter(|op| **op == Op::Start).count()
        }
    }

    impl WriteSurface for Screen {
        fn start_write(&mut self) {
            self.log.start_write();
        }

        fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
            self.fb.write_pixel(x, y, color);
        }

        fn end_write(&mut self) {
            self.log.end_write();
        }
    }

    impl OriginDimensions for Screen {
        fn size(&self) -> Size {
            self.fb.size()
        }
    }

    impl DrawTarget for Screen {
        type Color = Rgb565;
        type Error = core::convert::Infallible;

        fn draw_iter<P>(&mut self, pixels: P) -> Result<(), Self::Error>
        where
            P: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.fb.draw_iter(pixels)
        }
    }

    fn bus() -> MockBus {
        let mut bus = MockBus::with_devices(&[EXPANDER_ADDR]);
        bus.set(EXPANDER_ADDR, REG_INPUT, 0xFF);
        bus
    }

    fn app(transport: ScriptedTransport, bus: MockBus) -> App<ScriptedTransport, Screen, MockBus> {
        let input = InputManager::new(bus, Expander::new(EXPANDER_ADDR)).unwrap();
        App::new(BackendClient::new(transport), Screen::new(), input, 1)
    }

    fn goober_body(name: &str) -> String {
        let goober = format!(r#"{{"name": "{}", "stats": []}}"#, name);
        // red, transparent, transparent, blue
        payload_json(2, 2, &[0xF800, 0x07E0, 0x07E0, 0x001F], Some(&[0x80, 0x40]), &goober)
    }

    #[test_log::test]
    fn goober_is_drawn_at_its_origin() {
        let transport = ScriptedTransport::default().respond(200, goober_body("Pip"));
        let mut app = app(transport, bus());

        assert_eq!(app.cycle().unwrap(), CycleOutcome::Drew(SessionStatus::Goober));

        let fb = &app.surface().fb;
        assert_eq!(fb.pixel(140, 140), Some(Rgb565::RED));
        assert_eq!(fb.pixel(141, 140), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(140, 141), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(141, 141), Some(Rgb565::BLUE));
        // overlay text in the top-left
        assert!(fb.rows(0..30).iter().any(|&p| p == 0));
        assert_eq!(app.state().last_status(), Some(SessionStatus::Goober));
    }

    #[test_log::test]
    fn same_goober_is_not_wiped_again() {
        let transport = ScriptedTransport::default()
            .respond(200, goober_body("Pip"))
            .respond(200, goober_body("Pip"));
        let mut app = app(transport, bus());
        app.cycle().unwrap();

        // a mark the next cycle must leave alone
        app.surface_mut().fb.write_pixel(400, 400, Rgb565::GREEN);
        app.cycle().unwrap();
        assert_eq!(app.surface().fb.pixel(400, 400), Some(Rgb565::GREEN));
    }

    #[test_log::test]
    fn new_goober_clears_the_screen() {
        let transport = ScriptedTransport::default()
            .respond(200, goober_body("Pip"))
            .respond(200, goober_body("Gub"));
        let mut app = app(transport, bus());
        app.cycle().unwrap();

        app.surface_mut().fb.write_pixel(400, 400, Rgb565::GREEN);
        app.cycle().unwrap();
        assert_eq!(app.surface().fb.pixel(400, 400), Some(Rgb565::WHITE));
    }

    #[test_log::test]
    fn enrollment_covers_the_top_left() {
        let body = payload_json(1, 1, &[0x1234], None, "null");
        let transport = ScriptedTransport::default().respond(201, body);
        let mut app = app(transport, bus());

        assert_eq!(app.cycle().unwrap(), CycleOutcome::Drew(SessionStatus::Enrollment));
        assert_eq!(app.surface().fb.as_raw()[0], 0x1234);
        assert_eq!(app.surface().fb.pixel(1, 0), Some(Rgb565::WHITE));
    }

    #[test_log::test]
    fn idle_composes_the_backdrop_every_cycle() {
        let transport = ScriptedTransport::default().respond(404, "").respond(204, "");
        let mut app = app(transport, bus());

        assert_eq!(app.cycle().unwrap(), CycleOutcome::Drew(SessionStatus::Idle));
        assert_eq!(app.cycle().unwrap(), CycleOutcome::Drew(SessionStatus::Idle));
        assert_eq!(app.surface().transactions(), 2);
        assert_eq!(app.surface().fb.as_raw(), app.canvas.as_raw());
    }

    #[test_log::test]
    fn broken_payload_skips_without_remembering() {
        let transport = ScriptedTransport::default()
            .respond(200, "{not json")
            .respond(200, goober_body("Pip"));
        let mut app = app(transport, bus());

        assert_eq!(app.cycle().unwrap(), CycleOutcome::Skipped);
        assert_eq!(app.state().last_status(), None);
        // loading banner was already up
        assert_eq!(app.surface().fb.pixel(479, 479), Some(Rgb565::WHITE));

        assert_eq!(app.cycle().unwrap(), CycleOutcome::Drew(SessionStatus::Goober));
    }

    #[test_log::test]
    fn transport_failure_is_returned() {
        let transport = ScriptedTransport::default().fail("timed out");
        let mut app = app(transport, bus());

        assert!(app.cycle().is_err());
        assert_eq!(app.backend.transport().requests, vec![Request::Get("/v1/sessions".into())]);
    }

    #[test_log::test]
    fn touch_leaves_a_marker() {
        let mut bus = bus();
        bus.present.push(TOUCH_ADDR);
        bus.set(TOUCH_ADDR, 0x02, 1);
        bus.set(TOUCH_ADDR, 0x04, 200);
        bus.set(TOUCH_ADDR, 0x06, 100);
        let mut app = app(ScriptedTransport::default().respond(404, ""), bus);
        assert!(app.input.probe_touch(TOUCH_ADDR));

        app.cycle().unwrap();
        // backdrop tiles are never pure white
        let fb = &app.surface().fb;
        assert_eq!(fb.pixel(200, 100), Some(Rgb565::WHITE));
        assert_eq!(fb.pixel(204, 104), Some(Rgb565::WHITE));
        assert_ne!(fb.pixel(205, 105), Some(Rgb565::WHITE));
    }

    #[test_log::test]
    fn down_button_switches_backlight_off() {
        let mut bus = bus();
        bus.set(EXPANDER_ADDR, REG_INPUT, !(1 << expander_pins::BUTTON_DOWN));
        let mut app = app(ScriptedTransport::default().respond(404, ""), bus);

        app.cycle().unwrap();
        let output = app.input_bus().get(EXPANDER_ADDR, REG_OUTPUT);
        assert_eq!(output & (1 << expander_pins::TFT_BACKLIGHT), 0);
    }

    impl App<ScriptedTransport, Screen, MockBus> {
        fn input_bus(&self) -> &MockBus {
            self.input.bus()
        }
    }
}
