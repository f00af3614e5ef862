//! Input handling for the two front buttons and the touch overlay
//!
//! Both sit on the shared I2C bus, so there are no interrupts to wait on: the
//! application polls once per cycle and gets back whatever changed since the
//! previous poll.

use embedded_hal::i2c::I2c;
use log::{debug, info, warn};

use crate::config::expander_pins;
use crate::error::BusError;
use crate::expander::{Expander, PinMode};
use crate::touch::TouchController;

// Re-export the public types
pub mod types;
pub use types::*;

/// Owns the I2C bus once the panel is up, together with everything on it
pub struct InputManager<I> {
    i2c: I,
    expander: Expander,
    touch: Option<TouchController>,
    buttons: [ButtonHandler; 2],
}

impl<I: I2c> InputManager<I> {
    /// Configure the button pins as inputs and the backlight pin as an output
    pub fn new(mut i2c: I, mut expander: Expander) -> Result<Self, BusError> {
        expander.pin_mode(&mut i2c, expander_pins::BUTTON_UP, PinMode::Input)?;
        expander.pin_mode(&mut i2c, expander_pins::BUTTON_DOWN, PinMode::Input)?;
        expander.pin_mode(&mut i2c, expander_pins::TFT_BACKLIGHT, PinMode::Output)?;

        Ok(Self {
            i2c,
            expander,
            touch: None,
            buttons: [
                ButtonHandler::new(Button::Up, expander_pins::BUTTON_UP),
                ButtonHandler::new(Button::Down, expander_pins::BUTTON_DOWN),
            ],
        })
    }

    /// Look for a touch controller at `address`. Returns whether one answered.
    pub fn probe_touch(&mut self, address: u8) -> bool {
        self.touch = TouchController::probe(&mut self.i2c, address);
        self.touch.is_some()
    }

    pub fn has_touch(&self) -> bool {
        self.touch.is_some()
    }

    pub fn set_backlight(&mut self, backlight: Backlight) -> Result<(), BusError> {
        info!("Backlight {:?}", backlight);
        self.expander.digital_write(
            &mut self.i2c,
            expander_pins::TFT_BACKLIGHT,
            backlight == Backlight::On,
        )
    }

    /// Button edges since the last call, then the current touch point if any
    pub fn check_events(&mut self) -> Result<Vec<InputEvent>, BusError> {
        let levels = self.expander.read_inputs(&mut self.i2c)?;
        let mut events: Vec<InputEvent> = self
            .buttons
            .iter_mut()
            .filter_map(|button| button.update(levels))
            .map(InputEvent::from)
            .collect();

        if let Some(touch) = &mut self.touch {
            match touch.poll(&mut self.i2c) {
                Ok(Some(point)) => events.push(InputEvent::Touch(point)),
                Ok(None) => {}
                // a flaky touch read should not cost the buttons their events
                Err(e) => warn!("Touch read failed: {}", e),
            }
        }

        for event in &events {
            debug!("{}", event);
        }
        Ok(events)
    }

    #[cfg(test)]
    pub(crate) fn bus(&self) -> &I {
        &self.i2c
    }
}

/// Edge detector for one active-low button on the expander
struct ButtonHandler {
    button: Button,
    bit: u8,
    last_state: ButtonState,
}

impl ButtonHandler {
    fn new(button: Button, pin: u8) -> Self {
        Self {
            button,
            bit: 1 << pin,
            last_state: ButtonState::Released,
        }
    }

    fn update(&mut self, levels: u8) -> Option<ButtonEvent> {
        let current_state = if levels & self.bit == 0 {
            ButtonState::Pressed
        } else {
            ButtonState::Released
        };
        if current_state == self.last_state {
            return None;
        }

        self.last_state = current_state;
        Some(match current_state {
            ButtonState::Pressed => ButtonEvent::Pressed(self.button),
            ButtonState::Released => ButtonEvent::Released(self.button),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::i2c::{EXPANDER_ADDR, TOUCH_ADDR};
    use crate::expander::tests::MockBus;
    use embedded_graphics::prelude::Point;

    const REG_INPUT: u8 = 0x00;
    const REG_OUTPUT: u8 = 0x01;

    fn manager(bus: MockBus) -> InputManager<MockBus> {
        InputManager::new(bus, Expander::new(EXPANDER_ADDR)).unwrap()
    }

    fn idle_bus() -> MockBus {
        let mut bus = MockBus::with_devices(&[EXPANDER_ADDR]);
        bus.set(EXPANDER_ADDR, REG_INPUT, 0xFF);
        bus
    }

    #[test_log::test]
    fn released_buttons_are_quiet() {
        let mut input = manager(idle_bus());
        assert!(input.check_events().unwrap().is_empty());
        assert!(!input.has_touch());
    }

    #[test_log::test]
    fn press_and_release_are_reported_once() {
        let mut input = manager(idle_bus());

        input.i2c.set(EXPANDER_ADDR, REG_INPUT, !(1 << expander_pins::BUTTON_DOWN));
        assert_eq!(
            input.check_events().unwrap(),
            vec![InputEvent::Button(ButtonEvent::Pressed(Button::Down))]
        );
        // still held
        assert!(input.check_events().unwrap().is_empty());

        input.i2c.set(EXPANDER_ADDR, REG_INPUT, 0xFF);
        assert_eq!(
            input.check_events().unwrap(),
            vec![InputEvent::Button(ButtonEvent::Released(Button::Down))]
        );
    }

    #[test_log::test]
    fn both_buttons_in_one_poll() {
        let mut input = manager(idle_bus());
        input.i2c.set(EXPANDER_ADDR, REG_INPUT, 0x00);

        let events = input.check_events().unwrap();
        assert_eq!(
            events,
            vec![
                InputEvent::Button(ButtonEvent::Pressed(Button::Up)),
                InputEvent::Button(ButtonEvent::Pressed(Button::Down)),
            ]
        );
    }

    #[test_log::test]
    fn touch_follows_buttons() {
        let mut bus = idle_bus();
        bus.present.push(TOUCH_ADDR);
        let mut input = manager(bus);
        assert!(input.probe_touch(TOUCH_ADDR));

        input.i2c.set(TOUCH_ADDR, 0x02, 1);
        input.i2c.set(TOUCH_ADDR, 0x04, 10);
        input.i2c.set(TOUCH_ADDR, 0x06, 20);
        assert_eq!(
            input.check_events().unwrap(),
            vec![InputEvent::Touch(Point::new(10, 20))]
        );
    }

    #[test_log::test]
    fn backlight_drives_pin_four() {
        let mut input = manager(idle_bus());

        input.set_backlight(Backlight::Off).unwrap();
        assert_eq!(input.i2c.get(EXPANDER_ADDR, REG_OUTPUT) & 0x10, 0);
        input.set_backlight(Backlight::On).unwrap();
        assert_eq!(input.i2c.get(EXPANDER_ADDR, REG_OUTPUT) & 0x10, 0x10);
    }

    #[test_log::test]
    fn down_turns_the_backlight_off() {
        assert_eq!(
            ButtonEvent::Pressed(Button::Down).backlight(),
            Some(Backlight::Off)
        );
        assert_eq!(ButtonEvent::Pressed(Button::Up).backlight(), Some(Backlight::On));
        assert_eq!(ButtonEvent::Released(Button::Up).backlight(), None);
    }

    #[test_log::test]
    fn missing_expander_is_an_error() {
        let bus = MockBus::default();
        assert!(InputManager::new(bus, Expander::new(EXPANDER_ADDR)).is_err());
    }
}
