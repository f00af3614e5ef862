//! Types for input handling

use embedded_graphics::prelude::Point;

/// Button identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
}

/// Button state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Button events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed(Button),
    Released(Button),
}

/// Unified input event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Button(ButtonEvent),
    Touch(Point),
}

/// What the backlight should do in response to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backlight {
    On,
    Off,
}

impl ButtonEvent {
    /// Down switches the backlight off, Up switches it back on.
    pub fn backlight(self) -> Option<Backlight> {
        match self {
            ButtonEvent::Pressed(Button::Down) => Some(Backlight::Off),
            ButtonEvent::Pressed(Button::Up) => Some(Backlight::On),
            ButtonEvent::Released(_) => None,
        }
    }
}

impl From<ButtonEvent> for InputEvent {
    fn from(event: ButtonEvent) -> Self {
        InputEvent::Button(event)
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Button::Up => write!(f, "Up"),
            Button::Down => write!(f, "Down"),
        }
    }
}

impl std::fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ButtonEvent::Pressed(btn) => write!(f, "{} pressed", btn),
            ButtonEvent::Released(btn) => write!(f, "{} released", btn),
        }
    }
}

impl std::fmt::Display for InputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputEvent::Button(evt) => write!(f, "{}", evt),
            InputEvent::Touch(p) => write!(f, "Touch at ({}, {})", p.x, p.y),
        }
    }
}
