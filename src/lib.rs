//! Goober display firmware, hardware-independent part.
//!
//! The display polls the backend for the current session and draws what it
//! gets: a goober portrait with its stats, an enrollment QR code, or the idle
//! backdrop. Images arrive as base64 RGB565 plus a packed 1-bit mask and are
//! put on screen by the [`compositor`].
//!
//! Everything in here builds and tests on the host. The ESP-IDF glue (WiFi,
//! HTTP, the RGB panel) lives in the binary.

pub mod app;
pub mod assets;
pub mod backend;
pub mod compositor;
pub mod config;
pub mod error;
pub mod expander;
pub mod framebuffer;
pub mod input;
pub mod payload;
pub mod render;
pub mod session;
pub mod st7701;
pub mod surface;
pub mod touch;

pub use app::{App, CycleOutcome};
pub use compositor::{compose, mask_stride, MaskedBitmap};
pub use framebuffer::FrameBuffer;
pub use surface::{DrawTargetSurface, WriteSurface, WriteTransaction};
