//! Error types shared across the display firmware.

use embedded_hal::i2c::ErrorKind;
use thiserror::Error;

/// A [`crate::compositor::MaskedBitmap`] could not be built from the given buffers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositeError {
    #[error("colour buffer holds {actual} pixels, {width}x{height} needs {expected}")]
    ColorLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("mask buffer holds {actual} bytes, {width}x{height} needs {expected}")]
    MaskLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("bitmap dimensions {width}x{height} overflow the address space")]
    Overflow { width: u32, height: u32 },
}

/// The backend payload did not map onto a drawable image.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed session payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("field `{field}` is not valid base64: {source}")]
    Base64 {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },
    #[error("field `{field}` decoded to {actual} bytes, expected {expected}")]
    Length {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("goober session carried no `goober` record")]
    MissingGoober,
    #[error(transparent)]
    Bitmap(#[from] CompositeError),
}

/// An I2C peripheral did not acknowledge or the transfer failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    #[error("i2c transfer to 0x{address:02X} failed: {kind:?}")]
    I2c { address: u8, kind: ErrorKind },
    #[error("pin {0} is out of range for this expander")]
    InvalidPin(u8),
}

impl BusError {
    pub(crate) fn i2c<E: embedded_hal::i2c::Error>(address: u8, err: E) -> Self {
        BusError::I2c {
            address,
            kind: err.kind(),
        }
    }
}

/// Talking to the backend failed.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected HTTP status {status} from {path}")]
    Status { path: String, status: u16 },
    #[error("response from {path} is not a valid enrollment id: {body:?}")]
    InvalidId { path: String, body: String },
    #[error("could not encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}
