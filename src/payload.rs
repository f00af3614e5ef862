//! Strict decoding of the session payload served by the backend.
//!
//! ```json
//! {
//!   "width": 200, "height": 200,
//!   "bitmap": "<base64, width*height little-endian RGB565>",
//!   "mask": "<base64, height*ceil(width/8) bytes>",
//!   "goober": { "name": "Gub", "stats": [{"stat_name": "hp", "stat_value": 3.5, "type": "float"}] }
//! }
//! ```
//!
//! Everything is checked up front so the compositor call that follows cannot
//! trip over a short buffer.

use core::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::compositor::{mask_stride, MaskedBitmap};
use crate::error::{CompositeError, DecodeError};

#[derive(Debug, Deserialize)]
struct WirePayload {
    width: u32,
    height: u32,
    bitmap: String,
    #[serde(default)]
    mask: Option<String>,
    #[serde(default)]
    goober: Option<Goober>,
}

/// The character shown for a matched fingerprint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Goober {
    pub name: String,
    #[serde(default)]
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Stat {
    pub stat_name: String,
    pub stat_value: StatValue,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.stat_value, self.kind.as_str()) {
            (StatValue::Number(v), "float") => write!(f, "{}: {:.2}", self.stat_name, v),
            (StatValue::Number(v), _) => write!(f, "{}: {}", self.stat_name, v),
            (StatValue::Text(v), _) => write!(f, "{}: {}", self.stat_name, v),
        }
    }
}

/// A decoded, length-checked image plus whatever goober record came with it.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub width: u32,
    pub height: u32,
    colors: Vec<u16>,
    mask: Option<Vec<u8>>,
    pub goober: Option<Goober>,
}

impl ImagePayload {
    pub fn from_json(body: &[u8]) -> Result<Self, DecodeError> {
        let wire: WirePayload = serde_json::from_slice(body)?;

        let overflow = CompositeError::Overflow {
            width: wire.width,
            height: wire.height,
        };
        let color_bytes = (wire.width as usize)
            .checked_mul(wire.height as usize)
            .and_then(|pixels| pixels.checked_mul(2))
            .ok_or(overflow.clone())?;
        let raw = decode_field("bitmap", &wire.bitmap, color_bytes)?;
        let colors = raw
            .chunks_exact(2)
            .map(|px| u16::from_le_bytes([px[0], px[1]]))
            .collect();

        let mask = match wire.mask.as_deref() {
            Some(m) => {
                let mask_bytes = mask_stride(wire.width)
                    .checked_mul(wire.height as usize)
                    .ok_or(overflow)?;
                Some(decode_field("mask", m, mask_bytes)?)
            }
            None => None,
        };

        let payload = Self {
            width: wire.width,
            height: wire.height,
            colors,
            mask,
            goober: wire.goober,
        };
        // Same checks the compositor view makes; surfaces a mismatch here rather than at draw time
        payload.bitmap()?;

        log::debug!(
            "decoded {}x{} payload, mask: {}, goober: {:?}",
            payload.width,
            payload.height,
            payload.mask.is_some(),
            payload.goober.as_ref().map(|g| g.name.as_str())
        );
        Ok(payload)
    }

    pub fn bitmap(&self) -> Result<MaskedBitmap<'_>, DecodeError> {
        Ok(MaskedBitmap::new(
            &self.colors,
            self.mask.as_deref(),
            self.width,
            self.height,
        )?)
    }
}

fn decode_field(field: &'static str, encoded: &str, expected: usize) -> Result<Vec<u8>, DecodeError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|source| DecodeError::Base64 { field, source })?;
    if bytes.len() != expected {
        return Err(DecodeError::Length {
            field,
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}
