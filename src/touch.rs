//! Capacitive touch overlays.
//!
//! Two controller families show up on these panels: FocalTech (FT6206,
//! FT6236, FT5336) and Hynitron CST8xx. Both expose the touch count at 0x02 and
//! the first point at 0x03..0x06, so only detection differs.

use embedded_graphics::prelude::Point;
use embedded_hal::i2c::I2c;

use crate::error::BusError;

const REG_TOUCH_COUNT: u8 = 0x02;
const REG_FIRST_POINT: u8 = 0x03;
const REG_FOCAL_VENDOR_ID: u8 = 0xA8;
const FOCAL_VENDOR_ID: u8 = 0x11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    Focal,
    Cst,
}

#[derive(Debug)]
pub struct TouchController {
    address: u8,
    kind: TouchKind,
}

impl TouchController {
    /// Look for a FocalTech chip first, then a CST8xx, at `address`.
    /// `None` means the panel has no working touch overlay.
    pub fn probe<I: I2c>(i2c: &mut I, address: u8) -> Option<Self> {
        let mut vendor = [0u8; 1];
        match i2c.write_read(address, &[REG_FOCAL_VENDOR_ID], &mut vendor) {
            Ok(()) if vendor[0] == FOCAL_VENDOR_ID => {
                log::info!("Focal touchscreen found at 0x{:02X}", address);
                return Some(Self {
                    address,
                    kind: TouchKind::Focal,
                });
            }
            Ok(()) => log::debug!("0x{:02X} vendor id 0x{:02X} is not Focal", address, vendor[0]),
            Err(_) => {}
        }

        let mut count = [0u8; 1];
        if i2c.write_read(address, &[REG_TOUCH_COUNT], &mut count).is_ok() {
            log::info!("CST826 touchscreen found at 0x{:02X}", address);
            return Some(Self {
                address,
                kind: TouchKind::Cst,
            });
        }

        log::warn!("No touchscreen found at address 0x{:02X}", address);
        None
    }

    pub fn kind(&self) -> TouchKind {
        self.kind
    }

    /// First active touch point, if the panel is being touched.
    pub fn poll<I: I2c>(&mut self, i2c: &mut I) -> Result<Option<Point>, BusError> {
        let mut count = [0u8; 1];
        i2c.write_read(self.address, &[REG_TOUCH_COUNT], &mut count)
            .map_err(|e| BusError::i2c(self.address, e))?;
        // upper nibble is reserved on both families; 0x0F means "no data" on CST parts
        let touches = count[0] & 0x0F;
        if touches == 0 || touches == 0x0F {
            return Ok(None);
        }

        let mut data = [0u8; 4];
        i2c.write_read(self.address, &[REG_FIRST_POINT], &mut data)
            .map_err(|e| BusError::i2c(self.address, e))?;
        let x = (u16::from(data[0] & 0x0F) << 8) | u16::from(data[1]);
        let y = (u16::from(data[2] & 0x0F) << 8) | u16::from(data[3]);
        Ok(Some(Point::new(i32::from(x), i32::from(y))))
    }
}
