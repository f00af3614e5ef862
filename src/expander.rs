//! PCA9554-compatible I2C I/O expander.
//!
//! Carries the backlight enable line, the two front buttons and the bit-banged
//! 3-wire SPI lines used to send the panel its init commands.

use embedded_hal::i2c::I2c;

use crate::error::BusError;

const REG_INPUT: u8 = 0x00;
const REG_OUTPUT: u8 = 0x01;
const REG_CONFIG: u8 = 0x03;

const PIN_COUNT: u8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Output,
}

/// Register-level driver. Output and direction registers are cached so a single
/// pin change is one I2C write.
#[derive(Debug)]
pub struct Expander {
    address: u8,
    output: u8,
    config: u8,
}

impl Expander {
    /// Power-on state: every pin an input, output latch all high.
    pub fn new(address: u8) -> Self {
        Self {
            address,
            output: 0xFF,
            config: 0xFF,
        }
    }

    /// Push the cached registers so chip and driver agree.
    pub fn init<I: I2c>(&mut self, i2c: &mut I) -> Result<(), BusError> {
        self.write_reg(i2c, REG_OUTPUT, self.output)?;
        self.write_reg(i2c, REG_CONFIG, self.config)
    }

    pub fn pin_mode<I: I2c>(&mut self, i2c: &mut I, pin: u8, mode: PinMode) -> Result<(), BusError> {
        let bit = pin_bit(pin)?;
        // 1 = input on this chip
        self.config = match mode {
            PinMode::Input => self.config | bit,
            PinMode::Output => self.config & !bit,
        };
        self.write_reg(i2c, REG_CONFIG, self.config)
    }

    pub fn digital_write<I: I2c>(&mut self, i2c: &mut I, pin: u8, high: bool) -> Result<(), BusError> {
        let bit = pin_bit(pin)?;
        self.write_masked(i2c, bit, if high { bit } else { 0 })
    }

    pub fn digital_read<I: I2c>(&mut self, i2c: &mut I, pin: u8) -> Result<bool, BusError> {
        let bit = pin_bit(pin)?;
        Ok(self.read_inputs(i2c)? & bit != 0)
    }

    /// All eight input levels in one transfer.
    pub fn read_inputs<I: I2c>(&mut self, i2c: &mut I) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[REG_INPUT], &mut buf)
            .map_err(|e| BusError::i2c(self.address, e))?;
        Ok(buf[0])
    }

    /// Set the output bits selected by `mask` to the matching bits of `value`.
    pub fn write_masked<I: I2c>(&mut self, i2c: &mut I, mask: u8, value: u8) -> Result<(), BusError> {
        self.output = (self.output & !mask) | (value & mask);
        self.write_reg(i2c, REG_OUTPUT, self.output)
    }

    fn write_reg<I: I2c>(&mut self, i2c: &mut I, reg: u8, value: u8) -> Result<(), BusError> {
        i2c.write(self.address, &[reg, value])
            .map_err(|e| BusError::i2c(self.address, e))
    }
}

fn pin_bit(pin: u8) -> Result<u8, BusError> {
    if pin >= PIN_COUNT {
        return Err(BusError::InvalidPin(pin));
    }
    Ok(1 << pin)
}

/// 3-wire SPI (9-bit words, D/C as the first bit) bit-banged over expander pins.
pub struct SoftSpi {
    pub cs: u8,
    pub sck: u8,
    pub mosi: u8,
}

impl SoftSpi {
    /// Idle state: chip deselected, clock low.
    pub fn begin<I: I2c>(&self, expander: &mut Expander, i2c: &mut I) -> Result<(), BusError> {
        for pin in [self.cs, self.sck, self.mosi] {
            expander.pin_mode(i2c, pin, PinMode::Output)?;
        }
        let (cs, sck, mosi) = (pin_bit(self.cs)?, pin_bit(self.sck)?, pin_bit(self.mosi)?);
        expander.write_masked(i2c, cs | sck | mosi, cs)
    }

    /// Clock out one 9-bit word, MSB first. `data` selects the D/C bit.
    pub fn write_word<I: I2c>(
        &self,
        expander: &mut Expander,
        i2c: &mut I,
        data: bool,
        byte: u8,
    ) -> Result<(), BusError> {
        let (cs, sck, mosi) = (pin_bit(self.cs)?, pin_bit(self.sck)?, pin_bit(self.mosi)?);
        let word = (u16::from(data) << 8) | u16::from(byte);

        expander.write_masked(i2c, cs, 0)?;
        for shift in (0..9).rev() {
            let level = if word >> shift & 1 != 0 { mosi } else { 0 };
            // data changes while the clock is low, the panel samples on the rising edge
            expander.write_masked(i2c, sck | mosi, level)?;
            expander.write_masked(i2c, sck, sck)?;
        }
        expander.write_masked(i2c, cs | sck, cs)
    }
}
