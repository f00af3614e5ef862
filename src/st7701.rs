//! ST7701S bring-up over the expander's 3-wire SPI.
//!
//! The controller only needs commands at power-up; pixels arrive over the
//! parallel RGB bus afterwards. Vendor gamma and power tables are left at the
//! panel's OTP defaults.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::expander_pins;
use crate::error::BusError;
use crate::expander::{Expander, PinMode, SoftSpi};

pub struct Cmd;
impl Cmd {
    pub const SW_RESET: u8 = 0x01;
    pub const SLEEP_OUT: u8 = 0x11;
    pub const COLMOD: u8 = 0x3A;
    pub const DISPLAY_ON: u8 = 0x29;
}

/// 16 bits per pixel on the RGB interface.
const COLMOD_RGB565: u8 = 0x50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOp {
    Command(u8),
    Data(u8),
    DelayMs(u32),
}

pub const INIT_OPERATIONS: &[InitOp] = &[
    InitOp::Command(Cmd::SW_RESET),
    InitOp::DelayMs(120),
    InitOp::Command(Cmd::SLEEP_OUT),
    InitOp::DelayMs(120),
    InitOp::Command(Cmd::COLMOD),
    InitOp::Data(COLMOD_RGB565),
    InitOp::Command(Cmd::DISPLAY_ON),
    InitOp::DelayMs(20),
];

pub fn panel_spi() -> SoftSpi {
    SoftSpi {
        cs: expander_pins::TFT_CS,
        sck: expander_pins::TFT_SCK,
        mosi: expander_pins::TFT_MOSI,
    }
}

/// Pulse the reset line, then play `ops` to the controller.
pub fn init<I, D>(
    expander: &mut Expander,
    i2c: &mut I,
    delay: &mut D,
    ops: &[InitOp],
) -> Result<(), BusError>
where
    I: I2c,
    D: DelayNs,
{
    let spi = panel_spi();
    spi.begin(expander, i2c)?;

    expander.pin_mode(i2c, expander_pins::TFT_RESET, PinMode::Output)?;
    expander.digital_write(i2c, expander_pins::TFT_RESET, false)?;
    delay.delay_ms(10);
    expander.digital_write(i2c, expander_pins::TFT_RESET, true)?;
    delay.delay_ms(120);

    for op in ops {
        match *op {
            InitOp::Command(cmd) => spi.write_word(expander, i2c, false, cmd)?,
            InitOp::Data(byte) => spi.write_word(expander, i2c, true, byte)?,
            InitOp::DelayMs(ms) => delay.delay_ms(ms),
        }
    }
    log::info!("Panel controller initialized ({} operations)", ops.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::i2c::EXPANDER_ADDR;
    use crate::expander::tests::MockBus;

    #[derive(Default)]
    struct CountingDelay {
        total_ns: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += u64::from(ns);
        }
    }

    /// Rebuild the 9-bit words from the MOSI level at each rising clock edge.
    fn decode_words(writes: &[(u8, Vec<u8>)]) -> Vec<u16> {
        let sck = 1 << expander_pins::TFT_SCK;
        let mosi = 1 << expander_pins::TFT_MOSI;
        let cs = 1 << expander_pins::TFT_CS;

        let mut words = Vec::new();
        let mut word = 0u16;
        let mut bits = 0;
        let mut last = 0xFFu8;
        for (_, bytes) in writes.iter().filter(|(_, b)| b[0] == 0x01) {
            let out = bytes[1];
            if out & cs == 0 && last & sck == 0 && out & sck != 0 {
                word = (word << 1) | u16::from(out & mosi != 0);
                bits += 1;
                if bits == 9 {
                    words.push(word);
                    word = 0;
                    bits = 0;
                }
            }
            last = out;
        }
        words
    }

    #[test_log::test]
    fn sends_the_init_table() {
        let mut bus = MockBus::with_devices(&[EXPANDER_ADDR]);
        let mut expander = Expander::new(EXPANDER_ADDR);
        let mut delay = CountingDelay::default();

        init(&mut expander, &mut bus, &mut delay, INIT_OPERATIONS).unwrap();

        assert_eq!(
            decode_words(&bus.writes),
            vec![0x001, 0x011, 0x03A, 0x150, 0x029]
        );
        // reset pulse plus the table's own pauses
        assert_eq!(delay.total_ns, (10 + 120 + 120 + 120 + 20) * 1_000_000);
    }

    #[test_log::test]
    fn reset_is_released_high() {
        let mut bus = MockBus::with_devices(&[EXPANDER_ADDR]);
        let mut expander = Expander::new(EXPANDER_ADDR);

        init(&mut expander, &mut bus, &mut CountingDelay::default(), &[]).unwrap();

        let output = bus.get(EXPANDER_ADDR, 0x01);
        assert_ne!(output & (1 << expander_pins::TFT_RESET), 0);
        assert_ne!(output & (1 << expander_pins::TFT_CS), 0);
    }
}
