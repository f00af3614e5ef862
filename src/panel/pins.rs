//! GPIO assignments of the Qualia ESP32-S3 RGB666 board
//!
//! Only the pins wired straight to the ESP32 are listed here. Reset, chip select
//! and the init SPI lines of the panel go through the I/O expander, see
//! `goober_display::config::expander_pins`.

/// Pin configuration constants for the parallel RGB interface
pub struct Pins;

impl Pins {
    // Sync and clock
    /// Data enable
    pub const DE: i32 = 2;
    /// Vertical sync
    pub const VSYNC: i32 = 42;
    /// Horizontal sync
    pub const HSYNC: i32 = 41;
    /// Pixel clock
    pub const PCLK: i32 = 1;

    // Red, R0 is not wired
    pub const R1: i32 = 11;
    pub const R2: i32 = 10;
    pub const R3: i32 = 9;
    pub const R4: i32 = 46;
    pub const R5: i32 = 3;

    // Green
    pub const G0: i32 = 48;
    pub const G1: i32 = 47;
    pub const G2: i32 = 21;
    pub const G3: i32 = 14;
    pub const G4: i32 = 13;
    pub const G5: i32 = 12;

    // Blue, B0 is not wired
    pub const B1: i32 = 40;
    pub const B2: i32 = 39;
    pub const B3: i32 = 38;
    pub const B4: i32 = 0;
    pub const B5: i32 = 45;

    /// RGB565 data lines in the order the LCD peripheral expects: blue in the
    /// low bits, red in the high bits.
    pub const DATA: [i32; 16] = [
        Self::B1,
        Self::B2,
        Self::B3,
        Self::B4,
        Self::B5,
        Self::G0,
        Self::G1,
        Self::G2,
        Self::G3,
        Self::G4,
        Self::G5,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
    ];

    /// Whether `gpio` is taken by the parallel RGB interface.
    pub const fn is_rgb(gpio: i32) -> bool {
        if gpio == Self::DE || gpio == Self::VSYNC || gpio == Self::HSYNC || gpio == Self::PCLK {
            return true;
        }
        let mut i = 0;
        while i < Self::DATA.len() {
            if Self::DATA[i] == gpio {
                return true;
            }
            i += 1;
        }
        false
    }
}
