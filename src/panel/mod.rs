//! 480x480 parallel RGB panel driven by the ESP32-S3 LCD peripheral.
//!
//! The peripheral scans its own frame buffer out of PSRAM continuously. Drawing
//! happens in a local [`FrameBuffer`]; touched rows are copied over with
//! `esp_lcd_panel_draw_bitmap` once a write batch or a draw call is complete.

pub mod pins;

use core::convert::Infallible;
use core::ffi::c_void;

use display_interface::DisplayError;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use esp_idf_svc::sys::{
    esp, esp_lcd_new_rgb_panel, esp_lcd_panel_del, esp_lcd_panel_draw_bitmap, esp_lcd_panel_handle_t,
    esp_lcd_panel_init, esp_lcd_panel_reset, esp_lcd_rgb_panel_config_t, soc_periph_lcd_clk_src_t_LCD_CLK_SRC_DEFAULT,
    EspError,
};

use goober_display::config::{timing, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use goober_display::{FrameBuffer, WriteSurface};

use self::pins::Pins;

pub struct RgbPanel {
    handle: esp_lcd_panel_handle_t,
    buffer: FrameBuffer,
    last_error: Option<EspError>,
}

impl RgbPanel {
    /// Create the RGB panel with its frame buffer in PSRAM and start scanning out.
    pub fn new() -> Result<Self, EspError> {
        let mut config: esp_lcd_rgb_panel_config_t = unsafe { core::mem::zeroed() };
        config.clk_src = soc_periph_lcd_clk_src_t_LCD_CLK_SRC_DEFAULT;
        config.data_width = 16;
        config.bits_per_pixel = 16;
        config.num_fbs = 1;
        config.hsync_gpio_num = Pins::HSYNC;
        config.vsync_gpio_num = Pins::VSYNC;
        config.de_gpio_num = Pins::DE;
        config.pclk_gpio_num = Pins::PCLK;
        config.disp_gpio_num = -1;
        config.data_gpio_nums = Pins::DATA;
        config.flags.set_fb_in_psram(1);

        config.timings.pclk_hz = timing::PCLK_HZ;
        config.timings.h_res = DISPLAY_WIDTH;
        config.timings.v_res = DISPLAY_HEIGHT;
        config.timings.hsync_pulse_width = timing::HSYNC_PULSE_WIDTH;
        config.timings.hsync_back_porch = timing::HSYNC_BACK_PORCH;
        config.timings.hsync_front_porch = timing::HSYNC_FRONT_PORCH;
        config.timings.vsync_pulse_width = timing::VSYNC_PULSE_WIDTH;
        config.timings.vsync_back_porch = timing::VSYNC_BACK_PORCH;
        config.timings.vsync_front_porch = timing::VSYNC_FRONT_PORCH;
        // a sync line with positive polarity idles low
        config.timings.flags.set_hsync_idle_low(u32::from(!timing::HSYNC_POLARITY));
        config.timings.flags.set_vsync_idle_low(u32::from(!timing::VSYNC_POLARITY));
        config.timings.flags.set_pclk_active_neg(u32::from(timing::PCLK_ACTIVE_NEG));

        let mut handle: esp_lcd_panel_handle_t = core::ptr::null_mut();
        unsafe {
            esp!(esp_lcd_new_rgb_panel(&config, &mut handle))?;
            if let Err(e) = esp!(esp_lcd_panel_reset(handle)).and_then(|_| esp!(esp_lcd_panel_init(handle))) {
                let _ = esp_lcd_panel_del(handle);
                return Err(e);
            }
        }
        log::info!(
            "RGB panel {}x{} up at {} Hz pixel clock",
            DISPLAY_WIDTH,
            DISPLAY_HEIGHT,
            timing::PCLK_HZ
        );

        Ok(Self {
            handle,
            buffer: FrameBuffer::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            last_error: None,
        })
    }

    /// First flush failure since the last call.
    pub fn take_error(&mut self) -> Option<EspError> {
        self.last_error.take()
    }

    /// Copy the rows touched since the last flush to the panel.
    pub fn flush(&mut self) -> Result<(), EspError> {
        let Some(dirty) = self.buffer.take_dirty() else {
            return Ok(());
        };
        let first = dirty.top_left.y.max(0) as u32;
        let last = first + dirty.size.height;
        let rows = self.buffer.rows(first..last);

        // whole rows, so the slice is contiguous in the local buffer
        unsafe {
            esp!(esp_lcd_panel_draw_bitmap(
                self.handle,
                0,
                first as i32,
                DISPLAY_WIDTH as i32,
                last as i32,
                rows.as_ptr() as *const c_void,
            ))
        }
    }

    fn flush_or_latch(&mut self) {
        if let Err(e) = self.flush() {
            log::warn!("Panel flush failed: {}", e);
            self.last_error.get_or_insert(e);
        }
    }
}

impl Drop for RgbPanel {
    fn drop(&mut self) {
        unsafe {
            let _ = esp_lcd_panel_del(self.handle);
        }
    }
}

impl WriteSurface for RgbPanel {
    fn write_pixel(&mut self, x: i32, y: i32, color: Rgb565) {
        self.buffer.write_pixel(x, y, color);
    }

    fn end_write(&mut self) {
        self.flush_or_latch();
    }
}

impl OriginDimensions for RgbPanel {
    fn size(&self) -> Size {
        self.buffer.size()
    }
}

impl DrawTarget for RgbPanel {
    type Color = Rgb565;
    type Error = DisplayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.buffer.draw_iter(pixels).map_err(infallible)?;
        self.flush().map_err(|_| DisplayError::BusWriteError)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.fill_solid(area, color).map_err(infallible)?;
        self.flush().map_err(|_| DisplayError::BusWriteError)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.buffer.clear(color).map_err(infallible)?;
        self.flush().map_err(|_| DisplayError::BusWriteError)
    }
}

fn infallible(e: Infallible) -> DisplayError {
    match e {}
}
