//! Build-time configuration.
//!
//! WiFi credentials and the backend location can be overridden through
//! environment variables when building, e.g.
//! `GOOBER_WIFI_SSID=lab GOOBER_WIFI_PASS=secret cargo build --release`.

use core::time::Duration;

const fn env_or(value: Option<&'static str>, default: &'static str) -> &'static str {
    match value {
        Some(v) => v,
        None => default,
    }
}

pub const WIFI_SSID: &str = env_or(option_env!("GOOBER_WIFI_SSID"), "goober");
pub const WIFI_PASS: &str = env_or(option_env!("GOOBER_WIFI_PASS"), "yippee123");

/// Base URL of the backend, no trailing slash.
pub const BACKEND_URL: &str = env_or(option_env!("GOOBER_BACKEND_URL"), "http://goober.garden");

/// Polled every cycle; 200 = goober, 201 = enrollment, anything else = idle.
pub const SESSIONS_PATH: &str = "/v1/sessions";

/// Plain-text next free fingerprint slot.
pub const NEXT_ENROLL_ID_PATH: &str = "/v1/gimme-new-one";

/// Panel geometry in pixels.
pub const DISPLAY_WIDTH: u32 = 480;
pub const DISPLAY_HEIGHT: u32 = 480;

/// How WiFi association is retried. Attempts go on forever; each one polls the
/// link `polls_per_attempt` times, `poll_interval` apart, before giving up on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WifiRetry {
    pub polls_per_attempt: u32,
    pub poll_interval: Duration,
}

pub const WIFI_RETRY: WifiRetry = WifiRetry {
    polls_per_attempt: 10,
    poll_interval: Duration::from_secs(1),
};

impl WifiRetry {
    /// Upper bound on how long one attempt may take.
    pub fn attempt_budget(&self) -> Duration {
        self.poll_interval * self.polls_per_attempt
    }
}

/// Give the backend and the access point time to come up after a power cycle.
pub const BOOT_DELAY: Duration = Duration::from_secs(15);

/// Pause after a failed cycle before polling again.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Builds absolute URLs for backend paths.
pub fn backend_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// I2C wiring shared by the I/O expander and the touch controller.
pub mod i2c {
    /// 1 MHz, the expander and the touch controllers both keep up.
    pub const BAUDRATE_HZ: u32 = 1_000_000;
    pub const SDA: u8 = 8;
    pub const SCL: u8 = 18;

    /// PCA9554-compatible I/O expander.
    pub const EXPANDER_ADDR: u8 = 0x3F;
    /// Most overlays answer here; the 2.1" round panel's CST826 sits at 0x15.
    pub const TOUCH_ADDR: u8 = 0x48;
}

/// Expander pin assignments.
pub mod expander_pins {
    pub const TFT_SCK: u8 = 0;
    pub const TFT_CS: u8 = 1;
    pub const TFT_RESET: u8 = 2;
    pub const TFT_BACKLIGHT: u8 = 4;
    pub const BUTTON_UP: u8 = 5;
    pub const BUTTON_DOWN: u8 = 6;
    pub const TFT_MOSI: u8 = 7;
}

/// RGB interface timings for the 4.0" 480x480 square panel.
pub mod timing {
    pub const PCLK_HZ: u32 = 12_000_000;
    pub const HSYNC_POLARITY: bool = true;
    pub const HSYNC_FRONT_PORCH: u32 = 50;
    pub const HSYNC_PULSE_WIDTH: u32 = 2;
    pub const HSYNC_BACK_PORCH: u32 = 44;
    pub const VSYNC_POLARITY: bool = true;
    pub const VSYNC_FRONT_PORCH: u32 = 16;
    pub const VSYNC_PULSE_WIDTH: u32 = 2;
    pub const VSYNC_BACK_PORCH: u32 = 18;
    /// Data is latched on the rising pixel clock edge.
    pub const PCLK_ACTIVE_NEG: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn joins_backend_urls() {
        assert_eq!(
            backend_url("http://goober.garden", SESSIONS_PATH),
            "http://goober.garden/v1/sessions"
        );
        assert_eq!(backend_url("http://host:8080/", "v1/x"), "http://host:8080/v1/x");
    }

    #[test_log::test]
    fn i2c_lines_are_distinct_gpios() {
        // the ESP32-S3 exposes GPIO0 to GPIO48
        assert_ne!(i2c::SDA, i2c::SCL);
        assert!(i2c::SDA <= 48 && i2c::SCL <= 48);
    }

    #[test_log::test]
    fn wifi_attempts_are_bounded() {
        assert_eq!(WIFI_RETRY.attempt_budget(), Duration::from_secs(10));
    }
}
