#[cfg(target_os = "espidf")]
mod http;
#[cfg(target_os = "espidf")]
mod panel;
#[cfg(target_os = "espidf")]
mod wifi;

// The I2C driver below takes gpio8 and gpio18 by type; keep the configured bus pins in step
#[cfg(target_os = "espidf")]
const _: () = assert!(goober_display::config::i2c::SDA == 8 && goober_display::config::i2c::SCL == 18);
#[cfg(target_os = "espidf")]
const _: () = assert!(
    !panel::pins::Pins::is_rgb(goober_display::config::i2c::SDA as i32)
        && !panel::pins::Pins::is_rgb(goober_display::config::i2c::SCL as i32)
);

// https://docs.esp-rs.org/esp-idf-svc/esp_idf_svc/
#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use anyhow::{anyhow, Context};
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::hal::delay::{Delay, FreeRtos};
    use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::prelude::*;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use goober_display::backend::BackendClient;
    use goober_display::config::{self, i2c as bus};
    use goober_display::expander::Expander;
    use goober_display::input::{Backlight, InputManager};
    use goober_display::{assets, st7701, App, CycleOutcome};

    use crate::http::EspHttpTransport;
    use crate::panel::RgbPanel;
    use crate::wifi::{WifiManager, WifiNetwork};

    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    let peripherals = Peripherals::take().context("Could not take peripherals")?;
    let sys_loop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    log::info!("Configuring I2C for the expander and touch overlay");
    let i2c_config = I2cConfig::new().baudrate(bus::BAUDRATE_HZ.Hz());
    let mut i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio18,
        &i2c_config,
    )?;

    let mut expander = Expander::new(bus::EXPANDER_ADDR);
    expander.init(&mut i2c).context("I/O expander did not answer")?;
    st7701::init(&mut expander, &mut i2c, &mut Delay::default(), st7701::INIT_OPERATIONS)?;

    let mut panel = RgbPanel::new().context("Could not create RGB panel")?;
    assets::boot_screen(&mut panel).map_err(|e| anyhow!("Boot screen failed: {:?}", e))?;

    let mut input = InputManager::new(i2c, expander)?;
    input.set_backlight(Backlight::On)?;

    log::info!("Waiting {:?} for the network to come up", config::BOOT_DELAY);
    FreeRtos::delay_ms(config::BOOT_DELAY.as_millis() as u32);

    let mut wifi = WifiManager::new(
        peripherals.modem,
        sys_loop,
        nvs,
        WifiNetwork::new(config::WIFI_SSID, config::WIFI_PASS),
        config::WIFI_RETRY,
    )?;
    wifi.connect()?;

    if !input.probe_touch(bus::TOUCH_ADDR) {
        log::warn!("Touch disabled");
    }

    let transport = EspHttpTransport::new(config::BACKEND_URL)?;
    let seed = u64::from(unsafe { esp_idf_svc::sys::esp_random() });
    let mut app = App::new(BackendClient::new(transport), panel, input, seed);

    log::info!("Polling {}", config::backend_url(config::BACKEND_URL, config::SESSIONS_PATH));
    loop {
        match app.cycle() {
            Ok(CycleOutcome::Drew(status)) => log::debug!("Cycle done, showing {:?}", status),
            Ok(CycleOutcome::Skipped) => {}
            Err(e) => {
                log::error!("Cycle failed: {:?}", e);
                if !wifi.is_connected() {
                    log::warn!("WiFi dropped, reconnecting");
                    wifi.connect()?;
                }
                FreeRtos::delay_ms(config::ERROR_BACKOFF.as_millis() as u32);
            }
        }
        if let Some(e) = app.surface_mut().take_error() {
            log::warn!("Panel reported: {}", e);
        }
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    anyhow::bail!("goober-display runs on the ESP32-S3 only; build it for the xtensa-esp32s3-espidf target")
}
