use anyhow::{anyhow, Context, Result};
use embedded_svc::wifi::{AuthMethod, ClientConfiguration, Configuration};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::modem::Modem;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};
use log::{info, warn};

use goober_display::config::WifiRetry;

#[derive(Debug)]
pub struct WifiNetwork<'a> {
    pub ssid: &'a str,
    pub password: &'a str,
    pub auth_method: AuthMethod,
}

impl<'a> WifiNetwork<'a> {
    pub const fn new(ssid: &'a str, password: &'a str) -> Self {
        Self {
            ssid,
            password,
            auth_method: AuthMethod::WPA2Personal,
        }
    }
}

pub struct WifiManager<'a> {
    network: WifiNetwork<'a>,
    retry: WifiRetry,
    wifi: Box<BlockingWifi<EspWifi<'static>>>,
}

impl<'a> WifiManager<'a> {
    pub fn new(
        modem: Modem,
        sys_loop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        network: WifiNetwork<'a>,
        retry: WifiRetry,
    ) -> Result<Self> {
        let mut wifi = Box::new(BlockingWifi::wrap(
            EspWifi::new(modem, sys_loop.clone(), Some(nvs))?,
            sys_loop,
        )?);

        let wifi_config = Configuration::Client(ClientConfiguration {
            ssid: network
                .ssid
                .try_into()
                .map_err(|_| anyhow!("SSID '{}' is too long", network.ssid))?,
            password: network
                .password
                .try_into()
                .map_err(|_| anyhow!("WiFi password is too long"))?,
            auth_method: network.auth_method,
            ..Default::default()
        });
        wifi.set_configuration(&wifi_config)?;
        wifi.start().context("Failed to start WiFi")?;

        Ok(Self {
            network,
            retry,
            wifi,
        })
    }

    /// Keep trying until the station is associated and has an address.
    pub fn connect(&mut self) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            info!("Connecting to {} (attempt {})", self.network.ssid, attempt);
            match self.try_connect() {
                Ok(true) => break,
                Ok(false) => warn!(
                    "No link to {} after {:?}, retrying",
                    self.network.ssid,
                    self.retry.attempt_budget()
                ),
                Err(e) => warn!("Failed to connect to {}: {:?}", self.network.ssid, e),
            }
            // start the next attempt from a clean state
            let _ = self.wifi.wifi_mut().disconnect();
        }

        self.wifi.wait_netif_up()?;
        if let Some(ip_info) = self.get_ip_info()? {
            info!("Connected to {}, IP: {}", self.network.ssid, ip_info.ip);
        }
        Ok(())
    }

    fn try_connect(&mut self) -> Result<bool> {
        // the non-blocking connect, so the link can be polled on our own schedule
        self.wifi.wifi_mut().connect()?;
        for _ in 0..self.retry.polls_per_attempt {
            FreeRtos::delay_ms(self.retry.poll_interval.as_millis() as u32);
            if self.wifi.is_connected()? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn get_ip_info(&self) -> Result<Option<esp_idf_svc::ipv4::IpInfo>> {
        Ok(Some(self.wifi.wifi().sta_netif().get_ip_info()?))
    }

    pub fn is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }
}
