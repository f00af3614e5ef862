//! Backend transport on top of the ESP-IDF HTTP client.

use core::fmt::Debug;

use embedded_svc::http::client::Client;
use embedded_svc::http::{Method, Status};
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

use goober_display::backend::{Response, Transport};
use goober_display::config;
use goober_display::error::BackendError;

const READ_CHUNK: usize = 1024;

pub struct EspHttpTransport {
    base_url: &'static str,
    client: Client<EspHttpConnection>,
}

impl EspHttpTransport {
    pub fn new(base_url: &'static str) -> anyhow::Result<Self> {
        let connection = EspHttpConnection::new(&Configuration {
            // payloads are a few hundred kilobytes of base64
            buffer_size: Some(4096),
            ..Default::default()
        })?;
        Ok(Self {
            base_url,
            client: Client::wrap(connection),
        })
    }

    fn send(&mut self, method: Method, path: &str, body: Option<&[u8]>) -> Result<Response, BackendError> {
        let url = config::backend_url(self.base_url, path);
        let content_length = body.map(|b| b.len().to_string());

        let mut headers = vec![("accept", "application/json")];
        if let Some(length) = content_length.as_deref() {
            headers.push(("content-type", "application/json"));
            headers.push(("content-length", length));
        }

        let mut request = self
            .client
            .request(method, &url, &headers)
            .map_err(transport_error)?;
        if let Some(body) = body {
            request.write_all(body).map_err(transport_error)?;
            request.flush().map_err(transport_error)?;
        }

        let mut response = request.submit().map_err(transport_error)?;
        let status = response.status();

        let mut body = Vec::new();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let read = response.read(&mut chunk).map_err(transport_error)?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }
        log::debug!("{} {} -> {} ({} bytes)", method_name(method), url, status, body.len());

        Ok(Response { status, body })
    }
}

impl Transport for EspHttpTransport {
    fn get(&mut self, path: &str) -> Result<Response, BackendError> {
        self.send(Method::Get, path, None)
    }

    fn post_json(&mut self, path: &str, body: &[u8]) -> Result<Response, BackendError> {
        self.send(Method::Post, path, Some(body))
    }
}

fn method_name(method: Method) -> &'static str {
    match method {
        Method::Post => "POST",
        _ => "GET",
    }
}

fn transport_error<E: Debug>(e: E) -> BackendError {
    BackendError::Transport(format!("{:?}", e))
}
