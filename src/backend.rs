//! Backend API used by the display and by the fingerprint station.

use serde::Serialize;

use crate::config;
use crate::error::BackendError;

/// Status and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Moves requests to the backend. On the device this is the ESP-IDF HTTP
/// client; tests script it.
pub trait Transport {
    fn get(&mut self, path: &str) -> Result<Response, BackendError>;

    fn post_json(&mut self, path: &str, body: &[u8]) -> Result<Response, BackendError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn get(&mut self, path: &str) -> Result<Response, BackendError> {
        (**self).get(path)
    }

    fn post_json(&mut self, path: &str, body: &[u8]) -> Result<Response, BackendError> {
        (**self).post_json(path, body)
    }
}

#[derive(Debug, Serialize)]
struct FingerprintReport {
    fingerprint: String,
}

pub struct BackendClient<T> {
    transport: T,
}

impl<T: Transport> BackendClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Current session. Any status is a valid answer here, the caller decides
    /// what it means.
    pub fn poll_session(&mut self) -> Result<Response, BackendError> {
        log::debug!("GET {}", config::SESSIONS_PATH);
        let response = self.transport.get(config::SESSIONS_PATH)?;
        log::debug!(
            "{} answered {} with {} bytes",
            config::SESSIONS_PATH,
            response.status,
            response.body.len()
        );
        Ok(response)
    }

    /// Tell the backend which stored template just matched.
    pub fn report_fingerprint(&mut self, id: u8) -> Result<(), BackendError> {
        let body = serde_json::to_vec(&FingerprintReport {
            fingerprint: id.to_string(),
        })?;
        let response = self.transport.post_json(config::SESSIONS_PATH, &body)?;
        if !(200..300).contains(&response.status) {
            return Err(BackendError::Status {
                path: config::SESSIONS_PATH.to_string(),
                status: response.status,
            });
        }
        log::info!("reported fingerprint #{}", id);
        Ok(())
    }

    /// Slot the sensor should store the next enrolled template in.
    pub fn next_enroll_id(&mut self) -> Result<u8, BackendError> {
        let path = config::NEXT_ENROLL_ID_PATH;
        let response = self.transport.get(path)?;
        if response.status != 200 {
            return Err(BackendError::Status {
                path: path.to_string(),
                status: response.status,
            });
        }

        let body = String::from_utf8_lossy(&response.body);
        body.trim().parse().map_err(|_| BackendError::InvalidId {
            path: path.to_string(),
            body: body.into_owned(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Request {
        Get(String),
        Post(String, String),
    }

    /// Replays canned responses and records what was asked.
    #[derive(Default)]
    pub struct ScriptedTransport {
        pub responses: VecDeque<Result<Response, BackendError>>,
        pub requests: Vec<Request>,
    }

    impl ScriptedTransport {
        pub fn respond(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.responses.push_back(Ok(Response {
                status,
                body: body.into(),
            }));
            self
        }

        pub fn fail(mut self, reason: &str) -> Self {
            self.responses
                .push_back(Err(BackendError::Transport(reason.to_string())));
            self
        }

        fn next(&mut self) -> Result<Response, BackendError> {
            self.responses
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::Transport("no scripted response".into())))
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&mut self, path: &str) -> Result<Response, BackendError> {
            self.requests.push(Request::Get(path.to_string()));
            self.next()
        }

        fn post_json(&mut self, path: &str, body: &[u8]) -> Result<Response, BackendError> {
            self.requests.push(Request::Post(
                path.to_string(),
                String::from_utf8_lossy(body).into_owned(),
            ));
            self.next()
        }
    }

    #[test_log::test]
    fn polls_sessions_endpoint() {
        let mut client = BackendClient::new(ScriptedTransport::default().respond(201, "{}"));
        let response = client.poll_session().unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(client.transport.requests, vec![Request::Get("/v1/sessions".into())]);
    }

    #[test_log::test]
    fn reports_fingerprint_as_string_id() {
        let mut client = BackendClient::new(ScriptedTransport::default().respond(200, ""));
        client.report_fingerprint(42).unwrap();

        assert_eq!(
            client.transport.requests,
            vec![Request::Post("/v1/sessions".into(), r#"{"fingerprint":"42"}"#.into())]
        );
    }

    #[test_log::test]
    fn rejected_report_is_an_error() {
        let mut client = BackendClient::new(ScriptedTransport::default().respond(400, "nope"));
        let err = client.report_fingerprint(1).unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 400, .. }));
    }

    #[test_log::test]
    fn parses_next_enroll_id() {
        let mut client = BackendClient::new(
            ScriptedTransport::default()
                .respond(200, "17\n")
                .respond(200, "banana")
                .respond(200, "300")
                .respond(503, ""),
        );

        assert_eq!(client.next_enroll_id().unwrap(), 17);
        assert!(matches!(client.next_enroll_id(), Err(BackendError::InvalidId { .. })));
        assert!(matches!(client.next_enroll_id(), Err(BackendError::InvalidId { .. })));
        assert!(matches!(
            client.next_enroll_id(),
            Err(BackendError::Status { status: 503, .. })
        ));
        assert_eq!(client.transport.requests[0], Request::Get("/v1/gimme-new-one".into()));
    }

    #[test_log::test]
    fn transport_errors_propagate() {
        let mut client = BackendClient::new(ScriptedTransport::default().fail("connection reset"));
        assert!(matches!(client.poll_session(), Err(BackendError::Transport(_))));
    }
}
