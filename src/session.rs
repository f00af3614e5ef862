//! What the backend's session endpoint is telling the display to show.

use embedded_graphics::prelude::Point;

use crate::error::DecodeError;
use crate::payload::{Goober, ImagePayload};

/// Where a goober portrait goes, leaving the top-left for the text overlay.
pub const GOOBER_ORIGIN: Point = Point::new(140, 140);

/// Enrollment QR codes cover the whole screen.
pub const ENROLLMENT_ORIGIN: Point = Point::new(0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// 200: a fingerprint matched, show the goober.
    Goober,
    /// 201: a new fingerprint, show the enrollment QR code.
    Enrollment,
    /// Anything else: nobody at the station.
    Idle,
}

impl SessionStatus {
    pub fn from_http(status: u16) -> Self {
        match status {
            200 => SessionStatus::Goober,
            201 => SessionStatus::Enrollment,
            _ => SessionStatus::Idle,
        }
    }

    /// Text shown while the payload is downloaded and decoded.
    pub fn loading_text(self) -> Option<&'static str> {
        match self {
            SessionStatus::Goober => Some("Loading Goober"),
            SessionStatus::Enrollment => Some("Loading QR Code"),
            SessionStatus::Idle => None,
        }
    }
}

#[derive(Debug)]
pub enum SessionUpdate {
    Goober { goober: Goober, image: ImagePayload },
    Enrollment { image: ImagePayload },
    Idle,
}

impl SessionUpdate {
    pub fn from_response(status: SessionStatus, body: &[u8]) -> Result<Self, DecodeError> {
        match status {
            SessionStatus::Goober => {
                let mut image = ImagePayload::from_json(body)?;
                let goober = image.goober.take().ok_or(DecodeError::MissingGoober)?;
                Ok(SessionUpdate::Goober { goober, image })
            }
            SessionStatus::Enrollment => Ok(SessionUpdate::Enrollment {
                image: ImagePayload::from_json(body)?,
            }),
            SessionStatus::Idle => Ok(SessionUpdate::Idle),
        }
    }
}

/// Remembers what the last completed cycle drew so the screen is only wiped
/// when the content actually changes.
#[derive(Debug, Default)]
pub struct DisplayState {
    last_status: Option<SessionStatus>,
    last_goober: Option<String>,
}

impl DisplayState {
    pub fn last_status(&self) -> Option<SessionStatus> {
        self.last_status
    }

    /// The status differs from the last completed cycle, so the old content has to go.
    pub fn status_changed(&self, status: SessionStatus) -> bool {
        self.last_status != Some(status)
    }

    pub fn goober_changed(&self, name: &str) -> bool {
        self.last_goober.as_deref() != Some(name)
    }

    pub fn remember_goober(&mut self, name: &str) {
        self.last_goober = Some(name.to_owned());
    }

    pub fn complete(&mut self, status: SessionStatus) {
        self.last_status = Some(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::payload_json;

    #[test_log::test]
    fn classifies_http_status() {
        assert_eq!(SessionStatus::from_http(200), SessionStatus::Goober);
        assert_eq!(SessionStatus::from_http(201), SessionStatus::Enrollment);
        assert_eq!(SessionStatus::from_http(204), SessionStatus::Idle);
        assert_eq!(SessionStatus::from_http(404), SessionStatus::Idle);
        assert_eq!(SessionStatus::from_http(500), SessionStatus::Idle);
    }

    #[test_log::test]
    fn goober_session_requires_goober_record() {
        let json = payload_json(1, 1, &[0], None, "null");
        let err = SessionUpdate::from_response(SessionStatus::Goober, json.as_bytes()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingGoober));

        // the same body is fine for an enrollment
        let update = SessionUpdate::from_response(SessionStatus::Enrollment, json.as_bytes()).unwrap();
        assert!(matches!(update, SessionUpdate::Enrollment { .. }));
    }

    #[test_log::test]
    fn goober_session_moves_record_out_of_image() {
        let json = payload_json(1, 1, &[0], None, r#"{"name": "Pip", "stats": []}"#);
        match SessionUpdate::from_response(SessionStatus::Goober, json.as_bytes()).unwrap() {
            SessionUpdate::Goober { goober, image } => {
                assert_eq!(goober.name, "Pip");
                assert!(image.goober.is_none());
            }
            other => panic!("unexpected update {:?}", other),
        }
    }

    #[test_log::test]
    fn idle_ignores_body() {
        let update = SessionUpdate::from_response(SessionStatus::Idle, b"<html>not found</html>").unwrap();
        assert!(matches!(update, SessionUpdate::Idle));
    }

    #[test_log::test]
    fn tracks_status_and_goober_changes() {
        let mut state = DisplayState::default();
        assert!(state.status_changed(SessionStatus::Goober));

        state.complete(SessionStatus::Goober);
        assert!(!state.status_changed(SessionStatus::Goober));
        assert!(state.status_changed(SessionStatus::Enrollment));

        assert!(state.goober_changed("Pip"));
        state.remember_goober("Pip");
        assert!(!state.goober_changed("Pip"));
        assert!(state.goober_changed("Gub"));
    }
}
