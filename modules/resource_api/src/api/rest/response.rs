use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resource_kit::Envelope;

/// An [`Envelope`] rendered with a matching HTTP status: the failure status for
/// failures, `success` otherwise.
#[derive(Debug)]
pub struct EnvelopeResponse {
    envelope: Envelope,
    success: StatusCode,
}

impl EnvelopeResponse {
    pub fn ok(envelope: Envelope) -> Self {
        Self {
            envelope,
            success: StatusCode::OK,
        }
    }

    pub fn created(envelope: Envelope) -> Self {
        Self {
            envelope,
            success: StatusCode::CREATED,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.envelope.status() {
            None => self.success,
            Some(code) => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}

impl IntoResponse for EnvelopeResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.envelope)).into_response()
    }
}
