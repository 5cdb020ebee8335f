use resource_kit::{Envelope, ModelError};

use super::response::EnvelopeResponse;

/// Render a model failure that escaped the controller. Rejections keep their
/// message; lookup and storage failures are logged and reported generically.
pub fn map_model_error(resource: &str, error: &ModelError) -> EnvelopeResponse {
    let status = error.status();
    match error {
        ModelError::Rejected { .. } => {
            tracing::warn!(resource, status, error = %error, "model rejected request");
        }
        ModelError::Lookup(_) | ModelError::Internal(_) => {
            tracing::error!(resource, status, error = %error, "model call failed");
        }
    }
    EnvelopeResponse::ok(Envelope::failure(status, error.public_message()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn rejection_keeps_status_and_message() {
        let resp = map_model_error("colours", &ModelError::rejected(404, "no such colour"));
        assert_eq!(resp.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = ModelError::internal("disk on fire at /var/lib/store");
        let resp = map_model_error("colours", &err);
        assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
