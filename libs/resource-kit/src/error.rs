use thiserror::Error;

use crate::envelope::Envelope;
use crate::model::ModelError;

/// Request-level failures produced by the controller.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("You can request a maximum of {max} items per request")]
    TooManyIds { max: usize },

    #[error("Search term must be {min} characters or longer.")]
    SearchTooShort { min: usize },

    #[error("The following arguments are invalid: {}", .keys.join(", "))]
    InvalidArguments { keys: Vec<String> },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl ControllerError {
    pub fn status(&self) -> u16 {
        match self {
            ControllerError::TooManyIds { .. }
            | ControllerError::SearchTooShort { .. }
            | ControllerError::InvalidArguments { .. } => 400,
            ControllerError::Model(e) => e.status(),
        }
    }
}

impl From<ControllerError> for Envelope {
    fn from(e: ControllerError) -> Self {
        let message = match &e {
            ControllerError::Model(model) => model.public_message(),
            other => other.to_string(),
        };
        Envelope::failure(e.status(), message)
    }
}
