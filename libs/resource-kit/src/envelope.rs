use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Uniform response shape for every controller operation.
///
/// Serializes to either `{"data": ...}` or `{"status": ..., "error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    Data { data: Value },
    Failure { status: u16, error: String },
}

impl Envelope {
    pub fn data(data: impl Into<Value>) -> Self {
        Self::Data { data: data.into() }
    }

    /// `{"data": [..]}`
    pub fn list(items: Vec<Value>) -> Self {
        Self::Data {
            data: Value::Array(items),
        }
    }

    /// `{"data": item}` or `{"data": null}`
    pub fn single(item: Option<Value>) -> Self {
        Self::Data {
            data: item.unwrap_or(Value::Null),
        }
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        Self::Failure {
            status,
            error: error.into(),
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::failure(400, error)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Data { .. })
    }

    /// Failure status, if this is a failure.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Data { .. } => None,
            Self::Failure { status, .. } => Some(*status),
        }
    }

    pub fn data_ref(&self) -> Option<&Value> {
        match self {
            Self::Data { data } => Some(data),
            Self::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Data { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }
}
