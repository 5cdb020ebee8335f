use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-deployment controller settings. Immutable once a controller is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Model name used for the provider lookup.
    pub model_name: String,
    /// Provider (namespace) the model is registered under.
    pub model_provider: String,
    /// Minimum keyword length accepted by search.
    #[serde(default)]
    pub min_search_length: usize,
    /// Maximum number of distinct ids in one fetch-by-id request.
    #[serde(default = "default_max_items_per_request")]
    pub max_items_per_request: usize,
    /// Page size used by list when the caller does not supply one.
    #[serde(default = "default_max_items_per_page")]
    pub max_items_per_page: u32,
}

fn default_max_items_per_request() -> usize {
    100
}

fn default_max_items_per_page() -> u32 {
    10
}

impl ControllerConfig {
    pub fn new(model_name: impl Into<String>, model_provider: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            model_provider: model_provider.into(),
            min_search_length: 0,
            max_items_per_request: default_max_items_per_request(),
            max_items_per_page: default_max_items_per_page(),
        }
    }

    pub fn with_min_search_length(mut self, len: usize) -> Self {
        self.min_search_length = len;
        self
    }

    pub fn with_max_items_per_request(mut self, max: usize) -> Self {
        self.max_items_per_request = max;
        self
    }

    pub fn with_max_items_per_page(mut self, max: u32) -> Self {
        self.max_items_per_page = max;
        self
    }

    /// Check the binding and thresholds. Runs once, at controller construction.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::MissingModelName);
        }
        if self.model_provider.trim().is_empty() {
            return Err(ConfigError::MissingModelProvider);
        }
        if self.max_items_per_page == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(())
    }
}

/// Fatal, construction-time configuration problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("\"model_name\" is required")]
    MissingModelName,

    #[error("\"model_provider\" is required")]
    MissingModelProvider,

    #[error("\"max_items_per_page\" must be greater than zero")]
    ZeroPageSize,

    #[error("model '{name}' is not registered by provider '{provider}'")]
    UnresolvedModel { provider: String, name: String },
}
