use resource_kit::{ControllerConfig, Filters};
use serde::{Deserialize, Serialize};

fn default_base_path() -> String {
    "/api".to_string()
}

fn default_body_limit() -> usize {
    16 * 1024 * 1024
}

/// `modules.resource_api` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceApiConfig {
    /// Path prefix every resource is mounted under. Empty or "/" mounts at the root.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Maximum accepted request body, in bytes.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

impl Default for ResourceApiConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            body_limit_bytes: default_body_limit(),
            resources: Vec::new(),
        }
    }
}

/// One mounted resource: a path segment plus the controller settings behind it.
/// Missing model fields deserialize as empty and are reported by controller validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    pub name: String,
    #[serde(default)]
    pub model_name: String,
    #[serde(default)]
    pub model_provider: String,
    #[serde(default)]
    pub min_search_length: Option<usize>,
    #[serde(default)]
    pub max_items_per_request: Option<usize>,
    #[serde(default)]
    pub max_items_per_page: Option<u32>,
    /// Base filters passed to every model call.
    #[serde(default)]
    pub filters: Filters,
}

impl ResourceEntry {
    pub fn new(
        name: impl Into<String>,
        model_name: impl Into<String>,
        model_provider: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            model_name: model_name.into(),
            model_provider: model_provider.into(),
            min_search_length: None,
            max_items_per_request: None,
            max_items_per_page: None,
            filters: Filters::new(),
        }
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Controller settings; unset limits keep the controller defaults.
    pub fn to_controller_config(&self) -> ControllerConfig {
        let mut cfg = ControllerConfig::new(&self.model_name, &self.model_provider);
        if let Some(len) = self.min_search_length {
            cfg = cfg.with_min_search_length(len);
        }
        if let Some(max) = self.max_items_per_request {
            cfg = cfg.with_max_items_per_request(max);
        }
        if let Some(max) = self.max_items_per_page {
            cfg = cfg.with_max_items_per_page(max);
        }
        cfg
    }
}

impl ResourceApiConfig {
    /// Normalized prefix: leading slash, no trailing slash, empty for the root.
    pub fn prefix(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }
}
