use resource_kit::Item;
use serde::{Deserialize, Serialize};

/// `modules.memory_store` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryStoreConfig {
    #[serde(default)]
    pub models: Vec<ModelSeed>,
}

/// One in-memory model, registered in the hub under `(provider, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSeed {
    pub provider: String,
    pub name: String,
    /// Declared schema in order. `id` and `label` are added in front when omitted.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Fields that `create` refuses to go without.
    #[serde(default)]
    pub required: Vec<String>,
    /// Initial contents.
    #[serde(default)]
    pub items: Vec<Item>,
}

impl ModelSeed {
    pub fn new(provider: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            name: name.into(),
            fields: Vec::new(),
            required: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_required<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = required.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_items(mut self, items: Vec<Item>) -> Self {
        self.items = items;
        self
    }
}
