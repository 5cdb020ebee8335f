use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::hub::HubError;

/// Arbitrary filter bag forwarded untouched to the model.
pub type Filters = Map<String, Value>;

/// Submitted field values for `create`, in submission order.
pub type Fields = Map<String, Value>;

/// Describes one field of the model's schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key: String,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// Item identifier: models may key items by integer or by string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Int(i) => write!(f, "{i}"),
            ItemId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemId {
    fn from(v: i64) -> Self {
        ItemId::Int(v)
    }
}

impl From<i32> for ItemId {
    fn from(v: i32) -> Self {
        ItemId::Int(i64::from(v))
    }
}

impl From<&str> for ItemId {
    fn from(v: &str) -> Self {
        ItemId::Str(v.to_string())
    }
}

impl From<String> for ItemId {
    fn from(v: String) -> Self {
        ItemId::Str(v)
    }
}

impl From<&ItemId> for Value {
    fn from(id: &ItemId) -> Self {
        match id {
            ItemId::Int(i) => Value::from(*i),
            ItemId::Str(s) => Value::from(s.as_str()),
        }
    }
}

/// A model record. Only `id` and `label` are contractual; everything else is
/// model-internal and carried in `attributes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub label: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up any attribute by key, including `id` and `label`.
    pub fn get(&self, key: &str) -> Option<Value> {
        match key {
            "id" => Some(Value::from(&self.id)),
            "label" => Some(Value::from(self.label.as_str())),
            other => self.attributes.get(other).cloned(),
        }
    }
}

/// Result of a keyword search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub data: Vec<Item>,
}

/// Client-facing text for failures whose details stay in the logs.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal error";

/// Failures raised by a resource model.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model refused the request; carries an HTTP-style status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// The configured model binding could not be resolved.
    #[error(transparent)]
    Lookup(#[from] HubError),

    /// Anything else (storage failures, bugs). Reported as 500.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ModelError {
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::rejected(400, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }

    /// Text safe to show a client: rejections keep their message, lookup and
    /// storage failures collapse to [`INTERNAL_ERROR_MESSAGE`].
    pub fn public_message(&self) -> String {
        match self {
            ModelError::Rejected { message, .. } => message.clone(),
            ModelError::Lookup(_) | ModelError::Internal(_) => INTERNAL_ERROR_MESSAGE.to_string(),
        }
    }

    /// HTTP-style status for this failure; 500 unless the model said otherwise.
    pub fn status(&self) -> u16 {
        match self {
            ModelError::Rejected { status, .. } => *status,
            ModelError::Lookup(_) | ModelError::Internal(_) => 500,
        }
    }
}

/// Port for the controller: the operations every backing model must provide.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait ResourceModel: Send + Sync {
    /// Ordered schema of the model's fields.
    async fn describe_fields(&self) -> Result<Vec<FieldDescriptor>, ModelError>;

    /// One page of items. `page` is 1-based.
    async fn get_all(
        &self,
        page: u32,
        per_page: u32,
        filters: &Filters,
    ) -> Result<Vec<Item>, ModelError>;

    /// Items whose id is in `ids`.
    async fn get_by_ids(&self, ids: &[String], filters: &Filters)
        -> Result<Vec<Item>, ModelError>;

    async fn search(&self, keywords: &str, filters: &Filters) -> Result<SearchResult, ModelError>;

    /// Persist a new item. With `return_item` the stored item is returned in full.
    async fn create(&self, fields: &Fields, return_item: bool) -> Result<Item, ModelError>;
}
