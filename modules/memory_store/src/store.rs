use std::collections::HashSet;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::RwLock;
use resource_kit::{
    FieldDescriptor, Fields, Filters, Item, ItemId, ModelError, ResourceModel, SearchResult,
};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::config::ModelSeed;

/// Fields stamped by the store on create when the schema declares them.
const TIMESTAMP_FIELDS: [&str; 2] = ["created", "modified"];

struct State {
    items: Vec<Item>,
    next_id: i64,
}

/// A `ResourceModel` holding its items in memory, in insertion order.
pub struct MemoryModel {
    name: String,
    fields: Vec<FieldDescriptor>,
    required: Vec<String>,
    state: RwLock<State>,
}

impl std::fmt::Debug for MemoryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryModel")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("items", &self.state.read().items.len())
            .finish()
    }
}

impl MemoryModel {
    /// Build a model from its seed. Fails on duplicate item ids, undeclared item
    /// attributes, or required fields missing from the schema.
    pub fn from_seed(seed: ModelSeed) -> Result<Self> {
        let mut keys: Vec<String> = Vec::with_capacity(seed.fields.len() + 2);
        for key in ["id", "label"] {
            if !seed.fields.iter().any(|f| f == key) {
                keys.push(key.to_string());
            }
        }
        for key in seed.fields {
            if keys.contains(&key) {
                bail!("model '{}': field '{}' declared twice", seed.name, key);
            }
            keys.push(key);
        }

        for req in &seed.required {
            if req == "id" || !keys.contains(req) {
                bail!("model '{}': required field '{}' is not declared", seed.name, req);
            }
        }

        let mut seen = HashSet::new();
        for item in &seed.items {
            if !seen.insert(item.id.to_string()) {
                bail!("model '{}': duplicate item id '{}'", seed.name, item.id);
            }
            if let Some(key) = item.attributes.keys().find(|k| !keys.contains(k)) {
                bail!(
                    "model '{}': item '{}' has undeclared attribute '{}'",
                    seed.name,
                    item.id,
                    key
                );
            }
        }

        let next_id = seed
            .items
            .iter()
            .filter_map(|i| match i.id {
                ItemId::Int(n) => Some(n),
                ItemId::Str(_) => None,
            })
            .max()
            .map_or(1, |n| n.saturating_add(1));

        debug!(model = %seed.name, items = seed.items.len(), "memory model seeded");

        Ok(Self {
            name: seed.name,
            fields: keys.into_iter().map(FieldDescriptor::new).collect(),
            required: seed.required,
            state: RwLock::new(State {
                items: seed.items,
                next_id,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.state.read().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn declares(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    fn build_item(&self, id: ItemId, fields: &Fields) -> Result<Item, ModelError> {
        if fields.contains_key("id") {
            return Err(ModelError::validation("id is assigned by the store"));
        }

        let unknown: Vec<&str> = fields
            .keys()
            .map(String::as_str)
            .filter(|k| !self.declares(k))
            .collect();
        if !unknown.is_empty() {
            return Err(ModelError::validation(format!(
                "Unknown fields: {}",
                unknown.join(", ")
            )));
        }

        let missing: Vec<&str> = self
            .required
            .iter()
            .map(String::as_str)
            .filter(|k| fields.get(*k).map_or(true, is_blank))
            .collect();
        if !missing.is_empty() {
            return Err(ModelError::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        let label = match fields.get("label") {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(ModelError::validation("label must be a string")),
        };

        let mut item = Item::new(id, label);
        for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != "label") {
            item.attributes.insert(key.clone(), value.clone());
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        for key in TIMESTAMP_FIELDS.into_iter().filter(|k| self.declares(k)) {
            item.attributes.insert(key.to_string(), Value::from(now.as_str()));
        }

        Ok(item)
    }
}

#[async_trait]
impl ResourceModel for MemoryModel {
    async fn describe_fields(&self) -> Result<Vec<FieldDescriptor>, ModelError> {
        Ok(self.fields.clone())
    }

    #[instrument(name = "memory_store.get_all", skip(self, filters), fields(model = %self.name))]
    async fn get_all(
        &self,
        page: u32,
        per_page: u32,
        filters: &Filters,
    ) -> Result<Vec<Item>, ModelError> {
        let offset = (page.max(1) as usize - 1).saturating_mul(per_page as usize);
        let state = self.state.read();
        Ok(state
            .items
            .iter()
            .filter(|item| matches_filters(item, filters))
            .skip(offset)
            .take(per_page as usize)
            .cloned()
            .collect())
    }

    #[instrument(name = "memory_store.get_by_ids", skip(self, ids, filters), fields(model = %self.name, count = ids.len()))]
    async fn get_by_ids(
        &self,
        ids: &[String],
        filters: &Filters,
    ) -> Result<Vec<Item>, ModelError> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let state = self.state.read();
        Ok(state
            .items
            .iter()
            .filter(|item| wanted.contains(item.id.to_string().as_str()))
            .filter(|item| matches_filters(item, filters))
            .cloned()
            .collect())
    }

    #[instrument(name = "memory_store.search", skip(self, filters), fields(model = %self.name))]
    async fn search(&self, keywords: &str, filters: &Filters) -> Result<SearchResult, ModelError> {
        let needle = keywords.to_lowercase();
        let state = self.state.read();
        let data = state
            .items
            .iter()
            .filter(|item| matches_filters(item, filters))
            .filter(|item| matches_keywords(item, &needle))
            .cloned()
            .collect();
        Ok(SearchResult { data })
    }

    #[instrument(name = "memory_store.create", skip(self, fields), fields(model = %self.name))]
    async fn create(&self, fields: &Fields, return_item: bool) -> Result<Item, ModelError> {
        let mut state = self.state.write();
        let id = ItemId::Int(state.next_id);
        let item = self.build_item(id, fields)?;
        state.next_id = state.next_id.saturating_add(1);
        state.items.push(item.clone());
        debug!(id = %item.id, "item created");

        if return_item {
            Ok(item)
        } else {
            Ok(Item::new(item.id, item.label))
        }
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Every filter must match. An array filter value matches any of its elements.
fn matches_filters(item: &Item, filters: &Filters) -> bool {
    filters.iter().all(|(key, expected)| {
        let Some(actual) = item.get(key) else {
            return false;
        };
        match expected {
            Value::Array(options) => options.iter().any(|o| loose_eq(&actual, o)),
            other => loose_eq(&actual, other),
        }
    })
}

/// Equality that treats `7` and `"7"` as the same value; query strings carry no types.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (scalar_text(a), scalar_text(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn matches_keywords(item: &Item, needle: &str) -> bool {
    std::iter::once(item.label.as_str())
        .chain(item.attributes.values().filter_map(Value::as_str))
        .any(|text| text.to_lowercase().contains(needle))
}
