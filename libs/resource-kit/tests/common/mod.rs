#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use resource_kit::{
    ControllerConfig, FieldDescriptor, Fields, Filters, Item, ModelError, ModelHub,
    ResourceController, ResourceModel, SearchResult,
};

pub const PROVIDER: &str = "test";
pub const NAME: &str = "widget";

/// One recorded call into the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DescribeFields,
    GetAll { page: u32, per_page: u32 },
    GetByIds { ids: Vec<String> },
    Search { keywords: String },
    Create { fields: Fields, return_item: bool },
}

/// Mock model that records every call and answers from a fixed item list.
#[derive(Default)]
pub struct RecordingModel {
    pub calls: Mutex<Vec<Call>>,
    pub last_filters: Mutex<Option<Filters>>,
    pub items: Vec<Item>,
    pub fields: Vec<&'static str>,
    pub fail_with: Option<(u16, &'static str)>,
}

impl RecordingModel {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            fields: vec!["id", "label", "status"],
            ..Default::default()
        }
    }

    pub fn failing(status: u16, message: &'static str) -> Self {
        Self {
            fail_with: Some((status, message)),
            fields: vec!["id", "label", "status"],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call, filters: Option<&Filters>) -> Result<(), ModelError> {
        self.calls.lock().push(call);
        if let Some(f) = filters {
            *self.last_filters.lock() = Some(f.clone());
        }
        match self.fail_with {
            Some((500, msg)) => Err(ModelError::internal(msg)),
            Some((status, msg)) => Err(ModelError::rejected(status, msg)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceModel for RecordingModel {
    async fn describe_fields(&self) -> Result<Vec<FieldDescriptor>, ModelError> {
        self.calls.lock().push(Call::DescribeFields);
        Ok(self.fields.iter().map(|k| FieldDescriptor::new(*k)).collect())
    }

    async fn get_all(
        &self,
        page: u32,
        per_page: u32,
        filters: &Filters,
    ) -> Result<Vec<Item>, ModelError> {
        self.record(Call::GetAll { page, per_page }, Some(filters))?;
        Ok(self.items.clone())
    }

    async fn get_by_ids(
        &self,
        ids: &[String],
        filters: &Filters,
    ) -> Result<Vec<Item>, ModelError> {
        self.record(Call::GetByIds { ids: ids.to_vec() }, Some(filters))?;
        Ok(self
            .items
            .iter()
            .filter(|i| ids.contains(&i.id.to_string()))
            .cloned()
            .collect())
    }

    async fn search(&self, keywords: &str, filters: &Filters) -> Result<SearchResult, ModelError> {
        self.record(
            Call::Search {
                keywords: keywords.to_string(),
            },
            Some(filters),
        )?;
        Ok(SearchResult {
            data: self.items.clone(),
        })
    }

    async fn create(&self, fields: &Fields, return_item: bool) -> Result<Item, ModelError> {
        self.record(
            Call::Create {
                fields: fields.clone(),
                return_item,
            },
            None,
        )?;
        let label = fields
            .get("label")
            .and_then(|v| v.as_str())
            .unwrap_or("new")
            .to_string();
        Ok(Item::new(42, label).with_attribute("status", "created"))
    }
}

/// Controller bound to `model` through a fresh hub.
pub fn controller_for(
    model: Arc<RecordingModel>,
    config: ControllerConfig,
) -> ResourceController {
    let hub = ModelHub::new();
    hub.register_shared(PROVIDER, NAME, model);
    ResourceController::bind(config, Arc::new(hub)).expect("controller should bind")
}

pub fn config() -> ControllerConfig {
    ControllerConfig::new(NAME, PROVIDER)
}

pub fn widgets(n: i64) -> Vec<Item> {
    (1..=n)
        .map(|i| Item::new(i, format!("Widget {i}")).with_attribute("status", "live"))
        .collect()
}
