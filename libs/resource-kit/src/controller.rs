use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{ConfigError, ControllerConfig};
use crate::envelope::Envelope;
use crate::error::ControllerError;
use crate::format::{IdLabel, ItemFormatter};
use crate::hub::ModelProvider;
use crate::model::{Fields, Filters, Item, ModelError, ResourceModel};
use crate::params;

/// Stateless controller exposing list / fetch / search / create over one model binding.
///
/// Validation failures are answered with a failure [`Envelope`] before the model is
/// touched. Model failures during `create` are converted into an envelope as well;
/// for the read operations they are returned as `Err` for the caller to handle.
#[derive(Clone)]
pub struct ResourceController {
    config: ControllerConfig,
    models: Arc<dyn ModelProvider>,
    formatter: Arc<dyn ItemFormatter>,
}

impl std::fmt::Debug for ResourceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceController {
    /// Build a controller; the configuration is validated here and never again.
    pub fn new(
        config: ControllerConfig,
        models: Arc<dyn ModelProvider>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            models,
            formatter: Arc::new(IdLabel),
        })
    }

    /// Like [`ResourceController::new`], and additionally checks that the binding resolves.
    pub fn bind(
        config: ControllerConfig,
        models: Arc<dyn ModelProvider>,
    ) -> Result<Self, ConfigError> {
        let controller = Self::new(config, models)?;
        controller
            .model()
            .map_err(|_| ConfigError::UnresolvedModel {
                provider: controller.config.model_provider.clone(),
                name: controller.config.model_name.clone(),
            })?;
        Ok(controller)
    }

    /// Replace the output projection.
    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: ItemFormatter + 'static,
    {
        self.formatter = Arc::new(formatter);
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn format(&self, item: &Item) -> Value {
        self.formatter.format(item)
    }

    fn format_all(&self, items: &[Item]) -> Vec<Value> {
        items.iter().map(|i| self.format(i)).collect()
    }

    fn model(&self) -> Result<Arc<dyn ResourceModel>, ModelError> {
        Ok(self
            .models
            .model(&self.config.model_provider, &self.config.model_name)?)
    }

    /// List one page. `page` falls back to 1, `per_page` to `max_items_per_page`.
    #[instrument(
        name = "resource_kit.controller.list",
        skip(self, filters),
        fields(model = %self.config.model_name)
    )]
    pub async fn list(
        &self,
        filters: &Filters,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Envelope, ModelError> {
        let page = page.filter(|p| *p > 0).unwrap_or(1);
        let per_page = per_page
            .filter(|p| *p > 0)
            .unwrap_or(self.config.max_items_per_page);

        let items = self.model()?.get_all(page, per_page, filters).await?;
        debug!(page, per_page, count = items.len(), "listed items");

        // TODO: expose total count once ResourceModel can report it
        Ok(Envelope::list(self.format_all(&items)))
    }

    /// Fetch by `id` or comma-separated `ids`.
    ///
    /// `ids` supplies the value when both are present, but the response is a single
    /// item (or `null`) whenever `id` itself was given.
    #[instrument(
        name = "resource_kit.controller.fetch_by_id",
        skip(self, filters),
        fields(model = %self.config.model_name)
    )]
    pub async fn fetch_by_id(
        &self,
        id: Option<&str>,
        ids: Option<&str>,
        filters: &Filters,
    ) -> Result<Envelope, ModelError> {
        let wanted = params::distinct_ids(params::pick_ids(id, ids));

        if wanted.len() > self.config.max_items_per_request {
            warn!(
                requested = wanted.len(),
                max = self.config.max_items_per_request,
                "too many ids requested"
            );
            return Ok(ControllerError::TooManyIds {
                max: self.config.max_items_per_request,
            }
            .into());
        }

        let items = self.model()?.get_by_ids(&wanted, filters).await?;
        let mut out = self.format_all(&items);
        debug!(requested = wanted.len(), found = out.len(), "fetched items");

        if params::is_singular(id) {
            let first = if out.is_empty() {
                None
            } else {
                Some(out.swap_remove(0))
            };
            Ok(Envelope::single(first))
        } else {
            Ok(Envelope::list(out))
        }
    }

    /// Keyword search; rejects terms shorter than `min_search_length` bytes.
    #[instrument(
        name = "resource_kit.controller.search",
        skip(self, filters),
        fields(model = %self.config.model_name)
    )]
    pub async fn search(&self, keywords: &str, filters: &Filters) -> Result<Envelope, ModelError> {
        let min = self.config.min_search_length;
        if keywords.len() < min {
            debug!(min, "search term too short");
            return Ok(ControllerError::SearchTooShort { min }.into());
        }

        let result = self.model()?.search(keywords, filters).await?;
        Ok(Envelope::list(self.format_all(&result.data)))
    }

    /// Create an item from the submitted body. Never fails: every error becomes
    /// a failure envelope.
    #[instrument(
        name = "resource_kit.controller.create",
        skip(self, body),
        fields(model = %self.config.model_name, keys = body.len())
    )]
    pub async fn create(&self, body: &Fields) -> Envelope {
        match self.try_create(body).await {
            Ok(item) => Envelope::data(item),
            Err(e) => {
                warn!(status = e.status(), error = %e, "create rejected");
                e.into()
            }
        }
    }

    async fn try_create(&self, body: &Fields) -> Result<Value, ControllerError> {
        let model = self.model()?;
        let fields = model.describe_fields().await?;
        let allowed = params::allowed_fields(&fields);

        let invalid = params::invalid_keys(body, &allowed);
        if !invalid.is_empty() {
            return Err(ControllerError::InvalidArguments {
                keys: invalid.into_iter().map(str::to_string).collect(),
            });
        }

        let item = model.create(body, true).await?;
        Ok(self.format(&item))
    }
}
