//! Model lookup by `(provider, name)`.
//!
//! - Providers register a factory once per model binding.
//! - Controllers resolve a fresh handle on every call: `hub.model("demo", "colour")`.
//! - Re-registering overwrites the previous factory; handles already handed out stay valid.

use parking_lot::RwLock;
use std::{collections::HashMap, fmt, sync::Arc};

use crate::model::ResourceModel;

/// Produces a model handle for one request.
pub type ModelFactory = Arc<dyn Fn() -> Arc<dyn ResourceModel> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("model not found: provider={provider}, name={name}")]
    NotFound { provider: String, name: String },
}

/// Resolves a model binding to a handle.
pub trait ModelProvider: Send + Sync {
    fn model(&self, provider: &str, name: &str) -> Result<Arc<dyn ResourceModel>, HubError>;
}

#[derive(Clone, Eq, PartialEq, Hash)]
struct BindingKey {
    provider: Arc<str>,
    name: Arc<str>,
}

impl BindingKey {
    fn new(provider: &str, name: &str) -> Self {
        Self {
            provider: Arc::from(provider),
            name: Arc::from(name),
        }
    }
}

impl fmt::Debug for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.name)
    }
}

/// Registry of model factories.
#[derive(Default)]
pub struct ModelHub {
    map: RwLock<HashMap<BindingKey, ModelFactory>>,
}

impl ModelHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory invoked on every lookup.
    pub fn register<F>(&self, provider: &str, name: &str, factory: F)
    where
        F: Fn() -> Arc<dyn ResourceModel> + Send + Sync + 'static,
    {
        let key = BindingKey::new(provider, name);
        tracing::debug!(binding = ?key, "registering model factory");
        self.map.write().insert(key, Arc::new(factory));
    }

    /// Register a model whose state is shared; each lookup hands out a new `Arc` to it.
    pub fn register_shared<M>(&self, provider: &str, name: &str, model: Arc<M>)
    where
        M: ResourceModel + 'static,
    {
        self.register(provider, name, move || model.clone() as Arc<dyn ResourceModel>);
    }

    pub fn contains(&self, provider: &str, name: &str) -> bool {
        self.map
            .read()
            .contains_key(&BindingKey::new(provider, name))
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl ModelProvider for ModelHub {
    fn model(&self, provider: &str, name: &str) -> Result<Arc<dyn ResourceModel>, HubError> {
        // Clone the factory out so the lock is not held while it runs.
        let factory = self
            .map
            .read()
            .get(&BindingKey::new(provider, name))
            .cloned()
            .ok_or_else(|| HubError::NotFound {
                provider: provider.to_string(),
                name: name.to_string(),
            })?;
        Ok(factory())
    }
}

impl fmt::Debug for ModelHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<_> = self.map.read().keys().cloned().collect();
        f.debug_struct("ModelHub").field("bindings", &keys).finish()
    }
}
