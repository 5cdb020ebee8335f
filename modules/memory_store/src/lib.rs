//! In-memory resource models, seeded from configuration and registered in a [`ModelHub`].

pub mod config;
pub mod store;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use resource_kit::ModelHub;
use tracing::info;

pub use config::{MemoryStoreConfig, ModelSeed};
pub use store::MemoryModel;

/// Register every configured model in `hub`. Each binding shares one store, so
/// items created through one lookup are visible to the next.
pub fn register_models(hub: &ModelHub, cfg: MemoryStoreConfig) -> Result<usize> {
    let mut count = 0;
    for seed in cfg.models {
        if hub.contains(&seed.provider, &seed.name) {
            bail!(
                "model binding registered twice: provider={}, name={}",
                seed.provider,
                seed.name
            );
        }
        let provider = seed.provider.clone();
        let name = seed.name.clone();
        let model = MemoryModel::from_seed(seed)
            .with_context(|| format!("invalid memory_store model '{provider}/{name}'"))?;
        hub.register_shared(&provider, &name, Arc::new(model));
        count += 1;
    }
    info!(models = count, "memory_store models registered");
    Ok(count)
}
