use std::collections::HashSet;
use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use resource_kit::{ConfigError, Filters, ModelProvider, ResourceController};
use thiserror::Error;

use crate::api::rest::handlers;
use crate::config::ResourceApiConfig;

/// A controller mounted under a path segment, with its base filters.
#[derive(Debug)]
pub struct MountedResource {
    pub name: String,
    pub controller: ResourceController,
    pub filters: Filters,
}

/// Why a resource could not be mounted.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("resource name must not be empty")]
    EmptyName,

    #[error("resource name '{name}' must be a single path segment")]
    InvalidName { name: String },

    #[error("resource '{name}' is configured twice")]
    DuplicateName { name: String },

    #[error("resource '{name}': {source}")]
    Controller {
        name: String,
        #[source]
        source: ConfigError,
    },
}

fn check_name(name: &str) -> Result<(), MountError> {
    if name.is_empty() {
        return Err(MountError::EmptyName);
    }
    if name.contains(['/', '{', '}', '*', '?', '#']) || name.trim() != name {
        return Err(MountError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Mount `GET|POST {prefix}/{name}` and `GET {prefix}/{name}/search`.
pub fn register_resource(router: Router, prefix: &str, resource: MountedResource) -> Router {
    let index = format!("{prefix}/{}", resource.name);
    let search = format!("{index}/search");
    tracing::debug!(resource = %resource.name, path = %index, "mounting resource");

    let routes = Router::new()
        .route(&index, get(handlers::get_index).post(handlers::post_index))
        .route(&search, get(handlers::get_search))
        .layer(Extension(Arc::new(resource)));

    router.merge(routes)
}

/// Build one controller per configured resource and mount them all.
/// Every binding must resolve; the first misconfigured resource aborts the build.
pub fn build_resource_router(
    cfg: &ResourceApiConfig,
    models: Arc<dyn ModelProvider>,
) -> Result<Router, MountError> {
    let prefix = cfg.prefix();
    let mut seen = HashSet::new();
    let mut router = Router::new();

    for entry in &cfg.resources {
        check_name(&entry.name)?;
        if !seen.insert(entry.name.as_str()) {
            return Err(MountError::DuplicateName {
                name: entry.name.clone(),
            });
        }

        let controller = ResourceController::bind(entry.to_controller_config(), models.clone())
            .map_err(|source| MountError::Controller {
                name: entry.name.clone(),
                source,
            })?;

        router = register_resource(
            router,
            &prefix,
            MountedResource {
                name: entry.name.clone(),
                controller,
                filters: entry.filters.clone(),
            },
        );
    }

    tracing::info!(resources = seen.len(), prefix = %prefix, "resource routes registered");
    Ok(router)
}
