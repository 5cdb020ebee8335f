//! HTTP binding for resource controllers: one set of routes per configured resource.

use std::sync::Arc;
use std::time::Duration;

use axum::{response::Json, routing::get, Router};
use resource_kit::ModelProvider;
use serde_json::{json, Value};

pub mod api;
pub mod config;
pub mod middleware;

pub use api::rest::response::EnvelopeResponse;
pub use api::rest::routes::{build_resource_router, register_resource, MountError, MountedResource};
pub use config::{ResourceApiConfig, ResourceEntry};

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Resource routes plus `/health`, wrapped in the HTTP middleware stack.
pub fn build_router(
    cfg: &ResourceApiConfig,
    models: Arc<dyn ModelProvider>,
    timeout: Duration,
) -> Result<Router, MountError> {
    if cfg.prefix().is_empty() {
        if let Some(entry) = cfg.resources.iter().find(|r| r.name == "health") {
            return Err(MountError::InvalidName {
                name: entry.name.clone(),
            });
        }
    }
    let router = build_resource_router(cfg, models)?.route("/health", get(health_check));
    Ok(middleware::apply_http_layers(
        router,
        timeout,
        cfg.body_limit_bytes,
    ))
}
