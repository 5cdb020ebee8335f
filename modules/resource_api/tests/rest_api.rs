use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use memory_store::{register_models, MemoryStoreConfig, ModelSeed};
use resource_api::{
    build_resource_router, build_router, MountError, ResourceApiConfig, ResourceEntry,
};
use resource_kit::{
    FieldDescriptor, Fields, Filters, Item, ModelError, ModelHub, ResourceModel, SearchResult,
};
use serde_json::{json, Value};
use tower::ServiceExt; // for `oneshot`

const PALETTE: [(&str, &str); 12] = [
    ("Red", "warm"),
    ("Green", "cool"),
    ("Blue", "cool"),
    ("Orange", "warm"),
    ("Yellow", "warm"),
    ("Purple", "cool"),
    ("Dark Red", "warm"),
    ("Teal", "cool"),
    ("Pink", "warm"),
    ("Navy", "cool"),
    ("Amber", "warm"),
    ("Cyan", "cool"),
];

/// Fails every call, like a store whose backend is down.
struct BrokenModel;

#[async_trait]
impl ResourceModel for BrokenModel {
    async fn describe_fields(&self) -> Result<Vec<FieldDescriptor>, ModelError> {
        Ok(vec![FieldDescriptor::new("id"), FieldDescriptor::new("label")])
    }

    async fn get_all(&self, _: u32, _: u32, _: &Filters) -> Result<Vec<Item>, ModelError> {
        Err(ModelError::internal("connection refused: 10.0.0.7:5432"))
    }

    async fn get_by_ids(&self, _: &[String], _: &Filters) -> Result<Vec<Item>, ModelError> {
        Err(ModelError::rejected(403, "Not allowed to read these colours"))
    }

    async fn search(&self, _: &str, _: &Filters) -> Result<SearchResult, ModelError> {
        Err(ModelError::internal("index missing"))
    }

    async fn create(&self, _: &Fields, _: bool) -> Result<Item, ModelError> {
        Err(ModelError::rejected(409, "Colour already exists"))
    }
}

fn hub() -> Arc<ModelHub> {
    let items = PALETTE
        .iter()
        .zip(1..)
        .map(|((label, tone), id)| Item::new(id, *label).with_attribute("tone", *tone))
        .collect();
    let hub = ModelHub::new();
    register_models(
        &hub,
        MemoryStoreConfig {
            models: vec![ModelSeed::new("demo", "colour")
                .with_fields(["id", "label", "tone", "created"])
                .with_required(["label"])
                .with_items(items)],
        },
    )
    .unwrap();
    hub.register_shared("demo", "broken", Arc::new(BrokenModel));
    Arc::new(hub)
}

fn api_config() -> ResourceApiConfig {
    let mut colours = ResourceEntry::new("colours", "colour", "demo");
    colours.min_search_length = Some(3);
    colours.max_items_per_request = Some(5);

    let warm = ResourceEntry::new("warm-colours", "colour", "demo")
        .with_filters(json!({"tone": "warm"}).as_object().cloned().unwrap());

    ResourceApiConfig {
        resources: vec![colours, warm, ResourceEntry::new("broken", "broken", "demo")],
        ..Default::default()
    }
}

fn app() -> Router {
    build_resource_router(&api_config(), hub()).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let req = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap();
    send(app, req).await
}

fn labels(body: &Value) -> Vec<&str> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["label"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn list_uses_configured_page_size() {
    let app = app();
    let (status, body) = get(&app, "/api/colours").await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 10);
    assert_eq!(data[0], json!({"id": 1, "label": "Red"}));
}

#[tokio::test]
async fn list_honours_page_and_per_page() {
    let app = app();
    let (_, body) = get(&app, "/api/colours?page=2&per_page=3").await;
    assert_eq!(labels(&body), vec!["Orange", "Yellow", "Purple"]);

    let (_, body) = get(&app, "/api/colours?page=2").await;
    assert_eq!(labels(&body), vec!["Amber", "Cyan"]);
}

#[tokio::test]
async fn bad_page_values_fall_back() {
    let app = app();
    for uri in [
        "/api/colours?page=abc&per_page=2",
        "/api/colours?page=0&per_page=2",
        "/api/colours?page=-4&per_page=2",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(labels(&body), vec!["Red", "Green"], "{uri}");
    }

    let (_, body) = get(&app, "/api/colours?per_page=zero").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn ids_return_distinct_items_as_array() {
    let app = app();
    let (status, body) = get(&app, "/api/colours?ids=3,3,,1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels(&body), vec!["Red", "Blue"]);

    let (_, body) = get(&app, "/api/colours?ids=7").await;
    assert_eq!(body, json!({"data": [{"id": 7, "label": "Dark Red"}]}));
}

#[tokio::test]
async fn repeated_query_keys_use_the_last_value() {
    let app = app();
    let (status, body) = get(&app, "/api/colours?ids=1&ids=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": [{"id": 2, "label": "Green"}]}));

    let (_, body) = get(&app, "/api/colours?page=1&per_page=3&page=2").await;
    assert_eq!(labels(&body), vec!["Orange", "Yellow", "Purple"]);

    let (status, body) = get(&app, "/api/colours/search?keywords=re&keywords=red").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels(&body), vec!["Red", "Dark Red"]);
}

#[tokio::test]
async fn id_returns_single_item_or_null() {
    let app = app();
    let (_, body) = get(&app, "/api/colours?id=2").await;
    assert_eq!(body, json!({"data": {"id": 2, "label": "Green"}}));

    let (status, body) = get(&app, "/api/colours?id=99").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"data": null}));

    // ids supplies the value, id picks the shape
    let (_, body) = get(&app, "/api/colours?id=2&ids=4,5").await;
    assert_eq!(body, json!({"data": {"id": 4, "label": "Orange"}}));
}

#[tokio::test]
async fn too_many_ids_is_rejected() {
    let app = app();
    let (status, body) = get(&app, "/api/colours?ids=1,2,3,4,5,6").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "You can request a maximum of 5 items per request"})
    );

    // duplicates do not count against the limit
    let (status, _) = get(&app, "/api/colours?ids=1,2,3,4,5,5,5").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn search_enforces_minimum_length() {
    let app = app();
    let (status, body) = get(&app, "/api/colours/search?keywords=re").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "Search term must be 3 characters or longer."})
    );

    let (status, body) = get(&app, "/api/colours/search?keywords=red").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels(&body), vec!["Red", "Dark Red"]);

    let (status, _) = get(&app, "/api/colours/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn base_filters_apply_to_every_read() {
    let app = app();
    let (_, body) = get(&app, "/api/warm-colours?per_page=3").await;
    assert_eq!(labels(&body), vec!["Red", "Orange", "Yellow"]);

    let (_, body) = get(&app, "/api/warm-colours?ids=1,2").await;
    assert_eq!(labels(&body), vec!["Red"]);

    let (_, body) = get(&app, "/api/warm-colours/search?keywords=e").await;
    assert!(labels(&body).iter().all(|l| *l != "Green" && *l != "Blue"));
}

#[tokio::test]
async fn create_returns_created_item() {
    let app = app();
    let (status, body) = post(&app, "/api/colours", r#"{"label": "Mint", "tone": "cool"}"#).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"data": {"id": 13, "label": "Mint"}}));

    let (_, body) = get(&app, "/api/colours?id=13").await;
    assert_eq!(body, json!({"data": {"id": 13, "label": "Mint"}}));
}

#[tokio::test]
async fn create_rejects_unknown_and_managed_keys() {
    let app = app();
    let (status, body) = post(
        &app,
        "/api/colours",
        r#"{"label": "Mint", "shade": 3, "created": "now"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "The following arguments are invalid: shade, created"})
    );
}

#[tokio::test]
async fn create_reports_model_validation() {
    let app = app();
    let (status, body) = post(&app, "/api/colours", r#"{"tone": "warm"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "Missing required fields: label"})
    );

    let (status, body) = post(&app, "/api/colours", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing required fields: label");
}

#[tokio::test]
async fn create_rejects_non_object_bodies() {
    let app = app();
    let (status, body) = post(&app, "/api/colours", r#"["Mint"]"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({"status": 400, "error": "Request body must be a JSON object"})
    );

    let (status, body) = post(&app, "/api/colours", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn model_failures_become_envelopes() {
    let app = app();

    let (status, body) = get(&app, "/api/broken").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": 500, "error": "internal error"}));

    let (status, body) = get(&app, "/api/broken?ids=1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body,
        json!({"status": 403, "error": "Not allowed to read these colours"})
    );

    let (status, body) = get(&app, "/api/broken/search?keywords=x").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "internal error");

    let (status, body) = post(&app, "/api/broken", r#"{"label": "x"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({"status": 409, "error": "Colour already exists"}));
}

#[test]
fn unresolvable_binding_fails_the_build() {
    let cfg = ResourceApiConfig {
        resources: vec![ResourceEntry::new("ghosts", "ghost", "demo")],
        ..Default::default()
    };
    let err = build_resource_router(&cfg, hub()).unwrap_err();
    assert!(matches!(err, MountError::Controller { ref name, .. } if name == "ghosts"));
}

#[test]
fn invalid_resource_lists_fail_the_build() {
    let dup = ResourceApiConfig {
        resources: vec![
            ResourceEntry::new("colours", "colour", "demo"),
            ResourceEntry::new("colours", "colour", "demo"),
        ],
        ..Default::default()
    };
    assert!(matches!(
        build_resource_router(&dup, hub()),
        Err(MountError::DuplicateName { .. })
    ));

    let missing_model = ResourceApiConfig {
        resources: vec![ResourceEntry::new("colours", "", "demo")],
        ..Default::default()
    };
    assert!(matches!(
        build_resource_router(&missing_model, hub()),
        Err(MountError::Controller { .. })
    ));
}

#[tokio::test]
async fn full_router_serves_health_and_request_ids() {
    let app = build_router(&api_config(), hub(), Duration::from_secs(5)).unwrap();

    let resp = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().get("x-request-id").is_some());

    let resp = app
        .oneshot(
            Request::get("/api/colours?id=1")
                .header("x-request-id", "abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("abc-123")
    );
}

#[test]
fn root_mounted_resource_cannot_shadow_health() {
    let cfg = ResourceApiConfig {
        base_path: "/".into(),
        resources: vec![ResourceEntry::new("health", "colour", "demo")],
        ..Default::default()
    };
    assert!(matches!(
        build_router(&cfg, hub(), Duration::from_secs(5)),
        Err(MountError::InvalidName { .. })
    ));
}
