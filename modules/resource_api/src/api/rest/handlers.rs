use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query},
    Extension,
};
use resource_kit::{params, Envelope, Fields};
use serde_json::Value;
use tracing::info;

use super::dto::ResourceQuery;
use super::error::map_model_error;
use super::response::EnvelopeResponse;
use super::routes::MountedResource;

/// Decoded query pairs, in order, so repeated keys can be resolved by position.
type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn read_query(raw: QueryPairs) -> Result<ResourceQuery, Envelope> {
    match raw {
        Ok(Query(pairs)) => Ok(ResourceQuery::from_pairs(pairs)),
        Err(rejection) => Err(Envelope::bad_request(rejection.body_text())),
    }
}

/// `GET /<resource>`: a page of items, or the items named by `id` / `ids`.
pub async fn get_index(
    Extension(res): Extension<Arc<MountedResource>>,
    raw: QueryPairs,
) -> EnvelopeResponse {
    let query = match read_query(raw) {
        Ok(query) => query,
        Err(envelope) => return EnvelopeResponse::ok(envelope),
    };
    let result = if query.wants_ids() {
        res.controller
            .fetch_by_id(query.id.as_deref(), query.ids.as_deref(), &res.filters)
            .await
    } else {
        let page = params::coerce_page(query.page.as_deref());
        let per_page = params::coerce_per_page(query.per_page.as_deref());
        res.controller.list(&res.filters, page, per_page).await
    };

    match result {
        Ok(envelope) => EnvelopeResponse::ok(envelope),
        Err(e) => map_model_error(&res.name, &e),
    }
}

/// `GET /<resource>/search?keywords=...`
pub async fn get_search(
    Extension(res): Extension<Arc<MountedResource>>,
    raw: QueryPairs,
) -> EnvelopeResponse {
    let query = match read_query(raw) {
        Ok(query) => query,
        Err(envelope) => return EnvelopeResponse::ok(envelope),
    };
    let keywords = query.keywords.unwrap_or_default();
    match res.controller.search(&keywords, &res.filters).await {
        Ok(envelope) => EnvelopeResponse::ok(envelope),
        Err(e) => map_model_error(&res.name, &e),
    }
}

/// `POST /<resource>`: create an item from a JSON object body.
pub async fn post_index(
    Extension(res): Extension<Arc<MountedResource>>,
    body: Bytes,
) -> EnvelopeResponse {
    let fields = match parse_body(&body) {
        Ok(fields) => fields,
        Err(envelope) => return EnvelopeResponse::ok(envelope),
    };

    info!(resource = %res.name, keys = fields.len(), "creating item");
    EnvelopeResponse::created(res.controller.create(&fields).await)
}

/// An empty body is an empty object; anything else must be a JSON object.
fn parse_body(body: &[u8]) -> Result<Fields, Envelope> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Fields::new());
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Envelope::bad_request("Request body must be a JSON object")),
        Err(e) => Err(Envelope::bad_request(format!("Malformed JSON body: {e}"))),
    }
}
