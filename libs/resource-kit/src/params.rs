//! Request parameter coercion shared by the controller and transport bindings.

use std::collections::HashSet;

use crate::model::{FieldDescriptor, Fields};

/// Fields a client may never set on create; the model manages them.
pub const IGNORED_FIELDS: [&str; 7] = [
    "id",
    "slug",
    "created",
    "is_deleted",
    "created_by",
    "modified",
    "modified_by",
];

/// Parse a raw `page` query value. Absent, zero, negative or non-numeric input
/// yields `None`, which the controller treats as page 1.
pub fn coerce_page(raw: Option<&str>) -> Option<u32> {
    positive_u32(raw)
}

/// Parse a raw `per_page` override. Anything but a positive integer is ignored.
pub fn coerce_per_page(raw: Option<&str>) -> Option<u32> {
    positive_u32(raw)
}

fn positive_u32(raw: Option<&str>) -> Option<u32> {
    let n = raw?.trim().parse::<i64>().ok()?;
    if n < 1 {
        return None;
    }
    Some(u32::try_from(n).unwrap_or(u32::MAX))
}

/// Choose the id string to use: `ids` wins when non-empty, then `id`.
pub fn pick_ids<'a>(id: Option<&'a str>, ids: Option<&'a str>) -> &'a str {
    match (non_empty(ids), non_empty(id)) {
        (Some(ids), _) => ids,
        (None, Some(id)) => id,
        (None, None) => "",
    }
}

/// True when the singular `id` parameter was supplied with a value. Only the
/// empty string counts as absent, so `id=0` is a single-item fetch.
pub fn is_singular(id: Option<&str>) -> bool {
    non_empty(id).is_some()
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.filter(|s| !s.is_empty())
}

/// Split a comma-separated id list, drop empty segments and duplicates.
/// First-occurrence order is kept. `"0"` is kept as an id; only empty segments are dropped.
pub fn distinct_ids(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Schema keys a client may set: every field except [`IGNORED_FIELDS`].
pub fn allowed_fields(fields: &[FieldDescriptor]) -> Vec<&str> {
    fields
        .iter()
        .map(|f| f.key.as_str())
        .filter(|k| !IGNORED_FIELDS.contains(k))
        .collect()
}

/// Submitted keys outside the allow-list, in submission order.
pub fn invalid_keys<'a>(body: &'a Fields, allowed: &[&str]) -> Vec<&'a str> {
    body.keys()
        .map(String::as_str)
        .filter(|k| !allowed.contains(k))
        .collect()
}
