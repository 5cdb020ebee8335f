use serde_json::{json, Value};

use crate::model::{Item, ItemId};

/// Projects a model item into its outward representation.
///
/// This is the override seam for resources that want to expose more than the
/// contractual fields. Implementations must be pure.
pub trait ItemFormatter: Send + Sync {
    fn format(&self, item: &Item) -> Value;
}

/// Default projection: exactly `{"id", "label"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdLabel;

impl ItemFormatter for IdLabel {
    fn format(&self, item: &Item) -> Value {
        id_label(item)
    }
}

impl<F> ItemFormatter for F
where
    F: Fn(&Item) -> Value + Send + Sync,
{
    fn format(&self, item: &Item) -> Value {
        self(item)
    }
}

/// The default two-field projection, usable as a fallback from custom formatters.
pub fn id_label(item: &Item) -> Value {
    let id = match &item.id {
        ItemId::Int(i) => json!(i),
        ItemId::Str(s) => json!(s),
    };
    json!({ "id": id, "label": item.label })
}
