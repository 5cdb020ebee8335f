/// Query string of the resource endpoints. Values stay raw strings: coercion
/// (page numbers, id lists) belongs to the controller's parameter helpers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub id: Option<String>,
    pub ids: Option<String>,
    pub keywords: Option<String>,
}

impl ResourceQuery {
    /// Build from decoded query pairs. A repeated key keeps its last value;
    /// unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "page" => &mut query.page,
                "per_page" => &mut query.per_page,
                "id" => &mut query.id,
                "ids" => &mut query.ids,
                "keywords" => &mut query.keywords,
                _ => continue,
            };
            *slot = Some(value);
        }
        query
    }

    /// `id` or `ids` carries a value, so the request is a fetch rather than a listing.
    pub fn wants_ids(&self) -> bool {
        [&self.id, &self.ids]
            .into_iter()
            .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }
}
