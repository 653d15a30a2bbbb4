//! Backend query dialect.
//!
//! The backend reads MongoDB-style operator keys (`charge[gte]`,
//! `serialNumber[regex]`) and a single `sort` key where a leading `-` means
//! descending.

use std::collections::BTreeMap;

use url::form_urlencoded;

use super::SortOrder;

/// Flat mapping of backend wire keys to values, ready for URL encoding.
pub type BackendQuery = BTreeMap<String, String>;

/// Wire value for `sort`. Explicit `sortBy`/`sortOrder` win over legacy `sort`.
pub fn sort_param(
    sort_by: Option<&str>,
    sort_order: Option<SortOrder>,
    legacy: Option<&str>,
) -> Option<String> {
    match (sort_by, sort_order) {
        (Some(field), Some(SortOrder::Desc)) => Some(format!("-{}", field)),
        (Some(field), Some(SortOrder::Asc)) => Some(field.to_string()),
        _ => legacy.map(str::to_string),
    }
}

/// Encode a backend query as `application/x-www-form-urlencoded`, skipping empty values.
pub fn build_query_string(query: &BackendQuery) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in query {
        if !value.is_empty() {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}
