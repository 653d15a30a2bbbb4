//! Query parameter pipeline shared by the robots and users tables.
//!
//! Raw location parameters are normalized into a typed, per-resource record
//! ([`RobotQueryParams`], [`UserQueryParams`]). From the normalized record the
//! pipeline derives the backend query string and the response cache key.

mod cache_key;
mod normalize;
mod robot;
mod translate;
mod user;

pub use cache_key::*;
pub use robot::*;
pub use translate::*;
pub use user::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A resource the dashboard lists in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Robots,
    Users,
}

impl Resource {
    /// Fixed resource-name tag leading every cache key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Robots => "robots",
            Resource::Users => "users",
        }
    }

    /// Backend list endpoint.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Resource::Robots => "/robots",
            Resource::Users => "/users",
        }
    }

    /// Dashboard route whose location holds this table's parameters.
    pub fn route(&self) -> &'static str {
        match self {
            Resource::Robots => "/configure",
            Resource::Users => "/configure/user",
        }
    }

    /// Location keys whose change sends the table back to page 1.
    pub fn page_reset_fields(&self) -> &'static [&'static str] {
        match self {
            Resource::Robots => &[
                "status",
                "type",
                "connectivity",
                "search",
                "location",
                "serialNumber",
                "minCharge",
                "maxCharge",
                "sortBy",
                "limit",
            ],
            Resource::Users => &["role", "isActive", "search", "sortBy", "limit"],
        }
    }
}

/// Location keys that survive "clear filters".
pub const VIEW_FIELDS: [&str; 5] = ["page", "limit", "sort", "sortBy", "sortOrder"];

/// A raw parameter value as decoded from a URL or a JSON change request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric reading of the value; numeric strings parse, anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Text reading of the value, as it would appear in a query string.
    pub fn as_text(&self) -> String {
        match self {
            RawValue::Text(s) => s.clone(),
            RawValue::Number(n) => format_number(*n),
            RawValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl From<u32> for RawValue {
    fn from(n: u32) -> Self {
        RawValue::Number(f64::from(n))
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        RawValue::Bool(b)
    }
}

/// Untyped parameters keyed by their location name.
pub type RawParams = BTreeMap<String, RawValue>;

/// Integral numbers print without a fraction so `5.0` and `"5"` read the same.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Anything other than `desc` sorts ascending.
    pub fn coerce(s: &str) -> Self {
        if s == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }
}

/// A normalized, per-resource table query.
pub trait ResourceQuery: Sized + Clone + PartialEq + Default + Serialize {
    const RESOURCE: Resource;

    /// Coerce raw parameters into the canonical record, dropping anything invalid.
    fn normalize(raw: &RawParams) -> Self;

    /// Present fields as `(location name, canonical value)` pairs.
    fn fields(&self) -> Vec<(String, String)>;

    /// Translate into the backend's query dialect.
    fn to_backend_query(&self) -> BackendQuery;

    /// Parameters applied underneath whatever the location carries.
    fn defaults() -> RawParams;

    /// Whether any filter, as opposed to paging or sorting, is set.
    fn has_active_filters(&self) -> bool;

    fn sort_by(&self) -> Option<&str>;

    fn sort_order(&self) -> Option<SortOrder>;

    /// The canonical fields as raw text parameters.
    fn to_raw(&self) -> RawParams {
        self.fields()
            .into_iter()
            .map(|(k, v)| (k, RawValue::Text(v)))
            .collect()
    }

    /// Normalize with the resource defaults underneath `raw`.
    ///
    /// A value that normalizes away falls back to its default.
    fn with_defaults(raw: &RawParams) -> Self {
        let mut merged = Self::defaults();
        merged.extend(Self::normalize(raw).to_raw());
        Self::normalize(&merged)
    }
}
