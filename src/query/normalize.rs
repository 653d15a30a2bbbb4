//! Field coercions used by the per-resource normalizers.
//!
//! Every helper returns `None` for input it cannot accept; an invalid filter
//! is no filter.

use std::collections::BTreeMap;

use super::{RawParams, RawValue, SortOrder};

pub const MAX_LIMIT: u32 = 100;

/// Floor and clamp into `[min, max]`; non-numeric input is dropped.
fn clamped(value: &RawValue, min: u32, max: u32) -> Option<u32> {
    let n = value.as_number()?.floor();
    Some(n.clamp(f64::from(min), f64::from(max)) as u32)
}

/// Page numbers start at 1.
pub fn page(value: &RawValue) -> Option<u32> {
    clamped(value, 1, u32::MAX)
}

/// Page size in `[1, 100]`.
pub fn limit(value: &RawValue) -> Option<u32> {
    clamped(value, 1, MAX_LIMIT)
}

/// Charge bound in percent; out-of-range values are rejected, not clamped.
pub fn charge(value: &RawValue) -> Option<u8> {
    let n = value.as_number()?;
    (0.0..=100.0).contains(&n).then(|| n.floor() as u8)
}

/// Trimmed free text; blank is absent.
pub fn text(value: &RawValue) -> Option<String> {
    let s = value.as_text();
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Member of a fixed enumeration, matched exactly.
pub fn member<T>(value: Option<&RawValue>, parse: fn(&str) -> Option<T>) -> Option<T> {
    match value? {
        RawValue::Text(s) => parse(s),
        _ => None,
    }
}

/// Boolean flag; accepts a JSON boolean or the strings `true`/`false`.
pub fn flag(value: &RawValue) -> Option<bool> {
    match value {
        RawValue::Bool(b) => Some(*b),
        RawValue::Text(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        RawValue::Number(_) => None,
    }
}

/// Canonical sort fields.
#[derive(Debug, Default)]
pub struct Sorting {
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub sort: Option<String>,
}

/// `sortBy` + `sortOrder` win over legacy `sort`; a lone `sortBy` is dropped.
pub fn sorting(raw: &RawParams) -> Sorting {
    let sort_by = raw.get("sortBy").and_then(text);
    let sort_order = raw.get("sortOrder").and_then(text);

    match (sort_by, sort_order) {
        (Some(sort_by), Some(order)) => Sorting {
            sort_by: Some(sort_by),
            sort_order: Some(SortOrder::coerce(&order)),
            sort: None,
        },
        _ => Sorting {
            sort: raw.get("sort").and_then(text),
            ..Sorting::default()
        },
    }
}

/// Whether a key is in bracket-operator form, e.g. `charge[gte]`.
pub fn is_operator_key(key: &str) -> bool {
    key.contains('[') && key.contains(']')
}

/// Bracket-operator keys with non-empty values, kept verbatim.
pub fn operator_extras(raw: &RawParams) -> BTreeMap<String, String> {
    raw.iter()
        .filter(|(k, _)| is_operator_key(k))
        .filter_map(|(k, v)| {
            let value = v.as_text();
            (!value.is_empty()).then(|| (k.clone(), value))
        })
        .collect()
}
