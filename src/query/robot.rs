//! Robots table query.

use std::collections::BTreeMap;

use serde::Serialize;

use super::normalize::{self, operator_extras};
use super::translate::{sort_param, BackendQuery};
use super::{RawParams, RawValue, Resource, ResourceQuery, SortOrder};
use crate::models::{Connectivity, RobotStatus, RobotType};

/// Canonical robots query. Every present field satisfies its domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RobotQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RobotStatus>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub robot_type: Option<RobotType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connectivity: Option<Connectivity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    /// Not checked against `max_charge`; an inverted range reaches the backend as is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_charge: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_charge: Option<u8>,
    /// Bracket-operator keys passed through to the backend.
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

impl ResourceQuery for RobotQueryParams {
    const RESOURCE: Resource = Resource::Robots;

    fn normalize(raw: &RawParams) -> Self {
        let sorting = normalize::sorting(raw);

        Self {
            page: raw.get("page").and_then(normalize::page),
            current_page: raw.get("currentPage").and_then(normalize::page),
            limit: raw.get("limit").and_then(normalize::limit),
            sort: sorting.sort,
            sort_by: sorting.sort_by,
            sort_order: sorting.sort_order,
            search: raw.get("search").and_then(normalize::text),
            status: normalize::member(raw.get("status"), RobotStatus::from_str),
            robot_type: normalize::member(raw.get("type"), RobotType::from_str),
            connectivity: normalize::member(raw.get("connectivity"), Connectivity::from_str),
            location: raw.get("location").and_then(normalize::text),
            serial_number: raw.get("serialNumber").and_then(normalize::text),
            min_charge: raw.get("minCharge").and_then(normalize::charge),
            max_charge: raw.get("maxCharge").and_then(normalize::charge),
            extras: operator_extras(raw),
        }
    }

    fn fields(&self) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = [
            ("page", self.page.map(|v| v.to_string())),
            ("currentPage", self.current_page.map(|v| v.to_string())),
            ("limit", self.limit.map(|v| v.to_string())),
            ("sort", self.sort.clone()),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.map(|v| v.as_str().to_string())),
            ("search", self.search.clone()),
            ("status", self.status.map(|v| v.as_str().to_string())),
            ("type", self.robot_type.map(|v| v.as_str().to_string())),
            ("connectivity", self.connectivity.map(|v| v.as_str().to_string())),
            ("location", self.location.clone()),
            ("serialNumber", self.serial_number.clone()),
            ("minCharge", self.min_charge.map(|v| v.to_string())),
            ("maxCharge", self.max_charge.map(|v| v.to_string())),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();

        fields.extend(self.extras.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }

    fn to_backend_query(&self) -> BackendQuery {
        let mut query = BackendQuery::new();

        if let Some(page) = self.current_page {
            query.insert("currentPage".into(), page.to_string());
        } else if let Some(page) = self.page {
            query.insert("page".into(), page.to_string());
        }
        if let Some(limit) = self.limit {
            query.insert("limit".into(), limit.to_string());
        }

        if let Some(sort) = sort_param(
            self.sort_by.as_deref(),
            self.sort_order,
            self.sort.as_deref(),
        ) {
            query.insert("sort".into(), sort);
        }

        // No global full-text search on the backend; search matches serial numbers
        if let Some(search) = &self.search {
            query.insert("serialNumber[regex]".into(), search.clone());
        }

        if let Some(status) = self.status {
            query.insert("status".into(), status.as_str().into());
        }
        if let Some(robot_type) = self.robot_type {
            query.insert("type".into(), robot_type.as_str().into());
        }
        if let Some(connectivity) = self.connectivity {
            query.insert("connectivity".into(), connectivity.as_str().into());
        }
        if let Some(location) = &self.location {
            query.insert("location[regex]".into(), location.clone());
        }
        if let Some(serial) = &self.serial_number {
            query.insert("serialNumber[regex]".into(), serial.clone());
        }

        if let Some(min) = self.min_charge {
            query.insert("charge[gte]".into(), min.to_string());
        }
        if let Some(max) = self.max_charge {
            query.insert("charge[lte]".into(), max.to_string());
        }

        for (key, value) in &self.extras {
            query.insert(key.clone(), value.clone());
        }

        query
    }

    fn defaults() -> RawParams {
        RawParams::from([
            ("page".to_string(), RawValue::Number(1.0)),
            ("limit".to_string(), RawValue::Number(10.0)),
            ("sort".to_string(), RawValue::Text("-updatedAt".to_string())),
        ])
    }

    fn has_active_filters(&self) -> bool {
        self.search.is_some()
            || self.status.is_some()
            || self.robot_type.is_some()
            || self.connectivity.is_some()
            || self.location.is_some()
            || self.serial_number.is_some()
            || self.min_charge.is_some()
            || self.max_charge.is_some()
            || !self.extras.is_empty()
    }

    fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    fn sort_order(&self) -> Option<SortOrder> {
        self.sort_order
    }
}

impl RobotQueryParams {
    /// Charge range as `min..=max` text, for log lines.
    pub fn charge_range(&self) -> Option<String> {
        match (self.min_charge, self.max_charge) {
            (None, None) => None,
            (min, max) => Some(format!("{}..={}", min.unwrap_or(0), max.unwrap_or(100))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, RawValue)]) -> RawParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_normalize_clamps_pagination() {
        let p = RobotQueryParams::normalize(&raw(&[("limit", 500.0.into()), ("page", (-5.0).into())]));
        assert_eq!(p.limit, Some(100));
        assert_eq!(p.page, Some(1));

        let p = RobotQueryParams::normalize(&raw(&[("limit", 0.0.into())]));
        assert_eq!(p.limit, Some(1));
    }

    #[test]
    fn test_normalize_drops_invalid_values() {
        let p = RobotQueryParams::normalize(&raw(&[
            ("status", "BOGUS".into()),
            ("type", "active".into()),
            ("page", "two".into()),
            ("search", "   ".into()),
            ("minCharge", 150.0.into()),
            ("unknown", "ignored".into()),
        ]));
        assert_eq!(p, RobotQueryParams::default());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let input = raw(&[
            ("page", "2.7".into()),
            ("limit", 250.0.into()),
            ("status", "CHARGING".into()),
            ("search", "  AR1 ".into()),
            ("sortBy", "charge".into()),
            ("sortOrder", "weird".into()),
            ("sort", "-updatedAt".into()),
            ("maxCharge", "40".into()),
            ("charge[gt]", 5.0.into()),
        ]);

        let once = RobotQueryParams::normalize(&input);
        let twice = RobotQueryParams::normalize(&once.to_raw());
        assert_eq!(once, twice);
        assert_eq!(once.sort_order, Some(SortOrder::Asc));
        assert!(once.sort.is_none());
    }

    #[test]
    fn test_inverted_charge_range_passes_through() {
        let p = RobotQueryParams::normalize(&raw(&[("minCharge", 80.0.into()), ("maxCharge", 20.0.into())]));
        assert_eq!(p.min_charge, Some(80));
        assert_eq!(p.max_charge, Some(20));

        let q = p.to_backend_query();
        assert_eq!(q["charge[gte]"], "80");
        assert_eq!(q["charge[lte]"], "20");
    }

    #[test]
    fn test_translate_sort_desc() {
        let p = RobotQueryParams::normalize(&raw(&[("sortBy", "charge".into()), ("sortOrder", "desc".into())]));
        let q = p.to_backend_query();
        assert_eq!(q, BackendQuery::from([("sort".to_string(), "-charge".to_string())]));
    }

    #[test]
    fn test_translate_search_targets_serial_number() {
        let p = RobotQueryParams::normalize(&raw(&[("search", "AR1".into())]));
        assert_eq!(
            p.to_backend_query(),
            BackendQuery::from([("serialNumber[regex]".to_string(), "AR1".to_string())])
        );
    }

    #[test]
    fn test_translate_filters_and_ranges() {
        let p = RobotQueryParams::normalize(&raw(&[
            ("currentPage", 4.0.into()),
            ("page", 2.0.into()),
            ("type", "TUGGER".into()),
            ("connectivity", "DISCONNECTED".into()),
            ("location", "Bay".into()),
            ("minCharge", 10.0.into()),
            ("sort", "-updatedAt".into()),
        ]));
        let q = p.to_backend_query();

        assert_eq!(q["currentPage"], "4");
        assert!(!q.contains_key("page"));
        assert_eq!(q["type"], "TUGGER");
        assert_eq!(q["connectivity"], "DISCONNECTED");
        assert_eq!(q["location[regex]"], "Bay");
        assert_eq!(q["charge[gte]"], "10");
        assert_eq!(q["sort"], "-updatedAt");
    }

    #[test]
    fn test_operator_keys_applied_after_known_mappings() {
        let p = RobotQueryParams::normalize(&raw(&[
            ("search", "AR1".into()),
            ("serialNumber[regex]", "^AR9".into()),
            ("status[in]", "ACTIVE,CHARGING".into()),
        ]));
        let q = p.to_backend_query();

        assert_eq!(q["serialNumber[regex]"], "^AR9");
        assert_eq!(q["status[in]"], "ACTIVE,CHARGING");
    }

    #[test]
    fn test_defaults_lose_to_explicit_sort() {
        let p = RobotQueryParams::with_defaults(&raw(&[
            ("sortBy", "charge".into()),
            ("sortOrder", "asc".into()),
        ]));
        assert_eq!(p.page, Some(1));
        assert_eq!(p.limit, Some(10));
        assert!(p.sort.is_none());
        assert_eq!(p.to_backend_query()["sort"], "charge");

        let p = RobotQueryParams::with_defaults(&RawParams::new());
        assert_eq!(p.sort.as_deref(), Some("-updatedAt"));
    }

    #[test]
    fn test_active_filters() {
        let p = RobotQueryParams::normalize(&raw(&[("page", 3.0.into()), ("sortBy", "charge".into())]));
        assert!(!p.has_active_filters());

        let p = RobotQueryParams::normalize(&raw(&[("charge[lt]", 30.0.into())]));
        assert!(p.has_active_filters());
    }

    #[test]
    fn test_charge_range_label() {
        let p = RobotQueryParams::normalize(&raw(&[("minCharge", 25.0.into())]));
        assert_eq!(p.charge_range().as_deref(), Some("25..=100"));
        assert_eq!(RobotQueryParams::default().charge_range(), None);
    }
}
