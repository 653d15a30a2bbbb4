//! Users table query.

use std::collections::BTreeMap;

use serde::Serialize;

use super::normalize::{self, operator_extras};
use super::translate::{sort_param, BackendQuery};
use super::{RawParams, RawValue, Resource, ResourceQuery, SortOrder};
use crate::models::UserRole;

/// Canonical users query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
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
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, String>,
}

impl ResourceQuery for UserQueryParams {
    const RESOURCE: Resource = Resource::Users;

    fn normalize(raw: &RawParams) -> Self {
        let sorting = normalize::sorting(raw);

        Self {
            page: raw.get("page").and_then(normalize::page),
            limit: raw.get("limit").and_then(normalize::limit),
            sort: sorting.sort,
            sort_by: sorting.sort_by,
            sort_order: sorting.sort_order,
            search: raw.get("search").and_then(normalize::text),
            role: normalize::member(raw.get("role"), UserRole::from_str),
            is_active: raw.get("isActive").and_then(normalize::flag),
            extras: operator_extras(raw),
        }
    }

    fn fields(&self) -> Vec<(String, String)> {
        let mut fields: Vec<(String, String)> = [
            ("page", self.page.map(|v| v.to_string())),
            ("limit", self.limit.map(|v| v.to_string())),
            ("sort", self.sort.clone()),
            ("sortBy", self.sort_by.clone()),
            ("sortOrder", self.sort_order.map(|v| v.as_str().to_string())),
            ("search", self.search.clone()),
            ("role", self.role.map(|v| v.as_str().to_string())),
            ("isActive", self.is_active.map(|v| v.to_string())),
        ]
        .into_iter()
        .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
        .collect();

        fields.extend(self.extras.iter().map(|(k, v)| (k.clone(), v.clone())));
        fields
    }

    fn to_backend_query(&self) -> BackendQuery {
        let mut query = BackendQuery::new();

        if let Some(page) = self.page {
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
        // The users endpoint filters by name instead of a free-text search
        if let Some(search) = &self.search {
            query.insert("name".into(), search.clone());
        }
        if let Some(role) = self.role {
            query.insert("role".into(), role.as_str().into());
        }
        if let Some(is_active) = self.is_active {
            query.insert("isActive".into(), is_active.to_string());
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
        ])
    }

    fn has_active_filters(&self) -> bool {
        self.search.is_some() || self.role.is_some() || self.is_active.is_some() || !self.extras.is_empty()
    }

    fn sort_by(&self) -> Option<&str> {
        self.sort_by.as_deref()
    }

    fn sort_order(&self) -> Option<SortOrder> {
        self.sort_order
    }
}
