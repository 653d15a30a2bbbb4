//! URL state synchronization.
//!
//! The location query string is the committed parameter state of a table.
//! Parameter changes flow one way: a [`ParamsChange`] is merged onto the
//! current location, the page-reset policy is applied, and the result is
//! written back through a [`Navigator`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::errors::AppError;
use crate::query::{RawParams, RawValue, Resource, ResourceQuery, VIEW_FIELDS};

/// Decoded location query parameters. Never holds empty values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationState(BTreeMap<String, String>);

impl LocationState {
    /// Decode a raw query string; for repeated keys the last one wins.
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).into_owned())
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = Self::default();
        for (key, value) in pairs {
            state.insert(key.into(), value.into());
        }
        state
    }

    /// Set a key; an empty value removes it instead.
    fn insert(&mut self, key: String, value: String) {
        if value.trim().is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// `route` with this state as its query string.
    pub fn href(&self, route: &str) -> String {
        if self.0.is_empty() {
            route.to_string()
        } else {
            format!("{}?{}", route, self.to_query_string())
        }
    }

    pub fn to_raw(&self) -> RawParams {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), RawValue::Text(v.clone())))
            .collect()
    }

    /// Canonical parameters for this location, resource defaults underneath.
    pub fn read_params<Q: ResourceQuery>(&self) -> Q {
        let params = Q::with_defaults(&self.to_raw());

        let kept: Vec<String> = params.fields().into_iter().map(|(name, _)| name).collect();
        let dropped: Vec<&str> = self
            .keys()
            .filter(|key| !kept.iter().any(|name| name == key))
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(
                resource = Q::RESOURCE.as_str(),
                ?dropped,
                "Ignoring location parameters"
            );
        }

        params
    }
}

/// A partial parameter update. `None` clears the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamsChange(BTreeMap<String, Option<RawValue>>);

impl ParamsChange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.0.insert(key.to_string(), Some(value.into()));
        self
    }

    pub fn clear(mut self, key: &str) -> Self {
        self.0.insert(key.to_string(), None);
        self
    }

    /// Whether the change sets or clears `key`.
    pub fn touches(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Non-empty value requested for `key`.
    pub fn requested(&self, key: &str) -> Option<String> {
        match self.0.get(key) {
            Some(Some(value)) => {
                let text = value.as_text();
                (!text.trim().is_empty()).then_some(text)
            }
            _ => None,
        }
    }

    /// Change that clears every filter in `current`, keeping paging and sorting.
    pub fn clear_filters(current: &LocationState) -> Self {
        current
            .keys()
            .filter(|k| !VIEW_FIELDS.contains(k))
            .fold(Self::new(), |change, key| change.clear(key))
    }
}

/// Shallow-merge `change` onto `current`, then apply the page-reset policy.
///
/// A requested page is honored exactly. Clearing the page, or touching any
/// of the resource's reset fields, returns to page 1. Anything else keeps
/// the current page.
pub fn next_location(resource: Resource, current: &LocationState, change: &ParamsChange) -> LocationState {
    let mut next = current.clone();
    for (key, value) in &change.0 {
        match value {
            Some(value) => next.insert(key.clone(), value.as_text()),
            None => {
                next.0.remove(key);
            }
        }
    }

    let page = match change.requested("page") {
        Some(page) => page,
        None if change.touches("page")
            || resource
                .page_reset_fields()
                .iter()
                .any(|field| change.touches(field)) =>
        {
            "1".to_string()
        }
        None => current.get("page").unwrap_or("1").to_string(),
    };
    next.insert("page".to_string(), page);

    next
}

/// Writes a location. Failing is allowed; the synchronizer recovers.
pub trait Navigator: Send + Sync {
    fn navigate(&self, href: &str) -> Result<(), AppError>;
}

/// Navigator for redirect responses: accepts any href a browser will follow.
#[derive(Debug, Clone)]
pub struct RedirectNavigator {
    max_url_len: usize,
}

impl RedirectNavigator {
    pub fn new(max_url_len: usize) -> Self {
        Self { max_url_len }
    }
}

impl Navigator for RedirectNavigator {
    fn navigate(&self, href: &str) -> Result<(), AppError> {
        if !href.starts_with('/') {
            return Err(AppError::Navigation(format!("Not a local route: {}", href)));
        }
        if href.len() > self.max_url_len {
            return Err(AppError::Navigation(format!(
                "Location is {} bytes, limit is {}",
                href.len(),
                self.max_url_len
            )));
        }
        Ok(())
    }
}

/// Result of committing a parameter change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Location in effect afterwards; the previous one if navigation failed.
    pub location: LocationState,
    pub href: String,
    pub navigated: bool,
}

/// Sole writer of committed table parameters for one resource.
pub struct UrlStateSync<'a> {
    resource: Resource,
    navigator: &'a dyn Navigator,
}

impl<'a> UrlStateSync<'a> {
    pub fn new(resource: Resource, navigator: &'a dyn Navigator) -> Self {
        Self {
            resource,
            navigator,
        }
    }

    /// Compute the next location, navigate to it, then run `on_params_change`.
    ///
    /// The callback sees the merged location even when navigation failed.
    pub fn commit<F>(&self, current: &LocationState, change: &ParamsChange, on_params_change: F) -> Commit
    where
        F: FnOnce(&LocationState),
    {
        let route = self.resource.route();
        let next = next_location(self.resource, current, change);
        let href = next.href(route);

        tracing::debug!(
            resource = self.resource.as_str(),
            from = %current.href(route),
            to = %href,
            "Committing parameter change"
        );

        let navigated = match self.navigator.navigate(&href) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    resource = self.resource.as_str(),
                    "Navigation failed, keeping current location: {}",
                    e
                );
                false
            }
        };

        on_params_change(&next);

        if navigated {
            Commit {
                location: next,
                href,
                navigated,
            }
        } else {
            Commit {
                href: current.href(route),
                location: current.clone(),
                navigated,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{BackendQuery, RobotQueryParams};
    use std::cell::RefCell;

    struct FailingNavigator;

    impl Navigator for FailingNavigator {
        fn navigate(&self, _href: &str) -> Result<(), AppError> {
            Err(AppError::Navigation("router unavailable".to_string()))
        }
    }

    fn loc(query: &str) -> LocationState {
        LocationState::parse(query)
    }

    #[test]
    fn test_parse_drops_empty_values() {
        let state = loc("status=ACTIVE&search=&location=%20&charge%5Bgte%5D=20");
        assert_eq!(state.get("status"), Some("ACTIVE"));
        assert_eq!(state.get("search"), None);
        assert_eq!(state.get("location"), None);
        assert_eq!(state.get("charge[gte]"), Some("20"));
    }

    #[test]
    fn test_filter_change_resets_page() {
        let next = next_location(
            Resource::Robots,
            &loc("page=3&limit=10"),
            &ParamsChange::new().set("status", "ACTIVE"),
        );
        assert_eq!(next, loc("page=1&limit=10&status=ACTIVE"));
    }

    #[test]
    fn test_page_change_is_honored() {
        let next = next_location(
            Resource::Robots,
            &loc("page=3&limit=10"),
            &ParamsChange::new().set("page", 5u32),
        );
        assert_eq!(next.get("page"), Some("5"));
        assert_eq!(next.get("limit"), Some("10"));
    }

    #[test]
    fn test_cleared_page_returns_to_first() {
        let next = next_location(
            Resource::Robots,
            &loc("page=3&status=ACTIVE"),
            &ParamsChange::new().clear("page"),
        );
        assert_eq!(next, loc("page=1&status=ACTIVE"));

        let next = next_location(
            Resource::Users,
            &loc("page=3"),
            &ParamsChange::new().set("page", ""),
        );
        assert_eq!(next.get("page"), Some("1"));
    }

    #[test]
    fn test_page_size_change_resets_page() {
        let next = next_location(
            Resource::Users,
            &loc("page=4&limit=10"),
            &ParamsChange::new().set("limit", 25u32),
        );
        assert_eq!(next, loc("page=1&limit=25"));
    }

    #[test]
    fn test_unrelated_change_keeps_page() {
        let next = next_location(
            Resource::Robots,
            &loc("page=3"),
            &ParamsChange::new().set("sortOrder", "desc"),
        );
        assert_eq!(next.get("page"), Some("3"));

        let next = next_location(Resource::Robots, &loc(""), &ParamsChange::new());
        assert_eq!(next.get("page"), Some("1"));
    }

    #[test]
    fn test_cleared_sort_resets_page_and_removes_keys() {
        let next = next_location(
            Resource::Robots,
            &loc("page=2&sortBy=charge&sortOrder=asc"),
            &ParamsChange::new().clear("sortBy").clear("sortOrder"),
        );
        assert_eq!(next, loc("page=1"));
        assert!(!next.to_query_string().contains("sort"));
    }

    #[test]
    fn test_empty_values_never_reach_location() {
        let next = next_location(
            Resource::Users,
            &loc("search=ada"),
            &ParamsChange::new().set("search", "  "),
        );
        assert_eq!(next.get("search"), None);
        assert_eq!(next.get("page"), Some("1"));
    }

    #[test]
    fn test_user_resource_ignores_robot_filters() {
        let next = next_location(
            Resource::Users,
            &loc("page=3"),
            &ParamsChange::new().set("status", "ACTIVE"),
        );
        assert_eq!(next.get("page"), Some("3"));
    }

    #[test]
    fn test_clear_filters_keeps_view_fields() {
        let current = loc("page=3&limit=25&sortBy=charge&sortOrder=desc&status=ACTIVE&charge%5Bgt%5D=5");
        let change = ParamsChange::clear_filters(&current);
        let next = next_location(Resource::Robots, &current, &change);
        assert_eq!(next, loc("page=1&limit=25&sortBy=charge&sortOrder=desc"));
    }

    #[test]
    fn test_commit_navigates() {
        let navigator = RedirectNavigator::new(8192);
        let sync = UrlStateSync::new(Resource::Robots, &navigator);
        let seen = RefCell::new(None);

        let commit = sync.commit(
            &loc("page=2"),
            &ParamsChange::new().set("search", "AR1"),
            |next| *seen.borrow_mut() = Some(next.clone()),
        );

        assert!(commit.navigated);
        assert_eq!(commit.href, "/configure?page=1&search=AR1");
        assert_eq!(seen.into_inner(), Some(commit.location));
    }

    #[test]
    fn test_failed_navigation_keeps_state_and_still_notifies() {
        let sync = UrlStateSync::new(Resource::Robots, &FailingNavigator);
        let current = loc("page=2&status=CHARGING");
        let seen = RefCell::new(None);

        let commit = sync.commit(&current, &ParamsChange::new().set("page", 3u32), |next| {
            *seen.borrow_mut() = Some(next.clone())
        });

        assert!(!commit.navigated);
        assert_eq!(commit.location, current);
        assert_eq!(commit.href, "/configure?page=2&status=CHARGING");
        assert_eq!(seen.into_inner().unwrap().get("page"), Some("3"));
    }

    #[test]
    fn test_redirect_navigator_limits() {
        let navigator = RedirectNavigator::new(32);
        assert!(navigator.navigate("/configure?page=1").is_ok());
        assert!(navigator.navigate("https://elsewhere.test/").is_err());

        let long = format!("/configure?search={}", "x".repeat(64));
        let err = navigator.navigate(&long).unwrap_err();
        assert_eq!(err.error_code(), "NAVIGATION_FAILED");
    }

    #[test]
    fn test_end_to_end_location_to_backend_query() {
        let state = loc("status=ACTIVE&sortBy=charge&sortOrder=asc&page=2&limit=10");
        let params: RobotQueryParams = state.read_params();

        assert_eq!(
            serde_json::to_value(&params).unwrap(),
            serde_json::json!({
                "status": "ACTIVE",
                "sortBy": "charge",
                "sortOrder": "asc",
                "page": 2,
                "limit": 10
            })
        );

        let query = params.to_backend_query();
        assert_eq!(
            query,
            [
                ("status", "ACTIVE"),
                ("sort", "charge"),
                ("page", "2"),
                ("limit", "10")
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<BackendQuery>()
        );
    }
}
