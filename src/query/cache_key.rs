//! Deterministic response cache keys.

use serde::Serialize;

use super::ResourceQuery;

/// `[resource, "field:value", ...]` with fields in ascending name order.
///
/// Field names have `%` and `:` percent-escaped, so the first unescaped `:`
/// of a token always ends the name and no two field/value pairs share a token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CacheKey(Vec<String>);

impl CacheKey {
    /// Key for a query, built from its re-normalized fields.
    pub fn for_params<Q: ResourceQuery>(params: &Q) -> Self {
        let normalized = Q::normalize(&params.to_raw());

        let mut fields = normalized.fields();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let mut tokens = Vec::with_capacity(fields.len() + 1);
        tokens.push(Q::RESOURCE.as_str().to_string());
        tokens.extend(
            fields
                .into_iter()
                .map(|(field, value)| format!("{}:{}", escape_field(&field), value)),
        );

        Self(tokens)
    }

    /// Leading resource-name tag.
    pub fn resource(&self) -> &str {
        &self.0[0]
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }
}

fn escape_field(field: &str) -> String {
    field.replace('%', "%25").replace(':', "%3A")
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{RawParams, RawValue, RobotQueryParams, UserQueryParams};

    #[test]
    fn test_key_sorted_by_field() {
        let raw = RawParams::from([
            ("status".to_string(), RawValue::from("ACTIVE")),
            ("limit".to_string(), RawValue::from(10.0)),
            ("page".to_string(), RawValue::from(2.0)),
        ]);
        let key = CacheKey::for_params(&RobotQueryParams::normalize(&raw));

        assert_eq!(
            key.tokens(),
            &["robots", "limit:10", "page:2", "status:ACTIVE"]
        );
        assert_eq!(key.resource(), "robots");
    }

    #[test]
    fn test_string_and_number_inputs_share_a_key() {
        let a = RawParams::from([
            ("page".to_string(), RawValue::from("5")),
            ("minCharge".to_string(), RawValue::from("20.4")),
        ]);
        let b = RawParams::from([
            ("minCharge".to_string(), RawValue::from(20.0)),
            ("page".to_string(), RawValue::from(5.0)),
        ]);

        assert_eq!(
            CacheKey::for_params(&RobotQueryParams::normalize(&a)),
            CacheKey::for_params(&RobotQueryParams::normalize(&b))
        );
    }

    #[test]
    fn test_key_renormalizes_hand_built_params() {
        let hand_built = UserQueryParams {
            limit: Some(500),
            search: Some("  ada ".to_string()),
            ..UserQueryParams::default()
        };
        let key = CacheKey::for_params(&hand_built);
        assert_eq!(key.tokens(), &["users", "limit:100", "search:ada"]);
    }

    #[test]
    fn test_colon_in_operator_key_cannot_collide() {
        let a = RobotQueryParams {
            extras: [("x[y]:z".to_string(), "w".to_string())].into(),
            ..RobotQueryParams::default()
        };
        let b = RobotQueryParams {
            extras: [("x[y]".to_string(), "z:w".to_string())].into(),
            ..RobotQueryParams::default()
        };

        let key_a = CacheKey::for_params(&a);
        let key_b = CacheKey::for_params(&b);
        assert_ne!(key_a, key_b);
        assert_eq!(key_a.tokens()[1], "x[y]%3Az:w");
        assert_eq!(key_b.tokens()[1], "x[y]:z:w");
    }

    #[test]
    fn test_resources_never_share_keys() {
        let robots = CacheKey::for_params(&RobotQueryParams::default());
        let users = CacheKey::for_params(&UserQueryParams::default());
        assert_ne!(robots, users);
        assert_eq!(robots.to_string(), "[robots]");
    }
}
