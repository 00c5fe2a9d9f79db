//! Resolvers backed by the content host.
//!
//! - `connection`: paginated lists (`posts`, `Post.categories`, ...)
//! - `read`: single nodes (`contentNode`, `termNode`)
//! - `mutation`: create / update / delete payloads
//! - `settings`: setting groups
//! - `pagination`: Relay cursor pagination shared by connections

mod connection;
pub mod pagination;
mod read;
mod mutation;
mod settings;

pub use connection::ConnectionResolver;
pub use mutation::MutationResolver;
pub use read::NodeResolver;
pub use settings::SettingsResolver;
pub(crate) use settings::{camel_case, group_field_name, setting_input_name};

use async_graphql::{ErrorExtensions, Name, Value};
use indexmap::IndexMap;
use wpgraphql_content::{ContentError, ErrorCategory};

use crate::registry::Arguments;

/// Convert a serde_json::Value to async_graphql::Value.
pub(crate) fn json_to_graphql_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Boolean(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                n.as_f64()
                    .and_then(async_graphql::Number::from_f64)
                    .map_or(Value::Null, Value::Number)
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(json_to_graphql_value).collect()),
        serde_json::Value::Object(obj) => Value::Object(
            obj.into_iter()
                .map(|(k, v)| (Name::new(k), json_to_graphql_value(v)))
                .collect(),
        ),
    }
}

/// Convert an async_graphql::Value to serde_json::Value.
///
/// Enum names become strings; binary values are dropped to `null`.
pub(crate) fn graphql_value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null | Value::Binary(_) => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(serde_json::Value::from)
            .or_else(|| n.as_u64().map(serde_json::Value::from))
            .or_else(|| n.as_f64().map(serde_json::Value::from))
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Enum(e) => serde_json::Value::String(e.to_string()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(graphql_value_to_json).collect()),
        Value::Object(obj) => serde_json::Value::Object(
            obj.iter()
                .map(|(k, v)| (k.to_string(), graphql_value_to_json(v)))
                .collect(),
        ),
    }
}

/// Converts resolver arguments (or an input object) into host fields,
/// skipping `null`s and the listed keys.
pub(crate) fn arguments_to_fields(args: &Arguments, skip: &[&str]) -> serde_json::Map<String, serde_json::Value> {
    args.iter()
        .filter(|(key, value)| !skip.contains(&key.as_str()) && !matches!(value, Value::Null))
        .map(|(key, value)| (key.to_string(), graphql_value_to_json(value)))
        .collect()
}

/// Reads a string or numeric argument as a string.
pub(crate) fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds an object value from key/value pairs.
pub(crate) fn object(entries: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (Name::new(k), v))
            .collect::<IndexMap<Name, Value>>(),
    )
}

/// Convert a ContentError to an async_graphql::Error with extensions.
pub(crate) fn content_error_to_graphql(error: ContentError) -> async_graphql::Error {
    let code = match error.category() {
        ErrorCategory::NotFound => "NOT_FOUND",
        ErrorCategory::Validation => "BAD_USER_INPUT",
        ErrorCategory::Internal => "INTERNAL_SERVER_ERROR",
    };
    let category = error.category().to_string();

    async_graphql::Error::new(error.to_string()).extend_with(|_, e| {
        e.set("code", code);
        e.set("category", category);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_round_trip_preserves_shape() {
        let json = json!({"id": "1", "count": 3, "ratio": 0.5, "tags": ["a"], "draft": false, "parent": null});
        let value = json_to_graphql_value(json.clone());
        assert_eq!(graphql_value_to_json(&value), json);
    }

    #[test]
    fn test_enum_becomes_string() {
        let value = Value::Enum(Name::new("PUBLISH"));
        assert_eq!(graphql_value_to_json(&value), json!("PUBLISH"));
    }

    #[test]
    fn test_arguments_to_fields_skips() {
        let mut args = Arguments::new();
        args.insert(Name::new("id"), Value::String("4".into()));
        args.insert(Name::new("title"), Value::String("Hello".into()));
        args.insert(Name::new("content"), Value::Null);
        args.insert(Name::new("clientMutationId"), Value::String("abc".into()));

        let fields = arguments_to_fields(&args, &["id", "clientMutationId"]);
        assert_eq!(serde_json::Value::Object(fields), json!({"title": "Hello"}));
    }

    #[test]
    fn test_content_error_extensions() {
        let err = content_error_to_graphql(ContentError::not_found("post:post", "9"));
        assert_eq!(err.message, "Content not found: post:post/9");
        let extensions = err.extensions.unwrap();
        assert_eq!(extensions.get("code"), Some(&Value::String("NOT_FOUND".into())));
    }
}
