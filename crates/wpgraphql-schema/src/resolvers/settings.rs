//! Setting group resolvers.
//!
//! Settings are exposed per group (`RootQuery.generalSettings { title }`) and
//! updated through a single `updateSettings` mutation whose input fields are
//! prefixed with the group (`generalSettingsTitle`).

use async_graphql::{Context, Name, Value};
use indexmap::IndexMap;
use tracing::{debug, warn};
use wpgraphql_content::{DynContentSource, SettingGroup};

use super::{content_error_to_graphql, graphql_value_to_json, json_to_graphql_value};
use crate::registry::{Arguments, ResolveFuture, ResolveParams, display_name};

/// `posts_per_page` → `postsPerPage`.
pub(crate) fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, part) in name.split(['_', '-']).filter(|p| !p.is_empty()).enumerate() {
        if i == 0 {
            out.push_str(part);
        } else {
            out.push_str(&display_name(part));
        }
    }
    out
}

/// `Reading_Options` → `readingoptionsSettings`.
pub(crate) fn group_field_name(group: &str) -> String {
    format!("{}Settings", group.to_lowercase().replace('_', ""))
}

/// Name of the `updateSettings` input field for a setting.
pub(crate) fn setting_input_name(group: &str, setting: &str) -> String {
    format!("{}{}", group_field_name(group), display_name(&camel_case(setting)))
}

/// Renames host setting keys to their exposed names.
fn expose(group: &SettingGroup, values: serde_json::Map<String, serde_json::Value>) -> Value {
    let mut out = IndexMap::new();
    for setting in &group.settings {
        if let Some(value) = values.get(&setting.name) {
            out.insert(Name::new(camel_case(&setting.name)), json_to_graphql_value(value.clone()));
        }
    }
    Value::Object(out)
}

/// Resolvers for setting groups.
pub struct SettingsResolver;

impl SettingsResolver {
    /// Resolves the current values of one group.
    pub fn query(
        source: DynContentSource,
        group: SettingGroup,
    ) -> impl Fn(ResolveParams<'_>) -> ResolveFuture<'_> + Send + Sync + Clone {
        move |_params| {
            let source = source.clone();
            let group = group.clone();
            ResolveFuture::new(async move {
                let values = source.settings(&group.name).await.map_err(|e| {
                    warn!(error = %e, group = %group.name, "Content error reading settings");
                    content_error_to_graphql(e)
                })?;
                Ok(Some(expose(&group, values)))
            })
        }
    }

    /// Applies `updateSettings` input to every group it touches and returns
    /// the fresh values of all groups.
    pub fn update(
        source: DynContentSource,
        groups: Vec<SettingGroup>,
    ) -> impl for<'a> Fn(Arguments, &'a Context<'a>) -> ResolveFuture<'a> + Send + Sync + Clone {
        move |input, _ctx| {
            let source = source.clone();
            let groups = groups.clone();
            ResolveFuture::new(async move {
                let mut payload = IndexMap::new();
                for group in &groups {
                    let changes: serde_json::Map<String, serde_json::Value> = group
                        .settings
                        .iter()
                        .filter_map(|setting| {
                            let value = input.get(setting_input_name(&group.name, &setting.name).as_str())?;
                            (!matches!(value, Value::Null))
                                .then(|| (setting.name.clone(), graphql_value_to_json(value)))
                        })
                        .collect();

                    let values = if changes.is_empty() {
                        source.settings(&group.name).await
                    } else {
                        debug!(group = %group.name, changed = changes.len(), "Updating settings");
                        source.update_settings(&group.name, changes).await
                    }
                    .map_err(|e| {
                        warn!(error = %e, group = %group.name, "Content error updating settings");
                        content_error_to_graphql(e)
                    })?;

                    payload.insert(Name::new(group_field_name(&group.name)), expose(group, values));
                }
                Ok(Some(Value::Object(payload)))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpgraphql_content::{SettingField, SettingKind};

    #[test]
    fn test_names() {
        assert_eq!(camel_case("posts_per_page"), "postsPerPage");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(group_field_name("Reading_Options"), "readingoptionsSettings");
        assert_eq!(setting_input_name("general", "posts_per_page"), "generalSettingsPostsPerPage");
    }

    #[test]
    fn test_expose_renames_and_filters() {
        let group = SettingGroup::new("reading")
            .with_setting(SettingField::new("posts_per_page", SettingKind::Integer));
        let mut values = serde_json::Map::new();
        values.insert("posts_per_page".into(), serde_json::json!(10));
        values.insert("hidden".into(), serde_json::json!(true));

        let Value::Object(map) = expose(&group, values) else {
            panic!("expected object");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("postsPerPage"), Some(&Value::Number(10.into())));
    }
}
