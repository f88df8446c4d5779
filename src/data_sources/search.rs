// This file is part of the terraform-provider-chef project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::borrow::Cow;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, NestedBlock, Schema,
};
use tf_provider::value::{
    Value, ValueBool, ValueEmpty, ValueList, ValueMap, ValueNumber, ValueSet, ValueString,
};
use tf_provider::{map, AttributePath, DataSource, Diagnostics};
use tracing::debug;

use crate::api::ClientHandle;
use crate::models::{SearchQuery, SearchResult};

const DEFAULT_INDEX: &str = "node";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub(crate) struct FilterState<'a> {
    #[serde(borrow = "'a")]
    pub name: ValueString<'a>,
    pub value: ValueList<ValueString<'a>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct SearchState<'a> {
    #[serde(borrow = "'a")]
    pub index: ValueString<'a>,
    pub query: ValueString<'a>,
    pub filter: ValueSet<FilterState<'a>>,
    pub unique: ValueBool,
    pub result: ValueMap<'a, ValueString<'a>>,
    pub total_num: ValueNumber,
}

impl SearchState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "index" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Index to search: node, role, client, environment or a data bag name (default: \"node\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "query" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Search query, like \"role:web AND chef_environment:prod\""),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "unique" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Fail unless the query matches exactly one object (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "result" => Attribute {
                        attr_type: AttributeType::Map(AttributeType::String.into()),
                        description: Description::plain("Fields of the first match, non string values are encoded as JSON"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "total_num" => Attribute {
                        attr_type: AttributeType::Number,
                        description: Description::plain("Number of objects matching the query"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                blocks: map! {
                    "filter" => NestedBlock::Set(Block {
                        attributes: map! {
                            "name" => Attribute {
                                attr_type: AttributeType::String,
                                description: Description::plain("Key of the field in the result"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                            "value" => Attribute {
                                attr_type: AttributeType::List(AttributeType::String.into()),
                                description: Description::plain("Path of the field in the object, like [\"network\", \"ipaddress\"]"),
                                constraint: AttributeConstraint::Required,
                                ..Default::default()
                            },
                        },
                        description: Description::plain("Field extracted with a partial search"),
                        ..Default::default()
                    }),
                },
                description: Description::plain("Search the Chef Server index"),
                ..Default::default()
            },
        }
    }

    /// Fields extracted by a partial search, when filters are set
    fn partial(&self) -> Option<BTreeMap<String, Vec<String>>> {
        let partial: BTreeMap<_, _> = self
            .filter
            .iter()
            .flatten()
            .filter_map(|filter| {
                let name = filter.name.as_deref_option()?.to_string();
                let path = filter
                    .value
                    .iter()
                    .flatten()
                    .map(|segment| segment.as_deref_option().unwrap_or_default().to_string())
                    .collect();
                Some((name, path))
            })
            .collect();
        if partial.is_empty() {
            None
        } else {
            Some(partial)
        }
    }

    fn to_query(&self) -> SearchQuery {
        SearchQuery {
            index: self
                .index
                .as_deref_option()
                .unwrap_or(DEFAULT_INDEX)
                .to_string(),
            query: self.query.as_deref_option().unwrap_or_default().to_string(),
            rows: 1,
            start: 0,
            partial: self.partial(),
        }
    }
}

/// Flatten the data of the first row into a map of strings
///
/// The data is the `data` member of the row, its `raw_data` member,
/// or the row itself.
pub(crate) fn flatten(result: &SearchResult) -> BTreeMap<String, String> {
    let Some(row) = result.rows.first() else {
        return BTreeMap::new();
    };
    let data = row.get("data").or_else(|| row.get("raw_data")).unwrap_or(row);
    match data {
        JsonValue::Object(fields) => fields
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    JsonValue::String(text) => text.clone(),
                    other => other.to_string(),
                };
                (name.clone(), value)
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct SearchDataSource {
    client: ClientHandle,
}

impl SearchDataSource {
    pub(crate) fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for SearchDataSource {
    type State<'a> = SearchState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(SearchState::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if config.index.as_deref_option() == Some("") {
            diags.error_short("Index must not be empty", AttributePath::new("index"));
        }
        if config.query.as_deref_option() == Some("") {
            diags.error_short("Query must not be empty", AttributePath::new("query"));
        }
        for filter in config.filter.iter().flatten() {
            if filter.value.as_ref_option().is_some_and(Vec::is_empty) {
                diags.error_short(
                    "Filter value must name at least one field",
                    AttributePath::new("filter"),
                );
            }
        }

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags).await?;
        let query = config.to_query();

        let result = match client.search(&query).await {
            Ok(result) => result,
            Err(err) => {
                diags.root_error(format!("Unable to search {}", query.index), err.to_string());
                return None;
            }
        };

        if config.unique.unwrap_or_default() && result.total != 1 {
            diags.root_error(
                "Search result is not unique",
                format!("Query had {} results, not one.", result.total),
            );
            return None;
        }

        let fields = flatten(&result);
        debug!(index = %query.index, total = result.total, fields = fields.len(), "search result");

        let mut state = config;
        state.index = ValueString::from(query.index);
        state.unique = Value::Value(state.unique.unwrap_or_default());
        state.total_num = Value::Value(result.total);
        state.result = Value::Value(
            fields
                .into_iter()
                .map(|(name, value)| (Cow::Owned(name), ValueString::from(value)))
                .collect(),
        );
        Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use reqwest::Method;
    use serde_json::json;

    use crate::resources::testing::Harness;

    fn config(query: &'static str) -> SearchState<'static> {
        SearchState {
            query: ValueString::from(query),
            ..Default::default()
        }
    }

    fn filter(name: &'static str, path: &[&'static str]) -> FilterState<'static> {
        FilterState {
            name: ValueString::from(name),
            value: Value::Value(path.iter().map(|segment| ValueString::from(*segment)).collect()),
        }
    }

    async fn search(
        harness: &Harness,
        config: SearchState<'static>,
    ) -> (Option<SearchState<'static>>, Diagnostics) {
        let mut diags = Diagnostics::default();
        let state = DataSource::read(
            &SearchDataSource::new(harness.client.clone()),
            &mut diags,
            config,
            ValueEmpty::Null,
        )
        .await;
        (state, diags)
    }

    fn result(entries: &[(&str, &str)]) -> ValueMap<'static, ValueString<'static>> {
        Value::Value(
            entries
                .iter()
                .map(|(name, value)| {
                    (
                        Cow::Owned(name.to_string()),
                        ValueString::from(value.to_string()),
                    )
                })
                .collect(),
        )
    }

    #[test]
    fn flatten_prefers_data() {
        let rows = |row| SearchResult {
            total: 1,
            start: 0,
            rows: vec![row],
        };

        let flat = flatten(&rows(json!({
            "url": "x",
            "data": {"ip": "10.0.0.1", "port": 22, "tags": ["a"], "none": null},
        })));
        assert_eq!(flat["ip"], "10.0.0.1");
        assert_eq!(flat["port"], "22");
        assert_eq!(flat["tags"], r#"["a"]"#);
        assert_eq!(flat["none"], "null");
        assert!(!flat.contains_key("url"));

        let flat = flatten(&rows(json!({"raw_data": {"id": "alice", "admin": true}})));
        assert_eq!(flat["admin"], "true");

        let flat = flatten(&rows(json!({"name": "web-1", "automatic": {"a": 1}})));
        assert_eq!(flat["automatic"], r#"{"a":1}"#);

        assert!(flatten(&SearchResult::default()).is_empty());
    }

    #[tokio::test]
    async fn full_search() {
        let harness = Harness::new().await;
        harness.memory.set_search(
            "node",
            json!({
                "total": 3,
                "start": 0,
                "rows": [{"name": "web-1", "chef_environment": "prod"}],
            }),
        );

        let (state, diags) = search(&harness, config("role:web")).await;
        assert!(diags.errors.is_empty());
        let state = state.unwrap();
        assert_eq!(state.index, ValueString::from("node"));
        assert_eq!(state.unique, Value::Value(false));
        assert_eq!(state.total_num, Value::Value(3));
        assert_eq!(
            state.result,
            result(&[("chef_environment", "prod"), ("name", "web-1")])
        );

        let requests = harness.memory.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].path, "search/node");
        assert!(requests[0].query.contains(&(String::from("q"), String::from("role:web"))));
        assert!(requests[0].query.contains(&(String::from("rows"), String::from("1"))));
        assert!(requests[0].query.contains(&(String::from("start"), String::from("0"))));
    }

    #[tokio::test]
    async fn filters_run_a_partial_search() {
        let harness = Harness::new().await;
        harness.memory.set_search(
            "users",
            json!({"total": 1, "start": 0, "rows": [{"url": "u", "data": {"shell": "/bin/zsh"}}]}),
        );

        let (state, diags) = search(
            &harness,
            SearchState {
                index: ValueString::from("users"),
                filter: Value::Value([filter("shell", &["shell"])].into_iter().collect()),
                unique: Value::Value(true),
                ..config("id:alice")
            },
        )
        .await;
        assert!(diags.errors.is_empty());
        assert_eq!(state.unwrap().result, result(&[("shell", "/bin/zsh")]));

        let requests = harness.memory.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(requests[0].body, Some(json!({"shell": ["shell"]})));
    }

    #[tokio::test]
    async fn unique_requires_one_result() {
        let harness = Harness::new().await;
        harness
            .memory
            .set_search("node", json!({"total": 2, "start": 0, "rows": [{"name": "a"}]}));

        let (state, diags) = search(
            &harness,
            SearchState {
                unique: Value::Value(true),
                ..config("*:*")
            },
        )
        .await;
        assert!(state.is_none());
        assert!(diags.errors[0]
            .detail
            .starts_with("Query had 2 results, not one."));

        harness
            .memory
            .set_search("node", json!({"total": 0, "start": 0, "rows": []}));
        let (state, diags) = search(
            &harness,
            SearchState {
                unique: Value::Value(true),
                ..config("*:*")
            },
        )
        .await;
        assert!(state.is_none());
        assert!(diags.errors[0]
            .detail
            .starts_with("Query had 0 results, not one."));
    }

    #[tokio::test]
    async fn no_result() {
        let harness = Harness::new().await;
        harness
            .memory
            .set_search("role", json!({"total": 0, "start": 0, "rows": []}));

        let (state, _) = search(
            &harness,
            SearchState {
                index: ValueString::from("role"),
                ..config("name:ghost")
            },
        )
        .await;
        let state = state.unwrap();
        assert_eq!(state.total_num, Value::Value(0));
        assert_eq!(state.result, Value::Value(BTreeMap::new()));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let mut diags = Diagnostics::default();
        let valid =
            DataSource::validate(&SearchDataSource::default(), &mut diags, config("")).await;
        assert!(valid.is_none());
        assert_eq!(diags.errors[0].attribute, AttributePath::new("query"));
    }

    #[tokio::test]
    async fn empty_index_is_rejected() {
        let mut diags = Diagnostics::default();
        let empty_index = SearchState {
            index: ValueString::from(""),
            ..config("*:*")
        };
        let valid =
            DataSource::validate(&SearchDataSource::default(), &mut diags, empty_index).await;
        assert!(valid.is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].attribute, AttributePath::new("index"));

        let mut diags = Diagnostics::default();
        let valid =
            DataSource::validate(&SearchDataSource::default(), &mut diags, config("*:*")).await;
        assert!(valid.is_some());
        assert!(diags.errors.is_empty());
    }
}
