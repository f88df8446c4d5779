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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::api::{ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::{json, run_list, ObjectError};
use crate::models::Node;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{default_to, reconcile_text, replace_if_changed, required, validate_name};

const DEFAULT_ENVIRONMENT: &str = "_default";
const ATTRIBUTES: [&str; 4] = [
    "automatic_attributes_json",
    "normal_attributes_json",
    "default_attributes_json",
    "override_attributes_json",
];

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct NodeState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub environment_name: ValueString<'a>,
    pub automatic_attributes_json: ValueString<'a>,
    pub normal_attributes_json: ValueString<'a>,
    pub default_attributes_json: ValueString<'a>,
    pub override_attributes_json: ValueString<'a>,
    pub run_list: ValueList<ValueString<'a>>,
}

fn attribute_json_description(precedence: &str) -> Description {
    Description::plain(format!(
        "{precedence} attributes as a JSON object (default: \"{{}}\")"
    ))
}

impl WithSchema for NodeState<'_> {
    fn schema() -> Schema {
        let json_attribute = |precedence| Attribute {
            attr_type: AttributeType::String,
            description: attribute_json_description(precedence),
            constraint: AttributeConstraint::OptionalComputed,
            ..Default::default()
        };
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the node"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Unique name of the node"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "environment_name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Environment the node belongs to (default: \"_default\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "automatic_attributes_json" => json_attribute("Automatic"),
                    "normal_attributes_json" => json_attribute("Normal"),
                    "default_attributes_json" => json_attribute("Default"),
                    "override_attributes_json" => json_attribute("Override"),
                    "run_list" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Recipes and roles applied to the node, like \"recipe[nginx]\" or \"role[web]\""),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                },
                description: Description::plain("Node registered on the Chef Server"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for NodeState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.environment_name, DEFAULT_ENVIRONMENT);
        for attributes in self.attributes_mut() {
            default_to(attributes, "{}");
        }
        if self.run_list.is_null() {
            self.run_list = Value::Value(Vec::new());
        }
    }
}

impl WithValidate for NodeState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.clone().attribute("name"), &self.name);
        for (field, value) in ATTRIBUTES.into_iter().zip(self.attributes()) {
            json::validate(diags, attr_path.clone().attribute(field), value);
        }
        run_list::validate(diags, attr_path.attribute("run_list"), &self.run_list);
    }
}

impl<'a> ObjectState<'a> for NodeState<'a> {
    fn id(&self) -> &ValueString<'a> {
        &self.id
    }
    fn id_mut(&mut self) -> &mut ValueString<'a> {
        &mut self.id
    }
    fn replace_triggers(&self, prior: &Self) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        replace_if_changed(&mut triggers, "name", &self.name, &prior.name);
        triggers
    }
}

impl<'a> NodeState<'a> {
    /// Attribute blobs, in the order of `ATTRIBUTES`
    fn attributes(&self) -> [&ValueString<'a>; 4] {
        [
            &self.automatic_attributes_json,
            &self.normal_attributes_json,
            &self.default_attributes_json,
            &self.override_attributes_json,
        ]
    }

    fn attributes_mut(&mut self) -> [&mut ValueString<'a>; 4] {
        [
            &mut self.automatic_attributes_json,
            &mut self.normal_attributes_json,
            &mut self.default_attributes_json,
            &mut self.override_attributes_json,
        ]
    }

    fn to_node(&self) -> Result<Node, ObjectError> {
        Ok(Node {
            name: required("name", &self.name)?.to_string(),
            chef_environment: self
                .environment_name
                .as_deref_option()
                .unwrap_or(DEFAULT_ENVIRONMENT)
                .to_string(),
            run_list: run_list::decode("run_list", &self.run_list)?,
            automatic: json::decode_value(
                "automatic_attributes_json",
                &self.automatic_attributes_json,
            )?,
            normal: json::decode_value("normal_attributes_json", &self.normal_attributes_json)?,
            default: json::decode_value("default_attributes_json", &self.default_attributes_json)?,
            overrides: json::decode_value(
                "override_attributes_json",
                &self.override_attributes_json,
            )?,
            ..Default::default()
        })
    }

    /// State describing `node`, keeping the values of `self` equivalent to the server ones
    pub(crate) fn reconcile(&self, node: Node) -> Self {
        Self {
            id: self.id.clone(),
            name: reconcile_text(self.name.clone(), &node.name),
            environment_name: reconcile_text(self.environment_name.clone(), &node.chef_environment),
            automatic_attributes_json: json::reconcile(
                self.automatic_attributes_json.clone(),
                &JsonValue::Object(node.automatic),
            ),
            normal_attributes_json: json::reconcile(
                self.normal_attributes_json.clone(),
                &JsonValue::Object(node.normal),
            ),
            default_attributes_json: json::reconcile(
                self.default_attributes_json.clone(),
                &JsonValue::Object(node.default),
            ),
            override_attributes_json: json::reconcile(
                self.override_attributes_json.clone(),
                &JsonValue::Object(node.overrides),
            ),
            run_list: run_list::reconcile(self.run_list.clone(), &node.run_list),
        }
    }
}

pub(crate) struct NodeObject;

#[async_trait]
impl ChefObject for NodeObject {
    const KIND: &'static str = "node";
    type State<'a> = NodeState<'a>;

    fn identify(state: &NodeState<'_>) -> Result<String, ObjectError> {
        Ok(required("name", &state.name)?.to_string())
    }

    fn import<'a>(id: &str) -> Result<NodeState<'a>, ObjectError> {
        Ok(NodeState {
            id: ValueString::from(id.to_string()),
            name: ValueString::from(id.to_string()),
            ..Default::default()
        })
    }

    async fn create<'a>(client: &ChefClient, state: &mut NodeState<'a>) -> Result<(), ObjectError> {
        let _: JsonValue = client
            .post(Scope::Organization, "nodes", &state.to_node()?)
            .await?;
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &NodeState<'a>,
    ) -> Result<NodeState<'a>, ObjectError> {
        let name = required("id", &state.id)?;
        let node: Node = client
            .get(Scope::Organization, &format!("nodes/{name}"))
            .await?;
        Ok(state.reconcile(node))
    }

    async fn update<'a>(client: &ChefClient, state: &NodeState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        let _: JsonValue = client
            .put(Scope::Organization, &format!("nodes/{name}"), &state.to_node()?)
            .await?;
        Ok(())
    }

    async fn delete<'a>(client: &ChefClient, state: &NodeState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        client
            .delete(Scope::Organization, &format!("nodes/{name}"))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::resources::testing::Harness;

    fn config(name: &'static str) -> NodeState<'static> {
        NodeState {
            name: ValueString::from(name),
            ..Default::default()
        }
    }

    fn entries(entries: &[&'static str]) -> ValueList<ValueString<'static>> {
        Value::Value(entries.iter().map(|entry| ValueString::from(*entry)).collect())
    }

    #[tokio::test]
    async fn defaults_are_planned() {
        let harness = Harness::new().await;
        let planned = harness.plan_create::<NodeObject>(config("web-1")).await;
        assert_eq!(planned.environment_name, ValueString::from("_default"));
        for attributes in planned.attributes() {
            assert_eq!(attributes, &ValueString::from("{}"));
        }
        assert_eq!(planned.run_list, Value::Value(Vec::new()));
    }

    #[tokio::test]
    async fn run_list_is_normalized_on_the_server() {
        let harness = Harness::new().await;
        let state = harness
            .create::<NodeObject>(NodeState {
                run_list: entries(&["cookbook@1.0.0", "role[web]"]),
                ..config("web-1")
            })
            .await
            .unwrap();

        // state keeps the configured spelling
        assert_eq!(state.run_list, entries(&["cookbook@1.0.0", "role[web]"]));
        let stored = harness.memory.object(Scope::Organization, "nodes/web-1").unwrap();
        assert_eq!(stored["run_list"], json!(["recipe[cookbook@1.0.0]", "role[web]"]));
        assert_eq!(stored["chef_environment"], "_default");
        assert_eq!(stored["chef_type"], "node");
        assert_eq!(stored["json_class"], "Chef::Node");

        let imported = harness.import::<NodeObject>("web-1").await.unwrap();
        assert_eq!(
            imported.run_list,
            entries(&["recipe[cookbook@1.0.0]", "role[web]"])
        );
    }

    #[tokio::test]
    async fn run_list_drift_is_exposed() {
        let harness = Harness::new().await;
        let state = harness
            .create::<NodeObject>(NodeState {
                run_list: entries(&["nginx"]),
                ..config("web-1")
            })
            .await
            .unwrap();

        let mut stored = harness.memory.object(Scope::Organization, "nodes/web-1").unwrap();
        stored["run_list"] = json!(["recipe[nginx]", "recipe[ntp]"]);
        harness.memory.insert(Scope::Organization, "nodes/web-1", stored);

        let (read, _) = harness.read::<NodeObject>(state).await;
        assert_eq!(read.unwrap().run_list, entries(&["recipe[nginx]", "recipe[ntp]"]));
    }

    #[tokio::test]
    async fn attributes_update_in_place() {
        let harness = Harness::new().await;
        let state = harness.create::<NodeObject>(config("web-1")).await.unwrap();

        let updated = harness
            .update::<NodeObject>(
                state,
                NodeState {
                    environment_name: ValueString::from("prod"),
                    normal_attributes_json: ValueString::from(r#"{ "tags": ["web"] }"#),
                    ..config("web-1")
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.normal_attributes_json, ValueString::from(r#"{ "tags": ["web"] }"#));

        let stored = harness.memory.object(Scope::Organization, "nodes/web-1").unwrap();
        assert_eq!(stored["normal"], json!({"tags": ["web"]}));
        assert_eq!(stored["chef_environment"], "prod");
    }

    #[tokio::test]
    async fn invalid_entries_are_reported_by_index() {
        let harness = Harness::new().await;
        let diags = harness
            .validate::<NodeObject>(NodeState {
                run_list: entries(&["recipe[ok]", "recipe[bad name]"]),
                automatic_attributes_json: ValueString::from("[]"),
                ..config("web-1")
            })
            .await;
        let attributes: Vec<_> = diags.errors.iter().map(|diag| diag.attribute.clone()).collect();
        assert_eq!(attributes.len(), 2);
        assert!(attributes.contains(&AttributePath::new("run_list").index(1)));
        assert!(attributes.contains(&AttributePath::new("automatic_attributes_json")));
    }

    #[tokio::test]
    async fn unknown_entries_fail_creation() {
        let harness = Harness::new().await;
        let planned = NodeState {
            run_list: Value::Value(vec![Value::Unknown]),
            ..harness.plan_create::<NodeObject>(config("web-1")).await
        };

        let client = harness.memory.client();
        let err = NodeObject::create(&client, &mut planned.clone()).await.unwrap_err();
        assert_eq!(err.attribute(), Some(AttributePath::new("run_list")));
        assert!(harness.memory.requests().is_empty());
    }
}
