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
use tf_provider::value::ValueString;
use tf_provider::{map, AttributePath, Diagnostics};

use crate::api::{ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::{json, ObjectError};
use crate::models::JsonObject;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{reconcile_text, replace_if_changed, required, validate_name};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct DataBagItemState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub data_bag_name: ValueString<'a>,
    pub content_json: ValueString<'a>,
}

impl WithSchema for DataBagItemState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Value of the `id` member of the item content"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "data_bag_name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the data bag holding the item"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "content_json" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("JSON object stored in the item, with a string `id` member"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                },
                description: Description::plain("Item of a data bag"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for DataBagItemState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

impl WithValidate for DataBagItemState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.clone().attribute("data_bag_name"), &self.data_bag_name);

        let content_path = attr_path.attribute("content_json");
        if self.content_json.is_value() {
            if let Err(err) = self.content() {
                diags.error("Invalid data bag item", err.to_string(), content_path);
            }
        }
    }
}

impl<'a> ObjectState<'a> for DataBagItemState<'a> {
    fn id(&self) -> &ValueString<'a> {
        &self.id
    }
    fn id_mut(&mut self) -> &mut ValueString<'a> {
        &mut self.id
    }
    fn replace_triggers(&self, prior: &Self) -> Vec<AttributePath> {
        let mut triggers = Vec::new();
        replace_if_changed(
            &mut triggers,
            "data_bag_name",
            &self.data_bag_name,
            &prior.data_bag_name,
        );
        let same_content = match (
            self.content_json.as_deref_option(),
            prior.content_json.as_deref_option(),
        ) {
            (Some(text), Some(prior)) => serde_json::from_str::<JsonValue>(prior)
                .is_ok_and(|prior| json::same(text, &prior)),
            _ => self.content_json == prior.content_json,
        };
        if !same_content {
            triggers.push(AttributePath::new("content_json"));
        }
        triggers
    }
}

impl DataBagItemState<'_> {
    /// Parsed content with its item id
    fn content(&self) -> Result<(String, JsonObject), ObjectError> {
        let text = required("content_json", &self.content_json)?;
        let content: JsonObject = json::decode("content_json", text)?;
        match content.get("id") {
            Some(JsonValue::String(id)) if !id.is_empty() => Ok((id.clone(), content)),
            _ => Err(ObjectError::invalid(
                "content_json",
                "content_json must have id attribute, set to a string",
            )),
        }
    }

    fn item_path(&self) -> Result<String, ObjectError> {
        let bag = required("data_bag_name", &self.data_bag_name)?;
        let id = required("id", &self.id)?;
        Ok(format!("data/{bag}/{id}"))
    }
}

pub(crate) struct DataBagItemObject;

#[async_trait]
impl ChefObject for DataBagItemObject {
    const KIND: &'static str = "data bag item";
    type State<'a> = DataBagItemState<'a>;

    fn identify(state: &DataBagItemState<'_>) -> Result<String, ObjectError> {
        Ok(state.content()?.0)
    }

    fn import<'a>(id: &str) -> Result<DataBagItemState<'a>, ObjectError> {
        match id.split_once('/') {
            Some((bag, item)) if !bag.is_empty() && !item.is_empty() && !item.contains('/') => {
                Ok(DataBagItemState {
                    id: ValueString::from(item.to_string()),
                    data_bag_name: ValueString::from(bag.to_string()),
                    ..Default::default()
                })
            }
            _ => Err(ObjectError::invalid(
                "id",
                format!("`{id}` is not an item id, expected databag_name/item_name"),
            )),
        }
    }

    async fn create<'a>(
        client: &ChefClient,
        state: &mut DataBagItemState<'a>,
    ) -> Result<(), ObjectError> {
        let bag = required("data_bag_name", &state.data_bag_name)?;
        let (_, content) = state.content()?;
        let _: JsonValue = client
            .post(Scope::Organization, &format!("data/{bag}"), &content)
            .await?;
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &DataBagItemState<'a>,
    ) -> Result<DataBagItemState<'a>, ObjectError> {
        let content: JsonValue = client.get(Scope::Organization, &state.item_path()?).await?;
        let bag = required("data_bag_name", &state.data_bag_name)?;

        Ok(DataBagItemState {
            id: state.id.clone(),
            data_bag_name: reconcile_text(state.data_bag_name.clone(), bag),
            content_json: json::reconcile(state.content_json.clone(), &content),
        })
    }

    /// Only a reformatting of the stored content is accepted
    async fn update<'a>(
        client: &ChefClient,
        state: &DataBagItemState<'a>,
    ) -> Result<(), ObjectError> {
        let content: JsonValue = client.get(Scope::Organization, &state.item_path()?).await?;
        let (_, planned) = state.content()?;
        if JsonValue::Object(planned) == content {
            Ok(())
        } else {
            Err(ObjectError::Immutable { kind: Self::KIND })
        }
    }

    async fn delete<'a>(
        client: &ChefClient,
        state: &DataBagItemState<'a>,
    ) -> Result<(), ObjectError> {
        client.delete(Scope::Organization, &state.item_path()?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::resources::testing::Harness;

    fn config(content: &'static str) -> DataBagItemState<'static> {
        DataBagItemState {
            data_bag_name: ValueString::from("users"),
            content_json: ValueString::from(content),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn item_is_named_after_its_id() {
        let harness = Harness::new().await;
        harness.memory.insert(Scope::Organization, "data/users", json!({"name": "users"}));

        let content = r#"{ "id": "alice", "shell": "/bin/zsh" }"#;
        let state = harness.create::<DataBagItemObject>(config(content)).await.unwrap();
        assert_eq!(state.id, ValueString::from("alice"));
        assert_eq!(state.content_json, ValueString::from(content));
        assert_eq!(
            harness.memory.object(Scope::Organization, "data/users/alice"),
            Some(json!({"id": "alice", "shell": "/bin/zsh"}))
        );

        let plan = harness
            .plan_update::<DataBagItemObject>(
                state.clone(),
                config(r#"{"shell":"/bin/zsh","id":"alice"}"#),
            )
            .await;
        assert!(plan.replace.is_empty());

        let plan = harness
            .plan_update::<DataBagItemObject>(
                state,
                config(r#"{"id":"alice","shell":"/bin/bash"}"#),
            )
            .await;
        assert_eq!(plan.replace, vec![AttributePath::new("content_json")]);
    }

    #[tokio::test]
    async fn content_requires_string_id() {
        let harness = Harness::new().await;
        for content in [r#"{"name": "alice"}"#, r#"{"id": 12}"#, r#"{"id": ""}"#] {
            let diags = harness.validate::<DataBagItemObject>(config(content)).await;
            assert_eq!(diags.errors.len(), 1, "{content}");
            assert!(diags.errors[0]
                .detail
                .contains("content_json must have id attribute, set to a string"));
            assert_eq!(diags.errors[0].attribute, AttributePath::new("content_json"));
        }

        let diags = harness.validate::<DataBagItemObject>(config("[]")).await;
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn server_drift_is_exposed() {
        let harness = Harness::new().await;
        let state = harness
            .create::<DataBagItemObject>(config(r#"{"id": "alice"}"#))
            .await
            .unwrap();
        harness.memory.insert(
            Scope::Organization,
            "data/users/alice",
            json!({"id": "alice", "admin": true}),
        );

        let (read, _) = harness.read::<DataBagItemObject>(state).await;
        assert_eq!(
            read.unwrap().content_json,
            ValueString::from(r#"{"admin":true,"id":"alice"}"#)
        );
    }

    #[tokio::test]
    async fn only_reformatting_updates_in_place() {
        let harness = Harness::new().await;
        let state = harness
            .create::<DataBagItemObject>(config(r#"{"id": "alice", "uid": 1000}"#))
            .await
            .unwrap();

        let reformatted = r#"{
  "uid": 1000,
  "id": "alice"
}"#;
        let updated = harness
            .update::<DataBagItemObject>(state.clone(), config(reformatted))
            .await
            .unwrap();
        assert_eq!(updated.content_json, ValueString::from(reformatted));

        let client = harness.memory.client();
        let changed = DataBagItemState {
            id: state.id.clone(),
            ..config(r#"{"id": "alice", "uid": 1001}"#)
        };
        let err = DataBagItemObject::update(&client, &changed).await.unwrap_err();
        assert!(matches!(err, ObjectError::Immutable { kind: "data bag item" }));
    }

    #[tokio::test]
    async fn import_bag_and_item() {
        let harness = Harness::new().await;
        harness
            .memory
            .insert(Scope::Organization, "data/users/bob", json!({"id": "bob"}));

        let state = harness.import::<DataBagItemObject>("users/bob").await.unwrap();
        assert_eq!(state.id, ValueString::from("bob"));
        assert_eq!(state.data_bag_name, ValueString::from("users"));
        assert_eq!(state.content_json, ValueString::from(r#"{"id":"bob"}"#));

        for id in ["users", "users/", "/bob", "a/b/c"] {
            let diags = harness.import::<DataBagItemObject>(id).await.unwrap_err();
            assert!(diags.errors[0].detail.contains("expected databag_name/item_name"));
        }
    }
}
