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

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::api::{ApiError, ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::{json, run_list, ObjectError};
use crate::models::Role;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{
    default_to, reconcile_text, replace_if_changed, required, validate_name, MANAGED_BY_TERRAFORM,
};

type EnvRunLists = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct RoleState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub default_attributes_json: ValueString<'a>,
    pub override_attributes_json: ValueString<'a>,
    pub env_run_lists_json: ValueString<'a>,
    pub run_list: ValueList<ValueString<'a>>,
}

impl WithSchema for RoleState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the role"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Unique name of the role"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the role (default: \"Managed by Terraform\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "default_attributes_json" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Default attributes as a JSON object (default: \"{}\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "override_attributes_json" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Override attributes as a JSON object (default: \"{}\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "env_run_lists_json" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("JSON object mapping environment names to run lists (default: \"{}\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "run_list" => Attribute {
                        attr_type: AttributeType::List(AttributeType::String.into()),
                        description: Description::plain("Recipes and roles applied by the role"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                },
                description: Description::plain("Chef role"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for RoleState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.description, MANAGED_BY_TERRAFORM);
        default_to(&mut self.default_attributes_json, "{}");
        default_to(&mut self.override_attributes_json, "{}");
        default_to(&mut self.env_run_lists_json, "{}");
        if self.run_list.is_null() {
            self.run_list = Value::Value(Vec::new());
        }
    }
}

impl WithValidate for RoleState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.clone().attribute("name"), &self.name);
        json::validate(
            diags,
            attr_path.clone().attribute("default_attributes_json"),
            &self.default_attributes_json,
        );
        json::validate(
            diags,
            attr_path.clone().attribute("override_attributes_json"),
            &self.override_attributes_json,
        );
        if let Some(text) = self.env_run_lists_json.as_deref_option() {
            if let Err(err) = decode_env_run_lists(text) {
                diags.error(
                    "Invalid environment run lists",
                    err.to_string(),
                    attr_path.clone().attribute("env_run_lists_json"),
                );
            }
        }
        run_list::validate(diags, attr_path.attribute("run_list"), &self.run_list);
    }
}

impl<'a> ObjectState<'a> for RoleState<'a> {
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

/// Parse and normalize the run list of every environment
fn decode_env_run_lists(text: &str) -> Result<EnvRunLists, ObjectError> {
    const FIELD: &str = "env_run_lists_json";

    let raw: EnvRunLists = json::decode(FIELD, text)?;
    raw.into_iter()
        .map(|(environment, entries)| -> Result<(String, Vec<String>), ObjectError> {
            let entries = entries
                .iter()
                .enumerate()
                .map(|(i, entry)| {
                    run_list::normalize(entry).map_err(|err| {
                        ObjectError::invalid(FIELD, format!("{environment} entry {i}: {err}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok((environment, entries))
        })
        .collect()
}

fn reconcile_env_run_lists<'a>(
    prior: ValueString<'a>,
    server: &EnvRunLists,
) -> Result<ValueString<'a>, ObjectError> {
    let unchanged = prior
        .as_deref_option()
        .and_then(|text| decode_env_run_lists(text).ok())
        .is_some_and(|prior| &prior == server);
    if unchanged {
        Ok(prior)
    } else {
        Ok(json::encode(&serde_json::to_value(server).map_err(ApiError::from)?))
    }
}

impl RoleState<'_> {
    fn to_role(&self) -> Result<Role, ObjectError> {
        Ok(Role {
            name: required("name", &self.name)?.to_string(),
            description: self.description.as_deref_option().unwrap_or_default().to_string(),
            default_attributes: json::decode_value(
                "default_attributes_json",
                &self.default_attributes_json,
            )?,
            override_attributes: json::decode_value(
                "override_attributes_json",
                &self.override_attributes_json,
            )?,
            run_list: run_list::decode("run_list", &self.run_list)?,
            env_run_lists: match self.env_run_lists_json.as_deref_option() {
                Some(text) => decode_env_run_lists(text)?,
                None => EnvRunLists::new(),
            },
            ..Default::default()
        })
    }
}

pub(crate) struct RoleObject;

#[async_trait]
impl ChefObject for RoleObject {
    const KIND: &'static str = "role";
    type State<'a> = RoleState<'a>;

    fn identify(state: &RoleState<'_>) -> Result<String, ObjectError> {
        Ok(required("name", &state.name)?.to_string())
    }

    fn import<'a>(id: &str) -> Result<RoleState<'a>, ObjectError> {
        Ok(RoleState {
            id: ValueString::from(id.to_string()),
            name: ValueString::from(id.to_string()),
            ..Default::default()
        })
    }

    async fn create<'a>(client: &ChefClient, state: &mut RoleState<'a>) -> Result<(), ObjectError> {
        let _: JsonValue = client
            .post(Scope::Organization, "roles", &state.to_role()?)
            .await?;
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &RoleState<'a>,
    ) -> Result<RoleState<'a>, ObjectError> {
        let name = required("id", &state.id)?;
        let role: Role = client
            .get(Scope::Organization, &format!("roles/{name}"))
            .await?;

        Ok(RoleState {
            id: state.id.clone(),
            name: reconcile_text(state.name.clone(), &role.name),
            description: reconcile_text(state.description.clone(), &role.description),
            default_attributes_json: json::reconcile(
                state.default_attributes_json.clone(),
                &JsonValue::Object(role.default_attributes),
            ),
            override_attributes_json: json::reconcile(
                state.override_attributes_json.clone(),
                &JsonValue::Object(role.override_attributes),
            ),
            env_run_lists_json: reconcile_env_run_lists(
                state.env_run_lists_json.clone(),
                &role.env_run_lists,
            )?,
            run_list: run_list::reconcile(state.run_list.clone(), &role.run_list),
        })
    }

    async fn update<'a>(client: &ChefClient, state: &RoleState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        let _: JsonValue = client
            .put(Scope::Organization, &format!("roles/{name}"), &state.to_role()?)
            .await?;
        Ok(())
    }

    async fn delete<'a>(client: &ChefClient, state: &RoleState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        client
            .delete(Scope::Organization, &format!("roles/{name}"))
            .await?;
        Ok(())
    }
}
