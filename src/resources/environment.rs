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
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueBool, ValueMap, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};
use tracing::info;

use crate::api::{ApiError, ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::{json, ObjectError};
use crate::models::Environment;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{
    default_to, reconcile_text, replace_if_changed, required, validate_name, MANAGED_BY_TERRAFORM,
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct EnvironmentState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub allow_overwrite: ValueBool,
    pub default_attributes_json: ValueString<'a>,
    pub override_attributes_json: ValueString<'a>,
    pub cookbook_constraints: ValueMap<'a, ValueString<'a>>,
    pub json: ValueString<'a>,
}

impl WithSchema for EnvironmentState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the environment"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Unique name of the environment"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "description" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Description of the environment (default: \"Managed by Terraform\")"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                    "allow_overwrite" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Take over an existing environment with the same name instead of failing (default: false)"),
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
                    "cookbook_constraints" => Attribute {
                        attr_type: AttributeType::Map(AttributeType::String.into()),
                        description: Description::plain("Version constraint of each cookbook, like \"= 1.0.0\""),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "json" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Environment as stored by the Chef Server"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                description: Description::plain("Chef environment"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for EnvironmentState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        default_to(&mut self.description, MANAGED_BY_TERRAFORM);
        default_to(&mut self.default_attributes_json, "{}");
        default_to(&mut self.override_attributes_json, "{}");
        if self.allow_overwrite.is_null() {
            self.allow_overwrite = Value::Value(false);
        }
    }
}

impl WithValidate for EnvironmentState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.clone().attribute("name"), &self.name);
        json::validate(
            diags,
            attr_path.clone().attribute("default_attributes_json"),
            &self.default_attributes_json,
        );
        json::validate(
            diags,
            attr_path.attribute("override_attributes_json"),
            &self.override_attributes_json,
        );
    }
}

impl<'a> ObjectState<'a> for EnvironmentState<'a> {
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
    fn computed(&mut self, prior: Option<&Self>) {
        self.json = match prior {
            Some(prior) => prior.json.clone(),
            None => ValueString::Unknown,
        };
    }
}

impl EnvironmentState<'_> {
    fn to_environment(&self) -> Result<Environment, ObjectError> {
        Ok(Environment {
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
            cookbook_versions: decode_constraints(&self.cookbook_constraints)?,
            ..Default::default()
        })
    }
}

fn decode_constraints(
    value: &ValueMap<'_, ValueString<'_>>,
) -> Result<BTreeMap<String, String>, ObjectError> {
    value
        .iter()
        .flatten()
        .map(|(cookbook, constraint)| match constraint.as_deref_option() {
            Some(constraint) => Ok((cookbook.to_string(), constraint.to_string())),
            None => Err(ObjectError::invalid(
                "cookbook_constraints",
                format!("constraint of {cookbook} must be known"),
            )),
        })
        .collect()
}

/// Keep a null map when the server has no constraint
fn encode_constraints<'a>(
    prior: &ValueMap<'a, ValueString<'a>>,
    server: &BTreeMap<String, String>,
) -> ValueMap<'a, ValueString<'a>> {
    if prior.is_null() && server.is_empty() {
        return Value::Null;
    }
    Value::Value(
        server
            .iter()
            .map(|(cookbook, constraint)| {
                (
                    Cow::Owned(cookbook.clone()),
                    Value::Value(Cow::Owned(constraint.clone())),
                )
            })
            .collect(),
    )
}

pub(crate) struct EnvironmentObject;

#[async_trait]
impl ChefObject for EnvironmentObject {
    const KIND: &'static str = "environment";
    type State<'a> = EnvironmentState<'a>;

    fn identify(state: &EnvironmentState<'_>) -> Result<String, ObjectError> {
        Ok(required("name", &state.name)?.to_string())
    }

    fn import<'a>(id: &str) -> Result<EnvironmentState<'a>, ObjectError> {
        Ok(EnvironmentState {
            id: ValueString::from(id.to_string()),
            name: ValueString::from(id.to_string()),
            ..Default::default()
        })
    }

    async fn create<'a>(
        client: &ChefClient,
        state: &mut EnvironmentState<'a>,
    ) -> Result<(), ObjectError> {
        let environment = state.to_environment()?;
        let created: Result<JsonValue, _> = client
            .post(Scope::Organization, "environments", &environment)
            .await;
        match created {
            Ok(_) => Ok(()),
            Err(err) if err.is_conflict() && state.allow_overwrite.unwrap_or_default() => {
                info!(name = %environment.name, "environment exists, overwriting it");
                let _: JsonValue = client
                    .put(
                        Scope::Organization,
                        &format!("environments/{}", environment.name),
                        &environment,
                    )
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &EnvironmentState<'a>,
    ) -> Result<EnvironmentState<'a>, ObjectError> {
        let name = required("id", &state.id)?;
        let raw: JsonValue = client
            .get(Scope::Organization, &format!("environments/{name}"))
            .await?;
        let remote: Environment = serde_json::from_value(raw.clone()).map_err(ApiError::from)?;

        Ok(EnvironmentState {
            id: state.id.clone(),
            name: reconcile_text(state.name.clone(), &remote.name),
            description: reconcile_text(state.description.clone(), &remote.description),
            allow_overwrite: Value::Value(state.allow_overwrite.unwrap_or_default()),
            default_attributes_json: json::reconcile(
                state.default_attributes_json.clone(),
                &JsonValue::Object(remote.default_attributes),
            ),
            override_attributes_json: json::reconcile(
                state.override_attributes_json.clone(),
                &JsonValue::Object(remote.override_attributes),
            ),
            cookbook_constraints: encode_constraints(
                &state.cookbook_constraints,
                &remote.cookbook_versions,
            ),
            json: json::reconcile(state.json.clone(), &raw),
        })
    }

    async fn update<'a>(
        client: &ChefClient,
        state: &EnvironmentState<'a>,
    ) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        let _: JsonValue = client
            .put(
                Scope::Organization,
                &format!("environments/{name}"),
                &state.to_environment()?,
            )
            .await?;
        Ok(())
    }

    async fn delete<'a>(
        client: &ChefClient,
        state: &EnvironmentState<'a>,
    ) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        client
            .delete(Scope::Organization, &format!("environments/{name}"))
            .await?;
        Ok(())
    }
}
