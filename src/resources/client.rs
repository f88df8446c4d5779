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
use tf_provider::value::{Value, ValueBool, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};

use crate::api::{ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::ObjectError;
use crate::models::Client;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{reconcile_text, replace_if_changed, required, validate_name};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct ClientState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub validator: ValueBool,
}

impl WithSchema for ClientState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the client"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Unique name of the API client"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "validator" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Whether the client is a validator client (default: false)"),
                        constraint: AttributeConstraint::OptionalComputed,
                        ..Default::default()
                    },
                },
                description: Description::plain("API client registered on the Chef Server"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for ClientState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {
        if self.validator.is_null() {
            self.validator = Value::Value(false);
        }
    }
}

impl WithValidate for ClientState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.attribute("name"), &self.name);
    }
}

impl<'a> ObjectState<'a> for ClientState<'a> {
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

impl ClientState<'_> {
    fn to_client(&self) -> Result<Client, ObjectError> {
        Ok(Client {
            name: required("name", &self.name)?.to_string(),
            validator: self.validator.unwrap_or_default(),
            create_key: false,
        })
    }
}

pub(crate) struct ClientObject;

#[async_trait]
impl ChefObject for ClientObject {
    const KIND: &'static str = "client";
    type State<'a> = ClientState<'a>;

    fn identify(state: &ClientState<'_>) -> Result<String, ObjectError> {
        Ok(required("name", &state.name)?.to_string())
    }

    fn import<'a>(id: &str) -> Result<ClientState<'a>, ObjectError> {
        Ok(ClientState {
            id: ValueString::from(id.to_string()),
            name: ValueString::from(id.to_string()),
            ..Default::default()
        })
    }

    async fn create<'a>(
        client: &ChefClient,
        state: &mut ClientState<'a>,
    ) -> Result<(), ObjectError> {
        let _: JsonValue = client
            .post(Scope::Organization, "clients", &state.to_client()?)
            .await?;
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &ClientState<'a>,
    ) -> Result<ClientState<'a>, ObjectError> {
        let name = required("id", &state.id)?;
        let remote: Client = client
            .get(Scope::Organization, &format!("clients/{name}"))
            .await?;

        Ok(ClientState {
            id: state.id.clone(),
            name: reconcile_text(state.name.clone(), &remote.name),
            validator: Value::Value(remote.validator),
        })
    }

    async fn update<'a>(client: &ChefClient, state: &ClientState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        let _: JsonValue = client
            .put(Scope::Organization, &format!("clients/{name}"), &state.to_client()?)
            .await?;
        Ok(())
    }

    async fn delete<'a>(client: &ChefClient, state: &ClientState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        client
            .delete(Scope::Organization, &format!("clients/{name}"))
            .await?;
        Ok(())
    }
}
