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
use crate::mapper::ObjectError;
use crate::models::{DataBag, DataBagCreated};
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{reconcile_text, replace_if_changed, required, validate_name};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct DataBagState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub api_uri: ValueString<'a>,
}

impl WithSchema for DataBagState<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "id" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Name of the data bag"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                    "name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("Unique name of the data bag"),
                        constraint: AttributeConstraint::Required,
                        ..Default::default()
                    },
                    "api_uri" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain("URL of the data bag in the Chef Server API"),
                        constraint: AttributeConstraint::Computed,
                        ..Default::default()
                    },
                },
                description: Description::plain("Data bag, a container of JSON items"),
                ..Default::default()
            },
        }
    }
}

impl WithNormalize for DataBagState<'_> {
    fn normalize(&mut self, _diags: &mut Diagnostics) {}
}

impl WithValidate for DataBagState<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        validate_name(diags, attr_path.attribute("name"), &self.name);
    }
}

impl<'a> ObjectState<'a> for DataBagState<'a> {
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
        self.api_uri = match prior {
            Some(prior) => prior.api_uri.clone(),
            None => ValueString::Unknown,
        };
    }
}

pub(crate) struct DataBagObject;

#[async_trait]
impl ChefObject for DataBagObject {
    const KIND: &'static str = "data bag";
    type State<'a> = DataBagState<'a>;

    fn identify(state: &DataBagState<'_>) -> Result<String, ObjectError> {
        Ok(required("name", &state.name)?.to_string())
    }

    fn import<'a>(id: &str) -> Result<DataBagState<'a>, ObjectError> {
        Ok(DataBagState {
            id: ValueString::from(id.to_string()),
            name: ValueString::from(id.to_string()),
            ..Default::default()
        })
    }

    async fn create<'a>(
        client: &ChefClient,
        state: &mut DataBagState<'a>,
    ) -> Result<(), ObjectError> {
        let body = DataBag {
            name: required("name", &state.name)?.to_string(),
        };
        let created: DataBagCreated = client.post(Scope::Organization, "data", &body).await?;
        state.api_uri = ValueString::from(created.uri);
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &DataBagState<'a>,
    ) -> Result<DataBagState<'a>, ObjectError> {
        let name = required("id", &state.id)?;
        let path = format!("data/{name}");
        // the response lists the items, only the existence of the bag matters
        let _: JsonValue = client.get(Scope::Organization, &path).await?;

        let api_uri = if state.api_uri.is_value() {
            state.api_uri.clone()
        } else {
            ValueString::from(client.endpoint(Scope::Organization, &path)?)
        };
        Ok(DataBagState {
            id: state.id.clone(),
            name: reconcile_text(state.name.clone(), name),
            api_uri,
        })
    }

    async fn delete<'a>(client: &ChefClient, state: &DataBagState<'a>) -> Result<(), ObjectError> {
        let name = required("id", &state.id)?;
        client
            .delete(Scope::Organization, &format!("data/{name}"))
            .await?;
        Ok(())
    }
}
