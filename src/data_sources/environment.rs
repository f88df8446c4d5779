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

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::schema::Schema;
use tf_provider::value::{Value, ValueEmpty, ValueMap, ValueString};
use tf_provider::{AttributePath, DataSource, Diagnostics};

use crate::api::{ApiError, ChefClient, ClientHandle, Scope};
use crate::lifecycle::report;
use crate::mapper::{json, ObjectError};
use crate::models::Environment;
use crate::resources::{required, EnvironmentState};
use crate::utils::WithSchema;

use super::lookup_schema;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct EnvironmentLookupState<'a> {
    #[serde(borrow = "'a")]
    pub id: ValueString<'a>,
    pub name: ValueString<'a>,
    pub description: ValueString<'a>,
    pub default_attributes_json: ValueString<'a>,
    pub override_attributes_json: ValueString<'a>,
    pub cookbook_constraints: ValueMap<'a, ValueString<'a>>,
    pub json: ValueString<'a>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct EnvironmentDataSource {
    client: ClientHandle,
}

impl EnvironmentDataSource {
    pub(crate) fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

async fn fetch(
    client: &ChefClient,
    name: &ValueString<'_>,
) -> Result<(Environment, JsonValue), ObjectError> {
    let name = required("name", name)?;
    let raw: JsonValue = client
        .get(Scope::Organization, &format!("environments/{name}"))
        .await?;
    let environment = serde_json::from_value(raw.clone()).map_err(ApiError::from)?;
    Ok((environment, raw))
}

#[async_trait]
impl DataSource for EnvironmentDataSource {
    type State<'a> = EnvironmentLookupState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(lookup_schema(EnvironmentState::schema(), "Chef environment"))
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        if config.name.as_deref_option() == Some("") {
            diags.error_short("Name must not be empty", AttributePath::new("name"));
            return None;
        }
        Some(())
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        config: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::State<'a>> {
        let client = self.client.get(diags).await?;

        let fetched = fetch(&client, &config.name).await;
        let (environment, raw) = match fetched {
            Ok(fetched) => fetched,
            Err(err) => {
                report(diags, String::from("Unable to read environment"), err);
                return None;
            }
        };

        Some(EnvironmentLookupState {
            id: ValueString::from(environment.name.clone()),
            name: config.name,
            description: ValueString::from(environment.description),
            default_attributes_json: json::encode(&JsonValue::Object(
                environment.default_attributes,
            )),
            override_attributes_json: json::encode(&JsonValue::Object(
                environment.override_attributes,
            )),
            cookbook_constraints: Value::Value(
                environment
                    .cookbook_versions
                    .into_iter()
                    .map(|(cookbook, constraint)| {
                        (Cow::Owned(cookbook), ValueString::from(constraint))
                    })
                    .collect(),
            ),
            json: json::encode(&raw),
        })
    }
}
