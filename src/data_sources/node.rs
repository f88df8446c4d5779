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
use tf_provider::schema::Schema;
use tf_provider::value::{ValueEmpty, ValueString};
use tf_provider::{AttributePath, DataSource, Diagnostics};
use tracing::debug;

use crate::api::{ChefClient, ClientHandle, Scope};
use crate::lifecycle::report;
use crate::mapper::ObjectError;
use crate::models::Node;
use crate::resources::{required, NodeState};
use crate::utils::WithSchema;

use super::lookup_schema;

#[derive(Debug, Default, Clone)]
pub(crate) struct NodeDataSource {
    client: ClientHandle,
}

impl NodeDataSource {
    pub(crate) fn new(client: ClientHandle) -> Self {
        Self { client }
    }
}

async fn fetch(client: &ChefClient, name: &ValueString<'_>) -> Result<Node, ObjectError> {
    let name = required("name", name)?;
    Ok(client.get(Scope::Organization, &format!("nodes/{name}")).await?)
}

#[async_trait]
impl DataSource for NodeDataSource {
    type State<'a> = NodeState<'a>;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(lookup_schema(NodeState::schema(), "Node registered on the Chef Server"))
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

        let node = fetch(&client, &config.name).await;
        match node {
            Ok(node) => {
                debug!(name = %node.name, "node found");
                let lookup = NodeState {
                    id: config.name.clone(),
                    name: config.name,
                    ..Default::default()
                };
                Some(lookup.reconcile(node))
            }
            Err(err) => {
                report(diags, String::from("Unable to read node"), err);
                None
            }
        }
    }
}
