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

use std::collections::HashMap;

use async_trait::async_trait;
use tf_provider::schema::Schema;
use tf_provider::value::ValueEmpty;
use tf_provider::{map, AttributePath, Diagnostics, DynamicDataSource, DynamicResource, Provider};
use tracing::info;

use crate::api::{ApiError, ClientHandle};
use crate::config::ProviderConfig;
use crate::data_sources::{EnvironmentDataSource, NodeDataSource, SearchDataSource};
use crate::resources::{
    ClientKeyResource, ClientResource, DataBagItemResource, DataBagResource, EnvironmentResource,
    NodeResource, RoleResource, UserKeyResource,
};
use crate::utils::{WithSchema, WithValidate};

#[derive(Debug, Default, Clone)]
pub struct ChefProvider {
    client: ClientHandle,
}

#[async_trait]
impl Provider for ChefProvider {
    type Config<'a> = ProviderConfig<'a>;
    type MetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(ProviderConfig::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::Config<'a>) -> Option<()> {
        config.validate(diags, AttributePath::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn configure<'a>(
        &self,
        diags: &mut Diagnostics,
        terraform_version: String,
        config: Self::Config<'a>,
    ) -> Option<()> {
        let settings = config.resolve(diags)?;

        let client = match settings.connect() {
            Ok(client) => client,
            Err(err @ ApiError::Signature(_)) => {
                diags.error(
                    "Invalid client key",
                    format!("Unable to load the private key of {}: {err}", settings.client_name),
                    AttributePath::new("key_material"),
                );
                return None;
            }
            Err(err) => {
                diags.root_error("Unable to configure the Chef client", err.to_string());
                return None;
            }
        };

        info!(
            server_url = %settings.server_url,
            client_name = %settings.client_name,
            terraform_version = %terraform_version,
            "provider configured"
        );
        self.client.set(client).await;
        Some(())
    }

    fn get_resources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicResource>>> {
        Some(map! {
            "chef_client"        => ClientResource::new(self.client.clone()),
            "chef_client_key"    => ClientKeyResource::new(self.client.clone()),
            "chef_user_key"      => UserKeyResource::new(self.client.clone()),
            "chef_data_bag"      => DataBagResource::new(self.client.clone()),
            "chef_data_bag_item" => DataBagItemResource::new(self.client.clone()),
            "chef_environment"   => EnvironmentResource::new(self.client.clone()),
            "chef_node"          => NodeResource::new(self.client.clone()),
            "chef_role"          => RoleResource::new(self.client.clone()),
        })
    }

    fn get_data_sources(
        &self,
        _diags: &mut Diagnostics,
    ) -> Option<HashMap<String, Box<dyn DynamicDataSource>>> {
        Some(map! {
            "chef_environment" => EnvironmentDataSource::new(self.client.clone()),
            "chef_node"        => NodeDataSource::new(self.client.clone()),
            "chef_search"      => SearchDataSource::new(self.client.clone()),
        })
    }
}
