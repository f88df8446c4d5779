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

//! Provider block and its resolution into connection settings

use std::env;
use std::fmt;

use serde::{Deserialize, Serialize};
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{ValueBool, ValueString};
use tf_provider::{map, AttributePath, Diagnostics};
use url::Url;

use crate::api::{ApiError, ChefClient, HttpTransport};
use crate::utils::{WithSchema, WithValidate};

pub(crate) const SERVER_URL_ENV: &str = "CHEF_SERVER_URL";
pub(crate) const CLIENT_NAME_ENV: &str = "CHEF_CLIENT_NAME";
pub(crate) const KEY_MATERIAL_ENV: &str = "CHEF_KEY_MATERIAL";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProviderConfig<'a> {
    #[serde(borrow = "'a")]
    pub server_url: ValueString<'a>,
    pub client_name: ValueString<'a>,
    pub key_material: ValueString<'a>,
    pub allow_unverified_ssl: ValueBool,
}

impl WithSchema for ProviderConfig<'_> {
    fn schema() -> Schema {
        Schema {
            version: 1,
            block: Block {
                version: 1,
                attributes: map! {
                    "server_url" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!(
                            "URL of the organization, like https://chef.example.com/organizations/acme/ (env: {SERVER_URL_ENV})"
                        )),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "client_name" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!(
                            "Name of the API client signing the requests (env: {CLIENT_NAME_ENV})"
                        )),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                    "key_material" => Attribute {
                        attr_type: AttributeType::String,
                        description: Description::plain(format!(
                            "PEM encoded private key of the API client (env: {KEY_MATERIAL_ENV})"
                        )),
                        constraint: AttributeConstraint::Optional,
                        sensitive: true,
                        ..Default::default()
                    },
                    "allow_unverified_ssl" => Attribute {
                        attr_type: AttributeType::Bool,
                        description: Description::plain("Accept invalid TLS certificates from the server (default: false)"),
                        constraint: AttributeConstraint::Optional,
                        ..Default::default()
                    },
                },
                description: Description::plain("Chef Infra Server"),
                ..Default::default()
            },
        }
    }
}

impl WithValidate for ProviderConfig<'_> {
    fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
        if let Some(url) = self.server_url.as_deref_option() {
            if let Err(err) = Url::parse(url) {
                diags.error(
                    "Invalid server URL",
                    format!("`{url}` is not a valid URL: {err}"),
                    attr_path.attribute("server_url"),
                );
            }
        }
    }
}

/// Resolved provider settings
#[derive(Clone, PartialEq)]
pub(crate) struct ChefSettings {
    pub server_url: Url,
    pub client_name: String,
    pub key_material: String,
    pub allow_unverified_ssl: bool,
}

impl fmt::Debug for ChefSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChefSettings")
            .field("server_url", &self.server_url.as_str())
            .field("client_name", &self.client_name)
            .field("allow_unverified_ssl", &self.allow_unverified_ssl)
            .finish_non_exhaustive()
    }
}

impl ChefSettings {
    pub fn connect(&self) -> Result<ChefClient, ApiError> {
        let transport = HttpTransport::new(
            &self.server_url,
            &self.client_name,
            &self.key_material,
            self.allow_unverified_ssl,
        )?;
        Ok(ChefClient::new(transport))
    }
}

/// Attribute value, or the environment variable when the attribute is null
fn setting(
    diags: &mut Diagnostics,
    name: &'static str,
    value: &ValueString,
    variable: &str,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Option<String> {
    match value {
        ValueString::Value(value) if !value.is_empty() => Some(value.to_string()),
        ValueString::Unknown => {
            diags.error(
                "Unknown provider setting",
                format!("{name} must be known when the provider is configured"),
                AttributePath::new(name),
            );
            None
        }
        _ => match lookup(variable).filter(|value| !value.is_empty()) {
            Some(value) => Some(value),
            None => {
                diags.error(
                    "Missing provider setting",
                    format!(
                        "{name} must be set in the provider block \
                         or with the {variable} environment variable"
                    ),
                    AttributePath::new(name),
                );
                None
            }
        },
    }
}

impl ProviderConfig<'_> {
    pub fn resolve(&self, diags: &mut Diagnostics) -> Option<ChefSettings> {
        self.resolve_with(diags, |variable| env::var(variable).ok())
    }

    pub fn resolve_with(
        &self,
        diags: &mut Diagnostics,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<ChefSettings> {
        let server_url = setting(
            diags,
            "server_url",
            &self.server_url,
            SERVER_URL_ENV,
            &lookup,
        );
        let client_name = setting(
            diags,
            "client_name",
            &self.client_name,
            CLIENT_NAME_ENV,
            &lookup,
        );
        let key_material = setting(
            diags,
            "key_material",
            &self.key_material,
            KEY_MATERIAL_ENV,
            &lookup,
        );

        let server_url = match Url::parse(&server_url?) {
            Ok(url) => url,
            Err(err) => {
                diags.error(
                    "Invalid server URL",
                    err.to_string(),
                    AttributePath::new("server_url"),
                );
                return None;
            }
        };

        Some(ChefSettings {
            server_url,
            client_name: client_name?,
            key_material: key_material?,
            allow_unverified_ssl: self.allow_unverified_ssl.unwrap_or_default(),
        })
    }
}
