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

//! Chef objects managed as Terraform resources

use std::borrow::Cow;

use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::lifecycle::ChefResource;
use crate::mapper::ObjectError;

mod client;
mod data_bag;
mod data_bag_item;
mod environment;
mod keys;
mod node;
mod role;
#[cfg(test)]
pub(crate) mod testing;

pub(crate) use client::ClientObject;
pub(crate) use data_bag::DataBagObject;
pub(crate) use data_bag_item::DataBagItemObject;
pub(crate) use environment::{EnvironmentObject, EnvironmentState};
pub(crate) use keys::{ClientKeyObject, UserKeyObject};
pub(crate) use node::{NodeObject, NodeState};
pub(crate) use role::RoleObject;

pub(crate) type ClientResource = ChefResource<ClientObject>;
pub(crate) type ClientKeyResource = ChefResource<ClientKeyObject>;
pub(crate) type UserKeyResource = ChefResource<UserKeyObject>;
pub(crate) type DataBagResource = ChefResource<DataBagObject>;
pub(crate) type DataBagItemResource = ChefResource<DataBagItemObject>;
pub(crate) type EnvironmentResource = ChefResource<EnvironmentObject>;
pub(crate) type NodeResource = ChefResource<NodeObject>;
pub(crate) type RoleResource = ChefResource<RoleObject>;

pub(crate) const MANAGED_BY_TERRAFORM: &str = "Managed by Terraform";

/// Value of a required identity attribute
pub(crate) fn required<'v>(
    field: &'static str,
    value: &'v ValueString,
) -> Result<&'v str, ObjectError> {
    match value.as_deref_option() {
        Some(text) if !text.is_empty() => Ok(text),
        Some(_) => Err(ObjectError::invalid(field, "must not be empty")),
        None => Err(ObjectError::invalid(field, "must be known")),
    }
}

/// Report empty identity attributes
pub(crate) fn validate_name(
    diags: &mut Diagnostics,
    attr_path: AttributePath,
    value: &ValueString,
) {
    if value.as_deref_option() == Some("") {
        diags.error_short("Name must not be empty", attr_path);
    }
}

/// Fill a null attribute with its default value
pub(crate) fn default_to<'a>(value: &mut ValueString<'a>, default: &'static str) {
    if value.is_null() {
        *value = ValueString::from(default);
    }
}

/// State value for a plain string read from the server
pub(crate) fn reconcile_text<'a>(prior: ValueString<'a>, server: &str) -> ValueString<'a> {
    if prior.as_deref_option() == Some(server) {
        prior
    } else {
        Value::Value(Cow::Owned(server.to_string()))
    }
}

/// Push `name` to `triggers` when the attribute changed
pub(crate) fn replace_if_changed<T: PartialEq>(
    triggers: &mut Vec<AttributePath>,
    name: &'static str,
    value: &T,
    prior: &T,
) {
    if value != prior {
        triggers.push(AttributePath::new(name));
    }
}
