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

use serde::{Deserialize, Serialize};

use super::JsonObject;

chef_json_type!(RoleJsonClass, "Chef::Role");
chef_json_type!(RoleChefType, "role");

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Role {
    pub name: String,
    pub description: String,
    pub(crate) chef_type: RoleChefType,
    pub(crate) json_class: RoleJsonClass,
    pub default_attributes: JsonObject,
    pub override_attributes: JsonObject,
    pub run_list: Vec<String>,
    /// Per environment run lists
    pub env_run_lists: BTreeMap<String, Vec<String>>,
}
