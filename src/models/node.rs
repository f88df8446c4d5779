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

use serde::{Deserialize, Serialize};

use super::JsonObject;

chef_json_type!(NodeJsonClass, "Chef::Node");
chef_json_type!(NodeChefType, "node");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Node {
    pub name: String,
    pub(crate) chef_type: NodeChefType,
    pub(crate) json_class: NodeJsonClass,
    pub chef_environment: String,
    pub run_list: Vec<String>,
    pub automatic: JsonObject,
    pub normal: JsonObject,
    pub default: JsonObject,
    #[serde(rename = "override")]
    pub overrides: JsonObject,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            name: String::new(),
            chef_type: Default::default(),
            json_class: Default::default(),
            chef_environment: String::from("_default"),
            run_list: Vec::new(),
            automatic: JsonObject::new(),
            normal: JsonObject::new(),
            default: JsonObject::new(),
            overrides: JsonObject::new(),
        }
    }
}
