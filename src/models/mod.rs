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

//! Chef Server objects as exchanged over the REST API

use serde_json::{Map, Value as JsonValue};

macro_rules! chef_json_type {
    ($name:ident, $value:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl Default for $name {
            fn default() -> Self {
                Self(String::from($value))
            }
        }
    };
}

mod access_key;
mod client;
mod data_bag;
mod environment;
mod node;
mod role;
mod search;

pub use access_key::AccessKey;
pub use client::Client;
pub use data_bag::{DataBag, DataBagCreated};
pub use environment::Environment;
pub use node::Node;
pub use role::Role;
pub use search::{SearchQuery, SearchResult};

/// Free-form attribute tree of a Chef object
pub type JsonObject = Map<String, JsonValue>;
