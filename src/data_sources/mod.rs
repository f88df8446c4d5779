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

use tf_provider::schema::{AttributeConstraint, Description, Schema};

mod environment;
mod node;
mod search;

pub(crate) use environment::EnvironmentDataSource;
pub(crate) use node::NodeDataSource;
pub(crate) use search::SearchDataSource;

/// Attributes that only steer how a resource writes its object
const WRITE_ONLY: &[&str] = &["allow_overwrite"];

/// Schema of a lookup by name, derived from the schema of the managed object
fn lookup_schema(mut schema: Schema, description: &str) -> Schema {
    schema
        .block
        .attributes
        .retain(|name, _| !WRITE_ONLY.contains(&name.as_str()));
    for (name, attribute) in schema.block.attributes.iter_mut() {
        attribute.constraint = if name == "name" {
            AttributeConstraint::Required
        } else {
            AttributeConstraint::Computed
        };
    }
    schema.block.description = Description::plain(description);
    schema
}
