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

pub const NEVER_EXPIRES: &str = "infinity";

/// Public key attached to a client or a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessKey {
    pub name: String,
    pub public_key: String,
    pub expiration_date: String,
}

impl Default for AccessKey {
    fn default() -> Self {
        Self {
            name: String::new(),
            public_key: String::new(),
            expiration_date: String::from(NEVER_EXPIRES),
        }
    }
}
