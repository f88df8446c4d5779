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

//! Conversions between Terraform attribute values and Chef objects

use thiserror::Error;
use tf_provider::AttributePath;

use crate::api::ApiError;

pub mod json;
pub mod run_list;

/// Failure while mapping or applying a Chef object
#[derive(Debug, Error)]
pub enum ObjectError {
    /// Attribute holds malformed JSON
    #[error("{field} is not valid JSON: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// Attribute is well formed but not acceptable
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("{kind} cannot be updated in place")]
    Immutable { kind: &'static str },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ObjectError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }

    /// Attribute the error is attached to, if any
    pub fn attribute(&self) -> Option<AttributePath> {
        match self {
            Self::Decode { field, .. } | Self::Invalid { field, .. } => {
                Some(AttributePath::new(*field))
            }
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(err) if err.is_not_found())
    }
}
