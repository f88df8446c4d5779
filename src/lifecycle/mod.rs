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

//! Generic Terraform lifecycle of a Chef object

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tf_provider::value::ValueString;
use tf_provider::{AttributePath, Diagnostics};

use crate::api::ChefClient;
use crate::mapper::ObjectError;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

mod resource;

pub(crate) use resource::ChefResource;

/// Terraform state of a Chef object
pub(crate) trait ObjectState<'a>:
    WithSchema
    + WithNormalize
    + WithValidate
    + Serialize
    + Deserialize<'a>
    + Clone
    + PartialEq
    + Debug
    + Default
    + Send
    + Sync
{
    fn id(&self) -> &ValueString<'a>;
    fn id_mut(&mut self) -> &mut ValueString<'a>;

    /// Attributes whose change requires a new object
    fn replace_triggers(&self, prior: &Self) -> Vec<AttributePath>;

    /// Copy the attributes computed by the server from `prior`,
    /// or mark them unknown when there is no usable prior value
    fn computed(&mut self, prior: Option<&Self>) {
        _ = prior;
    }
}

/// Chef object managed through the Chef Server API
#[async_trait]
pub(crate) trait ChefObject: Send + Sync + 'static {
    /// Human readable kind, used in diagnostics
    const KIND: &'static str;

    type State<'a>: ObjectState<'a>;

    /// Terraform id of the object described by `state`
    fn identify(state: &Self::State<'_>) -> Result<String, ObjectError>;

    /// State holding only the id and identity parsed from an import id
    fn import<'a>(id: &str) -> Result<Self::State<'a>, ObjectError>;

    /// Create the object, filling the attributes returned by the server
    async fn create<'a>(
        client: &ChefClient,
        state: &mut Self::State<'a>,
    ) -> Result<(), ObjectError>;

    /// Current state of the object on the server
    ///
    /// `state` is the known state, the values it holds are kept
    /// when they are equivalent to the server ones.
    async fn read<'a>(
        client: &ChefClient,
        state: &Self::State<'a>,
    ) -> Result<Self::State<'a>, ObjectError>;

    /// Objects whose attributes all force replacement keep this default
    async fn update<'a>(client: &ChefClient, state: &Self::State<'a>) -> Result<(), ObjectError> {
        _ = (client, state);
        Err(ObjectError::Immutable { kind: Self::KIND })
    }

    async fn delete<'a>(client: &ChefClient, state: &Self::State<'a>) -> Result<(), ObjectError>;
}

/// Record `err` in `diags`, attached to the faulty attribute when known
pub(crate) fn report(diags: &mut Diagnostics, summary: String, err: ObjectError) {
    match err.attribute() {
        Some(attribute) => diags.error(summary, err.to_string(), attribute),
        None => diags.root_error(summary, err.to_string()),
    }
}
