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

//! Drives resources through the Terraform lifecycle against an in-memory server

use tf_provider::value::ValueEmpty;
use tf_provider::{AttributePath, Diagnostics, Resource};

use crate::api::memory::MemoryTransport;
use crate::api::ClientHandle;
use crate::lifecycle::{ChefObject, ChefResource};

pub(crate) struct Harness {
    pub memory: MemoryTransport,
    pub client: ClientHandle,
}

pub(crate) struct Plan<S> {
    pub state: S,
    pub replace: Vec<AttributePath>,
}

impl Harness {
    pub async fn new() -> Self {
        let memory = MemoryTransport::default();
        let client = ClientHandle::default();
        client.set(memory.client()).await;
        Self { memory, client }
    }

    pub fn resource<O: ChefObject>(&self) -> ChefResource<O> {
        ChefResource::new(self.client.clone())
    }

    pub async fn validate<O: ChefObject>(&self, config: O::State<'static>) -> Diagnostics {
        let mut diags = Diagnostics::default();
        Resource::validate(&self.resource::<O>(), &mut diags, config).await;
        diags
    }

    pub async fn plan_create<O: ChefObject>(&self, config: O::State<'static>) -> O::State<'static> {
        let mut diags = Diagnostics::default();
        let (planned, _) = Resource::plan_create(
            &self.resource::<O>(),
            &mut diags,
            config.clone(),
            config,
            ValueEmpty::Null,
        )
        .await
        .unwrap();
        assert!(diags.errors.is_empty(), "{diags:?}");
        planned
    }

    /// Validate, plan and create an object from its configuration
    pub async fn create<O: ChefObject>(
        &self,
        config: O::State<'static>,
    ) -> Result<O::State<'static>, Diagnostics> {
        let diags = self.validate::<O>(config.clone()).await;
        if !diags.errors.is_empty() {
            return Err(diags);
        }

        let planned = self.plan_create::<O>(config.clone()).await;
        let mut diags = Diagnostics::default();
        let created = Resource::create(
            &self.resource::<O>(),
            &mut diags,
            planned,
            config,
            ValueEmpty::Null,
            ValueEmpty::Null,
        )
        .await;
        match created {
            Some((state, _)) if diags.errors.is_empty() => Ok(state),
            _ => Err(diags),
        }
    }

    pub async fn plan_update<O: ChefObject>(
        &self,
        prior: O::State<'static>,
        config: O::State<'static>,
    ) -> Plan<O::State<'static>> {
        let mut diags = Diagnostics::default();
        let (state, _, replace) = Resource::plan_update(
            &self.resource::<O>(),
            &mut diags,
            prior,
            config.clone(),
            config,
            ValueEmpty::Null,
            ValueEmpty::Null,
        )
        .await
        .unwrap();
        assert!(diags.errors.is_empty(), "{diags:?}");
        Plan { state, replace }
    }

    /// Plan and apply an in-place update
    pub async fn update<O: ChefObject>(
        &self,
        prior: O::State<'static>,
        config: O::State<'static>,
    ) -> Result<O::State<'static>, Diagnostics> {
        let plan = self.plan_update::<O>(prior.clone(), config.clone()).await;
        assert!(plan.replace.is_empty(), "unexpected replacement: {:?}", plan.replace);

        let mut diags = Diagnostics::default();
        let updated = Resource::update(
            &self.resource::<O>(),
            &mut diags,
            prior,
            plan.state,
            config,
            ValueEmpty::Null,
            ValueEmpty::Null,
        )
        .await;
        match updated {
            Some((state, _)) if diags.errors.is_empty() => Ok(state),
            _ => Err(diags),
        }
    }

    pub async fn read<O: ChefObject>(
        &self,
        state: O::State<'static>,
    ) -> (Option<O::State<'static>>, Diagnostics) {
        let mut diags = Diagnostics::default();
        let state = Resource::read(
            &self.resource::<O>(),
            &mut diags,
            state,
            ValueEmpty::Null,
            ValueEmpty::Null,
        )
        .await
        .map(|(state, _)| state);
        (state, diags)
    }

    pub async fn destroy<O: ChefObject>(&self, state: O::State<'static>) -> Diagnostics {
        let mut diags = Diagnostics::default();
        Resource::destroy(
            &self.resource::<O>(),
            &mut diags,
            state,
            ValueEmpty::Null,
            ValueEmpty::Null,
        )
        .await;
        diags
    }

    pub async fn import<O: ChefObject>(
        &self,
        id: &str,
    ) -> Result<O::State<'static>, Diagnostics> {
        let mut diags = Diagnostics::default();
        let imported = Resource::import(&self.resource::<O>(), &mut diags, id.to_string()).await;
        match imported {
            Some((state, _)) if diags.errors.is_empty() => Ok(state),
            _ => Err(diags),
        }
    }
}
