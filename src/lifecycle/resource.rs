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

use std::marker::PhantomData;

use async_trait::async_trait;
use tf_provider::schema::Schema;
use tf_provider::value::{ValueEmpty, ValueString};
use tf_provider::{AttributePath, Diagnostics, Resource};
use tracing::{debug, info, warn};

use crate::api::ClientHandle;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{report, ChefObject, ObjectState};

/// Terraform resource managing objects of type `O`
pub(crate) struct ChefResource<O: ChefObject> {
    client: ClientHandle,
    object: PhantomData<fn() -> O>,
}

impl<O: ChefObject> ChefResource<O> {
    pub(crate) fn new(client: ClientHandle) -> Self {
        Self {
            client,
            object: PhantomData,
        }
    }
}

#[async_trait]
impl<O: ChefObject> Resource for ChefResource<O> {
    type State<'a> = O::State<'a>;
    type PrivateState<'a> = ValueEmpty;
    type ProviderMetaState<'a> = ValueEmpty;

    fn schema(&self, _diags: &mut Diagnostics) -> Option<Schema> {
        Some(<O::State<'static> as WithSchema>::schema())
    }

    async fn validate<'a>(&self, diags: &mut Diagnostics, config: Self::State<'a>) -> Option<()> {
        config.validate(diags, Default::default());

        if diags.errors.is_empty() {
            Some(())
        } else {
            None
        }
    }

    async fn read<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some(client) = self.client.get(diags).await else {
            return Some((state, private_state));
        };

        match O::read(&client, &state).await {
            Ok(state) => Some((state, private_state)),
            Err(err) if err.is_not_found() => {
                warn!(
                    kind = O::KIND,
                    id = %state.id(),
                    "object no longer exists, removing it from state"
                );
                None
            }
            Err(err) => {
                report(diags, format!("Unable to read {}", O::KIND), err);
                Some((state, private_state))
            }
        }
    }

    async fn plan_create<'a>(
        &self,
        diags: &mut Diagnostics,
        _proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let mut state = config_state;
        state.normalize(diags);
        *state.id_mut() = ValueString::Unknown;
        state.computed(None);

        Some((state, Default::default()))
    }

    async fn plan_update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        _proposed_state: Self::State<'a>,
        config_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>, Vec<AttributePath>)> {
        let mut state = config_state;
        state.normalize(diags);
        *state.id_mut() = prior_state.id().clone();
        state.computed(Some(&prior_state));

        let replace = state.replace_triggers(&prior_state);
        if state != prior_state {
            state.computed(None);
        }

        Some((state, prior_private_state, replace))
    }

    async fn plan_destroy<'a>(
        &self,
        _diags: &mut Diagnostics,
        _prior_state: Self::State<'a>,
        prior_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<Self::PrivateState<'a>> {
        Some(prior_private_state)
    }

    async fn create<'a>(
        &self,
        diags: &mut Diagnostics,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags).await?;
        let mut state = planned_state;

        let id = match O::identify(&state) {
            Ok(id) => id,
            Err(err) => {
                report(diags, format!("Invalid {}", O::KIND), err);
                return None;
            }
        };
        if let Err(err) = O::create(&client, &mut state).await {
            report(diags, format!("Unable to create {}", O::KIND), err);
            return None;
        }
        info!(kind = O::KIND, id = %id, "created");
        *state.id_mut() = ValueString::from(id);

        match O::read(&client, &state).await {
            Ok(state) => Some((state, planned_private_state)),
            Err(err) => {
                report(diags, format!("Unable to read {}", O::KIND), err);
                Some((state, planned_private_state))
            }
        }
    }

    async fn update<'a>(
        &self,
        diags: &mut Diagnostics,
        prior_state: Self::State<'a>,
        planned_state: Self::State<'a>,
        _config_state: Self::State<'a>,
        planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let Some(client) = self.client.get(diags).await else {
            return Some((prior_state, planned_private_state));
        };

        if let Err(err) = O::update(&client, &planned_state).await {
            report(diags, format!("Unable to update {}", O::KIND), err);
            return Some((prior_state, planned_private_state));
        }
        debug!(kind = O::KIND, id = %planned_state.id(), "updated");

        match O::read(&client, &planned_state).await {
            Ok(state) => Some((state, planned_private_state)),
            Err(err) => {
                report(diags, format!("Unable to read {}", O::KIND), err);
                Some((planned_state, planned_private_state))
            }
        }
    }

    async fn destroy<'a>(
        &self,
        diags: &mut Diagnostics,
        state: Self::State<'a>,
        _planned_private_state: Self::PrivateState<'a>,
        _provider_meta_state: Self::ProviderMetaState<'a>,
    ) -> Option<()> {
        let client = self.client.get(diags).await?;

        match O::delete(&client, &state).await {
            Ok(()) => {
                info!(kind = O::KIND, id = %state.id(), "deleted");
                Some(())
            }
            Err(err) => {
                report(diags, format!("Unable to delete {}", O::KIND), err);
                None
            }
        }
    }

    async fn import<'a>(
        &self,
        diags: &mut Diagnostics,
        id: String,
    ) -> Option<(Self::State<'a>, Self::PrivateState<'a>)> {
        let client = self.client.get(diags).await?;

        let state = match O::import(&id) {
            Ok(state) => state,
            Err(err) => {
                report(diags, format!("Invalid {} import id", O::KIND), err);
                return None;
            }
        };

        match O::read(&client, &state).await {
            Ok(state) => Some((state, Default::default())),
            Err(err) if err.is_not_found() => {
                diags.root_error(
                    format!("Cannot import {}", O::KIND),
                    format!("{} {} does not exist", O::KIND, state.id()),
                );
                None
            }
            Err(err) => {
                report(diags, format!("Unable to read {}", O::KIND), err);
                None
            }
        }
    }
}
