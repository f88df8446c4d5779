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

//! Public keys attached to clients and users
//!
//! A key is identified by `<owner>+<key_name>`. Client keys live in the
//! organization, user keys on the server-global API.

use std::borrow::Cow;
use std::marker::PhantomData;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::map;
use tf_provider::schema::{
    Attribute, AttributeConstraint, AttributeType, Block, Description, Schema,
};
use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use crate::api::{ChefClient, Scope};
use crate::lifecycle::{ChefObject, ObjectState};
use crate::mapper::ObjectError;
use crate::models::AccessKey;
use crate::utils::{WithNormalize, WithSchema, WithValidate};

use super::{default_to, reconcile_text, replace_if_changed, required, validate_name};

const DEFAULT_KEY_NAME: &str = "default";

/// Location of a key on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyRef<'s> {
    scope: Scope,
    /// `clients` or `users`
    collection: &'static str,
    owner: &'s str,
    name: &'s str,
}

impl KeyRef<'_> {
    fn id(&self) -> String {
        format!("{}+{}", self.owner, self.name)
    }

    fn keys_path(&self) -> String {
        format!("{}/{}/keys", self.collection, self.owner)
    }

    fn path(&self) -> String {
        format!("{}/{}", self.keys_path(), self.name)
    }
}

/// Split a key id into its owner and key name
fn split_id<'s>(field: &'static str, id: &'s str) -> Result<(&'s str, &'s str), ObjectError> {
    match id.split_once('+') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok((owner, name)),
        _ => Err(ObjectError::invalid(
            field,
            format!("`{id}` is not a key id, expected <owner>+<key_name>"),
        )),
    }
}

fn key_schema(owner: &'static str, owner_description: &'static str) -> Schema {
    Schema {
        version: 1,
        block: Block {
            version: 1,
            attributes: map! {
                "id" => Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain(format!(
                        "Key id, formatted as <{owner}>+<key_name>"
                    )),
                    constraint: AttributeConstraint::Computed,
                    ..Default::default()
                },
                owner => Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain(owner_description),
                    constraint: AttributeConstraint::Required,
                    ..Default::default()
                },
                "key_name" => Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain("Name of the key (default: \"default\")"),
                    constraint: AttributeConstraint::OptionalComputed,
                    ..Default::default()
                },
                "public_key" => Attribute {
                    attr_type: AttributeType::String,
                    description: Description::plain("PEM encoded public key"),
                    constraint: AttributeConstraint::Required,
                    ..Default::default()
                },
            },
            description: Description::plain(format!("Public key of a Chef {owner}")),
            ..Default::default()
        },
    }
}

/// The server may reformat the PEM text, surrounding whitespace is not significant
fn reconcile_public_key<'a>(prior: ValueString<'a>, server: &str) -> ValueString<'a> {
    if prior.as_deref_option().map(str::trim) == Some(server.trim()) {
        prior
    } else {
        Value::Value(Cow::Owned(server.to_string()))
    }
}

/// Terraform state of a key, whatever its owner attribute is named
pub(crate) trait KeyState<'a>: ObjectState<'a> {
    fn from_parts(
        id: ValueString<'a>,
        owner: ValueString<'a>,
        key_name: ValueString<'a>,
        public_key: ValueString<'a>,
    ) -> Self;
    fn owner(&self) -> &ValueString<'a>;
    fn key_name(&self) -> &ValueString<'a>;
    fn public_key(&self) -> &ValueString<'a>;
}

macro_rules! key_state {
    ($state:ident, $owner:ident, $owner_description:literal) => {
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        pub(crate) struct $state<'a> {
            #[serde(borrow = "'a")]
            pub id: ValueString<'a>,
            pub $owner: ValueString<'a>,
            pub key_name: ValueString<'a>,
            pub public_key: ValueString<'a>,
        }

        impl WithSchema for $state<'_> {
            fn schema() -> Schema {
                key_schema(stringify!($owner), $owner_description)
            }
        }

        impl WithNormalize for $state<'_> {
            fn normalize(&mut self, _diags: &mut Diagnostics) {
                default_to(&mut self.key_name, DEFAULT_KEY_NAME);
            }
        }

        impl WithValidate for $state<'_> {
            fn validate(&self, diags: &mut Diagnostics, attr_path: AttributePath) {
                let owner_path = attr_path.clone().attribute(stringify!($owner));
                validate_name(diags, owner_path, &self.$owner);
                validate_name(diags, attr_path.attribute("key_name"), &self.key_name);
            }
        }

        impl<'a> ObjectState<'a> for $state<'a> {
            fn id(&self) -> &ValueString<'a> {
                &self.id
            }
            fn id_mut(&mut self) -> &mut ValueString<'a> {
                &mut self.id
            }
            fn replace_triggers(&self, prior: &Self) -> Vec<AttributePath> {
                let mut triggers = Vec::new();
                let owner = stringify!($owner);
                replace_if_changed(&mut triggers, owner, &self.$owner, &prior.$owner);
                replace_if_changed(&mut triggers, "key_name", &self.key_name, &prior.key_name);
                triggers
            }
        }

        impl<'a> KeyState<'a> for $state<'a> {
            fn from_parts(
                id: ValueString<'a>,
                owner: ValueString<'a>,
                key_name: ValueString<'a>,
                public_key: ValueString<'a>,
            ) -> Self {
                Self {
                    id,
                    $owner: owner,
                    key_name,
                    public_key,
                }
            }
            fn owner(&self) -> &ValueString<'a> {
                &self.$owner
            }
            fn key_name(&self) -> &ValueString<'a> {
                &self.key_name
            }
            fn public_key(&self) -> &ValueString<'a> {
                &self.public_key
            }
        }
    };
}

key_state!(ClientKeyState, client, "Name of the API client owning the key");
key_state!(UserKeyState, user, "Name of the user owning the key");

/// Kind of object keys are attached to
pub(crate) trait KeyOwner: Send + Sync + 'static {
    const KIND: &'static str;
    const SCOPE: Scope;
    const COLLECTION: &'static str;
    /// Attribute naming the owner
    const OWNER: &'static str;

    type State<'a>: KeyState<'a>;
}

pub(crate) struct ClientKeys;

impl KeyOwner for ClientKeys {
    const KIND: &'static str = "client key";
    const SCOPE: Scope = Scope::Organization;
    const COLLECTION: &'static str = "clients";
    const OWNER: &'static str = "client";

    type State<'a> = ClientKeyState<'a>;
}

pub(crate) struct UserKeys;

impl KeyOwner for UserKeys {
    const KIND: &'static str = "user key";
    const SCOPE: Scope = Scope::Global;
    const COLLECTION: &'static str = "users";
    const OWNER: &'static str = "user";

    type State<'a> = UserKeyState<'a>;
}

pub(crate) struct KeyObject<O: KeyOwner>(PhantomData<fn() -> O>);

pub(crate) type ClientKeyObject = KeyObject<ClientKeys>;
pub(crate) type UserKeyObject = KeyObject<UserKeys>;

impl<O: KeyOwner> KeyObject<O> {
    /// Location of the key described by the configuration
    fn key<'s, 'a: 's>(state: &'s O::State<'a>) -> Result<KeyRef<'s>, ObjectError> {
        Ok(KeyRef {
            scope: O::SCOPE,
            collection: O::COLLECTION,
            owner: required(O::OWNER, state.owner())?,
            name: required("key_name", state.key_name())?,
        })
    }

    /// Location of an existing key, taken from its id
    fn stored_key<'s, 'a: 's>(state: &'s O::State<'a>) -> Result<KeyRef<'s>, ObjectError> {
        let (owner, name) = split_id("id", required("id", state.id())?)?;
        Ok(KeyRef {
            scope: O::SCOPE,
            collection: O::COLLECTION,
            owner,
            name,
        })
    }

    fn body(key: KeyRef<'_>, public_key: &ValueString<'_>) -> Result<AccessKey, ObjectError> {
        Ok(AccessKey {
            name: key.name.to_string(),
            public_key: required("public_key", public_key)?.to_string(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl<O: KeyOwner> ChefObject for KeyObject<O> {
    const KIND: &'static str = O::KIND;
    type State<'a> = O::State<'a>;

    fn identify(state: &O::State<'_>) -> Result<String, ObjectError> {
        Ok(Self::key(state)?.id())
    }

    fn import<'a>(id: &str) -> Result<O::State<'a>, ObjectError> {
        let (owner, name) = split_id("id", id)?;
        Ok(<O::State<'a> as KeyState<'a>>::from_parts(
            ValueString::from(id.to_string()),
            ValueString::from(owner.to_string()),
            ValueString::from(name.to_string()),
            ValueString::Null,
        ))
    }

    async fn create<'a>(client: &ChefClient, state: &mut O::State<'a>) -> Result<(), ObjectError> {
        let key = Self::key(state)?;
        let body = Self::body(key, state.public_key())?;
        let _: JsonValue = client.post(key.scope, &key.keys_path(), &body).await?;
        Ok(())
    }

    async fn read<'a>(
        client: &ChefClient,
        state: &O::State<'a>,
    ) -> Result<O::State<'a>, ObjectError> {
        let key = Self::stored_key(state)?;
        let remote: AccessKey = client.get(key.scope, &key.path()).await?;

        Ok(<O::State<'a> as KeyState<'a>>::from_parts(
            state.id().clone(),
            reconcile_text(state.owner().clone(), key.owner),
            reconcile_text(state.key_name().clone(), &remote.name),
            reconcile_public_key(state.public_key().clone(), &remote.public_key),
        ))
    }

    async fn update<'a>(client: &ChefClient, state: &O::State<'a>) -> Result<(), ObjectError> {
        let key = Self::stored_key(state)?;
        let body = Self::body(key, state.public_key())?;
        let _: JsonValue = client.put(key.scope, &key.path(), &body).await?;
        Ok(())
    }

    async fn delete<'a>(client: &ChefClient, state: &O::State<'a>) -> Result<(), ObjectError> {
        let key = Self::stored_key(state)?;
        client.delete(key.scope, &key.path()).await?;
        Ok(())
    }
}
