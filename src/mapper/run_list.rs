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

//! Run list entries
//!
//! An entry is either `recipe[cookbook(::recipe)(@version)]`, `role[name]`,
//! or a bare recipe reference that is stored as `recipe[...]` by the server.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tf_provider::value::{Value, ValueList, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use super::ObjectError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunListItem {
    Recipe {
        name: String,
        version: Option<String>,
    },
    Role {
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunListError {
    #[error("run list entry is empty")]
    Empty,
    #[error("`{0}` is not a valid recipe name")]
    RecipeName(String),
    #[error("`{0}` is not a valid role name")]
    RoleName(String),
    #[error("`{0}` is not a valid cookbook version")]
    Version(String),
    #[error("`{0}` is neither a recipe nor a role")]
    UnknownType(String),
}

impl FromStr for RunListItem {
    type Err = RunListError;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        if entry.is_empty() {
            return Err(RunListError::Empty);
        }
        if let Some(inner) = strip_type(entry, "recipe") {
            return parse_recipe(inner);
        }
        if let Some(name) = strip_type(entry, "role") {
            return if is_name(name) {
                Ok(Self::Role {
                    name: name.to_string(),
                })
            } else {
                Err(RunListError::RoleName(name.to_string()))
            };
        }
        if entry.contains(['[', ']']) {
            return Err(RunListError::UnknownType(entry.to_string()));
        }
        parse_recipe(entry)
    }
}

impl fmt::Display for RunListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recipe {
                name,
                version: Some(version),
            } => write!(f, "recipe[{name}@{version}]"),
            Self::Recipe {
                name,
                version: None,
            } => write!(f, "recipe[{name}]"),
            Self::Role { name } => write!(f, "role[{name}]"),
        }
    }
}

fn strip_type<'a>(entry: &'a str, kind: &str) -> Option<&'a str> {
    entry
        .strip_prefix(kind)?
        .strip_prefix('[')?
        .strip_suffix(']')
}

fn parse_recipe(text: &str) -> Result<RunListItem, RunListError> {
    let (name, version) = match text.split_once('@') {
        Some((name, version)) => (name, Some(version)),
        None => (text, None),
    };
    let valid_name = name.split("::").all(is_name);
    if !valid_name {
        return Err(RunListError::RecipeName(name.to_string()));
    }
    if let Some(version) = version {
        if !is_version(version) {
            return Err(RunListError::Version(version.to_string()));
        }
    }
    Ok(RunListItem::Recipe {
        name: name.to_string(),
        version: version.map(str::to_string),
    })
}

fn is_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_version(version: &str) -> bool {
    let parts: Vec<&str> = version.split('.').collect();
    (1..=3).contains(&parts.len())
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Canonical text of a run list entry
pub fn normalize(entry: &str) -> Result<String, RunListError> {
    Ok(entry.parse::<RunListItem>()?.to_string())
}

/// Canonical entries of a run list attribute
pub fn decode(
    field: &'static str,
    value: &ValueList<ValueString>,
) -> Result<Vec<String>, ObjectError> {
    value
        .iter()
        .flatten()
        .enumerate()
        .map(|(i, entry)| {
            let entry = entry
                .as_deref_option()
                .ok_or_else(|| ObjectError::invalid(field, format!("entry {i} is not set")))?;
            normalize(entry).map_err(|err| ObjectError::invalid(field, format!("entry {i}: {err}")))
        })
        .collect()
}

/// State value for a run list read from the server
///
/// The entries from the configuration are kept when they normalize to the
/// server entries.
pub fn reconcile<'a>(
    prior: ValueList<ValueString<'a>>,
    server: &[String],
) -> ValueList<ValueString<'a>> {
    let unchanged = prior.as_ref_option().is_some_and(|entries| {
        entries.len() == server.len()
            && entries.iter().zip(server).all(|(entry, server)| {
                entry
                    .as_deref_option()
                    .and_then(|entry| normalize(entry).ok())
                    .is_some_and(|entry| entry == *server)
            })
    });
    if unchanged {
        prior
    } else {
        encode(server)
    }
}

pub fn encode<'a>(entries: &[String]) -> ValueList<ValueString<'a>> {
    Value::Value(
        entries
            .iter()
            .map(|entry| Value::Value(Cow::Owned(entry.clone())))
            .collect(),
    )
}

pub fn validate(diags: &mut Diagnostics, attr_path: AttributePath, value: &ValueList<ValueString>) {
    for (i, entry) in value.iter().flatten().enumerate() {
        if let Some(entry) = entry.as_deref_option() {
            if let Err(err) = normalize(entry) {
                diags.error(
                    "Invalid run list entry",
                    err.to_string(),
                    attr_path.clone().index(i as i64),
                );
            }
        }
    }
}
