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

//! JSON encoded attributes
//!
//! Attribute trees are stored in state as JSON text. The text read from the
//! configuration is kept as long as it denotes the same value as the server
//! object, so whitespace and key order never show up as a diff.

use std::borrow::Cow;

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tf_provider::value::{Value, ValueString};
use tf_provider::{AttributePath, Diagnostics};

use super::ObjectError;

/// Parse a JSON object attribute
pub fn decode<T: DeserializeOwned>(field: &'static str, text: &str) -> Result<T, ObjectError> {
    let value: JsonValue =
        serde_json::from_str(text).map_err(|source| ObjectError::Decode { field, source })?;
    if !value.is_object() {
        return Err(ObjectError::invalid(field, "must be a JSON object"));
    }
    serde_json::from_value(value).map_err(|source| ObjectError::Decode { field, source })
}

/// Parse a JSON object attribute, null decodes as an empty object
pub fn decode_value<T>(field: &'static str, value: &ValueString) -> Result<T, ObjectError>
where
    T: DeserializeOwned + Default,
{
    match value.as_deref_option() {
        Some(text) => decode(field, text),
        None => Ok(T::default()),
    }
}

/// Compact JSON text with sorted keys
pub fn encode(value: &JsonValue) -> ValueString<'static> {
    Value::Value(Cow::Owned(value.to_string()))
}

/// Whether `text` is the JSON encoding of `value`
pub fn same(text: &str, value: &JsonValue) -> bool {
    serde_json::from_str::<JsonValue>(text).is_ok_and(|parsed| &parsed == value)
}

/// State value for an attribute tree read from the server
pub fn reconcile<'a>(prior: ValueString<'a>, server: &JsonValue) -> ValueString<'a> {
    let unchanged = prior
        .as_deref_option()
        .is_some_and(|text| same(text, server));
    if unchanged {
        prior
    } else {
        encode(server)
    }
}

/// Report malformed JSON objects before any call to the server
pub fn validate(diags: &mut Diagnostics, attr_path: AttributePath, value: &ValueString) {
    if let Some(text) = value.as_deref_option() {
        let parsed: Result<JsonValue, _> = serde_json::from_str(text);
        match parsed {
            Ok(JsonValue::Object(_)) => (),
            Ok(_) => diags.error(
                "Invalid JSON attribute",
                "The value must be a JSON object.",
                attr_path,
            ),
            Err(err) => diags.error("Invalid JSON attribute", err.to_string(), attr_path),
        }
    }
}
