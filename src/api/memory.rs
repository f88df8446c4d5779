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

//! In-memory Chef Server used by the unit tests

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value as JsonValue};

use super::{ApiError, ApiRequest, ChefClient, Scope, Transport};

#[derive(Debug, Default)]
struct Store {
    objects: BTreeMap<(Scope, String), JsonValue>,
    searches: BTreeMap<String, JsonValue>,
    failures: HashMap<(Method, String), StatusCode>,
    requests: Vec<ApiRequest>,
}

/// Objects are keyed by their path. Creating an object posts it to its
/// collection, which names the child after its `name` (or `id`) member.
/// Searches return the response preset for their index.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport(Arc<Mutex<Store>>);

impl MemoryTransport {
    pub fn client(&self) -> ChefClient {
        ChefClient::new(self.clone())
    }

    pub fn insert(&self, scope: Scope, path: &str, object: JsonValue) {
        self.store()
            .objects
            .insert((scope, path.to_string()), object);
    }

    pub fn object(&self, scope: Scope, path: &str) -> Option<JsonValue> {
        self.store()
            .objects
            .get(&(scope, path.to_string()))
            .cloned()
    }

    /// Preset the response of searches on `index`
    pub fn set_search(&self, index: &str, response: JsonValue) {
        self.store().searches.insert(index.to_string(), response);
    }

    /// Make every `method` request on `path` fail with `status`
    pub fn fail(&self, method: Method, path: &str, status: StatusCode) {
        self.store()
            .failures
            .insert((method, path.to_string()), status);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.store().requests.clone()
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.0.lock().unwrap()
    }
}

fn error(request: &ApiRequest, status: StatusCode) -> ApiError {
    let body = json!({"error": [format!("{} {}", status, request.path)]}).to_string();
    ApiError::status(request.method.clone(), request.path.clone(), status, &body)
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError> {
        let mut store = self.store();
        store.requests.push(request.clone());

        if let Some(status) = store
            .failures
            .get(&(request.method.clone(), request.path.clone()))
        {
            return Err(error(&request, *status));
        }

        if let Some(index) = request.path.strip_prefix("search/") {
            return store
                .searches
                .get(index)
                .cloned()
                .ok_or_else(|| error(&request, StatusCode::NOT_FOUND));
        }

        let key = (request.scope, request.path.clone());
        match request.method {
            Method::GET => {
                if let Some(object) = store.objects.get(&key) {
                    return Ok(object.clone());
                }
                let prefix = format!("{}/", request.path);
                let children: serde_json::Map<_, _> = store
                    .objects
                    .keys()
                    .filter(|(scope, path)| *scope == request.scope && path.starts_with(&prefix))
                    .filter_map(|(_, path)| {
                        let name = path[prefix.len()..].split('/').next()?;
                        Some((name.to_string(), JsonValue::String(path.clone())))
                    })
                    .collect();
                if children.is_empty() {
                    Err(error(&request, StatusCode::NOT_FOUND))
                } else {
                    Ok(JsonValue::Object(children))
                }
            }
            Method::POST => {
                let body = request.body.clone().unwrap_or_default();
                // data bag items are named after their id
                let member = if request.path.starts_with("data/") {
                    "id"
                } else {
                    "name"
                };
                let name = body
                    .get(member)
                    .and_then(JsonValue::as_str)
                    .ok_or_else(|| error(&request, StatusCode::BAD_REQUEST))?
                    .to_string();
                let path = format!("{}/{}", request.path, name);
                if store.objects.contains_key(&(request.scope, path.clone())) {
                    return Err(error(&request, StatusCode::CONFLICT));
                }
                store.objects.insert((request.scope, path.clone()), body);
                Ok(json!({"uri": format!("memory://{path}")}))
            }
            Method::PUT => match store.objects.get_mut(&key) {
                Some(object) => {
                    let body = request.body.clone().unwrap_or_default();
                    *object = body.clone();
                    Ok(body)
                }
                None => Err(error(&request, StatusCode::NOT_FOUND)),
            },
            Method::DELETE => match store.objects.remove(&key) {
                Some(object) => {
                    let prefix = format!("{}/", request.path);
                    store.objects.retain(|(scope, path), _| {
                        *scope != request.scope || !path.starts_with(&prefix)
                    });
                    Ok(object)
                }
                None => Err(error(&request, StatusCode::NOT_FOUND)),
            },
            _ => Err(error(&request, StatusCode::METHOD_NOT_ALLOWED)),
        }
    }

    fn endpoint(&self, scope: Scope, path: &str) -> Result<String, ApiError> {
        Ok(match scope {
            Scope::Organization => format!("memory://organizations/test/{path}"),
            Scope::Global => format!("memory://{path}"),
        })
    }
}
