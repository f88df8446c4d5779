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

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value as JsonValue;
use tf_provider::Diagnostics;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{SearchQuery, SearchResult};

mod auth;
mod error;
mod http;
#[cfg(test)]
pub(crate) mod memory;

pub use error::ApiError;
pub use http::HttpTransport;

/// API surface a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// Endpoints below `/organizations/<org>`
    Organization,
    /// Server wide endpoints, like users
    Global,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub scope: Scope,
    /// Path relative to the scope base URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<JsonValue>,
}

impl ApiRequest {
    pub fn new(method: Method, scope: Scope, path: impl Into<String>) -> Self {
        Self {
            method,
            scope,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Raw exchange with a Chef Server
///
/// A response with an empty body is returned as `null`.
#[async_trait]
pub trait Transport: Send + Sync + Debug + 'static {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError>;

    /// Absolute URL of an object
    fn endpoint(&self, scope: Scope, path: &str) -> Result<String, ApiError>;
}

/// Typed Chef Server client shared by all resources
#[derive(Debug, Clone)]
pub struct ChefClient {
    transport: Arc<dyn Transport>,
}

impl ChefClient {
    pub fn new<T: Transport>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.transport.send(request).await?;
        Ok(serde_json::from_value(response)?)
    }

    pub async fn get<T: DeserializeOwned>(&self, scope: Scope, path: &str) -> Result<T, ApiError> {
        self.call(ApiRequest::new(Method::GET, scope, path)).await
    }

    pub async fn post<B, T>(&self, scope: Scope, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.call(ApiRequest::new(Method::POST, scope, path).with_body(body))
            .await
    }

    pub async fn put<B, T>(&self, scope: Scope, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)?;
        self.call(ApiRequest::new(Method::PUT, scope, path).with_body(body))
            .await
    }

    pub async fn delete(&self, scope: Scope, path: &str) -> Result<(), ApiError> {
        self.transport
            .send(ApiRequest::new(Method::DELETE, scope, path))
            .await?;
        Ok(())
    }

    pub fn endpoint(&self, scope: Scope, path: &str) -> Result<String, ApiError> {
        self.transport.endpoint(scope, path)
    }

    /// Run a search, partial when the query carries filters
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, ApiError> {
        let path = format!("search/{}", query.index);
        let request = match &query.partial {
            Some(partial) => {
                ApiRequest::new(Method::POST, Scope::Organization, path)
                    .with_body(serde_json::to_value(partial)?)
            }
            None => ApiRequest::new(Method::GET, Scope::Organization, path),
        }
        .with_query("q", &query.query)
        .with_query("rows", query.rows)
        .with_query("start", query.start);

        let result: SearchResult = self.call(request).await?;
        debug!(
            index = %query.index,
            query = %query.query,
            partial = query.partial.is_some(),
            total = result.total,
            "search executed"
        );
        Ok(result)
    }
}

/// Client slot filled when the provider is configured
///
/// Resources are instantiated before the provider configuration is known,
/// so they all hold a clone of the same handle.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle(Arc<RwLock<Option<ChefClient>>>);

impl ClientHandle {
    pub async fn set(&self, client: ChefClient) {
        *self.0.write().await = Some(client);
    }

    pub async fn get(&self, diags: &mut Diagnostics) -> Option<ChefClient> {
        let client = self.0.read().await.clone();
        if client.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The Chef provider must be configured before resources or data sources are used.",
            );
        }
        client
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryTransport;
    use super::*;

    use serde_json::json;

    #[tokio::test]
    async fn unconfigured_handle_reports_error() {
        let handle = ClientHandle::default();
        let mut diags = Diagnostics::default();
        assert!(handle.get(&mut diags).await.is_none());
        assert_eq!(diags.errors.len(), 1);
    }

    #[tokio::test]
    async fn handle_is_shared_between_clones() {
        let handle = ClientHandle::default();
        let clone = handle.clone();
        handle
            .set(ChefClient::new(MemoryTransport::default()))
            .await;

        let mut diags = Diagnostics::default();
        assert!(clone.get(&mut diags).await.is_some());
        assert!(diags.errors.is_empty());
    }

    #[tokio::test]
    async fn typed_round_trip() {
        let client = ChefClient::new(MemoryTransport::default());
        let _: JsonValue = client
            .post(Scope::Organization, "roles", &json!({"name": "web"}))
            .await
            .unwrap();
        let role: JsonValue = client.get(Scope::Organization, "roles/web").await.unwrap();
        assert_eq!(role["name"], "web");

        client.delete(Scope::Organization, "roles/web").await.unwrap();
        let err = client
            .get::<JsonValue>(Scope::Organization, "roles/web")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
