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

use std::fmt;

use async_trait::async_trait;
use openssl::pkey::{PKey, Private};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde_json::Value as JsonValue;
use tracing::debug;
use url::Url;

use super::auth::Auth13;
use super::{ApiError, ApiRequest, Scope, Transport};

const API_VERSION: &str = "1";
const CHEF_VERSION: &str = "17.10.0";

/// Transport signing every request with the API client key
pub struct HttpTransport {
    client: reqwest::Client,
    organization_url: Url,
    global_url: Url,
    client_name: String,
    key: PKey<Private>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("organization_url", &self.organization_url.as_str())
            .field("global_url", &self.global_url.as_str())
            .field("client_name", &self.client_name)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(
        server_url: &Url,
        client_name: &str,
        key_material: &str,
        allow_unverified_ssl: bool,
    ) -> Result<Self, ApiError> {
        let key = PKey::private_key_from_pem(key_material.as_bytes())?;
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(allow_unverified_ssl)
            .build()?;

        let organization_url = with_trailing_slash(server_url.clone());
        let global_url = global_url(&organization_url);

        Ok(Self {
            client,
            organization_url,
            global_url,
            client_name: client_name.to_string(),
            key,
        })
    }

    fn base(&self, scope: Scope) -> &Url {
        match scope {
            Scope::Organization => &self.organization_url,
            Scope::Global => &self.global_url,
        }
    }

    fn url(&self, request: &ApiRequest) -> Result<Url, ApiError> {
        let mut url = self
            .base(request.scope)
            .join(request.path.trim_start_matches('/'))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<JsonValue, ApiError> {
        let url = self.url(&request)?;
        let body = match &request.body {
            Some(body) => serde_json::to_vec(body)?,
            None => Vec::new(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-chef-version", HeaderValue::from_static(CHEF_VERSION));
        headers.insert(
            "x-ops-server-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        Auth13::new(
            url.path(),
            request.method.as_str(),
            &self.client_name,
            API_VERSION,
            &body,
        )?
        .build(&self.key, &mut headers)?;

        debug!(method = %request.method, url = %url, "sending Chef API request");
        let response = self
            .client
            .request(request.method.clone(), url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        debug!(method = %request.method, path = %request.path, %status, "Chef API response");

        if !status.is_success() {
            return Err(ApiError::status(request.method, request.path, status, &text));
        }
        if text.trim().is_empty() {
            Ok(JsonValue::Null)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }

    fn endpoint(&self, scope: Scope, path: &str) -> Result<String, ApiError> {
        Ok(self
            .base(scope)
            .join(path.trim_start_matches('/'))?
            .to_string())
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Strip the `organizations/<org>/` suffix from an organization URL
fn global_url(organization_url: &Url) -> Url {
    let mut url = organization_url.clone();
    let path = organization_url.path();
    if let Some(index) = path.find("/organizations/") {
        url.set_path(&path[..=index]);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    use openssl::rsa::Rsa;
    use reqwest::Method;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn key_material() -> String {
        let key = Rsa::generate(2048).unwrap();
        String::from_utf8(key.private_key_to_pem().unwrap()).unwrap()
    }

    fn transport(server: &MockServer) -> HttpTransport {
        let url = Url::parse(&format!("{}/organizations/acme", server.uri())).unwrap();
        HttpTransport::new(&url, "terraform", &key_material(), false).unwrap()
    }

    #[test]
    fn base_urls() {
        let url = Url::parse("https://chef.example.com/organizations/acme").unwrap();
        let org = with_trailing_slash(url);
        assert_eq!(org.as_str(), "https://chef.example.com/organizations/acme/");
        assert_eq!(global_url(&org).as_str(), "https://chef.example.com/");

        let url = Url::parse("https://chef.example.com/").unwrap();
        assert_eq!(global_url(&url).as_str(), "https://chef.example.com/");
    }

    #[test]
    fn invalid_key_is_rejected() {
        let url = Url::parse("https://chef.example.com/organizations/acme").unwrap();
        let err = HttpTransport::new(&url, "terraform", "not a key", false).unwrap_err();
        assert!(matches!(err, ApiError::Signature(_)));
    }

    #[tokio::test]
    async fn signed_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/acme/nodes/web"))
            .and(header("x-ops-sign", "algorithm=sha256;version=1.3"))
            .and(header("x-ops-userid", "terraform"))
            .and(header("x-ops-server-api-version", "1"))
            .and(header("accept", "application/json"))
            .and(header_exists("x-ops-authorization-1"))
            .and(header_exists("x-ops-timestamp"))
            .and(header_exists("x-ops-content-hash"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "web"})))
            .expect(1)
            .mount(&server)
            .await;

        let response = transport(&server)
            .send(ApiRequest::new(Method::GET, Scope::Organization, "nodes/web"))
            .await
            .unwrap();
        assert_eq!(response, json!({"name": "web"}));
    }

    #[tokio::test]
    async fn global_scope_and_body() {
        let server = MockServer::start().await;
        let key = json!({"name": "default", "public_key": "PEM", "expiration_date": "infinity"});
        Mock::given(method("POST"))
            .and(path("/users/bob/keys"))
            .and(body_json(&key))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"uri": "x"})))
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .send(ApiRequest::new(Method::POST, Scope::Global, "users/bob/keys").with_body(key))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/acme/search/node"))
            .and(query_param("q", "role:web AND chef_environment:prod"))
            .and(query_param("rows", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"total": 0, "start": 0, "rows": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        transport(&server)
            .send(
                ApiRequest::new(Method::GET, Scope::Organization, "search/node")
                    .with_query("q", "role:web AND chef_environment:prod")
                    .with_query("rows", 1),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/organizations/acme/roles/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": ["Cannot load role missing"]})),
            )
            .mount(&server)
            .await;

        let err = transport(&server)
            .send(ApiRequest::new(Method::GET, Scope::Organization, "roles/missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Cannot load role missing"));
    }

    #[tokio::test]
    async fn empty_body_is_null() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/organizations/acme/environments/dev"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let response = transport(&server)
            .send(ApiRequest::new(
                Method::DELETE,
                Scope::Organization,
                "environments/dev",
            ))
            .await
            .unwrap();
        assert_eq!(response, JsonValue::Null);
    }

    #[test]
    fn endpoint_resolution() {
        let url = Url::parse("https://chef.example.com/organizations/acme").unwrap();
        let transport = HttpTransport::new(&url, "terraform", &key_material(), false).unwrap();
        assert_eq!(
            transport.endpoint(Scope::Organization, "data/users").unwrap(),
            "https://chef.example.com/organizations/acme/data/users"
        );
        assert_eq!(
            transport.endpoint(Scope::Global, "users/bob").unwrap(),
            "https://chef.example.com/users/bob"
        );
    }
}
