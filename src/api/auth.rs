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

use base64::{engine::general_purpose, Engine as _};
use openssl::hash::{hash, MessageDigest};
use openssl::pkey::{PKey, Private};
use openssl::sign::Signer;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use time::{macros::format_description, OffsetDateTime};
use tracing::trace;

use super::ApiError;

const SIGN_VERSION: &str = "algorithm=sha256;version=1.3";
const AUTHORIZATION_CHUNK: usize = 60;

/// Signature of a single request following the Chef authentication protocol 1.3
pub(super) struct Auth13<'a> {
    api_version: &'a str,
    body: &'a [u8],
    date: String,
    method: String,
    path: String,
    userid: &'a str,
}

impl fmt::Debug for Auth13<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Auth13")
            .field("method", &self.method)
            .field("userid", &self.userid)
            .field("path", &self.path)
            .field("date", &self.date)
            .finish()
    }
}

impl<'a> Auth13<'a> {
    pub(super) fn new(
        path: &str,
        method: &str,
        userid: &'a str,
        api_version: &'a str,
        body: &'a [u8],
    ) -> Result<Self, ApiError> {
        let date = OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))?;

        Ok(Self {
            api_version,
            body,
            date,
            method: method.to_ascii_uppercase(),
            path: squeeze_path(path),
            userid,
        })
    }

    fn content_hash(&self) -> Result<String, ApiError> {
        let content = hash(MessageDigest::sha256(), self.body)?;
        Ok(general_purpose::STANDARD.encode(content))
    }

    fn canonical_request(&self) -> Result<String, ApiError> {
        let request = format!(
            "Method:{}\nPath:{}\nX-Ops-Content-Hash:{}\n\
             X-Ops-Sign:version=1.3\nX-Ops-Timestamp:{}\n\
             X-Ops-UserId:{}\nX-Ops-Server-API-Version:{}",
            self.method,
            self.path,
            self.content_hash()?,
            self.date,
            self.userid,
            self.api_version
        );
        trace!(request = %request, "canonical request");
        Ok(request)
    }

    fn signed_request(&self, key: &PKey<Private>) -> Result<String, ApiError> {
        let request = self.canonical_request()?;

        let mut signer = Signer::new(MessageDigest::sha256(), key)?;
        signer.update(request.as_bytes())?;
        let signature = signer.sign_to_vec()?;
        Ok(general_purpose::STANDARD.encode(signature))
    }

    /// Add the authentication headers to `headers`
    pub(super) fn build(
        self,
        key: &PKey<Private>,
        headers: &mut HeaderMap,
    ) -> Result<(), ApiError> {
        headers.insert(
            "x-ops-content-hash",
            HeaderValue::from_str(&self.content_hash()?)?,
        );
        headers.insert("x-ops-sign", HeaderValue::from_static(SIGN_VERSION));
        headers.insert("x-ops-timestamp", HeaderValue::from_str(&self.date)?);
        headers.insert("x-ops-userid", HeaderValue::from_str(self.userid)?);

        let signature = self.signed_request(key)?;
        for (i, chunk) in signature.as_bytes().chunks(AUTHORIZATION_CHUNK).enumerate() {
            let name = HeaderName::from_bytes(format!("x-ops-authorization-{}", i + 1).as_bytes())?;
            headers.insert(name, HeaderValue::from_bytes(chunk)?);
        }
        Ok(())
    }
}

/// Collapse repeated slashes and drop the trailing one
pub(super) fn squeeze_path(path: &str) -> String {
    let mut squeezed = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && squeezed.ends_with('/') {
            continue;
        }
        squeezed.push(c);
    }
    if squeezed.len() > 1 && squeezed.ends_with('/') {
        squeezed.pop();
    }
    squeezed
}

#[cfg(test)]
mod tests {
    use super::*;

    use openssl::rsa::Rsa;
    use openssl::sign::Verifier;

    const PATH: &str = "/organizations/clownco";
    const BODY: &str = "Spec Body";
    const USER: &str = "test-user";
    const DT: &str = "2009-01-01T12:00:00Z";

    fn sample_request() -> Auth13<'static> {
        Auth13 {
            api_version: "1",
            body: BODY.as_bytes(),
            date: String::from(DT),
            method: String::from("POST"),
            path: String::from(PATH),
            userid: USER,
        }
    }

    fn generate_key() -> PKey<Private> {
        PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap()
    }

    #[test]
    fn canonical_request() {
        assert_eq!(
            sample_request().canonical_request().unwrap(),
            "Method:POST\nPath:/organizations/clownco\nX-Ops-Content-Hash:\
             hDlKNZhIhgso3Fs0S0pZwJ0xyBWtR1RBaeHs1DrzOho=\nX-Ops-Sign:version=1.\
             3\nX-Ops-Timestamp:2009-01-01T12:00:00Z\nX-Ops-UserId:\
             test-user\nX-Ops-Server-API-Version:1"
        )
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let key = generate_key();
        let auth = sample_request();
        let signature = auth.signed_request(&key).unwrap();
        let request = auth.canonical_request().unwrap();

        let raw = general_purpose::STANDARD.decode(&signature).unwrap();
        let mut verifier = Verifier::new(MessageDigest::sha256(), &key).unwrap();
        verifier.update(request.as_bytes()).unwrap();
        assert!(verifier.verify(&raw).unwrap());
    }

    #[test]
    fn authorization_headers_are_chunked() {
        let key = generate_key();
        let signature = sample_request().signed_request(&key).unwrap();

        let mut headers = HeaderMap::new();
        sample_request().build(&key, &mut headers).unwrap();

        let mut rebuilt = String::new();
        let mut i = 1;
        while let Some(chunk) = headers.get(format!("x-ops-authorization-{i}").as_str()) {
            let chunk = chunk.to_str().unwrap();
            assert!(chunk.len() <= AUTHORIZATION_CHUNK);
            rebuilt.push_str(chunk);
            i += 1;
        }
        assert_eq!(rebuilt, signature);
        assert_eq!(i - 1, signature.len().div_ceil(AUTHORIZATION_CHUNK));
        assert_eq!(headers["x-ops-sign"], SIGN_VERSION);
        assert_eq!(headers["x-ops-userid"], USER);
        assert_eq!(
            headers["x-ops-content-hash"],
            "hDlKNZhIhgso3Fs0S0pZwJ0xyBWtR1RBaeHs1DrzOho="
        );
    }

    #[test]
    fn timestamp_format() {
        let auth = Auth13::new("/nodes", "get", USER, "1", b"").unwrap();
        assert_eq!(auth.method, "GET");
        assert_eq!(auth.date.len(), DT.len());
        assert!(auth.date.ends_with('Z'));
        assert_eq!(&auth.date[10..11], "T");
    }

    #[test]
    fn squeeze() {
        assert_eq!(squeeze_path("/organizations//acme/nodes/"), "/organizations/acme/nodes");
        assert_eq!(squeeze_path("/"), "/");
        assert_eq!(squeeze_path("///"), "/");
        assert_eq!(squeeze_path("/users/bob"), "/users/bob");
    }
}
