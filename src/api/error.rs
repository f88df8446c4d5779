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

use reqwest::{Method, StatusCode};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::utils::DisplayJoinable;

/// Errors raised while talking to the Chef Server
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{method} {path} returned {status}: {message}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        message: String,
    },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unable to sign request: {0}")]
    Signature(#[from] openssl::error::ErrorStack),
    #[error("unable to format request timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("invalid header value: {0}")]
    HeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error("invalid header name: {0}")]
    HeaderName(#[from] reqwest::header::InvalidHeaderName),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// Build a status error from the raw response body
    ///
    /// The Chef Server reports failures as `{"error": ["..."]}` or `{"error": "..."}`.
    /// Any other body is kept verbatim.
    pub fn status(method: Method, path: impl Into<String>, status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<JsonValue>(body) {
            Ok(JsonValue::Object(object)) => match object.get("error") {
                Some(JsonValue::String(message)) => message.clone(),
                Some(JsonValue::Array(messages)) => messages
                    .iter()
                    .map(|message| match message {
                        JsonValue::String(message) => message.clone(),
                        other => other.to_string(),
                    })
                    .join_with(", ")
                    .to_string(),
                _ => body.to_string(),
            },
            _ => body.trim().to_string(),
        };
        let message = if message.is_empty() {
            status
                .canonical_reason()
                .unwrap_or("no details provided")
                .to_string()
        } else {
            message
        };

        Self::Status {
            method,
            path: path.into(),
            status,
            message,
        }
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND)
    }

    pub fn is_conflict(&self) -> bool {
        self.status_code() == Some(StatusCode::CONFLICT)
    }
}
