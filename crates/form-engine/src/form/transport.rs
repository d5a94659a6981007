// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;

/// A successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub body: Value,
    /// The user the server authenticated the request as, if it said so.
    pub user: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The server answered with a status other than 200.
    #[error("{status_code} {status_text}: {body_text}")]
    Status {
        status_code: u16,
        status_text: String,
        body_text: String,
    },

    #[error("Payload of {size} bytes exceeds the limit of {max_mb} MB")]
    PayloadTooLarge { size: usize, max_mb: u64 },

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Response is not JSON: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// The error as shown in a response pane. Status errors keep their structure.
    pub fn to_pane_text(&self) -> String {
        match self {
            TransportError::Status {
                status_code,
                status_text,
                body_text,
            } => {
                let envelope = json!({
                    "status_code": status_code,
                    "status_text": status_text,
                    "body_text": body_text,
                });
                serde_json::to_string_pretty(&envelope).unwrap_or_else(|_| self.to_string())
            }
            _ => self.to_string(),
        }
    }
}

/// Sends a method call to the API.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Call `method_path` with `payload`, adding `query_args` (a JSON object) to the URL.
    async fn submit(
        &self,
        method_path: &str,
        payload: &Value,
        query_args: Option<&Value>,
    ) -> Result<TransportResponse, TransportError>;
}
