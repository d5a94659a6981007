// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::time::Duration;

use async_trait::async_trait;
use form_engine::form::{Transport, TransportError, TransportResponse};
use reqwest::{Client, StatusCode, redirect};
use serde_json::Value;
use url::Url;

/// Response header naming the user the server authenticated the request as.
pub const USER_HEADER: &str = "X-Yo-User";

const MIB: usize = 1024 * 1024;

pub struct HttpTransport {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
    max_payload_mb: u64,
}

impl HttpTransport {
    /// A transport posting to methods below `base_url`. A `max_payload_mb` of 0 disables the
    /// payload size check.
    pub fn new(
        base_url: &str,
        timeout_ms: u64,
        max_payload_mb: u64,
    ) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| TransportError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms,
            max_payload_mb,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn request_url(
        &self,
        method_path: &str,
        query_args: Option<&Value>,
    ) -> Result<Url, TransportError> {
        let url_text = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            method_path.trim_start_matches('/')
        );
        let mut url = Url::parse(&url_text)
            .map_err(|e| TransportError::InvalidUrl(format!("{url_text}: {e}")))?;

        match query_args {
            None | Some(Value::Null) => {}
            Some(Value::Object(args)) => {
                if !args.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (name, value) in args {
                        match value {
                            Value::String(value) => pairs.append_pair(name, value),
                            other => pairs.append_pair(name, &other.to_string()),
                        };
                    }
                }
            }
            Some(other) => {
                return Err(TransportError::InvalidUrl(format!(
                    "query arguments must be a JSON object, not {other}"
                )));
            }
        }

        Ok(url)
    }

    fn check_payload_size(&self, payload_json: &str) -> Result<(), TransportError> {
        let limit = usize::try_from(self.max_payload_mb)
            .unwrap_or(usize::MAX)
            .saturating_mul(MIB);

        if self.max_payload_mb > 0 && payload_json.len() > limit {
            return Err(TransportError::PayloadTooLarge {
                size: payload_json.len(),
                max_mb: self.max_payload_mb,
            });
        }
        Ok(())
    }

    fn request_error(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout_ms)
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit(
        &self,
        method_path: &str,
        payload: &Value,
        query_args: Option<&Value>,
    ) -> Result<TransportResponse, TransportError> {
        let url = self.request_url(method_path, query_args)?;

        let payload_json = payload.to_string();
        self.check_payload_size(&payload_json)?;

        tracing::debug!("--> POST {url} {payload_json}");

        let response = self
            .client
            .post(url)
            .header("content-type", "application/json")
            .body(payload_json)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body_text = response.text().await.unwrap_or_default();
            tracing::debug!("<-- {status} {body_text}");

            return Err(TransportError::Status {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body_text: body_text.trim().to_string(),
            });
        }

        let user = response
            .headers()
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|user| !user.is_empty())
            .map(str::to_string);

        let body_text = response.text().await.map_err(|e| self.request_error(e))?;
        tracing::debug!("<-- {status} {body_text}");

        let body = serde_json::from_str(&body_text).map_err(|e| {
            tracing::warn!("Non-JSON response to {method_path}: {body_text:?}");
            TransportError::InvalidResponse(e.to_string())
        })?;

        Ok(TransportResponse { body, user })
    }
}
