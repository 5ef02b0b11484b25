//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. client/mod.rs never
//! interprets status codes.

use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::{debug, warn};

use crate::auth::Credentials;
use crate::error::{AccessError, AccessResult};

use super::helpers::{describe_url, parse_retry_after};

/// HTTP backend for making requests (holds reqwest client, credentials, retry budget).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) credentials: Credentials,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    /// GET and parse a JSON body.
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> AccessResult<T> {
        let response = self.request(reqwest::Method::GET, url, None).await?;
        parse_json(response, url).await
    }

    /// POST a JSON body and parse the JSON response.
    pub(crate) async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> AccessResult<T> {
        let response = self
            .request(reqwest::Method::POST, url, Some(body))
            .await?;
        parse_json(response, url).await
    }

    /// Make a request, retrying transient failures with jittered exponential backoff.
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> AccessResult<reqwest::Response> {
        use rand::Rng;

        let mut retries = 0;
        let max_retries = self.max_retries;

        loop {
            let result = self.request_once(method.clone(), url, body).await;

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;

                    let backoff = match &e {
                        AccessError::RateLimited {
                            retry_after: Some(retry_after),
                        } => {
                            let capped = (*retry_after).min(Duration::from_secs(30));
                            let base_ms = capped.as_millis() as u64;
                            let jitter_factor: f64 =
                                rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
                            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
                            Duration::from_millis(jittered_ms.max(100))
                        }
                        _ => {
                            let base_backoff = Duration::from_secs(1 << retries);
                            let base_backoff = base_backoff.min(Duration::from_secs(30));
                            let jittered_ms =
                                rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
                            Duration::from_millis(jittered_ms.max(10))
                        }
                    };

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn request_once(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> AccessResult<reqwest::Response> {
        debug!(method = %method, url = %url, "sending request");
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");

        if let Some(header) = self.credentials.authorization_header() {
            request = request.header(AUTHORIZATION, header);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        match status.as_u16() {
            // Azure DevOps answers an unauthenticated API call with a 203 sign-in page.
            203 => Err(AccessError::Unauthorized {
                message: "service returned a sign-in page; check the personal access token"
                    .to_string(),
            }),

            200..=299 => Ok(response),

            401 | 403 => Err(AccessError::Unauthorized {
                message: format!("HTTP {} for {}", status.as_u16(), describe_url(url)),
            }),

            404 => Err(AccessError::NotFound {
                what: describe_url(url),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_retry_after);

                Err(AccessError::RateLimited { retry_after })
            }

            400..=499 => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(AccessError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }

            _ => {
                let message = response.text().await.unwrap_or_else(|_| status.to_string());
                Err(AccessError::DependencyFailure {
                    message: format!("HTTP {}: {}", status.as_u16(), message),
                })
            }
        }
    }
}

async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
) -> AccessResult<T> {
    let text = response.text().await.map_err(|e| AccessError::DependencyFailure {
        message: format!("failed to read response body: {}", e),
    })?;
    serde_json::from_str(&text).map_err(|e| AccessError::InvalidResponse {
        message: format!("failed to parse response from {}: {}", describe_url(url), e),
    })
}
