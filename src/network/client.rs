//! Outbound HTTP gateway.
//!
//! # Responsibilities
//! - Execute every chain API call made by the core
//! - Classify failures (see `error.rs`)
//! - Retry idempotent reads within a bounded attempt count
//! - Emit start/success/error events with latency

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::config::{NetworkSettings, RetryConfig, SyncConfig};
use crate::network::error::{NetworkError, NetworkResult};
use crate::observability::metrics;
use crate::resilience::retries::{is_retryable, max_attempts_for};
use crate::resilience::timeouts::with_deadline;
use crate::resilience::BackoffPolicy;

/// A single outbound call.
#[derive(Debug, Clone)]
pub struct NetworkRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<serde_json::Value>,
    /// Overrides the configured deadline for this call.
    pub timeout: Option<Duration>,
}

impl NetworkRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            timeout: None,
        }
    }

    pub fn post<B: Serialize>(url: impl Into<String>, body: &B) -> NetworkResult<Self> {
        let body = serde_json::to_value(body)
            .map_err(|e| NetworkError::InvalidRequest(format!("unserializable body: {}", e)))?;
        Ok(Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
            timeout: None,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Shared HTTP client used by every family API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct NetworkClient {
    http: reqwest::Client,
    settings: NetworkSettings,
    retries: RetryConfig,
    backoff: BackoffPolicy,
}

impl NetworkClient {
    /// Create a new client.
    pub fn new(settings: NetworkSettings, retries: RetryConfig) -> NetworkResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|e| NetworkError::InvalidRequest(format!("HTTP client setup failed: {}", e)))?;

        let backoff = BackoffPolicy::from(&retries);
        Ok(Self {
            http,
            settings,
            retries,
            backoff,
        })
    }

    pub fn from_config(config: &SyncConfig) -> NetworkResult<Self> {
        Self::new(config.network.clone(), config.retries.clone())
    }

    /// Get the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retries
    }

    /// GET `url` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> NetworkResult<T> {
        let body = self.execute(NetworkRequest::get(url)).await?;
        decode(url, &body)
    }

    /// POST `payload` as JSON to `url` and decode the JSON body. Never retried.
    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        payload: &B,
    ) -> NetworkResult<T> {
        let body = self.execute(NetworkRequest::post(url, payload)?).await?;
        decode(url, &body)
    }

    /// Execute a request and return the raw body of a 2xx response.
    pub async fn execute(&self, request: NetworkRequest) -> NetworkResult<String> {
        let request_id = Uuid::new_v4();
        let max_attempts = max_attempts_for(&request.method, &self.retries);
        let deadline = request.timeout.unwrap_or_else(|| self.default_deadline(&request.method));
        let mut attempt = 0;

        loop {
            attempt += 1;
            let start = Instant::now();

            tracing::debug!(
                request_id = %request_id,
                method = %request.method,
                url = %request.url,
                attempt = attempt,
                "network"
            );

            let result = with_deadline(deadline, &request.url, self.send_once(&request)).await;
            let latency_ms = start.elapsed().as_millis() as u64;
            let host = host_of(&request.url);

            match result {
                Ok(body) => {
                    tracing::debug!(
                        request_id = %request_id,
                        method = %request.method,
                        url = %request.url,
                        latency_ms = latency_ms,
                        "network-success"
                    );
                    metrics::record_request(request.method.as_str(), "success", &host, start);
                    return Ok(body);
                }
                Err(err) => {
                    match &err {
                        NetworkError::Down { .. } => tracing::warn!(
                            request_id = %request_id,
                            method = %request.method,
                            url = %request.url,
                            latency_ms = latency_ms,
                            attempt = attempt,
                            "network-down"
                        ),
                        _ => tracing::warn!(
                            request_id = %request_id,
                            method = %request.method,
                            url = %request.url,
                            latency_ms = latency_ms,
                            attempt = attempt,
                            error = %err,
                            "network-error"
                        ),
                    }
                    metrics::record_request(request.method.as_str(), err.kind(), &host, start);

                    if attempt < max_attempts && is_retryable(&request.method, &err) {
                        let delay = self.backoff.delay(attempt);
                        tracing::info!(
                            request_id = %request_id,
                            attempt = attempt,
                            max_attempts = max_attempts,
                            delay = ?delay,
                            "Retrying request"
                        );
                        metrics::record_retry(request.method.as_str());
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Err(err);
                }
            }
        }
    }

    async fn send_once(&self, request: &NetworkRequest) -> NetworkResult<String> {
        let mut builder = self.http.request(request.method.clone(), &request.url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_builder() {
                NetworkError::InvalidRequest(format!("{} {}: {}", request.method, request.url, e))
            } else {
                NetworkError::Down {
                    url: request.url.clone(),
                }
            }
        })?;

        let status = response.status();
        // A body cut off mid-read means no complete response was received.
        let text = response.text().await.map_err(|_| NetworkError::Down {
            url: request.url.clone(),
        })?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(NetworkError::from_status(status.as_u16(), &text, &request.url))
        }
    }

    fn default_deadline(&self, method: &Method) -> Duration {
        if *method == Method::GET {
            Duration::from_millis(self.settings.get_timeout_ms)
        } else {
            Duration::from_millis(self.settings.request_timeout_ms)
        }
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> NetworkResult<T> {
    serde_json::from_str(body).map_err(|e| NetworkError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(max_attempts: u32) -> NetworkClient {
        NetworkClient::new(
            NetworkSettings {
                get_timeout_ms: 500,
                request_timeout_ms: 500,
                ..NetworkSettings::default()
            },
            RetryConfig {
                max_attempts,
                base_delay_ms: 1,
                max_delay_ms: 5,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_host_extraction() {
        assert_eq!(host_of("https://api.elrond.com/accounts/erd1"), "api.elrond.com");
        assert_eq!(host_of("nonsense"), "unknown");
    }

    #[test]
    fn test_decode_failure_is_invalid_response() {
        let result: NetworkResult<u64> = decode("http://x", "not json");
        assert!(matches!(result, Err(NetworkError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_down() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let result = client(2).execute(NetworkRequest::get("http://127.0.0.1:9/")).await;
        assert!(matches!(result, Err(NetworkError::Down { .. })));
    }

    #[tokio::test]
    async fn test_malformed_url_is_invalid_request() {
        let result = client(3).execute(NetworkRequest::get("not-a-url")).await;
        assert!(matches!(result, Err(NetworkError::InvalidRequest(_))));
    }
}
