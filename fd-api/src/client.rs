//! HTTP client for the hosted backend.
//!
//! Handles the `apikey`/bearer headers, timeouts, certificate handling,
//! exponential backoff retry for transient failures, and mapping of error
//! bodies into `FdError`.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use fd_core::config::{AppConfig, BackendConfig};
use fd_core::error::{FdError, FdResult};

use crate::response::BackendError;

/// Transport-level retry policy. Function invocations bypass it.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// First backoff; doubled per attempt.
    pub base_delay: Duration,
    /// Upper bound on one backoff.
    pub max_delay: Duration,
    /// Gateway statuses worth retrying.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(4),
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// A config that sends every request exactly once.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// HTTP client for the hosted backend.
#[derive(Clone)]
pub struct ApiClient {
    inner: Client,
    /// Backend origin without trailing slash, e.g. "https://abc.example.co".
    base_url: String,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl ApiClient {
    /// Create a new ApiClient from backend configuration.
    pub fn new(config: &BackendConfig) -> FdResult<Self> {
        let base_url = AppConfig::sanitize_backend_url(&config.url);
        if base_url.is_empty() {
            return Err(FdError::MissingConfig("backend.url".into()));
        }
        if config.api_key.is_empty() {
            return Err(FdError::MissingConfig("backend.api_key".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("apikey"), header_value(&config.api_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.bearer_token()))?,
        );

        let timeout = Duration::from_millis(config.api_timeout_ms);
        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(5)
            .pool_idle_timeout(Duration::from_secs(90));

        if config.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| FdError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            inner,
            base_url,
            timeout,
            retry_config: RetryConfig::default(),
        })
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
        prefer: Option<&str>,
    ) -> RequestBuilder {
        let mut builder = self.inner.request(method, url).timeout(self.timeout);
        if let Some(prefer) = prefer {
            builder = builder.header("Prefer", prefer);
        }
        if let Some(b) = body {
            builder = builder.json(b);
        }
        builder
    }

    /// Send with backoff on gateway errors, timeouts and refused connections.
    async fn request_with_retry(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        prefer: Option<&str>,
        retry: &RetryConfig,
    ) -> FdResult<Response> {
        let url = self.url(path);
        debug!("{} {}", method, path);

        let mut last_error: Option<FdError> = None;

        for attempt in 0..=retry.max_retries {
            if attempt > 0 {
                let delay = calculate_retry_delay(retry, attempt - 1);
                warn!(
                    "retry {attempt}/{} for {method} {path} in {:.1}s",
                    retry.max_retries,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
            }

            let builder = self.build_request(method.clone(), &url, body, prefer);

            match builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    if retry.retryable_statuses.contains(&status.as_u16()) && attempt < retry.max_retries {
                        warn!(status = status.as_u16(), path, "backend gateway error");
                        last_error = Some(FdError::ServerError {
                            status: status.as_u16(),
                            message: format!("retryable status {status}"),
                        });
                        continue;
                    }

                    return Self::check_status(response).await;
                }
                Err(e) => {
                    let is_retryable = e.is_timeout() || e.is_connect();
                    let err = Self::classify_error(e);

                    if is_retryable && attempt < retry.max_retries {
                        warn!(path, "transport error: {err}");
                        last_error = Some(err);
                        continue;
                    }

                    return Err(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| FdError::Http("max retries exceeded".into())))
    }


    /// GET, retried.
    pub async fn get(&self, path: &str) -> FdResult<Response> {
        self.request_with_retry(Method::GET, path, None, None, &self.retry_config)
            .await
    }

    /// Execute a POST request with a JSON body, asking for the written rows back.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> FdResult<Response> {
        self.request_with_retry(
            Method::POST,
            path,
            Some(body),
            Some("return=representation"),
            &self.retry_config,
        )
        .await
    }

    /// Execute a POST request exactly once, whatever the retry config says.
    /// Used for calls with side effects outside the backend's own tables.
    pub async fn post_once(&self, path: &str, body: &serde_json::Value) -> FdResult<Response> {
        self.request_with_retry(Method::POST, path, Some(body), None, &RetryConfig::none())
            .await
    }

    /// Execute a PATCH request, asking for the updated rows back.
    pub async fn patch(&self, path: &str, body: &serde_json::Value) -> FdResult<Response> {
        self.request_with_retry(
            Method::PATCH,
            path,
            Some(body),
            Some("return=representation"),
            &self.retry_config,
        )
        .await
    }

    /// Execute a DELETE request, asking for the removed rows back.
    pub async fn delete(&self, path: &str) -> FdResult<Response> {
        self.request_with_retry(
            Method::DELETE,
            path,
            None,
            Some("return=representation"),
            &self.retry_config,
        )
        .await
    }


    /// Deserialize a JSON response body.
    pub async fn parse_json<T: DeserializeOwned>(response: Response) -> FdResult<T> {
        response
            .json::<T>()
            .await
            .map_err(|e| FdError::Serialization(format!("failed to parse response: {e}")))
    }

    /// Convenience: GET + parse.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> FdResult<T> {
        let resp = self.get(path).await?;
        Self::parse_json(resp).await
    }

    /// Check the HTTP status code and convert error bodies into `FdError`.
    async fn check_status(response: Response) -> FdResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = BackendError::from_body(&body).describe();

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FdError::AuthFailed(format!("backend returned {status}: {detail}")));
        }

        Err(FdError::ServerError {
            status: status.as_u16(),
            message: detail,
        })
    }

    /// Classify a reqwest error into an FdError variant.
    fn classify_error(e: reqwest::Error) -> FdError {
        if e.is_timeout() {
            FdError::Timeout(e.to_string())
        } else if e.is_connect() {
            FdError::Http(format!("connection failed: {e}"))
        } else {
            FdError::Http(e.to_string())
        }
    }
}

/// Backoff before retry number `attempt` (0-based), capped at `max`.
fn calculate_retry_delay(retry: &RetryConfig, attempt: u32) -> Duration {
    let base_ms = retry.base_delay.as_millis() as u64;
    let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(32));
    let max_ms = retry.max_delay.as_millis() as u64;
    Duration::from_millis(delay_ms.min(max_ms))
}

fn header_value(value: &str) -> FdResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| FdError::Config(format!("invalid header value in backend config: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BackendConfig {
        BackendConfig {
            url: "abc.backend.example/".into(),
            api_key: "anon-key".into(),
            access_token: String::new(),
            api_timeout_ms: 30000,
            accept_invalid_certs: false,
        }
    }

    #[test]
    fn test_base_url_sanitized() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url(), "https://abc.backend.example");
        assert_eq!(client.url("/rest/v1/clients"), "https://abc.backend.example/rest/v1/clients");
    }

    #[test]
    fn test_missing_settings() {
        let mut config = test_config();
        config.api_key.clear();
        assert!(matches!(ApiClient::new(&config), Err(FdError::MissingConfig(_))));

        config = test_config();
        config.url = "  ".into();
        assert!(matches!(ApiClient::new(&config), Err(FdError::MissingConfig(_))));
    }

    #[test]
    fn test_bad_header_value() {
        let mut config = test_config();
        config.api_key = "line\nbreak".into();
        assert!(matches!(ApiClient::new(&config), Err(FdError::Config(_))));
    }

    #[test]
    fn test_retry_delay_calculation() {
        let retry = RetryConfig::default();
        assert_eq!(calculate_retry_delay(&retry, 0), Duration::from_secs(1));
        assert_eq!(calculate_retry_delay(&retry, 1), Duration::from_secs(2));
        assert_eq!(calculate_retry_delay(&retry, 2), Duration::from_secs(4));
        assert!(calculate_retry_delay(&retry, 40) <= Duration::from_secs(4));
    }

    #[test]
    fn test_retry_none() {
        assert_eq!(RetryConfig::none().max_retries, 0);
    }
}
