//! One provider endpoint wrapped with rate limiting and classified retry.

use crate::{Clock, ProviderSettings, RateLimiter, RetryPolicy};
use lectern_error::{ConfigError, ProviderError, ProviderErrorKind};
use reqwest::Method;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Shape of one HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// HTTP method
    pub method: Method,
    /// Extra headers
    pub headers: Vec<(String, String)>,
    /// Query parameters
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl RequestOptions {
    /// A GET with no headers.
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
        }
    }

    /// A POST carrying `body`.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            ..Self::get()
        }
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a query parameter.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

/// Rate-limited, retrying client for one provider.
///
/// Before every attempt the shared [`RateLimiter`] is consulted. Failures
/// are classified by [`ProviderError::classify`] and only the ones the
/// [`RetryPolicy`] accepts are retried, with the policy's backoff between
/// attempts. The last classified error is returned once retries run out.
#[derive(Debug, Clone)]
pub struct ResilientRequestClient {
    name: String,
    base_url: String,
    limiter: Arc<RateLimiter>,
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    http: reqwest::Client,
}

impl ResilientRequestClient {
    /// Assemble a client from its parts.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        limiter: Arc<RateLimiter>,
        policy: RetryPolicy,
        clock: Arc<dyn Clock>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter,
            policy,
            clock,
            http,
        })
    }

    /// Build a client from provider settings.
    pub fn from_settings(
        name: impl Into<String>,
        settings: &ProviderSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let limiter = Arc::new(RateLimiter::from_settings(&settings.rate_limit, clock.clone()));
        Self::new(
            name,
            settings.base_url.clone(),
            limiter,
            RetryPolicy::from_settings(&settings.retry),
            clock,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// Provider name used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` with rate limiting and retry.
    ///
    /// The operation receives the retry index (0 on the first attempt).
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;
        loop {
            self.limiter.admit().await;

            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(provider = %self.name, retries = attempt, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    let classification = error.classification();
                    if !self.policy.should_retry(&error, attempt) {
                        warn!(
                            provider = %self.name,
                            attempt = attempt + 1,
                            classification,
                            error = %error.kind,
                            "Request failed, not retrying"
                        );
                        return Err(error);
                    }

                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        provider = %self.name,
                        attempt = attempt + 1,
                        classification,
                        delay_ms = delay.as_millis() as u64,
                        error = %error.kind,
                        "Request failed, retrying"
                    );
                    self.clock.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Send one JSON request to `endpoint` (relative to the base URL).
    #[instrument(skip(self, options), fields(provider = %self.name, method = %options.method))]
    pub async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, ProviderError> {
        let url = self.url(endpoint);
        self.execute(|_| self.send_once(&url, options)).await
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
        }
    }

    async fn send_once(&self, url: &str, options: &RequestOptions) -> Result<Value, ProviderError> {
        let mut request = self.http.request(options.method.clone(), url);
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::classify(e.status().map(|s| s.as_u16()), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::classify(Some(status.as_u16()), text));
        }

        response.json::<Value>().await.map_err(|e| {
            ProviderError::new(ProviderErrorKind::InvalidResponse(format!(
                "Failed to parse response body: {}",
                e
            )))
        })
    }
}
