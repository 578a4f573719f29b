use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE, RETRY_AFTER};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::portal::PortalError;

/// Rate-limited HTTP client for the portal API with a short-lived GET cache.
///
/// Every request carries the session cookie. Authentication failures are
/// reported as [`PortalError::Unauthorized`] pointing at the login route.
#[derive(Debug)]
pub struct RateLimitedHttpClient {
    http: reqwest::Client,
    base_url: String,
    login_url: String,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Cache<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    data: serde_json::Value,
    timestamp: i64,
}

impl RateLimitedHttpClient {
    /// Create a new rate-limited HTTP client from API settings
    pub fn new(api: &ApiConfig) -> Result<Self, PortalError> {
        let per_second = NonZeroU32::new(api.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(api.rate_limit.burst_capacity).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let mut headers = HeaderMap::new();
        if let Some(session) = api.session_cookie.as_deref() {
            let cookie = format!("{}={}", api.cookie_name, session);
            let value = HeaderValue::from_str(&cookie)
                .map_err(|e| PortalError::NetworkError(format!("invalid session cookie: {e}")))?;
            headers.insert(COOKIE, value);
        } else {
            warn!("No session cookie configured; requests will be unauthenticated");
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(api.timeout_seconds))
            .user_agent(concat!("ledger-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(api.cache.max_entries)
            .time_to_live(Duration::from_secs(api.cache.ttl_seconds))
            .build();

        let base_url = api.base_url.trim_end_matches('/').to_string();
        let login_url = format!("{}{}", api.login_base_url().trim_end_matches('/'), api.login_path);

        Ok(Self {
            http,
            base_url,
            login_url,
            rate_limiter,
            cache,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
    }

    /// GET a JSON document. A 404 resolves to `Ok(None)`.
    ///
    /// When `cache_key` is given, a cached copy is returned if still fresh and
    /// successful responses (including 404s) are cached under that key.
    pub async fn get_json<T>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cache_key: Option<String>,
    ) -> Result<Option<T>, PortalError>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(ref key) = cache_key {
            if let Some(cached) = self.cache.get(key).await {
                debug!(key = %key, "Cache hit");
                if let Ok(value) = serde_json::from_value(cached.data) {
                    return Ok(value);
                }
            }
        }

        self.throttle().await;
        debug!(path = %path, "GET");

        let response = self.http.get(self.url(path)).query(query).send().await?;

        let result: Option<T> = if response.status() == StatusCode::NOT_FOUND {
            debug!(path = %path, "Resource not found, treating as empty");
            None
        } else {
            let response = self.check_status(response, path).await?;
            Some(self.decode(response, path).await?)
        };

        if let Some(key) = cache_key {
            if let Ok(data) = serde_json::to_value(&result) {
                let entry = CacheEntry {
                    data,
                    timestamp: chrono::Utc::now().timestamp(),
                };
                self.cache.insert(key, entry).await;
            }
        }

        Ok(result)
    }

    /// POST a multipart form and decode the JSON reply.
    pub async fn post_multipart<T>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, PortalError>
    where
        T: DeserializeOwned,
    {
        self.throttle().await;
        debug!(path = %path, "POST multipart");

        let response = self.http.post(self.url(path)).multipart(form).send().await?;
        let response = self.check_status(response, path).await?;
        self.decode(response, path).await
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, PortalError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.throttle().await;
        debug!(path = %path, "POST json");

        let response = self.http.post(self.url(path)).json(body).send().await?;
        let response = self.check_status(response, path).await?;
        self.decode(response, path).await
    }

    async fn check_status(&self, response: Response, path: &str) -> Result<Response, PortalError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(path = %path, status = status.as_u16(), "Session rejected");
                Err(PortalError::Unauthorized {
                    login_url: self.login_url.clone(),
                })
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_seconds = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                Err(PortalError::RateLimit {
                    retry_after_seconds,
                })
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(PortalError::Status {
                    status: status.as_u16(),
                    endpoint: path.to_string(),
                    message: extract_message(&body)
                        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string()),
                })
            }
        }
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response, path: &str) -> Result<T, PortalError> {
        let bytes = response.bytes().await?;
        let body: &[u8] = if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            b"{}"
        } else {
            &bytes
        };
        serde_json::from_slice(body).map_err(|e| PortalError::Decode {
            endpoint: path.to_string(),
            message: e.to_string(),
        })
    }

    /// Invalidate cache entries whose key contains `pattern`
    pub async fn invalidate_cache_pattern(&self, pattern: &str) {
        let keys_to_remove: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.contains(pattern))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys_to_remove {
            self.cache.invalidate(&key).await;
        }

        debug!("Invalidated cache entries matching pattern: {}", pattern);
    }
}

/// Pull a human-readable message out of an error body: `{"message": ..}`,
/// `{"error": ..}`, or the raw text when it is short.
fn extract_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["message", "error", "detail"] {
            if let Some(msg) = value.get(field).and_then(|m| m.as_str()) {
                return Some(msg.to_string());
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 {
        Some(trimmed.to_string())
    } else {
        None
    }
}
