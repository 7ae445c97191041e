//! HTTP transport seam for the quote service.
//!
//! `HttpTransport` is the only place that touches the network. The production
//! implementation wraps a blocking `reqwest` client and logs every round trip;
//! tests substitute scripted transports so the rate-limit protocol can be
//! exercised without a live HTTP stack.
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use quote_common::{PipelineError, Result};
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};

/// Default request timeout for quote-service calls.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Status code the quote service uses to signal rate limiting.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Response data the client needs, detached from the HTTP library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw value of the `Retry-After` header, if any.
    pub retry_after: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` when the service asks the caller to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status == TOO_MANY_REQUESTS
    }
}

/// Issues GET requests against the quote service.
pub trait HttpTransport {
    /// Sends `GET {base}{path}?{query}`. Transport failures are `Network` errors;
    /// non-2xx statuses are returned as-is for the caller to interpret.
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        (**self).get(path, query)
    }
}

/// Blocking `reqwest` transport with a base URL and round-trip logging.
pub struct ReqwestTransport {
    client: Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Builds a transport for `base_url` with the given request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| PipelineError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Started HTTP call GET {} {:?}", url, query);
        let start = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .map_err(|e| {
                warn!("Request GET {} failed: {}", url, e);
                PipelineError::Network(e.to_string())
            })?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .map_err(|e| PipelineError::Network(format!("failed to read body: {e}")))?
            .to_vec();

        info!(
            "Incoming response GET {} status={} duration={:?} bytes={}",
            url,
            status,
            start.elapsed(),
            body.len()
        );
        Ok(RawResponse {
            status,
            retry_after,
            body,
        })
    }
}

/// Blocks the calling thread for a duration.
pub trait Sleeper {
    /// Sleeps for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}
