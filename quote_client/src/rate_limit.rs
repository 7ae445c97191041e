//! Single-retry rate-limit protocol.
//!
//! When the quote service answers `429 Too Many Requests`, it names a wait in
//! whole seconds in the `Retry-After` header. The caller blocks for exactly that
//! long and reissues the identical request once. Whatever the second response
//! is, it is final: a second `429` is [`PipelineError::RateLimitExhausted`],
//! a missing or unparseable header is too, and no third attempt is ever made.
use std::time::Duration;

use log::{info, warn};
use quote_common::{PipelineError, Result};

use crate::transport::{HttpTransport, RawResponse, Sleeper};

/// Which request of the protocol is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Initial request.
    First,
    /// The one reissue allowed after a rate-limit wait.
    Retry,
}

/// Parses a `Retry-After` value in whole seconds.
pub fn parse_retry_after(value: Option<&str>) -> Result<Duration> {
    let raw = value.ok_or_else(|| {
        PipelineError::RateLimitExhausted("rate limited without Retry-After header".into())
    })?;
    let secs: u64 = raw.trim().parse().map_err(|_| {
        PipelineError::RateLimitExhausted(format!("unparseable Retry-After value {raw:?}"))
    })?;
    Ok(Duration::from_secs(secs))
}

/// Sends a GET through `transport`, honouring at most one rate-limit wait.
///
/// Returns the successful response. Non-2xx statuses other than the handled
/// `429` are `Network` errors.
pub fn send_with_rate_limit<T, S>(
    transport: &T,
    sleeper: &S,
    path: &str,
    query: &[(&str, &str)],
) -> Result<RawResponse>
where
    T: HttpTransport + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut attempt = Attempt::First;
    loop {
        let response = transport.get(path, query)?;

        if response.is_rate_limited() {
            if attempt == Attempt::Retry {
                return Err(PipelineError::RateLimitExhausted(format!(
                    "{path} still rate limited after retry"
                )));
            }
            let wait = parse_retry_after(response.retry_after.as_deref())?;
            warn!(
                "Too many requests made to quote service, sleeping for {}s",
                wait.as_secs()
            );
            sleeper.sleep(wait);
            info!("Retrying request {}", path);
            attempt = Attempt::Retry;
            continue;
        }

        if !response.is_success() {
            return Err(PipelineError::Network(format!(
                "{path} returned HTTP {}",
                response.status
            )));
        }
        return Ok(response);
    }
}
