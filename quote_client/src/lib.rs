//! Client for the external quote service.
//!
//! - `transport` — the HTTP seam (`HttpTransport`, blocking `reqwest` implementation,
//!   `Sleeper`).
//! - `rate_limit` — the single-retry `429 Too Many Requests` protocol.
//! - `client` — `QuoteSource` trait and the `QuoteClient` batch/single price calls.
#![warn(missing_docs)]
pub mod client;
pub mod rate_limit;
pub mod transport;

pub use client::{QuoteClient, QuoteSource};
pub use transport::{HttpTransport, RawResponse, ReqwestTransport, Sleeper, ThreadSleeper};
