//! Warframe alert API integration.
//!
//! This module provides the client side of the remote alert API:
//!
//! - `requester` - HTTP client issuing `GET {url}/{platform}/alerts`
//! - `response_structs` - lenient deserialization of raw alert records
//! - `fetcher` - fetch, expiry filtering and conversion into [`Alert`](crate::store::Alert)s
//!
//! # Examples
//!
//! ```ignore
//! let requester = WarframeRequester::new("https://api.warframestat.us", Duration::from_secs(10))?;
//! let fetcher = AlertFetcher::new(Arc::new(requester), Arc::new(SystemTimeSource));
//! let alerts = fetcher.fetch(Platform::Pc).await?;
//! ```

mod fetcher;
mod requester;
mod response_structs;

pub use crate::warframe::fetcher::AlertFetcher;
#[cfg(test)]
pub use crate::warframe::requester::MockRequester;
pub use crate::warframe::requester::{Requester, WarframeRequester};

/// Errors that can occur while fetching alerts from the remote API.
///
/// All variants are recoverable: the next polling interval retries naturally.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request could not be sent or timed out.
    #[error("transport error: {0}")]
    Transport(String),
    /// The API answered with a non-success HTTP status.
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    /// The response body is not a JSON array.
    #[error("invalid response body: {0}")]
    Parse(String),
}
