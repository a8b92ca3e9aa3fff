//! Domain error types.
//!
//! Extraction failures are not errors: a page without a readable counter is
//! reported as [`crate::scrape::SalesReading::NotFound`].

use thiserror::Error;

/// Input rejected by the store before anything is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Cumulative counters are never negative
    #[error("total_sales must be non-negative, got {0}")]
    NegativeSales(i64),

    /// Snapshot refers to a shop that was never registered
    #[error("shop {0} is not registered")]
    UnknownShop(i64),

    /// Shop names are lookup keys and cannot be blank
    #[error("shop name must not be empty")]
    EmptyShopName,
}

/// A single shop's fetch failed. Isolated to that shop; never retried.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// Storefront answered with a non-success status
    #[error("server error: HTTP {0}")]
    Status(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => FetchError::Status(status.as_u16()),
            None => FetchError::Network(err.to_string()),
        }
    }
}
