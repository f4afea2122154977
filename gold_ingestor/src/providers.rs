//! Quote sources.
//!
//! [`QuoteProvider`] is the seam between the ingestion job and whatever serves
//! the current gold price. The production source is
//! [`milli_rest::MilliProvider`]; tests plug in fixed quotes.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use gold_ingestor::models::quote::PriceQuote;
//! use gold_ingestor::providers::{ProviderError, QuoteProvider};
//!
//! struct Fixed;
//!
//! #[async_trait]
//! impl QuoteProvider for Fixed {
//!     async fn fetch_quote(&self) -> Result<PriceQuote, ProviderError> {
//!         Ok(PriceQuote::new(66_120_000.0, "2025-06-10T14:30:05+03:30"))
//!     }
//! }
//! ```

pub mod milli_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::quote::PriceQuote;

/// Fetches the current quote.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// One request, one quote. Implementations validate the payload.
    async fn fetch_quote(&self) -> Result<PriceQuote, ProviderError>;
}

/// Errors building an HTTP-backed client (provider or store).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ClientInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Token or header value contains invalid characters.
    #[snafu(display("Invalid header value: {source}"))]
    InvalidHeader {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `QuoteProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// Network failure or timeout.
    #[snafu(display("Quote request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Non-success HTTP status.
    #[snafu(display("Quote API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// Body was not the expected JSON.
    #[snafu(display("Malformed quote payload: {source}"))]
    Malformed {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// Well-formed payload with unusable values.
    #[snafu(display("Invalid quote: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },
}
