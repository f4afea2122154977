use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header};
use snafu::ResultExt;
use tracing::{debug, instrument};

use crate::config::ProviderConfig;
use crate::models::quote::PriceQuote;
use crate::providers::{
    ApiSnafu, ClientBuildSnafu, ClientInitError, MalformedSnafu, ProviderError, QuoteProvider,
    ReqwestSnafu, ValidationSnafu,
};

/// Public milli.gold price endpoint.
pub const DEFAULT_QUOTE_URL: &str = "https://milli.gold/api/v1/public/milli-price/external";

/// The endpoint rejects non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Quote provider backed by the milli.gold REST endpoint.
#[derive(Debug, Clone)]
pub struct MilliProvider {
    client: Client,
    url: String,
}

impl MilliProvider {
    /// Creates a provider from config (URL, user agent, timeout).
    pub fn new(cfg: &ProviderConfig) -> Result<Self, ClientInitError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(cfg.user_agent.as_str())
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            url: cfg.url.clone(),
        })
    }
}

#[async_trait]
impl QuoteProvider for MilliProvider {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_quote(&self) -> Result<PriceQuote, ProviderError> {
        let response = self.client.get(&self.url).send().await.context(ReqwestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                status: status.as_u16(),
                message,
            }
            .fail();
        }

        let body = response.text().await.context(ReqwestSnafu)?;
        let quote: PriceQuote = serde_json::from_str(&body).context(MalformedSnafu)?;
        if let Some(message) = quote.problem() {
            return ValidationSnafu { message }.fail();
        }
        debug!(price = quote.price18, date = %quote.date, "fetched quote");
        Ok(quote)
    }
}
