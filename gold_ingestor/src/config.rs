//! Ingestor configuration: parsing, validation, and loading.
//!
//! Configuration is a TOML file (conventionally `gold_ingestor.toml`); every
//! section is optional and defaults to the production setup:
//!
//! ```toml
//! timezone = "Asia/Tehran"
//!
//! [provider]
//! url = "https://milli.gold/api/v1/public/milli-price/external"
//! timeout_secs = 10
//!
//! [storage]
//! backend = "github"
//! owner = "D3rhami"
//! repo = "milli-gold-capture"
//! directory = "database"
//! token_env = "GITHUB_TOKEN"
//!
//! [schedule]
//! cron = "0 * * * * *"
//!
//! [retry]
//! max_retries = 3
//!
//! [chart]
//! default_range = "1d"
//! price_multiplier = 1.0
//!
//! [ranges.6h]
//! lookback = "6h"
//! bucket = "1m"
//! days_to_load = 1
//! ```
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]

use std::path::Path;

use anyhow::{Context, bail};
use chrono_tz::Tz;
use indexmap::IndexMap;
use price_engine::{
    ChartContext,
    axis::AxisConfig,
    csv_codec::CsvLayout,
    filter::Anchor,
    range::{RangeSpec, RangeTable},
    stats::AnnotationConfig,
    tz::DEFAULT_TIMEZONE,
};
use serde::{Deserialize, Serialize};

use crate::providers::milli_rest::{BROWSER_USER_AGENT, DEFAULT_QUOTE_URL};
use crate::retry::RetryConfig;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct IngestorConfig {
    /// Reference zone for blob days, bucket alignment and log stamps.
    pub timezone: Tz,
    /// Upstream quote endpoint.
    pub provider: ProviderConfig,
    /// Where day blobs live.
    pub storage: StorageConfig,
    /// When the capture job runs.
    pub schedule: ScheduleConfig,
    /// Conflict retry policy.
    pub retry: RetryConfig,
    /// Chart tuning.
    pub chart: ChartConfig,
    /// Extra or overridden display ranges.
    pub ranges: IndexMap<String, RangeSpec>,
}

impl Default for IngestorConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            provider: ProviderConfig::default(),
            storage: StorageConfig::default(),
            schedule: ScheduleConfig::default(),
            retry: RetryConfig::default(),
            chart: ChartConfig::default(),
            ranges: IndexMap::new(),
        }
    }
}

/// Upstream quote endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderConfig {
    /// Quote URL.
    pub url: String,
    /// `User-Agent` header.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_QUOTE_URL.to_string(),
            user_agent: BROWSER_USER_AGENT.to_string(),
            timeout_secs: 10,
        }
    }
}

/// Which [`crate::storage::BlobStore`] to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// GitHub contents API.
    Github,
    /// Process memory (dry runs).
    Memory,
}

/// Blob storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct StorageConfig {
    /// Store implementation.
    pub backend: StorageBackend,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Directory inside the repository holding the day blobs.
    pub directory: String,
    /// Branch to read and write; the repository default when unset.
    pub branch: Option<String>,
    /// Environment variable holding the access token.
    pub token_env: String,
    /// Key of the error log blob.
    pub log_key: String,
    /// Header layout for newly created day blobs.
    pub layout: CsvLayout,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Github,
            owner: "D3rhami".to_string(),
            repo: "milli-gold-capture".to_string(),
            directory: "database".to_string(),
            branch: None,
            token_env: "GITHUB_TOKEN".to_string(),
            log_key: "server.log".to_string(),
            layout: CsvLayout::WithSolarDate,
        }
    }
}

/// Capture schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ScheduleConfig {
    /// Six-field cron expression (with seconds).
    pub cron: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: "0 * * * * *".to_string(),
        }
    }
}

/// Chart tuning.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ChartConfig {
    /// Range used for unknown tokens.
    pub default_range: String,
    /// Factor applied to plotted prices.
    pub price_multiplier: f64,
    /// Label placement.
    pub annotation: AnnotationConfig,
    /// Axis padding.
    pub axis: AxisConfig,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            default_range: price_engine::range::DEFAULT_RANGE.to_string(),
            price_multiplier: 1.0,
            annotation: AnnotationConfig::default(),
            axis: AxisConfig::default(),
        }
    }
}

impl IngestorConfig {
    /// Check cross-field constraints.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.url.trim().is_empty() {
            bail!("provider.url must not be empty");
        }
        if self.provider.timeout_secs == 0 {
            bail!("provider.timeout_secs must be at least 1");
        }
        if self.storage.backend == StorageBackend::Github
            && (self.storage.owner.trim().is_empty() || self.storage.repo.trim().is_empty())
        {
            bail!("storage.owner and storage.repo are required for the github backend");
        }
        if self.storage.log_key.trim().is_empty() {
            bail!("storage.log_key must not be empty");
        }
        if self.schedule.cron.split_whitespace().count() != 6 {
            bail!(
                "schedule.cron must have six fields (sec min hour day month weekday): {:?}",
                self.schedule.cron
            );
        }
        if !self.chart.price_multiplier.is_finite() || self.chart.price_multiplier <= 0.0 {
            bail!("chart.price_multiplier must be a positive number");
        }
        self.chart_context().map(|_| ())
    }

    /// Engine context built from the `[chart]` and `[ranges]` sections.
    pub fn chart_context(&self) -> anyhow::Result<ChartContext> {
        let mut ranges = RangeTable::builtin();
        ranges.merge(&self.ranges)?;
        ranges
            .set_default(&self.chart.default_range)
            .context("chart.default_range")?;
        Ok(ChartContext {
            ranges,
            timezone: self.timezone,
            price_multiplier: self.chart.price_multiplier,
            annotation: self.chart.annotation.clone(),
            axis: self.chart.axis,
            anchor: Anchor::LatestSample,
        })
    }
}

/// Parse + validate from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<IngestorConfig> {
    let cfg: IngestorConfig = toml::from_str(s).context("parse ingestor config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parse + validate from a file path.
pub fn load_config_path(path: impl AsRef<Path>) -> anyhow::Result<IngestorConfig> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read ingestor config: {}", path.display()))?;
    load_config_str(&s).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_production_defaults() {
        let cfg = load_config_str("").unwrap();
        assert_eq!(cfg, IngestorConfig::default());
        assert_eq!(cfg.timezone, chrono_tz::Asia::Tehran);
        assert_eq!(cfg.storage.backend, StorageBackend::Github);
        assert_eq!(cfg.provider.timeout_secs, 10);
    }

    #[test]
    fn sections_and_range_overrides() {
        let cfg = load_config_str(
            r#"
            timezone = "Europe/Berlin"

            [storage]
            backend = "memory"
            layout = "basic"

            [retry]
            max_retries = 5
            jitter = false

            [chart]
            default_range = "6h"
            price_multiplier = 0.1

            [chart.annotation]
            edge_offset_px = 30

            [ranges.6h]
            lookback = "6h"
            bucket = "1m"
            days_to_load = 1
            "#,
        )
        .unwrap();
        assert_eq!(cfg.timezone, chrono_tz::Europe::Berlin);
        assert_eq!(cfg.storage.layout, CsvLayout::Basic);
        assert_eq!(cfg.retry.max_retries, 5);
        assert_eq!(cfg.retry.initial_delay_ms, 200);

        let ctx = cfg.chart_context().unwrap();
        assert_eq!(ctx.ranges.default_token(), "6h");
        assert_eq!(ctx.annotation.edge_offset_px, 30);
        assert_eq!(ctx.annotation.min_label_offset_y, 35);
        assert_eq!(ctx.ranges.resolve("nope").token, "6h");
    }

    #[test]
    fn rejects_invalid_configs() {
        assert!(load_config_str("[provider]\nretries = 3").is_err());
        assert!(load_config_str("timezone = \"Mars/Olympus\"").is_err());
        assert!(load_config_str("[schedule]\ncron = \"* * * * *\"").is_err());
        assert!(load_config_str("[chart]\ndefault_range = \"2y\"").is_err());
        assert!(load_config_str("[ranges.2y]\nlookback = \"730D\"\ndays_to_load = 0").is_err());
        assert!(load_config_str("[storage]\nowner = \"\"").is_err());
    }

    #[test]
    fn rejects_ranges_the_engine_cannot_honour() {
        let err = load_config_str(
            r#"
            [ranges.6h]
            lookback = "6h"
            bucket = "90m"
            days_to_load = 1
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("90m"), "{err:#}");

        for bad in [
            "[ranges.2d]\nlookback = \"2D\"\nbucket = \"48h\"\ndays_to_load = 3",
            "[ranges.ever]\nlookback = \"4000000000D\"\ndays_to_load = 1",
            "[ranges.ever]\nlookback = \"1D\"\ndays_to_load = 100000",
        ] {
            assert!(load_config_str(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn loads_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "[provider]\ntimeout_secs = 3").unwrap();
        let cfg = load_config_path(f.path()).unwrap();
        assert_eq!(cfg.provider.timeout_secs, 3);
        assert!(load_config_path("/definitely/not/here.toml").is_err());
    }
}
