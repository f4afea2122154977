use std::{io, path::PathBuf, sync::Arc};

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use gold_ingestor::{
    cli::commands::{Cli, Commands},
    config::{IngestorConfig, load_config_path},
    ingest::IngestJob,
    loader::DayLoader,
    providers::milli_rest::MilliProvider,
    scheduler::run_scheduled,
    storage::build_store,
};
use price_engine::{
    filter::Anchor,
    render::{ChartRenderer, JsonRenderer},
    tz::local_day,
};
use shared_utils::env::get_env_var;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(|| get_env_var("GOLD_INGESTOR_CONFIG").ok().map(PathBuf::from));
    let config = match &config_path {
        Some(path) => load_config_path(path)?,
        None => {
            info!("no config file given, using defaults");
            IngestorConfig::default()
        }
    };

    let store = build_store(&config.storage).context("open blob store")?;

    match cli.command {
        Commands::Capture => {
            let provider = MilliProvider::new(&config.provider).context("build quote provider")?;
            let job = IngestJob::from_config(&config, Arc::new(provider), store);
            let report = job.run_once().await?;
            println!("{}", serde_json::to_string(&report)?);
        }

        Commands::Run { cron } => {
            let provider = MilliProvider::new(&config.provider).context("build quote provider")?;
            let job = Arc::new(IngestJob::from_config(&config, Arc::new(provider), store));
            let cron = cron.unwrap_or_else(|| config.schedule.cron.clone());
            run_scheduled(job, &cron).await?;
        }

        Commands::Chart {
            range,
            day,
            now,
            pretty,
        } => {
            let ctx = config.chart_context()?;
            let day = day.unwrap_or_else(|| local_day(Utc::now(), config.timezone));
            let loader = DayLoader::new(store, config.timezone);
            let (series, report) = loader.load_range(&ctx.ranges, &range, day).await;
            if !report.failed.is_empty() {
                warn!(failed = ?report.failed, "some days could not be loaded");
            }
            info!(
                loaded = report.loaded.len(),
                missing = report.missing.len(),
                skipped_rows = report.skipped_rows,
                "loaded days"
            );

            let anchor = if now { Anchor::At(Utc::now()) } else { ctx.anchor };
            let plan = ctx.plan_at(&series, &range, anchor);
            let stdout = io::stdout().lock();
            let mut renderer = if pretty {
                JsonRenderer::pretty(stdout)
            } else {
                JsonRenderer::new(stdout)
            };
            renderer.render(&plan)?;
        }
    }

    Ok(())
}
