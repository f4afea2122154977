//! Cron-driven capture loop.

use std::sync::Arc;

use anyhow::anyhow;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, warn};

use crate::ingest::IngestJob;

/// Run `job` on `cron` (six fields, with seconds) until Ctrl-C.
///
/// A failed run is logged by the job itself; the schedule keeps going.
pub async fn run_scheduled(job: Arc<IngestJob>, cron: &str) -> anyhow::Result<()> {
    let mut scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("create scheduler: {e:?}"))?;

    let capture = Job::new_async(cron, move |_uuid, _lock| {
        let job = Arc::clone(&job);
        Box::pin(async move {
            if let Err(err) = job.run_once().await {
                warn!(%err, "scheduled capture failed");
            }
        })
    })
    .map_err(|e| anyhow!("invalid cron expression {cron:?}: {e:?}"))?;

    scheduler
        .add(capture)
        .await
        .map_err(|e| anyhow!("register capture job: {e:?}"))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("start scheduler: {e:?}"))?;
    info!(%cron, "capture scheduled");

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    scheduler
        .shutdown()
        .await
        .map_err(|e| anyhow!("stop scheduler: {e:?}"))?;
    Ok(())
}
