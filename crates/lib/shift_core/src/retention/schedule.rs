//! Daily cron registration for the sweeper.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::info;

use super::RetentionSweeper;

/// Every day at midnight (UTC). Six fields: sec min hour day month weekday.
pub const SWEEP_SCHEDULE: &str = "0 0 0 * * *";

/// Start a scheduler that runs one sweep tick per day.
///
/// The returned scheduler must be kept and shut down by the caller.
pub async fn schedule_daily_sweep(
    sweeper: Arc<RetentionSweeper>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(SWEEP_SCHEDULE, move |_uuid, _lock| {
        let sweeper = Arc::clone(&sweeper);
        Box::pin(async move {
            info!("retention sweep starting");
            sweeper.sweep().await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!(schedule = SWEEP_SCHEDULE, "retention sweep scheduled");
    Ok(scheduler)
}
