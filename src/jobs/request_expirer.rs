use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::services::AdmissionService;

/// Registers the expiry sweep on the shared scheduler.
///
/// The sweep only ever moves Pending requests to Expired through the same
/// guarded transition the instructor endpoints use, so it is safe to run
/// concurrently with live traffic. Store failures are logged and the next
/// tick retries naturally; the job itself never retries.
pub async fn schedule_sweep(
    scheduler: &JobScheduler,
    service: Arc<AdmissionService>,
    cron_schedule: &str,
    expiration_hours: i64,
) -> Result<(), JobSchedulerError> {
    let job = Job::new_async(cron_schedule, move |_id, _scheduler| {
        let service = service.clone();
        Box::pin(async move {
            match service.expire_old_requests(expiration_hours).await {
                Ok(expired) => {
                    tracing::debug!(expired, "expiry sweep completed");
                }
                Err(err) => {
                    tracing::error!(error = %err, "expiry sweep failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}
