//! Cron job driving periodic catalog synchronization.

use std::str::FromStr;
use std::sync::Arc;

use apalis::prelude::*;
use apalis_cron::Schedule;
use thiserror::Error;

use crate::application::sync::SyncService;

/// Marker struct for the cron-triggered sync job.
/// Must implement `From<chrono::DateTime<chrono::Utc>>` for apalis-cron compatibility.
#[derive(Default, Debug, Clone)]
pub struct SyncJob;

impl From<chrono::DateTime<chrono::Utc>> for SyncJob {
    fn from(_: chrono::DateTime<chrono::Utc>) -> Self {
        Self
    }
}

#[derive(Clone)]
pub struct SyncJobContext {
    pub sync: Arc<SyncService>,
}

/// Run one sync pass. Failures are logged and retried on the next tick.
pub async fn process_sync_job(
    _job: SyncJob,
    ctx: Data<SyncJobContext>,
) -> Result<(), apalis::prelude::Error> {
    match ctx.sync.run_once().await {
        Ok(Some(report)) => {
            tracing::debug!(
                target = "tavola::jobs::sync",
                mutations = report.mutations(),
                skipped = report.skipped.len(),
                "Sync pass finished"
            );
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!(
                target = "tavola::jobs::sync",
                error = %err,
                "Sync pass failed"
            );
        }
    }
    Ok(())
}

#[derive(Debug, Error)]
#[error("invalid cron expression `{expression}`: {message}")]
pub struct ScheduleError {
    pub expression: String,
    pub message: String,
}

/// Parse a six-field cron expression (seconds first).
pub fn sync_schedule(expression: &str) -> Result<Schedule, ScheduleError> {
    Schedule::from_str(expression).map_err(|err| ScheduleError {
        expression: expression.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_fires_every_fifteen_seconds() {
        let schedule = sync_schedule("*/15 * * * * *").expect("schedule");
        let upcoming: Vec<_> = schedule.upcoming(chrono::Utc).take(3).collect();
        assert_eq!(upcoming.len(), 3);
        assert_eq!((upcoming[1] - upcoming[0]).num_seconds(), 15);
    }

    #[test]
    fn garbage_expression_is_rejected() {
        let err = sync_schedule("every now and then").unwrap_err();
        assert_eq!(err.expression, "every now and then");
    }
}
