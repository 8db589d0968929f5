mod sync;

pub use sync::{ScheduleError, SyncJob, SyncJobContext, process_sync_job, sync_schedule};
