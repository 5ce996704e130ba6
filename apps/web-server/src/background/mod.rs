//! Background jobs.

mod scheduler;

pub use scheduler::{CACHE_SWEEP_SCHEDULE, Scheduler, SchedulerConfig, schedule_cache_sweep};
