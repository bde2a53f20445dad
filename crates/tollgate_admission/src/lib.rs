//! The admission pipeline for the Tollgate library.
//!
//! Composes the rate limiter, subscription gate, and quota ledger into
//! one allow/deny decision per inbound message, plus the asynchronous
//! machinery around it: the bounded usage-recording queue, threshold
//! alerting with dedup, and the scheduled maintenance passes.
//!
//! Every collaborator is dependency-injected; the process entry point
//! owns the limiter registry, the stores, and the worker tasks.

mod maintenance;
mod notifier;
mod pipeline;
mod recorder;
mod schedule;

pub use maintenance::Maintenance;
pub use notifier::{
    LIMIT_COOLDOWN_HOURS, LIMIT_THRESHOLD_PERCENT, UsageNotifier, WARNING_COOLDOWN_HOURS,
    WARNING_THRESHOLD_PERCENT,
};
pub use pipeline::{AdmissionPipeline, AdmissionRequest, StoreTimeouts};
pub use recorder::{DEFAULT_QUEUE_CAPACITY, RecorderHandle, UsageMessage, UsageRecorder};
pub use schedule::{MaintenancePlan, MaintenanceRunner, MaintenanceSchedule};
