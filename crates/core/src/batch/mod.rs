//! Batch provisioning: plan files, pacing and the sequential driver.

mod driver;
mod pacer;
mod plan;

pub use driver::{BatchDriver, BatchEntry, BatchReport, EntryStatus};
pub use pacer::{create_pacer, FixedIntervalPacer, NoPacer, Pacer, TokenBucket, TokenBucketPacer};
pub use plan::{
    load_plan, parse_plan, BatchPlan, PasswordPolicy, PlanError, PlannedMeeting, ResolvedMeeting,
};
