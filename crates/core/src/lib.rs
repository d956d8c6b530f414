pub mod batch;
pub mod config;
pub mod directory;
pub mod meeting_api;
pub mod password;
pub mod reconciler;
pub mod snapshot;
pub mod testing;

pub use batch::{
    create_pacer, load_plan, parse_plan, BatchDriver, BatchPlan, BatchReport, EntryStatus,
    FixedIntervalPacer, NoPacer, Pacer, PlanError, ResolvedMeeting, TokenBucketPacer,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PacingMethod,
    SanitizedConfig, StoreBackend,
};
pub use directory::{DirectoryError, UserDirectory};
pub use meeting_api::{
    MeetingApi, MeetingApiError, MeetingResource, UserDirectoryEntry, ZoomClient,
};
pub use password::derive_password;
pub use reconciler::{
    MeetingConfig, MeetingIdentifier, ReconcileAction, ReconcileError, ReconcileOutcome,
    Reconciler,
};
pub use snapshot::{
    create_store, FileSnapshotStore, MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore,
    StoreError,
};
