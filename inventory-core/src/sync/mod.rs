//! Registry reconciliation
//!
//! - `registry`: client seam and service-name paging
//! - `plan`: pure diffs of local rows against registry listings
//! - `synchronizer`: transactional apply and the per-URL client cache
//! - `scheduler`: periodic background task

pub mod plan;
pub mod registry;
pub mod scheduler;
pub mod synchronizer;

pub use registry::{collect_service_names, RegistryClient};
pub use scheduler::start_sync_scheduler;
pub use synchronizer::{ClientFactory, ClusterSyncStats, NacosSynchronizer, SyncSettings, SyncSummary};
