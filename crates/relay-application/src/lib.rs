//! Application layer for relaybot.
//!
//! Coordinates the core traits with their implementations: the backup pipeline
//! that runs after every user action, the command dispatcher and the polling loop.

pub mod backup_pipeline;
pub mod dispatcher;
pub mod polling;
pub mod remote_sync;
pub mod startup;

pub use backup_pipeline::{BackupPipeline, PipelineOutcome};
pub use dispatcher::{CommandDispatcher, Dispatch};
pub use polling::{PollingLoop, UpdateBatch, UpdateSource};
pub use remote_sync::RemoteSync;
pub use startup::{RemoteStatus, check_remote_storage};
