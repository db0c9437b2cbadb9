use std::path::PathBuf;

use async_trait::async_trait;
use pillminder_models::schedule::Schedule;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot access schedule store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schedule store {path:?} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot serialize schedules: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Invalid timestamp {value:?} in schedule {name:?}")]
    InvalidTimestamp { name: String, value: String },

    #[error("Invalid schedule {name:?}: {reason}")]
    InvalidRecord { name: String, reason: &'static str },
}

/// Whole-set persistence for schedules.
///
/// There are no per-record updates: `save_all` replaces everything that
/// was stored before. Order is preserved across load/save cycles.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// A store that does not exist yet loads as empty.
    async fn load_all(&self) -> Result<Vec<Schedule>, StoreError>;
    async fn save_all(&self, schedules: &[Schedule]) -> Result<(), StoreError>;
}
