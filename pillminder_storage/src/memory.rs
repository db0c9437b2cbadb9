use async_trait::async_trait;
use pillminder_models::{
    dose_clock::truncate_to_minute,
    schedule::{DurationPolicy, Schedule},
};
use tokio::sync::RwLock;

use crate::{ScheduleStore, StoreError};

/// Keeps the schedule set in memory. Timestamps are truncated to the
/// minute on save, the same way the JSON file store persists them.
#[derive(Default)]
pub struct InMemoryScheduleStore {
    store: RwLock<Vec<Schedule>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schedules(schedules: Vec<Schedule>) -> Self {
        Self {
            store: RwLock::new(schedules.iter().map(persisted).collect()),
        }
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn load_all(&self) -> Result<Vec<Schedule>, StoreError> {
        Ok(self.store.read().await.clone())
    }

    async fn save_all(&self, schedules: &[Schedule]) -> Result<(), StoreError> {
        let mut store = self.store.write().await;
        *store = schedules.iter().map(persisted).collect();
        log::debug!("Saved {} schedules in memory", store.len());
        Ok(())
    }
}

fn persisted(schedule: &Schedule) -> Schedule {
    let duration = match schedule.duration {
        DurationPolicy::Days { end_time } => DurationPolicy::Days {
            end_time: truncate_to_minute(end_time),
        },
        DurationPolicy::Indefinite => DurationPolicy::Indefinite,
    };

    Schedule {
        start_time: truncate_to_minute(schedule.start_time),
        duration,
        ..schedule.clone()
    }
}
