use pillminder_models::schedule::Schedule;
use tokio::sync::Mutex;

use crate::{ScheduleStore, StoreError};

/// The single mutual-exclusion point for every read-modify-write of the
/// schedule set. Holding the lock across load and save is what keeps
/// concurrent writers from overwriting each other's changes.
pub struct GuardedStore {
    inner: Mutex<Box<dyn ScheduleStore>>,
}

impl GuardedStore {
    pub fn new(store: impl ScheduleStore + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(store)),
        }
    }

    pub async fn snapshot(&self) -> Result<Vec<Schedule>, StoreError> {
        self.inner.lock().await.load_all().await
    }

    /// Loads the full set, applies `change` and saves the result, all under
    /// one lock. Nothing is written when `change` leaves the set untouched.
    pub async fn modify<T>(
        &self,
        change: impl FnOnce(&mut Vec<Schedule>) -> T,
    ) -> Result<T, StoreError> {
        let store = self.inner.lock().await;
        let mut schedules = store.load_all().await?;
        let before = schedules.clone();

        let result = change(&mut schedules);

        if schedules != before {
            store.save_all(&schedules).await?;
        }

        Ok(result)
    }
}
