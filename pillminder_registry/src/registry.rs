use std::{collections::HashSet, sync::Arc};

use pillminder_models::{
    chrono_tz::Tz,
    dose_clock,
    schedule::{DurationPolicy, DurationRequest, NewSchedule, Schedule},
};
use pillminder_scheduler::ReminderSupervisor;
use pillminder_storage::{GuardedStore, StoreError};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Schedule name must not be empty")]
    EmptyName,

    #[error("Frequency of schedule {0:?} must be positive")]
    ZeroFrequency(String),

    #[error("Duration of schedule {0:?} must be at least one day")]
    ZeroDuration(String),

    #[error("End of schedule {0:?} is out of range")]
    EndTimeOutOfRange(String),

    #[error("Schedule {0:?} already exists")]
    DuplicateName(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Enabled,
    Disabled,
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dashboard {
    pub total_schedules: usize,
    pub active_reminders: usize,
}

/// The operations the web layer calls: create, list, toggle and remove
/// schedules.
pub struct ScheduleRegistry {
    store: Arc<GuardedStore>,
    supervisor: Arc<ReminderSupervisor>,
    /// Serializes flag changes together with the timer start/stop they imply.
    lifecycle: Mutex<()>,
    timezone: Tz,
}

impl ScheduleRegistry {
    pub fn new(store: Arc<GuardedStore>, supervisor: Arc<ReminderSupervisor>, timezone: Tz) -> Self {
        Self {
            store,
            supervisor,
            lifecycle: Mutex::new(()),
            timezone,
        }
    }

    /// Adds every schedule of the batch, most recent first, or none of them.
    ///
    /// Reminders of new schedules start switched off.
    pub async fn add_batch(&self, batch: Vec<NewSchedule>) -> Result<Vec<Schedule>, RegistryError> {
        let created = batch
            .into_iter()
            .map(|new_schedule| self.build_schedule(new_schedule))
            .collect::<Result<Vec<_>, _>>()?;

        let mut batch_names = HashSet::new();
        if let Some(duplicate) = created.iter().find(|s| !batch_names.insert(s.name.as_str())) {
            return Err(RegistryError::DuplicateName(duplicate.name.clone()));
        }

        self.store
            .modify(|schedules| {
                if let Some(duplicate) = created
                    .iter()
                    .find(|new| schedules.iter().any(|s| s.name == new.name))
                {
                    return Err(RegistryError::DuplicateName(duplicate.name.clone()));
                }

                for schedule in &created {
                    schedules.insert(0, schedule.clone());
                }
                Ok(())
            })
            .await??;

        log::info!("Added {} schedules", created.len());
        Ok(created)
    }

    pub async fn toggle_reminder(&self, name: &str) -> Result<ToggleOutcome, RegistryError> {
        let _lifecycle = self.lifecycle.lock().await;

        let outcome = self
            .store
            .modify(|schedules| match schedules.iter_mut().find(|s| s.name == name) {
                Some(schedule) => {
                    schedule.reminder_active = !schedule.reminder_active;
                    if schedule.reminder_active {
                        ToggleOutcome::Enabled
                    } else {
                        ToggleOutcome::Disabled
                    }
                }
                None => ToggleOutcome::NotFound,
            })
            .await?;

        match outcome {
            ToggleOutcome::Enabled => self.supervisor.start(name).await,
            ToggleOutcome::Disabled => self.supervisor.stop(name).await,
            ToggleOutcome::NotFound => {
                log::info!("Cannot toggle reminder, no such schedule. [name = {}]", name)
            }
        }

        Ok(outcome)
    }

    /// Removing a schedule that does not exist succeeds.
    pub async fn remove(&self, name: &str) -> Result<(), RegistryError> {
        let _lifecycle = self.lifecycle.lock().await;

        let removed = self
            .store
            .modify(|schedules| {
                let before = schedules.len();
                schedules.retain(|s| s.name != name);
                before - schedules.len()
            })
            .await;
        self.supervisor.stop(name).await;

        let removed = removed?;
        log::info!("Removed schedule. [name = {}, removed = {}]", name, removed);
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Schedule>, RegistryError> {
        Ok(self.store.snapshot().await?)
    }

    pub async fn dashboard(&self) -> Result<Dashboard, RegistryError> {
        let schedules = self.store.snapshot().await?;

        Ok(Dashboard {
            total_schedules: schedules.len(),
            active_reminders: schedules.iter().filter(|s| s.reminder_active).count(),
        })
    }

    /// Starts timers for every stored schedule whose reminder is on.
    /// Called once at startup, since timers do not survive a restart.
    pub async fn resume(&self) -> Result<usize, RegistryError> {
        let _lifecycle = self.lifecycle.lock().await;

        let schedules = self.store.snapshot().await?;
        let mut resumed = 0;
        for schedule in schedules.iter().filter(|s| s.reminder_active) {
            self.supervisor.start(&schedule.name).await;
            resumed += 1;
        }

        log::info!("Resumed {} reminders", resumed);
        Ok(resumed)
    }

    pub async fn shutdown(&self) {
        let _lifecycle = self.lifecycle.lock().await;
        self.supervisor.shutdown().await;
    }

    fn build_schedule(&self, new_schedule: NewSchedule) -> Result<Schedule, RegistryError> {
        let NewSchedule {
            name,
            dosage,
            frequency_seconds,
            duration,
            start_time,
            recipient_email,
        } = new_schedule;

        if name.trim().is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if frequency_seconds == 0 {
            return Err(RegistryError::ZeroFrequency(name));
        }

        let start_time = dose_clock::localize(start_time, &self.timezone);
        let duration = match duration {
            DurationRequest::Days(0) => return Err(RegistryError::ZeroDuration(name)),
            DurationRequest::Days(_) => {
                match dose_clock::compute_end_time(start_time, duration, &self.timezone) {
                    Some(end_time) => DurationPolicy::Days { end_time },
                    None => return Err(RegistryError::EndTimeOutOfRange(name)),
                }
            }
            DurationRequest::Indefinite => DurationPolicy::Indefinite,
        };

        Ok(Schedule {
            name,
            dosage,
            frequency_seconds,
            duration,
            start_time,
            recipient_email: recipient_email.filter(|email| !email.trim().is_empty()),
            reminder_active: false,
        })
    }
}
