use std::sync::Arc;

use pillminder_delivery::Notification;
use pillminder_models::{
    chrono::{DateTime, Utc},
    dose_clock,
    schedule::Schedule,
};
use tokio_util::sync::CancellationToken;

use super::TimerContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A dose was due; the schedule advanced and this notification went out.
    Fired(Notification),
    Idle,
    Expired,
    /// The schedule's reminder was switched off since the timer started.
    Inactive,
    /// The schedule was removed since the timer started.
    Missing,
    Cancelled,
    /// The store could not be read or written; the next tick tries again.
    Failed,
}

impl TickOutcome {
    pub fn ends_timer(&self) -> bool {
        matches!(
            self,
            TickOutcome::Expired
                | TickOutcome::Inactive
                | TickOutcome::Missing
                | TickOutcome::Cancelled
        )
    }
}

/// Decides what one tick does to the named schedule and applies the
/// advance in place. At most one dose fires per call.
///
/// Expiry stops the timer but leaves `reminder_active` as it is.
pub(crate) fn advance_due_dose(
    schedules: &mut [Schedule],
    name: &str,
    now: DateTime<Utc>,
) -> TickOutcome {
    let Some(schedule) = schedules.iter_mut().find(|s| s.name == name) else {
        return TickOutcome::Missing;
    };

    if !schedule.reminder_active {
        return TickOutcome::Inactive;
    }

    if dose_clock::is_expired(now, schedule.end_time()) {
        return TickOutcome::Expired;
    }

    let next_dose = dose_clock::next_dose_time(schedule.start_time, schedule.frequency_seconds);
    if !dose_clock::is_due(now, next_dose) {
        return TickOutcome::Idle;
    }

    schedule.start_time = next_dose;
    TickOutcome::Fired(Notification::dose_reminder(schedule))
}

/// One evaluation of the named schedule.
///
/// The schedule is re-read under the store lock, so removals and toggles
/// that happened since the timer started are always seen. The
/// notification is handed to the dispatcher on its own task once the
/// advanced schedule was saved, so stopping the timer never waits on (or
/// cuts short) a delivery in flight.
pub(crate) async fn tick(
    name: &str,
    context: &TimerContext,
    cancellation_token: &CancellationToken,
) -> TickOutcome {
    let now = context.clock.now();
    let result = context
        .store
        .modify(|schedules| {
            if cancellation_token.is_cancelled() {
                return TickOutcome::Cancelled;
            }
            advance_due_dose(schedules, name, now)
        })
        .await;

    match result {
        Ok(TickOutcome::Fired(notification)) => {
            log::info!("Dose is due. [name = {}, now = {}]", name, now);
            let dispatcher = Arc::clone(&context.dispatcher);
            let delivered = notification.clone();
            tokio::spawn(async move {
                dispatcher.notify(&delivered).await;
            });
            TickOutcome::Fired(notification)
        }
        Ok(outcome) => outcome,
        Err(error) => {
            log::error!(
                "Reminder tick failed to access the store. [name = {}, error = {}]",
                name,
                error
            );
            TickOutcome::Failed
        }
    }
}
