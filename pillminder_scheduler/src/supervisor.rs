pub(crate) mod tick;

use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
    time::Duration,
};

use pillminder_delivery::NotificationDispatcher;
use pillminder_models::{clock::Clock, schedule::ScheduleName};
use pillminder_storage::GuardedStore;
use tokio::{
    sync::RwLock,
    task::{self, JoinHandle},
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_CANCEL_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running,
}

pub(crate) struct TimerContext {
    pub store: Arc<GuardedStore>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
}

struct ScheduledTimer {
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTimer {
    fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Returns once the timer task has finished, so no tick runs afterwards.
    async fn cancel(self, name: &str, timeout: Duration) {
        self.cancellation_token.cancel();
        let mut task = self.task;
        if time::timeout(timeout, &mut task).await.is_err() {
            log::warn!(
                "Reminder timer did not stop in time, aborting it. [name = {}, timeout = {:?}]",
                name,
                timeout
            );
            task.abort();
            let _ = task.await;
        }
    }
}

/// Owns one periodic timer per schedule whose reminder is on.
pub struct ReminderSupervisor {
    timers: RwLock<HashMap<ScheduleName, ScheduledTimer>>,
    context: Arc<TimerContext>,
    tick_interval: Duration,
    cancel_timeout: Duration,
}

impl ReminderSupervisor {
    pub fn new(
        store: Arc<GuardedStore>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            timers: RwLock::new(HashMap::new()),
            context: Arc::new(TimerContext {
                store,
                dispatcher,
                clock,
            }),
            tick_interval: DEFAULT_TICK_INTERVAL,
            cancel_timeout: DEFAULT_CANCEL_TIMEOUT,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn with_cancel_timeout(mut self, cancel_timeout: Duration) -> Self {
        self.cancel_timeout = cancel_timeout;
        self
    }

    /// Starts the timer for `name` unless one is already running.
    pub async fn start(&self, name: &str) {
        let mut timers = self.timers.write().await;
        Self::clean_finished_timers(&mut timers);

        match timers.entry(name.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(self.spawn_timer(name));
            }
            Entry::Occupied(_) => {
                log::debug!("Reminder timer is already running. [name = {}]", name);
            }
        }
    }

    /// Stops the timer for `name`. Stopping a stopped timer does nothing.
    pub async fn stop(&self, name: &str) {
        let timer = self.timers.write().await.remove(name);
        match timer {
            Some(timer) => {
                timer.cancel(name, self.cancel_timeout).await;
                log::info!("Stopped reminder timer. [name = {}]", name);
            }
            None => log::debug!("No reminder timer to stop. [name = {}]", name),
        }
    }

    pub async fn state(&self, name: &str) -> TimerState {
        match self.timers.read().await.get(name) {
            Some(timer) if !timer.is_finished() => TimerState::Running,
            _ => TimerState::Stopped,
        }
    }

    /// Names of schedules whose timer is running, sorted.
    pub async fn running(&self) -> Vec<ScheduleName> {
        let mut names: Vec<ScheduleName> = self
            .timers
            .read()
            .await
            .iter()
            .filter(|(_, timer)| !timer.is_finished())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub async fn shutdown(&self) {
        let timers: Vec<_> = self.timers.write().await.drain().collect();
        log::info!("Stopping {} reminder timers", timers.len());
        for (name, timer) in timers {
            timer.cancel(&name, self.cancel_timeout).await;
        }
    }

    fn spawn_timer(&self, name: &str) -> ScheduledTimer {
        log::info!(
            "Starting reminder timer. [name = {}, tick_interval = {:?}]",
            name,
            self.tick_interval
        );
        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.child_token();
        let context = Arc::clone(&self.context);
        let tick_interval = self.tick_interval;
        let name = name.to_string();

        let task = task::spawn(async move {
            run_timer(name, context, tick_interval, task_token).await;
        });

        ScheduledTimer {
            task,
            cancellation_token,
        }
    }

    fn clean_finished_timers(timers: &mut HashMap<ScheduleName, ScheduledTimer>) {
        let before = timers.len();
        timers.retain(|_, timer| !timer.is_finished());
        let after = timers.len();

        if before != after {
            log::debug!("Cleaned up {} finished reminder timers", before - after);
        }
    }
}

async fn run_timer(
    name: ScheduleName,
    context: Arc<TimerContext>,
    tick_interval: Duration,
    cancellation_token: CancellationToken,
) {
    let mut interval = time::interval_at(Instant::now() + tick_interval, tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancellation_token.cancelled() => {
                log::debug!("Reminder timer cancelled. [name = {}]", name);
                break;
            }
            _ = interval.tick() => {
                let outcome = tick::tick(&name, &context, &cancellation_token).await;
                if outcome.ends_timer() {
                    log::info!(
                        "Reminder timer finished on its own. [name = {}, outcome = {:?}]",
                        name,
                        outcome
                    );
                    break;
                }
            }
        }
    }
}
