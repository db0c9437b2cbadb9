mod appsettings;

use std::sync::Arc;

use anyhow::Context;
use pillminder_delivery::NotificationDispatcher;
use pillminder_models::clock::SystemClock;
use pillminder_registry::ScheduleRegistry;
use pillminder_scheduler::ReminderSupervisor;
use pillminder_storage::{GuardedStore, JsonScheduleStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = appsettings::load().context("Failed to load settings")?;
    log::info!(
        "Starting pillminder. [store = {}, timezone = {}]",
        settings.store.path.display(),
        settings.scheduler.timezone
    );

    let store = Arc::new(GuardedStore::new(JsonScheduleStore::new(
        settings.store.path.clone(),
    )));
    let dispatcher = Arc::new(
        NotificationDispatcher::from_settings(&settings)
            .context("Failed to set up notification delivery")?,
    );
    let supervisor = Arc::new(
        ReminderSupervisor::new(Arc::clone(&store), dispatcher, Arc::new(SystemClock))
            .with_tick_interval(settings.scheduler.tick_interval())
            .with_cancel_timeout(settings.scheduler.cancel_timeout()),
    );
    let registry = ScheduleRegistry::new(store, supervisor, settings.scheduler.timezone);

    registry
        .resume()
        .await
        .context("Failed to resume reminders")?;
    let dashboard = registry.dashboard().await?;
    log::info!(
        "Schedules loaded. [total = {}, active = {}]",
        dashboard.total_schedules,
        dashboard.active_reminders
    );

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    log::info!("Shutting down");
    registry.shutdown().await;

    Ok(())
}
