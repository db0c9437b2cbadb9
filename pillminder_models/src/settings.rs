use std::{path::PathBuf, time::Duration};

use chrono_tz::Tz;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_cancel_timeout_secs")]
    pub cancel_timeout_secs: u64,
    /// Zone used to read submitted wall-clock times and to count calendar days.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl SchedulerSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn cancel_timeout(&self) -> Duration {
        Duration::from_secs(self.cancel_timeout_secs)
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            cancel_timeout_secs: default_cancel_timeout_secs(),
            timezone: default_timezone(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct DeliverySettings {
    #[serde(default = "default_delivery_timeout_secs")]
    pub timeout_secs: u64,
}

impl DeliverySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct EmailSettings {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub delivery: DeliverySettings,
    #[serde(default)]
    pub email: Option<EmailSettings>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("medicine_schedule.json")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_cancel_timeout_secs() -> u64 {
    5
}

fn default_timezone() -> Tz {
    Tz::UTC
}

fn default_delivery_timeout_secs() -> u64 {
    10
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}
