use std::time::Duration;

use async_trait::async_trait;
use pillminder_models::schedule::Schedule;
use thiserror::Error;

pub const DOSE_REMINDER_SUBJECT: &str = "Medicine Reminder";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub message: String,
    pub recipient: Option<String>,
}

impl Notification {
    pub fn dose_reminder(schedule: &Schedule) -> Self {
        Self {
            subject: DOSE_REMINDER_SUBJECT.to_string(),
            message: format!(
                "Reminder: Time to take your medicine '{}' - Dosage: {}",
                schedule.name, schedule.dosage
            ),
            recipient: schedule.recipient().map(str::to_string),
        }
    }
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Cannot build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("Email transport failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Notification has no recipient")]
    MissingRecipient,

    #[error("Delivery did not finish within {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError>;
}
