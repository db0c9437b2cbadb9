use async_trait::async_trait;

use crate::{DeliveryError, Notification, NotificationSink};

pub struct ConsoleSink;

#[async_trait]
impl NotificationSink for ConsoleSink {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        println!("{}", notification.message);
        log::info!("{}", notification.message);
        Ok(())
    }
}
