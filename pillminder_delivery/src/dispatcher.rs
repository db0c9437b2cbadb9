use std::{sync::Arc, time::Duration};

use pillminder_models::settings::Settings;

use crate::{ConsoleSink, DeliveryError, Notification, NotificationSink, SmtpEmailSink};

/// Hands a notification to the console and, when the notification has a
/// recipient, to the email sink.
///
/// Delivery never fails from the caller's point of view: sink errors and
/// timeouts are logged and dropped.
pub struct NotificationDispatcher {
    console: Arc<dyn NotificationSink>,
    email: Option<Arc<dyn NotificationSink>>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        console: Arc<dyn NotificationSink>,
        email: Option<Arc<dyn NotificationSink>>,
        timeout: Duration,
    ) -> Self {
        Self {
            console,
            email,
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, DeliveryError> {
        let email = match &settings.email {
            Some(email_settings) => {
                let sink: Arc<dyn NotificationSink> = Arc::new(SmtpEmailSink::new(email_settings)?);
                Some(sink)
            }
            None => {
                log::info!("Email is not configured, reminders go to the console only");
                None
            }
        };

        Ok(Self::new(
            Arc::new(ConsoleSink),
            email,
            settings.delivery.timeout(),
        ))
    }

    pub async fn notify(&self, notification: &Notification) {
        self.deliver_to(self.console.as_ref(), notification).await;

        match (notification.recipient.as_deref(), &self.email) {
            (Some(_), Some(email)) => self.deliver_to(email.as_ref(), notification).await,
            (Some(recipient), None) => log::debug!(
                "Skipping email, no email sink configured. [recipient = {}]",
                recipient
            ),
            (None, _) => {}
        }
    }

    async fn deliver_to(&self, sink: &dyn NotificationSink, notification: &Notification) {
        let result = match tokio::time::timeout(self.timeout, sink.deliver(notification)).await {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::Timeout(self.timeout)),
        };

        if let Err(error) = result {
            log::error!(
                "Failed to deliver notification. [sink = {}, subject = {}, error = {}]",
                sink.name(),
                notification.subject,
                error
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    type Delivered = Arc<Mutex<Vec<Notification>>>;

    struct RecordingSink {
        delivered: Delivered,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
            self.delivered.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn deliver(&self, _notification: &Notification) -> Result<(), DeliveryError> {
            Err(DeliveryError::Other("connection refused".to_string()))
        }
    }

    struct HangingSink;

    #[async_trait]
    impl NotificationSink for HangingSink {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn deliver(&self, _notification: &Notification) -> Result<(), DeliveryError> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    fn recording() -> (Arc<dyn NotificationSink>, Delivered) {
        let delivered = Delivered::default();
        let sink: Arc<dyn NotificationSink> = Arc::new(RecordingSink {
            delivered: Arc::clone(&delivered),
        });
        (sink, delivered)
    }

    fn failing() -> Option<Arc<dyn NotificationSink>> {
        let sink: Arc<dyn NotificationSink> = Arc::new(FailingSink);
        Some(sink)
    }

    fn hanging() -> Option<Arc<dyn NotificationSink>> {
        let sink: Arc<dyn NotificationSink> = Arc::new(HangingSink);
        Some(sink)
    }

    fn notification(recipient: Option<&str>) -> Notification {
        Notification {
            subject: "Medicine Reminder".to_string(),
            message: "Reminder: Time to take your medicine 'Aspirin' - Dosage: 100mg".to_string(),
            recipient: recipient.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn console_always_receives_notification() {
        let (console, console_delivered) = recording();
        let (email, email_delivered) = recording();
        let dispatcher =
            NotificationDispatcher::new(console, Some(email), Duration::from_secs(10));

        dispatcher.notify(&notification(None)).await;

        assert_eq!(console_delivered.lock().unwrap().len(), 1);
        assert!(email_delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn email_receives_notification_with_recipient() {
        let (console, _) = recording();
        let (email, email_delivered) = recording();
        let dispatcher =
            NotificationDispatcher::new(console, Some(email), Duration::from_secs(10));

        dispatcher
            .notify(&notification(Some("patient@example.com")))
            .await;

        let delivered = email_delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].recipient.as_deref(), Some("patient@example.com"));
    }

    #[tokio::test]
    async fn failing_email_does_not_affect_console() {
        let (console, console_delivered) = recording();
        let dispatcher = NotificationDispatcher::new(console, failing(), Duration::from_secs(10));

        dispatcher
            .notify(&notification(Some("patient@example.com")))
            .await;

        assert_eq!(console_delivered.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_sink_is_cut_off_by_timeout() {
        let (console, console_delivered) = recording();
        let dispatcher = NotificationDispatcher::new(console, hanging(), Duration::from_secs(10));
        let started = tokio::time::Instant::now();

        dispatcher
            .notify(&notification(Some("patient@example.com")))
            .await;

        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(console_delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn dose_reminder_message_names_medicine_and_dosage() {
        use pillminder_models::{
            chrono::{DateTime, Utc},
            schedule::{DurationPolicy, Schedule},
        };

        let schedule = Schedule {
            name: "Aspirin".to_string(),
            dosage: "100mg".to_string(),
            frequency_seconds: 5,
            duration: DurationPolicy::Indefinite,
            start_time: DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap(),
            recipient_email: Some("  ".to_string()),
            reminder_active: true,
        };

        let reminder = Notification::dose_reminder(&schedule);

        assert_eq!(reminder, notification(None));
    }
}
