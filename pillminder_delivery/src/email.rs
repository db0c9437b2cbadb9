use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use pillminder_models::settings::EmailSettings;

use crate::{DeliveryError, Notification, NotificationSink};

pub struct SmtpEmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSink {
    pub fn new(settings: &EmailSettings) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings.from.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl NotificationSink for SmtpEmailSink {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        let recipient = notification
            .recipient
            .as_deref()
            .ok_or(DeliveryError::MissingRecipient)?;
        let to: Mailbox = recipient.parse()?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(notification.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(notification.message.clone())?;

        let response = self.transport.send(email).await?;
        log::info!(
            "Email sent. [recipient = {}, code = {}]",
            recipient,
            response.code()
        );

        Ok(())
    }
}
