mod console;
mod dispatcher;
mod email;
mod notification;

pub use console::ConsoleSink;
pub use dispatcher::NotificationDispatcher;
pub use email::SmtpEmailSink;
pub use notification::{DOSE_REMINDER_SUBJECT, DeliveryError, Notification, NotificationSink};
