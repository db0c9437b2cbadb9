use chrono::{DateTime, NaiveDateTime, Utc};

/// Schedules are keyed by their display name.
pub type ScheduleName = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationPolicy {
    Days { end_time: DateTime<Utc> },
    Indefinite,
}

impl DurationPolicy {
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        match self {
            DurationPolicy::Days { end_time } => Some(*end_time),
            DurationPolicy::Indefinite => None,
        }
    }
}

/// One medication's dosage, cadence and reminder configuration.
///
/// `start_time` is the most recently delivered (or not yet reached) dose
/// time. It only moves forward, and only when a dose fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub name: ScheduleName,
    pub dosage: String,
    pub frequency_seconds: u64,
    pub duration: DurationPolicy,
    pub start_time: DateTime<Utc>,
    pub recipient_email: Option<String>,
    pub reminder_active: bool,
}

impl Schedule {
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.duration.end_time()
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationRequest {
    Days(u32),
    Indefinite,
}

/// A schedule as submitted by the CRUD layer, before it is stored.
///
/// `start_time` is wall-clock time in the configured time zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSchedule {
    pub name: String,
    pub dosage: String,
    pub frequency_seconds: u64,
    pub duration: DurationRequest,
    pub start_time: NaiveDateTime,
    pub recipient_email: Option<String>,
}
