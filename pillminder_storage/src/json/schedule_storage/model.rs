use pillminder_models::{
    chrono::{DateTime, NaiveDateTime, Utc},
    schedule::{DurationPolicy, Schedule},
};
use serde::{Deserialize, Serialize};

use crate::StoreError;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M";
const TIMESTAMP_FORMAT_WITH_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const DURATION_TYPE_DAYS: &str = "days";
const DURATION_TYPE_INDEFINITE: &str = "indefinite";

/// On-disk shape of one schedule. Field names are part of the file format.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScheduleStorageModel {
    pub medicine_name: String,
    pub dosage: String,
    pub frequency: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_type: Option<String>,
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_email: Option<String>,
    #[serde(default)]
    pub reminder_set: bool,
}

impl From<&Schedule> for ScheduleStorageModel {
    fn from(value: &Schedule) -> Self {
        let (duration_type, end_date) = match value.duration {
            DurationPolicy::Days { end_time } => (
                Some(DURATION_TYPE_DAYS.to_string()),
                Some(format_timestamp(end_time)),
            ),
            DurationPolicy::Indefinite => (None, None),
        };

        Self {
            medicine_name: value.name.clone(),
            dosage: value.dosage.clone(),
            frequency: value.frequency_seconds,
            duration_type,
            start_date: format_timestamp(value.start_time),
            end_date,
            recipient_email: value.recipient().map(str::to_string),
            reminder_set: value.reminder_active,
        }
    }
}

impl TryFrom<ScheduleStorageModel> for Schedule {
    type Error = StoreError;

    fn try_from(value: ScheduleStorageModel) -> Result<Self, Self::Error> {
        let name = value.medicine_name;
        if value.frequency == 0 {
            return Err(StoreError::InvalidRecord {
                name,
                reason: "frequency must be positive",
            });
        }

        let start_time = parse_timestamp(&name, &value.start_date)?;
        let duration = match (value.duration_type.as_deref(), value.end_date) {
            (Some(DURATION_TYPE_DAYS), Some(end_date)) => DurationPolicy::Days {
                end_time: parse_timestamp(&name, &end_date)?,
            },
            (Some(DURATION_TYPE_DAYS), None) => {
                return Err(StoreError::InvalidRecord {
                    name,
                    reason: "day-bounded schedule has no end_date",
                });
            }
            (None | Some(DURATION_TYPE_INDEFINITE), _) => DurationPolicy::Indefinite,
            (Some(other), _) => {
                log::warn!(
                    "Unknown duration type, treating schedule as indefinite. [name = {}, duration_type = {}]",
                    name,
                    other
                );
                DurationPolicy::Indefinite
            }
        };

        let recipient_email = value
            .recipient_email
            .filter(|email| !email.trim().is_empty());

        Ok(Schedule {
            name,
            dosage: value.dosage,
            frequency_seconds: value.frequency,
            duration,
            start_time,
            recipient_email,
            reminder_active: value.reminder_set,
        })
    }
}

/// Formatting at minute precision is the truncation every write applies.
fn format_timestamp(time: DateTime<Utc>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(name: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT_WITH_SECONDS))
        .map(|time| time.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|time| time.with_timezone(&Utc)))
        .map_err(|_| StoreError::InvalidTimestamp {
            name: name.to_string(),
            value: value.to_string(),
        })
}
