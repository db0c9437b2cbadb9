//! Pure dose-timing arithmetic. Nothing here reads the clock or the store.

use chrono::{DateTime, Days, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::schedule::DurationRequest;

/// End of the validity window, present only for day-bounded schedules.
///
/// Days are civil calendar days in `tz`: the start is moved to local
/// wall-clock time, `n` days are added there and the result is mapped
/// back to UTC, so a window spanning a DST change is 23 or 25 hours per
/// affected day. Returns `None` for indefinite schedules and for windows
/// that leave the representable range.
pub fn compute_end_time(
    start_time: DateTime<Utc>,
    duration: DurationRequest,
    tz: &Tz,
) -> Option<DateTime<Utc>> {
    let DurationRequest::Days(days) = duration else {
        return None;
    };

    let local_start = start_time.with_timezone(tz).naive_local();
    let local_end = local_start.checked_add_days(Days::new(days.into()))?;

    Some(localize(local_end, tz))
}

pub fn next_dose_time(start_time: DateTime<Utc>, frequency_seconds: u64) -> DateTime<Utc> {
    i64::try_from(frequency_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|frequency| start_time.checked_add_signed(frequency))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

pub fn is_expired(now: DateTime<Utc>, end_time: Option<DateTime<Utc>>) -> bool {
    end_time.is_some_and(|end_time| now > end_time)
}

pub fn is_due(now: DateTime<Utc>, next_dose_time: DateTime<Utc>) -> bool {
    next_dose_time <= now
}

/// Persisted timestamps carry minute precision only.
pub fn truncate_to_minute(time: DateTime<Utc>) -> DateTime<Utc> {
    time.with_second(0)
        .and_then(|time| time.with_nanosecond(0))
        .expect("Zero seconds and nanoseconds are always valid.")
}

/// Maps wall-clock time in `tz` to UTC.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant;
/// times inside a spring-forward gap are pushed one hour later.
pub fn localize(local: NaiveDateTime, tz: &Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| {
            local
                .checked_add_signed(TimeDelta::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        })
        .map(|time| time.with_timezone(&Utc))
        .unwrap_or_else(|| local.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{NaiveDate, NaiveTime};
    use chrono_tz::Europe::Berlin;
    use proptest::prelude::*;
    use proptest_arbitrary_interop::arb;
    use test_strategy::proptest;

    fn utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[test]
    fn two_day_window_ends_two_days_after_start() {
        let start = utc("2024-01-01T00:00:00");

        let end = compute_end_time(start, DurationRequest::Days(2), &Tz::UTC);

        assert_eq!(end, Some(utc("2024-01-03T00:00:00")));
    }

    #[test]
    fn indefinite_schedules_have_no_end() {
        let start = utc("2024-01-01T00:00:00");

        assert_eq!(
            compute_end_time(start, DurationRequest::Indefinite, &Tz::UTC),
            None
        );
    }

    #[test]
    fn calendar_day_across_spring_forward_is_23_hours() {
        // 2024-03-31 02:00 Berlin jumps to 03:00.
        let start = localize(
            NaiveDate::from_ymd_opt(2024, 3, 30)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            &Berlin,
        );

        let end = compute_end_time(start, DurationRequest::Days(1), &Berlin).unwrap();

        assert_eq!(end - start, TimeDelta::hours(23));
        assert_eq!(
            end.with_timezone(&Berlin).time(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap()
        );
    }

    #[test]
    fn wall_clock_time_in_gap_moves_forward() {
        let in_gap = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();

        let resolved = localize(in_gap, &Berlin);

        assert_eq!(resolved, utc("2024-03-31T01:30:00"));
    }

    #[test]
    fn ambiguous_wall_clock_time_picks_earlier_instant() {
        // 2024-10-27 02:30 happens twice in Berlin.
        let ambiguous = NaiveDate::from_ymd_opt(2024, 10, 27)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();

        assert_eq!(localize(ambiguous, &Berlin), utc("2024-10-27T00:30:00"));
    }

    #[test]
    fn expiry_is_strictly_after_end() {
        let end = utc("2024-01-03T00:00:00");

        assert!(!is_expired(end, Some(end)));
        assert!(is_expired(utc("2024-01-03T00:01:00"), Some(end)));
        assert!(!is_expired(utc("2099-01-01T00:00:00"), None));
    }

    #[test]
    fn dose_is_due_at_its_exact_time() {
        let next = utc("2024-01-01T00:00:05");

        assert!(!is_due(utc("2024-01-01T00:00:04"), next));
        assert!(is_due(next, next));
    }

    #[test]
    fn huge_frequency_saturates() {
        let start = utc("2024-01-01T00:00:00");

        assert_eq!(next_dose_time(start, u64::MAX), DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn truncation_drops_seconds() {
        assert_eq!(
            truncate_to_minute(utc("2024-01-01T00:00:05")),
            utc("2024-01-01T00:00:00")
        );
    }

    fn start_strategy() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..4_000_000_000).prop_map(|secs| DateTime::from_timestamp(secs, 0).unwrap())
    }

    #[proptest]
    fn next_dose_is_exactly_one_frequency_later(
        #[strategy(start_strategy())] start: DateTime<Utc>,
        #[strategy(1u64..10_000_000)] frequency: u64,
    ) {
        let next = next_dose_time(start, frequency);

        prop_assert_eq!((next - start).num_seconds(), frequency as i64);
        prop_assert!(is_due(next, next));
    }

    #[proptest]
    fn utc_days_are_fixed_length(
        #[strategy(start_strategy())] start: DateTime<Utc>,
        #[strategy(1u32..3650)] days: u32,
    ) {
        let end = compute_end_time(start, DurationRequest::Days(days), &Tz::UTC).unwrap();

        prop_assert_eq!(end - start, TimeDelta::days(days.into()));
    }

    #[proptest]
    fn local_days_keep_wall_clock_time(
        #[strategy(2000i32..2100)] year: i32,
        #[strategy(1u32..=365)] ordinal: u32,
        #[strategy(1u32..400)] days: u32,
    ) {
        // Noon is never inside a DST transition in Berlin.
        let local_start = NaiveDate::from_yo_opt(year, ordinal)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let start = localize(local_start, &Berlin);

        let end = compute_end_time(start, DurationRequest::Days(days), &Berlin).unwrap();

        let local_end = end.with_timezone(&Berlin).naive_local();
        prop_assert_eq!(local_end, local_start + Days::new(days.into()));
    }

    #[proptest]
    fn truncation_stays_within_the_same_minute(
        #[strategy(arb::<NaiveDateTime>())] time: NaiveDateTime,
    ) {
        // Leap seconds are out of scope for stored timestamps.
        let time = time
            .with_nanosecond(time.nanosecond() % 1_000_000_000)
            .unwrap()
            .and_utc();

        let truncated = truncate_to_minute(time);

        prop_assert_eq!(truncated.second(), 0);
        prop_assert_eq!(truncated.nanosecond(), 0);
        prop_assert!(truncated <= time);
        prop_assert!(time - truncated < TimeDelta::minutes(1));
    }
}
