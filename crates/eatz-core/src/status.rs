//! Event temporal status classification.
//!
//! [`classify`] compares an event window against "now" and returns a
//! [`StatusDescriptor`]. Rules are tried in a fixed order and the first match
//! wins; calendar-day rules run before instant rules so an event later today
//! is never reported as past.

use std::fmt;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::event::{EventRecord, EventWindow};

/// An in-progress event with this many minutes or fewer left is ending soon.
pub const ENDING_SOON_MINUTES: i64 = 45;
/// Upcoming events this close report minutes instead of hours.
pub const MINUTES_LABEL_HOURS: i64 = 1;
/// Upcoming events this close blink.
pub const BLINK_WITHIN_HOURS: i64 = 4;

const WEEKDAY_LABEL_DAYS: i64 = 7;
const MONTH_DAY_LABEL_DAYS: i64 = 30;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Past,
    Future,
    EndingSoon,
    Now,
    Upcoming,
    Unknown,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Past => "past",
            Status::Future => "future",
            Status::EndingSoon => "endingsoon",
            Status::Now => "now",
            Status::Upcoming => "upcoming",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Symbolic status color, mapped to a display value by [`crate::present`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Red,
    Green,
    Orange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusDescriptor {
    pub status: Status,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<StatusColor>,

    #[serde(default)]
    pub blink: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// The rounded-up count quoted in the label (minutes or hours).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
}

impl StatusDescriptor {
    fn bare(status: Status) -> Self {
        Self {
            status,
            color: None,
            blink: false,
            label: None,
            time: None,
        }
    }

    fn shown(status: Status, color: StatusColor, blink: bool, label: String) -> Self {
        Self {
            status,
            color: Some(color),
            blink,
            label: Some(label),
            time: None,
        }
    }

    fn with_time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }

    pub fn is_past(&self) -> bool {
        self.status == Status::Past
    }
}

/// Classifies `window` relative to `now`. Day boundaries are taken in
/// `now`'s timezone.
pub fn classify(window: &EventWindow, now: &DateTime<Tz>) -> StatusDescriptor {
    let tz = now.timezone();
    let start = window.start.with_timezone(&tz);
    let end = window.end.with_timezone(&tz);

    let today = now.date_naive();
    let start_day = start.date_naive();
    let end_day = end.date_naive();
    let (from, to) = (&window.start_text, &window.end_text);

    if end_day < today {
        return StatusDescriptor::bare(Status::Past);
    }

    if start_day > today {
        let day = day_label(&start, today);
        return StatusDescriptor::shown(
            Status::Future,
            StatusColor::Red,
            false,
            format!("{day} from {from} to {to}"),
        );
    }

    if *now > end {
        return StatusDescriptor::bare(Status::Past);
    }

    if start <= *now && *now <= end {
        let minutes_left = ceil_units(&end, now, MINUTE_MS);
        if minutes_left <= ENDING_SOON_MINUTES {
            return StatusDescriptor::shown(
                Status::EndingSoon,
                StatusColor::Green,
                true,
                format!("Ending soon in {minutes_left} minutes (today from {from} to {to})"),
            )
            .with_time(minutes_left);
        }

        return StatusDescriptor::shown(
            Status::Now,
            StatusColor::Green,
            false,
            format!("Happening now (today from {from} to {to})"),
        );
    }

    if *now < start {
        let hours_until = ceil_units(&start, now, HOUR_MS);
        if hours_until <= MINUTES_LABEL_HOURS {
            let minutes_until = ceil_units(&start, now, MINUTE_MS);
            return StatusDescriptor::shown(
                Status::Upcoming,
                StatusColor::Orange,
                true,
                format!("Starts in {minutes_until} minutes (today from {from} to {to})"),
            )
            .with_time(minutes_until);
        }

        return StatusDescriptor::shown(
            Status::Upcoming,
            StatusColor::Orange,
            hours_until <= BLINK_WITHIN_HOURS,
            format!("Starts in {hours_until} hours (today from {from} to {to})"),
        )
        .with_time(hours_until);
    }

    StatusDescriptor::bare(Status::Unknown)
}

/// Parses the record's times in `tz` and classifies the result.
#[tracing::instrument(skip_all, fields(event = %record.eventname))]
pub fn classify_record(
    record: &EventRecord,
    tz: &Tz,
    now: &DateTime<Tz>,
) -> Result<StatusDescriptor, ParseError> {
    let window = record.window(tz)?;
    let descriptor = classify(&window, now);
    tracing::trace!(status = %descriptor.status, "classified event");
    Ok(descriptor)
}

/// Weekday within a week, `Dec 6` within a month, `2/6/2025` beyond.
fn day_label(start: &DateTime<Tz>, today: NaiveDate) -> String {
    let days = (start.date_naive() - today).num_days();
    if days <= WEEKDAY_LABEL_DAYS {
        start.format("%A").to_string()
    } else if days <= MONTH_DAY_LABEL_DAYS {
        start.format("%b %-d").to_string()
    } else {
        start.format("%-m/%-d/%Y").to_string()
    }
}

fn ceil_units(later: &DateTime<Tz>, earlier: &DateTime<Tz>, unit_ms: i64) -> i64 {
    let span = later.timestamp_millis() - earlier.timestamp_millis();
    if span <= 0 {
        return 0;
    }
    (span + unit_ms - 1) / unit_ms
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone};
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;

    use super::{Status, StatusColor, classify, classify_record};
    use crate::event::{EventRecord, EventWindow};

    fn noon() -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
            .single()
            .expect("valid now")
    }

    fn window(start: DateTime<Tz>, end: DateTime<Tz>) -> EventWindow {
        EventWindow {
            start_text: start.format("%-I:%M %p").to_string(),
            end_text: end.format("%-I:%M %p").to_string(),
            start,
            end,
        }
    }

    fn record(date: &str, start: &str, end: &str) -> EventRecord {
        EventRecord {
            eventname: "Bagel Breakfast".to_string(),
            date: date.to_string(),
            starttime: start.to_string(),
            endtime: end.to_string(),
            ..EventRecord::default()
        }
    }

    #[test]
    fn yesterday_is_past() {
        let got = classify_record(&record("2026-10-15", "11:00 PM", "11:59 PM"), &New_York, &noon())
            .expect("classify");
        assert_eq!(got.status, Status::Past);
        assert_eq!(got.color, None);
        assert_eq!(got.label, None);
        assert!(!got.blink);
    }

    #[test]
    fn tomorrow_is_future_with_weekday() {
        let got = classify_record(&record("2026-10-17", "10:00 AM", "12:00 PM"), &New_York, &noon())
            .expect("classify");
        assert_eq!(got.status, Status::Future);
        assert_eq!(got.color, Some(StatusColor::Red));
        assert!(!got.blink);
        assert_eq!(got.label.as_deref(), Some("Saturday from 10:00 AM to 12:00 PM"));
    }

    #[test]
    fn day_label_widens_with_distance() {
        let cases = [
            ("2026-10-19", "Monday"),
            ("2026-10-23", "Friday"),
            ("2026-10-24", "Oct 24"),
            ("2026-10-31", "Oct 31"),
            ("2026-11-15", "Nov 15"),
            ("2026-11-16", "11/16/2026"),
            ("2026-11-25", "11/25/2026"),
        ];
        for (date, expected) in cases {
            let got = classify_record(&record(date, "2:00 PM", "4:00 PM"), &New_York, &noon())
                .expect("classify");
            assert_eq!(
                got.label,
                Some(format!("{expected} from 2:00 PM to 4:00 PM")),
                "date {date}"
            );
        }
    }

    #[test]
    fn day_label_counts_calendar_days_across_fall_back() {
        // The 2026-11-01 transition makes the span 7 days plus one hour.
        let now = New_York
            .with_ymd_and_hms(2026, 10, 27, 12, 0, 0)
            .single()
            .expect("valid now");
        for (date, expected) in [("2026-11-03", "Tuesday"), ("2026-11-04", "Nov 4")] {
            let got = classify_record(&record(date, "2:00 PM", "4:00 PM"), &New_York, &now)
                .expect("classify");
            assert_eq!(got.status, Status::Future);
            assert_eq!(
                got.label,
                Some(format!("{expected} from 2:00 PM to 4:00 PM")),
                "date {date}"
            );
        }
    }

    #[test]
    fn ended_earlier_today_is_past() {
        let got = classify_record(&record("2026-10-16", "9:00 AM", "10:00 AM"), &New_York, &noon())
            .expect("classify");
        assert_eq!(got.status, Status::Past);
    }

    #[test]
    fn ending_soon_boundary_is_inclusive() {
        let now = noon();
        let at_45 = classify(
            &window(now - Duration::hours(1), now + Duration::minutes(45)),
            &now,
        );
        assert_eq!(at_45.status, Status::EndingSoon);
        assert_eq!(at_45.color, Some(StatusColor::Green));
        assert!(at_45.blink);
        assert_eq!(at_45.time, Some(45));
        assert_eq!(
            at_45.label.as_deref(),
            Some("Ending soon in 45 minutes (today from 11:00 AM to 12:45 PM)")
        );

        let at_46 = classify(
            &window(now - Duration::hours(1), now + Duration::minutes(46)),
            &now,
        );
        assert_eq!(at_46.status, Status::Now);
        assert!(!at_46.blink);
    }

    #[test]
    fn remaining_minutes_round_up() {
        let now = noon();
        let got = classify(
            &window(now - Duration::hours(1), now + Duration::seconds(44 * 60 + 12)),
            &now,
        );
        assert_eq!(got.status, Status::EndingSoon);
        assert_eq!(got.time, Some(45));
    }

    #[test]
    fn in_progress_is_now() {
        let now = noon();
        let got = classify(
            &window(now - Duration::minutes(30), now + Duration::minutes(60)),
            &now,
        );
        assert_eq!(got.status, Status::Now);
        assert_eq!(got.color, Some(StatusColor::Green));
        assert!(!got.blink);
        assert_eq!(
            got.label.as_deref(),
            Some("Happening now (today from 11:30 AM to 1:00 PM)")
        );
        assert_eq!(got.time, None);
    }

    #[test]
    fn upcoming_within_hour_counts_minutes() {
        let now = noon();
        let got = classify(
            &window(now + Duration::minutes(60), now + Duration::minutes(120)),
            &now,
        );
        assert_eq!(got.status, Status::Upcoming);
        assert_eq!(got.color, Some(StatusColor::Orange));
        assert!(got.blink);
        assert_eq!(
            got.label.as_deref(),
            Some("Starts in 60 minutes (today from 1:00 PM to 2:00 PM)")
        );
    }

    #[test]
    fn upcoming_hours_blink_up_to_four() {
        let now = noon();
        let just_over_hour = classify(
            &window(now + Duration::minutes(61), now + Duration::hours(3)),
            &now,
        );
        assert!(just_over_hour.blink);
        assert_eq!(just_over_hour.time, Some(2));
        assert_eq!(
            just_over_hour.label.as_deref(),
            Some("Starts in 2 hours (today from 1:01 PM to 3:00 PM)")
        );

        let four = classify(&window(now + Duration::hours(4), now + Duration::hours(5)), &now);
        assert!(four.blink);
        assert_eq!(four.time, Some(4));

        let later = classify(
            &window(now + Duration::minutes(4 * 60 + 1), now + Duration::hours(6)),
            &now,
        );
        assert_eq!(later.status, Status::Upcoming);
        assert!(!later.blink);
        assert_eq!(later.time, Some(5));
    }

    #[test]
    fn late_evening_event_is_not_past_by_day() {
        let now = New_York
            .with_ymd_and_hms(2026, 10, 16, 23, 0, 0)
            .single()
            .expect("valid now");
        let got = classify_record(&record("2026-10-16", "10:00 PM", "11:59 PM"), &New_York, &now)
            .expect("classify");
        assert_eq!(got.status, Status::Now);
    }

    #[test]
    fn unparseable_time_surfaces_error() {
        let err = classify_record(&record("2026-10-16", "noon", "1:00 PM"), &New_York, &noon());
        assert!(err.is_err());
    }

    #[test]
    fn serializes_output_contract() {
        let now = noon();
        let got = classify(
            &window(now - Duration::hours(1), now + Duration::minutes(30)),
            &now,
        );
        let json = serde_json::to_value(&got).expect("serialize");
        assert_eq!(json["status"], "endingsoon");
        assert_eq!(json["color"], "green");
        assert_eq!(json["blink"], true);
        assert_eq!(json["time"], 30);

        let past = classify(
            &window(now - Duration::hours(3), now - Duration::hours(2)),
            &now,
        );
        let json = serde_json::to_value(&past).expect("serialize");
        assert_eq!(json, serde_json::json!({ "status": "past", "blink": false }));
    }
}
