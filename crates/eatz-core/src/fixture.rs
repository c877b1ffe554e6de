//! Mock event data for trying the board without a datastore.
//!
//! Nine canned records are moved relative to "now" so that each status branch
//! shows up: one past event, one in progress, one ending soon, three later
//! today at different distances, and three on later days (weekday, month/day
//! and short-date labels).

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Duration, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::event::EventRecord;

pub const FIXTURE_LEN: usize = 9;

struct Canned {
    name: &'static str,
    campus: &'static str,
    building: &'static str,
    room: &'static str,
    description: &'static str,
    food: &'static str,
}

const CANNED: [Canned; FIXTURE_LEN] = [
    Canned {
        name: "Yesterday's Bagel Bash",
        campus: "North",
        building: "Student Union",
        room: "110",
        description: "Leftover bagels from the morning mixer.",
        food: "Bagels",
    },
    Canned {
        name: "Pizza and Study Hall",
        campus: "North",
        building: "Library",
        room: "2F",
        description: "Bring your notes, we bring the pizza.",
        food: "Pizza",
    },
    Canned {
        name: "Club Fair Wrap-up",
        campus: "South",
        building: "Gym",
        room: "Court A",
        description: "Last call for snacks before the tables fold up.",
        food: "Chips and cookies",
    },
    Canned {
        name: "Career Center Coffee Hour",
        campus: "South",
        building: "Hall C",
        room: "204",
        description: "Resume reviews with free coffee and donuts.",
        food: "Coffee and donuts",
    },
    Canned {
        name: "Robotics Demo Day",
        campus: "East",
        building: "Engineering",
        room: "Lab 3",
        description: "Watch the robots race and grab a sandwich.",
        food: "Sandwiches",
    },
    Canned {
        name: "Late Night Taco Truck",
        campus: "North",
        building: "Quad",
        room: "Lot B",
        description: "Tacos until they run out.",
        food: "Tacos",
    },
    Canned {
        name: "Cultural Night Potluck",
        campus: "East",
        building: "Commons",
        room: "Ballroom",
        description: "Dishes from around the world, made by students.",
        food: "Potluck",
    },
    Canned {
        name: "Hackathon Kickoff",
        campus: "South",
        building: "Innovation Center",
        room: "Atrium",
        description: "Form teams, pitch ideas and eat dinner on us.",
        food: "Dinner buffet",
    },
    Canned {
        name: "Spring Preview Picnic",
        campus: "North",
        building: "Green",
        room: "Pavilion",
        description: "An early look at spring events with a picnic lunch.",
        food: "Picnic lunch",
    },
];

pub fn canned_records() -> Vec<EventRecord> {
    CANNED
        .iter()
        .map(|c| EventRecord {
            eventname: c.name.to_string(),
            campus: c.campus.to_string(),
            building: c.building.to_string(),
            room: c.room.to_string(),
            description: c.description.to_string(),
            freefood: c.food.to_string(),
            ..EventRecord::default()
        })
        .collect()
}

/// Reads a JSON array of records to use in place of the canned ones.
#[tracing::instrument]
pub fn load_fixture_file(path: &Path) -> anyhow::Result<Vec<EventRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let records: Vec<EventRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing fixture {}", path.display()))?;
    debug!(count = records.len(), "loaded fixture file");
    Ok(records)
}

pub fn shifted_records(now: &DateTime<Tz>) -> Vec<EventRecord> {
    shift_records(canned_records(), now)
}

/// Rewrites `DATE`, `STARTTIME` and `ENDTIME` of the first nine records by
/// position. Times are truncated to the minute. Extra records stay as they
/// are.
#[tracing::instrument(skip(records, now), fields(count = records.len()))]
pub fn shift_records(records: Vec<EventRecord>, now: &DateTime<Tz>) -> Vec<EventRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            match shifted_window(index, now) {
                Some((start, end)) => {
                    record.date = start.format("%Y-%m-%d").to_string();
                    record.starttime = start.format("%-I:%M %p").to_string();
                    record.endtime = end.format("%-I:%M %p").to_string();
                }
                None if index >= FIXTURE_LEN => {
                    warn!(index, "extra fixture event detected; leaving untouched");
                }
                None => {
                    warn!(index, "fixture shift fell outside the calendar; leaving untouched");
                }
            }
            record
        })
        .collect()
}

fn shifted_window(index: usize, now: &DateTime<Tz>) -> Option<(DateTime<Tz>, DateTime<Tz>)> {
    let now = *now;
    let after = |start: DateTime<Tz>, hours: i64| Some((start, start + Duration::hours(hours)));

    match index {
        0 => after(day_at(&now, -1, 12)?, 1),
        1 => Some((now - Duration::minutes(30), now + Duration::minutes(60))),
        2 => Some((now - Duration::hours(1), now + Duration::minutes(30))),
        3 => after(now + Duration::minutes(45), 1),
        4 => after(now + Duration::hours(2), 1),
        5 => after(now + Duration::hours(5), 1),
        6 => after(day_at(&now, 5, 14)?, 2),
        7 => after(day_at(&now, 13, 14)?, 2),
        8 => after(day_at(&now, 32, 14)?, 2),
        _ => None,
    }
}

fn day_at(now: &DateTime<Tz>, days: i64, hour: u32) -> Option<DateTime<Tz>> {
    let day = now.date_naive().checked_add_signed(Duration::days(days))?;
    let naive = day.and_hms_opt(hour, 0, 0)?;
    now.timezone().from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};
    use chrono_tz::America::New_York;
    use chrono_tz::Tz;

    use super::{FIXTURE_LEN, canned_records, shift_records, shifted_records};
    use crate::event::EventRecord;
    use crate::status::{Status, classify_record};

    fn noon() -> DateTime<Tz> {
        New_York
            .with_ymd_and_hms(2026, 10, 16, 12, 0, 0)
            .single()
            .expect("valid now")
    }

    #[test]
    fn nine_records_cover_every_branch() {
        let now = noon();
        let records = shifted_records(&now);
        assert_eq!(records.len(), FIXTURE_LEN);

        let got: Vec<(Status, bool, Option<String>)> = records
            .iter()
            .map(|r| {
                let d = classify_record(r, &New_York, &now).expect("fixture parses");
                (d.status, d.blink, d.label)
            })
            .collect();

        assert_eq!(got[0], (Status::Past, false, None));
        assert_eq!(got[1].0, Status::Now);
        assert_eq!(got[2].0, Status::EndingSoon);
        assert_eq!(
            got[3],
            (
                Status::Upcoming,
                true,
                Some("Starts in 45 minutes (today from 12:45 PM to 1:45 PM)".to_string())
            )
        );
        assert_eq!(got[4].0, Status::Upcoming);
        assert!(got[4].1);
        assert_eq!(got[5].0, Status::Upcoming);
        assert!(!got[5].1);
        assert_eq!(
            got[6].2.as_deref(),
            Some("Wednesday from 2:00 PM to 4:00 PM")
        );
        assert_eq!(got[7].2.as_deref(), Some("Oct 29 from 2:00 PM to 4:00 PM"));
        assert_eq!(
            got[8].2.as_deref(),
            Some("11/17/2026 from 2:00 PM to 4:00 PM")
        );
    }

    #[test]
    fn extra_records_are_untouched() {
        let mut records = canned_records();
        records.push(EventRecord {
            eventname: "Bonus".to_string(),
            date: "2030-01-01".to_string(),
            starttime: "9:00 AM".to_string(),
            endtime: "10:00 AM".to_string(),
            ..EventRecord::default()
        });
        let shifted = shift_records(records, &noon());
        assert_eq!(shifted.len(), FIXTURE_LEN + 1);
        assert_eq!(shifted[FIXTURE_LEN].date, "2030-01-01");
        assert_eq!(shifted[1].date, "2026-10-16");
        assert_eq!(shifted[1].starttime, "11:30 AM");
    }
}
