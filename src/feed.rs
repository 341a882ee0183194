use std::path::Path;

use anyhow::Context;
use chrono::NaiveDateTime;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike, EventStatus, Property};
use log::info;

use crate::config::{LOCATION, SyncConfig, TIMEZONE};
use crate::occurrence::ClassOccurrence;
use crate::text_manipulators::humanize_raw_name;

const WATER_WORDS: &[&str] = &["aqua", "water", "swim", "pool"];

fn is_water_class(name: &str) -> bool {
    let name = name.to_lowercase();
    WATER_WORDS.iter().any(|w| name.contains(w))
}

/// Stable identifier for one class session, so repeated runs over an
/// unchanged schedule regenerate byte-identical events.
fn event_uid(occurrence: &ClassOccurrence) -> String {
    let slug: String = occurrence
        .name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').replace("--", "-");
    format!(
        "{slug}-{}@tice-creek-sync",
        occurrence.start.format("%Y%m%dT%H%M%S")
    )
}

fn local_datetime(datetime: NaiveDateTime) -> CalendarDateTime {
    CalendarDateTime::WithTimezone {
        date_time: datetime,
        tzid: TIMEZONE.to_string(),
    }
}

/// Maps each surviving occurrence one-to-one onto a VEVENT.
pub fn build_calendar(occurrences: &[ClassOccurrence], config: &SyncConfig) -> Calendar {
    let mut calendar = Calendar::new();
    calendar
        .name(&config.calendar_name)
        .timezone(TIMEZONE)
        .append_property(Property::new("METHOD", "PUBLISH"));

    for occurrence in occurrences {
        let emoji = if is_water_class(&occurrence.name) {
            "\u{1f3ca}"
        } else {
            "\u{1f3cb}\u{fe0f}"
        };

        let mut description_parts = vec![];
        if let Some(instructor) = &occurrence.instructor {
            description_parts.push(format!("Instructor: {instructor}"));
        }
        if !occurrence.source.is_empty() {
            description_parts.push(format!(
                "Schedule: {}",
                humanize_raw_name(&occurrence.source)
            ));
        }
        description_parts.push("Auto-synced from ticefitnesscenter.com".to_string());

        let event = Event::new()
            .uid(&event_uid(occurrence))
            .summary(&format!("{emoji} {}", occurrence.name))
            .description(&description_parts.join("\n"))
            .location(LOCATION)
            .starts(local_datetime(occurrence.start))
            .ends(local_datetime(occurrence.end))
            .status(EventStatus::Confirmed)
            .append_property(Property::new("TRANSP", "TRANSPARENT"))
            .done();
        calendar.push(event);
    }

    info!("Generated {} calendar events", occurrences.len());
    calendar
}

/// Writes the feed file, creating the output directory if needed. An empty
/// occurrence list still produces a syntactically valid calendar.
pub fn write_feed(path: &Path, calendar: &Calendar) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    std::fs::write(path, calendar.to_string())
        .with_context(|| format!("failed to write feed file {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn occurrence(name: &str, hour: u32) -> ClassOccurrence {
        let start = NaiveDate::from_ymd_opt(2026, 2, 16)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        ClassOccurrence::new(
            name.to_string(),
            String::new(),
            start,
            Some(start + chrono::Duration::hours(1)),
            Some("Cathy Steen".to_string()),
            "aquatics".to_string(),
            45,
        )
    }

    #[test]
    fn every_occurrence_becomes_exactly_one_event() {
        let occurrences = vec![occurrence("Aqua Zumba", 13), occurrence("UJAM", 15)];
        let calendar = build_calendar(&occurrences, &SyncConfig::default());
        let serialized = calendar.to_string();
        assert_eq!(serialized.matches("BEGIN:VEVENT").count(), 2);
        assert!(serialized.contains("Aqua Zumba"));
        assert!(serialized.contains("UJAM"));
        assert!(serialized.contains("DTSTART;TZID=America/Los_Angeles:20260216T130000"));
        assert!(serialized.contains("DTEND;TZID=America/Los_Angeles:20260216T140000"));
    }

    #[test]
    fn empty_input_still_yields_a_valid_calendar() {
        let calendar = build_calendar(&[], &SyncConfig::default());
        let serialized = calendar.to_string();
        assert!(serialized.contains("BEGIN:VCALENDAR"));
        assert!(serialized.contains("END:VCALENDAR"));
        assert_eq!(serialized.matches("BEGIN:VEVENT").count(), 0);
    }

    #[test]
    fn uid_is_stable_across_runs() {
        let occ = occurrence("Aqua Zumba", 13);
        assert_eq!(event_uid(&occ), event_uid(&occ.clone()));
        assert_eq!(event_uid(&occ), "aqua-zumba-20260216T130000@tice-creek-sync");
    }

    #[test]
    fn uids_differ_between_sessions() {
        assert_ne!(
            event_uid(&occurrence("Aqua Zumba", 13)),
            event_uid(&occurrence("Aqua Zumba", 15))
        );
        assert_ne!(
            event_uid(&occurrence("Aqua Zumba", 13)),
            event_uid(&occurrence("Water Aerobics", 13))
        );
    }

    #[test]
    fn water_classes_get_the_swim_emoji() {
        let occurrences = vec![occurrence("Water Aerobics", 10)];
        let serialized = build_calendar(&occurrences, &SyncConfig::default()).to_string();
        assert!(serialized.contains("\u{1f3ca} Water Aerobics"));
    }

    #[test]
    fn write_feed_creates_the_output_directory() {
        let dir = std::env::temp_dir().join("tice-sync-feed-test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("nested").join("classes.ics");
        let calendar = build_calendar(&[occurrence("UJAM", 15)], &SyncConfig::default());
        write_feed(&path, &calendar).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("BEGIN:VCALENDAR"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
