use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime, Timelike};

/// One scheduled class session, recreated fresh each run from scraped data.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOccurrence {
    pub name: String,
    /// Machine-readable name from the widget's data attribute, e.g. "water_aerobics".
    pub raw_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub instructor: Option<String>,
    /// Label of the schedule page this came from, e.g. "group_fitness".
    pub source: String,
}

impl ClassOccurrence {
    /// Builds an occurrence, enforcing `start < end`. A missing end time or
    /// one that isn't strictly after the start gets the default duration.
    pub fn new(
        name: String,
        raw_name: String,
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        instructor: Option<String>,
        source: String,
        default_minutes: i64,
    ) -> Self {
        let end = end
            .filter(|e| *e > start)
            .unwrap_or(start + Duration::minutes(default_minutes));
        ClassOccurrence {
            name,
            raw_name,
            start,
            end,
            instructor,
            source,
        }
    }

    pub fn start_hour(&self) -> u32 {
        self.start.hour()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Drops repeats of the same class session scraped from more than one page
/// or frame. First sighting wins; order is otherwise preserved.
pub fn dedupe_occurrences(occurrences: Vec<ClassOccurrence>) -> Vec<ClassOccurrence> {
    let mut seen = HashSet::new();
    occurrences
        .into_iter()
        .filter(|occ| seen.insert((occ.start, occ.name.clone())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 16)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn missing_end_gets_default_duration() {
        let occ = ClassOccurrence::new(
            "Water Aerobics".to_string(),
            "water_aerobics".to_string(),
            dt(10, 0),
            None,
            None,
            "aquatics".to_string(),
            45,
        );
        assert_eq!(occ.duration_minutes(), 45);
        assert!(occ.start < occ.end);
    }

    #[test]
    fn end_before_start_is_replaced() {
        let occ = ClassOccurrence::new(
            "Yoga".to_string(),
            String::new(),
            dt(10, 0),
            Some(dt(9, 0)),
            None,
            "group_fitness".to_string(),
            45,
        );
        assert_eq!(occ.end, dt(10, 45));
    }

    #[test]
    fn dedupe_keeps_first_sighting() {
        let a = ClassOccurrence::new(
            "UJAM".to_string(),
            "ujam".to_string(),
            dt(15, 0),
            Some(dt(16, 0)),
            Some("A".to_string()),
            "group_fitness".to_string(),
            45,
        );
        let mut b = a.clone();
        b.instructor = Some("B".to_string());
        let unique = dedupe_occurrences(vec![a.clone(), b]);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].instructor.as_deref(), Some("A"));
    }
}
