use log::info;

use crate::config::SyncConfig;
use crate::occurrence::ClassOccurrence;

/// User-configured keep rules. Keyword matching is case-insensitive
/// substring match against the display and machine names combined; the
/// hour window is inclusive on the lower bound, exclusive on the upper.
#[derive(Debug, Clone, Default)]
pub struct FilterRules {
    include: Vec<String>,
    exclude: Vec<String>,
    earliest_hour: Option<u32>,
    latest_hour: Option<u32>,
}

impl FilterRules {
    pub fn from_config(config: &SyncConfig) -> Self {
        let normalize = |keywords: &[String]| {
            keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };
        FilterRules {
            include: normalize(&config.include_classes),
            exclude: normalize(&config.exclude_classes),
            earliest_hour: config.earliest_hour,
            latest_hour: config.latest_hour,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
            && self.exclude.is_empty()
            && self.earliest_hour.is_none()
            && self.latest_hour.is_none()
    }

    pub fn matches(&self, occurrence: &ClassOccurrence) -> bool {
        let combined = format!("{} {}", occurrence.name, occurrence.raw_name).to_lowercase();

        if !self.include.is_empty() && !self.include.iter().any(|k| combined.contains(k)) {
            return false;
        }
        if self.exclude.iter().any(|k| combined.contains(k)) {
            return false;
        }

        let hour = occurrence.start_hour();
        if let Some(earliest) = self.earliest_hour {
            if hour < earliest {
                return false;
            }
        }
        if let Some(latest) = self.latest_hour {
            if hour >= latest {
                return false;
            }
        }

        true
    }

    /// Pure and order-preserving; empty rules keep everything.
    pub fn apply(&self, occurrences: Vec<ClassOccurrence>) -> Vec<ClassOccurrence> {
        if self.is_empty() {
            return occurrences;
        }
        let before = occurrences.len();
        let filtered: Vec<_> = occurrences
            .into_iter()
            .filter(|occ| self.matches(occ))
            .collect();
        info!("Filtered {before} -> {} classes", filtered.len());
        filtered
    }
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
            None,
            "group_fitness".to_string(),
            45,
        )
    }

    fn rules(include: &[&str], earliest: Option<u32>) -> FilterRules {
        FilterRules::from_config(&SyncConfig {
            include_classes: include.iter().map(|s| s.to_string()).collect(),
            earliest_hour: earliest,
            ..SyncConfig::default()
        })
    }

    #[test]
    fn keyword_and_hour_scenario() {
        let raw = vec![
            occurrence("Aqua Zumba", 13),
            occurrence("Morning Yoga", 8),
            occurrence("UJAM", 15),
        ];
        let rules = rules(&["aqua", "zumba", "ujam"], Some(12));
        let kept = rules.apply(raw);
        let names: Vec<_> = kept.iter().map(|occ| occ.name.as_str()).collect();
        assert_eq!(names, vec!["Aqua Zumba", "UJAM"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let raw = vec![
            occurrence("Aqua Zumba", 13),
            occurrence("Morning Yoga", 8),
            occurrence("UJAM", 15),
        ];
        let rules = rules(&["aqua", "zumba", "ujam"], Some(12));
        let once = rules.apply(raw);
        let twice = rules.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn early_start_is_excluded_even_on_name_match() {
        let rules = rules(&["yoga"], Some(12));
        assert!(!rules.matches(&occurrence("Morning Yoga", 8)));
        assert!(rules.matches(&occurrence("Evening Yoga", 12)));
    }

    #[test]
    fn unmatched_name_is_excluded_regardless_of_hour() {
        let rules = rules(&["aqua"], None);
        assert!(!rules.matches(&occurrence("Spin Class", 14)));
    }

    #[test]
    fn exclude_keywords_reject_matches() {
        let rules = FilterRules::from_config(&SyncConfig {
            exclude_classes: vec!["zumba".to_string()],
            ..SyncConfig::default()
        });
        assert!(!rules.matches(&occurrence("Aqua Zumba", 13)));
        assert!(rules.matches(&occurrence("Water Aerobics", 10)));
    }

    #[test]
    fn raw_name_participates_in_matching() {
        let mut occ = occurrence("H2O Blast", 10);
        occ.raw_name = "aqua_blast".to_string();
        let rules = rules(&["aqua"], None);
        assert!(rules.matches(&occ));
    }

    #[test]
    fn latest_hour_is_exclusive() {
        let rules = FilterRules::from_config(&SyncConfig {
            latest_hour: Some(15),
            ..SyncConfig::default()
        });
        assert!(rules.matches(&occurrence("UJAM", 14)));
        assert!(!rules.matches(&occurrence("UJAM", 15)));
    }

    #[test]
    fn empty_rules_keep_everything() {
        let rules = FilterRules::from_config(&SyncConfig::default());
        let raw = vec![occurrence("Anything", 6)];
        assert_eq!(rules.apply(raw.clone()), raw);
    }
}
