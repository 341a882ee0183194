use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::{debug, info, warn};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::browser::{CapturedResponse, RenderedPage};
use crate::config::SchedulePage;
use crate::occurrence::ClassOccurrence;
use crate::requests::RequestClient;
use crate::text_manipulators::{extract_direct_text, extract_text, humanize_raw_name};

fn parse_widget_datetime(value: &str) -> Option<NaiveDateTime> {
    // The widget emits "2026-02-16T10:00"; captured API payloads sometimes
    // carry seconds.
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

// =========================================================================
// Strategy 1: intercepted network responses
// =========================================================================

/// Pulls class records out of JSON bodies recorded by the browser's network
/// hook. Healcode schedule responses wrap the rendered widget markup in a
/// "contents" field; some Mindbody API responses carry a "class_sessions"
/// array instead. A payload only contributes records that have both a name
/// and a parseable start time; anything partial is ignored so the caller
/// falls through to the next strategy.
pub fn from_network_capture(
    captured: &[CapturedResponse],
    label: &str,
    default_minutes: i64,
) -> Vec<ClassOccurrence> {
    let mut occurrences = vec![];

    for response in captured {
        let Ok(json) = serde_json::from_str::<Value>(&response.body) else {
            continue;
        };

        if let Some(contents) = json.get("contents").and_then(Value::as_str) {
            let found = parse_widget_html(contents, label, default_minutes);
            if !found.is_empty() {
                debug!("  {} classes in widget payload from {}", found.len(), response.url);
                occurrences.extend(found);
            }
            continue;
        }

        if let Some(sessions) = json.get("class_sessions").and_then(Value::as_array) {
            let found: Vec<_> = sessions
                .iter()
                .filter_map(|session| session_from_json(session, label, default_minutes))
                .collect();
            if !found.is_empty() {
                debug!("  {} classes in session payload from {}", found.len(), response.url);
                occurrences.extend(found);
            }
        }
    }

    occurrences
}

fn session_from_json(session: &Value, label: &str, default_minutes: i64) -> Option<ClassOccurrence> {
    let name = session.get("name").and_then(Value::as_str)?.trim();
    if name.is_empty() {
        return None;
    }
    let start = session
        .get("start_datetime")
        .or_else(|| session.get("start"))
        .and_then(Value::as_str)
        .and_then(parse_widget_datetime)?;
    let end = session
        .get("end_datetime")
        .or_else(|| session.get("end"))
        .and_then(Value::as_str)
        .and_then(parse_widget_datetime);
    let instructor = session
        .get("staff_name")
        .or_else(|| session.get("instructor"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from);

    Some(ClassOccurrence::new(
        name.to_string(),
        String::new(),
        start,
        end,
        instructor,
        label.to_string(),
        default_minutes,
    ))
}

// =========================================================================
// Strategy 2: rendered DOM (Branded Web widget)
// =========================================================================
// Each class is a <div class="bw-session"> with:
//   - data-bw-widget-mbo-class-name="..." (machine-readable name)
//   - <time class="hc_starttime" datetime="2026-02-16T10:00">
//   - <time class="hc_endtime" datetime="2026-02-16T10:45">
//   - <div class="bw-session__name">Water Aerobics <span>...</span></div>
//   - <div class="bw-session__staff">CATHY STEEN</div>

/// Parses the main frame and every iframe of a rendered page.
pub fn from_rendered_dom(
    page: &RenderedPage,
    label: &str,
    default_minutes: i64,
) -> Vec<ClassOccurrence> {
    let mut occurrences = parse_widget_html(&page.main_html, label, default_minutes);
    if !occurrences.is_empty() {
        info!("  Found {} classes in main frame", occurrences.len());
    }

    for (i, frame_html) in page.frame_htmls.iter().enumerate() {
        let found = parse_widget_html(frame_html, label, default_minutes);
        if !found.is_empty() {
            info!("  Found {} classes in frame {i}", found.len());
            occurrences.extend(found);
        }
    }

    occurrences
}

pub fn parse_widget_html(html: &str, label: &str, default_minutes: i64) -> Vec<ClassOccurrence> {
    let document = Html::parse_document(html);

    let session_selector = Selector::parse("div.bw-session").unwrap();
    let start_selector = Selector::parse("time.hc_starttime").unwrap();
    let end_selector = Selector::parse("time.hc_endtime").unwrap();
    let name_selector = Selector::parse(".bw-session__name").unwrap();
    let staff_selector = Selector::parse(".bw-session__staff").unwrap();

    let mut occurrences = vec![];
    for session in document.select(&session_selector) {
        let raw_name = session
            .value()
            .attr("data-bw-widget-mbo-class-name")
            .unwrap_or("")
            .to_string();

        let start_attr = session
            .select(&start_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"));
        let Some(start_attr) = start_attr else {
            continue;
        };
        let Some(start) = parse_widget_datetime(start_attr) else {
            warn!("  Skipping session with unparseable start time: {start_attr}");
            continue;
        };

        let end = session
            .select(&end_selector)
            .next()
            .and_then(|el| el.value().attr("datetime"))
            .and_then(parse_widget_datetime);

        let mut name = session
            .select(&name_selector)
            .next()
            .map(extract_direct_text)
            .unwrap_or_default();
        if name.is_empty() {
            name = humanize_raw_name(&raw_name);
        }
        if name.is_empty() {
            warn!("  Skipping session at {start} with no usable name");
            continue;
        }

        let instructor = session
            .select(&staff_selector)
            .next()
            .map(|el| extract_text(el).trim().to_string())
            .filter(|s| !s.is_empty());

        occurrences.push(ClassOccurrence::new(
            name,
            raw_name,
            start,
            end,
            instructor,
            label.to_string(),
            default_minutes,
        ));
    }

    occurrences
}

// =========================================================================
// Strategy 3: legacy server-rendered schedule (Healcode print view)
// =========================================================================
// Day headers are <tr class="hc_date"> rows ("Monday, February 16, 2026");
// each class under one is a <tr class="hc_class"> with .hc_time
// ("9:00 am - 9:45 am"), .classname and .trainer cells.

pub fn parse_legacy_schedule(html: &str, label: &str, default_minutes: i64) -> Vec<ClassOccurrence> {
    let document = Html::parse_document(html);

    let row_selector = Selector::parse("tr.hc_date, tr.hc_class").unwrap();
    let time_selector = Selector::parse(".hc_time").unwrap();
    let name_selector = Selector::parse(".classname").unwrap();
    let trainer_selector = Selector::parse(".trainer").unwrap();
    let time_range = Regex::new(
        r"(?i)(\d{1,2}):(\d{2})\s*(am|pm)\s*[-\u{2013}]\s*(\d{1,2}):(\d{2})\s*(am|pm)",
    )
    .unwrap();

    let mut occurrences = vec![];
    let mut current_date: Option<NaiveDate> = None;

    for row in document.select(&row_selector) {
        let classes = row.value().attr("class").unwrap_or("");

        if classes.contains("hc_date") {
            let text = extract_text(row).trim().replace('\u{a0}', " ");
            match NaiveDate::parse_from_str(text.trim(), "%A, %B %d, %Y") {
                Ok(date) => current_date = Some(date),
                Err(_) => warn!("  Unrecognized day header in legacy schedule: {text}"),
            }
            continue;
        }

        let Some(date) = current_date else {
            continue;
        };
        let time_text = match row.select(&time_selector).next() {
            Some(el) => extract_text(el),
            None => continue,
        };
        let Some(caps) = time_range.captures(&time_text) else {
            warn!("  Skipping legacy row with unparseable time: {}", time_text.trim());
            continue;
        };
        let (Some(start_time), Some(end_time)) = (
            clock_time(&caps[1], &caps[2], &caps[3]),
            clock_time(&caps[4], &caps[5], &caps[6]),
        ) else {
            warn!("  Skipping legacy row with out-of-range time: {}", time_text.trim());
            continue;
        };

        let name = match row.select(&name_selector).next() {
            Some(el) => extract_text(el).trim().to_string(),
            None => continue,
        };
        if name.is_empty() {
            continue;
        }
        let instructor = row
            .select(&trainer_selector)
            .next()
            .map(|el| extract_text(el).trim().to_string())
            .filter(|s| !s.is_empty());

        occurrences.push(ClassOccurrence::new(
            name,
            String::new(),
            date.and_time(start_time),
            Some(date.and_time(end_time)),
            instructor,
            label.to_string(),
            default_minutes,
        ));
    }

    occurrences
}

fn clock_time(hour: &str, minute: &str, meridiem: &str) -> Option<NaiveTime> {
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    let hour = match (hour, meridiem.to_lowercase().as_str()) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "pm") => h + 12,
        (h, _) => h,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

// =========================================================================
// Ordered fallback chain
// =========================================================================

/// Runs the extraction strategies for one schedule page in priority order,
/// stopping at the first one that yields records.
pub async fn extract_schedule_page(
    page: &RenderedPage,
    schedule: &SchedulePage,
    client: &RequestClient,
    default_minutes: i64,
) -> Vec<ClassOccurrence> {
    let occurrences = from_network_capture(&page.captured, schedule.label, default_minutes);
    if !occurrences.is_empty() {
        info!("  {} classes from captured network responses", occurrences.len());
        return occurrences;
    }

    let occurrences = from_rendered_dom(page, schedule.label, default_minutes);
    if !occurrences.is_empty() {
        return occurrences;
    }

    info!("  No classes in rendered page, trying legacy schedule: {}", schedule.legacy_url);
    match client.fetch_url_body(schedule.legacy_url).await {
        Ok(html) => {
            let occurrences = parse_legacy_schedule(&html, schedule.label, default_minutes);
            if occurrences.is_empty() {
                warn!("  No classes found for {} by any strategy", schedule.label);
            } else {
                info!("  {} classes from legacy schedule", occurrences.len());
            }
            occurrences
        }
        Err(e) => {
            warn!("  Legacy schedule fetch failed for {}: {e}", schedule.label);
            vec![]
        }
    }
}
