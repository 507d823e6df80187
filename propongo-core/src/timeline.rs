//! Timeline deriver.
//!
//! Turns the deliverable list and its sparse date map into a normalized
//! Gantt dataset: one bar per deliverable, positioned in whole days from
//! the earliest start, plus shared axis metadata. Missing or malformed
//! dates fall back to defaults instead of failing the derivation.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::DeliverableDates;

/// Length given to a deliverable with no usable end date
pub const DEFAULT_DURATION_DAYS: i64 = 7;

/// Approximate number of labeled ticks along the axis
pub const TARGET_TICKS: i64 = 7;

/// Label format for bar start/end dates, e.g. `Mar 1, 2024`
pub const LABEL_FORMAT: &str = "%b %-d, %Y";

/// Label format for axis ticks, e.g. `Mar 1`
pub const TICK_FORMAT: &str = "%b %-d";

/// One bar of the chart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartItem {
    /// Position of the deliverable in the scope list
    pub index: usize,
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Length of the bar in days, never less than 1
    pub duration: i64,
    /// Days from the chart's earliest start to this bar's start
    pub offset: i64,
    pub start_label: String,
    pub end_label: String,
}

/// A labeled position on the day axis
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisTick {
    pub offset: i64,
    pub label: String,
}

/// Everything a renderer needs to draw the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataset {
    pub items: Vec<ChartItem>,
    pub earliest: NaiveDate,
    /// Latest of every item's start and end date
    pub latest: NaiveDate,
    pub total_span: i64,
    /// Axis range in days, `(0, total_span + 1)`
    pub domain: (i64, i64),
    pub ticks: Vec<AxisTick>,
    /// Position of the "today" marker; may lie outside the domain
    pub today_offset: i64,
}

impl ChartDataset {
    /// The "no timeline data" dataset
    pub fn empty(today: NaiveDate) -> Self {
        Self {
            items: Vec::new(),
            earliest: today,
            latest: today,
            total_span: 0,
            domain: (0, 1),
            ticks: Vec::new(),
            today_offset: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Parses a stored date, accepting `YYYY-MM-DD` or an ISO date-time
///
/// Blank or malformed input yields `None`.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    debug!(input = trimmed, "unparseable date ignored");
    None
}

fn parse_opt(value: Option<&String>) -> Option<NaiveDate> {
    value.and_then(|s| parse_date(s))
}

/// Whole days from `from` to `to`, negative when `to` is earlier
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Tick spacing in days for a given span
pub fn tick_interval(total_span: i64) -> i64 {
    (total_span / TARGET_TICKS).max(1)
}

fn build_ticks(earliest: NaiveDate, total_span: i64) -> Vec<AxisTick> {
    let interval = tick_interval(total_span);
    // ceil(span / interval) for non-negative span
    let count = (total_span + interval - 1) / interval;
    (0..=count)
        .map(|i| {
            let offset = i * interval;
            AxisTick {
                offset,
                label: (earliest + Duration::days(offset)).format(TICK_FORMAT).to_string(),
            }
        })
        .collect()
}

/// Derives the chart dataset for the deliverables as of `today`
pub fn derive(
    deliverables: &[String],
    deliverable_dates: &BTreeMap<usize, DeliverableDates>,
    today: NaiveDate,
) -> ChartDataset {
    if deliverables.is_empty() {
        return ChartDataset::empty(today);
    }

    let ranges: Vec<(NaiveDate, NaiveDate)> = (0..deliverables.len())
        .map(|index| {
            let dates = deliverable_dates.get(&index);
            let start = parse_opt(dates.and_then(|d| d.start_date.as_ref())).unwrap_or(today);
            let end = parse_opt(dates.and_then(|d| d.end_date.as_ref()))
                .unwrap_or(start + Duration::days(DEFAULT_DURATION_DAYS));
            (start, end)
        })
        .collect();

    let earliest = ranges.iter().map(|(start, _)| *start).min().unwrap_or(today);
    let latest = ranges
        .iter()
        .map(|(start, end)| (*start).max(*end))
        .max()
        .unwrap_or(today);

    let items = deliverables
        .iter()
        .zip(&ranges)
        .enumerate()
        .map(|(index, (name, (start, end)))| ChartItem {
            index,
            name: name.clone(),
            start: *start,
            end: *end,
            duration: days_between(*start, *end).max(1),
            offset: days_between(earliest, *start),
            start_label: start.format(LABEL_FORMAT).to_string(),
            end_label: end.format(LABEL_FORMAT).to_string(),
        })
        .collect();

    let total_span = days_between(earliest, latest).max(0);

    ChartDataset {
        items,
        earliest,
        latest,
        total_span,
        domain: (0, total_span + 1),
        ticks: build_ticks(earliest, total_span),
        today_offset: days_between(earliest, today),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: Option<&str>, end: Option<&str>) -> DeliverableDates {
        DeliverableDates {
            start_date: start.map(str::to_string),
            end_date: end.map(str::to_string),
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_input_is_sentinel() {
        let today = date("2024-05-01");
        let chart = derive(&[], &BTreeMap::new(), today);
        assert!(chart.is_empty());
        assert_eq!(chart, ChartDataset::empty(today));
    }

    #[test]
    fn test_defaults_without_dates() {
        let today = date("2024-05-01");
        let chart = derive(&names(&["Design"]), &BTreeMap::new(), today);

        let item = &chart.items[0];
        assert_eq!(item.start, today);
        assert_eq!(item.end, date("2024-05-08"));
        assert_eq!(item.duration, 7);
        assert_eq!(item.offset, 0);
        assert_eq!(item.start_label, "May 1, 2024");
        assert_eq!(chart.today_offset, 0);
    }

    #[test]
    fn test_same_day_has_minimum_duration() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-03-01"), Some("2024-03-01")));
        let chart = derive(&names(&["Kickoff"]), &dates, date("2024-01-01"));
        assert_eq!(chart.items[0].duration, 1);
    }

    #[test]
    fn test_inverted_range_is_clamped() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-03-10"), Some("2024-03-01")));
        let chart = derive(&names(&["Oops"]), &dates, date("2024-03-10"));
        assert_eq!(chart.items[0].duration, 1);
        assert_eq!(chart.latest, date("2024-03-10"));
        assert_eq!(chart.total_span, 0);
        assert_eq!(chart.domain, (0, 1));
    }

    #[test]
    fn test_offsets_from_earliest() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-03-05"), Some("2024-03-20")));
        dates.insert(1, range(Some("2024-03-01"), Some("2024-03-04")));
        let chart = derive(&names(&["Build", "Design"]), &dates, date("2024-03-03"));

        assert_eq!(chart.earliest, date("2024-03-01"));
        assert_eq!(chart.items[0].offset, 4);
        assert_eq!(chart.items[1].offset, 0);
        assert_eq!(chart.items[1].start, chart.earliest);
        assert_eq!(chart.latest, date("2024-03-20"));
        assert_eq!(chart.total_span, 19);
        assert_eq!(chart.domain, (0, 20));
        assert_eq!(chart.today_offset, 2);
    }

    #[test]
    fn test_malformed_dates_fall_back() {
        let today = date("2024-06-15");
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("not a date"), Some("")));
        let chart = derive(&names(&["Launch"]), &dates, today);
        assert_eq!(chart.items[0].start, today);
        assert_eq!(chart.items[0].end, date("2024-06-22"));
    }

    #[test]
    fn test_end_only_uses_today_as_start() {
        let today = date("2024-06-01");
        let mut dates = BTreeMap::new();
        dates.insert(0, range(None, Some("2024-06-11")));
        let chart = derive(&names(&["Audit"]), &dates, today);
        assert_eq!(chart.items[0].start, today);
        assert_eq!(chart.items[0].duration, 10);
    }

    #[test]
    fn test_today_marker_outside_range() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-03-01"), Some("2024-03-08")));
        let chart = derive(&names(&["Design"]), &dates, date("2024-02-20"));
        assert_eq!(chart.today_offset, -10);
    }

    #[test]
    fn test_ticks() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-01-01"), Some("2024-03-01")));
        let chart = derive(&names(&["Long"]), &dates, date("2024-01-01"));

        // 60 day span: interval 8, ticks 0..=64
        assert_eq!(chart.total_span, 60);
        assert_eq!(tick_interval(60), 8);
        let offsets: Vec<_> = chart.ticks.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 24, 32, 40, 48, 56, 64]);
        assert_eq!(chart.ticks[0].label, "Jan 1");
        assert_eq!(chart.ticks[1].label, "Jan 9");
    }

    #[test]
    fn test_short_span_ticks_every_day() {
        let mut dates = BTreeMap::new();
        dates.insert(0, range(Some("2024-01-01"), Some("2024-01-04")));
        let chart = derive(&names(&["Short"]), &dates, date("2024-01-01"));
        let offsets: Vec<_> = chart.ticks.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date("2024-03-01"), Some(date("2024-03-01")));
        assert_eq!(parse_date(" 2024-03-01 "), Some(date("2024-03-01")));
        assert_eq!(parse_date("2024-03-01T10:30:00Z"), Some(date("2024-03-01")));
        assert_eq!(parse_date("2024-03-01T10:30:00.000"), Some(date("2024-03-01")));
        assert_eq!(parse_date("03/01/2024"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_dataset_serializes_camel_case() {
        let chart = derive(&names(&["Design"]), &BTreeMap::new(), date("2024-05-01"));
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["items"][0]["startLabel"], "May 1, 2024");
        assert_eq!(json["items"][0]["start"], "2024-05-01");
        assert_eq!(json["totalSpan"], 7);
        assert_eq!(json["domain"], serde_json::json!([0, 8]));
    }
}
